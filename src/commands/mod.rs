mod defaults;
mod profile;
mod prompt;
mod role;
mod session;

use crate::cmd::Commands;
use crate::identity::AwsIdentityApi;
use crate::manager::CredsManager;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Creds(#[from] crate::error::Error),

    #[error("Error formatting the profile list as json: {0}")]
    JsonFormatter(#[from] serde_json::Error),

    #[error("Failed to read from stdin: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("'{0}' is neither a role index from 'role ls' nor a role ARN.")]
    InvalidRole(String),

    #[error("A secret access key is required.")]
    MissingSecretKey,
}

pub async fn exec(manager: &CredsManager, command: Commands) -> Result<(), Error> {
    let api = AwsIdentityApi::new();
    match command {
        Commands::Add {
            name,
            access_key,
            secret_key,
            description,
            region,
            output,
        } => profile::exec_add(
            manager,
            profile::AddInput {
                name,
                access_key,
                secret_key,
                description,
                region,
                output,
            },
        ),
        Commands::Ls { formatting } => profile::exec_ls(manager, &formatting),
        Commands::Rm { name, yes } => profile::exec_rm(manager, &name, yes),
        Commands::Update {
            name,
            rename,
            description,
            access_key,
            secret_key,
            region,
            output,
        } => profile::exec_update(
            manager,
            &name,
            profile::UpdateInput {
                rename,
                description,
                access_keys: access_key.zip(secret_key),
                region,
                output,
            },
        ),
        Commands::Login { name } => session::exec_login(manager, &api, &name).await,
        Commands::Logout => session::exec_logout(manager),
        Commands::Status => session::exec_status(manager, &api).await,
        Commands::Rotate => session::exec_rotate(manager, &api).await,
        Commands::Default { subcommand } => defaults::exec_default(manager, subcommand),
        Commands::Role { subcommand } => role::exec_role(manager, &api, subcommand).await,
    }
}
