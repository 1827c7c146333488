#![warn(unused_extern_crates)]

mod cmd;
mod commands;
mod defaults;
mod error;
mod identity;
mod layout;
mod manager;
mod profile;
mod roles;
mod rotation;
mod session;
mod store;
mod utils;

use clap::Parser;
use cmd::Cli;
use layout::StoreLayout;
use manager::CredsManager;
use std::error::Error;
use std::io;
use tracing_subscriber::EnvFilter;

fn error_to_string(error: impl Error) -> String {
    error.to_string()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("aws_creds=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let aws_dir = utils::resolve_aws_dir(cli.aws_dir.as_deref());
    let manager = CredsManager::new(StoreLayout::new(aws_dir));

    manager.migrate().map_err(error_to_string)?;

    commands::exec(&manager, cli.command)
        .await
        .map_err(error_to_string)
}
