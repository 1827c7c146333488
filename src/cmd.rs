use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Switch between multiple saved AWS credential profiles
#[derive(Parser)]
#[command(about, version)]
pub struct Cli {
    /// Directory holding the saved profiles and the AWS CLI `credentials` and
    /// `config` files. Defaults to `$HOME/.aws`.
    #[arg(short = ARG_SHORT_AWS_DIR, long, env = "AWS_CREDS_DIR", global = true)]
    pub aws_dir: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short = 'v', long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

const ARG_SHORT_AWS_DIR: char = 'C';
const ARG_SHORT_DESCRIPTION: char = 'd';
const ARG_SHORT_ACCESS_KEY: char = 'k';
const ARG_SHORT_SECRET_KEY: char = 's';
const ARG_SHORT_REGION: char = 'r';
const ARG_SHORT_OUTPUT: char = 'o';

/// Output format for listings
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Plain text formatted output
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

#[derive(Args)]
pub struct FormatCommonArgs {
    /// Format for the output list
    #[arg(short = 'F', long, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    /// Flag to omit headers in the output
    #[arg(short = 'H', long, default_value_t = false)]
    pub no_headers: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a new credential profile. Blank region and output are taken from
    /// the defaults (see `default get`).
    Add {
        /// Profile name, stored upper-cased
        name: String,
        /// AWS access key id
        #[arg(short = ARG_SHORT_ACCESS_KEY, long)]
        access_key: String,
        /// AWS secret access key. Prompted for on stdin when omitted.
        #[arg(short = ARG_SHORT_SECRET_KEY, long)]
        secret_key: Option<String>,
        #[arg(short = ARG_SHORT_DESCRIPTION, long, default_value = "")]
        description: String,
        #[arg(short = ARG_SHORT_REGION, long, default_value = "")]
        region: String,
        #[arg(short = ARG_SHORT_OUTPUT, long, default_value = "")]
        output: String,
    },

    /// List saved profiles, marking the active one
    Ls {
        #[clap(flatten)]
        formatting: FormatCommonArgs,
    },

    /// Delete a saved profile. Logs out first when it is the active one.
    Rm {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long, default_value_t = false)]
        yes: bool,
    },

    /// Write a profile's credentials to the AWS CLI files and make it active
    Login { name: String },

    /// Remove the AWS CLI credential and config files
    Logout,

    /// Change fields of a saved profile
    Update {
        name: String,
        /// New profile name
        #[arg(short = 'n', long)]
        rename: Option<String>,
        #[arg(short = ARG_SHORT_DESCRIPTION, long)]
        description: Option<String>,
        /// New access key id. Requires `--secret-key`.
        #[arg(short = ARG_SHORT_ACCESS_KEY, long, requires = "secret_key")]
        access_key: Option<String>,
        #[arg(short = ARG_SHORT_SECRET_KEY, long, requires = "access_key")]
        secret_key: Option<String>,
        #[arg(short = ARG_SHORT_REGION, long)]
        region: Option<String>,
        #[arg(short = ARG_SHORT_OUTPUT, long)]
        output: Option<String>,
    },

    /// Show the active profile, its AWS account and access key age
    Status,

    /// Replace the active profile's access key with a new one and delete the
    /// old key. Logs out when done.
    Rotate,

    /// Manage the region and output used for new profiles
    Default {
        #[clap(subcommand)]
        subcommand: Defaults,
    },

    /// Manage the IAM roles saved on a profile
    Role {
        #[clap(subcommand)]
        subcommand: Role,
    },
}

#[derive(Subcommand)]
pub enum Defaults {
    /// Print the current defaults
    Get,
    /// Change one or both defaults
    #[command(group(
        clap::ArgGroup::new("values")
            .required(true)
            .multiple(true)
            .args(["output", "region"])
    ))]
    Set {
        #[arg(short = ARG_SHORT_OUTPUT, long)]
        output: Option<String>,
        #[arg(short = ARG_SHORT_REGION, long)]
        region: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum Role {
    /// Save a role ARN on a profile
    Add { name: String, role_arn: String },
    /// Switch the AWS CLI files to temporary credentials for a role. `ROLE`
    /// is an index from `role ls` or a role ARN.
    Assume { name: String, role: String },
    /// Restore the active profile's own credentials
    Unassume,
    /// List the roles saved on a profile
    Ls { name: String },
    /// Remove the role at an index from `role ls`
    Rm { name: String, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["aws-creds", "ls", "--aws-dir", "/tmp/aws", "-v"]).unwrap();
        assert_eq!(cli.aws_dir, Some(PathBuf::from("/tmp/aws")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_update_access_key_requires_secret() {
        let result = Cli::try_parse_from(["aws-creds", "update", "prod", "-k", "AKIA2"]);
        assert!(result.is_err());
    }
}
