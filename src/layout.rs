use std::path::PathBuf;

const PROFILES_DIR: &str = "credential_profiles";
pub const DEFAULTS_DIR: &str = "defaults";
const DEFAULTS_FILE: &str = "defaults.json";
pub const RECORD_FILE: &str = "credential.json";
const CURRENT_PROFILE_FILE: &str = ".current_profile";
const CURRENT_ROLE_FILE: &str = ".current_role";
const AWS_CREDENTIALS_FILE: &str = "credentials";
const AWS_CONFIG_FILE: &str = "config";
const LEGACY_ACCOUNTS_FILE: &str = "accounts.json";
const LOGIN_HISTORY_FILE: &str = "login_history.log";

/// Every path the tool reads or writes, derived from a single root directory.
///
/// The root normally mirrors the AWS CLI directory (`~/.aws`) so the provider
/// files land where the CLI and SDKs look for them.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(PROFILES_DIR)
    }

    pub fn profile_dir(&self, id: &str) -> PathBuf {
        self.profiles_dir().join(id)
    }

    pub fn profile_record(&self, id: &str) -> PathBuf {
        self.profile_dir(id).join(RECORD_FILE)
    }

    pub fn defaults_file(&self) -> PathBuf {
        self.profiles_dir().join(DEFAULTS_DIR).join(DEFAULTS_FILE)
    }

    pub fn current_profile_file(&self) -> PathBuf {
        self.root.join(CURRENT_PROFILE_FILE)
    }

    pub fn current_role_file(&self) -> PathBuf {
        self.root.join(CURRENT_ROLE_FILE)
    }

    pub fn aws_credentials_file(&self) -> PathBuf {
        self.root.join(AWS_CREDENTIALS_FILE)
    }

    pub fn aws_config_file(&self) -> PathBuf {
        self.root.join(AWS_CONFIG_FILE)
    }

    pub fn legacy_accounts_file(&self) -> PathBuf {
        self.root.join(LEGACY_ACCOUNTS_FILE)
    }

    pub fn login_history_file(&self) -> PathBuf {
        self.root.join(LOGIN_HISTORY_FILE)
    }
}
