use crate::error::{Error, Result};
use crate::layout::StoreLayout;
use crate::profile::CredentialProfile;
use crate::store::ProvideProfiles;
use crate::utils;
use ini::Ini;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

const PROVIDER_SECTION: &str = "default";
const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const KEY_SESSION_TOKEN: &str = "aws_session_token";
const KEY_REGION: &str = "region";
const KEY_OUTPUT: &str = "output";

/// Variables the AWS CLI and SDKs prefer over the files written here.
pub const CONFLICTING_ENV_VARS: [&str; 11] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
    "AWS_PROFILE",
    "AWS_DEFAULT_PROFILE",
    "AWS_SHARED_CREDENTIALS_FILE",
    "AWS_CONFIG_FILE",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "AWS_DEFAULT_OUTPUT",
];

/// Names of the conflicting variables present (non-empty) in `vars`, in
/// [`CONFLICTING_ENV_VARS`] order.
pub fn conflicting_variables<I, K, V>(vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let present: Vec<String> = vars
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(key, _)| key.as_ref().to_string())
        .collect();
    CONFLICTING_ENV_VARS
        .iter()
        .filter(|name| present.iter().any(|p| p == *name))
        .map(|name| name.to_string())
        .collect()
}

pub fn check_environment_vars<I, K, V>(vars: I) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let conflicts = conflicting_variables(vars);
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(Error::EnvironmentConflict(conflicts))
    }
}

/// The process environment, lossily decoded.
pub fn environment_vars() -> Vec<(String, String)> {
    env::vars_os()
        .map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// Fails when the process environment would silently override the provider
/// files. Run it before `login`, never during.
pub fn check_environment() -> Result<()> {
    check_environment_vars(environment_vars())
}

/// Credential payload materialised into the provider credential file.
pub struct ActiveCredentials<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub session_token: Option<&'a str>,
}

impl<'a> From<&'a CredentialProfile> for ActiveCredentials<'a> {
    fn from(profile: &'a CredentialProfile) -> Self {
        Self {
            access_key: profile.access_key(),
            secret_key: profile.secret_key(),
            session_token: None,
        }
    }
}

/// Which role is currently assumed on top of which profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRole {
    pub profile_id: String,
    pub role_arn: String,
}

fn render_ini(path: &Path, pairs: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut ini = Ini::new();
    {
        let mut section = ini.with_section(Some(PROVIDER_SECTION));
        for (key, value) in pairs {
            section.set(*key, *value);
        }
    }
    let mut contents = Vec::new();
    ini.write_to(&mut contents).map_err(Error::io(path))?;
    Ok(contents)
}

fn read_ini_value(path: &Path, key: &str) -> Result<Option<String>> {
    let Some(contents) = utils::read_if_exists(path)? else {
        return Ok(None);
    };
    let ini = Ini::load_from_str(&contents).map_err(|err| Error::CorruptProviderFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(ini
        .section(Some(PROVIDER_SECTION))
        .and_then(|section| section.get(key))
        .map(ToString::to_string))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Login,
    Logout,
    Assume,
    Unassume,
    Rotate,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            HistoryAction::Login => "LOGIN",
            HistoryAction::Logout => "LOGOUT",
            HistoryAction::Assume => "ASSUME",
            HistoryAction::Unassume => "UNASSUME",
            HistoryAction::Rotate => "ROTATE",
        };
        f.write_str(action)
    }
}

/// The active-session pointer and the provider file pair it projects.
#[derive(Debug, Clone)]
pub struct Session {
    layout: StoreLayout,
}

impl Session {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn current_id(&self) -> Result<Option<String>> {
        let pointer = utils::read_if_exists(&self.layout.current_profile_file())?;
        Ok(pointer
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    /// Resolves the pointer to a profile. A pointer to a since deleted
    /// profile reads as logged out.
    pub fn get_current<P: ProvideProfiles>(&self, store: &P) -> Result<Option<CredentialProfile>> {
        let Some(id) = self.current_id()? else {
            return Ok(None);
        };
        match store.get_by_id(&id) {
            Ok(profile) => Ok(Some(profile)),
            Err(Error::ProfileNotFound(_)) => {
                warn!(%id, "session pointer references a missing profile");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn login(&self, profile: &CredentialProfile) -> Result<()> {
        self.activate(profile, ActiveCredentials::from(profile))
    }

    /// Writes the provider files for `profile` with the given credentials and
    /// points the session at it. The pointer is cleared first and written
    /// last, so a failure part way leaves the session logged out.
    pub(crate) fn activate(
        &self,
        profile: &CredentialProfile,
        credentials: ActiveCredentials<'_>,
    ) -> Result<()> {
        utils::remove_if_exists(&self.layout.current_profile_file())?;
        self.clear_current_role()?;

        let mut credential_pairs = vec![
            (KEY_ACCESS_KEY_ID, credentials.access_key),
            (KEY_SECRET_ACCESS_KEY, credentials.secret_key),
        ];
        if let Some(token) = credentials.session_token {
            credential_pairs.push((KEY_SESSION_TOKEN, token));
        }
        let credentials_file = self.layout.aws_credentials_file();
        utils::write_secret(
            &credentials_file,
            &render_ini(&credentials_file, &credential_pairs)?,
        )?;
        let config_file = self.layout.aws_config_file();
        utils::write_atomic(
            &config_file,
            &render_ini(
                &config_file,
                &[(KEY_REGION, profile.region()), (KEY_OUTPUT, profile.output())],
            )?,
        )?;
        utils::write_atomic(&self.layout.current_profile_file(), profile.id().as_bytes())?;

        debug!(id = profile.id(), name = profile.name(), "session activated");
        Ok(())
    }

    /// Clears the pointer and deletes both provider files. Safe to call when
    /// already logged out.
    pub fn logout(&self) -> Result<()> {
        utils::remove_if_exists(&self.layout.current_profile_file())?;
        self.clear_current_role()?;
        utils::remove_if_exists(&self.layout.aws_credentials_file())?;
        utils::remove_if_exists(&self.layout.aws_config_file())?;
        debug!("session cleared");
        Ok(())
    }

    /// The role assumed on top of the current profile, if any.
    pub fn current_role(&self) -> Result<Option<AssumedRole>> {
        let path = self.layout.current_role_file();
        let Some(contents) = utils::read_if_exists(&path)? else {
            return Ok(None);
        };
        let marker: AssumedRole = serde_json::from_str(&contents).map_err(Error::corrupt(&path))?;
        if self.current_id()?.as_deref() == Some(marker.profile_id.as_str()) {
            Ok(Some(marker))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn set_current_role(&self, marker: &AssumedRole) -> Result<()> {
        let path = self.layout.current_role_file();
        let contents = serde_json::to_vec(marker).map_err(Error::corrupt(&path))?;
        utils::write_secret(&path, &contents)
    }

    pub(crate) fn clear_current_role(&self) -> Result<()> {
        utils::remove_if_exists(&self.layout.current_role_file()).map(|_| ())
    }

    /// Appends `ACTION,PROFILE_NAME,timestamp` to the login history. Never
    /// fails the calling operation.
    pub fn record_history(&self, action: HistoryAction, profile_name: &str) {
        let path = self.layout.login_history_file();
        let line = format!(
            "{action},{profile_name},{}\n",
            crate::profile::now().format(crate::profile::timestamp::FORMAT)
        );
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = appended {
            warn!(path = %path.display(), %err, "could not append to login history");
        }
    }

    /// Access key id currently written to the provider credential file.
    pub fn active_access_key(&self) -> Result<Option<String>> {
        read_ini_value(&self.layout.aws_credentials_file(), KEY_ACCESS_KEY_ID)
    }
}
