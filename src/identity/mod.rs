mod aws;
#[cfg(test)]
pub mod fake;

use crate::error::Result;
use crate::profile::CredentialProfile;
use chrono::{DateTime, Utc};

pub use aws::AwsIdentityApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
    pub principal_arn: String,
}

impl CallerIdentity {
    /// IAM user name, the last path segment of the principal ARN.
    pub fn user_name(&self) -> Option<&str> {
        self.principal_arn
            .split_once('/')
            .and_then(|_| self.principal_arn.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyMetadata {
    pub key_id: String,
    pub create_date: Option<DateTime<Utc>>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct NewAccessKey {
    pub key_id: String,
    pub secret: String,
}

impl std::fmt::Debug for NewAccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccessKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key", &self.access_key)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// The slice of the AWS identity services the tool needs. Every call acts
/// with the base credentials of the given profile.
pub trait IdentityApi {
    async fn get_caller_identity(&self, profile: &CredentialProfile) -> Result<CallerIdentity>;

    async fn list_account_aliases(&self, profile: &CredentialProfile) -> Result<Vec<String>>;

    async fn list_access_keys(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
    ) -> Result<Vec<AccessKeyMetadata>>;

    async fn create_access_key(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
    ) -> Result<NewAccessKey>;

    async fn delete_access_key(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
        key_id: &str,
    ) -> Result<()>;

    async fn assume_role(
        &self,
        profile: &CredentialProfile,
        role_arn: &str,
    ) -> Result<TemporaryCredentials>;
}
