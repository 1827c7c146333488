use super::{AccessKeyMetadata, CallerIdentity, IdentityApi, NewAccessKey, TemporaryCredentials};
use crate::defaults::FALLBACK_REGION;
use crate::error::{Error, Result};
use crate::profile::CredentialProfile;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_sts::config::Credentials;
use aws_smithy_runtime_api::client::result::SdkError;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const CREDENTIALS_PROVIDER_NAME: &str = "aws-creds-profile";
const SESSION_NAME_PREFIX: &str = "aws-creds-";
const SESSION_NAME_MAX_LEN: usize = 64;
const ASSUME_ROLE_DURATION_SECONDS: i32 = 3600;

static SESSION_NAME_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_+=,.@-]").expect("Const pattern should be valid"));

fn sdk_error<E, R>(operation: &'static str) -> impl FnOnce(SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    move |err| Error::ExternalService {
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn missing_field(operation: &'static str, field: &str) -> Error {
    Error::ExternalService {
        operation,
        message: format!("response did not include {field}"),
    }
}

pub(crate) fn role_session_name(profile_name: &str) -> String {
    let name = format!("{SESSION_NAME_PREFIX}{profile_name}");
    let mut name = SESSION_NAME_INVALID.replace_all(&name, "-").into_owned();
    name.truncate(SESSION_NAME_MAX_LEN);
    name
}

/// [`IdentityApi`] backed by the AWS SDK (STS and IAM).
#[derive(Debug, Default)]
pub struct AwsIdentityApi;

impl AwsIdentityApi {
    pub fn new() -> Self {
        Self
    }

    async fn sdk_config(profile: &CredentialProfile) -> SdkConfig {
        let region = if profile.region().is_empty() {
            FALLBACK_REGION
        } else {
            profile.region()
        };
        let credentials = Credentials::new(
            profile.access_key(),
            profile.secret_key(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await
    }

    async fn sts(profile: &CredentialProfile) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(&Self::sdk_config(profile).await)
    }

    async fn iam(profile: &CredentialProfile) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(&Self::sdk_config(profile).await)
    }
}

impl IdentityApi for AwsIdentityApi {
    async fn get_caller_identity(&self, profile: &CredentialProfile) -> Result<CallerIdentity> {
        const OPERATION: &str = "GetCallerIdentity";
        let output = Self::sts(profile)
            .await
            .get_caller_identity()
            .send()
            .await
            .map_err(sdk_error(OPERATION))?;

        Ok(CallerIdentity {
            account_id: output
                .account()
                .ok_or_else(|| missing_field(OPERATION, "Account"))?
                .to_string(),
            principal_arn: output
                .arn()
                .ok_or_else(|| missing_field(OPERATION, "Arn"))?
                .to_string(),
        })
    }

    async fn list_account_aliases(&self, profile: &CredentialProfile) -> Result<Vec<String>> {
        let pages = Self::iam(profile)
            .await
            .list_account_aliases()
            .into_paginator()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(sdk_error("ListAccountAliases"))?;

        Ok(pages
            .iter()
            .flat_map(|page| page.account_aliases().iter().cloned())
            .collect())
    }

    async fn list_access_keys(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
    ) -> Result<Vec<AccessKeyMetadata>> {
        let output = Self::iam(profile)
            .await
            .list_access_keys()
            .user_name(user_name)
            .send()
            .await
            .map_err(sdk_error("ListAccessKeys"))?;

        Ok(output
            .access_key_metadata()
            .iter()
            .filter_map(|metadata| {
                Some(AccessKeyMetadata {
                    key_id: metadata.access_key_id()?.to_string(),
                    create_date: metadata
                        .create_date()
                        .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos())),
                })
            })
            .collect())
    }

    async fn create_access_key(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
    ) -> Result<NewAccessKey> {
        const OPERATION: &str = "CreateAccessKey";
        let output = Self::iam(profile)
            .await
            .create_access_key()
            .user_name(user_name)
            .send()
            .await
            .map_err(sdk_error(OPERATION))?;

        let access_key = output
            .access_key()
            .ok_or_else(|| missing_field(OPERATION, "AccessKey"))?;
        debug!(key_id = access_key.access_key_id(), "created access key");
        Ok(NewAccessKey {
            key_id: access_key.access_key_id().to_string(),
            secret: access_key.secret_access_key().to_string(),
        })
    }

    async fn delete_access_key(
        &self,
        profile: &CredentialProfile,
        user_name: &str,
        key_id: &str,
    ) -> Result<()> {
        Self::iam(profile)
            .await
            .delete_access_key()
            .user_name(user_name)
            .access_key_id(key_id)
            .send()
            .await
            .map_err(sdk_error("DeleteAccessKey"))?;
        debug!(key_id, "deleted access key");
        Ok(())
    }

    async fn assume_role(
        &self,
        profile: &CredentialProfile,
        role_arn: &str,
    ) -> Result<TemporaryCredentials> {
        const OPERATION: &str = "AssumeRole";
        let expires_at = Utc::now() + Duration::seconds(i64::from(ASSUME_ROLE_DURATION_SECONDS));
        let output = Self::sts(profile)
            .await
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(role_session_name(profile.name()))
            .duration_seconds(ASSUME_ROLE_DURATION_SECONDS)
            .send()
            .await
            .map_err(sdk_error(OPERATION))?;

        let credentials = output
            .credentials()
            .ok_or_else(|| missing_field(OPERATION, "Credentials"))?;
        Ok(TemporaryCredentials {
            access_key: credentials.access_key_id().to_string(),
            secret_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expires_at: Some(expires_at),
        })
    }
}
