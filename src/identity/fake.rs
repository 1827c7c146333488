use super::{AccessKeyMetadata, CallerIdentity, IdentityApi, NewAccessKey, TemporaryCredentials};
use crate::error::{Error, Result};
use crate::profile::CredentialProfile;
use std::cell::RefCell;

/// In-memory stand-in for the AWS identity services. Records every call and
/// can be told to fail a named operation.
pub struct FakeIdentity {
    pub account_id: String,
    pub principal_arn: String,
    pub aliases: Vec<String>,
    keys: RefCell<Vec<AccessKeyMetadata>>,
    created: RefCell<u32>,
    calls: RefCell<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl FakeIdentity {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            account_id: "123456789012".to_string(),
            principal_arn: "arn:aws:iam::123456789012:user/alice".to_string(),
            aliases: vec!["acme-prod".to_string()],
            keys: RefCell::new(
                keys.iter()
                    .map(|key_id| AccessKeyMetadata {
                        key_id: key_id.to_string(),
                        create_date: None,
                    })
                    .collect(),
            ),
            created: RefCell::new(0),
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn with_keys(keys: Vec<AccessKeyMetadata>) -> Self {
        let fake = Self::new(&[]);
        *fake.keys.borrow_mut() = keys;
        fake
    }

    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn key_ids(&self) -> Vec<String> {
        self.keys.borrow().iter().map(|k| k.key_id.clone()).collect()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(operation.to_string());
        if self.fail_on == Some(operation) {
            return Err(Error::ExternalService {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl IdentityApi for FakeIdentity {
    async fn get_caller_identity(&self, _profile: &CredentialProfile) -> Result<CallerIdentity> {
        self.record("GetCallerIdentity")?;
        Ok(CallerIdentity {
            account_id: self.account_id.clone(),
            principal_arn: self.principal_arn.clone(),
        })
    }

    async fn list_account_aliases(&self, _profile: &CredentialProfile) -> Result<Vec<String>> {
        self.record("ListAccountAliases")?;
        Ok(self.aliases.clone())
    }

    async fn list_access_keys(
        &self,
        _profile: &CredentialProfile,
        _user_name: &str,
    ) -> Result<Vec<AccessKeyMetadata>> {
        self.record("ListAccessKeys")?;
        Ok(self.keys.borrow().clone())
    }

    async fn create_access_key(
        &self,
        _profile: &CredentialProfile,
        _user_name: &str,
    ) -> Result<NewAccessKey> {
        self.record("CreateAccessKey")?;
        let mut created = self.created.borrow_mut();
        *created += 1;
        let key = NewAccessKey {
            key_id: format!("AKIANEW{created}"),
            secret: format!("new-secret-{created}"),
        };
        self.keys.borrow_mut().push(AccessKeyMetadata {
            key_id: key.key_id.clone(),
            create_date: None,
        });
        Ok(key)
    }

    async fn delete_access_key(
        &self,
        _profile: &CredentialProfile,
        _user_name: &str,
        key_id: &str,
    ) -> Result<()> {
        self.record("DeleteAccessKey")?;
        self.keys.borrow_mut().retain(|k| k.key_id != key_id);
        Ok(())
    }

    async fn assume_role(
        &self,
        _profile: &CredentialProfile,
        role_arn: &str,
    ) -> Result<TemporaryCredentials> {
        self.record("AssumeRole")?;
        let role = role_arn.rsplit('/').next().unwrap_or(role_arn);
        Ok(TemporaryCredentials {
            access_key: format!("ASIA{}", role.to_uppercase()),
            secret_key: format!("temp-secret-{role}"),
            session_token: format!("temp-token-{role}"),
            expires_at: None,
        })
    }
}
