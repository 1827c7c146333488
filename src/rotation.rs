use crate::error::{Error, Result};
use crate::identity::{AccessKeyMetadata, CallerIdentity, IdentityApi};
use crate::profile::CredentialProfile;
use crate::session::{HistoryAction, Session};
use crate::store::ProvideProfiles;
use chrono::Utc;
use tracing::{info, warn};

pub const KEY_AGE_WARN_DAYS: i64 = 50;
pub const KEY_AGE_ROTATE_DAYS: i64 = 60;

/// How urgently an access key should be rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAge {
    Fresh,
    Ageing,
    Stale,
}

impl KeyAge {
    pub fn from_days(days: i64) -> Self {
        if days >= KEY_AGE_ROTATE_DAYS {
            KeyAge::Stale
        } else if days >= KEY_AGE_WARN_DAYS {
            KeyAge::Ageing
        } else {
            KeyAge::Fresh
        }
    }
}

/// What the identity services report about a profile's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub account_id: String,
    pub principal_arn: String,
    pub user_name: Option<String>,
    pub alias: Option<String>,
    pub access_key: String,
    pub key_age_days: i64,
}

impl AccountDetails {
    pub fn key_age(&self) -> KeyAge {
        KeyAge::from_days(self.key_age_days)
    }
}

fn key_age_days(keys: &[AccessKeyMetadata], access_key: &str) -> i64 {
    keys.iter()
        .find(|key| key.key_id == access_key)
        .and_then(|key| key.create_date)
        .map_or(0, |created| (Utc::now() - created).num_days())
}

fn require_user_name(identity: &CallerIdentity) -> Result<String> {
    identity
        .user_name()
        .map(ToString::to_string)
        .ok_or_else(|| Error::ExternalService {
            operation: "GetCallerIdentity",
            message: format!("{} is not an IAM user", identity.principal_arn),
        })
}

pub async fn account_details<A: IdentityApi>(
    api: &A,
    profile: &CredentialProfile,
) -> Result<AccountDetails> {
    let identity = api.get_caller_identity(profile).await?;
    let alias = api.list_account_aliases(profile).await?.into_iter().next();
    let user_name = identity.user_name().map(ToString::to_string);
    let key_age_days = match &user_name {
        Some(user_name) => key_age_days(
            &api.list_access_keys(profile, user_name).await?,
            profile.access_key(),
        ),
        None => 0,
    };

    Ok(AccountDetails {
        account_id: identity.account_id,
        principal_arn: identity.principal_arn,
        user_name,
        alias,
        access_key: profile.access_key().to_string(),
        key_age_days,
    })
}

/// Outcome of a completed rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    pub profile: CredentialProfile,
    pub old_key_id: String,
    pub new_key_id: String,
}

/// Replaces the active profile's access key with a freshly issued one and
/// retires the old key. Ends logged out.
///
/// Nothing is rolled back: once the new key exists, a later failure leaves
/// both keys live at AWS. The new key id is logged when that happens.
pub async fn rotate<P, A>(store: &P, session: &Session, api: &A) -> Result<Rotation>
where
    P: ProvideProfiles,
    A: IdentityApi,
{
    let current = session.get_current(store)?.ok_or(Error::NotLoggedIn)?;
    let identity = api.get_caller_identity(&current).await?;
    let user_name = require_user_name(&identity)?;

    let keys = api.list_access_keys(&current, &user_name).await?;
    let old_key_id = match keys.as_slice() {
        [] => return Err(Error::NoAccessKeys(user_name)),
        [only] => only.key_id.clone(),
        [first, second, ..] => {
            return Err(Error::TooManyAccessKeys(
                first.key_id.clone(),
                second.key_id.clone(),
            ))
        }
    };

    let new_key = api.create_access_key(&current, &user_name).await?;
    info!(%user_name, new_key_id = %new_key.key_id, "created replacement access key");

    let profile = match store.get_by_access_key(&old_key_id) {
        Ok(profile) => profile,
        Err(err) => {
            warn!(new_key_id = %new_key.key_id, %old_key_id, "replacement key was created but not saved");
            return Err(err);
        }
    };
    let profile = store.update(profile.with_access_keys(new_key.key_id.clone(), new_key.secret))?;

    if let Err(err) = api.delete_access_key(&current, &user_name, &old_key_id).await {
        warn!(new_key_id = %new_key.key_id, %old_key_id, "old access key is still active");
        return Err(err);
    }

    session.logout()?;
    session.record_history(HistoryAction::Rotate, profile.name());
    info!(name = profile.name(), %old_key_id, new_key_id = %new_key.key_id, "rotated access key");

    Ok(Rotation {
        profile,
        old_key_id,
        new_key_id: new_key.key_id,
    })
}
