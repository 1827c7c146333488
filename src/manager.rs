use crate::defaults::DefaultsStore;
use crate::error::{Error, Result};
use crate::identity::IdentityApi;
use crate::layout::StoreLayout;
use crate::profile::{CredentialProfile, ProfileFields};
use crate::roles;
use crate::rotation::{self, AccountDetails, Rotation};
use crate::session::{self, AssumedRole, HistoryAction, Session};
use crate::store::{ProfileStore, ProvideProfiles};
use tracing::{debug, info};

/// Everything `status` reports about the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub profile: CredentialProfile,
    pub role: Option<AssumedRole>,
    pub details: AccountDetails,
}

/// Owns the profile store, session and defaults rooted at one directory and
/// runs the operations that span more than one of them.
pub struct CredsManager {
    store: ProfileStore,
    session: Session,
    defaults: DefaultsStore,
}

impl CredsManager {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            defaults: DefaultsStore::new(&layout),
            session: Session::new(layout.clone()),
            store: ProfileStore::new(layout),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn defaults(&self) -> &DefaultsStore {
        &self.defaults
    }

    pub fn migrate(&self) -> Result<usize> {
        self.store.migrate_legacy()
    }

    /// Saves a new profile, filling a blank region or output from the defaults.
    pub fn add(&self, mut fields: ProfileFields) -> Result<CredentialProfile> {
        if fields.region.trim().is_empty() || fields.output.trim().is_empty() {
            let defaults = self.defaults.get()?;
            if fields.region.trim().is_empty() {
                fields.region = defaults.region;
            }
            if fields.output.trim().is_empty() {
                fields.output = defaults.output;
            }
        }
        self.store.add(fields)
    }

    pub fn list(&self) -> Result<Vec<CredentialProfile>> {
        self.store.get_all()
    }

    /// Looks a profile up by name, case-insensitively.
    pub fn profile(&self, name: &str) -> Result<CredentialProfile> {
        self.store
            .find_by_name(name)?
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    pub fn current(&self) -> Result<Option<CredentialProfile>> {
        self.session.get_current(&self.store)
    }

    fn require_current(&self) -> Result<CredentialProfile> {
        self.current()?.ok_or(Error::NotLoggedIn)
    }

    /// Persists an edited profile. The provider files are rewritten when it is
    /// the active one.
    pub fn update(&self, profile: CredentialProfile) -> Result<CredentialProfile> {
        let updated = self.store.update(profile)?;
        if self.session.current_id()?.as_deref() == Some(updated.id()) {
            debug!(name = updated.name(), "refreshing provider files for the active profile");
            self.session.login(&updated)?;
        }
        Ok(updated)
    }

    /// Deletes a profile, logging out first when it is the active one.
    pub fn remove(&self, id: &str) -> Result<CredentialProfile> {
        let profile = self.store.get_by_id(id)?;
        if self.session.current_id()?.as_deref() == Some(id) {
            self.session.logout()?;
            self.session.record_history(HistoryAction::Logout, profile.name());
        }
        self.store.delete(id)?;
        info!(id, name = profile.name(), "removed profile");
        Ok(profile)
    }

    /// Refuses to run while provider environment variables are set, then
    /// activates `profile`.
    pub fn login(&self, profile: &CredentialProfile) -> Result<()> {
        session::check_environment()?;
        self.activate(profile)
    }

    fn activate(&self, profile: &CredentialProfile) -> Result<()> {
        self.session.login(profile)?;
        self.session.record_history(HistoryAction::Login, profile.name());
        info!(name = profile.name(), "logged in");
        Ok(())
    }

    /// Returns the profile that was active, if any.
    pub fn logout(&self) -> Result<Option<CredentialProfile>> {
        let current = self.current()?;
        self.session.logout()?;
        if let Some(profile) = &current {
            self.session.record_history(HistoryAction::Logout, profile.name());
            info!(name = profile.name(), "logged out");
        }
        Ok(current)
    }

    pub fn add_role(&self, profile: CredentialProfile, role_arn: &str) -> Result<CredentialProfile> {
        roles::add_role(&self.store, profile, role_arn)
    }

    pub fn remove_role(
        &self,
        profile: CredentialProfile,
        index: usize,
    ) -> Result<(CredentialProfile, String)> {
        roles::remove_role(&self.store, &self.session, profile, index)
    }

    pub async fn assume_role<A: IdentityApi>(
        &self,
        api: &A,
        profile: &CredentialProfile,
        role_arn: &str,
    ) -> Result<AssumedRole> {
        roles::assume_role(&self.store, &self.session, api, profile, role_arn).await
    }

    /// Drops the assumed role of the active profile. Returns `false` when
    /// there was nothing to drop.
    pub fn unassume_role(&self) -> Result<bool> {
        match self.current()? {
            Some(profile) => roles::unassume_role(&self.session, &profile),
            None => Ok(false),
        }
    }

    pub fn current_role(&self) -> Result<Option<AssumedRole>> {
        roles::get_current_role(&self.session)
    }

    pub async fn rotate<A: IdentityApi>(&self, api: &A) -> Result<Rotation> {
        rotation::rotate(&self.store, &self.session, api).await
    }

    pub async fn account_details<A: IdentityApi>(
        &self,
        api: &A,
        profile: &CredentialProfile,
    ) -> Result<AccountDetails> {
        rotation::account_details(api, profile).await
    }

    pub async fn status<A: IdentityApi>(&self, api: &A) -> Result<Status> {
        let profile = self.require_current()?;
        let details = rotation::account_details(api, &profile).await?;
        Ok(Status {
            role: self.current_role()?,
            profile,
            details,
        })
    }
}
