mod json_dir;

use crate::error::{Error, Result};
use crate::profile::{normalize_name, CredentialProfile, ProfileFields};

pub use json_dir::JsonDirProfileStore;

pub type ProfileStore = JsonDirProfileStore;

/// System of record for saved credential profiles.
pub trait ProvideProfiles {
    /// Persists a new profile under a fresh id. Fails with
    /// [`Error::DuplicateName`] when the normalized name is already taken.
    fn add(&self, fields: ProfileFields) -> Result<CredentialProfile>;

    /// All profiles, ascending by (upper-cased) name.
    fn get_all(&self) -> Result<Vec<CredentialProfile>>;

    fn get_by_id(&self, id: &str) -> Result<CredentialProfile>;

    /// Overwrites the record stored under `profile.id()` and refreshes its
    /// modified date.
    fn update(&self, profile: CredentialProfile) -> Result<CredentialProfile>;

    /// Deletes the stored record only. Callers that may hold the active
    /// session go through `CredsManager::remove` instead.
    fn delete(&self, id: &str) -> Result<()>;

    /// Converts the pre-0.5 single file store, then deletes it. Returns the
    /// number of profiles created.
    fn migrate_legacy(&self) -> Result<usize>;

    fn get_by_access_key(&self, access_key: &str) -> Result<CredentialProfile> {
        self.get_all()?
            .into_iter()
            .find(|profile| profile.access_key() == access_key)
            .ok_or_else(|| Error::NoCredentialForAccessKey(access_key.to_string()))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CredentialProfile>> {
        let name = normalize_name(name);
        Ok(self
            .get_all()?
            .into_iter()
            .find(|profile| profile.name() == name))
    }
}
