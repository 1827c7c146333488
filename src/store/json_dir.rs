use super::ProvideProfiles;
use crate::error::{Error, Result};
use crate::layout::{StoreLayout, DEFAULTS_DIR, RECORD_FILE};
use crate::profile::{normalize_name, CredentialProfile, ProfileFields, ProfileRecord};
use crate::utils;
use serde::Deserialize;
use std::fs;
use std::io;
use tracing::{debug, info, warn};

/// Entry of the legacy `accounts.json` list.
#[derive(Debug, Deserialize)]
struct LegacyAccount {
    profile: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "access-key")]
    access_key: String,
    #[serde(rename = "secret-key")]
    secret_key: String,
    region: String,
    output: String,
}

/// One directory per profile id, each holding a pretty printed
/// `credential.json`.
#[derive(Debug, Clone)]
pub struct JsonDirProfileStore {
    layout: StoreLayout,
}

impl JsonDirProfileStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    fn write_record(&self, profile: &CredentialProfile) -> Result<()> {
        let path = self.layout.profile_record(profile.id());
        let contents = serde_json::to_vec_pretty(&ProfileRecord::from(profile))
            .map_err(Error::corrupt(&path))?;
        utils::write_secret(&path, &contents)
    }

    fn find_by_access_key(&self, access_key: &str) -> Result<Option<CredentialProfile>> {
        match self.get_by_access_key(access_key) {
            Ok(profile) => Ok(Some(profile)),
            Err(Error::NoCredentialForAccessKey(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `name` itself when unused, otherwise the first free `NAME-LEGACY`,
    /// `NAME-LEGACY-2`, ...
    fn free_legacy_name(&self, name: &str) -> Result<String> {
        let name = normalize_name(name);
        let taken: Vec<String> = self
            .get_all()?
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let mut candidate = name.clone();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = match suffix {
                1 => format!("{name}-LEGACY"),
                n => format!("{name}-LEGACY-{n}"),
            };
            suffix += 1;
        }
        Ok(candidate)
    }

    fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .get_all()?
            .iter()
            .any(|p| p.name() == name && Some(p.id()) != except_id);
        if taken {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

/// Ids are generated UUIDs; anything that could escape the profiles
/// directory is treated as unknown.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != DEFAULTS_DIR
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ProvideProfiles for JsonDirProfileStore {
    fn add(&self, fields: ProfileFields) -> Result<CredentialProfile> {
        self.ensure_name_free(&normalize_name(&fields.name), None)?;
        let profile = CredentialProfile::create(fields);
        self.write_record(&profile)?;
        info!(id = profile.id(), name = profile.name(), "profile added");
        Ok(profile)
    }

    fn get_all(&self) -> Result<Vec<CredentialProfile>> {
        let profiles_dir = self.layout.profiles_dir();
        let entries = match fs::read_dir(&profiles_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(&profiles_dir)(err)),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::io(&profiles_dir))?;
            let file_type = entry.file_type().map_err(Error::io(&entry.path()))?;
            let id = entry.file_name().to_string_lossy().into_owned();
            if !file_type.is_dir() || id == DEFAULTS_DIR {
                continue;
            }
            if !entry.path().join(RECORD_FILE).exists() {
                debug!(%id, "skipping profile directory without a record");
                continue;
            }
            profiles.push(self.get_by_id(&id)?);
        }

        profiles.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(profiles)
    }

    fn get_by_id(&self, id: &str) -> Result<CredentialProfile> {
        if !is_valid_id(id) {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        let path = self.layout.profile_record(id);
        let contents = utils::read_if_exists(&path)?
            .ok_or_else(|| Error::ProfileNotFound(id.to_string()))?;
        let record: ProfileRecord = serde_json::from_str(&contents).map_err(Error::corrupt(&path))?;
        Ok(record.into())
    }

    fn update(&self, profile: CredentialProfile) -> Result<CredentialProfile> {
        if !is_valid_id(profile.id()) || !self.layout.profile_record(profile.id()).exists() {
            return Err(Error::ProfileNotFound(profile.id().to_string()));
        }
        self.ensure_name_free(profile.name(), Some(profile.id()))?;
        let profile = profile.touched();
        self.write_record(&profile)?;
        debug!(id = profile.id(), name = profile.name(), "profile updated");
        Ok(profile)
    }

    fn delete(&self, id: &str) -> Result<()> {
        if !is_valid_id(id) || !self.layout.profile_record(id).exists() {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        let dir = self.layout.profile_dir(id);
        fs::remove_dir_all(&dir).map_err(Error::io(&dir))?;
        info!(id, "profile deleted");
        Ok(())
    }

    fn migrate_legacy(&self) -> Result<usize> {
        let legacy_path = self.layout.legacy_accounts_file();
        let Some(contents) = utils::read_if_exists(&legacy_path)? else {
            return Ok(0);
        };
        let accounts: Vec<LegacyAccount> =
            serde_json::from_str(&contents).map_err(Error::corrupt(&legacy_path))?;

        let mut migrated = 0;
        for account in accounts {
            let fields = ProfileFields {
                name: account.profile,
                description: account.description,
                access_key: account.access_key,
                secret_key: account.secret_key,
                region: account.region,
                output: account.output,
            };
            // A previous, interrupted migration may already have saved it.
            if let Some(existing) = self.find_by_access_key(&fields.access_key)? {
                warn!(name = existing.name(), "legacy profile already migrated, skipping");
                continue;
            }
            let name = self.free_legacy_name(&fields.name)?;
            if name != normalize_name(&fields.name) {
                warn!(legacy = %fields.name, %name, "legacy profile name taken, importing under a new name");
            }
            self.add(ProfileFields { name, ..fields })?;
            migrated += 1;
        }

        utils::remove_if_exists(&legacy_path)?;
        info!(migrated, "migrated legacy accounts file");
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::profile::tests::fields;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonDirProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirProfileStore::new(StoreLayout::new(dir.path()));
        (dir, store)
    }

    fn names(store: &JsonDirProfileStore) -> Vec<String> {
        store
            .get_all()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_list_sorted() {
        let (_dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        assert_eq!(names(&store), ["PROD"]);
        store.add(fields("dev", "AKIA2")).unwrap();
        store.add(fields("Alpha", "AKIA3")).unwrap();
        assert_eq!(names(&store), ["ALPHA", "DEV", "PROD"]);
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_writing() {
        let (_dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        let err = store.add(fields("PROD", "AKIA9")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "PROD"));
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].access_key(), "AKIA1");
    }

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        let (_dir, store) = store();
        let a = store.add(fields("a", "AKIA1")).unwrap();
        let b = store.add(fields("b", "AKIA2")).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(store.get_by_id(a.id()).unwrap(), a);
    }

    #[test]
    fn test_get_by_id_unknown() {
        let (_dir, store) = store();
        let err = store.get_by_id("does-not-exist").unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(_)));
        let err = store.get_by_id("../escape").unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(_)));
    }

    #[test]
    fn test_get_by_access_key() {
        let (_dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        let dev = store.add(fields("dev", "AKIA2")).unwrap();
        assert_eq!(store.get_by_access_key("AKIA2").unwrap().id(), dev.id());
        let err = store.get_by_access_key("AKIA404").unwrap_err();
        assert!(matches!(err, Error::NoCredentialForAccessKey(ref k) if k == "AKIA404"));
    }

    #[test]
    fn test_update_refreshes_modified_date() {
        let (_dir, store) = store();
        let profile = store.add(fields("prod", "AKIA1")).unwrap();
        let updated = store
            .update(profile.clone().with_description("production"))
            .unwrap();
        assert!(updated.modified_date() >= profile.modified_date());
        assert_eq!(updated.create_date(), profile.create_date());
        assert_eq!(store.get_by_id(profile.id()).unwrap().description(), "production");
    }

    #[test]
    fn test_update_rename_onto_existing_name_fails() {
        let (_dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        let dev = store.add(fields("dev", "AKIA2")).unwrap();
        let err = store.update(dev.with_name("prod")).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn test_update_and_delete_missing_profile() {
        let (_dir, store) = store();
        let profile = store.add(fields("prod", "AKIA1")).unwrap();
        store.delete(profile.id()).unwrap();
        assert!(matches!(
            store.update(profile.clone()).unwrap_err(),
            Error::ProfileNotFound(_)
        ));
        assert!(matches!(
            store.delete(profile.id()).unwrap_err(),
            Error::ProfileNotFound(_)
        ));
    }

    #[test]
    fn test_corrupt_record_fails_only_that_lookup() {
        let (dir, store) = store();
        let good = store.add(fields("good", "AKIA1")).unwrap();
        let bad = store.add(fields("bad", "AKIA2")).unwrap();
        let bad_path = StoreLayout::new(dir.path()).profile_record(bad.id());
        fs::write(&bad_path, "{ not json").unwrap();

        assert_eq!(store.get_by_id(good.id()).unwrap(), good);
        let err = store.get_by_id(bad.id()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(store.get_all().is_err());
    }

    #[test]
    fn test_defaults_directory_is_not_a_profile() {
        let (dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        let defaults = StoreLayout::new(dir.path()).defaults_file();
        fs::create_dir_all(defaults.parent().unwrap()).unwrap();
        fs::write(&defaults, r#"{"output": "json", "region": "us-east-1"}"#).unwrap();
        assert_eq!(names(&store), ["PROD"]);
    }

    const LEGACY: &str = r#"[
        {"profile": "prod", "description": "Production", "access-key": "AKIA1",
         "secret-key": "s1", "region": "us-east-1", "output": "json"},
        {"profile": "dev", "description": "Development", "access-key": "AKIA2",
         "secret-key": "s2", "region": "eu-west-1", "output": "text"}
    ]"#;

    #[test]
    fn test_migrate_legacy() {
        let (dir, store) = store();
        let legacy = StoreLayout::new(dir.path()).legacy_accounts_file();
        fs::write(&legacy, LEGACY).unwrap();

        assert_eq!(store.migrate_legacy().unwrap(), 2);
        assert!(!legacy.exists());
        assert_eq!(names(&store), ["DEV", "PROD"]);
        let dev = store.get_by_access_key("AKIA2").unwrap();
        assert_eq!(dev.secret_key(), "s2");
        assert_eq!(dev.region(), "eu-west-1");
        assert_eq!(dev.output(), "text");
    }

    #[test]
    fn test_migrate_legacy_is_idempotent() {
        let (dir, store) = store();
        fs::write(StoreLayout::new(dir.path()).legacy_accounts_file(), LEGACY).unwrap();
        store.migrate_legacy().unwrap();
        let before = store.get_all().unwrap();

        assert_eq!(store.migrate_legacy().unwrap(), 0);
        assert_eq!(store.get_all().unwrap(), before);
    }

    #[test]
    fn test_migrate_legacy_skips_already_saved_keys() {
        let (dir, store) = store();
        store.add(fields("prod", "AKIA1")).unwrap();
        fs::write(StoreLayout::new(dir.path()).legacy_accounts_file(), LEGACY).unwrap();
        assert_eq!(store.migrate_legacy().unwrap(), 1);
        assert_eq!(names(&store), ["DEV", "PROD"]);
    }

    #[test]
    fn test_migrate_legacy_keeps_key_when_name_is_taken() {
        let (dir, store) = store();
        store.add(fields("prod", "AKIA9")).unwrap();
        let legacy = StoreLayout::new(dir.path()).legacy_accounts_file();
        fs::write(&legacy, LEGACY).unwrap();

        assert_eq!(store.migrate_legacy().unwrap(), 2);
        assert!(!legacy.exists());
        assert_eq!(names(&store), ["DEV", "PROD", "PROD-LEGACY"]);
        let imported = store.get_by_access_key("AKIA1").unwrap();
        assert_eq!(imported.name(), "PROD-LEGACY");
        assert_eq!(imported.secret_key(), "s1");
        assert_eq!(store.get_by_access_key("AKIA9").unwrap().name(), "PROD");

        assert_eq!(store.migrate_legacy().unwrap(), 0);
    }

    #[test]
    fn test_migrate_corrupt_legacy_file_is_kept() {
        let (dir, store) = store();
        let legacy = StoreLayout::new(dir.path()).legacy_accounts_file();
        fs::write(&legacy, "[{").unwrap();
        let err = store.migrate_legacy().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(legacy.exists());
    }
}
