use crate::error::Result;
use crate::identity::IdentityApi;
use crate::profile::CredentialProfile;
use crate::session::{ActiveCredentials, AssumedRole, HistoryAction, Session};
use crate::store::ProvideProfiles;
use tracing::{debug, info};

pub fn add_role<P: ProvideProfiles>(
    store: &P,
    profile: CredentialProfile,
    role_arn: &str,
) -> Result<CredentialProfile> {
    let profile = store.update(profile.with_role_added(role_arn.trim()))?;
    info!(name = profile.name(), role_arn, "added role");
    Ok(profile)
}

/// Drops the role at `index`, unassuming it first when it is the one in use.
pub fn remove_role<P: ProvideProfiles>(
    store: &P,
    session: &Session,
    profile: CredentialProfile,
    index: usize,
) -> Result<(CredentialProfile, String)> {
    let (updated, removed) = profile.clone().with_role_removed(index)?;
    if session
        .current_role()?
        .is_some_and(|marker| marker.profile_id == profile.id() && marker.role_arn == removed)
    {
        unassume_role(session, &profile)?;
    }
    let updated = store.update(updated)?;
    info!(name = updated.name(), role_arn = %removed, "removed role");
    Ok((updated, removed))
}

/// Swaps the provider credential file over to temporary credentials for
/// `role_arn`, obtained with the base credentials of `profile`. Any role
/// already assumed is dropped first, and `profile` becomes the active one.
pub async fn assume_role<P, A>(
    store: &P,
    session: &Session,
    api: &A,
    profile: &CredentialProfile,
    role_arn: &str,
) -> Result<AssumedRole>
where
    P: ProvideProfiles,
    A: IdentityApi,
{
    if session.current_role()?.is_some() {
        if let Some(current) = session.get_current(store)? {
            unassume_role(session, &current)?;
        }
    }

    let temporary = api.assume_role(profile, role_arn).await?;
    session.activate(
        profile,
        ActiveCredentials {
            access_key: &temporary.access_key,
            secret_key: &temporary.secret_key,
            session_token: Some(&temporary.session_token),
        },
    )?;
    let marker = AssumedRole {
        profile_id: profile.id().to_string(),
        role_arn: role_arn.to_string(),
    };
    session.set_current_role(&marker)?;
    session.record_history(HistoryAction::Assume, profile.name());
    debug!(name = profile.name(), role_arn, expires_at = ?temporary.expires_at, "assumed role");
    Ok(marker)
}

/// Restores the base credentials of `profile`. Returns `false` when no role
/// was assumed on it.
pub fn unassume_role(session: &Session, profile: &CredentialProfile) -> Result<bool> {
    match session.current_role()? {
        Some(marker) if marker.profile_id == profile.id() => {
            session.login(profile)?;
            session.record_history(HistoryAction::Unassume, profile.name());
            debug!(name = profile.name(), role_arn = %marker.role_arn, "unassumed role");
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub fn get_current_role(session: &Session) -> Result<Option<AssumedRole>> {
    session.current_role()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::identity::fake::FakeIdentity;
    use crate::layout::StoreLayout;
    use crate::profile::tests::fields;
    use crate::store::JsonDirProfileStore;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const ADMIN: &str = "arn:aws:iam::123456789012:role/admin";
    const READER: &str = "arn:aws:iam::123456789012:role/reader";

    struct Fixture {
        _dir: TempDir,
        layout: StoreLayout,
        store: JsonDirProfileStore,
        session: Session,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        Fixture {
            store: JsonDirProfileStore::new(layout.clone()),
            session: Session::new(layout.clone()),
            layout,
            _dir: dir,
        }
    }

    fn credentials_file(f: &Fixture) -> String {
        fs::read_to_string(f.layout.aws_credentials_file()).unwrap()
    }

    #[test]
    fn test_add_and_remove_roles() {
        let f = fixture();
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        let prod = add_role(&f.store, prod, ADMIN).unwrap();
        let prod = add_role(&f.store, prod, READER).unwrap();
        assert_eq!(f.store.get_by_id(prod.id()).unwrap().roles(), [ADMIN, READER]);

        let (prod, removed) = remove_role(&f.store, &f.session, prod, 0).unwrap();
        assert_eq!(removed, ADMIN);
        assert_eq!(f.store.get_by_id(prod.id()).unwrap().roles(), [READER]);
    }

    #[test]
    fn test_remove_role_out_of_range() {
        let f = fixture();
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        let prod = add_role(&f.store, prod, ADMIN).unwrap();
        let err = remove_role(&f.store, &f.session, prod.clone(), 5).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 1 }));
        assert_eq!(f.store.get_by_id(prod.id()).unwrap().roles(), [ADMIN]);
    }

    #[tokio::test]
    async fn test_assume_then_unassume_restores_login_state() {
        let f = fixture();
        let api = FakeIdentity::new(&["AKIA1"]);
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        f.session.login(&prod).unwrap();
        let logged_in = credentials_file(&f);

        let marker = assume_role(&f.store, &f.session, &api, &prod, ADMIN).await.unwrap();
        assert_eq!(get_current_role(&f.session).unwrap(), Some(marker));
        let assumed = credentials_file(&f);
        assert!(assumed.contains("aws_access_key_id=ASIAADMIN"));
        assert!(assumed.contains("aws_session_token=temp-token-admin"));
        assert_eq!(f.session.current_id().unwrap().as_deref(), Some(prod.id()));

        assert!(unassume_role(&f.session, &prod).unwrap());
        assert_eq!(credentials_file(&f), logged_in);
        assert_eq!(get_current_role(&f.session).unwrap(), None);
        assert_eq!(api.calls(), ["AssumeRole"]);
    }

    #[tokio::test]
    async fn test_assume_replaces_previous_role() {
        let f = fixture();
        let api = FakeIdentity::new(&["AKIA1"]);
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        f.session.login(&prod).unwrap();

        assume_role(&f.store, &f.session, &api, &prod, ADMIN).await.unwrap();
        assume_role(&f.store, &f.session, &api, &prod, READER).await.unwrap();

        let marker = get_current_role(&f.session).unwrap().unwrap();
        assert_eq!(marker.role_arn, READER);
        assert!(credentials_file(&f).contains("aws_access_key_id=ASIAREADER"));
    }

    #[tokio::test]
    async fn test_assume_from_inactive_profile_switches_to_it() {
        let f = fixture();
        let api = FakeIdentity::new(&["AKIA2"]);
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        let dev = f.store.add(fields("dev", "AKIA2")).unwrap();
        f.session.login(&prod).unwrap();

        assume_role(&f.store, &f.session, &api, &dev, ADMIN).await.unwrap();
        assert_eq!(f.session.current_id().unwrap().as_deref(), Some(dev.id()));
    }

    #[tokio::test]
    async fn test_failed_assume_keeps_base_credentials() {
        let f = fixture();
        let api = FakeIdentity::new(&["AKIA1"]).failing_on("AssumeRole");
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        f.session.login(&prod).unwrap();
        let logged_in = credentials_file(&f);

        let err = assume_role(&f.store, &f.session, &api, &prod, ADMIN).await.unwrap_err();
        assert!(matches!(err, Error::ExternalService { operation: "AssumeRole", .. }));
        assert_eq!(credentials_file(&f), logged_in);
        assert_eq!(get_current_role(&f.session).unwrap(), None);
    }

    #[test]
    fn test_unassume_without_role_is_noop() {
        let f = fixture();
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        assert!(!unassume_role(&f.session, &prod).unwrap());
        assert!(!f.layout.aws_credentials_file().exists());
    }

    #[tokio::test]
    async fn test_removing_assumed_role_unassumes_it() {
        let f = fixture();
        let api = FakeIdentity::new(&["AKIA1"]);
        let prod = f.store.add(fields("prod", "AKIA1")).unwrap();
        let prod = add_role(&f.store, prod, ADMIN).unwrap();
        f.session.login(&prod).unwrap();
        assume_role(&f.store, &f.session, &api, &prod, ADMIN).await.unwrap();

        let (prod, _) = remove_role(&f.store, &f.session, prod, 0).unwrap();
        assert!(prod.roles().is_empty());
        assert_eq!(get_current_role(&f.session).unwrap(), None);
        assert!(credentials_file(&f).contains("aws_access_key_id=AKIA1"));
    }
}
