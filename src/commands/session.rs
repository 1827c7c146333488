use super::Error;
use crate::error::ErrorKind;
use crate::identity::IdentityApi;
use crate::manager::CredsManager;
use crate::rotation::{AccountDetails, KeyAge};
use tracing::debug;

fn print_key_age(details: &AccountDetails) {
    let days = details.key_age_days;
    match details.key_age() {
        KeyAge::Fresh => println!("Your access key is {days} days old."),
        KeyAge::Ageing => println!(
            "Warning: your access key is {days} days old. Rotate it soon with 'aws-creds rotate'."
        ),
        KeyAge::Stale => println!(
            "Your access key is {days} days old. Rotate it immediately with 'aws-creds rotate'."
        ),
    }
}

pub async fn exec_login<A: IdentityApi>(
    manager: &CredsManager,
    api: &A,
    name: &str,
) -> Result<(), Error> {
    let profile = manager.profile(name)?;
    manager.login(&profile)?;
    println!("Logged in as {}.", profile.name());

    match manager.account_details(api, &profile).await {
        Ok(details) => print_key_age(&details),
        Err(err) if err.kind() == ErrorKind::ExternalService => {
            debug!(%err, "could not check the access key age");
            println!(
                "Could not reach AWS with these credentials. Clear any AWS environment variables and check the keys are still valid."
            );
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn exec_logout(manager: &CredsManager) -> Result<(), Error> {
    match manager.logout()? {
        Some(profile) => println!("Logged out of {}.", profile.name()),
        None => println!("You're not logged in."),
    }
    Ok(())
}

pub async fn exec_status<A: IdentityApi>(manager: &CredsManager, api: &A) -> Result<(), Error> {
    let status = manager.status(api).await?;
    let details = &status.details;
    println!("Profile:    {}", status.profile.name());
    match &details.alias {
        Some(alias) => println!("Account:    {} ({alias})", details.account_id),
        None => println!("Account:    {}", details.account_id),
    }
    println!(
        "User:       {}",
        details.user_name.as_deref().unwrap_or(&details.principal_arn)
    );
    println!(
        "Access key: {} ({} days old)",
        details.access_key, details.key_age_days
    );
    if let Some(role) = &status.role {
        println!("Role:       {}", role.role_arn);
    }
    if let Some(active_key) = manager.session().active_access_key()? {
        if active_key != details.access_key {
            println!("In use:     {active_key}");
        }
    }
    Ok(())
}

pub async fn exec_rotate<A: IdentityApi>(manager: &CredsManager, api: &A) -> Result<(), Error> {
    let rotation = manager.rotate(api).await?;
    println!(
        "Rotated the access key of {} from {} to {}.",
        rotation.profile.name(),
        rotation.old_key_id,
        rotation.new_key_id
    );
    println!(
        "You have been logged out. Run 'aws-creds login {}' to use the new key.",
        rotation.profile.name()
    );
    Ok(())
}
