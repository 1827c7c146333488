use super::Error;
use crate::cmd::Role;
use crate::error::Error as CredsError;
use crate::identity::IdentityApi;
use crate::manager::CredsManager;
use crate::profile::CredentialProfile;

/// Accepts either an index into the profile's saved roles or a role ARN.
fn resolve_role(profile: &CredentialProfile, role: &str) -> Result<String, Error> {
    if let Ok(index) = role.parse::<usize>() {
        return profile
            .roles()
            .get(index)
            .cloned()
            .ok_or_else(|| {
                CredsError::IndexOutOfRange {
                    index,
                    len: profile.roles().len(),
                }
                .into()
            });
    }
    if role.starts_with("arn:") {
        Ok(role.to_string())
    } else {
        Err(Error::InvalidRole(role.to_string()))
    }
}

pub async fn exec_role<A: IdentityApi>(
    manager: &CredsManager,
    api: &A,
    subcommand: Role,
) -> Result<(), Error> {
    match subcommand {
        Role::Add { name, role_arn } => {
            let profile = manager.add_role(manager.profile(&name)?, &role_arn)?;
            println!("Added {} to {}.", role_arn.trim(), profile.name());
        }
        Role::Assume { name, role } => {
            let profile = manager.profile(&name)?;
            let role_arn = resolve_role(&profile, &role)?;
            manager.assume_role(api, &profile, &role_arn).await?;
            println!("Assumed {role_arn} with {}.", profile.name());
        }
        Role::Unassume => {
            if manager.unassume_role()? {
                println!("Restored the profile's own credentials.");
            } else {
                println!("No role is assumed.");
            }
        }
        Role::Ls { name } => {
            let profile = manager.profile(&name)?;
            let assumed = manager
                .current_role()?
                .filter(|marker| marker.profile_id == profile.id());
            if profile.roles().is_empty() {
                println!("{} has no saved roles.", profile.name());
            }
            for (index, role_arn) in profile.roles().iter().enumerate() {
                let marker = match &assumed {
                    Some(current) if &current.role_arn == role_arn => " (assumed)",
                    _ => "",
                };
                println!("{index}: {role_arn}{marker}");
            }
        }
        Role::Rm { name, index } => {
            let (profile, removed) = manager.remove_role(manager.profile(&name)?, index)?;
            println!("Removed {removed} from {}.", profile.name());
        }
    }
    Ok(())
}
