use super::{prompt, Error};
use crate::cmd::{FormatCommonArgs, OutputFormat};
use crate::manager::CredsManager;
use crate::profile::{CredentialProfile, ProfileFields};
use crate::utils::formatters::json::JsonFormatter;
use crate::utils::formatters::text::TextFormatter;
use crate::utils::formatters::TabularFormatter;

pub struct AddInput {
    pub name: String,
    pub access_key: String,
    pub secret_key: Option<String>,
    pub description: String,
    pub region: String,
    pub output: String,
}

pub struct UpdateInput {
    pub rename: Option<String>,
    pub description: Option<String>,
    pub access_keys: Option<(String, String)>,
    pub region: Option<String>,
    pub output: Option<String>,
}

pub fn exec_add(manager: &CredsManager, input: AddInput) -> Result<(), Error> {
    let secret_key = match input.secret_key {
        Some(secret_key) => secret_key,
        None => prompt::read_line("Secret access key: ")?
            .filter(|secret| !secret.is_empty())
            .ok_or(Error::MissingSecretKey)?,
    };
    let profile = manager.add(ProfileFields {
        name: input.name,
        description: input.description,
        access_key: input.access_key.trim().to_string(),
        secret_key,
        region: input.region.trim().to_string(),
        output: input.output.trim().to_string(),
    })?;
    println!("Saved profile {}.", profile.name());
    Ok(())
}

fn profile_row(profile: &CredentialProfile, active_id: Option<&str>) -> Vec<String> {
    let marker = if active_id == Some(profile.id()) { "*" } else { "" };
    vec![
        marker.to_string(),
        profile.name().to_string(),
        profile.description().to_string(),
        profile.access_key().to_string(),
        profile.region().to_string(),
        profile.output().to_string(),
        profile.create_date().format("%Y-%m-%d").to_string(),
        profile.modified_date().format("%Y-%m-%d %H:%M").to_string(),
    ]
}

pub fn exec_ls(manager: &CredsManager, formatting: &FormatCommonArgs) -> Result<(), Error> {
    let profiles = manager.list()?;
    let active_id = manager.session().current_id()?;
    let rows = profiles
        .iter()
        .map(|profile| profile_row(profile, active_id.as_deref()));

    let output = match formatting.output {
        OutputFormat::Json => JsonFormatter::new(formatting.no_headers).format(
            &[
                "active",
                "name",
                "description",
                "accessKey",
                "region",
                "output",
                "created",
                "modified",
            ],
            rows,
        )?,
        OutputFormat::Text => {
            if profiles.is_empty() {
                println!("No saved profiles. Add one with 'aws-creds add'.");
                return Ok(());
            }
            TextFormatter::new(formatting.no_headers, " | ")
                .format(
                    &[
                        "",
                        "Name",
                        "Description",
                        "Access Key",
                        "Region",
                        "Output",
                        "Created",
                        "Modified",
                    ],
                    rows,
                )
                .unwrap_or_else(|never| match never {})
        }
    };
    println!("{output}");
    Ok(())
}

pub fn exec_rm(manager: &CredsManager, name: &str, yes: bool) -> Result<(), Error> {
    let profile = manager.profile(name)?;
    if !yes && !prompt::confirm(&format!("Delete profile {}?", profile.name()))? {
        println!("Not continuing.");
        return Ok(());
    }
    let was_active = manager.session().current_id()?.as_deref() == Some(profile.id());
    manager.remove(profile.id())?;
    println!("Deleted profile {}.", profile.name());
    if was_active {
        println!("It was the active profile, you have been logged out.");
    }
    Ok(())
}

pub fn exec_update(manager: &CredsManager, name: &str, input: UpdateInput) -> Result<(), Error> {
    let mut profile = manager.profile(name)?;
    if let Some(rename) = input.rename {
        profile = profile.with_name(&rename);
    }
    if let Some(description) = input.description {
        profile = profile.with_description(description);
    }
    if let Some((access_key, secret_key)) = input.access_keys {
        profile = profile.with_access_keys(access_key.trim(), secret_key);
    }
    if let Some(region) = input.region {
        profile = profile.with_region(region.trim());
    }
    if let Some(output) = input.output {
        profile = profile.with_output(output.trim());
    }
    let profile = manager.update(profile)?;
    println!("Updated profile {}.", profile.name());
    Ok(())
}
