use crate::error::{Error, Result};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// User supplied fields of a profile, before it has an id.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: String,
    pub description: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub output: String,
}

impl std::fmt::Debug for ProfileFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileFields")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// A named, stored set of AWS credentials and CLI defaults.
///
/// Values are immutable: the `with_*` methods return an updated copy which is
/// then handed to the store in a single `update` call.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialProfile {
    id: String,
    name: String,
    description: String,
    access_key: String,
    secret_key: String,
    region: String,
    output: String,
    create_date: NaiveDateTime,
    modified_date: NaiveDateTime,
    roles: Vec<String>,
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl CredentialProfile {
    /// Builds a brand new profile with a fresh id.
    pub fn create(fields: ProfileFields) -> Self {
        let created = now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: normalize_name(&fields.name),
            description: fields.description,
            access_key: fields.access_key,
            secret_key: fields.secret_key,
            region: fields.region,
            output: fields.output,
            create_date: created,
            modified_date: created,
            roles: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn create_date(&self) -> NaiveDateTime {
        self.create_date
    }

    pub fn modified_date(&self) -> NaiveDateTime {
        self.modified_date
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = normalize_name(name);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_access_keys(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_role_added(mut self, role_arn: impl Into<String>) -> Self {
        self.roles.push(role_arn.into());
        self
    }

    /// Returns the profile without the role at `index`, plus the removed role.
    pub fn with_role_removed(mut self, index: usize) -> Result<(Self, String)> {
        if index >= self.roles.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.roles.len(),
            });
        }
        let removed = self.roles.remove(index);
        Ok((self, removed))
    }

    pub(crate) fn touched(mut self) -> Self {
        self.modified_date = now();
        self
    }
}

impl std::fmt::Debug for CredentialProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("output", &self.output)
            .field("create_date", &self.create_date)
            .field("modified_date", &self.modified_date)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordCredentials {
    access_key: String,
    secret_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordOptions {
    region: String,
    output_type: String,
}

/// On-disk form of a profile, one per `credential.json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ProfileRecord {
    id: String,
    name: String,
    description: String,
    credentials: RecordCredentials,
    options: RecordOptions,
    #[serde(with = "timestamp")]
    create_date: NaiveDateTime,
    #[serde(with = "timestamp")]
    modified_date: NaiveDateTime,
    #[serde(default)]
    roles: Vec<String>,
}

impl From<&CredentialProfile> for ProfileRecord {
    fn from(profile: &CredentialProfile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            description: profile.description.clone(),
            credentials: RecordCredentials {
                access_key: profile.access_key.clone(),
                secret_key: profile.secret_key.clone(),
            },
            options: RecordOptions {
                region: profile.region.clone(),
                output_type: profile.output.clone(),
            },
            create_date: profile.create_date,
            modified_date: profile.modified_date,
            roles: profile.roles.clone(),
        }
    }
}

impl From<ProfileRecord> for CredentialProfile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            name: normalize_name(&record.name),
            description: record.description,
            access_key: record.credentials.access_key,
            secret_key: record.credentials.secret_key,
            region: record.options.region,
            output: record.options.output_type,
            create_date: record.create_date,
            modified_date: record.modified_date,
            roles: record.roles,
        }
    }
}

/// Timestamps are stored as naive UTC `YYYY-MM-DD HH:MM:SS.ffffff`; RFC 3339
/// input is accepted too.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
    }
}
