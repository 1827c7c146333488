use crate::error::{Error, Result};
use crate::layout::StoreLayout;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

pub const FALLBACK_OUTPUT: &str = "json";
pub const FALLBACK_REGION: &str = "us-east-1";

/// Values used to pre-fill blank fields of new profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultConfig {
    pub output: String,
    pub region: String,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            output: FALLBACK_OUTPUT.to_string(),
            region: FALLBACK_REGION.to_string(),
        }
    }
}

pub struct DefaultsStore {
    path: PathBuf,
}

impl DefaultsStore {
    pub fn new(layout: &StoreLayout) -> Self {
        Self {
            path: layout.defaults_file(),
        }
    }

    /// Loads the record, creating it with the fallback values on first use.
    pub fn get(&self) -> Result<DefaultConfig> {
        match utils::read_if_exists(&self.path)? {
            Some(contents) => {
                serde_json::from_str(&contents).map_err(Error::corrupt(&self.path))
            }
            None => {
                let defaults = DefaultConfig::default();
                self.save(&defaults)?;
                debug!(path = %self.path.display(), "initialised defaults");
                Ok(defaults)
            }
        }
    }

    /// Updates only the provided fields.
    pub fn set(&self, output: Option<&str>, region: Option<&str>) -> Result<DefaultConfig> {
        let mut defaults = self.get()?;
        if let Some(output) = output {
            defaults.output = output.to_string();
        }
        if let Some(region) = region {
            defaults.region = region.to_string();
        }
        self.save(&defaults)?;
        Ok(defaults)
    }

    fn save(&self, defaults: &DefaultConfig) -> Result<()> {
        let contents = serde_json::to_vec_pretty(defaults).map_err(Error::corrupt(&self.path))?;
        utils::write_atomic(&self.path, &contents)
    }
}
