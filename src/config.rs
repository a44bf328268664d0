use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_marker_class() -> String {
    "dropdown-item".to_string()
}

fn default_ready_message() -> String {
    "page scripts loaded".to_string()
}

/// Bootstrap settings, loadable from TOML. Every field has a default, so an
/// empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Class token marking the elements that receive a click listener.
    #[serde(default = "default_marker_class")]
    pub marker_class: String,
    /// Line written to the page console when the bootstrap runs.
    #[serde(default = "default_ready_message")]
    pub ready_message: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            marker_class: default_marker_class(),
            ready_message: default_ready_message(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("failed to read {}: {err}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.marker_class.is_empty() {
            return Err(Error::Config("marker_class cannot be empty".into()));
        }
        if self.marker_class.starts_with('.') {
            return Err(Error::Config(format!(
                "marker_class is a bare token without the leading `.`, got `{}`",
                self.marker_class
            )));
        }
        if self.marker_class.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "marker_class must be a single class token, got `{}`",
                self.marker_class
            )));
        }
        Ok(())
    }
}
