//! Blueprint: the customization payload folded into depsolve and manifest
//! generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customizations: Option<Customizations>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserCustomization>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCustomization {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

/// Subscription registration applied to the image at first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub organization: String,
    pub activation_key: String,
    pub server_url: String,
    pub base_url: String,
    pub insights: bool,
}

#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("invalid blueprint version: {0}")]
    InvalidVersion(String),
}

impl Blueprint {
    /// Fill in defaults and validate. The version must be a dotted numeric
    /// string.
    pub fn initialize(&mut self) -> Result<(), BlueprintError> {
        if self.name.is_empty() {
            self.name = "empty blueprint".to_string();
        }
        if self.version.is_empty() {
            self.version = "0.0.0".to_string();
        }
        let valid = self
            .version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(BlueprintError::InvalidVersion(self.version.clone()));
        }
        Ok(())
    }

    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }
}
