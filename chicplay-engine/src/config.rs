//! Top-level configuration bundle.
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(feature = "imaging")]
use crate::imaging::ImagingConfig;
use crate::rewards::RewardConfig;

/// Everything tunable in one document. Missing sections fall back to their
/// defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChicplayConfig {
    pub rewards: RewardConfig,
    #[cfg(feature = "imaging")]
    pub imaging: ImagingConfig,
}

impl ChicplayConfig {
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
    }
}
