//! Service configuration types.
//!
//! Loaded from a YAML document at startup and held by the
//! [`Environment`](crate::env::Environment), which lets it be swapped at
//! runtime. An empty bucket setting is a valid document but fails the
//! configuration gate on every ingestion call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::BucketKind;
use crate::{Error, Result};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Blob storage for system metrics chunks.
    #[serde(default)]
    pub bucket: BucketConfig,

    /// Directory for the file-backed metadata store.
    ///
    /// When `None`, records are kept in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<String>,
}

/// Bucket settings for system metrics artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketConfig {
    /// Bucket location: a directory for local buckets, the bucket name for
    /// S3, or a namespace for in-memory buckets.
    #[serde(default)]
    pub system_metrics_bucket: String,

    /// AWS region, required for S3 buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the text is not a valid config document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Config with a system metrics bucket location set.
    #[must_use]
    pub fn with_system_metrics_bucket(location: impl Into<String>) -> Self {
        Self {
            bucket: BucketConfig {
                system_metrics_bucket: location.into(),
                region: None,
            },
            metadata_path: None,
        }
    }
}

impl BucketConfig {
    /// Check that a system metrics bucket is configured at all.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] if the location is blank.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.system_metrics_bucket.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "system metrics bucket is not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the settings are sufficient for a backend kind.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] if the location is blank, or
    /// an S3 bucket has no region.
    pub fn ensure_usable_for(&self, kind: BucketKind) -> Result<()> {
        self.ensure_configured()?;
        if kind == BucketKind::S3 && self.region.as_deref().map_or(true, str::is_empty) {
            return Err(Error::InvalidConfiguration(
                "S3 system metrics bucket requires a region".to_string(),
            ));
        }
        Ok(())
    }
}
