//! Identifying attributes of a system metrics record and their fingerprint.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::{Error, Result};

/// Schema version whose fingerprint layout is defined.
pub const SCHEMA_V0: i32 = 0;

/// Information unique to the system metrics of one task execution.
///
/// Immutable once a [`SystemMetrics`](super::SystemMetrics) record exists;
/// the record ID is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetricsInfo {
    /// Evergreen project identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    /// Version (commit) the task ran against.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Build variant.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
    /// Display name of the task.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_name: String,
    /// Task ID.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_id: String,
    /// Execution number of the task.
    #[serde(default)]
    pub execution: i32,
    /// Whether the task ran on the mainline (not a patch).
    #[serde(default)]
    pub mainline: bool,
    /// Fingerprint schema version.
    #[serde(default)]
    pub schema: i32,
}

impl SystemMetricsInfo {
    /// Deterministic record ID for these attributes.
    ///
    /// Schema 0 hashes project, version, variant, task name, task ID and the
    /// decimal execution number with SHA-1 and returns the lower-case hex
    /// digest. `mainline` does not take part in the fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSchema`] for any schema other than 0.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sysmetrics_store::model::SystemMetricsInfo;
    ///
    /// let info = SystemMetricsInfo { project: "test".into(), ..Default::default() };
    /// assert_eq!(info.id()?, info.id()?);
    /// assert_eq!(info.id()?.len(), 40);
    /// # Ok::<(), sysmetrics_store::Error>(())
    /// ```
    pub fn id(&self) -> Result<String> {
        if self.schema != SCHEMA_V0 {
            return Err(Error::UnsupportedSchema(self.schema));
        }

        let mut hasher = Sha1::new();
        hasher.update(self.project.as_bytes());
        hasher.update(self.version.as_bytes());
        hasher.update(self.variant.as_bytes());
        hasher.update(self.task_name.as_bytes());
        hasher.update(self.task_id.as_bytes());
        hasher.update(self.execution.to_string().as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SystemMetricsInfo {
        SystemMetricsInfo {
            project: "mongodb-mongo-master".to_string(),
            version: "abc123".to_string(),
            variant: "enterprise-rhel-80".to_string(),
            task_name: "jsCore".to_string(),
            task_id: "task_0001".to_string(),
            execution: 2,
            mainline: true,
            schema: 0,
        }
    }

    #[test]
    fn test_id_is_deterministic() {
        let info = sample();
        assert_eq!(info.id().unwrap(), info.id().unwrap());
        assert_eq!(info.id().unwrap(), sample().id().unwrap());
    }

    #[test]
    fn test_id_is_hex_sha1() {
        let id = sample().id().unwrap();
        assert_eq!(id.len(), 40);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_id_of_empty_info_is_sha1_of_execution_zero() {
        // sha1("0")
        let id = SystemMetricsInfo::default().id().unwrap();
        assert_eq!(id, "b6589fc6ab0dc82cf12099d1c2d40ab994e8410c");
    }

    #[test]
    fn test_id_ignores_mainline() {
        let mut other = sample();
        other.mainline = false;
        assert_eq!(sample().id().unwrap(), other.id().unwrap());
    }

    #[test]
    fn test_id_changes_with_execution() {
        let mut other = sample();
        other.execution = 3;
        assert_ne!(sample().id().unwrap(), other.id().unwrap());
    }

    #[test]
    fn test_id_changes_with_each_string_field() {
        let base = sample().id().unwrap();
        let changes: [fn(&mut SystemMetricsInfo); 5] = [
            |i| i.project.push('x'),
            |i| i.version.push('x'),
            |i| i.variant.push('x'),
            |i| i.task_name.push('x'),
            |i| i.task_id.push('x'),
        ];

        for (n, change) in changes.iter().enumerate() {
            let mut other = sample();
            change(&mut other);
            assert_ne!(other.id().unwrap(), base, "field #{n}");
        }
    }

    #[test]
    fn test_unsupported_schema_is_an_error() {
        let mut info = sample();
        info.schema = 1;
        let err = info.id().unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema(1)));
    }

    #[test]
    fn test_info_serialization_skips_empty_strings() {
        let info = SystemMetricsInfo {
            project: "test".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["project"], "test");
        assert!(json.get("version").is_none());
        assert_eq!(json["execution"], 0);
    }
}
