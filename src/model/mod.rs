//! System metrics data model
//!
//! ```text
//! SystemMetricsInfo ──id()──> SystemMetrics.id
//!                                  │
//!                                  └── ArtifactInfo { kind, prefix, chunks[] }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sysmetrics_store::model::{ArtifactOptions, BucketKind, SystemMetrics, SystemMetricsInfo};
//!
//! let info = SystemMetricsInfo { project: "test".into(), ..Default::default() };
//! let record = SystemMetrics::new(info, ArtifactOptions { kind: BucketKind::Local, ..Default::default() })?;
//! assert_eq!(record.chunk_count(), 0);
//! # Ok::<(), sysmetrics_store::Error>(())
//! ```

mod info;
mod system_metrics;

pub use info::{SystemMetricsInfo, SCHEMA_V0};
pub use system_metrics::{ArtifactInfo, ArtifactOptions, BucketKind, DataFormat, SystemMetrics};
