//! # sysmetrics-store: chunked system metrics ingestion
//!
//! Ingests per-task-execution system metrics (CPU, memory, disk samples
//! collected during a CI task run) as byte chunks, stores each chunk in a
//! blob bucket under a record-scoped key, and keeps an ordered list of the
//! stored chunks on the record's metadata document.
//!
//! ## Design Principles
//!
//! - **Validate before write**: environment, bucket configuration, and record
//!   existence are checked before any byte is stored
//! - **Append after durable write**: a chunk key reaches the metadata record
//!   only once its payload is in the bucket
//! - **Arrival order is storage order**: a stream's chunks are written one at
//!   a time, in the order they arrive
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use sysmetrics_store::config::ServiceConfig;
//! use sysmetrics_store::env::Environment;
//! use sysmetrics_store::ingest::{IngestionService, MetricsChunk};
//! use sysmetrics_store::metadata::MetadataStore;
//! use sysmetrics_store::model::{ArtifactOptions, BucketKind, SystemMetrics, SystemMetricsInfo};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> sysmetrics_store::Result<()> {
//! let env = Arc::new(Environment::in_memory(ServiceConfig::with_system_metrics_bucket("mem")));
//!
//! // A producer creates the record before ingestion starts
//! let options = ArtifactOptions { kind: BucketKind::InMemory, ..Default::default() };
//! let record = SystemMetrics::new(SystemMetricsInfo { project: "test".into(), ..Default::default() }, options)?;
//! env.metadata().save(&record).await?;
//!
//! let service = IngestionService::new(env);
//! let chunks = tokio_stream::iter(vec![
//!     Ok(MetricsChunk::new(record.id(), b"a".to_vec())),
//!     Ok(MetricsChunk::new(record.id(), b"b".to_vec())),
//! ]);
//! let id = service.stream_system_metrics(chunks, &CancellationToken::new()).await?;
//! assert_eq!(id, record.id());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod blob;
pub mod config;
pub mod env;
pub mod error;
pub mod ingest;
pub mod metadata;
pub mod model;
pub mod reader;
#[cfg(feature = "grpc")]
pub mod rpc;

pub use error::{Error, ErrorKind, Result};
