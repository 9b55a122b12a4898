//! Ingestion service: accepts metric chunks and stores them for a record.
//!
//! ## Flow
//!
//! ```text
//! chunk ──> gate (env, config) ──> load record ──> put blob ──> append key ──> id
//! ```
//!
//! Every call checks, in order, the environment, the bucket configuration,
//! and that the target record exists, before any byte is written. Within one
//! stream, chunks are written strictly in arrival order.

mod gate;
mod service;
mod session;

pub use gate::EnvironmentGate;
pub use service::IngestionService;
pub use session::{SessionPhase, StreamSession};

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// One unit of raw metric payload addressed to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsChunk {
    /// Target record ID.
    pub id: String,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

impl MetricsChunk {
    /// Create a chunk for a record.
    #[must_use]
    pub fn new(id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

/// Race `fut` against caller cancellation.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}
