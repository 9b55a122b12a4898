//! Per-call ingestion session.
//!
//! ```text
//! AwaitingFirstChunk ──first chunk, preconditions ok──> Streaming(id)
//!        │                                               │   │
//!        │ close                      chunk for other id │   │ close
//!        v                                               v   v
//!   EmptyStream error                             Aborted   Closed(id)
//! ```
//!
//! Any failure moves the session to `Aborted`; later chunks are refused.
//! A session is owned by exactly one handler and never shared.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{cancellable, EnvironmentGate, MetricsChunk};
use crate::blob::BlobBucket;
use crate::env::{Environment, RecordBucket};
use crate::metadata::MetadataStore;
use crate::model::SystemMetrics;
use crate::{Error, Result};

/// Observable phase of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No chunk accepted yet.
    AwaitingFirstChunk,
    /// Bound to a record; accepting chunks for it.
    Streaming,
    /// Closed normally.
    Closed,
    /// Stopped by an error or cancellation.
    Aborted,
}

/// Record the session is bound to, with its chunk key sequence.
struct BoundRecord {
    record: SystemMetrics,
    bucket: RecordBucket,
    seq: u64,
}

enum SessionState {
    AwaitingFirstChunk,
    Streaming(BoundRecord),
    Closed(String),
    Aborted,
}

/// State machine turning a sequence of chunks into ordered blob writes and
/// metadata appends for a single record.
pub struct StreamSession<'a, M: MetadataStore> {
    env: &'a Environment<M>,
    token: String,
    state: SessionState,
    chunks_written: u64,
}

impl<'a, M: MetadataStore> StreamSession<'a, M> {
    /// Start a session. Each session gets its own key token, so chunk keys
    /// from different sessions never collide.
    #[must_use]
    pub fn new(env: &'a Environment<M>) -> Self {
        Self {
            env,
            token: Uuid::new_v4().simple().to_string(),
            state: SessionState::AwaitingFirstChunk,
            chunks_written: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::AwaitingFirstChunk => SessionPhase::AwaitingFirstChunk,
            SessionState::Streaming(_) => SessionPhase::Streaming,
            SessionState::Closed(_) => SessionPhase::Closed,
            SessionState::Aborted => SessionPhase::Aborted,
        }
    }

    /// Number of chunks stored and appended so far.
    #[must_use]
    pub const fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// ID of the bound record, once the first chunk was accepted.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Streaming(bound) => Some(bound.record.id()),
            SessionState::Closed(id) => Some(id),
            SessionState::AwaitingFirstChunk | SessionState::Aborted => None,
        }
    }

    /// Accept one chunk: validate it against the session, write its payload,
    /// then append its key to the record. Returns only once both are done.
    ///
    /// # Errors
    /// Precondition errors on the first chunk, [`Error::MixedRecordIds`] on a
    /// foreign chunk, [`Error::StorageWriteFailed`] from the write step, or
    /// [`Error::Cancelled`]. The session is aborted on any error.
    pub async fn accept(&mut self, chunk: MetricsChunk, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            self.state = SessionState::Aborted;
            return Err(Error::Cancelled);
        }

        let mut bound = match std::mem::replace(&mut self.state, SessionState::Aborted) {
            SessionState::AwaitingFirstChunk => self.bind(&chunk.id, cancel).await?,
            SessionState::Streaming(bound) if bound.record.id() == chunk.id => bound,
            SessionState::Streaming(bound) => {
                tracing::warn!(bound = bound.record.id(), received = %chunk.id, "mixed record IDs in stream");
                return Err(Error::MixedRecordIds {
                    bound: bound.record.id().to_string(),
                    received: chunk.id,
                });
            }
            SessionState::Closed(_) => {
                return Err(Error::SessionEnded("chunk received after close".to_string()));
            }
            SessionState::Aborted => {
                return Err(Error::SessionEnded("chunk received after abort".to_string()));
            }
        };

        self.write(&mut bound, chunk.data, cancel).await?;
        self.chunks_written += 1;
        self.state = SessionState::Streaming(bound);
        Ok(())
    }

    /// Close the session and return the bound record ID.
    ///
    /// # Errors
    /// [`Error::EmptyStream`] if no chunk was ever accepted,
    /// [`Error::SessionEnded`] if the session was aborted.
    pub fn close(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.state, SessionState::Aborted) {
            SessionState::Streaming(bound) => {
                let id = bound.record.id().to_string();
                tracing::info!(id = %id, chunks = self.chunks_written, "system metrics session closed");
                self.state = SessionState::Closed(id.clone());
                Ok(id)
            }
            SessionState::Closed(id) => {
                self.state = SessionState::Closed(id.clone());
                Ok(id)
            }
            SessionState::AwaitingFirstChunk => Err(Error::EmptyStream),
            SessionState::Aborted => Err(Error::SessionEnded("close after abort".to_string())),
        }
    }

    /// Stop the session without closing it.
    pub fn abort(&mut self) {
        self.state = SessionState::Aborted;
    }

    async fn bind(&self, id: &str, cancel: &CancellationToken) -> Result<BoundRecord> {
        let outcome = self.preconditions(id, cancel).await;
        if let Err(e) = &outcome {
            tracing::warn!(id, error = %e, "system metrics precondition failed");
        }
        outcome
    }

    async fn preconditions(&self, id: &str, cancel: &CancellationToken) -> Result<BoundRecord> {
        EnvironmentGate::new(self.env).check(cancel).await?;

        let record = cancellable(cancel, self.env.metadata().load(id))
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                Error::RecordNotFound(_) => Error::RecordNotFound(id.to_string()),
                other => {
                    tracing::debug!(id, error = %other, "record lookup failed");
                    Error::RecordNotFound(id.to_string())
                }
            })?;

        let bucket = self.env.bucket(record.artifact()).await?;
        tracing::info!(id, "system metrics session bound");
        Ok(BoundRecord {
            record,
            bucket,
            seq: 0,
        })
    }

    async fn write(
        &self,
        bound: &mut BoundRecord,
        payload: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let key = bound
            .record
            .artifact()
            .chunk_key(&format!("{}-{:08}", self.token, bound.seq));
        bound.seq += 1;
        let size = payload.len();

        cancellable(cancel, bound.bucket.put(&key, payload))
            .await
            .map_err(Error::into_write_failure)?;

        // Payload is durable; the append is not cancellable.
        self.env
            .metadata()
            .append_chunk(bound.record.id(), &key)
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "chunk stored but not appended; blob orphaned");
                e.into_write_failure()
            })?;

        tracing::debug!(id = bound.record.id(), key = %key, size, "system metrics chunk stored");
        Ok(())
    }
}
