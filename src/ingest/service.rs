//! Transport-agnostic ingestion entry points.

use std::sync::Arc;

use chrono::Utc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{cancellable, EnvironmentGate, MetricsChunk, StreamSession};
use crate::env::Environment;
use crate::metadata::MetadataStore;
use crate::{Error, Result};

/// Accepts system metrics chunks over unary and streaming calls.
///
/// Holds no state besides the injected environment; every call runs its
/// own [`StreamSession`], so concurrent calls share nothing.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sysmetrics_store::config::ServiceConfig;
/// use sysmetrics_store::env::Environment;
/// use sysmetrics_store::ingest::{IngestionService, MetricsChunk};
/// use sysmetrics_store::metadata::MetadataStore;
/// use sysmetrics_store::model::{ArtifactOptions, BucketKind, SystemMetrics, SystemMetricsInfo};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> sysmetrics_store::Result<()> {
/// let env = Arc::new(Environment::in_memory(ServiceConfig::with_system_metrics_bucket("mem")));
/// let options = ArtifactOptions { kind: BucketKind::InMemory, ..Default::default() };
/// let record = SystemMetrics::new(SystemMetricsInfo { project: "test".into(), ..Default::default() }, options)?;
/// env.metadata().save(&record).await?;
///
/// let service = IngestionService::new(Arc::clone(&env));
/// let id = service
///     .add_system_metrics(MetricsChunk::new(record.id(), b"hello".to_vec()), &CancellationToken::new())
///     .await?;
/// assert_eq!(id, record.id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IngestionService<M: MetadataStore> {
    env: Arc<Environment<M>>,
}

impl<M: MetadataStore> Clone for IngestionService<M> {
    fn clone(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
        }
    }
}

impl<M: MetadataStore> IngestionService<M> {
    /// Create a service over an environment.
    #[must_use]
    pub const fn new(env: Arc<Environment<M>>) -> Self {
        Self { env }
    }

    /// Get the environment.
    #[must_use]
    pub const fn environment(&self) -> &Arc<Environment<M>> {
        &self.env
    }

    /// Store a single chunk and append it to its record.
    ///
    /// # Errors
    /// [`Error::InvalidEnvironment`], [`Error::InvalidConfiguration`] or
    /// [`Error::RecordNotFound`] before anything is written;
    /// [`Error::StorageWriteFailed`] from the write step;
    /// [`Error::Cancelled`].
    #[tracing::instrument(level = "debug", skip_all, fields(id = %chunk.id, size = chunk.data.len()))]
    pub async fn add_system_metrics(
        &self,
        chunk: MetricsChunk,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut session = StreamSession::new(&self.env);
        session.accept(chunk, cancel).await?;
        session.close()
    }

    /// Store every chunk of a client stream, in order, for one record.
    ///
    /// The first chunk binds the stream to its record ID. Chunks written
    /// before a failure stay written.
    ///
    /// # Errors
    /// As [`Self::add_system_metrics`], plus [`Error::MixedRecordIds`] when a
    /// chunk targets another record, [`Error::EmptyStream`] when the stream
    /// ends before any chunk, and the stream's own item errors.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn stream_system_metrics<S>(&self, chunks: S, cancel: &CancellationToken) -> Result<String>
    where
        S: Stream<Item = Result<MetricsChunk>> + Send,
    {
        tokio::pin!(chunks);
        let mut session = StreamSession::new(&self.env);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    session.abort();
                    tracing::info!(chunks = session.chunks_written(), "system metrics stream cancelled");
                    return Err(Error::Cancelled);
                }
                next = chunks.next() => next,
            };

            match next {
                Some(Ok(chunk)) => session.accept(chunk, cancel).await?,
                Some(Err(e)) => {
                    session.abort();
                    tracing::warn!(error = %e, chunks = session.chunks_written(), "system metrics stream failed");
                    return Err(e);
                }
                None => break,
            }
        }

        session.close()
    }

    /// Mark a record completed: the finalize signal that closes ingestion
    /// for it.
    ///
    /// # Errors
    /// Same preconditions as [`Self::add_system_metrics`];
    /// [`Error::StorageWriteFailed`] if the update fails.
    #[tracing::instrument(level = "debug", skip(self, cancel))]
    pub async fn close_system_metrics(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        EnvironmentGate::new(&self.env).check(cancel).await?;

        let metadata = self.env.metadata();
        cancellable(cancel, metadata.load(id))
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                _ => Error::RecordNotFound(id.to_string()),
            })?;

        metadata
            .mark_completed(id, Utc::now())
            .await
            .map_err(Error::into_write_failure)?;
        tracing::info!(id, "system metrics record completed");
        Ok(())
    }
}
