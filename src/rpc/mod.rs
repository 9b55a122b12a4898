//! gRPC surface: `cedar.CedarSystemMetrics`
//!
//! Two methods over one [`IngestionService`]:
//! - `AddSystemMetrics` (unary)
//! - `StreamSystemMetrics` (client streaming, single response on close)
//!
//! Messages are declared here with `prost` derives; the service and client
//! stubs are generated by `build.rs`.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};

use crate::ingest::{IngestionService, MetricsChunk};
use crate::metadata::MetadataStore;
use crate::{Error, ErrorKind, Result};

#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/cedar.CedarSystemMetrics.rs"));
}

pub use generated::cedar_system_metrics_client::CedarSystemMetricsClient;
pub use generated::cedar_system_metrics_server::{CedarSystemMetrics, CedarSystemMetricsServer};

/// One chunk of system metrics for a record.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SystemMetricsData {
    /// Target record ID.
    #[prost(string, tag = "1")]
    pub id: String,
    /// Raw payload bytes.
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

/// Reply carrying the populated record ID.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SystemMetricsResponse {
    /// Record ID.
    #[prost(string, tag = "1")]
    pub id: String,
}

impl From<SystemMetricsData> for MetricsChunk {
    fn from(msg: SystemMetricsData) -> Self {
        Self {
            id: msg.id,
            data: msg.data,
        }
    }
}

/// Map a service error to a gRPC status.
#[must_use]
pub fn status_from(err: &Error) -> Status {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::InvalidEnvironment => Status::unavailable(message),
        ErrorKind::InvalidConfiguration | ErrorKind::SessionEnded => {
            Status::failed_precondition(message)
        }
        ErrorKind::RecordNotFound => Status::not_found(message),
        ErrorKind::RecordExists => Status::already_exists(message),
        ErrorKind::MixedRecordIds | ErrorKind::EmptyStream | ErrorKind::UnsupportedSchema => {
            Status::invalid_argument(message)
        }
        ErrorKind::Cancelled => Status::cancelled(message),
        ErrorKind::StorageWriteFailed | ErrorKind::Internal => Status::internal(message),
    }
}

/// tonic handler for `CedarSystemMetrics`.
///
/// Requests are cancelled when `shutdown` fires; a client that disconnects
/// drops its handler future.
#[derive(Debug)]
pub struct SystemMetricsGrpc<M: MetadataStore> {
    service: IngestionService<M>,
    shutdown: CancellationToken,
}

impl<M: MetadataStore> SystemMetricsGrpc<M> {
    /// Wrap an ingestion service.
    #[must_use]
    pub const fn new(service: IngestionService<M>, shutdown: CancellationToken) -> Self {
        Self { service, shutdown }
    }
}

#[tonic::async_trait]
impl<M: MetadataStore + 'static> CedarSystemMetrics for SystemMetricsGrpc<M> {
    async fn add_system_metrics(
        &self,
        request: Request<SystemMetricsData>,
    ) -> std::result::Result<Response<SystemMetricsResponse>, Status> {
        let cancel = self.shutdown.child_token();
        let id = self
            .service
            .add_system_metrics(request.into_inner().into(), &cancel)
            .await
            .map_err(|e| status_from(&e))?;
        Ok(Response::new(SystemMetricsResponse { id }))
    }

    async fn stream_system_metrics(
        &self,
        request: Request<Streaming<SystemMetricsData>>,
    ) -> std::result::Result<Response<SystemMetricsResponse>, Status> {
        let cancel = self.shutdown.child_token();
        let chunks = request.into_inner().map(|item| {
            item.map(MetricsChunk::from)
                .map_err(|status| Error::Transport(status.message().to_string()))
        });
        let id = self
            .service
            .stream_system_metrics(chunks, &cancel)
            .await
            .map_err(|e| status_from(&e))?;
        Ok(Response::new(SystemMetricsResponse { id }))
    }
}

/// Serve on `addr` until `shutdown` fires.
///
/// # Errors
/// Returns [`Error::Io`] if `addr` cannot be bound, [`Error::Transport`] if
/// the server fails.
pub async fn serve<M: MetadataStore + 'static>(
    service: IngestionService<M>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_listener(service, listener, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` fires.
///
/// # Errors
/// Returns [`Error::Transport`] if the server fails.
pub async fn serve_listener<M: MetadataStore + 'static>(
    service: IngestionService<M>,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!("Starting system metrics gRPC server on {}", local);

    let handler = SystemMetricsGrpc::new(service, shutdown.clone());
    tonic::transport::Server::builder()
        .add_service(CedarSystemMetricsServer::new(handler))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown.cancelled().await;
        })
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_category() {
        let cases = [
            (Error::InvalidEnvironment("x".into()), tonic::Code::Unavailable),
            (Error::InvalidConfiguration("x".into()), tonic::Code::FailedPrecondition),
            (Error::RecordNotFound("x".into()), tonic::Code::NotFound),
            (
                Error::MixedRecordIds {
                    bound: "a".into(),
                    received: "b".into(),
                },
                tonic::Code::InvalidArgument,
            ),
            (Error::EmptyStream, tonic::Code::InvalidArgument),
            (Error::SessionEnded("x".into()), tonic::Code::FailedPrecondition),
            (Error::UnsupportedSchema(3), tonic::Code::InvalidArgument),
            (Error::StorageWriteFailed("x".into()), tonic::Code::Internal),
            (Error::Cancelled, tonic::Code::Cancelled),
        ];

        for (err, code) in cases {
            assert_eq!(status_from(&err).code(), code, "{err}");
        }
    }

    #[test]
    fn test_message_into_chunk() {
        let chunk: MetricsChunk = SystemMetricsData {
            id: "abc".into(),
            data: b"payload".to_vec(),
        }
        .into();
        assert_eq!(chunk, MetricsChunk::new("abc", b"payload".to_vec()));
    }
}
