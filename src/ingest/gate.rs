//! Environment/configuration gate consulted before any chunk is written.

use tokio_util::sync::CancellationToken;

use crate::env::Environment;
use crate::metadata::MetadataStore;
use crate::{Error, Result};

/// Runs the environment and configuration preconditions, in that order.
///
/// Record lookup is the third precondition and belongs to the caller, since
/// it needs the chunk's record ID.
pub struct EnvironmentGate<'a, M: MetadataStore> {
    env: &'a Environment<M>,
}

impl<'a, M: MetadataStore> EnvironmentGate<'a, M> {
    /// Gate over an environment.
    #[must_use]
    pub const fn new(env: &'a Environment<M>) -> Self {
        Self { env }
    }

    /// Check the environment is open and its metadata store reachable, then
    /// that a system metrics bucket is configured.
    ///
    /// # Errors
    /// [`Error::InvalidEnvironment`], [`Error::InvalidConfiguration`], or
    /// [`Error::Cancelled`] if `cancel` fires during the reachability check.
    pub async fn check(&self, cancel: &CancellationToken) -> Result<()> {
        if self.env.is_closed() {
            return Err(Error::InvalidEnvironment(
                "environment has been torn down".to_string(),
            ));
        }

        super::cancellable(cancel, self.env.metadata().ping())
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::InvalidEnvironment(format!("metadata store unreachable: {other}")),
            })?;

        self.env.config().bucket.ensure_configured()
    }
}
