use crate::{CorrelationId, DrainPermit, ResultRegistry, Secret, digest::hash_secret};
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Background job that hashes one accepted secret.
///
/// A worker is created only after its [`DrainPermit`] has been acquired and
/// owns that permit for its whole life. It sleeps for the configured delay,
/// computes the digest, publishes it into the [`ResultRegistry`] under its
/// correlation id and finally drops the permit. The permit is released on
/// every exit path, including a panic inside the task, so the outstanding
/// count can never get stuck.
///
/// There is no cancellation: once spawned, a worker always runs to
/// completion.
#[derive(Debug)]
pub struct DeferredWorker {
    id: CorrelationId,
    secret: Secret,
    delay: Duration,
    registry: Arc<ResultRegistry>,
    permit: DrainPermit,
}

impl DeferredWorker {
    /// # Arguments
    ///
    /// - `id`: Correlation id the result is published under.
    /// - `secret`: The submitted secret to hash.
    /// - `delay`: Artificial delay before the digest is computed.
    /// - `registry`: Registry that holds the pending slot for `id`.
    /// - `permit`: Admission permit, released when the worker finishes.
    pub fn new(
        id: CorrelationId,
        secret: Secret,
        delay: Duration,
        registry: Arc<ResultRegistry>,
        permit: DrainPermit,
    ) -> Self {
        Self {
            id,
            secret,
            delay,
            registry,
            permit,
        }
    }

    /// Runs the worker on its own Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            let span = tracing::info_span!("deferred_hash", id = %self.id);
            self.run().instrument(span)
        };
        #[cfg(not(feature = "tracing"))]
        let fut = self.run();

        tokio::spawn(fut)
    }

    pub async fn run(self) {
        let Self {
            id,
            secret,
            delay,
            registry,
            permit,
        } = self;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "deferred hash started"
        );

        tokio::time::sleep(delay).await;
        let digest = hash_secret(&secret);
        registry.publish(&id, digest);
        drop(permit);

        #[cfg(feature = "tracing")]
        tracing::debug!("deferred hash finished");
    }
}
