//! Request-level facade over the correlation core.
//!
//! [`HashService`] composes the [`ResultRegistry`], [`LatencyAggregator`] and
//! [`DrainCoordinator`] into the four operations a transport calls:
//!
//! - [`submit`](HashService::submit) - accept a secret, hand back an id
//! - [`fetch`](HashService::fetch) - poll for the digest by id
//! - [`stats`](HashService::stats) - submission latency statistics
//! - [`initiate_shutdown`](HashService::initiate_shutdown) - stop admission,
//!   drain, then signal the transport to stop
//!
//! The transport learns when to stop listening by awaiting
//! [`stopped`](HashService::stopped).

use crate::{
    CorrelationId, DeferredWorker, DrainCoordinator, Error, FetchOutcome, LatencyAggregator,
    LatencySnapshot, ResultRegistry, Result, Secret,
};
use core::time::Duration;
use std::{sync::Arc, time::Instant};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Default artificial delay before a deferred worker computes its digest.
pub const DEFAULT_HASH_DELAY: Duration = Duration::from_secs(5);

/// Tunables for [`HashService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long each deferred worker waits before hashing.
    pub hash_delay: Duration,
    /// Upper bound on the shutdown drain. `None` waits for as long as the
    /// outstanding work takes.
    pub drain_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hash_delay: DEFAULT_HASH_DELAY,
            drain_timeout: None,
        }
    }
}

/// The hashing service shared by every request handler.
///
/// Cloning is cheap and yields a handle to the same registry, statistics and
/// drain state; nothing is copied.
#[derive(Clone, Debug)]
pub struct HashService {
    config: ServiceConfig,
    registry: Arc<ResultRegistry>,
    latency: Arc<LatencyAggregator>,
    drain: Arc<DrainCoordinator>,
    stop_token: CancellationToken,
}

impl HashService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ResultRegistry::new()),
            latency: Arc::new(LatencyAggregator::new()),
            drain: Arc::new(DrainCoordinator::new()),
            stop_token: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Accepts `secret` for deferred hashing and returns its correlation id.
    ///
    /// The time spent in this call is recorded in the latency statistics; the
    /// background delay is not part of it. Rejected submissions record
    /// nothing and issue no id.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptySecret`] if `secret` is empty.
    /// - [`Error::ServiceShutdown`] once shutdown has begun.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the deferred worker is
    /// spawned onto the current runtime.
    pub fn submit(&self, secret: impl Into<Secret>) -> Result<CorrelationId> {
        let start = Instant::now();
        let secret = secret.into();

        if secret.is_empty() {
            return Err(Error::EmptySecret);
        }

        let permit = self.drain.try_acquire().ok_or(Error::ServiceShutdown)?;
        let id = self.registry.register();

        DeferredWorker::new(
            id.clone(),
            secret,
            self.config.hash_delay,
            Arc::clone(&self.registry),
            permit,
        )
        .spawn();

        self.latency.record(start.elapsed());
        Ok(id)
    }

    /// Polls for the result of `id`. A delivered value is removed, so it is
    /// returned exactly once.
    pub fn fetch(&self, id: &CorrelationId) -> FetchOutcome {
        self.registry.poll(id).into()
    }

    pub fn stats(&self) -> LatencySnapshot {
        self.latency.snapshot()
    }

    pub fn is_accepting(&self) -> bool {
        self.drain.is_accepting()
    }

    /// Number of accepted submissions whose worker has not finished.
    pub fn outstanding(&self) -> u64 {
        self.drain.outstanding()
    }

    /// Stops accepting submissions and, on a separate task, waits for the
    /// outstanding workers before signalling [`stopped`](Self::stopped).
    ///
    /// Returns immediately so the triggering request can complete. Only the
    /// first call starts a drain; later calls are no-ops.
    ///
    /// If [`ServiceConfig::drain_timeout`] is set and expires, the stop signal
    /// fires anyway and any remaining workers are abandoned with the process.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn initiate_shutdown(&self) {
        if !self.drain.begin_shutdown() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Shutdown already in progress");
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            outstanding = self.drain.outstanding(),
            unclaimed = self.registry.len(),
            "Refusing new submissions, draining outstanding work"
        );

        let drain = Arc::clone(&self.drain);
        let stop_token = self.stop_token.clone();
        let deadline = self.config.drain_timeout;

        tokio::spawn(async move {
            match deadline {
                None => drain.wait_drained().await,
                Some(deadline) => {
                    if let Err(_e) = drain.wait_drained_for(deadline).await {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Graceful drain gave up: {_e}");
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::info!("Drain complete, stopping listener");
            stop_token.cancel();
        });
    }

    /// Resolves once a shutdown drain has finished and the transport should
    /// stop accepting connections.
    pub fn stopped(&self) -> WaitForCancellationFutureOwned {
        self.stop_token.clone().cancelled_owned()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_token.is_cancelled()
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}
