//! Error types for the hashing service core.
//!
//! Every variant is a terminal, caller-visible outcome decided locally by the
//! operation that produced it. Nothing here is retried and nothing here is a
//! fatal process error; transports map these onto their own status codes.
//!
//! ## Error Cases
//! - `EmptySecret`: the submitted secret was empty.
//! - `ServiceShutdown`: a submission arrived after shutdown began.
//! - `DrainTimeout`: a bounded drain wait expired with work still outstanding.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the hashing service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The client submitted an empty secret.
    #[error("Secret must not be empty")]
    EmptySecret,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// A bounded drain gave up before outstanding work reached zero.
    #[error("Drain timed out with {outstanding} job(s) still outstanding")]
    DrainTimeout { outstanding: u64 },
}
