//! # Shared Types
//!
//! Small value types that flow between the registry, the deferred workers and
//! the service facade.
//!
//! - [`CorrelationId`] - opaque handle a client polls with
//! - [`Secret`] - submitted plaintext, never printed
//! - [`PollResult`] - what the registry found for an id
//! - [`FetchOutcome`] - what the facade reports for an id

use core::fmt;

/// Opaque identifier correlating a submission with its eventual result.
///
/// Values are minted exclusively by
/// [`ResultRegistry::register`](crate::ResultRegistry::register) from a
/// monotonically increasing 64-bit counter, so an id is never issued twice
/// for the lifetime of the process. Ids arriving from clients are parsed
/// with [`From<String>`] and are not validated; unknown ids simply resolve to
/// [`PollResult::Absent`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CorrelationId(String);

impl CorrelationId {
    pub(crate) fn from_counter(value: u64) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A submitted secret.
///
/// The `Debug` impl is redacted so a secret can sit inside spans and structs
/// without leaking into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The state of a single registry slot as observed by
/// [`ResultRegistry::poll`](crate::ResultRegistry::poll).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollResult {
    /// No slot exists: the id was never issued or was already consumed.
    Absent,
    /// The slot exists but the worker has not published yet.
    Pending,
    /// The worker published this value. The slot has been removed.
    Ready(String),
}

/// The request-level outcome of [`HashService::fetch`](crate::HashService::fetch).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Unknown or already delivered id.
    NotFound,
    /// Accepted but not finished; try again later.
    Accepted,
    /// The digest, delivered exactly once.
    Value(String),
}

impl From<PollResult> for FetchOutcome {
    fn from(result: PollResult) -> Self {
        match result {
            PollResult::Absent => Self::NotFound,
            PollResult::Pending => Self::Accepted,
            PollResult::Ready(value) => Self::Value(value),
        }
    }
}
