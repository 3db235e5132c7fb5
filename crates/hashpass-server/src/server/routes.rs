//! HTTP routes for the hashing service.
//!
//! | Method | Path        | Handler                               |
//! |--------|-------------|---------------------------------------|
//! | POST   | `/hash`     | submit the `password` form field      |
//! | GET    | `/stats`    | submission count and mean latency     |
//! | GET    | `/shutdown` | drain outstanding work, then stop     |
//! | GET    | `/{id}`     | poll for a digest (any other path)    |
//!
//! Method mismatches answer `405 Method Not Allowed`. Ids are taken from the
//! raw request path without percent-decoding, so a path that was never
//! issued as an id answers `404 Not Found`.

use crate::server::telemetry::{
    increment_rejections, increment_results_delivered, increment_submissions,
    record_submit_duration,
};
use axum::{
    Form, Json, Router,
    extract::{State, rejection::FormRejection},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use hashpass::{CorrelationId, Error, FetchOutcome, HashService, LatencySnapshot};
use serde::Deserialize;
use std::time::Instant;

/// Builds the application router around a shared [`HashService`].
pub fn router(service: HashService) -> Router {
    Router::new()
        .route("/hash", post(submit_hash))
        .route("/stats", get(stats))
        .route("/shutdown", get(shutdown))
        .fallback(fallback)
        .with_state(service)
}

/// Maps service errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::EmptySecret => StatusCode::UNPROCESSABLE_ENTITY,
            Error::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
            Error::DrainTimeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct HashForm {
    // A missing field is treated the same as an empty one.
    #[serde(default)]
    password: String,
}

#[tracing::instrument(skip_all)]
async fn submit_hash(
    State(service): State<HashService>,
    form: Result<Form<HashForm>, FormRejection>,
) -> Result<String, ApiError> {
    let start = Instant::now();

    // An unreadable body carries no password.
    let password = match form {
        Ok(Form(form)) => form.password,
        Err(rejection) => {
            tracing::debug!("unreadable hash form: {rejection}");
            String::new()
        }
    };

    match service.submit(password) {
        Ok(id) => {
            increment_submissions();
            record_submit_duration(start.elapsed().as_micros() as f64);
            tracing::info!(id = %id, "accepted hash request");
            Ok(id.into_inner())
        }
        Err(e) => {
            let reason = match e {
                Error::EmptySecret => "empty_secret",
                Error::ServiceShutdown => "shutting_down",
                Error::DrainTimeout { .. } => "drain_timeout",
            };
            increment_rejections(reason);
            tracing::info!("rejected hash request: {e}");
            Err(e.into())
        }
    }
}

async fn stats(State(service): State<HashService>) -> Json<LatencySnapshot> {
    Json(service.stats())
}

async fn shutdown(State(service): State<HashService>) -> &'static str {
    tracing::info!("shutdown requested");
    service.initiate_shutdown();
    "shutting down"
}

/// Every path without a dedicated route is treated as a correlation id.
async fn fallback(State(service): State<HashService>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let id = uri.path().strip_prefix('/').unwrap_or(uri.path());
    fetch_response(&service, CorrelationId::from(id))
}

fn fetch_response(service: &HashService, id: CorrelationId) -> Response {
    match service.fetch(&id) {
        FetchOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        FetchOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        FetchOutcome::Value(digest) => {
            increment_results_delivered();
            (StatusCode::OK, digest).into_response()
        }
    }
}
