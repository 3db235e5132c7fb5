//! # `hashpass-server`: HTTP front end for deferred password hashing
//!
//! Exposes [`hashpass::HashService`] over HTTP with [`axum`]:
//!
//! - `POST /hash` with a `password` form field returns a correlation id.
//! - `GET /{id}` returns `202` while the hash is pending, `200` with the
//!   base64 SHA-512 digest once it is ready (exactly once), `404` otherwise.
//! - `GET /stats` returns `{"total": N, "average": M}` where `average` is the
//!   mean submission handling time in microseconds.
//! - `GET /shutdown` stops new submissions, waits for outstanding hashes and
//!   then closes the listener.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin hashpass-server --release -- --port 8080
//! ```

pub mod server;
