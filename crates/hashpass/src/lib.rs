#![doc = include_str!("../README.md")]

mod digest;
mod drain;
mod error;
mod latency;
mod registry;
mod service;
mod types;
mod worker;

#[cfg(test)]
mod tests;

pub use crate::digest::*;
pub use crate::drain::*;
pub use crate::error::*;
pub use crate::latency::*;
pub use crate::registry::*;
pub use crate::service::*;
pub use crate::types::*;
pub use crate::worker::*;
