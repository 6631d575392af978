//! Core relay logic: destination resolution, per-message dispatch, retry policy.
//!
//! This crate is framework-agnostic. Telegram lives behind the `SessionPort` trait,
//! implemented in the adapter crate.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod guards;
pub mod logging;
pub mod messaging;
pub mod notifier;
pub mod resolver;
pub mod retry;

pub use errors::{Error, ResolutionError, Result};
