//! Session port and the platform-neutral message model.

pub mod port;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
