#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![forbid(unsafe_code)]

pub mod clients;
pub mod processors;
pub mod registry;
pub mod retry;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;
