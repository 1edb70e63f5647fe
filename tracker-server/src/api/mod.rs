//! HTTP surface.
//!
//! - [`events`]: the control plane, mounted under `/events`
//! - [`mock`]: a random score source for local development, mounted under
//!   `/mock/events` when enabled

pub mod events;
pub mod mock;
