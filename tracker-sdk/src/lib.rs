//! Wire objects shared between the sports tracker server and its clients.
//!
//! Everything here is plain serde data: the control-plane request and
//! response bodies, the score snapshot returned by the remote score source,
//! and the message envelope published for each successful poll.

pub mod objects;

/// Service name reported by the health endpoint and stamped on every
/// published score message.
pub const SERVICE_NAME: &str = "sports-tracker";
