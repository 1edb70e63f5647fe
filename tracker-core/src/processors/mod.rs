//! Processors driving the poll pipeline.
//!
//! - `PollingScheduler`: owns per-event timers, dispatches `PollTick` to the
//!   `Poller` on a bounded worker pool
//! - `Poller`: receives `PollTick`, fetches the score, publishes the update

pub mod poller;
pub mod scheduler;

pub use poller::{PollTick, Poller, TickOutcome};
pub use scheduler::{PollingScheduler, ScheduleError, SchedulerConfig, ShutdownReport};
