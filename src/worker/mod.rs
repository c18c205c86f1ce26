//! Worker slots and the simulated execution they perform.
//!
//! - [`Worker`] / [`WorkerPool`]: capacity-bounded slots with load and
//!   success-rate accounting; the dispatcher picks the least-loaded one that
//!   will accept a job.
//! - [`SimulatedExecutor`]: elapses a drawn duration and reports success or
//!   failure in place of a real command runner.

pub mod pool;
pub mod simulator;

pub use pool::{Worker, WorkerPool, WorkerStatus};
pub use simulator::{ExecutionOutcome, SimulatedExecutor};
