pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod shutdown;
pub mod worker;

pub use config::{EngineConfig, SimulationConfig, WorkerConfig};
pub use engine::{SchedulerEngine, SystemStats};
pub use error::{Result, SchedulerError};
