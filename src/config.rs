use serde::{Deserialize, Serialize};

/// Configuration for simulated job execution.
///
/// Execution duration is drawn uniformly from `[min_execution_ms,
/// max_execution_ms]`; the failure probability depends on the job's priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Minimum simulated execution time in milliseconds
    pub min_execution_ms: u64,
    /// Maximum simulated execution time in milliseconds
    pub max_execution_ms: u64,
    /// Failure probability for High priority jobs
    pub failure_rate_high: f64,
    /// Failure probability for Medium priority jobs
    pub failure_rate_medium: f64,
    /// Failure probability for Low priority jobs
    pub failure_rate_low: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_execution_ms: 2000,
            max_execution_ms: 7000,
            failure_rate_high: 0.10,
            failure_rate_medium: 0.15,
            failure_rate_low: 0.20,
        }
    }
}

impl SimulationConfig {
    /// A configuration where every execution succeeds instantly.
    /// Useful for tests and fast demo runs.
    pub fn always_succeed(execution_ms: u64) -> Self {
        Self {
            min_execution_ms: execution_ms,
            max_execution_ms: execution_ms,
            failure_rate_high: 0.0,
            failure_rate_medium: 0.0,
            failure_rate_low: 0.0,
        }
    }

    /// A configuration where every execution fails instantly.
    pub fn always_fail(execution_ms: u64) -> Self {
        Self {
            min_execution_ms: execution_ms,
            max_execution_ms: execution_ms,
            failure_rate_high: 1.0,
            failure_rate_medium: 1.0,
            failure_rate_low: 1.0,
        }
    }
}

/// Static definition of a worker slot. The roster is fixed at engine
/// construction; workers are not created or destroyed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub id: String,
    pub name: String,
    /// Maximum number of jobs the worker can hold (positive)
    pub capacity: usize,
}

impl WorkerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the dispatch tick in milliseconds
    pub tick_interval_ms: u64,
    pub workers: Vec<WorkerConfig>,
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            workers: vec![
                WorkerConfig::new("worker-1", "Primary Worker", 5),
                WorkerConfig::new("worker-2", "Secondary Worker", 3),
                WorkerConfig::new("worker-3", "Backup Worker", 4),
                WorkerConfig::new("worker-4", "Processing Node", 6),
            ],
            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_worker(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        capacity: usize,
    ) -> Self {
        self.workers.push(WorkerConfig::new(id, name, capacity));
        self
    }

    /// Replace the default roster with an empty one, for callers that build
    /// the roster entirely through `with_worker`.
    pub fn without_default_workers(mut self) -> Self {
        self.workers.clear();
        self
    }
}
