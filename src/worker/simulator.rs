use std::time::Duration;

use rand::Rng;

use crate::config::SimulationConfig;
use crate::scheduler::Priority;

/// Outcome of one simulated execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub job_id: String,
    pub success: bool,
    pub duration: Duration,
}

/// Stand-in for a real command runner: elapses a uniformly drawn duration and
/// succeeds or fails with a probability keyed on the job's priority.
///
/// A production deployment would swap this for a process/command executor
/// with the same duration + outcome contract.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    config: SimulationConfig,
}

impl SimulatedExecutor {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run one simulated execution for `job_id`.
    pub async fn run(&self, job_id: &str, priority: Priority) -> ExecutionOutcome {
        // Draw duration and outcome up front: the RNG handle must not be held
        // across the await point.
        let (duration, success) = {
            let mut rng = rand::thread_rng();
            let millis = rng.gen_range(self.config.min_execution_ms..=self.config.max_execution_ms);
            let failed = rng.gen::<f64>() < self.failure_rate(priority);
            (Duration::from_millis(millis), !failed)
        };

        tracing::debug!(
            job_id = %job_id,
            duration_ms = duration.as_millis() as u64,
            %priority,
            "Simulating job execution"
        );

        tokio::time::sleep(duration).await;

        ExecutionOutcome {
            job_id: job_id.to_string(),
            success,
            duration,
        }
    }

    fn failure_rate(&self, priority: Priority) -> f64 {
        match priority {
            Priority::High => self.config.failure_rate_high,
            Priority::Medium => self.config.failure_rate_medium,
            Priority::Low => self.config.failure_rate_low,
        }
    }
}
