use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::WorkerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Idle,
    Busy,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::Idle => write!(f, "idle"),
            WorkerStatus::Busy => write!(f, "busy"),
        }
    }
}

/// A capacity-bounded execution slot. `status` is derived from the assigned
/// job set: busy iff any job is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub capacity: usize,
    pub current_jobs: HashSet<String>,
    pub status: WorkerStatus,
    pub total_executed: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub last_activity: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            current_jobs: HashSet::new(),
            status: WorkerStatus::Idle,
            total_executed: 0,
            success_count: 0,
            failure_count: 0,
            last_activity: Utc::now(),
        }
    }

    /// Whether this worker will take another job. A busy worker refuses even
    /// when it has spare capacity; capacity only governs headroom while idle.
    pub fn can_accept_job(&self) -> bool {
        self.current_jobs.len() < self.capacity && self.status == WorkerStatus::Idle
    }

    /// Take on a job. Returns false (with no side effects) when the worker
    /// cannot accept it.
    pub fn assign_job(&mut self, job_id: &str) -> bool {
        if !self.can_accept_job() {
            return false;
        }
        self.current_jobs.insert(job_id.to_string());
        self.refresh_status();
        self.last_activity = Utc::now();
        true
    }

    /// Release a job and record its outcome. Removing an id the worker does
    /// not hold is a no-op on the job set, but the outcome still counts.
    pub fn complete_job(&mut self, job_id: &str, success: bool) {
        self.current_jobs.remove(job_id);
        self.total_executed += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.refresh_status();
        self.last_activity = Utc::now();
    }

    /// Load fraction in [0, 1].
    pub fn load(&self) -> f64 {
        self.current_jobs.len() as f64 / self.capacity as f64
    }

    /// Historical success rate in [0, 1]; 1.0 before any execution.
    pub fn success_rate(&self) -> f64 {
        if self.total_executed == 0 {
            1.0
        } else {
            self.success_count as f64 / self.total_executed as f64
        }
    }

    fn refresh_status(&mut self) {
        self.status = if self.current_jobs.is_empty() {
            WorkerStatus::Idle
        } else {
            WorkerStatus::Busy
        };
    }
}

/// Fixed roster of workers, in registration order.
#[derive(Debug, Default)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn from_configs(configs: &[WorkerConfig]) -> Self {
        let workers = configs
            .iter()
            .map(|cfg| {
                tracing::debug!(worker_id = %cfg.id, capacity = cfg.capacity, "Worker registered");
                Worker::new(&cfg.id, &cfg.name, cfg.capacity)
            })
            .collect();
        Self { workers }
    }

    pub fn get(&self, id: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Worker> {
        self.workers.iter_mut().find(|w| w.id == id)
    }

    /// Snapshot of the roster, in registration order.
    pub fn all_workers(&self) -> Vec<Worker> {
        self.workers.clone()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Number of workers currently able to accept a job.
    pub fn available_count(&self) -> usize {
        self.workers.iter().filter(|w| w.can_accept_job()).count()
    }

    /// The least-loaded worker among those able to accept a job.
    pub fn least_loaded_available(&mut self) -> Option<&mut Worker> {
        let mut best: Option<usize> = None;
        for (idx, worker) in self.workers.iter().enumerate() {
            if !worker.can_accept_job() {
                continue;
            }
            match best {
                Some(b) if self.workers[b].load() <= worker.load() => {}
                _ => best = Some(idx),
            }
        }
        match best {
            Some(idx) => Some(&mut self.workers[idx]),
            None => None,
        }
    }
}
