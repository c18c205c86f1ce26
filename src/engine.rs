use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Job, JobSpec, JobStatus, JobUpdate, LogLevel};
use crate::scheduler::queue::JobQueue;
use crate::worker::pool::{Worker, WorkerPool, WorkerStatus};
use crate::worker::simulator::SimulatedExecutor;

/// Aggregate counters exposed to the read surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_jobs: usize,
    pub running_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub total_workers: usize,
    pub active_workers: usize,
    pub avg_worker_load: f64,
    pub running: bool,
}

/// The scheduling engine: owns the job queue and worker pool, dispatches
/// eligible jobs to the least-loaded workers on a periodic tick, and applies
/// the retry policy when executions fail.
///
/// All accessors hand out snapshots; nothing outside the engine can mutate
/// its records directly. Cloning is cheap and shares the same engine.
#[derive(Clone)]
pub struct SchedulerEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    jobs: RwLock<JobQueue>,
    workers: RwLock<WorkerPool>,
    executor: SimulatedExecutor,
    tick_interval: Duration,
    running: AtomicBool,
    tick_task: std::sync::Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl SchedulerEngine {
    pub fn new(config: EngineConfig) -> Self {
        let inner = EngineInner {
            jobs: RwLock::new(JobQueue::new()),
            workers: RwLock::new(WorkerPool::from_configs(&config.workers)),
            executor: SimulatedExecutor::new(config.simulation),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            running: AtomicBool::new(false),
            tick_task: std::sync::Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Register a new job. The id must be unique; when the spec carries none
    /// the engine mints one.
    pub async fn add_job(&self, spec: JobSpec) -> Result<Job> {
        if let Some(id) = &spec.id {
            if id.trim().is_empty() {
                return Err(SchedulerError::InvalidJob(
                    "job id must not be empty".to_string(),
                ));
            }
        }

        let mut jobs = self.inner.jobs.write().await;
        if let Some(id) = &spec.id {
            if jobs.contains(id) {
                return Err(SchedulerError::DuplicateJob(id.clone()));
            }
        }

        let mut job = Job::from_spec(spec, Utc::now());
        let message = format!("Job created: {}", job.name);
        job.add_log(message, LogLevel::Info);
        tracing::info!(job_id = %job.id, name = %job.name, schedule = %job.schedule, "Job added");

        let snapshot = job.clone();
        jobs.insert(job);
        Ok(snapshot)
    }

    /// Merge a partial update into an existing job and recompute its next
    /// run. Runtime state (status, counters, logs) is untouched.
    pub async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job> {
        let mut jobs = self.inner.jobs.write().await;
        let job = jobs
            .update_job(id, update, Utc::now())
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;
        tracing::info!(job_id = %id, "Job updated");
        Ok(job)
    }

    /// Remove a job, cancelling it first if it is running. Returns false for
    /// an unknown id. An in-flight execution of the job runs to completion
    /// but its result is discarded.
    pub async fn delete_job(&self, id: &str) -> bool {
        let removed = self.inner.jobs.write().await.remove(id);
        match removed {
            Some(job) => {
                tracing::info!(job_id = %id, status = %job.status, "Job deleted");
                true
            }
            None => false,
        }
    }

    pub async fn get_job(&self, id: &str) -> Option<Job> {
        self.inner.jobs.read().await.get(id).cloned()
    }

    pub async fn all_jobs(&self) -> Vec<Job> {
        self.inner.jobs.read().await.all_jobs()
    }

    pub async fn all_workers(&self) -> Vec<Worker> {
        self.inner.workers.read().await.all_workers()
    }

    /// Jobs eligible to run right now, most eligible first.
    pub async fn executable_jobs(&self) -> Vec<Job> {
        self.inner.jobs.read().await.executable_jobs(Utc::now())
    }

    pub async fn system_stats(&self) -> SystemStats {
        let jobs = self.inner.jobs.read().await.all_jobs();
        let workers = self.inner.workers.read().await.all_workers();

        let avg_worker_load = if workers.is_empty() {
            0.0
        } else {
            workers.iter().map(|w| w.load()).sum::<f64>() / workers.len() as f64
        };

        SystemStats {
            total_jobs: jobs.len(),
            running_jobs: jobs.iter().filter(|j| j.status == JobStatus::Running).count(),
            completed_jobs: jobs
                .iter()
                .filter(|j| j.status == JobStatus::Completed)
                .count(),
            failed_jobs: jobs.iter().filter(|j| j.status == JobStatus::Failed).count(),
            total_workers: workers.len(),
            active_workers: workers
                .iter()
                .filter(|w| w.status == WorkerStatus::Busy)
                .count(),
            avg_worker_load,
            running: self.is_running(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Start the periodic tick driver. A no-op when already running. Job and
    /// worker state is kept across start/stop cycles.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let token = CancellationToken::new();
        let tick_token = token.clone();
        let inner = self.inner.clone();

        let handle = tokio::spawn(async move {
            let period = inner.tick_interval;
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            loop {
                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = interval.tick() => {
                        // Each tick dispatches in its own task so a slow batch
                        // of executions never delays the next tick.
                        let tick_inner = inner.clone();
                        tokio::spawn(async move {
                            tick_inner.process_pending_jobs().await;
                        });
                    }
                }
            }
        });

        tracing::info!(tick_ms = self.inner.tick_interval.as_millis() as u64, "Engine started");
        *self.inner.tick_task.lock().expect("tick task lock poisoned") = Some((token, handle));
    }

    /// Stop the tick driver. In-flight executions run to completion and still
    /// apply their state transitions. A no-op when already stopped.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some((token, _handle)) = self.inner.tick_task.lock().expect("tick task lock poisoned").take()
        {
            token.cancel();
        }
        tracing::info!("Engine stopped");
    }

    /// Run one dispatch pass: match the most eligible jobs to the available
    /// workers and wait for the launched executions to settle. The tick
    /// driver calls this on its period; tests and single-step tooling may
    /// call it directly.
    pub async fn process_pending_jobs(&self) {
        self.inner.process_pending_jobs().await;
    }
}

impl EngineInner {
    async fn process_pending_jobs(self: &Arc<Self>) {
        let now = Utc::now();
        let executable = self.jobs.read().await.executable_jobs(now);
        let available = self.workers.read().await.available_count();

        let selected: Vec<String> = executable
            .into_iter()
            .take(available)
            .map(|job| job.id)
            .collect();

        if selected.is_empty() {
            return;
        }
        tracing::debug!(count = selected.len(), "Dispatching jobs");

        let mut handles = Vec::with_capacity(selected.len());
        for job_id in selected {
            let inner = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                inner.execute_job(&job_id).await;
            }));
        }

        // Settle every execution launched by this tick before returning.
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn execute_job(&self, job_id: &str) {
        // Admission: transition the job and claim the worker under the write
        // locks, so overlapping ticks can never run the same job twice.
        let (worker_id, worker_name, priority) = {
            let mut jobs = self.jobs.write().await;
            let mut workers = self.workers.write().await;

            let Some(job) = jobs.get_mut(job_id) else {
                return;
            };
            if job.status == JobStatus::Running {
                return;
            }

            let Some(worker) = workers.least_loaded_available() else {
                job.add_log("No available workers", LogLevel::Warning);
                tracing::warn!(job_id = %job_id, "No available workers");
                return;
            };

            worker.assign_job(&job.id);
            job.status = JobStatus::Running;
            job.assigned_worker = Some(worker.id.clone());
            job.execution_count += 1;
            let message = format!("Started execution on {}", worker.name);
            job.add_log(message, LogLevel::Info);
            tracing::info!(job_id = %job_id, worker_id = %worker.id, "Job started");

            (worker.id.clone(), worker.name.clone(), job.priority)
        };

        let outcome = self.executor.run(job_id, priority).await;

        self.settle_execution(job_id, &worker_id, &worker_name, outcome.success)
            .await;
    }

    async fn settle_execution(
        &self,
        job_id: &str,
        worker_id: &str,
        worker_name: &str,
        success: bool,
    ) {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;
        let mut workers = self.workers.write().await;

        if let Some(worker) = workers.get_mut(worker_id) {
            worker.complete_job(job_id, success);
        }

        let mut completed = false;
        match jobs.get_mut(job_id) {
            Some(job) => {
                if success {
                    job.status = JobStatus::Completed;
                    job.last_run = Some(now);
                    job.reschedule(now);
                    let message = format!("Completed successfully on {}", worker_name);
                    job.add_log(message, LogLevel::Success);
                    tracing::info!(job_id = %job_id, worker_id = %worker_id, "Job completed");
                    completed = true;
                } else {
                    job.status = JobStatus::Failed;
                    job.failure_count += 1;
                    job.add_log("Failed: simulated job failure", LogLevel::Error);
                    tracing::warn!(
                        job_id = %job_id,
                        worker_id = %worker_id,
                        failures = job.failure_count,
                        "Job failed"
                    );

                    if job.failure_count < job.retry_policy.max_retries {
                        let delay_ms = job.retry_policy.backoff_delay_ms(job.failure_count);
                        job.next_run = now + chrono::Duration::milliseconds(delay_ms as i64);
                        job.status = JobStatus::Pending;
                        job.add_log(format!("Scheduled retry in {delay_ms}ms"), LogLevel::Warning);
                    } else {
                        job.add_log("Maximum retries exceeded", LogLevel::Error);
                        tracing::warn!(job_id = %job_id, "Maximum retries exceeded");
                    }
                }
                job.assigned_worker = None;
            }
            None => {
                // Deleted while executing; the worker has been released and
                // the result is dropped.
                tracing::debug!(job_id = %job_id, "Job no longer exists, discarding result");
            }
        }

        if completed {
            jobs.mark_completed(job_id);
        }
    }
}
