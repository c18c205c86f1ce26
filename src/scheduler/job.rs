use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::schedule;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Ordering weight used by the dispatcher: High > Medium > Low.
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay in milliseconds for the given failure count:
    /// attempt 1 waits `backoff_ms`, attempt 2 waits `2 * backoff_ms`, and so
    /// on, doubling each time.
    pub fn backoff_delay_ms(&self, failure_count: u32) -> u64 {
        self.backoff_ms
            .saturating_mul(2u64.saturating_pow(failure_count.saturating_sub(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: LogLevel,
}

/// Creation input for a job. Only `name`, `schedule` and `command` are
/// required; everything else has the same defaults the scheduler has always
/// used. When `id` is absent the engine mints one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schedule: String,
    pub command: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub retry_policy: RetryPolicy,
}

/// Partial update applied to an existing job. Absent fields keep their
/// current values; runtime state (status, counters, logs) is never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub command: Option<String>,
    pub priority: Option<Priority>,
    pub dependencies: Option<Vec<String>>,
    pub retry_policy: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub command: String,
    pub priority: Priority,
    pub dependencies: Vec<String>,
    pub retry_policy: RetryPolicy,
    pub status: JobStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub execution_count: u64,
    pub failure_count: u32,
    pub assigned_worker: Option<String>,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Build a job from its spec, minting an id when the spec carries none.
    /// The initial `next_run` is computed from the schedule immediately.
    pub fn from_spec(spec: JobSpec, now: DateTime<Utc>) -> Self {
        let id = spec
            .id
            .unwrap_or_else(|| format!("job-{}", Uuid::new_v4()));
        let next_run = schedule::next_run_from(&spec.schedule, now);

        Self {
            id,
            name: spec.name,
            description: spec.description,
            schedule: spec.schedule,
            command: spec.command,
            priority: spec.priority,
            dependencies: spec.dependencies,
            retry_policy: spec.retry_policy,
            status: JobStatus::Pending,
            last_run: None,
            next_run,
            execution_count: 0,
            failure_count: 0,
            assigned_worker: None,
            logs: Vec::new(),
            created_at: now,
        }
    }

    /// Merge an update into the static definition and recompute `next_run`.
    pub fn apply_update(&mut self, update: JobUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(schedule) = update.schedule {
            self.schedule = schedule;
        }
        if let Some(command) = update.command {
            self.command = command;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(dependencies) = update.dependencies {
            self.dependencies = dependencies;
        }
        if let Some(retry_policy) = update.retry_policy {
            self.retry_policy = retry_policy;
        }
        self.next_run = schedule::next_run_from(&self.schedule, now);
    }

    /// Whether the job is eligible to run at `now`: not already running, not
    /// terminally failed, all dependencies present in the ever-completed set,
    /// and due.
    pub fn can_run(&self, completed: &HashSet<String>, now: DateTime<Utc>) -> bool {
        if self.status == JobStatus::Running {
            return false;
        }

        // A job that exhausted its retries stays failed until edited or
        // deleted; its stale next_run must not re-admit it.
        if self.status == JobStatus::Failed && self.failure_count >= self.retry_policy.max_retries {
            return false;
        }

        for dep in &self.dependencies {
            if !completed.contains(dep) {
                return false;
            }
        }

        now >= self.next_run
    }

    pub fn priority_weight(&self) -> u8 {
        self.priority.weight()
    }

    /// Recompute `next_run` from the schedule, starting at `now`.
    pub fn reschedule(&mut self, now: DateTime<Utc>) {
        self.next_run = schedule::next_run_from(&self.schedule, now);
    }

    /// Append a log entry, keeping only the most recent 100.
    pub fn add_log(&mut self, message: impl Into<String>, level: LogLevel) {
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            message: message.into(),
            level,
        });

        if self.logs.len() > MAX_LOG_ENTRIES {
            let excess = self.logs.len() - MAX_LOG_ENTRIES;
            self.logs.drain(..excess);
        }
    }
}
