use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::scheduler::job::{Job, JobStatus, JobUpdate, LogLevel};

/// Owns the job map and the permanent record of job ids that have completed
/// at least once. The completed-set is what satisfies dependency gating; it
/// only shrinks when a job is deleted.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: HashMap<String, Job>,
    completed: HashSet<String>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Snapshot of every job. Order is not meaningful.
    pub fn all_jobs(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Merge a partial update into a job, recompute its next run and log it.
    /// Returns a snapshot of the updated job.
    pub fn update_job(&mut self, id: &str, update: JobUpdate, now: DateTime<Utc>) -> Option<Job> {
        let job = self.jobs.get_mut(id)?;
        job.apply_update(update, now);
        let message = format!("Job updated: {}", job.name);
        job.add_log(message, LogLevel::Info);
        Some(job.clone())
    }

    /// Remove a job, cancelling it first if it is running. Also forgets the
    /// job in the completed-set so it no longer satisfies dependencies.
    pub fn remove(&mut self, id: &str) -> Option<Job> {
        let mut job = self.jobs.remove(id)?;
        if job.status == JobStatus::Running {
            job.status = JobStatus::Cancelled;
        }
        self.completed.remove(id);
        Some(job)
    }

    /// Record that a job has completed at least once.
    pub fn mark_completed(&mut self, id: &str) {
        self.completed.insert(id.to_string());
    }

    pub fn completed(&self) -> &HashSet<String> {
        &self.completed
    }

    /// Jobs eligible to run at `now`, most eligible first: descending
    /// priority weight, ties broken by earliest due time.
    pub fn executable_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        let mut eligible: Vec<Job> = self
            .jobs
            .values()
            .filter(|job| job.can_run(&self.completed, now) && job.status != JobStatus::Running)
            .cloned()
            .collect();

        eligible.sort_by(|a, b| {
            b.priority_weight()
                .cmp(&a.priority_weight())
                .then(a.next_run.cmp(&b.next_run))
        });

        eligible
    }
}
