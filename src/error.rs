use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("A job with id {0} already exists")]
    DuplicateJob(String),

    #[error("Invalid job definition: {0}")]
    InvalidJob(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
