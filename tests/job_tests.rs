use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use quartz_lite::scheduler::job::{Job, JobSpec, JobStatus, LogLevel, Priority, RetryPolicy};

fn spec(name: &str, schedule: &str) -> JobSpec {
    JobSpec {
        id: Some(format!("{}-id", name)),
        name: name.to_string(),
        description: String::new(),
        schedule: schedule.to_string(),
        command: "noop".to_string(),
        priority: Priority::Medium,
        dependencies: vec![],
        retry_policy: RetryPolicy::default(),
    }
}

#[test]
fn test_job_from_spec_initial_state() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let job = Job::from_spec(spec("backup", "every 5 minutes"), now);

    assert_eq!(job.id, "backup-id");
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.last_run.is_none());
    assert_eq!(job.next_run, now + Duration::minutes(5));
    assert_eq!(job.execution_count, 0);
    assert_eq!(job.failure_count, 0);
    assert!(job.assigned_worker.is_none());
    assert_eq!(job.created_at, now);
}

#[test]
fn test_minted_ids_are_unique() {
    let now = Utc::now();
    let mut s = spec("a", "weekly");
    s.id = None;
    let job1 = Job::from_spec(s.clone(), now);
    let job2 = Job::from_spec(s, now);

    assert!(job1.id.starts_with("job-"));
    assert_ne!(job1.id, job2.id);
}

#[test]
fn test_spec_defaults_from_json() {
    let spec: JobSpec = serde_json::from_str(
        r#"{"name": "minimal", "schedule": "weekly", "command": "run()"}"#,
    )
    .unwrap();

    assert!(spec.id.is_none());
    assert_eq!(spec.priority, Priority::Medium);
    assert!(spec.dependencies.is_empty());
    assert_eq!(spec.retry_policy.max_retries, 3);
    assert_eq!(spec.retry_policy.backoff_ms, 1000);
}

#[test]
fn test_can_run_when_due() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let job = Job::from_spec(spec("due", "every 5 minutes"), now);
    let completed = HashSet::new();

    assert!(!job.can_run(&completed, now));
    assert!(job.can_run(&completed, now + Duration::minutes(5)));
    assert!(job.can_run(&completed, now + Duration::hours(1)));
}

#[test]
fn test_can_run_false_while_running() {
    let now = Utc::now();
    let mut job = Job::from_spec(spec("busy", "every 5 minutes"), now);
    job.status = JobStatus::Running;

    assert!(!job.can_run(&HashSet::new(), now + Duration::hours(1)));
}

#[test]
fn test_can_run_gated_on_dependencies() {
    let now = Utc::now();
    let mut s = spec("dependent", "every 5 minutes");
    s.dependencies = vec!["upstream".to_string()];
    let job = Job::from_spec(s, now);
    let later = now + Duration::hours(1);

    let mut completed = HashSet::new();
    assert!(!job.can_run(&completed, later));

    completed.insert("upstream".to_string());
    assert!(job.can_run(&completed, later));
}

#[test]
fn test_priority_weights() {
    assert_eq!(Priority::High.weight(), 3);
    assert_eq!(Priority::Medium.weight(), 2);
    assert_eq!(Priority::Low.weight(), 1);
}

#[test]
fn test_backoff_doubles_per_failure() {
    let policy = RetryPolicy {
        max_retries: 5,
        backoff_ms: 1000,
    };
    assert_eq!(policy.backoff_delay_ms(1), 1000);
    assert_eq!(policy.backoff_delay_ms(2), 2000);
    assert_eq!(policy.backoff_delay_ms(3), 4000);
    assert_eq!(policy.backoff_delay_ms(4), 8000);
}

#[test]
fn test_log_ring_keeps_most_recent_hundred() {
    let now = Utc::now();
    let mut job = Job::from_spec(spec("chatty", "weekly"), now);

    for i in 0..150 {
        job.add_log(format!("entry {}", i), LogLevel::Info);
    }

    assert_eq!(job.logs.len(), 100);
    assert_eq!(job.logs.first().unwrap().message, "entry 50");
    assert_eq!(job.logs.last().unwrap().message, "entry 149");
}

#[test]
fn test_apply_update_merges_and_reschedules() {
    let created = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let mut job = Job::from_spec(spec("mutable", "every 5 minutes"), created);
    job.execution_count = 7;
    job.failure_count = 2;
    job.status = JobStatus::Failed;

    let update = quartz_lite::scheduler::job::JobUpdate {
        name: Some("renamed".to_string()),
        schedule: Some("every 1 hours".to_string()),
        priority: Some(Priority::High),
        ..Default::default()
    };
    let later = created + Duration::minutes(30);
    job.apply_update(update, later);

    assert_eq!(job.name, "renamed");
    assert_eq!(job.priority, Priority::High);
    assert_eq!(job.command, "noop");
    assert_eq!(job.next_run, later + Duration::hours(1));
    // Runtime state is untouched by updates
    assert_eq!(job.execution_count, 7);
    assert_eq!(job.failure_count, 2);
    assert_eq!(job.status, JobStatus::Failed);
}
