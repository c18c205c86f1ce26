use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use quartz_lite::config::EngineConfig;
use quartz_lite::engine::SchedulerEngine;
use quartz_lite::scheduler::job::{JobSpec, Priority, RetryPolicy};
use quartz_lite::scheduler::schedule;
use quartz_lite::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "quartz-lite")]
#[command(version)]
#[command(about = "An in-process recurring job scheduler with simulated workers")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the scheduling engine
    Run(RunArgs),

    /// Parse a schedule expression and show its next run time
    Schedule {
        /// Expression such as "every 5 minutes", "daily at 6 am" or "weekly"
        expression: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Run Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    /// Dispatch tick period in milliseconds
    #[arg(long, default_value = "2000")]
    tick_ms: u64,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Seed the built-in sample job set
    #[arg(long)]
    sample: bool,

    /// Load job definitions from a JSON file (array of job specs)
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// Minimum simulated execution time in milliseconds
    #[arg(long, default_value = "2000")]
    min_exec_ms: u64,

    /// Maximum simulated execution time in milliseconds
    #[arg(long, default_value = "7000")]
    max_exec_ms: u64,

    /// Seconds between periodic stats reports
    #[arg(long, default_value = "5")]
    stats_secs: u64,

    /// Output format for stats reports
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,
}

// =============================================================================
// Sample Jobs
// =============================================================================

fn sample_jobs() -> Vec<JobSpec> {
    vec![
        JobSpec {
            id: Some("job-1".to_string()),
            name: "Data Backup".to_string(),
            description: "Daily backup of user data to cloud storage".to_string(),
            schedule: "daily at 2 AM".to_string(),
            command: "backup.sh".to_string(),
            priority: Priority::High,
            dependencies: vec![],
            retry_policy: RetryPolicy {
                max_retries: 5,
                backoff_ms: 2000,
            },
        },
        JobSpec {
            id: Some("job-2".to_string()),
            name: "Cache Cleanup".to_string(),
            description: "Clear expired cache entries".to_string(),
            schedule: "every 2 minutes".to_string(),
            command: "clearCache()".to_string(),
            priority: Priority::Medium,
            dependencies: vec![],
            retry_policy: RetryPolicy {
                max_retries: 3,
                backoff_ms: 1000,
            },
        },
        JobSpec {
            id: Some("job-3".to_string()),
            name: "Report Generation".to_string(),
            description: "Generate daily analytics reports".to_string(),
            schedule: "daily at 6 AM".to_string(),
            command: "generateReports()".to_string(),
            priority: Priority::High,
            dependencies: vec!["job-1".to_string()],
            retry_policy: RetryPolicy {
                max_retries: 3,
                backoff_ms: 1500,
            },
        },
        JobSpec {
            id: Some("job-4".to_string()),
            name: "Email Notifications".to_string(),
            description: "Send pending email notifications".to_string(),
            schedule: "every 15 minutes".to_string(),
            command: "sendEmails()".to_string(),
            priority: Priority::Medium,
            dependencies: vec![],
            retry_policy: RetryPolicy {
                max_retries: 2,
                backoff_ms: 500,
            },
        },
        JobSpec {
            id: Some("job-5".to_string()),
            name: "System Health Check".to_string(),
            description: "Monitor system resources and performance".to_string(),
            schedule: "every 5 minutes".to_string(),
            command: "healthCheck()".to_string(),
            priority: Priority::Low,
            dependencies: vec![],
            retry_policy: RetryPolicy {
                max_retries: 1,
                backoff_ms: 1000,
            },
        },
    ]
}

// =============================================================================
// Reporting
// =============================================================================

async fn print_stats(
    engine: &SchedulerEngine,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = engine.system_stats().await;
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Table => {
            println!(
                "jobs: {} total, {} running, {} completed, {} failed | workers: {}/{} busy, avg load {:.2}",
                stats.total_jobs,
                stats.running_jobs,
                stats.completed_jobs,
                stats.failed_jobs,
                stats.active_workers,
                stats.total_workers,
                stats.avg_worker_load,
            );
        }
    }
    Ok(())
}

async fn print_final_report(
    engine: &SchedulerEngine,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if output == OutputFormat::Json {
        let jobs = engine.all_jobs().await;
        let workers = engine.all_workers().await;
        let report = serde_json::json!({
            "stats": engine.system_stats().await,
            "jobs": jobs,
            "workers": workers,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "{:<12} {:<22} {:<10} {:<8} {:>5} {:>5}  {}",
        "ID", "NAME", "STATUS", "PRIORITY", "RUNS", "FAILS", "NEXT RUN"
    );
    let mut jobs = engine.all_jobs().await;
    jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    for job in jobs {
        println!(
            "{:<12} {:<22} {:<10} {:<8} {:>5} {:>5}  {}",
            job.id,
            job.name,
            job.status.to_string(),
            job.priority.to_string(),
            job.execution_count,
            job.failure_count,
            job.next_run.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    println!();
    println!(
        "{:<12} {:<22} {:<8} {:>6} {:>9} {:>9}",
        "ID", "NAME", "STATUS", "LOAD", "EXECUTED", "SUCCESS%"
    );
    for worker in engine.all_workers().await {
        println!(
            "{:<12} {:<22} {:<8} {:>6.2} {:>9} {:>8.0}%",
            worker.id,
            worker.name,
            worker.status.to_string(),
            worker.load(),
            worker.total_executed,
            worker.success_rate() * 100.0,
        );
    }

    print_stats(engine, output).await
}

// =============================================================================
// Run Command
// =============================================================================

async fn run_engine(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = EngineConfig::default();
    config.tick_interval_ms = args.tick_ms;
    config.simulation.min_execution_ms = args.min_exec_ms;
    config.simulation.max_execution_ms = args.max_exec_ms.max(args.min_exec_ms);

    let engine = SchedulerEngine::new(config);

    if args.sample {
        for spec in sample_jobs() {
            engine.add_job(spec).await?;
        }
    }

    if let Some(path) = &args.jobs {
        let data = std::fs::read_to_string(path)?;
        let specs: Vec<JobSpec> = serde_json::from_str(&data)?;
        for spec in specs {
            engine.add_job(spec).await?;
        }
    }

    let job_count = engine.all_jobs().await.len();
    tracing::info!(
        jobs = job_count,
        tick_ms = args.tick_ms,
        "Starting quartz-lite engine"
    );

    engine.start();
    let shutdown = install_shutdown_handler();

    let run_for = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(run_for);

    let mut stats_interval = tokio::time::interval(Duration::from_secs(args.stats_secs.max(1)));
    stats_interval.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = &mut run_for => break,
            _ = stats_interval.tick() => {
                print_stats(&engine, args.output).await?;
            }
        }
    }

    engine.stop();
    print_final_report(&engine, args.output).await?;

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            run_engine(run_args).await?;
        }
        Commands::Schedule { expression } => {
            let recurrence = schedule::parse(&expression);
            let next = recurrence.next_run(Utc::now());
            println!("expression: {}", expression);
            println!("recurrence: {:?}", recurrence);
            println!("next run:   {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    Ok(())
}
