use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use platform::models::submission::SubmitRequest;
use platform::{Platform, PlatformConfig, SystemClock};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::{LocalProcessAdapter, WorkerAppConfig};

/// Load the sample catalogue and optionally judge one submission against it.
///
/// Programs run through the local development adapter and are not
/// sandboxed. Only judge code you trust.
#[derive(Parser)]
#[command(name = "judge-platform", version)]
struct Cli {
    /// Source file to submit. Without it, the catalogue is printed.
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Submitting user
    #[arg(short, long, default_value = "u1")]
    user: String,

    /// Problem to submit to
    #[arg(short, long, default_value = "p1")]
    problem: String,

    /// Contest to submit in
    #[arg(short, long)]
    contest: Option<String>,

    /// Language of the source file (cpp, c, java, python)
    #[arg(short, long, env = "JUDGE_LANGUAGE", default_value = "cpp")]
    language: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = PlatformConfig::load().context("Failed to load platform config")?;
    let worker_config = WorkerAppConfig::load().context("Failed to load worker config")?;

    let adapter = Arc::new(LocalProcessAdapter::new(
        &worker_config.worker.work_dir,
        worker_config.worker.artifact_cache_size,
    ));
    let platform = Platform::start(config, adapter, Arc::new(SystemClock));
    platform::seed::seed(&platform).context("Failed to load sample data")?;

    let output = match cli.source {
        None => json!({
            "problems": platform
                .problems()
                .iter()
                .map(|problem| problem.as_ref().clone())
                .collect::<Vec<_>>(),
            "contests": platform.contests(),
            "users": platform.users(),
        }),
        Some(path) => {
            let source = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read source {}", path.display()))?;
            let mut req = SubmitRequest::new(cli.user, cli.problem, cli.language, source);
            if let Some(contest) = cli.contest.clone() {
                req = req.in_contest(contest);
            }

            let ticket = platform.submit(req).await?;
            info!(submission_id = %ticket.submission_id, "Waiting for verdict");
            let record = ticket.wait().await?;

            let stats = platform
                .problem_stats(&record.submission.problem_id)
                .await?;
            let leaderboard = match cli.contest {
                Some(contest) => Some(platform.leaderboard(&contest.into()).await?),
                None => None,
            };
            json!({
                "submission": record,
                "problem_stats": stats,
                "leaderboard": leaderboard,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    platform.shutdown().await;
    Ok(())
}
