use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::handlers::judge::{ProblemFile, judge_local};
use worker::{JudgePipeline, LocalProcessAdapter, WorkerAppConfig};

/// Judge a source file locally with the system compilers.
///
/// Programs are not sandboxed. Only judge code you trust.
#[derive(Parser)]
#[command(name = "judge", version)]
struct Cli {
    /// Problem definition (TOML)
    #[arg(short, long)]
    problem: PathBuf,

    /// Source file to judge
    #[arg(short, long)]
    source: PathBuf,

    /// Language of the source file (cpp, c, java, python)
    #[arg(short, long, env = "JUDGE_LANGUAGE")]
    language: Option<String>,

    /// Pretty-print the JSON result
    #[arg(long, default_value = "false")]
    pretty: bool,
}

fn language_from_extension(path: &std::path::Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "cpp" | "cc" | "cxx" => Some("cpp"),
        "c" => Some("c"),
        "java" => Some("java"),
        "py" => Some("python"),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!(worker_id = %config.worker.id, work_dir = %config.worker.work_dir, "Local judge starting");

    let language = match cli.language {
        Some(language) => language,
        None => language_from_extension(&cli.source)
            .map(str::to_string)
            .context("Cannot infer language from file extension, pass --language")?,
    };

    let problem = ProblemFile::load(&cli.problem)
        .await
        .and_then(ProblemFile::into_problem)
        .with_context(|| format!("Failed to load problem {}", cli.problem.display()))?;
    let source = tokio::fs::read_to_string(&cli.source)
        .await
        .with_context(|| format!("Failed to read source {}", cli.source.display()))?;

    let adapter = Arc::new(LocalProcessAdapter::new(
        &config.worker.work_dir,
        config.worker.artifact_cache_size,
    ));
    let pipeline = JudgePipeline::new(adapter, config.judge);

    let result = judge_local(&pipeline, &problem, &language, source).await?;

    let cases: Vec<_> = result
        .test_case_results
        .iter()
        .map(|case| case.verdict.code())
        .collect();
    info!(
        verdict = %result.verdict,
        score = result.score,
        max_score = result.max_score,
        cases = %cases.join(" "),
        "Judging finished"
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    Ok(())
}
