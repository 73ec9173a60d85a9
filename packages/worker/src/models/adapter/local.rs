//! Development adapter that compiles and runs programs with the system toolchain.
//!
//! There is no sandbox: programs run as the current user, and peak memory is
//! neither measured nor enforced. Use it for local judging of trusted code only.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::error::AdapterError;
use super::{ExecutionAdapter, ExecutionOutcome, ExecutionRequest, TerminationReason};

/// How to start a compiled (or interpreted) program.
#[derive(Debug, Clone)]
enum Launch {
    Binary(PathBuf),
    Java { class_dir: PathBuf },
    Python(PathBuf),
}

#[derive(Debug, Clone)]
enum Artifact {
    Ready(Launch),
    /// Compiler diagnostics.
    Failed(String),
}

pub struct LocalProcessAdapter {
    work_dir: PathBuf,
    artifacts: Mutex<LruCache<String, Arc<Artifact>>>,
    /// One compilation per artifact key at a time; they share a directory.
    compiling: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl LocalProcessAdapter {
    pub fn new(work_dir: impl Into<PathBuf>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            work_dir: work_dir.into(),
            artifacts: Mutex::new(LruCache::new(capacity)),
            compiling: DashMap::new(),
        }
    }

    fn artifact_key(language: &str, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(language.as_bytes());
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn cached(&self, key: &str) -> Option<Arc<Artifact>> {
        self.artifacts
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(key).cloned())
    }

    async fn artifact(&self, request: &ExecutionRequest) -> Result<Arc<Artifact>, AdapterError> {
        let key = Self::artifact_key(&request.language, &request.source);
        if let Some(artifact) = self.cached(&key) {
            return Ok(artifact);
        }

        let gate = self.compiling.entry(key.clone()).or_default().value().clone();
        let _compiling = gate.lock().await;
        if let Some(artifact) = self.cached(&key) {
            return Ok(artifact);
        }
        let result = self.compile_into_cache(key.clone(), request).await;
        self.compiling.remove(&key);
        result
    }

    async fn compile_into_cache(
        &self,
        key: String,
        request: &ExecutionRequest,
    ) -> Result<Arc<Artifact>, AdapterError> {
        let dir = self.work_dir.join(&key);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AdapterError::Unavailable(format!(
                "failed to create work dir {}: {e}",
                dir.display()
            ))
        })?;

        let artifact = Arc::new(compile(&request.language, &request.source, &dir).await?);
        if let Ok(mut cache) = self.artifacts.lock() {
            cache.put(key, artifact.clone());
        }
        Ok(artifact)
    }
}

fn source_file_name(language: &str) -> Option<&'static str> {
    match language {
        "cpp" => Some("main.cpp"),
        "c" => Some("main.c"),
        "java" => Some("Main.java"),
        "python" => Some("main.py"),
        _ => None,
    }
}

async fn compile(language: &str, source: &str, dir: &Path) -> Result<Artifact, AdapterError> {
    let Some(file_name) = source_file_name(language) else {
        return Ok(Artifact::Failed(format!("Unsupported language: {language}")));
    };
    let source_path = dir.join(file_name);
    tokio::fs::write(&source_path, source)
        .await
        .map_err(|e| AdapterError::Unavailable(format!("failed to write source: {e}")))?;

    let exe_path = dir.join("solution");
    let (program, args, launch): (&str, Vec<String>, Launch) = match language {
        "cpp" => (
            "g++",
            vec![
                "-O2".into(),
                "-std=c++17".into(),
                "-o".into(),
                exe_path.display().to_string(),
                source_path.display().to_string(),
            ],
            Launch::Binary(exe_path.clone()),
        ),
        "c" => (
            "gcc",
            vec![
                "-O2".into(),
                "-std=c17".into(),
                "-o".into(),
                exe_path.display().to_string(),
                source_path.display().to_string(),
            ],
            Launch::Binary(exe_path.clone()),
        ),
        "java" => (
            "javac",
            vec![source_path.display().to_string()],
            Launch::Java {
                class_dir: dir.to_path_buf(),
            },
        ),
        // Syntax check only.
        _ => (
            "python3",
            vec![
                "-m".into(),
                "py_compile".into(),
                source_path.display().to_string(),
            ],
            Launch::Python(source_path.clone()),
        ),
    };

    debug!(language, program, "Compiling");
    let output = Command::new(program)
        .args(&args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| AdapterError::Unavailable(format!("{program} not available: {e}")))?;

    if output.status.success() {
        Ok(Artifact::Ready(launch))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Artifact::Failed(format!("{stderr}{stdout}")))
    }
}

fn command_for(launch: &Launch) -> Command {
    match launch {
        Launch::Binary(path) => Command::new(path),
        Launch::Java { class_dir } => {
            let mut cmd = Command::new("java");
            cmd.arg("-cp").arg(class_dir).arg("Main");
            cmd
        }
        Launch::Python(path) => {
            let mut cmd = Command::new("python3");
            cmd.arg(path);
            cmd
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[async_trait]
impl ExecutionAdapter for LocalProcessAdapter {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, AdapterError> {
        let launch = match self.artifact(request).await?.as_ref() {
            Artifact::Ready(launch) => launch.clone(),
            Artifact::Failed(diagnostics) => {
                return Ok(ExecutionOutcome::terminated(
                    TerminationReason::CompileFailure,
                    diagnostics.clone(),
                ));
            }
        };

        let mut child = command_for(&launch)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::Unavailable(format!("failed to spawn program: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = request.stdin.clone().into_bytes();
            tokio::spawn(async move {
                // The program may exit without reading its input.
                let _ = stdin.write_all(&input).await;
            });
        }

        let start = Instant::now();
        let limit = Duration::from_millis(request.time_limit_ms as u64);
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to collect program output");
                return Err(AdapterError::Internal(e.to_string()));
            }
            Err(_) => {
                return Ok(ExecutionOutcome {
                    stdout: String::new(),
                    stderr: String::new(),
                    termination: TerminationReason::TimeLimitExceeded,
                    elapsed_ms: request.time_limit_ms,
                    peak_memory_mb: 0,
                });
            }
        };
        let elapsed_ms = start.elapsed().as_millis().min(u32::MAX as u128) as u32;

        let termination = if output.status.success() {
            TerminationReason::Exited
        } else {
            debug!(exit_code = ?output.status.code(), "Program exited with non-zero status");
            TerminationReason::RuntimeFailure {
                exit_code: output.status.code(),
                signal: exit_signal(&output.status),
            }
        };

        Ok(ExecutionOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            termination,
            elapsed_ms,
            peak_memory_mb: 0,
        })
    }
}
