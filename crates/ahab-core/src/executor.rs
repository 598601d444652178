//! compose コマンドの並列実行
//!
//! 対象ファイルごとに 1 タスクを起動し、全タスクの完了を待って集計を返します。
//! 同時実行数はセマフォで制限し、キャンセルトークンで中断できます。
//! 1 ファイルの失敗が他のファイルの実行を止めることはありません。

use crate::action::{Action, CommandTemplate};
use crate::summary::{ExecutionOutcome, InvocationFailure, RunSummary};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// デフォルトの同時実行数
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// 並列実行器
#[derive(Debug, Clone)]
pub struct Executor {
    max_parallel: usize,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLEL)
    }
}

impl Executor {
    /// `max_parallel` が 0 の場合は 1 として扱う
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// 1 回の呼び出しあたりのタイムアウト
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub async fn run(
        &self,
        candidates: Vec<PathBuf>,
        action: Action,
        template: &CommandTemplate,
    ) -> RunSummary {
        self.run_with(candidates, action, template, |_| {}).await
    }

    /// 全対象ファイルに対してコマンドを実行
    ///
    /// `on_outcome` は各ファイルの完了時に完了順で呼ばれる。
    /// 対象が空の場合はプロセスを起動せず、空の集計を即座に返す。
    #[tracing::instrument(skip_all, fields(action = %action, files = candidates.len()))]
    pub async fn run_with<F>(
        &self,
        candidates: Vec<PathBuf>,
        action: Action,
        template: &CommandTemplate,
        mut on_outcome: F,
    ) -> RunSummary
    where
        F: FnMut(&ExecutionOutcome),
    {
        let mut summary = RunSummary::new(action);
        if candidates.is_empty() {
            info!("No compose files to run");
            return summary;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let template = Arc::new(template.clone());
        let mut files: HashMap<task::Id, PathBuf> = HashMap::with_capacity(candidates.len());
        let mut tasks = JoinSet::new();

        for file in candidates {
            let invocation = Invocation {
                file: file.clone(),
                action,
                template: Arc::clone(&template),
                semaphore: Arc::clone(&semaphore),
                cancel: self.cancel.clone(),
                timeout: self.timeout,
            };
            let handle = tasks.spawn(invocation.run());
            files.insert(handle.id(), file);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    files.remove(&id);
                    outcome
                }
                // 異常終了したタスクのファイルも失敗として記録する
                Err(e) => {
                    warn!(error = %e, "Invocation task failed");
                    let Some(file) = files.remove(&e.id()) else {
                        continue;
                    };
                    ExecutionOutcome::failed(
                        file,
                        action,
                        InvocationFailure::Panicked {
                            message: e.to_string(),
                        },
                        String::new(),
                        Duration::ZERO,
                    )
                }
            };
            on_outcome(&outcome);
            summary.record(outcome);
        }

        let summary = summary.finalize();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Run finished"
        );
        summary
    }
}

/// 1 ファイル分の呼び出し
struct Invocation {
    file: PathBuf,
    action: Action,
    template: Arc<CommandTemplate>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl Invocation {
    async fn run(self) -> ExecutionOutcome {
        let _permit = tokio::select! {
            permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return self.failed(InvocationFailure::Cancelled, String::new(), Duration::ZERO),
            },
            _ = self.cancel.cancelled() => {
                return self.failed(InvocationFailure::Cancelled, String::new(), Duration::ZERO);
            }
        };
        if self.cancel.is_cancelled() {
            return self.failed(InvocationFailure::Cancelled, String::new(), Duration::ZERO);
        }

        let started = Instant::now();
        let mut command = Command::new(&self.template.program);
        command
            .args(self.template.render(&self.file))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.template.display(&self.file), "Running compose command");

        let output = command.output();
        let limit = self.timeout;
        let waited = async move {
            match limit {
                Some(limit) => tokio::time::timeout(limit, output).await.ok(),
                None => Some(output.await),
            }
        };

        // select で future を破棄すると kill_on_drop により子プロセスも終了する
        let result = tokio::select! {
            result = waited => result,
            _ = self.cancel.cancelled() => {
                warn!(file = %self.file.display(), "Invocation cancelled");
                return self.failed(InvocationFailure::Cancelled, String::new(), started.elapsed());
            }
        };
        let elapsed = started.elapsed();

        match result {
            None => {
                let timeout = self.timeout.unwrap_or_default();
                warn!(file = %self.file.display(), ?timeout, "Invocation timed out");
                self.failed(InvocationFailure::TimedOut { timeout }, String::new(), elapsed)
            }
            Some(Err(e)) => {
                warn!(file = %self.file.display(), error = %e, "Failed to spawn compose command");
                self.failed(
                    InvocationFailure::Spawn {
                        message: e.to_string(),
                    },
                    String::new(),
                    elapsed,
                )
            }
            Some(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if output.status.success() {
                    debug!(file = %self.file.display(), ?elapsed, "Invocation succeeded");
                    ExecutionOutcome::succeeded(self.file, self.action, stdout, elapsed)
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    warn!(
                        file = %self.file.display(),
                        code = ?output.status.code(),
                        "Compose command exited with failure"
                    );
                    self.failed(
                        InvocationFailure::Exit {
                            code: output.status.code(),
                            stderr,
                        },
                        stdout,
                        elapsed,
                    )
                }
            }
        }
    }

    fn failed(self, error: InvocationFailure, stdout: String, elapsed: Duration) -> ExecutionOutcome {
        ExecutionOutcome::failed(self.file, self.action, error, stdout, elapsed)
    }
}
