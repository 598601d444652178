//! 実行結果の集計

use crate::action::Action;
use crate::filter::SkippedFile;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// ファイル単位の実行失敗
///
/// 集計に記録されるだけで、呼び出し元へは伝播しない。
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationFailure {
    #[error("コマンドの起動に失敗しました: {message}")]
    Spawn { message: String },

    #[error("終了コード {}: {stderr}", .code.map_or_else(|| "不明".to_string(), |c| c.to_string()))]
    Exit { code: Option<i32>, stderr: String },

    #[error("{}秒でタイムアウトしました", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("中断されました")]
    Cancelled,

    #[error("実行タスクが異常終了しました: {message}")]
    Panicked { message: String },
}

/// 1ファイル分の実行結果
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub file: PathBuf,
    pub action: Action,
    pub success: bool,
    pub error: Option<InvocationFailure>,
    /// 取得した標準出力
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    pub fn succeeded(file: PathBuf, action: Action, stdout: String, elapsed: Duration) -> Self {
        Self {
            file,
            action,
            success: true,
            error: None,
            stdout,
            elapsed,
        }
    }

    pub fn failed(
        file: PathBuf,
        action: Action,
        error: InvocationFailure,
        stdout: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            file,
            action,
            success: false,
            error: Some(error),
            stdout,
            elapsed,
        }
    }
}

/// 1回の実行の集計結果
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub action: Action,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ExecutionOutcome>,
    /// 実行対象から除外されたファイル・ディレクトリ
    pub skipped: Vec<SkippedFile>,
}

impl RunSummary {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            total: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// 結果を1件記録する（到着順は問わない）
    pub fn record(&mut self, outcome: ExecutionOutcome) {
        self.total += 1;
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(outcome);
        }
    }

    /// 全件記録後に呼ぶ。失敗一覧をパス順に並べる。
    pub fn finalize(mut self) -> Self {
        self.failures.sort_by(|a, b| a.file.cmp(&b.file));
        self
    }

    /// 除外されたファイルを添付する
    pub fn with_skipped(mut self, skipped: Vec<SkippedFile>) -> Self {
        self.skipped = skipped;
        self
    }

    /// 対象ファイルがなかった
    pub fn is_noop(&self) -> bool {
        self.total == 0
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl Extend<ExecutionOutcome> for RunSummary {
    fn extend<I: IntoIterator<Item = ExecutionOutcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}
