//! ahab core
//!
//! ルートディレクトリ配下の compose ファイルを発見し、除外ルールを適用したうえで、
//! ファイルごとに compose コマンドを並列実行して結果を集計します。

pub mod action;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod filter;
pub mod ignore;
pub mod resolver;
pub mod runner;
pub mod summary;

pub use action::{Action, ActionTable, CommandTemplate, DEFAULT_COMPOSE_COMMAND, StopMode};
pub use discovery::{ComposeFiles, Discovered, DiscoveredFile, Discovery, discover_compose_files};
pub use error::{AhabError, Result};
pub use executor::{DEFAULT_MAX_PARALLEL, Executor};
pub use filter::{Filtered, RESERVED_DIRS, SkipReason, SkippedFile, filter_candidates};
pub use ignore::{IGNORE_FILENAME, IgnoreSet};
pub use resolver::{ROOT_DIR_ENV, resolve_root_dir};
pub use runner::{Scan, run_action, scan};
pub use summary::{ExecutionOutcome, InvocationFailure, RunSummary};

pub use tokio_util::sync::CancellationToken;
