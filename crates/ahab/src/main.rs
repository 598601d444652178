mod commands;
mod output;

use ahab_config::AhabConfig;
use ahab_core::{
    ActionTable, DEFAULT_COMPOSE_COMMAND, DEFAULT_MAX_PARALLEL, Executor, StopMode,
    resolve_root_dir,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ahab")]
#[command(about = "ディレクトリ配下の docker-compose ファイルをまとめて操作する", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// compose ファイルを探索するルートディレクトリ（未指定時は DOCKER_DIR 環境変数）
    #[arg(short = 'd', long = "dir", global = true)]
    dir: Option<PathBuf>,

    /// compose コマンド（例: "docker compose"）
    #[arg(long, env = "AHAB_COMPOSE", global = true)]
    compose: Option<String>,

    /// 同時実行数
    #[arg(short = 'j', long, env = "AHAB_MAX_PARALLEL", global = true)]
    max_parallel: Option<usize>,

    /// 1 ファイルあたりのタイムアウト（秒）
    #[arg(long, env = "AHAB_TIMEOUT", value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 全 compose ファイルを起動 (up -d)
    Start {
        /// 集計結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 全 compose ファイルのイメージを更新 (pull)
    Update {
        /// 集計結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 全 compose ファイルを停止
    Stop {
        /// コンテナを削除する (down)。デフォルトは停止のみ
        #[arg(long)]
        down: bool,
        /// 集計結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 全 compose ファイルを再起動
    Restart {
        /// 集計結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 実行対象と除外されたファイルを表示（実行はしない）
    List {
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("ahab {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AhabConfig::load().context("設定ファイルの読み込みに失敗しました")?;
    let root = resolve_root_dir(cli.dir.as_deref(), config.docker_dir.as_deref())?;

    let (action_name, json, stop_down) = match cli.command {
        Commands::List { json } => {
            commands::list::handle(&root, json)?;
            return Ok(());
        }
        Commands::Version => unreachable!("Version is handled before config loading"),
        Commands::Start { json } => ("start", json, false),
        Commands::Update { json } => ("update", json, false),
        Commands::Stop { down, json } => ("stop", json, down),
        Commands::Restart { json } => ("restart", json, false),
    };

    let compose_command = cli
        .compose
        .as_deref()
        .map(|line| {
            line.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|args| !args.is_empty())
        .or_else(|| config.compose_args())
        .unwrap_or_else(|| vec![DEFAULT_COMPOSE_COMMAND.to_string()]);
    let stop_mode = if stop_down {
        StopMode::Down
    } else {
        config.stop_mode
    };
    let table = ActionTable::new(&compose_command, stop_mode);

    let timeout = cli
        .timeout
        .or(config.timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let executor = Executor::new(
        cli.max_parallel
            .or(config.max_parallel)
            .unwrap_or(DEFAULT_MAX_PARALLEL),
    )
    .with_timeout(timeout);
    tracing::debug!(
        compose = ?compose_command,
        ?stop_mode,
        max_parallel = executor.max_parallel(),
        ?timeout,
        "Merged settings"
    );

    // Ctrl-C で実行中・待機中の呼び出しを中断
    let cancel = executor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "中断しています...".yellow());
            cancel.cancel();
        }
    });

    let summary = commands::run::handle(&root, &table, action_name, &executor, json).await?;
    if !summary.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
