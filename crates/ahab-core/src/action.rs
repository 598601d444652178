//! アクションとコマンドテンプレート
//!
//! 論理アクション (start / update / stop / restart) を compose コマンドの
//! 引数ベクタに対応付けます。テーブルは起動時に一度だけ構築して引き回します。

use crate::error::{AhabError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::str::FromStr;

/// デフォルトの compose コマンド
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker-compose";

/// compose ファイルに適用するライフサイクル操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Update,
    Stop,
    Restart,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Start, Action::Update, Action::Stop, Action::Restart];

    pub fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Update => "update",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }

    /// 進行形の表示名（ログ・進捗表示用）
    pub fn progressive(self) -> &'static str {
        match self {
            Action::Start => "起動",
            Action::Update => "更新",
            Action::Stop => "停止",
            Action::Restart => "再起動",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = AhabError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| AhabError::UnknownAction(s.to_string()))
    }
}

/// stop アクションの意味
///
/// `Stop` はコンテナを残したまま停止、`Down` はコンテナ・ネットワークまで削除する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    #[default]
    Stop,
    Down,
}

/// テンプレート引数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArg {
    Literal(String),
    /// 対象の compose ファイルパスに置き換わる
    File,
}

/// 外部コマンドのテンプレート（実行ファイル + 引数ベクタ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<TemplateArg>,
}

impl CommandTemplate {
    /// 対象ファイルを埋め込んだ引数ベクタを生成
    ///
    /// シェルを経由しないため、空白を含むパスもそのまま 1 引数として渡る。
    pub fn render(&self, file: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg {
                TemplateArg::Literal(s) => OsString::from(s),
                TemplateArg::File => file.as_os_str().to_os_string(),
            })
            .collect()
    }

    /// 表示用のコマンドライン
    pub fn display(&self, file: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(
            self.render(file)
                .iter()
                .map(|a| a.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// アクション名からコマンドテンプレートへの対応表
#[derive(Debug, Clone)]
pub struct ActionTable {
    templates: HashMap<Action, CommandTemplate>,
}

impl ActionTable {
    /// 対応表を構築
    ///
    /// `compose_command` の先頭要素が実行ファイル、残りは前置引数
    /// （例: `["docker", "compose"]`）。空の場合は `docker-compose` を使う。
    pub fn new(compose_command: &[String], stop_mode: StopMode) -> Self {
        let (program, prefix) = match compose_command.split_first() {
            Some((program, prefix)) => (program.clone(), prefix.to_vec()),
            None => (DEFAULT_COMPOSE_COMMAND.to_string(), Vec::new()),
        };

        let stop_args: &[&str] = match stop_mode {
            StopMode::Stop => &["stop"],
            StopMode::Down => &["down"],
        };

        let templates = Action::ALL
            .into_iter()
            .map(|action| {
                let subcommand: &[&str] = match action {
                    Action::Start => &["up", "-d"],
                    Action::Update => &["pull"],
                    Action::Stop => stop_args,
                    Action::Restart => &["restart"],
                };

                let mut args: Vec<TemplateArg> =
                    prefix.iter().cloned().map(TemplateArg::Literal).collect();
                args.push(TemplateArg::Literal("-f".to_string()));
                args.push(TemplateArg::File);
                args.extend(subcommand.iter().map(|s| TemplateArg::Literal(s.to_string())));

                (
                    action,
                    CommandTemplate {
                        program: program.clone(),
                        args,
                    },
                )
            })
            .collect();

        Self { templates }
    }

    /// アクション名を解決
    pub fn dispatch(&self, name: &str) -> Result<(Action, &CommandTemplate)> {
        let action: Action = name.parse()?;
        Ok((action, self.get(action)))
    }

    pub fn get(&self, action: Action) -> &CommandTemplate {
        // new() で全アクション分を登録済み
        &self.templates[&action]
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new(&[], StopMode::default())
    }
}
