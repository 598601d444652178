use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AhabError {
    #[error("設定エラー: {0}")]
    Configuration(String),

    #[error("ルートディレクトリが存在しません: {0}")]
    PathNotFound(PathBuf),

    #[error("ルートディレクトリがディレクトリではありません: {0}")]
    NotADirectory(PathBuf),

    #[error("ファイル発見エラー: {path}\n理由: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error("無視リストの読み込みに失敗しました: {path}\n理由: {message}")]
    IgnoreFile { path: PathBuf, message: String },

    #[error("不明なアクション: {0}\n利用可能なアクション: start, update, stop, restart")]
    UnknownAction(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AhabError>;
