//! ルートディレクトリの解決
//!
//! compose ファイルを探索する起点ディレクトリを決定し、存在を検証します。

use crate::error::{AhabError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// ルートディレクトリを指定する環境変数
pub const ROOT_DIR_ENV: &str = "DOCKER_DIR";

/// ルートディレクトリを解決
///
/// 以下の優先順位で決定:
/// 1. 明示的な指定 (`--dir`)
/// 2. 環境変数 DOCKER_DIR（空文字は未設定扱い）
/// 3. 設定ファイルの `docker_dir`（`~/` はホームディレクトリに展開）
///
/// 返すパスは正規化済みの絶対パス。
#[tracing::instrument(skip_all)]
pub fn resolve_root_dir(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
    let candidate = if let Some(path) = explicit {
        debug!(root = %path.display(), "Using explicit root directory");
        path.to_path_buf()
    } else if let Some(env_root) = std::env::var_os(ROOT_DIR_ENV).filter(|v| !v.is_empty()) {
        debug!(env_root = ?env_root, "Using DOCKER_DIR");
        PathBuf::from(env_root)
    } else if let Some(path) = configured {
        debug!(root = %path.display(), "Using docker_dir from config file");
        expand_home(path)?
    } else {
        return Err(AhabError::Configuration(format!(
            "ルートディレクトリが設定されていません\n\
             ヒント: --dir オプション、{} 環境変数、または設定ファイルの docker_dir で指定してください",
            ROOT_DIR_ENV
        )));
    };

    validate_root_dir(&candidate)
}

/// ディレクトリの存在を確認して正規化する
pub fn validate_root_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(AhabError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(AhabError::NotADirectory(path.to_path_buf()));
    }

    let root = path.canonicalize()?;
    info!(root = %root.display(), "Resolved root directory");
    Ok(root)
}

/// 先頭の `~/` をホームディレクトリに展開
fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };

    let home = dirs::home_dir().ok_or_else(|| {
        AhabError::Configuration("ホームディレクトリが見つかりません".to_string())
    })?;
    Ok(home.join(rest))
}
