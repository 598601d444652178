//! compose ファイルの自動発見
//!
//! ルートディレクトリ配下を再帰的に走査し、`.yml` / `.yaml` ファイルを列挙します。
//! 隠しディレクトリ・予約ディレクトリには降りずに、ディレクトリ単位で除外として報告します。
//! 無視リストの適用と重複の除去は [`crate::filter`] が担当します。

use crate::error::{AhabError, Result};
use crate::filter::{SkippedFile, excluded_dir_reason, relative_path};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// compose ファイルとして扱う拡張子
pub const COMPOSE_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// 発見された compose ファイル
///
/// シンボリックリンク経由の場合、`path` は辿った経路、`canonical` は実体のパス。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub canonical: PathBuf,
    /// 実体がルート配下にある場合の、正規化ルートからの相対パス
    pub canonical_relative: Option<String>,
}

/// 走査で得られる項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    File(DiscoveredFile),
    /// 走査せずに除外したディレクトリ
    Pruned(SkippedFile),
}

/// ルート配下の compose ファイルを遅延列挙するイテレータ
///
/// シンボリックリンクを辿るが、ループは検出してスキップする。
/// 同じファイルに複数の経路で到達した場合は経路ごとに返す。
pub struct ComposeFiles {
    root: PathBuf,
    canonical_root: PathBuf,
    walker: walkdir::IntoIter,
}

impl ComposeFiles {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            canonical_root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            walker: WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter(),
        }
    }
}

impl Iterator for ComposeFiles {
    type Item = Result<Discovered>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(
                            dir = ?err.path(),
                            ancestor = %ancestor.display(),
                            "Symlink loop detected, skipping"
                        );
                        continue;
                    }
                    if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
                    {
                        warn!(path = ?err.path(), "Entry vanished or dangling symlink, skipping");
                        continue;
                    }
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(AhabError::Discovery {
                        path,
                        message: err.to_string(),
                    }));
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() == 0 {
                    continue;
                }
                let name = entry.file_name().to_string_lossy();
                if let Some(reason) = excluded_dir_reason(&name) {
                    // 除外対象の配下には降りない（読めないディレクトリがあっても走査を止めない）
                    self.walker.skip_current_dir();
                    let relative = relative_path(&self.root, entry.path());
                    debug!(dir = %relative, "Pruning excluded directory");
                    return Some(Ok(Discovered::Pruned(SkippedFile {
                        path: entry.into_path(),
                        relative,
                        reason,
                    })));
                }
                continue;
            }

            if !entry.file_type().is_file() || !is_compose_file(entry.path()) {
                continue;
            }

            let canonical = match entry.path().canonicalize() {
                Ok(p) => p,
                Err(e) => {
                    return Some(Err(AhabError::Discovery {
                        path: entry.path().to_path_buf(),
                        message: format!("パスの正規化に失敗: {}", e),
                    }));
                }
            };
            let canonical_relative = canonical
                .starts_with(&self.canonical_root)
                .then(|| relative_path(&self.canonical_root, &canonical));

            return Some(Ok(Discovered::File(DiscoveredFile {
                path: entry.into_path(),
                canonical,
                canonical_relative,
            })));
        }
    }
}

/// ファイル名が compose ファイルの拡張子を持つか
pub fn is_compose_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| COMPOSE_EXTENSIONS.contains(&ext))
}

/// 走査結果
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    /// 走査せずに除外したディレクトリ
    pub pruned: Vec<SkippedFile>,
}

/// ルート配下の compose ファイルをすべて発見
///
/// 走査中にエラーが発生した場合、途中までの結果は破棄してエラーを返す。
#[tracing::instrument(skip(root), fields(root = %root.display()))]
pub fn discover_compose_files(root: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    for item in ComposeFiles::new(root) {
        match item? {
            Discovered::File(file) => discovery.files.push(file),
            Discovered::Pruned(skipped) => discovery.pruned.push(skipped),
        }
    }
    debug!(
        file_count = discovery.files.len(),
        pruned = discovery.pruned.len(),
        "Discovered compose files"
    );
    Ok(discovery)
}
