//! 除外フィルタ
//!
//! 隠しディレクトリ・予約ディレクトリ配下のファイルと、`.ahabignore` に
//! 列挙されたファイルを実行対象から取り除きます。

use crate::discovery::DiscoveredFile;
use crate::ignore::IgnoreSet;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// compose 以外のマニフェストを置く予約ディレクトリ名
pub const RESERVED_DIRS: &[&str] = &["kube"];

/// 除外理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// `.` で始まるディレクトリ配下
    HiddenDirectory(String),
    /// 予約ディレクトリ配下
    ReservedDirectory(String),
    /// `.ahabignore` に記載されている
    Ignored,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::HiddenDirectory(dir) => write!(f, "隠しディレクトリ {} 配下", dir),
            SkipReason::ReservedDirectory(dir) => write!(f, "予約ディレクトリ {} 配下", dir),
            SkipReason::Ignored => write!(f, ".ahabignore で除外"),
        }
    }
}

/// 除外されたファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    /// ルートからの相対パス（`/` 区切り）
    pub relative: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// フィルタ適用結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct Filtered {
    pub candidates: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// ルートからの相対パスを `/` 区切りの文字列にする
///
/// ルート配下にないパスはそのまま文字列化する。
/// UTF-8 でない要素は置換文字に変換されるため、無視リストとは一致しない。
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_str().map(Cow::Borrowed).unwrap_or_else(|| {
                warn!(path = ?path, "Path is not valid UTF-8, ignore entries cannot match it");
                s.to_string_lossy()
            })),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// ディレクトリ名が除外対象か
pub fn excluded_dir_reason(name: &str) -> Option<SkipReason> {
    if name.starts_with('.') {
        return Some(SkipReason::HiddenDirectory(name.to_string()));
    }
    if RESERVED_DIRS.contains(&name) {
        return Some(SkipReason::ReservedDirectory(name.to_string()));
    }
    None
}

/// 1ファイルに対する除外判定
///
/// 構造的な除外（隠し・予約ディレクトリ）を先に評価し、その後に無視リストを見る。
/// ファイル名自体は構造的な除外の対象外。
pub fn skip_reason(relative: &str, ignore: &IgnoreSet) -> Option<SkipReason> {
    let mut segments: Vec<&str> = relative.split('/').collect();
    segments.pop();

    if let Some(reason) = segments.into_iter().find_map(excluded_dir_reason) {
        return Some(reason);
    }

    if ignore.contains(relative) {
        return Some(SkipReason::Ignored);
    }

    None
}

/// 発見されたファイル列に除外ルールを適用
///
/// 無視リストはファイルの実体に対して効く。どの経路、または実体の相対パスが
/// 記載されていても、そのファイルに到達する全経路を除外する。
/// 隠し・予約ディレクトリは経路ごとに判定し、残った経路のうち最初のものだけを
/// 実行対象にする。順序は保持する。
pub fn filter_candidates<I>(files: I, root: &Path, ignore: &IgnoreSet) -> Filtered
where
    I: IntoIterator<Item = DiscoveredFile>,
{
    let files: Vec<(String, DiscoveredFile)> = files
        .into_iter()
        .map(|file| (relative_path(root, &file.path), file))
        .collect();

    let ignored: HashSet<PathBuf> = files
        .iter()
        .filter(|(relative, file)| {
            ignore.contains(relative)
                || file
                    .canonical_relative
                    .as_deref()
                    .is_some_and(|r| ignore.contains(r))
        })
        .map(|(_, file)| file.canonical.clone())
        .collect();

    let mut seen = HashSet::new();
    let mut filtered = Filtered::default();

    for (relative, file) in files {
        let reason = skip_reason(&relative, ignore)
            .or_else(|| ignored.contains(&file.canonical).then_some(SkipReason::Ignored));
        match reason {
            Some(reason) => {
                info!(file = %relative, reason = %reason, "Skipping compose file");
                filtered.skipped.push(SkippedFile {
                    path: file.path,
                    relative,
                    reason,
                });
            }
            None => {
                if seen.insert(file.canonical) {
                    filtered.candidates.push(file.path);
                } else {
                    debug!(file = %relative, "Already selected via another path");
                }
            }
        }
    }

    filtered
}
