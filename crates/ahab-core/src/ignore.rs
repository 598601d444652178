//! `.ahabignore` の読み込み
//!
//! ルート直下の `.ahabignore` に列挙されたパス（ルートからの相対パス）を
//! 実行対象から除外します。マッチは完全一致のみ。

use crate::error::{AhabError, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// 無視リストのファイル名
pub const IGNORE_FILENAME: &str = ".ahabignore";

/// 無視対象の相対パス集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    entries: BTreeSet<String>,
}

impl IgnoreSet {
    /// ルート直下の `.ahabignore` を読み込む
    ///
    /// ファイルが存在しない場合は空の集合を返す。
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(IGNORE_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "No ignore file");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AhabError::IgnoreFile {
                    path,
                    message: e.to_string(),
                });
            }
        };

        let set = Self::parse(&content);
        debug!(file = %path.display(), entries = set.len(), "Loaded ignore file");
        Ok(set)
    }

    /// 無視リストの内容をパース
    ///
    /// 各行はトリムされ、空行と `#` で始まる行は読み飛ばす。
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.entries.contains(relative)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl FromIterator<String> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
