use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// compose コマンドの代わりに呼ばれるスタブ
///
/// 引数を 1 行ずつログに追記し、`fail` で終わるディレクトリ配下のファイルでは失敗する。
const STUB_SCRIPT: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$2" in
  *fail/*) echo "boom: $2" >&2; exit 3 ;;
esac
echo "ok"
"#;

pub struct TestFleet {
    pub root: TempDir,
    pub home: TempDir,
}

impl TestFleet {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join("config.yaml"), "").unwrap();
        fs::write(home.path().join("stub.sh"), STUB_SCRIPT).unwrap();
        Self { root, home }
    }

    pub fn write_compose(&self, relative: &str) {
        let path = self.root.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "services:\n  app:\n    image: nginx\n").unwrap();
    }

    #[allow(dead_code)]
    pub fn write_ignore(&self, content: &str) {
        fs::write(self.root.path().join(".ahabignore"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// 空の設定ファイル（ユーザー設定の影響を受けないようにする）
    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("config.yaml")
    }

    #[allow(dead_code)]
    pub fn stub_command(&self) -> String {
        format!("sh {}", self.home.path().join("stub.sh").display())
    }

    /// スタブが受け取った引数（1 呼び出し 1 行、ソート済み）
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        let log = self.home.path().join("calls.log");
        let mut calls: Vec<String> = fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(|line| relativize(line, self.root.path()))
            .collect();
        calls.sort();
        calls
    }
}

fn relativize(line: &str, root: &Path) -> String {
    let root = root.canonicalize().unwrap();
    line.replace(&format!("{}/", root.display()), "")
}
