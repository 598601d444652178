//! 発見から実行までのパイプライン
//!
//! ルートディレクトリ → 発見 → 除外 → アクション解決 → 並列実行 → 集計

use crate::action::ActionTable;
use crate::discovery::discover_compose_files;
use crate::error::Result;
use crate::executor::Executor;
use crate::filter::{SkippedFile, filter_candidates};
use crate::ignore::IgnoreSet;
use crate::summary::{ExecutionOutcome, RunSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 発見・除外の結果
#[derive(Debug, Clone, Serialize)]
pub struct Scan {
    pub root: PathBuf,
    pub candidates: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// ルート配下を走査して実行対象を確定する
///
/// 走査・無視リストの読み込みに失敗した場合は途中結果を返さない。
#[tracing::instrument(skip(root), fields(root = %root.display()))]
pub fn scan(root: &Path) -> Result<Scan> {
    let ignore = IgnoreSet::load(root)?;
    let discovery = discover_compose_files(root)?;
    let mut filtered = filter_candidates(discovery.files, root, &ignore);

    filtered.skipped.extend(discovery.pruned);
    filtered.skipped.sort_by(|a, b| a.relative.cmp(&b.relative));

    info!(
        candidates = filtered.candidates.len(),
        skipped = filtered.skipped.len(),
        "Scan finished"
    );

    Ok(Scan {
        root: root.to_path_buf(),
        candidates: filtered.candidates,
        skipped: filtered.skipped,
    })
}

/// アクションを全対象ファイルに適用する
///
/// アクション名の解決は走査より先に行うため、不明なアクションでは
/// ファイルシステムにも外部コマンドにも触れない。
/// 除外されたファイルは集計結果の `skipped` に入る。
pub async fn run_action<F>(
    root: &Path,
    table: &ActionTable,
    action_name: &str,
    executor: &Executor,
    on_outcome: F,
) -> Result<RunSummary>
where
    F: FnMut(&ExecutionOutcome),
{
    let (action, template) = table.dispatch(action_name)?;
    let scan = scan(root)?;

    Ok(executor
        .run_with(scan.candidates, action, template, on_outcome)
        .await
        .with_skipped(scan.skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AhabError;
    use crate::filter::{SkipReason, relative_path};
    use crate::ignore::IGNORE_FILENAME;
    use std::fs;

    fn touch(base: &Path, rel: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "services: {}\n").unwrap();
    }

    #[test]
    fn test_scan_applies_all_exclusions() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        touch(root, "a/x.yml");
        touch(root, ".hidden/y.yaml");
        touch(root, "kube/z.yml");
        fs::write(root.join(IGNORE_FILENAME), "a/x.yml\n")?;

        let scan = scan(root)?;
        assert!(scan.candidates.is_empty());
        let skipped: Vec<(&str, &SkipReason)> = scan
            .skipped
            .iter()
            .map(|s| (s.relative.as_str(), &s.reason))
            .collect();
        assert_eq!(
            skipped,
            vec![
                (
                    ".hidden",
                    &SkipReason::HiddenDirectory(".hidden".to_string())
                ),
                ("a/x.yml", &SkipReason::Ignored),
                ("kube", &SkipReason::ReservedDirectory("kube".to_string())),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_scan_keeps_unlisted_files() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        touch(root, "media/compose.yml");
        touch(root, "proxy/compose.yml");
        touch(root, "paused/compose.yaml");
        fs::write(
            root.join(IGNORE_FILENAME),
            "# 停止中\npaused/compose.yaml\n",
        )?;

        let scan = scan(root)?;
        let relatives: Vec<String> = scan
            .candidates
            .iter()
            .map(|p| relative_path(root, p))
            .collect();

        assert_eq!(relatives, vec!["media/compose.yml", "proxy/compose.yml"]);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].relative, "paused/compose.yaml");

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_action_fails_before_anything_runs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(root, "media/compose.yml");

        let table = ActionTable::new(
            &[root.join("must-not-run").display().to_string()],
            Default::default(),
        );
        let mut observed = 0;

        let result = run_action(root, &table, "explode", &Executor::default(), |_| {
            observed += 1
        })
        .await;

        assert!(matches!(result, Err(AhabError::UnknownAction(_))));
        assert_eq!(observed, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_ignored_stack_is_not_reachable_through_symlink() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        touch(root, "real/compose.yml");
        touch(root, "other/compose.yml");
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();
        fs::write(root.join(IGNORE_FILENAME), "real/compose.yml\n")?;

        let scan = scan(root)?;
        let candidates: Vec<String> = scan
            .candidates
            .iter()
            .map(|p| relative_path(root, p))
            .collect();
        let skipped: Vec<&str> = scan.skipped.iter().map(|s| s.relative.as_str()).collect();

        assert_eq!(candidates, vec!["other/compose.yml"]);
        assert_eq!(skipped, vec!["alias/compose.yml", "real/compose.yml"]);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_visible_link_into_hidden_directory_is_kept() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        touch(root, ".shared/compose.yml");
        std::os::unix::fs::symlink(root.join(".shared"), root.join("app")).unwrap();

        let scan = scan(root)?;
        let candidates: Vec<String> = scan
            .candidates
            .iter()
            .map(|p| relative_path(root, p))
            .collect();

        assert_eq!(candidates, vec!["app/compose.yml"]);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].relative, ".shared");

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_stack_runs_once() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        touch(root, "real/compose.yml");
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let scan = scan(root)?;
        assert_eq!(scan.candidates.len(), 1);
        assert!(scan.skipped.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_run_summary_carries_skipped_files() -> Result<()> {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(root, "kube/deployment.yml");
        touch(root, "paused/compose.yml");
        fs::write(root.join(IGNORE_FILENAME), "paused/compose.yml\n")?;

        let summary = run_action(
            root,
            &ActionTable::default(),
            "stop",
            &Executor::default(),
            |_| {},
        )
        .await?;

        assert!(summary.is_noop());
        let skipped: Vec<&str> = summary.skipped.iter().map(|s| s.relative.as_str()).collect();
        assert_eq!(skipped, vec!["kube", "paused/compose.yml"]);

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_discovery_error_aborts_before_running() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(root, "media/compose.yml");
        let locked = root.join("media/locked");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root 権限では読めてしまうため検証できない
        let readable = fs::read_dir(&locked).is_ok();
        let table = ActionTable::new(
            &[root.join("must-not-run").display().to_string()],
            Default::default(),
        );
        let mut observed = 0;
        let result = run_action(root, &table, "start", &Executor::default(), |_| {
            observed += 1
        })
        .await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert!(matches!(result, Err(AhabError::Discovery { .. })));
        assert_eq!(observed, 0);
    }
}
