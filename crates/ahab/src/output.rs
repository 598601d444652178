//! ターミナル出力

use ahab_core::filter::relative_path;
use ahab_core::{ExecutionOutcome, RunSummary, Scan, SkippedFile};
use colored::Colorize;
use std::path::Path;

/// 1 ファイル分の完了を表示
pub fn print_outcome(root: &Path, outcome: &ExecutionOutcome) {
    let name = relative_path(root, &outcome.file);
    let elapsed = format!("({:.1}s)", outcome.elapsed.as_secs_f64()).dimmed();

    match &outcome.error {
        None => println!("  {} {} {}", "✓".green(), name, elapsed),
        Some(error) => println!(
            "  {} {} {} {}",
            "✗".red(),
            name,
            elapsed,
            error.to_string().lines().next().unwrap_or_default().red()
        ),
    }
}

/// 集計結果を表示
pub fn print_summary(root: &Path, summary: &RunSummary) {
    if !summary.skipped.is_empty() {
        println!();
        print_skipped(&summary.skipped);
    }
    println!();

    if summary.is_noop() {
        println!("{}", "ℹ 対象の compose ファイルがありません".dimmed());
        return;
    }

    if summary.is_success() {
        println!(
            "{}",
            format!(
                "✓ {} 件すべての{}が完了しました",
                summary.total,
                summary.action.progressive()
            )
            .green()
            .bold()
        );
        return;
    }

    println!(
        "{}",
        format!(
            "✗ {}: {} 件中 {} 件が失敗しました（成功 {} 件）",
            summary.action.progressive(),
            summary.total,
            summary.failed,
            summary.succeeded
        )
        .red()
        .bold()
    );

    for failure in &summary.failures {
        println!();
        println!("  • {}", relative_path(root, &failure.file).cyan());
        if let Some(error) = &failure.error {
            for line in error.to_string().lines() {
                println!("    {}", line);
            }
        }
    }
}

/// 走査結果を表示
pub fn print_scan(scan: &Scan) {
    println!("ルート: {}", scan.root.display().to_string().cyan());
    println!();

    println!(
        "{}",
        format!("実行対象 ({} 件):", scan.candidates.len()).bold()
    );
    if scan.candidates.is_empty() {
        println!("  {}", "(なし)".dimmed());
    }
    for file in &scan.candidates {
        println!("  • {}", relative_path(&scan.root, file));
    }

    if !scan.skipped.is_empty() {
        println!();
        print_skipped(&scan.skipped);
    }
}

fn print_skipped(skipped: &[SkippedFile]) {
    println!("{}", format!("除外 ({} 件):", skipped.len()).bold());
    for file in skipped {
        println!(
            "  • {} {}",
            file.relative.dimmed(),
            format!("[{}]", file.reason).yellow()
        );
    }
}
