use crate::output;
use ahab_core::{ActionTable, Executor, RunSummary};
use colored::Colorize;
use std::path::Path;

pub async fn handle(
    root: &Path,
    table: &ActionTable,
    action_name: &str,
    executor: &Executor,
    json: bool,
) -> anyhow::Result<RunSummary> {
    if !json {
        println!(
            "{}",
            format!("{} を実行中... (同時実行数: {})", action_name, executor.max_parallel())
                .yellow()
        );
        println!("ルート: {}", root.display().to_string().cyan());
        println!();
    }

    let summary = ahab_core::run_action(root, table, action_name, executor, |outcome| {
        if !json {
            output::print_outcome(root, outcome);
        }
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_summary(root, &summary);
    }

    Ok(summary)
}
