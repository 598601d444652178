use crate::output;

pub fn handle(root: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let scan = ahab_core::scan(root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scan)?);
    } else {
        output::print_scan(&scan);
    }

    Ok(())
}
