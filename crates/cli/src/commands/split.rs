//! `catalogist split`: Split an annotated catalog into module views.

use catalogist_agent::classify_and_split;
use catalogist_core::catalog::Forest;
use std::path::PathBuf;

use super::{load_config, read_json, write_views};

pub async fn run(input: PathBuf, output_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => load_config()?.output.dir,
    };

    let value = read_json(&input).await?;
    let forest: Forest = serde_json::from_value(value)
        .map_err(|e| format!("{} is not a catalog: {e}", input.display()))?;

    println!("Splitting {} top-level nodes:", forest.len());
    write_views(&output_dir, &classify_and_split(&forest)).await?;

    Ok(())
}
