//! `catalogist validate`: Check a catalog file for structural errors.

use catalogist_agent::validator;
use std::path::PathBuf;

use super::read_json;

pub async fn run(input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_json(&input).await?;
    let errors = validator::validate(&value);

    if errors.is_empty() {
        println!("  ✅ {} is a valid catalog", input.display());
        return Ok(());
    }

    println!("  ❌ {} has {} problem(s):", input.display(), errors.len());
    for error in &errors {
        println!("     - {error}");
    }
    Err(format!("{} validation error(s)", errors.len()).into())
}
