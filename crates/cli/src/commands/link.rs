//! `catalogist link`: Link catalog leaves to a template library.

use catalogist_agent::{LinkTemplate, TemplateLinker, Transcript};
use catalogist_core::catalog::Forest;
use std::path::PathBuf;

use super::{load_config, read_json, write_json};

pub async fn run(catalog: PathBuf, templates: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    let mut forest: Forest = serde_json::from_value(read_json(&catalog).await?)
        .map_err(|e| format!("{} is not a catalog: {e}", catalog.display()))?;
    let library: Vec<LinkTemplate> = serde_json::from_value(read_json(&templates).await?)
        .map_err(|e| format!("{} is not a template list: {e}", templates.display()))?;

    if !library.is_empty() && !config.has_api_key() {
        return Err("No API key configured. Set CATALOGIST_API_KEY or run `catalogist init`.".into());
    }

    let provider = catalogist_providers::build_from_config(&config);
    let linker = TemplateLinker::new(provider, &config.default_model);
    let report = linker.link(&mut forest, &library, &Transcript::none()).await?;

    write_json(&output, &forest).await?;

    println!("  Leaves visited:       {}", report.leaves_visited);
    println!("  Leaves linked:        {}", report.leaves_linked);
    println!("  Templates unassigned: {}", report.templates_remaining);
    println!("  Output:               {}", output.display());

    Ok(())
}
