//! `catalogist compensate`: Complete an extracted catalog and split it.

use catalogist_agent::{CompensationOrchestrator, Transcript, classify_and_split};
use std::path::PathBuf;

use super::{COMPENSATED_FILE, load_config, load_library, read_json, write_json, write_views};

pub async fn run(
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    templates: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let library = load_library(&config, templates)?;
    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());

    // An unreadable extraction counts as no extraction
    let extraction = match &input {
        Some(path) => match read_json(path).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        },
        None => None,
    };

    let mut transcript = Transcript::none();
    if let Some(path) = &log_file {
        transcript = transcript
            .with_file(path)
            .map_err(|e| format!("Failed to open log file {}: {e}", path.display()))?;
    }

    if extraction.is_some() && !config.has_api_key() {
        tracing::warn!("No API key configured, backend calls will likely fail. Run `catalogist doctor`.");
    }

    let provider = catalogist_providers::build_from_config(&config);
    let orchestrator = CompensationOrchestrator::from_config(&config, provider, library);
    let result = orchestrator.run(extraction.as_ref(), &transcript).await?;

    let compensated_path = output_dir.join(COMPENSATED_FILE);
    write_json(&compensated_path, &result.compensated_structure).await?;

    let views = classify_and_split(&result.compensated_structure);

    println!();
    println!("  Catalog compensation");
    println!("  ====================");
    println!("  Source:      {}", result.source);
    println!(
        "  Complete:    {}",
        if result.complete { "yes" } else { "no (iteration cap reached)" }
    );
    println!("  Iterations:  {}", result.iterations);
    for line in &result.log {
        println!("    - {line}");
    }
    println!();
    println!("  compensated    -> {}", compensated_path.display());
    write_views(&output_dir, &views).await?;
    if let Some(path) = &log_file {
        println!("  transcript     -> {}", path.display());
    }
    println!();

    Ok(())
}
