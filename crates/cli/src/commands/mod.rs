pub mod compensate;
pub mod doctor;
pub mod init;
pub mod link;
pub mod split;
pub mod template;
pub mod validate;

use catalogist_agent::CatalogViews;
use catalogist_config::AppConfig;
use catalogist_core::catalog::{ModuleType, count_nodes};
use catalogist_tools::TemplateLibrary;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const COMPENSATED_FILE: &str = "format_framework_compensated.json";

/// File name of a module view.
pub fn view_file(module: ModuleType) -> String {
    format!("{}_framework.json", module.as_str())
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The command-line library if given, else the configured one, else the built-in.
pub fn load_library(
    config: &AppConfig,
    templates: Option<PathBuf>,
) -> Result<Arc<TemplateLibrary>, Box<dyn std::error::Error>> {
    let path = templates.or_else(|| config.compensation.templates_path.clone());
    Ok(Arc::new(TemplateLibrary::load(path.as_deref())?))
}

pub async fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content).map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?)
}

/// Pretty-printed UTF-8 JSON, parent directories created as needed.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Write the three views into `dir` and print where they went.
pub async fn write_views(dir: &Path, views: &CatalogViews) -> Result<(), Box<dyn std::error::Error>> {
    for module in ModuleType::ALL {
        let view = views.get(module);
        let path = dir.join(view_file(module));
        write_json(&path, view).await?;
        println!(
            "  {:<10} {:>3} nodes -> {}",
            module.as_str(),
            count_nodes(view),
            path.display()
        );
    }
    Ok(())
}
