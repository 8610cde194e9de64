//! `catalogist doctor`: Diagnose configuration and templates.

use catalogist_config::AppConfig;
use catalogist_core::catalog::{ModuleType, count_nodes};
use catalogist_core::provider::Provider;
use catalogist_tools::TemplateLibrary;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Catalogist Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `catalogist init` to create one)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid");
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  Fix the config file before running other checks.");
            return Ok(());
        }
    };

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set CATALOGIST_API_KEY or add api_key to config.toml");
        issues += 1;
    }
    println!("  ✅ Backend: {} (model {})", config.api_url, config.default_model);

    // Check backend reachability
    let provider = catalogist_providers::build_from_config(&config);
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Backend reachable"),
        Ok(false) => {
            println!("  ⚠️  Backend reachable but refused the request (check api_key and api_url)");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Backend unreachable: {e}");
            issues += 1;
        }
    }

    // Check templates
    let templates_path = config.compensation.templates_path.as_deref();
    match TemplateLibrary::load(templates_path) {
        Ok(library) => {
            let source = templates_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            println!("  ✅ Template library loaded ({source})");
            for module in ModuleType::ALL {
                let template = library.get(module);
                println!(
                    "       {:<10} {} ({} nodes)",
                    module.as_str(),
                    template.node.name,
                    count_nodes(std::slice::from_ref(&template.node))
                );
            }
        }
        Err(e) => {
            println!("  ❌ Template library unusable: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
