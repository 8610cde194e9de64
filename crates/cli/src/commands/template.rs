//! `catalogist template`: Print a default module template.

use catalogist_tools::DefaultTemplateProvider;
use catalogist_tools::templates::error_json;
use std::path::PathBuf;

use super::{load_config, load_library};

pub async fn run(module_type: String, templates: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let provider = DefaultTemplateProvider::new(load_library(&config, templates)?);

    match provider.get_default_template(&module_type) {
        Ok(template) => {
            println!("{}", serde_json::to_string_pretty(&template.to_json())?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            Err(e.into())
        }
    }
}
