//! Default template library and provider.
//!
//! The library is read once at startup, either from the built-in asset or a
//! user-supplied JSON file keyed `"<module_type>_template"`, and then shared
//! read-only behind an `Arc`.

use catalogist_core::catalog::{CatalogNode, ModuleType};
use catalogist_core::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const BUILTIN_TEMPLATES: &str = include_str!("../assets/default_templates.json");

/// One canned subtree plus where it should be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    #[serde(flatten)]
    pub node: CatalogNode,

    #[serde(default = "default_insert_position_hint")]
    pub insert_position_hint: String,
}

fn default_insert_position_hint() -> String {
    "after_all".into()
}

/// Immutable set of the three module templates.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    business: ModuleTemplate,
    technical: ModuleTemplate,
    pricing: ModuleTemplate,
}

impl TemplateLibrary {
    /// The library compiled into the binary.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_json_str(BUILTIN_TEMPLATES)
    }

    /// Read a library from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    /// Use `path` when given, the built-in library otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => {
                tracing::info!("Loading template library from {}", path.display());
                Self::from_path(path)
            }
            None => Self::builtin(),
        }
    }

    /// Parse a library. All three `<module>_template` keys must be present;
    /// extra keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
        let mut entries: HashMap<String, ModuleTemplate> =
            serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))?;

        let mut take = |module: ModuleType| {
            let key = module.template_key();
            entries
                .remove(&key)
                .ok_or(TemplateError::MissingTemplate(key))
        };

        Ok(Self {
            business: take(ModuleType::Business)?,
            technical: take(ModuleType::Technical)?,
            pricing: take(ModuleType::Pricing)?,
        })
    }

    pub fn get(&self, module: ModuleType) -> &ModuleTemplate {
        match module {
            ModuleType::Business => &self.business,
            ModuleType::Technical => &self.technical,
            ModuleType::Pricing => &self.pricing,
        }
    }
}

/// Result of a successful template lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTemplate {
    pub module: ModuleType,
    pub template: CatalogNode,
    pub insert_position_hint: String,
}

impl DefaultTemplate {
    /// `{success, module, template, insert_position_hint}`, as shown to the agent.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "module": self.module.as_str(),
            "template": self.template,
            "insert_position_hint": self.insert_position_hint,
        })
    }
}

/// Failed lookups render as `{success: false, error}`.
pub fn error_json(error: &TemplateError) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": error.to_string(),
    })
}

/// Hands out copies of the library's templates by module type.
#[derive(Debug, Clone)]
pub struct DefaultTemplateProvider {
    library: Arc<TemplateLibrary>,
}

impl DefaultTemplateProvider {
    pub fn new(library: Arc<TemplateLibrary>) -> Self {
        Self { library }
    }

    /// Look up the template for a textual module type.
    pub fn get_default_template(&self, module_type: &str) -> Result<DefaultTemplate, TemplateError> {
        let module = ModuleType::parse(module_type)
            .ok_or_else(|| TemplateError::UnknownModule(module_type.to_string()))?;
        Ok(self.template_for(module))
    }

    pub fn template_for(&self, module: ModuleType) -> DefaultTemplate {
        let entry = self.library.get(module);
        DefaultTemplate {
            module,
            template: entry.node.clone(),
            insert_position_hint: entry.insert_position_hint.clone(),
        }
    }
}
