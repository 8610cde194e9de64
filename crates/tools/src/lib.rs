//! Default templates and the tools available to the repair agent.
//!
//! The agent can fetch a canned subtree for a missing module and relabel any
//! node (and its descendants) with a category.

pub mod get_default_template;
pub mod templates;
pub mod update_node_category;

use catalogist_core::tool::ToolRegistry;
use std::sync::Arc;

pub use get_default_template::GetDefaultTemplateTool;
pub use templates::{DefaultTemplate, DefaultTemplateProvider, ModuleTemplate, TemplateLibrary};
pub use update_node_category::UpdateNodeCategoryTool;

/// Create the repair agent's tool registry.
pub fn default_registry(library: Arc<TemplateLibrary>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetDefaultTemplateTool::new(DefaultTemplateProvider::new(
        library,
    ))));
    registry.register(Box::new(UpdateNodeCategoryTool));
    registry
}
