//! Default template lookup tool.

use async_trait::async_trait;
use catalogist_core::catalog::Forest;
use catalogist_core::error::ToolError;
use catalogist_core::tool::{Tool, ToolResult};
use crate::templates::{DefaultTemplateProvider, error_json};

pub struct GetDefaultTemplateTool {
    provider: DefaultTemplateProvider,
}

impl GetDefaultTemplateTool {
    pub fn new(provider: DefaultTemplateProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for GetDefaultTemplateTool {
    fn name(&self) -> &str {
        "get_default_template"
    }

    fn description(&self) -> &str {
        "Fetch the canned default subtree for a missing module (business, technical or pricing)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "module_type": {
                    "type": "string",
                    "enum": ["business", "technical", "pricing"],
                    "description": "Which module's template to fetch"
                }
            },
            "required": ["module_type"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _structure: &Forest,
    ) -> Result<ToolResult, ToolError> {
        let module_type = arguments["module_type"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'module_type' argument".into()))?;

        let found = match self.provider.get_default_template(module_type) {
            Ok(found) => found,
            Err(e) => {
                return Ok(ToolResult {
                    success: false,
                    output: error_json(&e).to_string(),
                    updated_structure: None,
                });
            }
        };

        let rendered = serde_json::to_string_pretty(&found.to_json())
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "get_default_template".into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::observation(format!(
            "Default template for module '{}':\n\
             title: {}\n\
             category: {}\n\
             children: {}\n\
             insert_position_hint: {}\n\n\
             {}",
            found.module,
            found.template.name,
            found.template.category,
            found.template.children.len(),
            found.insert_position_hint,
            rendered,
        )))
    }
}
