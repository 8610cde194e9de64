//! Node category annotation tool.
//!
//! Labels the node at `node_path` and every descendant with `category`. The
//! tool works on a copy; the controller adopts the returned forest only when
//! the lookup succeeds.

use async_trait::async_trait;
use catalogist_core::catalog::{Category, Forest, NodePath, annotate_path};
use catalogist_core::error::ToolError;
use catalogist_core::tool::{Tool, ToolResult};

pub struct UpdateNodeCategoryTool;

#[async_trait]
impl Tool for UpdateNodeCategoryTool {
    fn name(&self) -> &str {
        "update_node_category"
    }

    fn description(&self) -> &str {
        "Set the category of a node and all of its descendants. Paths look like \"root/商务标/投标函\"."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "node_path": {
                    "type": "string",
                    "description": "Slash-separated node names, optionally starting with 'root'"
                },
                "category": {
                    "type": "string",
                    "enum": ["business", "technical", "pricing", "mixed", "unknown"]
                }
            },
            "required": ["node_path", "category"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        structure: &Forest,
    ) -> Result<ToolResult, ToolError> {
        let node_path = arguments["node_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'node_path' argument".into()))?;
        let raw_category = arguments["category"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'category' argument".into()))?;

        let category = Category::parse(raw_category).ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "Invalid category '{raw_category}', expected one of business, technical, pricing, mixed, unknown"
            ))
        })?;

        let path = NodePath::parse(node_path);
        let (updated, name) = annotate_path(structure, &path, category).map_err(|e| {
            ToolError::NodeNotFound {
                path: e.path,
                segment: e.segment,
            }
        })?;

        tracing::debug!(path = %path, category = %category, "Annotated node");

        Ok(ToolResult::with_structure(
            format!("Marked node '{name}' and its children as {category}"),
            updated,
        ))
    }
}
