//! Tool trait: the abstraction over repair-agent capabilities.
//!
//! Tools are invoked by name from parsed `Action:` directives. They see the
//! controller's current best forest read-only; a tool that changes the
//! structure returns a complete replacement in [`ToolResult::updated_structure`]
//! and the controller swaps it in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::catalog::Forest;
use crate::error::ToolError;

/// A tool definition rendered into the system prompt so the backend knows
/// what it may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Observation text fed back to the backend
    pub output: String,

    /// Replacement for the current best structure, if the tool changed it
    pub updated_structure: Option<Forest>,
}

impl ToolResult {
    pub fn observation(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            updated_structure: None,
        }
    }

    pub fn with_structure(output: impl Into<String>, structure: Forest) -> Self {
        Self {
            success: true,
            output: output.into(),
            updated_structure: Some(structure),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "update_node_category").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the backend).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool against the current best structure.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        structure: &Forest,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for the prompt.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name so prompts are stable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool call.
    pub async fn execute(
        &self,
        call: &ToolCall,
        structure: &Forest,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone(), structure).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogNode;

    /// Reports how many top-level nodes it was shown.
    struct CountTool;

    #[async_trait]
    impl Tool for CountTool {
        fn name(&self) -> &str { "count" }
        fn description(&self) -> &str { "Counts top-level nodes" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
            structure: &Forest,
        ) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult::observation(structure.len().to_string()))
        }
    }

    /// Appends a node, returning the new structure.
    struct AppendTool;

    #[async_trait]
    impl Tool for AppendTool {
        fn name(&self) -> &str { "append" }
        fn description(&self) -> &str { "Appends a node" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": { "name": { "type": "string" } } })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
            structure: &Forest,
        ) -> std::result::Result<ToolResult, ToolError> {
            let name = arguments["name"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'name' argument".into()))?;
            let mut updated = structure.clone();
            updated.push(CatalogNode::new(name));
            Ok(ToolResult::with_structure("appended", updated))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountTool));
        assert!(registry.get("count").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_definitions_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountTool));
        registry.register(Box::new(AppendTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "append");
        assert_eq!(defs[1].name, "count");
        assert_eq!(registry.names(), vec!["append", "count"]);
    }

    #[tokio::test]
    async fn registry_execute_sees_structure() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountTool));
        let forest = vec![CatalogNode::new("a"), CatalogNode::new("b")];
        let call = ToolCall {
            name: "count".into(),
            arguments: serde_json::json!({}),
        };
        let result = registry.execute(&call, &forest).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "2");
        assert!(result.updated_structure.is_none());
    }

    #[tokio::test]
    async fn registry_execute_returns_replacement() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(AppendTool));
        let forest = vec![CatalogNode::new("a")];
        let call = ToolCall {
            name: "append".into(),
            arguments: serde_json::json!({"name": "b"}),
        };
        let result = registry.execute(&call, &forest).await.unwrap();
        assert_eq!(result.updated_structure.unwrap().len(), 2);
        assert_eq!(forest.len(), 1);
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.execute(&call, &Vec::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
