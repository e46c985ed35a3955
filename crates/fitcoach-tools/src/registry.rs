//! Tool registry: name-based lookup, definition listing, and per-agent
//! allow-lists.

use fitcoach_core::traits::Tool;
use fitcoach_core::types::ToolDefinition;

/// Owns the full set of tools; agents see a named subset.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Definitions for every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Definitions for an agent's allow-list, in allow-list order. Unknown
    /// names are skipped.
    pub fn definitions_for(&self, allowed: &[&str]) -> Vec<ToolDefinition> {
        allowed.iter().filter_map(|name| self.get(name).map(|t| t.definition())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

/// Validate that a tool call carries every required argument.
pub fn validate_args(definition: &ToolDefinition, args: &serde_json::Value) -> Result<(), String> {
    let params = &definition.parameters;
    if let Some(required) = params.get("required").and_then(|r| r.as_array()) {
        for req in required {
            if let Some(key) = req.as_str()
                && args.get(key).is_none()
            {
                return Err(format!("Missing required argument: {key}"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::{EstimateTdeeTool, MacroPlanTool};

    #[test]
    fn test_lookup_and_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EstimateTdeeTool));
        registry.register(Box::new(MacroPlanTool));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("estimate_tdee").is_some());
        assert!(registry.get("bench_press").is_none());

        let names: Vec<String> =
            registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["estimate_tdee", "macro_plan"]);
    }

    #[test]
    fn test_allow_list_order_and_unknowns() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EstimateTdeeTool));
        registry.register(Box::new(MacroPlanTool));

        let defs = registry.definitions_for(&["macro_plan", "nonexistent", "estimate_tdee"]);
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["macro_plan", "estimate_tdee"]);
    }

    #[test]
    fn test_validate_args_missing() {
        let def = ToolDefinition {
            name: "test".into(),
            description: "test tool".into(),
            parameters: serde_json::json!({
                "required": ["query"],
                "properties": {
                    "query": { "type": "string" }
                }
            }),
        };

        assert!(validate_args(&def, &serde_json::json!({})).is_err());
        assert!(validate_args(&def, &serde_json::json!({"query": "creatine"})).is_ok());
    }

    #[test]
    fn test_validate_args_no_required() {
        let def = ToolDefinition {
            name: "test".into(),
            description: "test tool".into(),
            parameters: serde_json::json!({}),
        };
        assert!(validate_args(&def, &serde_json::json!({})).is_ok());
    }
}
