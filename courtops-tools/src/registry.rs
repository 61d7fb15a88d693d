use crate::error::RegistryError;
use crate::tools::{Tool, ToolSpec};
use std::collections::HashMap;
use std::sync::Arc;

/// Whitelisted tools in advertisement order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry where the whitelist and handlers correspond 1:1.
    /// Order follows the whitelist.
    pub fn from_whitelist(
        whitelist: &[&str],
        handlers: Vec<Arc<dyn Tool>>,
    ) -> Result<Self, RegistryError> {
        let mut by_name: HashMap<&'static str, Arc<dyn Tool>> = HashMap::new();
        for handler in handlers {
            let name = handler.name();
            if !whitelist.contains(&name) {
                return Err(RegistryError::UnlistedHandler(name.to_string()));
            }
            if by_name.insert(name, handler).is_some() {
                return Err(RegistryError::DuplicateTool(name.to_string()));
            }
        }

        let mut tools = Vec::with_capacity(whitelist.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for name in whitelist {
            if index.contains_key(*name) {
                return Err(RegistryError::DuplicateTool(name.to_string()));
            }
            let handler = by_name
                .remove(*name)
                .ok_or_else(|| RegistryError::MissingHandler(name.to_string()))?;
            index.insert(name.to_string(), tools.len());
            tools.push(handler);
        }

        Ok(Self { tools, index })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).and_then(|i| self.tools.get(*i)).cloned()
    }

    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn list_tools(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Tool list in the OpenAI function-calling format.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.schema()
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::arguments::ToolArgs;
    use crate::error::ToolError;
    use crate::execution_context::ExecutionContext;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "named"
        }
        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _ctx: ExecutionContext, _args: ToolArgs) -> Result<Value, ToolError> {
            Ok(json!({}))
        }
    }

    fn handlers(names: &[&'static str]) -> Vec<Arc<dyn Tool>> {
        names.iter().map(|n| Arc::new(NamedTool(*n)) as Arc<dyn Tool>).collect()
    }

    #[test]
    fn test_order_follows_whitelist() {
        let registry =
            ToolRegistry::from_whitelist(&["b", "a", "c"], handlers(&["a", "c", "b"])).unwrap();
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        assert!(registry.is_whitelisted("a"));
        assert!(!registry.is_whitelisted("d"));

        let schemas = registry.schemas();
        assert_eq!(schemas[0]["type"], "function");
        assert_eq!(schemas[0]["function"]["name"], "b");
    }

    #[test]
    fn test_mismatches_are_rejected() {
        assert_eq!(
            ToolRegistry::from_whitelist(&["a", "b"], handlers(&["a"])).err(),
            Some(RegistryError::MissingHandler("b".into()))
        );
        assert_eq!(
            ToolRegistry::from_whitelist(&["a"], handlers(&["a", "z"])).err(),
            Some(RegistryError::UnlistedHandler("z".into()))
        );
        assert_eq!(
            ToolRegistry::from_whitelist(&["a"], handlers(&["a", "a"])).err(),
            Some(RegistryError::DuplicateTool("a".into()))
        );
    }
}
