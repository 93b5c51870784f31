//! Immutable tool registry
//!
//! Built once at startup through `ToolRegistryBuilder`, which enforces unique
//! names, non-empty action lists and an acyclic `depends_on` graph.

use std::collections::{HashMap, HashSet};

use crate::error::RegistryError;

use super::descriptor::{ActionDescriptor, ToolDescriptor};

/// Read-only catalog of the tools the planner may use
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// All tools in registration order
    pub fn describe_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Case-insensitive tool lookup
    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index
            .get(&normalize(name))
            .map(|&i| &self.tools[i])
    }

    pub fn resolve_tool(&self, name: &str) -> Result<&ToolDescriptor, RegistryError> {
        self.tool(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.trim().to_string()))
    }

    pub fn resolve_action(
        &self,
        tool_name: &str,
        action_name: &str,
    ) -> Result<&ActionDescriptor, RegistryError> {
        let tool = self.resolve_tool(tool_name)?;
        tool.action(action_name)
            .ok_or_else(|| RegistryError::UnknownAction {
                tool: tool.name.clone(),
                action: action_name.trim().to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tools ordered so that every tool comes after the tool it depends on.
    /// Ties keep registration order.
    pub fn dependency_order(&self) -> Vec<&ToolDescriptor> {
        let mut placed: HashSet<usize> = HashSet::new();
        let mut order = Vec::with_capacity(self.tools.len());

        while order.len() < self.tools.len() {
            for (i, tool) in self.tools.iter().enumerate() {
                if placed.contains(&i) {
                    continue;
                }
                let ready = match &tool.depends_on {
                    Some(dep) => self.index.get(&normalize(dep)).is_none_or(|d| placed.contains(d)),
                    None => true,
                };
                if ready {
                    placed.insert(i);
                    order.push(tool);
                }
            }
        }
        order
    }
}

/// Collects descriptors and checks registry invariants on `build`
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistryBuilder {
    /// Add a tool. Local invariants are checked here; dependency edges on `build`.
    pub fn register(mut self, tool: ToolDescriptor) -> Result<Self, RegistryError> {
        let key = normalize(&tool.name);
        if key.is_empty() {
            return Err(RegistryError::InvalidCatalog("tool with empty name".to_string()));
        }
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateTool(tool.name));
        }
        if tool.actions.is_empty() {
            return Err(RegistryError::NoActions(tool.name));
        }

        let mut seen = HashSet::new();
        for action in &tool.actions {
            if !seen.insert(normalize(&action.function_name)) {
                return Err(RegistryError::DuplicateAction {
                    tool: tool.name.clone(),
                    action: action.function_name.clone(),
                });
            }
        }

        self.index.insert(key, self.tools.len());
        self.tools.push(tool);
        Ok(self)
    }

    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        for tool in &self.tools {
            if let Some(dep) = &tool.depends_on
                && !self.index.contains_key(&normalize(dep))
            {
                return Err(RegistryError::UnknownDependency {
                    tool: tool.name.clone(),
                    depends_on: dep.clone(),
                });
            }
        }

        self.check_cycles()?;

        Ok(ToolRegistry {
            tools: self.tools,
            index: self.index,
        })
    }

    /// Each tool has at most one outgoing edge, so following the chain from
    /// every node finds any cycle.
    fn check_cycles(&self) -> Result<(), RegistryError> {
        for (start, _) in self.tools.iter().enumerate() {
            let mut path = vec![start];
            let mut current = start;

            while let Some(dep) = &self.tools[current].depends_on {
                let Some(&next) = self.index.get(&normalize(dep)) else {
                    break;
                };
                if let Some(pos) = path.iter().position(|&p| p == next) {
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|&i| self.tools[i].name.clone()).collect();
                    cycle.push(self.tools[next].name.clone());
                    return Err(RegistryError::DependencyCycle(cycle));
                }
                path.push(next);
                current = next;
            }
        }
        Ok(())
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::{ParamKind, ParamSpec};
    use serde_json::json;

    fn tool(name: &str, action: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{} tool", name)).with_action(
            ActionDescriptor::new(action, "does things")
                .with_example(json!({}))
                .with_param(ParamSpec::new("input", ParamKind::Text)),
        )
    }

    fn sample() -> ToolRegistry {
        ToolRegistry::builder()
            .register(tool("KEGG", "get_pathway_id"))
            .unwrap()
            .register(tool("DrugBank", "search_drug").depends_on("KEGG"))
            .unwrap()
            .register(tool("GO", "get_similar_genes"))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_describe_tools_keeps_order() {
        let registry = sample();
        let names: Vec<_> = registry.describe_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["KEGG", "DrugBank", "GO"]);
    }

    #[test]
    fn test_resolve_action() {
        let registry = sample();
        let action = registry.resolve_action("kegg", "GET_PATHWAY_ID").unwrap();
        assert_eq!(action.function_name, "get_pathway_id");
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = sample();
        let err = registry.resolve_action("ClinVar", "search").unwrap_err();
        assert_eq!(err, RegistryError::UnknownTool("ClinVar".into()));
    }

    #[test]
    fn test_resolve_unknown_action() {
        let registry = sample();
        let err = registry.resolve_action("GO", "get_pathway_id").unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownAction {
                tool: "GO".into(),
                action: "get_pathway_id".into()
            }
        );
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let err = ToolRegistry::builder()
            .register(tool("KEGG", "a"))
            .unwrap()
            .register(tool("kegg", "b"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("kegg".into()));
    }

    #[test]
    fn test_tool_without_actions_rejected() {
        let err = ToolRegistry::builder()
            .register(ToolDescriptor::new("Empty", "nothing"))
            .unwrap_err();
        assert_eq!(err, RegistryError::NoActions("Empty".into()));
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let dup = tool("KEGG", "get").with_action(ActionDescriptor::new("GET", "again"));
        let err = ToolRegistry::builder().register(dup).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAction { .. }));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = ToolRegistry::builder()
            .register(tool("DrugBank", "search").depends_on("UniProt"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownDependency {
                tool: "DrugBank".into(),
                depends_on: "UniProt".into()
            }
        );
    }

    #[test]
    fn test_dependency_cycle_rejected() {
        let err = ToolRegistry::builder()
            .register(tool("A", "a").depends_on("B"))
            .unwrap()
            .register(tool("B", "b").depends_on("C"))
            .unwrap()
            .register(tool("C", "c").depends_on("A"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DependencyCycle(vec!["A".into(), "B".into(), "C".into(), "A".into()])
        );
    }

    #[test]
    fn test_self_dependency_rejected() {
        let err = ToolRegistry::builder()
            .register(tool("A", "a").depends_on("a"))
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DependencyCycle(_)));
    }

    #[test]
    fn test_dependency_order() {
        let registry = ToolRegistry::builder()
            .register(tool("Compare", "intersect").depends_on("DrugBank"))
            .unwrap()
            .register(tool("DrugBank", "search").depends_on("KEGG"))
            .unwrap()
            .register(tool("KEGG", "get"))
            .unwrap()
            .build()
            .unwrap();

        let order: Vec<_> = registry.dependency_order().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["KEGG", "DrugBank", "Compare"]);
    }

    #[test]
    fn test_contains_and_len() {
        let registry = sample();
        assert!(registry.contains(" go "));
        assert!(!registry.contains("STRING"));
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }
}
