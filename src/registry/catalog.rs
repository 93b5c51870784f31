//! Tool catalog loading from TOML
//!
//! The built-in catalog is compiled into the binary; a replacement can be
//! loaded from a file named in the config.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{BioplanError, RegistryError, Result};

use super::descriptor::{ActionDescriptor, ParamKind, ParamSpec, ToolDescriptor};
use super::tool_registry::ToolRegistry;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/tools.toml");

/// TOML representation of an action parameter
#[derive(Debug, Deserialize)]
struct TomlParam {
    name: String,
    #[serde(rename = "type", default = "default_param_type")]
    param_type: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: String,
    default: Option<toml::Value>,
}

fn default_param_type() -> String {
    "string".to_string()
}

/// TOML representation of an action
#[derive(Debug, Deserialize)]
struct TomlAction {
    name: String,
    description: String,
    #[serde(default)]
    returns: String,
    /// Example invocation as a JSON string
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    requires_any: Vec<String>,
    #[serde(default, rename = "param")]
    params: Vec<TomlParam>,
}

/// TOML representation of a tool
#[derive(Debug, Deserialize)]
struct TomlTool {
    name: String,
    description: String,
    #[serde(default)]
    use_cases: Vec<String>,
    depends_on: Option<String>,
    timeout_ms: Option<u64>,
    #[serde(default, rename = "action")]
    actions: Vec<TomlAction>,
}

/// TOML file structure
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(rename = "tool")]
    tools: Vec<TomlTool>,
}

impl ToolRegistry {
    /// Registry described by the compiled-in catalog
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Load registry from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BioplanError::Config(format!(
                "Failed to read catalog file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Load registry from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: TomlCatalog = toml::from_str(content)
            .map_err(|e| RegistryError::InvalidCatalog(format!("Failed to parse TOML: {}", e)))?;

        let mut builder = ToolRegistry::builder();
        for toml_tool in catalog.tools {
            builder = builder.register(convert_tool(toml_tool)?)?;
        }
        Ok(builder.build()?)
    }
}

fn convert_tool(toml_tool: TomlTool) -> std::result::Result<ToolDescriptor, RegistryError> {
    let mut tool = toml_tool
        .use_cases
        .into_iter()
        .fold(ToolDescriptor::new(toml_tool.name, toml_tool.description), ToolDescriptor::with_use_case);
    if let Some(dependency) = toml_tool.depends_on {
        tool = tool.depends_on(dependency);
    }
    if let Some(timeout_ms) = toml_tool.timeout_ms {
        tool = tool.with_timeout(timeout_ms);
    }

    for toml_action in toml_tool.actions {
        let action = convert_action(&tool.name, toml_action)?;
        tool = tool.with_action(action);
    }
    Ok(tool)
}

fn convert_action(tool: &str, toml_action: TomlAction) -> std::result::Result<ActionDescriptor, RegistryError> {
    let example = match toml_action.example.as_deref() {
        Some(text) => serde_json::from_str::<Value>(text).map_err(|e| {
            RegistryError::InvalidCatalog(format!(
                "Invalid example for {}.{}: {}",
                tool, toml_action.name, e
            ))
        })?,
        None => Value::Object(Default::default()),
    };

    let mut action = ActionDescriptor::new(toml_action.name, toml_action.description)
        .returns(toml_action.returns)
        .with_example(example)
        .requiring_any(toml_action.requires_any);

    for toml_param in toml_action.params {
        let kind = ParamKind::from_str(&toml_param.param_type).ok_or_else(|| {
            RegistryError::InvalidCatalog(format!(
                "Invalid type '{}' for parameter '{}' of {}.{}",
                toml_param.param_type, toml_param.name, tool, action.function_name
            ))
        })?;

        let mut param = ParamSpec::new(toml_param.name, kind).with_description(toml_param.description);
        if toml_param.required {
            param = param.required();
        }
        if let Some(default) = toml_param.default {
            let default = serde_json::to_value(default)
                .map_err(|e| RegistryError::InvalidCatalog(format!("Invalid default: {}", e)))?;
            param = param.with_default(default);
        }
        action = action.with_param(param);
    }

    for name in &action.requires_any {
        if action.param(name).is_none() {
            return Err(RegistryError::InvalidCatalog(format!(
                "{}.{} requires undeclared parameter '{}'",
                tool, action.function_name, name
            )));
        }
    }

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_TOML: &str = r#"
[[tool]]
name = "KEGG"
description = "Pathway database"
use_cases = ["Retrieve all proteins in a known pathway"]
timeout_ms = 60000

[[tool.action]]
name = "get_pathway_id"
description = "Resolve a pathway name"
returns = "pathway_id and description"
example = '{ "pathway_name": "apoptosis" }'

[[tool.action.param]]
name = "pathway_name"
type = "string"
required = true

[[tool.action.param]]
name = "organism"
default = "hsa"

[[tool]]
name = "DrugBank"
description = "Drug targets"
depends_on = "KEGG"

[[tool.action]]
name = "check_drug_links"
description = "Check proteins for drugs"

[[tool.action.param]]
name = "uniprot_ids"
type = "text_list"
required = true
"#;

    #[test]
    fn test_registry_from_toml() {
        let registry = ToolRegistry::from_toml(SAMPLE_TOML).unwrap();
        assert_eq!(registry.len(), 2);

        let kegg = registry.tool("kegg").unwrap();
        assert_eq!(kegg.timeout_ms, Some(60_000));
        assert_eq!(kegg.use_cases.len(), 1);

        let action = registry.resolve_action("KEGG", "get_pathway_id").unwrap();
        assert_eq!(action.example_parameters, json!({ "pathway_name": "apoptosis" }));
        assert!(action.param("pathway_name").unwrap().required);
        assert_eq!(action.param("organism").unwrap().default, Some(json!("hsa")));
        assert_eq!(action.param("organism").unwrap().kind, ParamKind::Text);
    }

    #[test]
    fn test_registry_from_toml_list_param() {
        let registry = ToolRegistry::from_toml(SAMPLE_TOML).unwrap();
        let action = registry.resolve_action("drugbank", "check_drug_links").unwrap();
        assert_eq!(action.param("uniprot_ids").unwrap().kind, ParamKind::TextList);
        assert_eq!(registry.tool("DrugBank").unwrap().depends_on.as_deref(), Some("KEGG"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ToolRegistry::from_toml("invalid { toml }").is_err());
    }

    #[test]
    fn test_invalid_param_type() {
        let toml = r#"
[[tool]]
name = "Bad"
description = "Bad tool"

[[tool.action]]
name = "run"
description = "run"

[[tool.action.param]]
name = "x"
type = "blob"
"#;
        let err = ToolRegistry::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("Invalid type 'blob'"));
    }

    #[test]
    fn test_invalid_example_json() {
        let toml = r#"
[[tool]]
name = "Bad"
description = "Bad tool"

[[tool.action]]
name = "run"
description = "run"
example = "{ not json"
"#;
        assert!(ToolRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_requires_any_must_be_declared() {
        let toml = r#"
[[tool]]
name = "Bad"
description = "Bad tool"

[[tool.action]]
name = "run"
description = "run"
requires_any = ["ghost"]
"#;
        let err = ToolRegistry::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("undeclared parameter 'ghost'"));
    }

    #[test]
    fn test_tool_without_actions_in_catalog() {
        let toml = r#"
[[tool]]
name = "Empty"
description = "No actions"
"#;
        let err = ToolRegistry::from_toml(toml).unwrap_err();
        assert!(matches!(err, BioplanError::Registry(RegistryError::NoActions(_))));
    }

    #[test]
    fn test_builtin_catalog() {
        let registry = ToolRegistry::builtin().unwrap();
        for name in ["KEGG", "GO", "DrugBank", "Compare"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(registry.resolve_action("KEGG", "get_pathway_proteins").is_ok());
        assert!(registry.resolve_action("GO", "get_similar_genes").is_ok());
        assert!(registry.resolve_action("DrugBank", "check_drug_links").is_ok());
        assert!(registry.resolve_action("Compare", "intersect_lists").is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let registry = ToolRegistry::from_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ToolRegistry::from_file("/nonexistent/catalog.toml").unwrap_err();
        assert!(matches!(err, BioplanError::Config(_)));
    }
}
