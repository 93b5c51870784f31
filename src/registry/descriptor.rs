//! Tool and action descriptors
//!
//! Describes what each data source can do, in enough detail for the planner
//! prompt and for parameter binding at validation time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of an action parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    #[default]
    Text,
    Integer,
    TextList,
}

impl ParamKind {
    /// Parse from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "string" | "str" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "text_list" | "string_list" | "list" | "array" => Some(Self::TextList),
            _ => None,
        }
    }

    /// Name used in the planner prompt
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
            Self::TextList => "list of strings",
        }
    }
}

/// One declared parameter of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Value used when the plan omits the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: String::new(),
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A callable action of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub function_name: String,
    pub description: String,
    pub return_description: String,
    pub example_parameters: Value,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// At least one of these parameters must be supplied
    #[serde(default)]
    pub requires_any: Vec<String>,
}

impl ActionDescriptor {
    pub fn new(function_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            description: description.into(),
            return_description: String::new(),
            example_parameters: Value::Object(Default::default()),
            params: Vec::new(),
            requires_any: Vec::new(),
        }
    }

    pub fn returns(mut self, return_description: impl Into<String>) -> Self {
        self.return_description = return_description.into();
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example_parameters = example;
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn requiring_any<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_any = names.into_iter().map(Into::into).collect();
        self
    }

    /// Look up a declared parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Compact signature for the planner prompt, e.g. `get_pathway_id(pathway_name: string, organism?: string)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let marker = if p.required { "" } else { "?" };
                format!("{}{}: {}", p.name, marker, p.kind.label())
            })
            .collect();
        format!("{}({})", self.function_name, params.join(", "))
    }
}

/// A data source the planner may use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    pub actions: Vec<ActionDescriptor>,
    /// Tool whose output this tool usually consumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Per-call timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            use_cases: Vec::new(),
            actions: Vec::new(),
            depends_on: None,
            timeout_ms: None,
        }
    }

    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_cases.push(use_case.into());
        self
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    pub fn depends_on(mut self, tool: impl Into<String>) -> Self {
        self.depends_on = Some(tool.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Case-insensitive action lookup
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        let name = name.trim();
        self.actions
            .iter()
            .find(|a| a.function_name.eq_ignore_ascii_case(name))
    }
}
