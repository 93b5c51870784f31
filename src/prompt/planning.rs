//! Planner instruction prompt
//!
//! Rendered once from the tool registry at startup and reused for every query.

use std::path::Path;

use serde::Serialize;

use crate::error::{BioplanError, Result};
use crate::registry::{ActionDescriptor, ParamSpec, ToolDescriptor, ToolRegistry};

use super::render::PromptRenderer;

/// Default instruction template. `{{output_format}}` receives `OUTPUT_FORMAT`.
pub const PLANNING_TEMPLATE: &str = r#"You are a biomedical research planner. Break the user's question into an ordered list of calls to the tools below. Use only these tools and these actions.

# Available tools
{{#each tools}}

## {{name}}
{{description}}
{{#if depends_on}}
Usually used after: {{depends_on}}
{{/if}}
Use cases:
{{#each use_cases}}
- {{this}}
{{/each}}
Actions:
{{#each actions}}
- {{signature}}
  {{description}}
  Returns: {{returns}}
  Example parameters: {{example}}
{{/each}}
{{/each}}

# Output format
{{output_format}}
"#;

/// Fixed output contract. Templates place it with `{{output_format}}`; it is
/// appended to templates that do not.
pub const OUTPUT_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"task": "<short restatement of the question>", "steps": [{"tool_name": "<tool>", "action": "<action>", "description": "<what this step does>", "parameters": {"<parameter>": "<value>"}}]}

Rules:
- Steps run in the order given, numbered from 1.
- To use the output of an earlier step, give the parameter the value {"from_step": <step number>, "field": "<output field>"}. Only earlier steps can be referenced.
- Output fields may be dotted to reach nested values. On a list, a field collects that value from every element, for example "proteins.id".
- Only use the parameters listed for an action. Parameters marked with ? are optional.
- If none of the tools can help, respond with {"steps": []}."#;

#[derive(Serialize)]
struct PromptContext<'a> {
    tools: Vec<ToolContext<'a>>,
    output_format: &'static str,
}

#[derive(Serialize)]
struct ToolContext<'a> {
    name: &'a str,
    description: &'a str,
    use_cases: &'a [String],
    depends_on: Option<&'a str>,
    actions: Vec<ActionContext<'a>>,
}

#[derive(Serialize)]
struct ActionContext<'a> {
    name: &'a str,
    signature: String,
    description: &'a str,
    returns: &'a str,
    example: String,
    params: Vec<&'a ParamSpec>,
}

impl<'a> ToolContext<'a> {
    fn from_tool(tool: &'a ToolDescriptor) -> Self {
        Self {
            name: &tool.name,
            description: &tool.description,
            use_cases: &tool.use_cases,
            depends_on: tool.depends_on.as_deref(),
            actions: tool.actions.iter().map(ActionContext::from_action).collect(),
        }
    }
}

impl<'a> ActionContext<'a> {
    fn from_action(action: &'a ActionDescriptor) -> Self {
        Self {
            name: &action.function_name,
            signature: action.signature(),
            description: &action.description,
            returns: &action.return_description,
            example: action.example_parameters.to_string(),
            params: action.params.iter().collect(),
        }
    }
}

/// The rendered system prompt for the planner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningPrompt {
    system: String,
}

impl PlanningPrompt {
    /// Render the default template for `registry`
    pub fn build(registry: &ToolRegistry) -> Result<Self> {
        Self::with_template(registry, PLANNING_TEMPLATE)
    }

    /// Render a custom template for `registry`, appending `OUTPUT_FORMAT`
    /// when the template leaves it out
    pub fn with_template(registry: &ToolRegistry, template: &str) -> Result<Self> {
        let context = PromptContext {
            tools: registry
                .describe_tools()
                .iter()
                .map(ToolContext::from_tool)
                .collect(),
            output_format: OUTPUT_FORMAT,
        };
        let mut system = PromptRenderer::new().render_with(template, &context)?;
        if system.trim().is_empty() {
            return Err(BioplanError::Config("planning template rendered empty".to_string()));
        }
        if !template.contains("output_format") {
            system = format!("{}\n\n# Output format\n{}\n", system.trim_end(), OUTPUT_FORMAT);
        }
        Ok(Self { system })
    }

    /// Render a template read from `path`
    pub fn from_file(registry: &ToolRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            BioplanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to load template from {}: {}", path.display(), e),
            ))
        })?;
        Self::with_template(registry, &template)
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// The user turn sent alongside the system prompt
    pub fn user_message(query: &str) -> String {
        format!("User query: \"{}\"", query.trim())
    }
}
