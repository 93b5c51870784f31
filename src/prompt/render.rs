//! Prompt Renderer - Render templates with context variables using Handlebars

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{BioplanError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a renderer that leaves missing variables empty and never
    /// HTML-escapes output
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with any serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| BioplanError::Config(format!("Failed to render template: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_with_serializable() {
        #[derive(Serialize)]
        struct Context {
            name: String,
            count: i32,
        }

        let renderer = PromptRenderer::new();
        let context = Context {
            name: "KEGG".to_string(),
            count: 3,
        };

        let result = renderer.render_with("{{name}} has {{count}} actions", &context).unwrap();
        assert_eq!(result, "KEGG has 3 actions");
    }

    #[test]
    fn test_render_missing_variable_empty_string() {
        let renderer = PromptRenderer::default();
        let result = renderer.render_with("Tool: {{name}}!", &json!({})).unwrap();
        assert_eq!(result, "Tool: !");
    }

    #[test]
    fn test_render_no_escape() {
        let renderer = PromptRenderer::new();
        let result = renderer
            .render_with("Example: {{example}}", &json!({ "example": r#"{"gene_name": "TP53"}"# }))
            .unwrap();
        assert_eq!(result, r#"Example: {"gene_name": "TP53"}"#);
    }

    #[test]
    fn test_render_each_block() {
        let renderer = PromptRenderer::new();
        let result = renderer
            .render_with("{{#each tools}}[{{name}}]{{/each}}", &json!({ "tools": [{ "name": "KEGG" }, { "name": "GO" }] }))
            .unwrap();
        assert_eq!(result, "[KEGG][GO]");
    }

    #[test]
    fn test_invalid_template() {
        let renderer = PromptRenderer::new();
        let err = renderer.render_with("{{#each tools}}", &json!({ "tools": [] })).unwrap_err();
        assert!(matches!(err, BioplanError::Config(_)));
    }
}
