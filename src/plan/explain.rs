//! Human-readable plan narration

use std::collections::BTreeMap;

use super::types::Plan;

/// Shown for a plan with zero steps
pub const NO_STEPS_MESSAGE: &str = "No steps were found in the planning output.";

const DEFAULT_RATIONALES: &[(&str, &str)] = &[
    ("clinvar", "This helps understand the medical relevance of the variant."),
    ("drugbank", "This could highlight therapeutic opportunities."),
    ("uniprot", "This reveals key information about the protein's role and function."),
    ("string", "This helps identify interacting proteins and broader functional networks."),
    ("chembl", "This may uncover experimental compounds or drugs under development."),
    ("kegg", "This provides insight into the biological pathways the gene participates in."),
    ("go", "This finds genes that share biological functions with the gene of interest."),
];

/// Built-in rationale table, keyed by lower-cased tool name
pub fn default_rationales() -> BTreeMap<String, String> {
    DEFAULT_RATIONALES
        .iter()
        .map(|(tool, text)| (tool.to_string(), text.to_string()))
        .collect()
}

/// Renders a plan as numbered steps with a per-tool rationale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRenderer {
    rationales: BTreeMap<String, String>,
}

impl Default for ExplanationRenderer {
    fn default() -> Self {
        Self::new(default_rationales())
    }
}

impl ExplanationRenderer {
    pub fn new(rationales: BTreeMap<String, String>) -> Self {
        Self {
            rationales: rationales
                .into_iter()
                .map(|(tool, text)| (tool.trim().to_lowercase(), text.trim().to_string()))
                .filter(|(_, text)| !text.is_empty())
                .collect(),
        }
    }

    pub fn rationale(&self, tool_name: &str) -> Option<&str> {
        self.rationales
            .get(&tool_name.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn render(&self, plan: &Plan) -> String {
        if plan.is_empty() {
            return NO_STEPS_MESSAGE.to_string();
        }

        plan.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let mut body = with_period(&step.description);
                if let Some(rationale) = self.rationale(&step.tool_name) {
                    body.push(' ');
                    body.push_str(&with_period(rationale));
                }
                format!("**Step {} - Querying {}**\n{}", i + 1, step.tool_name.trim(), body)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Terminal period ensured; a blank description becomes "."
fn with_period(text: &str) -> String {
    let text = text.trim();
    if text.ends_with('.') {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}
