//! LLM-backed plan generation

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{PlanParseError, Result};
use crate::llm::{CompletionRequest, LlmClient, Usage};
use crate::prompt::PlanningPrompt;

use super::parser::extract_plan_json;
use super::types::Plan;
use super::validator::PlanValidator;

/// Decoding settings for the planner call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the client's model when set
    pub model: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1000,
            model: None,
        }
    }
}

/// A plan together with the model output it came from
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub plan: Plan,
    pub raw_response: String,
    pub usage: Usage,
}

/// Turns a natural-language question into a `Plan`
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    prompt: PlanningPrompt,
    validator: PlanValidator,
    settings: GeneratorSettings,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: PlanningPrompt, validator: PlanValidator) -> Self {
        Self {
            llm,
            prompt,
            validator,
            settings: GeneratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn request(&self, query: &str) -> CompletionRequest {
        let request = CompletionRequest::new(self.prompt.system())
            .with_user_message(PlanningPrompt::user_message(query))
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        match &self.settings.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }

    /// Ask the model for a plan. A response without a usable `{"steps": [...]}`
    /// object fails with `PlanParseError`; it is not retried.
    pub async fn generate(&self, query: &str) -> Result<GeneratedPlan> {
        info!(model = self.settings.model.as_deref().unwrap_or(self.llm.model()), "requesting plan");
        let response = self.llm.complete(self.request(query)).await?;
        if response.finish_reason.is_truncated() {
            warn!(max_tokens = self.settings.max_tokens, "planner response was truncated");
        }

        let raw = response.content;
        let json = extract_plan_json(&raw)?;
        let plan = self
            .validator
            .validate(&json)
            .map_err(|e| PlanParseError::new(e.to_string(), raw.as_str()))?;

        info!(
            steps = plan.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "plan generated"
        );
        Ok(GeneratedPlan {
            plan,
            raw_response: raw,
            usage: response.usage,
        })
    }

    pub async fn generate_plan(&self, query: &str) -> Result<Plan> {
        Ok(self.generate(query).await?.plan)
    }
}
