//! Query pipeline: question in, plan + report + explanation out

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::adapters::AdapterSet;
use crate::error::{BioplanError, Result};
use crate::llm::LlmClient;
use crate::plan::{ExecutionReport, ExplanationRenderer, Plan, PlanExecutor, PlanGenerator, PlanValidator};
use crate::prompt::PlanningPrompt;
use crate::registry::ToolRegistry;

/// Explanation returned when no plan could be produced
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate or parse the plan.";

/// Everything the caller gets back for one question
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    /// `None` when the model call or plan parsing failed
    pub plan: Option<Plan>,
    pub execution_report: ExecutionReport,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    fn failed(query: &str, err: BioplanError) -> Self {
        let raw_response = match &err {
            BioplanError::PlanParse(e) => Some(e.raw_response.clone()),
            _ => None,
        };
        Self {
            query: query.to_string(),
            plan: None,
            execution_report: ExecutionReport::new(),
            explanation: GENERATION_FAILED_MESSAGE.to_string(),
            raw_response,
            error: Some(err.to_string()),
        }
    }
}

/// Wires the generator, executor and explanation renderer together
pub struct QueryPipeline {
    generator: PlanGenerator,
    executor: PlanExecutor,
    renderer: ExplanationRenderer,
}

impl QueryPipeline {
    pub fn new(generator: PlanGenerator, executor: PlanExecutor, renderer: ExplanationRenderer) -> Self {
        Self {
            generator,
            executor,
            renderer,
        }
    }

    /// Default prompt, settings and rationale table over `registry`
    pub fn with_defaults(registry: Arc<ToolRegistry>, llm: Arc<dyn LlmClient>, adapters: AdapterSet) -> Result<Self> {
        let prompt = PlanningPrompt::build(&registry)?;
        let generator = PlanGenerator::new(llm, prompt, PlanValidator::new(registry.clone()));
        let executor = PlanExecutor::new(registry, adapters);
        Ok(Self::new(generator, executor, ExplanationRenderer::default()))
    }

    pub fn executor(&self) -> &PlanExecutor {
        &self.executor
    }

    pub fn renderer(&self) -> &ExplanationRenderer {
        &self.renderer
    }

    /// Plan, execute and explain one question
    pub async fn answer(&self, query: &str) -> QueryOutcome {
        self.respond(query, true).await
    }

    /// Plan and explain without calling any data source
    pub async fn plan_only(&self, query: &str) -> QueryOutcome {
        self.respond(query, false).await
    }

    async fn respond(&self, query: &str, execute: bool) -> QueryOutcome {
        info!(%query, execute, "answering query");
        let generated = match self.generator.generate(query).await {
            Ok(generated) => generated,
            Err(e) => {
                error!(error = %e, "plan generation failed");
                return QueryOutcome::failed(query, e);
            }
        };

        let execution_report = if execute {
            self.executor.execute(&generated.plan).await
        } else {
            ExecutionReport::new()
        };

        QueryOutcome {
            query: query.to_string(),
            explanation: self.renderer.render(&generated.plan),
            plan: Some(generated.plan),
            execution_report,
            raw_response: Some(generated.raw_response),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CompareSource;
    use crate::llm::MockLlmClient;
    use crate::plan::NO_STEPS_MESSAGE;

    fn pipeline(texts: &[&str]) -> QueryPipeline {
        let registry = Arc::new(ToolRegistry::builtin().unwrap());
        let llm = Arc::new(MockLlmClient::from_texts(texts.iter().copied()));
        let adapters = AdapterSet::new().with(Arc::new(CompareSource));
        QueryPipeline::with_defaults(registry, llm, adapters).unwrap()
    }

    #[tokio::test]
    async fn test_answer_runs_local_step() {
        let outcome = pipeline(&[r#"{"steps": [{"tool_name": "Compare", "action": "intersect_lists",
            "description": "overlap", "parameters": {"list_a": ["A", "B"], "list_b": ["b"]}}]}"#])
        .answer("overlap of A,B and b")
        .await;

        assert!(outcome.has_plan());
        assert_eq!(outcome.execution_report.len(), 1);
        assert!(outcome.execution_report.steps[0].is_ok());
        assert_eq!(outcome.explanation, "**Step 1 - Querying Compare**\noverlap.");
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_plan_only_skips_execution() {
        let outcome = pipeline(&[r#"{"steps": [{"tool_name": "Compare", "action": "intersect_lists",
            "parameters": {"list_a": ["A"], "list_b": ["A"]}}]}"#])
        .plan_only("q")
        .await;
        assert_eq!(outcome.plan.unwrap().len(), 1);
        assert!(outcome.execution_report.is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let outcome = pipeline(&["Nothing to do. {\"steps\": []}"]).answer("q").await;
        assert_eq!(outcome.explanation, NO_STEPS_MESSAGE);
        assert!(outcome.execution_report.is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_outcome() {
        let outcome = pipeline(&["no plan here"]).answer("q").await;
        assert!(outcome.plan.is_none());
        assert_eq!(outcome.explanation, GENERATION_FAILED_MESSAGE);
        assert_eq!(outcome.raw_response.as_deref(), Some("no plan here"));
        assert!(outcome.error.unwrap().contains("Plan parse error"));
    }

    #[tokio::test]
    async fn test_llm_failure_outcome() {
        let outcome = pipeline(&[]).answer("q").await;
        assert!(outcome.plan.is_none());
        assert!(outcome.raw_response.is_none());
        assert!(outcome.error.unwrap().starts_with("LLM error"));
    }

    #[tokio::test]
    async fn test_outcome_serializes() {
        let outcome = pipeline(&["nope"]).answer("q").await;
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json["plan"].is_null());
        assert_eq!(json["execution_report"]["steps"], serde_json::json!([]));
    }
}
