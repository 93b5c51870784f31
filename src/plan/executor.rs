//! Sequential plan execution
//!
//! Every step produces exactly one `StepResult`, in plan order. Nothing a step
//! does (unknown tool, missing input, adapter failure, timeout) stops the
//! steps after it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapters::AdapterSet;
use crate::error::{AdapterError, StepIssue};
use crate::registry::{ParamKind, ToolRegistry};

use super::params::{ResolvedParams, ResolvedValue, is_blank};
use super::report::{ExecutionReport, StepResult};
use super::types::Plan;
use super::validator::{BoundParam, BoundStep, PlanValidator};

/// Default per-step timeout when neither the tool nor the caller sets one
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs plans against a set of data sources
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    validator: PlanValidator,
    adapters: AdapterSet,
    step_timeout: Duration,
}

impl PlanExecutor {
    pub fn new(registry: Arc<ToolRegistry>, adapters: AdapterSet) -> Self {
        Self {
            validator: PlanValidator::new(registry),
            adapters,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Timeout for tools that do not declare their own
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn validator(&self) -> &PlanValidator {
        &self.validator
    }

    /// Execute every step of `plan` in order
    pub async fn execute(&self, plan: &Plan) -> ExecutionReport {
        let mut report = ExecutionReport::new();
        info!(steps = plan.len(), "executing plan");

        for (i, step) in plan.steps.iter().enumerate() {
            let index = i + 1;
            let started = Instant::now();

            let result = match self.validator.bind_step(index, step) {
                Ok(bound) => self.run_step(&bound, &report).await,
                Err(issue) => StepResult::error(index, &step.tool_name, &step.action, issue.to_string()),
            };
            let result = result.with_duration(started.elapsed().as_millis() as u64);

            match &result.error_message {
                None => info!(step = index, tool = %result.tool_name, action = %result.action, duration_ms = result.duration_ms, "step ok"),
                Some(message) => warn!(step = index, tool = %result.tool_name, action = %result.action, error = %message, "step failed"),
            }
            report.push(result);
        }

        info!(summary = %report.summary(), "plan finished");
        report
    }

    async fn run_step(&self, step: &BoundStep, report: &ExecutionReport) -> StepResult {
        let fail = |message: String| StepResult::error(step.index, &step.tool_name, &step.action, message);

        if !step.ignored.is_empty() {
            debug!(step = step.index, ignored = ?step.ignored, "ignoring undeclared parameters");
        }

        let params = match resolve_params(step, report) {
            Ok(params) => params,
            Err(issue) => return fail(issue.to_string()),
        };

        let Some(adapter) = self.adapters.get(&step.tool_name) else {
            return fail(format!("no data source registered for tool '{}'", step.tool_name));
        };

        let timeout = step.timeout.unwrap_or(self.step_timeout);
        debug!(step = step.index, tool = %step.tool_name, action = %step.action, ?params, "invoking data source");

        match tokio::time::timeout(timeout, adapter.invoke(&step.action, &params)).await {
            Ok(Ok(data)) => StepResult::ok(step.index, &step.tool_name, &step.action, data),
            Ok(Err(e)) => fail(e.to_string()),
            Err(_) => fail(AdapterError::Timeout(timeout).to_string()),
        }
    }
}

/// Fill back-references from earlier successful steps
fn resolve_params(step: &BoundStep, report: &ExecutionReport) -> Result<ResolvedParams, StepIssue> {
    let mut params = ResolvedParams::new();
    let mut unresolved: Vec<&str> = Vec::new();

    for (name, bound) in &step.params {
        let value = match bound {
            BoundParam::Value(value) => value.clone(),
            BoundParam::Ref { step_ref, kind } => {
                let Some(data) = report.step(step_ref.from_step).and_then(|r| r.data.as_ref()) else {
                    debug!(step = step.index, %name, source = %step_ref, "referenced step has no output");
                    unresolved.push(name);
                    continue;
                };
                let Some(found) = step_ref.lookup(data).filter(|v| !is_blank(v)) else {
                    debug!(step = step.index, %name, source = %step_ref, "referenced field is absent or empty");
                    unresolved.push(name);
                    continue;
                };
                coerce_ref(name, *kind, &found)?
            }
        };
        params.insert(name.clone(), value);
    }

    if let Some(missing) = step.required.iter().find(|name| !params.contains(name)) {
        return Err(StepIssue::MissingParameter(missing.clone()));
    }
    if !step.requires_any.is_empty() && !step.requires_any.iter().any(|name| params.contains(name)) {
        // Name the back-reference that came up empty when there is one
        return Err(match unresolved.iter().find(|name| step.requires_any.iter().any(|n| n.as_str() == **name)) {
            Some(name) => StepIssue::MissingParameter(name.to_string()),
            None => StepIssue::MissingAnyOf(step.requires_any.clone()),
        });
    }

    Ok(params)
}

fn coerce_ref(name: &str, kind: ParamKind, found: &Value) -> Result<ResolvedValue, StepIssue> {
    ResolvedValue::coerce(kind, found).ok_or_else(|| StepIssue::TypeMismatch {
        name: name.to_string(),
        expected: kind.label(),
    })
}
