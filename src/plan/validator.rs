//! Plan schema validation and parameter binding
//!
//! `validate` only checks the overall shape: a plan with a `steps` array. Each
//! step is then bound against the registry individually, so one bad step never
//! discards the rest of the plan.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::error::{PlanSchemaError, StepIssue};
use crate::registry::{ParamKind, ToolRegistry};

use super::params::{ResolvedValue, is_blank};
use super::types::{ParamValue, Plan, PlanStep, StepRef};

/// A step parameter after checking it against the action's declaration
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    Value(ResolvedValue),
    Ref { step_ref: StepRef, kind: ParamKind },
}

/// A step whose tool, action and parameters all check out
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStep {
    /// 1-based position in the plan
    pub index: usize,
    /// Canonical tool name from the registry
    pub tool_name: String,
    /// Canonical action name from the registry
    pub action: String,
    pub params: BTreeMap<String, BoundParam>,
    /// Parameters the plan supplied that the action does not declare
    pub ignored: Vec<String>,
    /// Required parameter names, rechecked once back-references resolve
    pub required: Vec<String>,
    /// At least one of these must be present after resolution
    pub requires_any: Vec<String>,
    /// Per-tool timeout override
    pub timeout: Option<Duration>,
}

/// Validates plans against a shared tool registry
#[derive(Debug, Clone)]
pub struct PlanValidator {
    registry: Arc<ToolRegistry>,
}

impl PlanValidator {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Turn raw plan JSON into a `Plan`.
    ///
    /// Fails only when `steps` is missing or not an array. Steps that are not
    /// objects, or lack fields, become steps with empty names and are flagged
    /// when bound.
    pub fn validate(&self, raw: &Value) -> Result<Plan, PlanSchemaError> {
        let object = raw.as_object().ok_or(PlanSchemaError::NotAnObject)?;
        let steps = match object.get("steps") {
            Some(Value::Array(steps)) => steps,
            Some(_) => return Err(PlanSchemaError::StepsNotArray),
            None => return Err(PlanSchemaError::MissingSteps),
        };

        let plan = Plan {
            task: object
                .get("task")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            steps: steps.iter().map(step_from_json).collect(),
        };

        for (i, step) in plan.steps.iter().enumerate() {
            if let Err(issue) = self.bind_step(i + 1, step) {
                warn!(step = i + 1, tool = %step.tool_name, action = %step.action, %issue, "plan step will not run");
            }
        }

        Ok(plan)
    }

    /// Bind every step of `plan`, one result per step in order
    pub fn bind(&self, plan: &Plan) -> Vec<Result<BoundStep, StepIssue>> {
        plan.steps
            .iter()
            .enumerate()
            .map(|(i, step)| self.bind_step(i + 1, step))
            .collect()
    }

    /// Bind one step at 1-based position `index`
    pub fn bind_step(&self, index: usize, step: &PlanStep) -> Result<BoundStep, StepIssue> {
        let action = self.registry.resolve_action(&step.tool_name, &step.action)?;
        let tool = self.registry.resolve_tool(&step.tool_name)?;

        let mut params = BTreeMap::new();
        let mut ignored = Vec::new();

        for (name, value) in &step.parameters {
            let Some(declared) = action.param(name) else {
                ignored.push(name.clone());
                continue;
            };

            let bound = match value {
                ParamValue::StepRef(step_ref) => {
                    if step_ref.from_step == 0 || step_ref.from_step >= index {
                        return Err(StepIssue::InvalidReference {
                            name: name.clone(),
                            from_step: step_ref.from_step,
                            step: index,
                        });
                    }
                    BoundParam::Ref {
                        step_ref: step_ref.clone(),
                        kind: declared.kind,
                    }
                }
                ParamValue::Literal(literal) if is_blank(literal) => continue,
                ParamValue::Literal(literal) => match ResolvedValue::coerce(declared.kind, literal) {
                    Some(resolved) => BoundParam::Value(resolved),
                    None => {
                        return Err(StepIssue::TypeMismatch {
                            name: name.clone(),
                            expected: declared.kind.label(),
                        });
                    }
                },
            };
            params.insert(declared.name.clone(), bound);
        }

        for declared in &action.params {
            if params.contains_key(&declared.name) {
                continue;
            }
            if let Some(default) = declared
                .default
                .as_ref()
                .and_then(|d| ResolvedValue::coerce(declared.kind, d))
            {
                params.insert(declared.name.clone(), BoundParam::Value(default));
            } else if declared.required {
                return Err(StepIssue::MissingParameter(declared.name.clone()));
            }
        }

        if !action.requires_any.is_empty()
            && !action.requires_any.iter().any(|name| params.contains_key(name))
        {
            return Err(StepIssue::MissingAnyOf(action.requires_any.clone()));
        }

        Ok(BoundStep {
            index,
            tool_name: tool.name.clone(),
            action: action.function_name.clone(),
            params,
            ignored,
            required: action
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.clone())
                .collect(),
            requires_any: action.requires_any.clone(),
            timeout: tool.timeout_ms.map(Duration::from_millis),
        })
    }
}

fn step_from_json(value: &Value) -> PlanStep {
    let Some(object) = value.as_object() else {
        return PlanStep::default();
    };
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let parameters = object
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (k.trim().to_string(), ParamValue::from(v.clone())))
                .collect()
        })
        .unwrap_or_default();

    PlanStep {
        tool_name: text("tool_name"),
        action: text("action").to_lowercase(),
        description: text("description"),
        parameters,
    }
}
