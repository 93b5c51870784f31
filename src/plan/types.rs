//! Plan data model
//!
//! A `Plan` is the model's proposal: an ordered list of steps, each naming a
//! tool, an action and a parameter map. Parameter values are either literal
//! JSON or back-references into an earlier step's output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered, per-query list of tool invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { task: None, steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One planned invocation of a tool action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl PlanStep {
    pub fn new(tool_name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Parameter taken from `field` of step `from_step` (1-based)
    pub fn with_ref(self, name: impl Into<String>, from_step: usize, field: impl Into<String>) -> Self {
        self.with_param(name, ParamValue::StepRef(StepRef::new(from_step, field)))
    }
}

/// A step parameter as written in the plan
///
/// Back-references are written either as `{"from_step": 1, "field": "pathway_id"}`
/// or as the shorthand string `"$step1.pathway_id"`. Anything else is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ParamValue {
    Literal(Value),
    StepRef(StepRef),
}

impl ParamValue {
    pub fn step_ref(&self) -> Option<&StepRef> {
        match self {
            ParamValue::StepRef(r) => Some(r),
            ParamValue::Literal(_) => None,
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match StepRef::from_json(&value) {
            Some(r) => ParamValue::StepRef(r),
            None => ParamValue::Literal(value),
        }
    }
}

impl From<ParamValue> for Value {
    fn from(param: ParamValue) -> Self {
        match param {
            ParamValue::Literal(v) => v,
            ParamValue::StepRef(r) => serde_json::json!({
                "from_step": r.from_step,
                "field": r.field,
            }),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::from(Value::String(s.to_string()))
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Literal(Value::from(n))
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::Literal(Value::from(items))
    }
}

/// Reference to a field of an earlier step's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRef {
    /// 1-based step index
    pub from_step: usize,
    /// Dotted path into the step's data, e.g. `proteins.id`
    pub field: String,
}

impl StepRef {
    pub fn new(from_step: usize, field: impl Into<String>) -> Self {
        Self {
            from_step,
            field: field.into(),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) if map.len() == 2 => {
                let step = map.get("from_step")?;
                let from_step = step
                    .as_u64()
                    .or_else(|| step.as_str().and_then(|s| s.trim().parse().ok()))?;
                let field = map.get("field")?.as_str()?.trim();
                (!field.is_empty()).then(|| Self::new(from_step as usize, field))
            }
            Value::String(s) => Self::parse_shorthand(s),
            _ => None,
        }
    }

    fn parse_shorthand(s: &str) -> Option<Self> {
        let rest = s.trim().strip_prefix("$step")?;
        let (index, field) = rest.split_once('.')?;
        let from_step = index.parse().ok()?;
        let field = field.trim();
        (!field.is_empty()).then(|| Self::new(from_step, field))
    }

    /// Follow the dotted path through `data`.
    ///
    /// Numeric segments index into arrays; any other segment applied to an
    /// array is mapped over its elements, so `proteins.id` on a list of
    /// protein objects yields the list of ids.
    pub fn lookup(&self, data: &Value) -> Option<Value> {
        let mut current = data.clone();
        for segment in self.field.split('.').map(str::trim) {
            current = match current {
                Value::Object(mut map) => map.remove(segment)?,
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(i) => items.into_iter().nth(i)?,
                    Err(_) => {
                        let picked: Vec<Value> = items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::Object(mut map) => map.remove(segment),
                                _ => None,
                            })
                            .collect();
                        if picked.is_empty() {
                            return None;
                        }
                        Value::Array(picked)
                    }
                },
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }
}

impl std::fmt::Display for StepRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {}.{}", self.from_step, self.field)
    }
}
