//! Per-step execution outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Error,
}

/// Outcome of one plan step. `data` is set iff ok, `error_message` iff error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based position in the plan
    pub step_index: usize,
    pub tool_name: String,
    pub action: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl StepResult {
    pub fn ok(step_index: usize, tool_name: impl Into<String>, action: impl Into<String>, data: Value) -> Self {
        Self {
            step_index,
            tool_name: tool_name.into(),
            action: action.into(),
            status: StepStatus::Ok,
            data: Some(data),
            error_message: None,
            duration_ms: 0,
        }
    }

    pub fn error(
        step_index: usize,
        tool_name: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step_index,
            tool_name: tool_name.into(),
            action: action.into(),
            status: StepStatus::Error,
            data: None,
            error_message: Some(message.into()),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == StepStatus::Ok
    }
}

/// Ordered outcomes of one plan execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
}

impl Default for ExecutionReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, result: StepResult) {
        self.steps.push(result);
    }

    /// Result for a 1-based step index
    pub fn step(&self, step_index: usize) -> Option<&StepResult> {
        step_index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }

    /// e.g. "3 of 5 steps succeeded"
    pub fn summary(&self) -> String {
        format!("{} of {} steps succeeded", self.succeeded(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_result_ok() {
        let result = StepResult::ok(1, "KEGG", "get_pathway_id", json!({ "pathway_id": "hsa04210" }));
        assert!(result.is_ok());
        assert!(result.error_message.is_none());
        assert_eq!(result.data.unwrap()["pathway_id"], "hsa04210");
    }

    #[test]
    fn test_step_result_error_serialization() {
        let result = StepResult::error(2, "ClinVar", "search", "unknown tool/action").with_duration(3);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error_message"], "unknown tool/action");
        assert!(json.get("data").is_none());
        assert_eq!(json["duration_ms"], 3);
    }

    #[test]
    fn test_report_counts_and_summary() {
        let mut report = ExecutionReport::new();
        report.push(StepResult::ok(1, "KEGG", "get_pathway_id", json!({})));
        report.push(StepResult::error(2, "KEGG", "get_pathway_proteins", "boom"));
        report.push(StepResult::ok(3, "GO", "get_similar_genes", json!([])));

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.summary(), "2 of 3 steps succeeded");
    }

    #[test]
    fn test_report_step_lookup_is_one_based() {
        let mut report = ExecutionReport::new();
        report.push(StepResult::ok(1, "KEGG", "get_pathway_id", json!({})));
        assert_eq!(report.step(1).unwrap().step_index, 1);
        assert!(report.step(0).is_none());
        assert!(report.step(2).is_none());
    }
}
