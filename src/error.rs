//! Error types for bioplan
//!
//! Centralized error handling using thiserror. Request-fatal errors
//! (`PlanParseError`, `LlmError`) and step-local errors (`PlanSchemaError`,
//! `AdapterError`) are separate types so the executor can keep the latter
//! inside a single step.

use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in bioplan
#[derive(Debug, Error)]
pub enum BioplanError {
    /// Tool registry construction or lookup failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The model response contained no usable plan
    #[error(transparent)]
    PlanParse(#[from] PlanParseError),

    /// The plan JSON did not have the expected shape
    #[error(transparent)]
    PlanSchema(#[from] PlanSchemaError),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Template or configuration problem
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bioplan operations
pub type Result<T> = std::result::Result<T, BioplanError>;

/// Problems building or querying the tool registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown action '{action}' for tool '{tool}'")]
    UnknownAction { tool: String, action: String },

    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("Duplicate action '{action}' in tool '{tool}'")]
    DuplicateAction { tool: String, action: String },

    #[error("Tool '{0}' declares no actions")]
    NoActions(String),

    #[error("Tool '{tool}' depends on unregistered tool '{depends_on}'")]
    UnknownDependency { tool: String, depends_on: String },

    #[error("Dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// The model's response could not be turned into a plan
#[derive(Debug, Clone, Error)]
#[error("Plan parse error: {reason}")]
pub struct PlanParseError {
    pub reason: String,
    /// Raw model output, kept for diagnostics
    pub raw_response: String,
}

impl PlanParseError {
    pub fn new(reason: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw_response: raw_response.into(),
        }
    }
}

/// Whole-plan shape errors. Per-step problems are `StepIssue`s instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanSchemaError {
    #[error("Plan is not a JSON object")]
    NotAnObject,

    #[error("Plan has no 'steps' field")]
    MissingSteps,

    #[error("Plan 'steps' is not an array")]
    StepsNotArray,
}

/// Why a single plan step cannot run. Recorded as that step's error result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepIssue {
    #[error("unknown tool/action: {0}")]
    Unresolved(#[from] RegistryError),

    #[error("parameter '{name}' must be a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("parameter '{name}' references step {from_step}; step {step} can only use earlier steps")]
    InvalidReference {
        name: String,
        from_step: usize,
        step: usize,
    },

    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    #[error("missing parameter: expected one of {}", .0.join(", "))]
    MissingAnyOf(Vec<String>),
}

/// Failures raised by data-source adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{0} returned an empty body")]
    EmptyBody(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}
