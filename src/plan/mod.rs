//! Plan model, generation, validation, execution and explanation
//!
//! Data flows generator -> validator -> executor; the explanation renderer
//! only looks at the plan itself.

mod executor;
mod explain;
mod generator;
mod params;
mod parser;
mod report;
mod types;
mod validator;

pub use executor::{DEFAULT_STEP_TIMEOUT, PlanExecutor};
pub use explain::{ExplanationRenderer, NO_STEPS_MESSAGE, default_rationales};
pub use generator::{GeneratedPlan, GeneratorSettings, PlanGenerator};
pub use params::{ResolvedParams, ResolvedValue};
pub use parser::{extract_json_object, extract_plan_json};
pub use report::{ExecutionReport, StepResult, StepStatus};
pub use types::{ParamValue, Plan, PlanStep, StepRef};
pub use validator::{BoundParam, BoundStep, PlanValidator};
