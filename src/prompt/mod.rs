//! Prompt System - planner instruction template and Handlebars rendering

mod planning;
mod render;

pub use planning::{OUTPUT_FORMAT, PLANNING_TEMPLATE, PlanningPrompt};
pub use render::PromptRenderer;
