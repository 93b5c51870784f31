//! Bioplan - LLM-planned bioinformatics queries
//!
//! A question is turned into an ordered plan of tool calls by a language
//! model, the plan is executed step by step against KEGG, the Gene Ontology
//! services and UniProt, and the plan is narrated back as a short explanation.

pub mod adapters;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod plan;
pub mod prompt;
pub mod registry;

pub use error::{BioplanError, Result};
pub use pipeline::{QueryOutcome, QueryPipeline};
pub use plan::{ExecutionReport, Plan, PlanStep, StepResult};
pub use registry::ToolRegistry;
