//! Data-source adapters
//!
//! Each registered tool is served by one `DataSource`. The executor only sees
//! the trait; the concrete sources talk to KEGG, the Gene Ontology services and
//! UniProt, or (for `Compare`) work purely in memory.

mod compare;
mod drugbank;
mod go;
mod http;
mod kegg;

pub use compare::CompareSource;
pub use drugbank::DrugBankSource;
pub use go::GoSource;
pub use http::HttpFetcher;
pub use kegg::KeggSource;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdapterError;
use crate::plan::ResolvedParams;

/// A tool implementation the executor can invoke
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Registry tool name this source serves
    fn tool_name(&self) -> &str;

    /// Run one action with already-typed parameters
    async fn invoke(&self, action: &str, params: &ResolvedParams) -> Result<Value, AdapterError>;
}

/// Upstream endpoints and limits for the built-in sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kegg_base_url: String,
    pub mygene_base_url: String,
    pub go_base_url: String,
    pub uniprot_base_url: String,
    /// Identifiers per KEGG `get`/`conv` request
    pub batch_size: usize,
    /// Genes fetched per GO term
    pub go_rows: usize,
    pub request_timeout_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kegg_base_url: "https://rest.kegg.jp".to_string(),
            mygene_base_url: "http://mygene.info/v3".to_string(),
            go_base_url: "http://api.geneontology.org/api".to_string(),
            uniprot_base_url: "https://rest.uniprot.org".to_string(),
            batch_size: 10,
            go_rows: 100,
            request_timeout_ms: 30000,
        }
    }
}

/// Data sources keyed by lower-cased tool name
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<String, Arc<dyn DataSource>>,
}

impl AdapterSet {
    /// Create an empty set (for custom source wiring)
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in KEGG, GO, DrugBank and Compare sources
    pub fn standard(settings: &SourceSettings) -> Result<Self, AdapterError> {
        let http = HttpFetcher::new(Duration::from_millis(settings.request_timeout_ms))?;

        Ok(Self::new()
            .with(Arc::new(KeggSource::new(
                http.clone(),
                &settings.kegg_base_url,
                settings.batch_size,
            )))
            .with(Arc::new(GoSource::new(
                http.clone(),
                &settings.mygene_base_url,
                &settings.go_base_url,
                settings.go_rows,
            )))
            .with(Arc::new(DrugBankSource::new(http, &settings.uniprot_base_url)))
            .with(Arc::new(CompareSource)))
    }

    pub fn register(&mut self, adapter: Arc<dyn DataSource>) {
        self.adapters
            .insert(adapter.tool_name().to_lowercase(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn DataSource>) -> Self {
        self.register(adapter);
        self
    }

    /// Case-insensitive lookup
    pub fn get(&self, tool_name: &str) -> Option<&Arc<dyn DataSource>> {
        self.adapters.get(&tool_name.trim().to_lowercase())
    }

    pub fn has_adapter(&self, tool_name: &str) -> bool {
        self.get(tool_name).is_some()
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.values().map(|a| a.tool_name()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSet")
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// Reject an action the source does not implement
pub(crate) fn unsupported(tool: &str, action: &str) -> AdapterError {
    AdapterError::UnsupportedAction(format!("{} has no action '{}'", tool, action))
}
