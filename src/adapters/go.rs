//! Gene Ontology similarity adapter
//!
//! Resolves a gene symbol to its HGNC id through mygene.info, lists the GO
//! terms annotated to it, and collects the other genes annotated to the first
//! few of those terms.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::plan::ResolvedParams;

use super::http::{HttpFetcher, join_url};
use super::{DataSource, unsupported};

const DEFAULT_MAX_GO_TERMS: i64 = 3;

/// HGNC id (`HGNC:11998`) from a mygene.info query response
pub fn parse_hgnc_id(body: &Value) -> Option<String> {
    let hgnc = body.get("hits")?.as_array()?.first()?.get("HGNC")?;
    let id = match hgnc {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then(|| format!("HGNC:{}", id.trim_start_matches("HGNC:")))
}

/// Distinct GO term ids from a `bioentity/gene/<id>/function` response
pub fn parse_go_terms(body: &Value) -> Vec<String> {
    let mut seen = BTreeSet::new();
    associations(body)
        .filter_map(|a| a.get("object")?.get("id")?.as_str())
        .filter(|id| seen.insert(id.to_string()))
        .map(String::from)
        .collect()
}

/// Gene labels from a `bioentity/function/<term>/genes` response
pub fn parse_gene_labels(body: &Value) -> Vec<String> {
    associations(body)
        .filter_map(|a| a.get("subject")?.get("label")?.as_str())
        .map(String::from)
        .collect()
}

fn associations(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("associations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Functional similarity through shared GO annotations
#[derive(Debug, Clone)]
pub struct GoSource {
    http: HttpFetcher,
    mygene_base_url: String,
    go_base_url: String,
    rows: usize,
}

impl GoSource {
    pub fn new(http: HttpFetcher, mygene_base_url: &str, go_base_url: &str, rows: usize) -> Self {
        Self {
            http,
            mygene_base_url: mygene_base_url.to_string(),
            go_base_url: go_base_url.to_string(),
            rows,
        }
    }

    async fn hgnc_id(&self, gene: &str) -> Result<String, AdapterError> {
        let url = join_url(&self.mygene_base_url, "query");
        let body = self
            .http
            .get_json(&url, &[("q", gene), ("species", "human"), ("fields", "HGNC")])
            .await?;
        parse_hgnc_id(&body).ok_or_else(|| AdapterError::NotFound(format!("no HGNC id for gene '{}'", gene)))
    }

    async fn go_terms(&self, gene_id: &str) -> Result<Vec<String>, AdapterError> {
        let url = join_url(&self.go_base_url, &format!("bioentity/gene/{}/function", gene_id));
        let body = self.http.get_json(&url, &[]).await?;
        Ok(parse_go_terms(&body))
    }

    async fn genes_for_term(&self, term: &str) -> Result<Vec<String>, AdapterError> {
        let url = join_url(&self.go_base_url, &format!("bioentity/function/{}/genes", term));
        let rows = self.rows.to_string();
        let body = self
            .http
            .get_json(&url, &[("rows", rows.as_str()), ("facet", "false")])
            .await?;
        Ok(parse_gene_labels(&body))
    }

    pub async fn similar_genes(&self, gene: &str, max_terms: usize) -> Result<Value, AdapterError> {
        let hgnc_id = self.hgnc_id(gene).await?;
        let terms = self.go_terms(&hgnc_id).await?;
        let used: Vec<&String> = terms.iter().take(max_terms).collect();
        debug!(%gene, %hgnc_id, terms = terms.len(), expanded = used.len(), "GO terms");

        let mut similar = BTreeSet::new();
        for term in &used {
            match self.genes_for_term(term).await {
                Ok(genes) => similar.extend(genes),
                Err(e) => warn!(%term, error = %e, "skipping GO term"),
            }
        }
        similar.retain(|g: &String| !g.eq_ignore_ascii_case(gene));

        Ok(json!({
            "gene": gene,
            "hgnc_id": hgnc_id,
            "go_terms": used,
            "similar_genes": similar,
            "count": similar.len(),
        }))
    }
}

#[async_trait]
impl DataSource for GoSource {
    fn tool_name(&self) -> &str {
        "GO"
    }

    async fn invoke(&self, action: &str, params: &ResolvedParams) -> Result<Value, AdapterError> {
        match action {
            "get_similar_genes" => {
                let gene = params.require_text("gene_name")?;
                let max_terms = params.integer("max_go_terms").unwrap_or(DEFAULT_MAX_GO_TERMS);
                if max_terms < 1 {
                    return Err(AdapterError::InvalidParameter(format!(
                        "'max_go_terms' must be positive, got {}",
                        max_terms
                    )));
                }
                self.similar_genes(gene, max_terms as usize).await
            }
            other => Err(unsupported(self.tool_name(), other)),
        }
    }
}
