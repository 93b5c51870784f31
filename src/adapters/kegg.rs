//! KEGG REST adapter
//!
//! Endpoints used: `list/pathway/<org>`, `link/<org>/<pathway>`, `get/<ids>`
//! and `conv/uniprot/<ids>`. All of them answer in tab-separated or flat-file
//! text, parsed by the free functions below.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::plan::ResolvedParams;

use super::http::{HttpFetcher, join_url};
use super::{DataSource, unsupported};

const DEFAULT_ORGANISM: &str = "hsa";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayMatch {
    pub pathway_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Protein {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// First pathway in a `list/pathway` listing whose line mentions `name`
pub fn find_pathway(listing: &str, name: &str) -> Option<PathwayMatch> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    listing
        .lines()
        .filter(|line| line.to_lowercase().contains(&needle))
        .find_map(|line| {
            let (id, description) = line.split_once('\t')?;
            Some(PathwayMatch {
                pathway_id: id.trim().trim_start_matches("path:").to_string(),
                description: description.trim().to_string(),
            })
        })
}

/// Second column of every `link` line, deduplicated in order
pub fn parse_link_targets(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .filter_map(|line| line.split('\t').nth(1))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Gene symbols from a `get` flat-file response, keyed `<org>:<entry>`
pub fn parse_gene_records(text: &str, organism: &str) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    for record in text.split("///") {
        let mut entry = None;
        let mut symbol = None;
        let mut name = None;
        for line in record.lines() {
            if let Some(rest) = line.strip_prefix("ENTRY") {
                entry = rest.split_whitespace().next().map(String::from);
            } else if let Some(rest) = line.strip_prefix("SYMBOL") {
                symbol = first_symbol(rest);
            } else if let Some(rest) = line.strip_prefix("NAME") {
                name = first_symbol(rest.trim().trim_start_matches("(RefSeq)"));
            }
        }
        if let (Some(entry), Some(gene)) = (entry, symbol.or(name)) {
            names.insert(format!("{}:{}", organism, entry), gene);
        }
    }
    names
}

/// KEGG identifiers and organism codes go into URL paths; only
/// `[A-Za-z0-9:_.-]` is accepted
fn kegg_segment<'a>(what: &str, value: &'a str) -> Result<&'a str, AdapterError> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '-'));
    if valid {
        Ok(value)
    } else {
        Err(AdapterError::InvalidParameter(format!("invalid KEGG {} '{}'", what, value)))
    }
}

fn kegg_segments<'a>(what: &str, values: &'a [String]) -> Result<Vec<&'a str>, AdapterError> {
    values.iter().map(|value| kegg_segment(what, value)).collect()
}

fn first_symbol(text: &str) -> Option<String> {
    text.split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// `hsa:7157\tup:P04637` lines into a KEGG id to UniProt accession map
pub fn parse_conversion(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let (kegg, uniprot) = line.split_once('\t')?;
            let accession = uniprot.trim().strip_prefix("up:")?;
            Some((kegg.trim().to_string(), accession.to_string()))
        })
        .collect()
}

/// KEGG pathway and gene lookups
#[derive(Debug, Clone)]
pub struct KeggSource {
    http: HttpFetcher,
    base_url: String,
    batch_size: usize,
}

impl KeggSource {
    pub fn new(http: HttpFetcher, base_url: &str, batch_size: usize) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            batch_size: batch_size.max(1),
        }
    }

    pub async fn pathway_id(&self, name: &str, organism: &str) -> Result<PathwayMatch, AdapterError> {
        let organism = kegg_segment("organism", organism)?;
        let url = join_url(&self.base_url, &format!("list/pathway/{}", organism));
        let listing = self.http.get_text(&url, &[]).await?;
        find_pathway(&listing, name)
            .ok_or_else(|| AdapterError::NotFound(format!("no KEGG pathway matching '{}'", name)))
    }

    pub async fn pathway_genes(&self, pathway_id: &str, organism: &str) -> Result<Vec<String>, AdapterError> {
        let organism = kegg_segment("organism", organism)?;
        let pathway_id = kegg_segment("pathway id", pathway_id)?;
        let url = join_url(&self.base_url, &format!("link/{}/{}", organism, pathway_id));
        let text = self.http.get_text(&url, &[]).await?;
        let genes = parse_link_targets(&text);
        if genes.is_empty() {
            return Err(AdapterError::Malformed(format!(
                "no gene links in KEGG response for {}",
                pathway_id
            )));
        }
        Ok(genes)
    }

    /// Gene symbols for `gene_ids`. Batches KEGG cannot find are skipped.
    pub async fn gene_names(&self, gene_ids: &[String], organism: &str) -> Result<BTreeMap<String, String>, AdapterError> {
        let gene_ids = kegg_segments("gene id", gene_ids)?;
        let mut names = BTreeMap::new();
        for chunk in gene_ids.chunks(self.batch_size) {
            let url = join_url(&self.base_url, &format!("get/{}", chunk.join("+")));
            match self.http.get_text_optional(&url, &[]).await? {
                Some(text) => names.extend(parse_gene_records(&text, organism)),
                None => warn!(%url, "KEGG returned no gene records"),
            }
        }
        Ok(names)
    }

    pub async fn convert_to_uniprot(&self, gene_ids: &[String]) -> Result<Vec<(String, String)>, AdapterError> {
        let gene_ids = kegg_segments("gene id", gene_ids)?;
        let mut pairs = Vec::new();
        for chunk in gene_ids.chunks(self.batch_size) {
            let url = join_url(&self.base_url, &format!("conv/uniprot/{}", chunk.join("+")));
            match self.http.get_text_optional(&url, &[]).await? {
                Some(text) => pairs.extend(parse_conversion(&text)),
                None => warn!(%url, "KEGG returned no UniProt mapping"),
            }
        }
        Ok(pairs)
    }

    async fn pathway_proteins(&self, params: &ResolvedParams) -> Result<Value, AdapterError> {
        let organism = params.text("organism").unwrap_or(DEFAULT_ORGANISM);
        let pathway_id = match (params.text("pathway_id"), params.text("pathway_name")) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => self.pathway_id(name, organism).await?.pathway_id,
            (None, None) => {
                return Err(AdapterError::InvalidParameter(
                    "either 'pathway_id' or 'pathway_name' is required".to_string(),
                ));
            }
        };

        let genes = self.pathway_genes(&pathway_id, organism).await?;
        let names = self.gene_names(&genes, organism).await?;
        debug!(%pathway_id, genes = genes.len(), named = names.len(), "KEGG pathway proteins");

        let proteins: Vec<Protein> = genes
            .into_iter()
            .map(|id| Protein {
                name: names.get(&id).cloned(),
                id,
            })
            .collect();

        Ok(json!({
            "pathway_id": pathway_id,
            "protein_count": proteins.len(),
            "proteins": proteins,
        }))
    }
}

#[async_trait]
impl DataSource for KeggSource {
    fn tool_name(&self) -> &str {
        "KEGG"
    }

    async fn invoke(&self, action: &str, params: &ResolvedParams) -> Result<Value, AdapterError> {
        match action {
            "get_pathway_id" => {
                let name = params.require_text("pathway_name")?;
                let organism = params.text("organism").unwrap_or(DEFAULT_ORGANISM);
                let found = self.pathway_id(name, organism).await?;
                Ok(json!({
                    "pathway_id": found.pathway_id,
                    "description": found.description,
                }))
            }
            "get_pathway_proteins" => self.pathway_proteins(params).await,
            "convert_to_uniprot" => {
                let gene_ids = params.require_text_list("gene_ids")?;
                let pairs = self.convert_to_uniprot(gene_ids).await?;
                let uniprot_ids: Vec<&str> = pairs.iter().map(|(_, up)| up.as_str()).collect();
                let mapping: BTreeMap<&str, &str> = pairs
                    .iter()
                    .map(|(kegg, up)| (kegg.as_str(), up.as_str()))
                    .collect();
                Ok(json!({ "mapping": mapping, "uniprot_ids": uniprot_ids }))
            }
            other => Err(unsupported(self.tool_name(), other)),
        }
    }
}
