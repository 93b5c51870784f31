//! DrugBank cross-references via UniProt
//!
//! UniProtKB entries carry DrugBank cross-references whose `GenericName`
//! property is the drug name, so no DrugBank credentials are needed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::AdapterError;
use crate::plan::ResolvedParams;

use super::http::{HttpFetcher, join_url};
use super::{DataSource, unsupported};

const HUMAN_TAXON: &str = "9606";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrugLinks {
    pub targeted: bool,
    pub drugs: Vec<String>,
}

/// DrugBank generic names listed in a UniProtKB entry
pub fn drugbank_names(entry: &Value) -> Vec<String> {
    entry
        .get("uniProtKBCrossReferences")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|xref| xref.get("database").and_then(Value::as_str) == Some("DrugBank"))
        .flat_map(|xref| {
            xref.get("properties")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
        })
        .filter(|prop| prop.get("key").and_then(Value::as_str) == Some("GenericName"))
        .filter_map(|prop| prop.get("value").and_then(Value::as_str))
        .map(String::from)
        .collect()
}

/// Drug-target lookups backed by the UniProt REST API
#[derive(Debug, Clone)]
pub struct DrugBankSource {
    http: HttpFetcher,
    base_url: String,
}

impl DrugBankSource {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Reviewed human UniProt entry for a gene symbol, then its drugs
    pub async fn search_drug(&self, target: &str) -> Result<Value, AdapterError> {
        let url = join_url(&self.base_url, "uniprotkb/search");
        let query = format!("gene:{} AND organism_id:{} AND reviewed:true", target, HUMAN_TAXON);
        let body = self
            .http
            .get_json(&url, &[("query", query.as_str()), ("format", "json"), ("size", "1")])
            .await?;

        let entry = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|r| r.first())
            .ok_or_else(|| AdapterError::NotFound(format!("no reviewed UniProt entry for '{}'", target)))?;
        let accession = entry
            .get("primaryAccession")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::Malformed("UniProt entry has no primaryAccession".to_string()))?;
        let drugs = drugbank_names(entry);

        Ok(json!({
            "target": target,
            "uniprot_id": accession,
            "drugs": drugs,
        }))
    }

    /// Drug links for one accession. Unknown accessions count as untargeted.
    pub async fn drug_links(&self, accession: &str) -> Result<DrugLinks, AdapterError> {
        let url = join_url(&self.base_url, &format!("uniprotkb/{}.json", accession));
        let Some(entry) = self.http.get_json_optional(&url, &[]).await? else {
            debug!(%accession, "UniProt entry not found");
            return Ok(DrugLinks::default());
        };
        let drugs = drugbank_names(&entry);
        Ok(DrugLinks {
            targeted: !drugs.is_empty(),
            drugs,
        })
    }

    pub async fn check_drug_links(&self, accessions: &[String]) -> Result<Value, AdapterError> {
        let mut links = BTreeMap::new();
        let mut targeted = Vec::new();
        let mut untargeted = Vec::new();

        for accession in accessions {
            let found = self.drug_links(accession).await?;
            if found.targeted {
                targeted.push(accession.clone());
            } else {
                untargeted.push(accession.clone());
            }
            links.insert(accession.clone(), found);
        }

        Ok(json!({
            "links": links,
            "targeted": targeted,
            "untargeted": untargeted,
        }))
    }
}

#[async_trait]
impl DataSource for DrugBankSource {
    fn tool_name(&self) -> &str {
        "DrugBank"
    }

    async fn invoke(&self, action: &str, params: &ResolvedParams) -> Result<Value, AdapterError> {
        match action {
            "search_drug" => self.search_drug(params.require_text("target")?).await,
            "check_drug_links" => {
                self.check_drug_links(params.require_text_list("uniprot_ids")?)
                    .await
            }
            other => Err(unsupported(self.tool_name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ResolvedValue;
    use std::time::Duration;

    fn entry(accession: &str, drugs: &[&str]) -> Value {
        let xrefs: Vec<Value> = drugs
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "database": "DrugBank",
                    "id": format!("DB{:05}", i + 1),
                    "properties": [{ "key": "GenericName", "value": name }]
                })
            })
            .chain(std::iter::once(json!({ "database": "PDB", "id": "1A1U", "properties": [] })))
            .collect();
        json!({ "primaryAccession": accession, "uniProtKBCrossReferences": xrefs })
    }

    fn source(url: &str) -> DrugBankSource {
        DrugBankSource::new(HttpFetcher::new(Duration::from_secs(5)).unwrap(), url)
    }

    #[test]
    fn test_drugbank_names() {
        let e = entry("P10415", &["Venetoclax", "Navitoclax"]);
        assert_eq!(drugbank_names(&e), vec!["Venetoclax", "Navitoclax"]);
        assert!(drugbank_names(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn test_check_drug_links() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/uniprotkb/P10415.json")
            .with_body(entry("P10415", &["Venetoclax"]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/uniprotkb/Q07817.json")
            .with_body(entry("Q07817", &[]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/uniprotkb/XXXXXX.json")
            .with_status(404)
            .create_async()
            .await;

        let ids = vec!["P10415".to_string(), "Q07817".to_string(), "XXXXXX".to_string()];
        let params = ResolvedParams::new().with("uniprot_ids", ResolvedValue::TextList(ids));
        let out = source(&server.url())
            .invoke("check_drug_links", &params)
            .await
            .unwrap();

        assert_eq!(out["targeted"], json!(["P10415"]));
        assert_eq!(out["untargeted"], json!(["Q07817", "XXXXXX"]));
        assert_eq!(out["links"]["P10415"], json!({ "targeted": true, "drugs": ["Venetoclax"] }));
    }

    #[tokio::test]
    async fn test_search_drug() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/uniprotkb/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "query".into(),
                "gene:BCL2 AND organism_id:9606 AND reviewed:true".into(),
            ))
            .with_body(json!({ "results": [entry("P10415", &["Venetoclax"])] }).to_string())
            .create_async()
            .await;

        let params = ResolvedParams::new().with("target", ResolvedValue::Text("BCL2".into()));
        let out = source(&server.url()).invoke("search_drug", &params).await.unwrap();
        assert_eq!(out, json!({ "target": "BCL2", "uniprot_id": "P10415", "drugs": ["Venetoclax"] }));
    }

    #[tokio::test]
    async fn test_search_drug_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/uniprotkb/search")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"results": []}"#)
            .create_async()
            .await;

        let params = ResolvedParams::new().with("target", ResolvedValue::Text("NOPE".into()));
        let err = source(&server.url()).invoke("search_drug", &params).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/uniprotkb/P04637.json")
            .with_status(503)
            .create_async()
            .await;

        let err = source(&server.url()).drug_links("P04637").await.unwrap_err();
        assert!(matches!(err, AdapterError::Status { status: 503, .. }));
    }
}
