//! In-memory list comparison

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::AdapterError;
use crate::plan::ResolvedParams;

use super::{DataSource, unsupported};

/// Set operations over identifier lists from earlier steps
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareSource;

fn key(item: &str) -> String {
    item.trim().to_lowercase()
}

/// Items of `a` (first spelling wins) whose key passes `keep`, sorted by key
fn select<'a>(a: &'a [String], keep: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut picked: BTreeMap<String, &str> = BTreeMap::new();
    for item in a {
        let k = key(item);
        if !k.is_empty() && keep(&k) {
            picked.entry(k).or_insert_with(|| item.trim());
        }
    }
    picked.into_values().collect()
}

pub fn intersect(a: &[String], b: &[String]) -> Vec<String> {
    let other: HashSet<String> = b.iter().map(|s| key(s)).collect();
    select(a, |k| other.contains(k)).into_iter().map(String::from).collect()
}

pub fn subtract(a: &[String], b: &[String]) -> Vec<String> {
    let other: HashSet<String> = b.iter().map(|s| key(s)).collect();
    select(a, |k| !other.contains(k)).into_iter().map(String::from).collect()
}

#[async_trait]
impl DataSource for CompareSource {
    fn tool_name(&self) -> &str {
        "Compare"
    }

    async fn invoke(&self, action: &str, params: &ResolvedParams) -> Result<Value, AdapterError> {
        let a = params.require_text_list("list_a")?;
        let b = params.require_text_list("list_b")?;
        let items = match action {
            "intersect_lists" => intersect(a, b),
            "subtract_lists" => subtract(a, b),
            other => return Err(unsupported(self.tool_name(), other)),
        };
        Ok(json!({ "count": items.len(), "items": items }))
    }
}
