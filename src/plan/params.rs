//! Typed step parameters
//!
//! Literal plan values and back-referenced step outputs are coerced to the
//! `ParamKind` the action declares before an adapter ever sees them.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::AdapterError;
use crate::registry::ParamKind;

/// A parameter value after coercion to its declared kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Text(String),
    Integer(i64),
    TextList(Vec<String>),
}

impl ResolvedValue {
    /// Coerce a JSON value to `kind`. Returns `None` when the value is empty
    /// or cannot represent that kind.
    pub fn coerce(kind: ParamKind, value: &Value) -> Option<Self> {
        match kind {
            ParamKind::Text => coerce_text(value).map(Self::Text),
            ParamKind::Integer => coerce_integer(value).map(Self::Integer),
            ParamKind::TextList => coerce_list(value).map(Self::TextList),
        }
    }
}

/// Null, whitespace-only text, or a list holding nothing but blanks
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) if items.len() == 1 => scalar_text(&items[0]),
        other => scalar_text(other),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Null => continue,
                    Value::Object(_) | Value::Array(_) => return None,
                    scalar => out.extend(scalar_text(scalar)),
                }
            }
            (!out.is_empty()).then_some(out)
        }
        Value::String(s) => {
            let items: Vec<String> = s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            (!items.is_empty()).then_some(items)
        }
        Value::Number(_) | Value::Bool(_) => scalar_text(value).map(|s| vec![s]),
        _ => None,
    }
}

/// Parameters handed to a data source, keyed by declared name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedParams {
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ResolvedValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: ResolvedValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ResolvedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ResolvedValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn text_list(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name)? {
            ResolvedValue::TextList(items) => Some(items),
            _ => None,
        }
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AdapterError> {
        self.text(name)
            .ok_or_else(|| AdapterError::InvalidParameter(format!("'{}' must be a string", name)))
    }

    pub fn require_text_list(&self, name: &str) -> Result<&[String], AdapterError> {
        self.text_list(name).ok_or_else(|| {
            AdapterError::InvalidParameter(format!("'{}' must be a list of strings", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_text() {
        assert_eq!(
            ResolvedValue::coerce(ParamKind::Text, &json!(" apoptosis ")),
            Some(ResolvedValue::Text("apoptosis".into()))
        );
        assert_eq!(
            ResolvedValue::coerce(ParamKind::Text, &json!(42)),
            Some(ResolvedValue::Text("42".into()))
        );
        assert_eq!(
            ResolvedValue::coerce(ParamKind::Text, &json!(["hsa04210"])),
            Some(ResolvedValue::Text("hsa04210".into()))
        );
        assert_eq!(ResolvedValue::coerce(ParamKind::Text, &json!("  ")), None);
        assert_eq!(ResolvedValue::coerce(ParamKind::Text, &json!(["a", "b"])), None);
        assert_eq!(ResolvedValue::coerce(ParamKind::Text, &json!({"a": 1})), None);
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(
            ResolvedValue::coerce(ParamKind::Integer, &json!(3)),
            Some(ResolvedValue::Integer(3))
        );
        assert_eq!(
            ResolvedValue::coerce(ParamKind::Integer, &json!("5")),
            Some(ResolvedValue::Integer(5))
        );
        assert_eq!(ResolvedValue::coerce(ParamKind::Integer, &json!("three")), None);
        assert_eq!(ResolvedValue::coerce(ParamKind::Integer, &json!(2.5)), None);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!([null, ""])));
        assert!(!is_blank(&json!(["TP53"])));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!({})));
    }

    #[test]
    fn test_coerce_list() {
        assert_eq!(
            ResolvedValue::coerce(ParamKind::TextList, &json!(["TP53", 7157, null])),
            Some(ResolvedValue::TextList(vec!["TP53".into(), "7157".into()]))
        );
        assert_eq!(
            ResolvedValue::coerce(ParamKind::TextList, &json!("P04637, Q07817")),
            Some(ResolvedValue::TextList(vec!["P04637".into(), "Q07817".into()]))
        );
        assert_eq!(ResolvedValue::coerce(ParamKind::TextList, &json!([])), None);
        assert_eq!(ResolvedValue::coerce(ParamKind::TextList, &json!([null, " "])), None);
        assert_eq!(ResolvedValue::coerce(ParamKind::TextList, &json!([{"id": 1}])), None);
    }

    #[test]
    fn test_accessors() {
        let params = ResolvedParams::new()
            .with("pathway_id", ResolvedValue::Text("hsa04210".into()))
            .with("max_go_terms", ResolvedValue::Integer(3))
            .with("gene_ids", ResolvedValue::TextList(vec!["hsa:7157".into()]));

        assert_eq!(params.text("pathway_id"), Some("hsa04210"));
        assert_eq!(params.integer("max_go_terms"), Some(3));
        assert_eq!(params.text_list("gene_ids").unwrap().len(), 1);
        assert_eq!(params.text("max_go_terms"), None);
        assert!(params.require_text("missing").is_err());
        assert!(params.require_text_list("pathway_id").is_err());
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_serializes_untagged() {
        let params = ResolvedParams::new()
            .with("target", ResolvedValue::Text("TP53".into()))
            .with("ids", ResolvedValue::TextList(vec!["a".into()]));
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, json!({ "ids": ["a"], "target": "TP53" }));
    }
}
