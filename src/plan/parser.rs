//! Pull a JSON plan out of free-text model output
//!
//! Models like to wrap their JSON in prose or code fences. The first `{` marks
//! the start of the object; exactly one JSON value is read from there and
//! anything after it is ignored.

use serde_json::Value;

use crate::error::PlanParseError;

/// Parse the first JSON object found in `text`
pub fn extract_json_object(text: &str) -> Result<Value, PlanParseError> {
    let start = text
        .find('{')
        .ok_or_else(|| PlanParseError::new("no JSON object found in model response", text))?;

    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(PlanParseError::new(format!("invalid JSON: {}", e), text)),
        None => Err(PlanParseError::new("no JSON object found in model response", text)),
    }
}

/// Extract the plan object and check it has a `steps` array
pub fn extract_plan_json(text: &str) -> Result<Value, PlanParseError> {
    let value = extract_json_object(text)?;
    match value.get("steps") {
        Some(Value::Array(_)) => Ok(value),
        Some(_) => Err(PlanParseError::new("'steps' is not an array", text)),
        None => Err(PlanParseError::new("JSON object has no 'steps' field", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_json() {
        let value = extract_plan_json(r#"{"steps": []}"#).unwrap();
        assert_eq!(value, json!({ "steps": [] }));
    }

    #[test]
    fn test_leading_prose() {
        let text = "Sure! Here is the plan you asked for:\n{\"steps\": [{\"tool_name\": \"GO\"}]}";
        let value = extract_plan_json(text).unwrap();
        assert_eq!(value["steps"][0]["tool_name"], "GO");
    }

    #[test]
    fn test_trailing_commentary_is_ignored() {
        let text = "Plan:\n```json\n{\"steps\": []}\n```\nLet me know if you need {more} help.";
        let value = extract_plan_json(text).unwrap();
        assert_eq!(value, json!({ "steps": [] }));
    }

    #[test]
    fn test_nested_braces_in_strings() {
        let text = r#"{"steps": [{"description": "use {braces} here", "parameters": {}}]} done"#;
        let value = extract_plan_json(text).unwrap();
        assert_eq!(value["steps"][0]["description"], "use {braces} here");
    }

    #[test]
    fn test_no_brace() {
        let err = extract_plan_json("I am unable to produce a plan for that.").unwrap_err();
        assert!(err.reason.contains("no JSON object"));
        assert_eq!(err.raw_response, "I am unable to produce a plan for that.");
    }

    #[test]
    fn test_truncated_json() {
        let err = extract_plan_json(r#"{"steps": [{"tool_name": "KEGG""#).unwrap_err();
        assert!(err.reason.starts_with("invalid JSON"));
    }

    #[test]
    fn test_missing_steps() {
        let err = extract_plan_json(r#"{"plan": []}"#).unwrap_err();
        assert!(err.reason.contains("no 'steps'"));
    }

    #[test]
    fn test_steps_not_array() {
        let err = extract_plan_json(r#"{"steps": "KEGG then GO"}"#).unwrap_err();
        assert!(err.reason.contains("not an array"));
    }

    #[test]
    fn test_first_object_wins() {
        let value = extract_json_object(r#"{"a": 1} {"b": 2}"#).unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }
}
