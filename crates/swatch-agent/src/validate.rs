//! Turning raw model text back into a trustworthy token list.

use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use swatch_common::{Result, SwatchError};
use swatch_tokens::{categorize, Token, TokenCategory, TokenSet};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid fence regex"));

/// One element of the model's JSON array after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelItem {
    Valid(Token),
    Rejected(String),
}

/// Contents of the first fenced block, or the trimmed text when unfenced.
pub fn strip_code_fence(raw: &str) -> &str {
    let raw = raw.trim();
    match FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => raw,
    }
}

/// Parse the model text as a JSON array.
pub fn parse_model_array(raw: &str) -> Result<Vec<Value>> {
    let parsed: Value = serde_json::from_str(strip_code_fence(raw)).map_err(|_| {
        let preview: String = raw.trim().chars().take(200).collect();
        SwatchError::ModelResponse(format!("Failed to parse model response as JSON: {}", preview))
    })?;

    match parsed {
        Value::Array(items) => Ok(items),
        _ => Err(SwatchError::ModelResponse(
            "response is not a JSON array".to_string(),
        )),
    }
}

/// Check the shape of a single item. Name membership and duplicates are
/// decided by [`reconcile`], which sees the whole array.
pub fn classify(item: &Value) -> ModelItem {
    let field = |key: &str| item.get(key).and_then(Value::as_str);

    let (Some(name), Some(value), Some(category)) = (field("name"), field("value"), field("category"))
    else {
        return ModelItem::Rejected(format!("malformed item: {}", item));
    };

    let category = category
        .parse::<TokenCategory>()
        .unwrap_or_else(|_| categorize(name));

    ModelItem::Valid(Token {
        name: name.to_string(),
        value: value.to_string(),
        category,
        computed: None,
    })
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Exactly the base names, in base order.
    pub tokens: Vec<Token>,
    pub rejected: Vec<String>,
    /// Base names the model left out, filled from the base.
    pub backfilled: Vec<String>,
}

/// Validate model items against `base`: keep well-formed items whose name is
/// in the base (first occurrence wins), fill the rest from the base and
/// restore base order.
pub fn reconcile(base: &TokenSet, items: &[Value]) -> Reconciled {
    let base_names: HashSet<&str> = base.tokens.iter().map(|t| t.name.as_str()).collect();
    let mut accepted: HashMap<String, Token> = HashMap::new();
    let mut rejected = Vec::new();

    for item in items {
        match classify(item) {
            ModelItem::Valid(token) => {
                if !base_names.contains(token.name.as_str()) {
                    rejected.push(format!("unknown token {}", token.name));
                } else if accepted.contains_key(&token.name) {
                    rejected.push(format!("duplicate token {}", token.name));
                } else {
                    accepted.insert(token.name.clone(), token);
                }
            }
            ModelItem::Rejected(reason) => rejected.push(reason),
        }
    }

    let mut backfilled = Vec::new();
    let tokens = base
        .tokens
        .iter()
        .map(|original| match accepted.remove(&original.name) {
            Some(token) => token,
            None => {
                backfilled.push(original.name.clone());
                original.clone()
            }
        })
        .collect();

    Reconciled {
        tokens,
        rejected,
        backfilled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> TokenSet {
        TokenSet::extracted(
            "base",
            "Base",
            vec![
                Token::new("--color-canvas-default", "#ffffff"),
                Token::new("--color-fg-default", "#1f2328"),
                Token::new("--radius-2", "6px"),
            ],
        )
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("Here you go:\n```\n[]\n```\nDone"), "[]");
        assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
    }

    #[test]
    fn test_parse_errors() {
        let long = format!("not json {}", "x".repeat(500));
        match parse_model_array(&long).unwrap_err() {
            SwatchError::ModelResponse(msg) => {
                assert!(msg.starts_with("Failed to parse model response as JSON: not json"));
                assert!(msg.len() < 300);
            }
            other => panic!("unexpected error {other:?}"),
        }

        match parse_model_array("{\"name\": \"--a\"}").unwrap_err() {
            SwatchError::ModelResponse(msg) => assert_eq!(msg, "response is not a JSON array"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_classify() {
        let item = json!({"name": "--radius-2", "value": "0px", "category": "radius"});
        assert!(matches!(classify(&item), ModelItem::Valid(t) if t.value == "0px"));

        let item = json!({"name": "--radius-2", "value": 0, "category": "radius"});
        assert!(matches!(classify(&item), ModelItem::Rejected(_)));

        assert!(matches!(classify(&json!("--radius-2")), ModelItem::Rejected(_)));
    }

    #[test]
    fn test_unknown_category_is_rederived() {
        let item = json!({"name": "--radius-2", "value": "0px", "category": "corners"});
        match classify(&item) {
            ModelItem::Valid(token) => assert_eq!(token.category, TokenCategory::Radius),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reconcile_repairs_response() {
        let items = vec![
            json!({"name": "--radius-2", "value": "12px", "category": "radius"}),
            json!({"name": "--brand-new", "value": "#000", "category": "color"}),
            json!({"name": "--color-canvas-default", "value": "#0d1117", "category": "color"}),
            json!({"name": "--color-canvas-default", "value": "#ff00ff", "category": "color"}),
            json!({"value": "#fff"}),
        ];

        let out = reconcile(&base(), &items);
        let names: Vec<_> = out.tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["--color-canvas-default", "--color-fg-default", "--radius-2"]);
        let values: Vec<_> = out.tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["#0d1117", "#1f2328", "12px"]);
        assert_eq!(out.rejected.len(), 3);
        assert_eq!(out.backfilled, ["--color-fg-default"]);
    }
}
