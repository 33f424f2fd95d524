//! Flat param and query-param maps shared across the engine.
//!
//! Dynamic-segment params are always strings (URL segments are strings).
//! Query-param values are `serde_json::Value` so a handler can carry a
//! number, bool, or string through `queryParams` and still have `null`/
//! `false` behave as a sentinel that clears the key.

use std::collections::BTreeMap;

pub type Params = BTreeMap<String, String>;
pub type QueryParams = BTreeMap<String, serde_json::Value>;

/// True for `null` and `false` — the two sentinel values that remove a key
/// when merging query-param sources.
pub fn is_clearing_sentinel(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Null) || matches!(value, serde_json::Value::Bool(false))
}

/// Merge `overrides` on top of `base`, honoring sentinel clears, restricted
/// to `allow_list` keys. Mirrors the two-stage "first router state, then
/// request" merge used by both the HandlerInfo assembler and the
/// param serializer.
pub fn merge_allowed(
    base: &QueryParams,
    overrides: &QueryParams,
    allow_list: &[String],
) -> QueryParams {
    let mut merged = QueryParams::new();
    for key in allow_list {
        if let Some(v) = base.get(key) {
            if !is_clearing_sentinel(v) {
                merged.insert(key.clone(), v.clone());
            }
        }
    }
    for key in allow_list {
        if let Some(v) = overrides.get(key) {
            if is_clearing_sentinel(v) {
                merged.remove(key);
            } else {
                merged.insert(key.clone(), v.clone());
            }
        }
    }
    merged
}

/// Render a query-param value the way a URL query string would: numbers and
/// strings print bare, booleans print as `true`/`false`.
pub fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string().trim_matches('"').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clearing_sentinel_recognizes_null_and_false() {
        assert!(is_clearing_sentinel(&json!(null)));
        assert!(is_clearing_sentinel(&json!(false)));
        assert!(!is_clearing_sentinel(&json!(true)));
        assert!(!is_clearing_sentinel(&json!(0)));
        assert!(!is_clearing_sentinel(&json!("")));
    }

    #[test]
    fn merge_allowed_applies_overrides_then_clears() {
        let base: QueryParams = [("sort".to_string(), json!("asc")), ("page".to_string(), json!(1))]
            .into_iter()
            .collect();
        let overrides: QueryParams = [("sort".to_string(), json!(null)), ("page".to_string(), json!(2))]
            .into_iter()
            .collect();
        let allow = vec!["sort".to_string(), "page".to_string()];
        let merged = merge_allowed(&base, &overrides, &allow);
        assert_eq!(merged.get("page"), Some(&json!(2)));
        assert!(!merged.contains_key("sort"));
    }

    #[test]
    fn merge_allowed_ignores_keys_outside_allow_list() {
        let base: QueryParams = [("secret".to_string(), json!("x"))].into_iter().collect();
        let merged = merge_allowed(&base, &QueryParams::new(), &[]);
        assert!(merged.is_empty());
    }
}
