//! Option tree primitives.
//!
//! Themes, user options and resolved settings are all plain
//! [`serde_json::Value`] trees. An absent key means "not set"; an explicit
//! `null` is a value like any other and wins on merge.
//!
//! # Deep Merge
//!
//! [`deep_merge`] layers one tree over another:
//!
//! - Object onto object: recurse key by key
//! - Anything else (arrays included): the source replaces the target wholesale
//!
//! ```rust
//! use chart_theme::tree::merge_all;
//! use serde_json::json;
//!
//! let theme = json!({ "label": { "font": { "size": 12 }, "visible": true } });
//! let user = json!({ "label": { "font": { "color": "#333" } } });
//!
//! let merged = merge_all([Some(&theme), Some(&user)]);
//! assert_eq!(merged, json!({
//!     "label": { "font": { "size": 12, "color": "#333" }, "visible": true }
//! }));
//! ```

use serde_json::{Map, Value};

/// Returns a fresh empty object.
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Merges `source` into `target`, with `source` winning on every leaf.
///
/// Both values are expected to be objects; when either is not, `target` is
/// replaced by a copy of `source`.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                if value.is_object() {
                    if let Some(existing) = target_map.get_mut(key) {
                        if existing.is_object() {
                            deep_merge(existing, value);
                            continue;
                        }
                    }
                }
                target_map.insert(key.clone(), value.clone());
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Folds `layers` into a new object, later layers winning.
///
/// Absent layers and layers that are not objects are skipped, so callers can
/// pass `theme.get("x")` lookups straight through.
pub fn merge_all<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut merged = empty_object();
    for layer in layers.into_iter().flatten() {
        if layer.is_object() {
            deep_merge(&mut merged, layer);
        }
    }
    merged
}

/// Truthiness as used by the `a || b` fallbacks of the merge rules.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy, as is an absent value.
/// Arrays and objects are always truthy, even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Returns the first truthy value.
pub fn first_truthy<'a, I>(candidates: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| is_truthy(Some(value)))
}

/// Interprets a value as a number: JSON numbers, or strings holding a finite
/// decimal number.
pub fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Lower-cases an enum-like option and strips spaces (`"Stacked Bar"` → `"stackedbar"`).
pub fn normalize_enum(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    raw.to_lowercase().replace(' ', "")
}

/// Looks up a dot-delimited path (`"title.subtitle.font"`).
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, key| node.get(key))
}

/// Places `defaults` underneath whatever sits at `path`, creating intermediate
/// objects as needed. Values already at `path` win over `defaults`.
pub fn merge_under_path(value: &mut Value, path: &str, defaults: &Value) {
    let mut node = value;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        let Value::Object(map) = node else {
            return;
        };
        if keys.peek().is_none() {
            let merged = merge_all([Some(defaults), map.get(key)]);
            map.insert(key.to_string(), merged);
            return;
        }
        let child = map.entry(key.to_string()).or_insert_with(empty_object);
        if !child.is_object() {
            *child = empty_object();
        }
        node = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deep_merge_recurses_objects() {
        let mut target = json!({ "a": { "b": 1, "c": 2 } });
        deep_merge(&mut target, &json!({ "a": { "c": 3, "d": 4 } }));
        assert_eq!(target, json!({ "a": { "b": 1, "c": 3, "d": 4 } }));
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut target = json!({ "workWeek": [1, 2, 3, 4, 5] });
        deep_merge(&mut target, &json!({ "workWeek": [0, 6] }));
        assert_eq!(target, json!({ "workWeek": [0, 6] }));
    }

    #[test]
    fn test_deep_merge_null_wins() {
        let mut target = json!({ "color": "#fff" });
        deep_merge(&mut target, &json!({ "color": null }));
        assert_eq!(target, json!({ "color": null }));
    }

    #[test]
    fn test_deep_merge_object_over_scalar() {
        let mut target = json!({ "title": "Sales" });
        deep_merge(&mut target, &json!({ "title": { "text": "Revenue" } }));
        assert_eq!(target, json!({ "title": { "text": "Revenue" } }));
    }

    #[test]
    fn test_merge_all_skips_missing_and_scalars() {
        let a = json!({ "x": 1 });
        let b = json!("not an object");
        let merged = merge_all([Some(&a), None, Some(&b)]);
        assert_eq!(merged, json!({ "x": 1 }));
    }

    #[test]
    fn test_merge_all_does_not_alias_inputs() {
        let a = json!({ "label": { "visible": true } });
        let mut merged = merge_all([Some(&a)]);
        merged["label"]["visible"] = json!(false);
        assert_eq!(a["label"]["visible"], json!(true));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(-1))));
    }

    #[test]
    fn test_first_truthy() {
        let empty = json!("");
        let bar = json!("bar");
        assert_eq!(first_truthy([None, Some(&empty), Some(&bar)]), Some(&bar));
        assert_eq!(first_truthy([None, Some(&empty)]), None);
    }

    #[test]
    fn test_as_numeric() {
        assert_eq!(as_numeric(&json!(10)), Some(10.0));
        assert_eq!(as_numeric(&json!("2.5")), Some(2.5));
        assert_eq!(as_numeric(&json!("ten")), None);
        assert_eq!(as_numeric(&json!(true)), None);
    }

    #[test]
    fn test_normalize_enum() {
        assert_eq!(normalize_enum(&json!("Stacked Bar")), "stackedbar");
        assert_eq!(normalize_enum(&json!("splineArea")), "splinearea");
    }

    #[test]
    fn test_get_path() {
        let v = json!({ "title": { "subtitle": { "font": { "size": 9 } } } });
        assert_eq!(get_path(&v, "title.subtitle.font.size"), Some(&json!(9)));
        assert_eq!(get_path(&v, "title.missing"), None);
    }

    #[test]
    fn test_merge_under_path_creates_and_preserves() {
        let mut v = json!({ "legend": { "font": { "size": 14 } } });
        let font = json!({ "family": "Segoe UI", "size": 12 });
        merge_under_path(&mut v, "legend.font", &font);
        merge_under_path(&mut v, "crosshair.label.font", &font);
        assert_eq!(
            v,
            json!({
                "legend": { "font": { "family": "Segoe UI", "size": 14 } },
                "crosshair": { "label": { "font": { "family": "Segoe UI", "size": 12 } } }
            })
        );
    }
}
