//! Axis option normalization and merging.
//!
//! Both axis categories share one merger. The chart orientation decides which
//! orientation defaults (`horizontalAxis` / `verticalAxis`) apply: the value
//! axis is vertical unless the chart is rotated, in which case the roles swap.
//!
//! Precedence, lowest first:
//!
//! 1. theme `commonAxisSettings`
//! 2. theme orientation defaults (`horizontalAxis` or `verticalAxis`)
//! 3. theme per-axis section (`argumentAxis` or `valueAxis`)
//! 4. user `commonAxisSettings`, normalized
//! 5. user per-axis options, normalized
//!
//! `workWeek` is resolved outside that chain: the user's per-axis value if
//! set, otherwise the theme's per-axis value.

use serde_json::{json, Value};
use tracing::warn;

use crate::tree::{as_numeric, is_truthy, merge_all};

/// Which of the two chart axes is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    /// The category/argument axis.
    ArgumentAxis,
    /// The value axis.
    ValueAxis,
}

impl AxisKind {
    /// The category name, also the theme/user section name.
    pub fn name(self) -> &'static str {
        match self {
            AxisKind::ArgumentAxis => "argumentAxis",
            AxisKind::ValueAxis => "valueAxis",
        }
    }
}

/// Screen orientation of an axis, naming the theme's orientation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisPosition {
    HorizontalAxis,
    VerticalAxis,
}

impl AxisPosition {
    /// Resolves the orientation of `kind` for a chart that is or isn't rotated.
    pub fn resolve(kind: AxisKind, rotated: bool) -> Self {
        if rotated ^ (kind == AxisKind::ValueAxis) {
            AxisPosition::VerticalAxis
        } else {
            AxisPosition::HorizontalAxis
        }
    }

    /// Theme section holding the defaults for this orientation.
    pub fn name(self) -> &'static str {
        match self {
            AxisPosition::HorizontalAxis => "horizontalAxis",
            AxisPosition::VerticalAxis => "verticalAxis",
        }
    }
}

/// Produces a normalized copy of a raw axis option fragment.
///
/// - Missing or non-object input yields `{}`
/// - A string `title` expands to `{ "text": <title> }`
/// - A logarithmic axis with a non-positive or non-numeric `logarithmBase`
///   loses the base and gains `logarithmBaseError: true`
/// - An explicit `label.alignment` stamps `label.userAlignment: true`
///
/// The input is never modified.
pub fn normalize_axis_options(options: Option<&Value>) -> Value {
    let Some(mut normalized) = options.filter(|v| v.is_object()).cloned() else {
        return json!({});
    };

    if let Some(text) = normalized.get("title").and_then(Value::as_str).map(str::to_owned) {
        normalized["title"] = json!({ "text": text });
    }

    if let Some(base) = rejected_logarithm_base(&normalized) {
        warn!(value = %base, "discarding invalid logarithm base");
        if let Some(map) = normalized.as_object_mut() {
            map.remove("logarithmBase");
            map.insert("logarithmBaseError".to_string(), Value::Bool(true));
        }
    }

    if let Some(label) = normalized.get_mut("label").and_then(Value::as_object_mut) {
        if is_truthy(label.get("alignment")) {
            label.insert("userAlignment".to_string(), Value::Bool(true));
        }
    }

    normalized
}

fn rejected_logarithm_base(options: &Value) -> Option<Value> {
    if options.get("type").and_then(Value::as_str) != Some("logarithmic") {
        return None;
    }
    let base = options.get("logarithmBase").filter(|b| !b.is_null())?;
    match as_numeric(base) {
        Some(n) if n > 0.0 => None,
        _ => Some(base.clone()),
    }
}

/// Merges the theme and user layers for one axis.
///
/// `user_common` is the user's `commonAxisSettings`; `user_axis` the options of
/// this particular axis instance.
pub fn merge_axis_options(
    theme: &Value,
    user_common: Option<&Value>,
    kind: AxisKind,
    user_axis: Option<&Value>,
    rotated: bool,
) -> Value {
    let position = AxisPosition::resolve(kind, rotated);
    let processed = normalize_axis_options(user_axis);
    let common = normalize_axis_options(user_common);
    let theme_axis = theme.get(kind.name());

    let mut merged = merge_all([
        theme.get("commonAxisSettings"),
        theme.get(position.name()),
        theme_axis,
        Some(&common),
        Some(&processed),
    ]);

    let work_week = processed
        .get("workWeek")
        .filter(|w| is_truthy(Some(w)))
        .or_else(|| theme_axis.and_then(|axis| axis.get("workWeek")))
        .cloned();
    if let Some(map) = merged.as_object_mut() {
        match work_week {
            Some(work_week) => map.insert("workWeek".to_string(), work_week),
            None => map.remove("workWeek"),
        };
    }

    merged
}
