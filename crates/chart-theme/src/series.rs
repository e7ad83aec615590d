//! Series option resolution.
//!
//! Series settings are layered from, lowest first:
//!
//! 1. a scaffold `{ "aggregation": {} }`
//! 2. theme `commonSeriesSettings`
//! 3. theme `commonSeriesSettings.<type>`
//! 4. user `commonSeriesSettings`
//! 5. user `commonSeriesSettings.<type>`
//! 6. the series' own options
//!
//! Bar and bubble series fold layers 4 and 5 into their own options first,
//! flatten a nested `point` object into the series, and keep the caller's
//! `visible` flag as given.
//!
//! On top of the merged tree the resolver stamps `type`, `widgetType`,
//! `containerBackgroundColor`, `resolveLabelsOverlapping`,
//! `aggregation.enabled`, and, when a series template is configured,
//! `nameField`. Line, non-range area and scatter series always place labels
//! `outside`.
//!
//! The series colour is not part of the merge; see [`MainSeriesColor`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Weak;

use serde_json::{json, Map, Value};

use crate::error::ThemeError;
use crate::palette::Palette;
use crate::tree::{deep_merge, empty_object, first_truthy, is_truthy, merge_all, normalize_enum};

/// Shape flags derived from a normalized series type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesTraits {
    pub bar: bool,
    pub line: bool,
    pub area: bool,
    pub bubble: bool,
}

impl SeriesTraits {
    /// Classifies a normalized type name (`"stackedbar"`, `"splinearea"`, ...).
    pub fn classify(series_type: &str) -> Self {
        Self {
            bar: series_type.contains("bar"),
            line: series_type.contains("line"),
            area: series_type.contains("area"),
            bubble: series_type == "bubble",
        }
    }

    /// Whether labels of this series are always drawn outside the points.
    pub fn forces_outside_labels(self, series_type: &str) -> bool {
        self.line || (self.area && series_type != "rangearea") || series_type == "scatter"
    }
}

/// Resolved settings for one series.
#[derive(Debug, Clone)]
pub struct SeriesSettings {
    /// The merged option tree with synthesized fields.
    pub options: Value,
    pub main_series_color: MainSeriesColor,
}

impl SeriesSettings {
    /// The normalized series type.
    pub fn series_type(&self) -> &str {
        self.options
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// The main colour of a series.
///
/// Most widgets colour a whole series at once, so the colour is drawn while
/// resolving. Pie slices are coloured per point, so pie series get a handle
/// that draws lazily once the argument and index of a point are known.
#[derive(Debug, Clone)]
pub enum MainSeriesColor {
    /// The series' explicit `color`, or a colour drawn from the palette.
    Fixed(Value),
    /// Per-point colours for pie-like widgets.
    PerPoint(PieColorHandle),
}

impl MainSeriesColor {
    /// The colour for a point. Fixed colours ignore the arguments.
    pub fn resolve(
        &self,
        argument: impl fmt::Display,
        index: usize,
        count: usize,
    ) -> Result<Value, ThemeError> {
        match self {
            MainSeriesColor::Fixed(color) => Ok(color.clone()),
            MainSeriesColor::PerPoint(handle) => {
                handle.resolve(argument, index, count).map(Value::String)
            }
        }
    }
}

/// Palette plus the per-slice colour memo, owned by one manager.
#[derive(Default)]
pub(crate) struct ColorState {
    palette: Option<Box<dyn Palette>>,
    pie_colors: HashMap<String, String>,
}

impl ColorState {
    pub(crate) fn next_color(&mut self, count: usize) -> Result<String, ThemeError> {
        let palette = self
            .palette
            .as_mut()
            .ok_or(ThemeError::PaletteNotInitialized)?;
        Ok(palette.next_color(count))
    }

    fn pie_color(&mut self, key: String, count: usize) -> Result<String, ThemeError> {
        if let Some(color) = self.pie_colors.get(&key) {
            return Ok(color.clone());
        }
        let color = self.next_color(count)?;
        self.pie_colors.insert(key, color.clone());
        Ok(color)
    }

    pub(crate) fn replace_palette(&mut self, palette: Box<dyn Palette>) {
        if let Some(mut previous) = self.palette.replace(palette) {
            previous.dispose();
        }
    }

    pub(crate) fn reset(&mut self) -> Result<(), ThemeError> {
        let palette = self
            .palette
            .as_mut()
            .ok_or(ThemeError::PaletteNotInitialized)?;
        palette.reset();
        self.pie_colors.clear();
        Ok(())
    }

    pub(crate) fn dispose(&mut self) {
        if let Some(mut palette) = self.palette.take() {
            palette.dispose();
        }
        self.pie_colors.clear();
    }
}

/// Lazily assigns pie slice colours, memoized by `(argument, index)`.
///
/// The handle refers back to the colour state of the manager that produced
/// it. Once that manager is disposed or dropped, [`resolve`](Self::resolve)
/// fails with [`ThemeError::Disposed`].
#[derive(Clone)]
pub struct PieColorHandle {
    state: Weak<RefCell<ColorState>>,
}

impl PieColorHandle {
    pub(crate) fn new(state: Weak<RefCell<ColorState>>) -> Self {
        Self { state }
    }

    /// Returns the colour of the slice at `index` for `argument`, drawing a
    /// new palette colour the first time the pair is seen.
    pub fn resolve(
        &self,
        argument: impl fmt::Display,
        index: usize,
        count: usize,
    ) -> Result<String, ThemeError> {
        let state = self.state.upgrade().ok_or(ThemeError::Disposed)?;
        let mut state = state.borrow_mut();
        state.pie_color(format!("{}-{}", argument, index), count)
    }
}

impl fmt::Debug for PieColorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PieColorHandle")
            .field("live", &(self.state.strong_count() > 0))
            .finish()
    }
}

/// Everything the series merge reads besides the series' own options.
pub(crate) struct SeriesContext<'a> {
    pub theme: &'a Value,
    pub user_common: Option<&'a Value>,
    pub widget_type: &'a str,
    pub use_aggregation: bool,
    pub container_background_color: Option<Value>,
    pub resolve_labels_overlapping: Option<Value>,
    /// `nameField` of the configured series template, if there is one.
    pub template_name_field: Option<Option<Value>>,
}

/// Merges the option layers of one series and stamps synthesized fields.
/// Colour assignment is left to the caller.
pub(crate) fn merge_series_options(
    ctx: &SeriesContext<'_>,
    user: &Value,
) -> Result<Value, ThemeError> {
    let mut user_options = match user {
        Value::Null => empty_object(),
        Value::Object(_) => user.clone(),
        _ => return Err(ThemeError::malformed("series", "an object")),
    };
    let theme_common = ctx.theme.get("commonSeriesSettings");
    let mut user_common = ctx
        .user_common
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(empty_object);

    let theme_type = (ctx.widget_type == "pie")
        .then(|| ctx.theme.get("type"))
        .flatten();
    let series_type = first_truthy([
        user_options.get("type"),
        user_common.get("type"),
        theme_common.and_then(|c| c.get("type")),
        theme_type,
    ])
    .map(normalize_enum)
    .unwrap_or_default();
    let traits = SeriesTraits::classify(&series_type);

    if traits.bar || traits.bubble {
        let mut folded = merge_all([
            Some(&user_common),
            user_common.get(&series_type),
            Some(&user_options),
        ]);
        let visible = folded.get("visible").cloned();
        if let Some(point) = folded.get("point").filter(|p| p.is_object()).cloned() {
            deep_merge(&mut folded, &point);
        }
        if let Some(map) = folded.as_object_mut() {
            match visible {
                Some(visible) => map.insert("visible".to_string(), visible),
                None => map.remove("visible"),
            };
        }
        user_options = folded;
        user_common = empty_object();
    }

    let scaffold = json!({ "aggregation": {} });
    let mut settings = merge_all([
        Some(&scaffold),
        theme_common,
        theme_common.and_then(|c| c.get(&series_type)),
        Some(&user_common),
        user_common.get(&series_type),
        Some(&user_options),
    ]);

    let explicit_aggregation = settings
        .get("aggregation")
        .and_then(|a| a.get("enabled"))
        .filter(|e| !e.is_null())
        .map(|e| is_truthy(Some(e)));
    let aggregation_enabled =
        ctx.widget_type == "chart" && explicit_aggregation.unwrap_or(ctx.use_aggregation);

    if let Some(map) = settings.as_object_mut() {
        stamp_synthesized(map, ctx, &series_type, traits, aggregation_enabled);
    }
    Ok(settings)
}

fn stamp_synthesized(
    map: &mut Map<String, Value>,
    ctx: &SeriesContext<'_>,
    series_type: &str,
    traits: SeriesTraits,
    aggregation_enabled: bool,
) {
    let aggregation = map.entry("aggregation").or_insert_with(empty_object);
    if !aggregation.is_object() {
        *aggregation = empty_object();
    }
    aggregation["enabled"] = Value::Bool(aggregation_enabled);

    map.insert("type".to_string(), Value::String(series_type.to_string()));
    map.insert(
        "widgetType".to_string(),
        Value::String(ctx.widget_type.to_string()),
    );
    for (key, value) in [
        ("containerBackgroundColor", &ctx.container_background_color),
        ("resolveLabelsOverlapping", &ctx.resolve_labels_overlapping),
    ] {
        match value {
            Some(value) => map.insert(key.to_string(), value.clone()),
            None => map.remove(key),
        };
    }

    if traits.forces_outside_labels(series_type) {
        if let Some(label) = map.get_mut("label").and_then(Value::as_object_mut) {
            label.insert("position".to_string(), json!("outside"));
        }
    }

    if let Some(name_field) = &ctx.template_name_field {
        match name_field {
            Some(name_field) => map.insert("nameField".to_string(), name_field.clone()),
            None => map.remove("nameField"),
        };
    }
}
