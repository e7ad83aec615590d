//! The theme manager: one entry point for resolved chart options.
//!
//! A [`ThemeManager`] combines three inputs:
//!
//! - the theme section supplied by its [`ThemeBase`]
//! - the user options handed to [`new`](ThemeManager::new) or
//!   [`update`](ThemeManager::update)
//! - per-instance options passed along with a [`Category`] (one axis, one
//!   series)
//!
//! and resolves them per category through [`get_options`](ThemeManager::get_options).
//!
//! ## Caching
//!
//! Whole-widget categories (anything resolved through the generic merger,
//! plus animation and the series template) are memoized: repeated calls hand
//! out the same [`Rc`] until [`refresh`](ThemeManager::refresh) clears the
//! cache or [`reset_options`](ThemeManager::reset_options) drops one entry.
//! Axis and series results depend on per-instance arguments and are computed
//! on every call.
//!
//! ## Threading
//!
//! Reads populate caches and draw palette colours, so every method takes
//! `&mut self` and the manager is neither `Send` nor `Sync`. Confine it to
//! one owner, or wrap it in a mutex.
//!
//! ## Example
//!
//! ```rust
//! use chart_theme::{AxisKind, StaticTheme, ThemeManager};
//! use serde_json::json;
//!
//! let theme = StaticTheme::from_value(json!({
//!     "chart": {
//!         "commonAxisSettings": { "visible": true },
//!         "horizontalAxis": {},
//!         "verticalAxis": { "position": "left" },
//!         "valueAxis": { "title": { "font": { "size": 10 } } },
//!         "legend": { "visible": true }
//!     }
//! }));
//! let user = json!({ "legend": { "visible": false } });
//! let mut manager = ThemeManager::new(theme, user, "chart").unwrap();
//!
//! let legend = manager.options("legend").unwrap().unwrap();
//! assert_eq!(legend["visible"], false);
//!
//! let axis = manager
//!     .axis_options(AxisKind::ValueAxis, Some(&json!({ "title": "Sales" })), false)
//!     .unwrap();
//! assert_eq!(axis["title"], json!({ "text": "Sales", "font": { "size": 10 } }));
//! assert_eq!(axis["position"], "left");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::axis::{merge_axis_options, AxisKind};
use crate::base::{widget_type, StaticTheme, ThemeBase};
use crate::category::{Category, Resolved};
use crate::error::ThemeError;
use crate::palette::{ExtensionMode, PaletteOptions};
use crate::series::{
    merge_series_options, ColorState, MainSeriesColor, PieColorHandle, SeriesContext,
    SeriesSettings,
};
use crate::tree::{empty_object, is_truthy, merge_all};

/// Mutable state released by [`ThemeManager::dispose`].
struct ManagerState {
    user_options: Value,
    merged: HashMap<String, Rc<Value>>,
    colors: Rc<RefCell<ColorState>>,
}

/// Resolves chart options from a theme and user overrides.
pub struct ThemeManager<B: ThemeBase = StaticTheme> {
    base: B,
    section: String,
    state: Option<ManagerState>,
    /// Invoked after every refresh, once theme and palette are rebuilt.
    /// Widgets query options while still constructing themselves, before
    /// they can install a real handler, so it starts out as a no-op.
    callback: Box<dyn FnMut()>,
}

impl<B: ThemeBase> ThemeManager<B> {
    /// Creates a manager for the theme section `section` (`"chart"`, `"pie"`,
    /// `"rangeSelector.chart"`, ...).
    ///
    /// `null` user options are treated as `{}`. The base is initialized for
    /// the section and the palette is created before this returns.
    ///
    /// # Errors
    ///
    /// Fails if the user options are not an object, if the base cannot
    /// initialize the section, or if the palette options are invalid.
    pub fn new(
        base: B,
        user_options: Value,
        section: impl Into<String>,
    ) -> Result<Self, ThemeError> {
        let mut manager = Self {
            base,
            section: section.into(),
            state: Some(ManagerState {
                user_options: root_options(user_options)?,
                merged: HashMap::new(),
                colors: Rc::new(RefCell::new(ColorState::default())),
            }),
            callback: Box::new(|| {}),
        };
        manager.initialize_theme()?;
        Ok(manager)
    }

    /// Prepares the base for this manager's section and rebuilds the palette.
    pub fn initialize_theme(&mut self) -> Result<(), ThemeError> {
        self.ensure_live()?;
        self.base.initialize_theme(&self.section)?;
        self.update_palette()
    }

    /// Resolves one category.
    ///
    /// This is the only read path. Besides returning the result it may fill
    /// the merge cache and, for series, draw a palette colour.
    pub fn get_options(&mut self, category: Category<'_>) -> Result<Resolved, ThemeError> {
        match category {
            Category::ArgumentAxis {
                user_options,
                rotated,
            } => self
                .merge_axis(AxisKind::ArgumentAxis, user_options, rotated)
                .map(|v| Resolved::Options(Rc::new(v))),
            Category::ValueAxis {
                user_options,
                rotated,
            } => self
                .merge_axis(AxisKind::ValueAxis, user_options, rotated)
                .map(|v| Resolved::Options(Rc::new(v))),
            Category::ValueAxisRangeSelector => self.merge_options("valueAxis", None, |_| {}),
            Category::Series {
                user_options,
                series_count,
            } => self
                .merge_series(user_options, series_count)
                .map(Resolved::Series),
            Category::Animation => self.merge_animation(),
            Category::SeriesTemplate => {
                self.merge_options("seriesTemplate", None, default_name_field)
            }
            // names with a dedicated merger must not reach the generic cache slot
            Category::Named(name) => match Category::from_name(name) {
                Category::Named(name) => self.merge_options(name, None, |_| {}),
                dedicated => self.get_options(dedicated),
            },
        }
    }

    /// Resolves a category by name. `None` when nothing defines it.
    pub fn options(&mut self, name: &str) -> Result<Option<Rc<Value>>, ThemeError> {
        self.get_options(Category::from_name(name))
            .map(Resolved::into_options)
    }

    /// Resolves one axis instance.
    pub fn axis_options(
        &mut self,
        kind: AxisKind,
        user_options: Option<&Value>,
        rotated: bool,
    ) -> Result<Value, ThemeError> {
        self.merge_axis(kind, user_options, rotated)
    }

    /// Resolves one series instance. `series_count` is the number of series
    /// in the widget, passed on to the palette.
    pub fn series_options(
        &mut self,
        user_options: &Value,
        series_count: usize,
    ) -> Result<SeriesSettings, ThemeError> {
        self.merge_series(user_options, series_count)
    }

    /// Replaces the user options wholesale.
    ///
    /// The merge cache is kept: categories resolved before the update keep
    /// returning their old result until [`refresh`](Self::refresh) or
    /// [`reset_options`](Self::reset_options) is called.
    pub fn update(&mut self, user_options: Value) -> Result<(), ThemeError> {
        let user_options = root_options(user_options)?;
        let state = self.state.as_mut().ok_or(ThemeError::Disposed)?;
        state.user_options = user_options;
        debug!(section = %self.section, "user options replaced");
        Ok(())
    }

    /// Clears the merge cache, reloads the base theme and rebuilds the
    /// palette, then runs the refresh callback.
    pub fn refresh(&mut self) -> Result<(), ThemeError> {
        let state = self.state.as_mut().ok_or(ThemeError::Disposed)?;
        state.merged.clear();
        self.base.refresh()?;
        self.update_palette()?;
        debug!(section = %self.section, "theme refreshed");
        (self.callback)();
        Ok(())
    }

    /// Drops the cached result of one category.
    pub fn reset_options(&mut self, name: &str) -> Result<(), ThemeError> {
        let state = self.state.as_mut().ok_or(ThemeError::Disposed)?;
        if state.merged.remove(name).is_some() {
            debug!(category = name, "cached options reset");
        }
        Ok(())
    }

    /// Restarts the palette sequence and forgets all pie slice colours.
    pub fn reset_palette(&mut self) -> Result<(), ThemeError> {
        let state = self.state.as_ref().ok_or(ThemeError::Disposed)?;
        state.colors.borrow_mut().reset()?;
        debug!(section = %self.section, "palette reset");
        Ok(())
    }

    /// Rebuilds the palette from the resolved `palette` and
    /// `paletteExtensionMode` options.
    pub fn update_palette(&mut self) -> Result<(), ThemeError> {
        let palette_option = self.options("palette")?;
        let extension_mode =
            ExtensionMode::from_option(self.options("paletteExtensionMode")?.as_deref());
        let palette = self.base.create_palette(
            palette_option.as_deref(),
            PaletteOptions {
                use_highlight: true,
                extension_mode,
            },
        )?;

        let state = self.state.as_ref().ok_or(ThemeError::Disposed)?;
        state.colors.borrow_mut().replace_palette(palette);
        debug!(palette = ?palette_option.as_deref(), ?extension_mode, "palette updated");
        Ok(())
    }

    /// Disposes the palette and releases user options and caches.
    ///
    /// Every later call fails with [`ThemeError::Disposed`], and so do pie
    /// colour handles handed out earlier. Disposing twice is a no-op.
    pub fn dispose(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        state.colors.borrow_mut().dispose();
        self.base.dispose();
        debug!(section = %self.section, "theme manager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }

    /// Installs the callback run after every [`refresh`](Self::refresh).
    pub fn set_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callback = Box::new(callback);
    }

    /// The theme section this manager reads from.
    pub fn theme(&self) -> &Value {
        self.base.theme()
    }

    pub fn user_options(&self) -> Result<&Value, ThemeError> {
        self.state
            .as_ref()
            .map(|s| &s.user_options)
            .ok_or(ThemeError::Disposed)
    }

    /// The section path, e.g. `"rangeSelector.chart"`.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// The widget family: last segment of the section path.
    pub fn widget_type(&self) -> &str {
        widget_type(&self.section)
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    fn ensure_live(&self) -> Result<(), ThemeError> {
        match self.state {
            Some(_) => Ok(()),
            None => Err(ThemeError::Disposed),
        }
    }

    /// The generic merger: theme and user values deep-merged when both are
    /// objects, otherwise the user value if set, otherwise the theme value.
    /// `finish` runs once per computed (not cached) result.
    fn merge_options(
        &mut self,
        name: &str,
        user_override: Option<Value>,
        finish: fn(&mut Value),
    ) -> Result<Resolved, ThemeError> {
        let state = self.state.as_mut().ok_or(ThemeError::Disposed)?;
        if let Some(hit) = state.merged.get(name) {
            trace!(category = name, "merge cache hit");
            return Ok(Resolved::Options(Rc::clone(hit)));
        }
        trace!(category = name, "merge cache miss");

        let theme = self.base.theme().get(name);
        let user = match &user_override {
            Some(value) => Some(value),
            None => state.user_options.get(name),
        };
        let mut result = match (theme, user) {
            (Some(theme @ Value::Object(_)), Some(user @ Value::Object(_))) => {
                merge_all([Some(theme), Some(user)])
            }
            _ => match user.filter(|u| !u.is_null()).or(theme) {
                Some(value) => value.clone(),
                None => return Ok(Resolved::Missing),
            },
        };
        finish(&mut result);

        let result = Rc::new(result);
        state.merged.insert(name.to_string(), Rc::clone(&result));
        Ok(Resolved::Options(result))
    }

    fn merge_animation(&mut self) -> Result<Resolved, ThemeError> {
        let state = self.state.as_ref().ok_or(ThemeError::Disposed)?;
        let user = match state.user_options.get("animation") {
            Some(value @ Value::Object(_)) => value.clone(),
            Some(value) if !value.is_null() => json!({ "enabled": is_truthy(Some(value)) }),
            _ => empty_object(),
        };
        self.merge_options("animation", Some(user), |_| {})
    }

    fn merge_axis(
        &mut self,
        kind: AxisKind,
        user_options: Option<&Value>,
        rotated: bool,
    ) -> Result<Value, ThemeError> {
        let state = self.state.as_ref().ok_or(ThemeError::Disposed)?;
        Ok(merge_axis_options(
            self.base.theme(),
            state.user_options.get("commonAxisSettings"),
            kind,
            user_options,
            rotated,
        ))
    }

    fn merge_series(
        &mut self,
        user_options: &Value,
        series_count: usize,
    ) -> Result<SeriesSettings, ThemeError> {
        let template_name_field = match self.get_options(Category::SeriesTemplate)? {
            Resolved::Options(template) if template.is_object() => {
                Some(template.get("nameField").cloned())
            }
            _ => None,
        };
        let resolve_labels_overlapping = self
            .options("resolveLabelsOverlapping")?
            .map(|v| Value::clone(&v));
        let container_background_color = self
            .options("containerBackgroundColor")?
            .map(|v| Value::clone(&v));
        let use_aggregation = self
            .options("useAggregation")?
            .is_some_and(|v| is_truthy(Some(&v)));

        let state = self.state.as_ref().ok_or(ThemeError::Disposed)?;
        let widget_type = widget_type(&self.section);
        let ctx = SeriesContext {
            theme: self.base.theme(),
            user_common: state.user_options.get("commonSeriesSettings"),
            widget_type,
            use_aggregation,
            container_background_color,
            resolve_labels_overlapping,
            template_name_field,
        };
        let mut options = merge_series_options(&ctx, user_options)?;

        let main_series_color = if widget_type == "pie" {
            MainSeriesColor::PerPoint(PieColorHandle::new(Rc::downgrade(&state.colors)))
        } else {
            let color = match options.get("color").filter(|c| is_truthy(Some(c))) {
                Some(color) => color.clone(),
                None => Value::String(state.colors.borrow_mut().next_color(series_count)?),
            };
            if let Some(map) = options.as_object_mut() {
                map.insert("mainSeriesColor".to_string(), color.clone());
            }
            MainSeriesColor::Fixed(color)
        };

        Ok(SeriesSettings {
            options,
            main_series_color,
        })
    }
}

/// Validates a root user options value; `null` becomes `{}`.
fn root_options(value: Value) -> Result<Value, ThemeError> {
    match value {
        Value::Null => Ok(empty_object()),
        Value::Object(_) => Ok(value),
        _ => Err(ThemeError::malformed("options", "an object")),
    }
}

fn default_name_field(template: &mut Value) {
    if let Some(map) = template.as_object_mut() {
        if !is_truthy(map.get("nameField")) {
            map.insert("nameField".to_string(), json!("series"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn manager(theme: Value, options: Value) -> ThemeManager {
        ThemeManager::new(StaticTheme::from_value(json!({ "chart": theme })), options, "chart")
            .unwrap()
    }

    #[test]
    fn test_new_rejects_non_object_options() {
        let result = ThemeManager::new(StaticTheme::from_value(json!({})), json!([1]), "chart");
        assert!(matches!(result, Err(ThemeError::MalformedOptions { .. })));
    }

    #[test]
    fn test_null_options_are_empty() {
        let m = manager(json!({}), Value::Null);
        assert_eq!(m.user_options().unwrap(), &json!({}));
    }

    #[test]
    fn test_generic_deep_merge() {
        let mut m = manager(
            json!({ "legend": { "visible": true, "font": { "size": 12, "color": "#333" } } }),
            json!({ "legend": { "font": { "size": 14 } } }),
        );
        let legend = m.options("legend").unwrap().unwrap();
        assert_eq!(
            *legend,
            json!({ "visible": true, "font": { "size": 14, "color": "#333" } })
        );
    }

    #[test]
    fn test_generic_scalar_prefers_user() {
        let mut m = manager(
            json!({ "rotated": false, "pointSelectionMode": "single" }),
            json!({ "rotated": true, "pointSelectionMode": null }),
        );
        assert_eq!(*m.options("rotated").unwrap().unwrap(), json!(true));
        // null is not a user value
        assert_eq!(
            *m.options("pointSelectionMode").unwrap().unwrap(),
            json!("single")
        );
    }

    #[test]
    fn test_named_dedicated_categories_use_their_merger() {
        let mut m = manager(
            json!({}),
            json!({ "animation": false, "seriesTemplate": { "customizeSeries": "x" } }),
        );
        let animation = m
            .get_options(Category::Named("animation"))
            .unwrap()
            .into_options()
            .unwrap();
        assert_eq!(*animation, json!({ "enabled": false }));
        let again = m.get_options(Category::Animation).unwrap().into_options().unwrap();
        assert!(Rc::ptr_eq(&animation, &again));

        let template = m
            .get_options(Category::Named("seriesTemplate"))
            .unwrap()
            .into_options()
            .unwrap();
        assert_eq!(template["nameField"], json!("series"));
        let settings = m.series_options(&json!({}), 1).unwrap();
        assert_eq!(settings.options["nameField"], json!("series"));
    }

    #[test]
    fn test_generic_missing() {
        let mut m = manager(json!({}), json!({}));
        assert!(m.options("nothing").unwrap().is_none());
        assert!(m.get_options(Category::Named("nothing")).unwrap().is_missing());
    }

    #[test]
    fn test_cache_identity_and_reset() {
        let mut m = manager(json!({ "legend": { "visible": true } }), json!({}));
        let first = m.options("legend").unwrap().unwrap();
        let second = m.options("legend").unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        m.reset_options("legend").unwrap();
        let third = m.options("legend").unwrap().unwrap();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn test_update_keeps_cache_until_refresh() {
        let mut m = manager(json!({ "legend": { "visible": true } }), json!({}));
        let before = m.options("legend").unwrap().unwrap();

        m.update(json!({ "legend": { "visible": false } })).unwrap();
        let stale = m.options("legend").unwrap().unwrap();
        assert!(Rc::ptr_eq(&before, &stale));

        m.refresh().unwrap();
        let fresh = m.options("legend").unwrap().unwrap();
        assert_eq!(fresh["visible"], json!(false));
    }

    #[test]
    fn test_animation_normalization() {
        let mut m = manager(
            json!({ "animation": { "enabled": true, "duration": 1000 } }),
            json!({ "animation": false }),
        );
        assert_eq!(
            *m.options("animation").unwrap().unwrap(),
            json!({ "enabled": false, "duration": 1000 })
        );

        let mut m = manager(json!({ "animation": { "duration": 1000 } }), json!({}));
        assert_eq!(
            *m.options("animation").unwrap().unwrap(),
            json!({ "duration": 1000 })
        );

        let mut m = manager(json!({}), json!({ "animation": 1 }));
        assert_eq!(
            *m.options("animation").unwrap().unwrap(),
            json!({ "enabled": true })
        );
    }

    #[test]
    fn test_series_template_default_name_field() {
        let mut m = manager(json!({}), json!({ "seriesTemplate": { "customizeSeries": "x" } }));
        let template = m.options("seriesTemplate").unwrap().unwrap();
        assert_eq!(template["nameField"], json!("series"));

        let mut m = manager(json!({}), json!({ "seriesTemplate": { "nameField": "year" } }));
        let template = m.options("seriesTemplate").unwrap().unwrap();
        assert_eq!(template["nameField"], json!("year"));

        let mut m = manager(json!({}), json!({}));
        assert!(m.options("seriesTemplate").unwrap().is_none());
    }

    #[test]
    fn test_value_axis_range_selector_uses_generic_merge() {
        let mut m = manager(
            json!({ "valueAxis": { "min": 0, "title": { "font": { "size": 10 } } } }),
            json!({ "valueAxis": { "max": 10 } }),
        );
        let resolved = m
            .get_options(Category::ValueAxisRangeSelector)
            .unwrap()
            .into_options()
            .unwrap();
        assert_eq!(
            *resolved,
            json!({ "min": 0, "max": 10, "title": { "font": { "size": 10 } } })
        );
        // shares the generic "valueAxis" cache slot
        let again = m
            .get_options(Category::ValueAxisRangeSelector)
            .unwrap()
            .into_options()
            .unwrap();
        assert!(Rc::ptr_eq(&resolved, &again));
    }

    #[test]
    fn test_axis_by_name_ignores_user_axis_options() {
        let mut m = manager(
            json!({ "verticalAxis": { "position": "left" }, "valueAxis": {} }),
            json!({ "valueAxis": { "position": "right" }, "commonAxisSettings": { "width": 3 } }),
        );
        let axis = m.options("valueAxis").unwrap().unwrap();
        assert_eq!(axis["position"], json!("left"));
        assert_eq!(axis["width"], json!(3));
    }

    #[test]
    fn test_series_uses_palette_unless_colored() {
        let mut m = manager(
            json!({ "palette": "Office", "commonSeriesSettings": { "type": "line" } }),
            json!({}),
        );
        let first = m.series_options(&json!({}), 2).unwrap();
        let colored = m.series_options(&json!({ "color": "#abcdef" }), 2).unwrap();
        let second = m.series_options(&json!({}), 2).unwrap();

        assert_eq!(first.options["mainSeriesColor"], json!("#5f8b95"));
        assert_eq!(colored.options["mainSeriesColor"], json!("#abcdef"));
        assert_eq!(second.options["mainSeriesColor"], json!("#ba4d51"));
    }

    #[test]
    fn test_series_stamps_widget_level_options() {
        let mut m = manager(
            json!({
                "containerBackgroundColor": "#ffffff",
                "resolveLabelsOverlapping": "hide",
                "useAggregation": true,
                "commonSeriesSettings": { "type": "line" }
            }),
            json!({ "seriesTemplate": { "nameField": "country" } }),
        );
        let settings = m.series_options(&json!({}), 1).unwrap();
        assert_eq!(settings.options["containerBackgroundColor"], json!("#ffffff"));
        assert_eq!(settings.options["resolveLabelsOverlapping"], json!("hide"));
        assert_eq!(settings.options["aggregation"]["enabled"], json!(true));
        assert_eq!(settings.options["nameField"], json!("country"));
        assert_eq!(settings.series_type(), "line");
    }

    #[test]
    fn test_refresh_runs_callback() {
        let calls = Rc::new(Cell::new(0));
        let mut m = manager(json!({}), json!({}));
        let counter = Rc::clone(&calls);
        m.set_callback(move || counter.set(counter.get() + 1));
        m.refresh().unwrap();
        m.refresh().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unknown_palette_fails_construction() {
        let result = ThemeManager::new(
            StaticTheme::from_value(json!({ "chart": { "palette": "Neon" } })),
            json!({}),
            "chart",
        );
        assert!(matches!(result, Err(ThemeError::UnknownPalette(_))));
    }

    #[test]
    fn test_user_palette_overrides_theme() {
        let mut m = manager(
            json!({ "palette": "Office" }),
            json!({ "palette": ["#010101", "#020202"] }),
        );
        let settings = m.series_options(&json!({}), 2).unwrap();
        assert_eq!(settings.options["mainSeriesColor"], json!("#010101"));
    }

    #[test]
    fn test_dispose_is_terminal() {
        let mut m = manager(json!({ "legend": {} }), json!({}));
        m.dispose();
        assert!(m.is_disposed());
        assert_eq!(m.options("legend").unwrap_err(), ThemeError::Disposed);
        assert_eq!(
            m.axis_options(AxisKind::ValueAxis, None, false).unwrap_err(),
            ThemeError::Disposed
        );
        assert_eq!(m.update(json!({})).unwrap_err(), ThemeError::Disposed);
        assert_eq!(m.refresh().unwrap_err(), ThemeError::Disposed);
        assert_eq!(m.reset_palette().unwrap_err(), ThemeError::Disposed);
        assert_eq!(m.user_options().unwrap_err(), ThemeError::Disposed);
        // second dispose is harmless
        m.dispose();
    }
}
