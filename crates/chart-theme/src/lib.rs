//! # Chart Theme - Option Resolution for Chart Widgets
//!
//! `chart-theme` resolves the effective configuration of a chart widget by
//! layering a theme document, user options, and per-instance options.
//!
//! ## Core Concepts
//!
//! - [`ThemeManager`]: Per-widget entry point; resolves options by [`Category`]
//! - [`ThemeBase`]: Supplier of the theme section and palettes; [`StaticTheme`]
//!   is the stock YAML/JSON-backed implementation
//! - [`Category`] / [`Resolved`]: What to resolve, and what came back
//! - [`SeriesSettings`]: Merged series options plus the series colour
//! - [`palette`]: Sequential colour palettes
//! - [`tree`]: Deep merge and lookup helpers for option trees
//!
//! Option trees are [`serde_json::Value`]s. An absent key means "not set";
//! an explicit `null` is a value and replaces whatever lies beneath it.
//!
//! ## Quick Start
//!
//! ```rust
//! use chart_theme::{StaticTheme, ThemeManager};
//! use serde_json::json;
//!
//! let theme = StaticTheme::from_yaml(r#"
//! font:
//!   family: Segoe UI
//! chart:
//!   palette: Office
//!   commonSeriesSettings:
//!     type: line
//!     label:
//!       visible: false
//!   legend:
//!     visible: true
//! "#).unwrap();
//!
//! let mut manager = ThemeManager::new(theme, json!({}), "chart").unwrap();
//!
//! // Text elements inherit the document font.
//! let legend = manager.options("legend").unwrap().unwrap();
//! assert_eq!(legend["font"]["family"], "Segoe UI");
//!
//! // Series take their type from the common settings and a colour from the palette.
//! let series = manager.series_options(&json!({ "valueField": "sales" }), 1).unwrap();
//! assert_eq!(series.series_type(), "line");
//! assert_eq!(series.options["label"]["position"], "outside");
//! assert_eq!(series.options["mainSeriesColor"], "#5f8b95");
//! ```
//!
//! ## Merge Semantics
//!
//! Objects merge key by key, recursively. Arrays and scalars from a higher
//! layer replace the lower value wholesale. See [`tree::deep_merge`].

pub mod palette;
pub mod tree;

mod axis;
mod base;
mod category;
mod error;
mod manager;
mod series;

pub use axis::{merge_axis_options, normalize_axis_options, AxisKind, AxisPosition};
pub use base::{
    font_fields, load_document, parse_document, widget_type, DocumentFormat, StaticTheme,
    ThemeBase,
};
pub use category::{Category, Resolved};
pub use error::ThemeError;
pub use manager::ThemeManager;
pub use palette::{ExtensiblePalette, ExtensionMode, Palette, PaletteOptions};
pub use series::{MainSeriesColor, PieColorHandle, SeriesSettings, SeriesTraits};
