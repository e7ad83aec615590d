//! Theme documents and the base-theme collaborator.
//!
//! [`ThemeManager`](crate::ThemeManager) does not own raw theme data itself.
//! It holds a [`ThemeBase`], which supplies the theme section for the widget,
//! builds palettes, and takes part in initialization, refresh and disposal.
//! [`StaticTheme`] is the stock implementation backed by a YAML or JSON
//! document.
//!
//! # Documents
//!
//! A theme document maps widget sections to option trees, with an optional
//! document-wide `font`:
//!
//! ```yaml
//! font:
//!   family: "Segoe UI, Helvetica, sans-serif"
//!   color: "#767676"
//! chart:
//!   commonSeriesSettings:
//!     type: line
//!   commonAxisSettings:
//!     visible: true
//! pie:
//!   type: doughnut
//! rangeSelector:
//!   chart:
//!     commonSeriesSettings:
//!       type: area
//! ```
//!
//! Sections are addressed by dot-delimited paths (`"chart"`,
//! `"rangeSelector.chart"`). The last segment names the widget family.
//!
//! # Font Propagation
//!
//! When a section is initialized, the document font (overlaid with the
//! section's own `font`) is placed underneath every text element of the
//! widget family, so that `legend.font` only needs to state what differs.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ThemeError;
use crate::palette::{ExtensiblePalette, Palette, PaletteOptions};
use crate::tree::{empty_object, get_path, merge_all, merge_under_path};

const PIE_FONT_FIELDS: &[&str] = &[
    "legend.font",
    "title.font",
    "title.subtitle.font",
    "tooltip.font",
    "loadingIndicator.font",
    "export.font",
    "commonSeriesSettings.label.font",
];

const POLAR_FONT_FIELDS: &[&str] = &[
    "legend.font",
    "title.font",
    "title.subtitle.font",
    "tooltip.font",
    "loadingIndicator.font",
    "export.font",
    "commonSeriesSettings.label.font",
    "commonAxisSettings.label.font",
    "commonAxisSettings.title.font",
];

const CHART_FONT_FIELDS: &[&str] = &[
    "legend.font",
    "title.font",
    "title.subtitle.font",
    "tooltip.font",
    "loadingIndicator.font",
    "export.font",
    "commonSeriesSettings.label.font",
    "commonAxisSettings.label.font",
    "commonAxisSettings.title.font",
    "crosshair.label.font",
];

/// Text elements that inherit the theme font, per widget family.
pub fn font_fields(widget_type: &str) -> &'static [&'static str] {
    match widget_type {
        "pie" => PIE_FONT_FIELDS,
        "polar" => POLAR_FONT_FIELDS,
        "chart" => CHART_FONT_FIELDS,
        _ => &[],
    }
}

/// Returns the widget family of a section path: its last dot segment.
pub fn widget_type(section: &str) -> &str {
    section.rsplit('.').next().unwrap_or(section)
}

/// Supplier of raw theme data and palettes for a [`ThemeManager`](crate::ThemeManager).
pub trait ThemeBase {
    /// Selects and prepares the theme section the manager reads from.
    fn initialize_theme(&mut self, section: &str) -> Result<(), ThemeError>;

    /// The prepared theme section. Empty object before initialization.
    fn theme(&self) -> &Value;

    /// Builds a palette from a resolved `palette` option.
    fn create_palette(
        &self,
        palette_option: Option<&Value>,
        options: PaletteOptions,
    ) -> Result<Box<dyn Palette>, ThemeError>;

    /// Reloads theme data and re-prepares the current section.
    fn refresh(&mut self) -> Result<(), ThemeError>;

    /// Releases theme data.
    fn dispose(&mut self);
}

/// Document format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parses a YAML or JSON document into an option tree.
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    path: Option<&Path>,
) -> Result<Value, ThemeError> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ThemeError::Parse {
        path: path.map(Path::to_path_buf),
        message,
    })
}

/// Reads and parses a theme or options document from disk.
///
/// An empty file yields `null`.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, ThemeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ThemeError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    parse_document(&content, DocumentFormat::from_path(path), Some(path))
}

/// A theme document held in memory, optionally backed by a file.
#[derive(Debug, Clone)]
pub struct StaticTheme {
    /// Theme name (typically derived from the filename).
    name: Option<String>,
    /// Source file path (for refresh support).
    source_path: Option<PathBuf>,
    document: Value,
    section: Option<String>,
    /// The prepared section, fonts applied.
    theme: Value,
}

impl StaticTheme {
    /// Wraps an already-parsed document.
    pub fn from_value(document: Value) -> Self {
        Self {
            name: None,
            source_path: None,
            document,
            section: None,
            theme: empty_object(),
        }
    }

    /// Parses a YAML document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chart_theme::{StaticTheme, ThemeBase};
    ///
    /// let mut theme = StaticTheme::from_yaml(r#"
    /// chart:
    ///   commonSeriesSettings:
    ///     type: line
    /// "#).unwrap();
    /// theme.initialize_theme("chart").unwrap();
    /// assert_eq!(theme.theme()["commonSeriesSettings"]["type"], "line");
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ThemeError> {
        parse_document(yaml, DocumentFormat::Yaml, None).map(Self::from_value)
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        parse_document(json, DocumentFormat::Json, None).map(Self::from_value)
    }

    /// Loads a document from disk. The theme name is the file stem; the path
    /// is kept for [`refresh`](ThemeBase::refresh).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let document = load_document(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string());

        Ok(Self {
            name,
            source_path: Some(path.to_path_buf()),
            ..Self::from_value(document)
        })
    }

    /// Sets the name on this theme, returning `self` for chaining.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// The section selected by the last initialization.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// The whole document, all sections included.
    pub fn document(&self) -> &Value {
        &self.document
    }

    fn prepare(&self, section: &str) -> Value {
        let mut theme = get_path(&self.document, section)
            .filter(|v| v.is_object())
            .cloned()
            .unwrap_or_else(empty_object);

        let font = merge_all([self.document.get("font"), theme.get("font")]);
        if font.as_object().is_some_and(|f| !f.is_empty()) {
            for field in font_fields(widget_type(section)) {
                merge_under_path(&mut theme, field, &font);
            }
        }
        theme
    }
}

impl ThemeBase for StaticTheme {
    fn initialize_theme(&mut self, section: &str) -> Result<(), ThemeError> {
        self.theme = self.prepare(section);
        self.section = Some(section.to_string());
        Ok(())
    }

    fn theme(&self) -> &Value {
        &self.theme
    }

    fn create_palette(
        &self,
        palette_option: Option<&Value>,
        options: PaletteOptions,
    ) -> Result<Box<dyn Palette>, ThemeError> {
        Ok(Box::new(ExtensiblePalette::from_option(palette_option, options)?))
    }

    fn refresh(&mut self) -> Result<(), ThemeError> {
        if let Some(path) = &self.source_path {
            self.document = load_document(path)?;
        }
        if let Some(section) = self.section.clone() {
            self.initialize_theme(&section)?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.theme = empty_object();
        self.section = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "font": { "family": "Segoe UI", "size": 12, "color": "#767676" },
            "chart": {
                "legend": { "font": { "color": "#2b2b2b" } },
                "commonSeriesSettings": { "type": "line" }
            },
            "pie": { "font": { "size": 14 }, "type": "doughnut" },
            "rangeSelector": { "chart": { "commonSeriesSettings": { "type": "area" } } }
        })
    }

    #[test]
    fn test_widget_type_is_last_segment() {
        assert_eq!(widget_type("chart"), "chart");
        assert_eq!(widget_type("rangeSelector.chart"), "chart");
    }

    #[test]
    fn test_font_fields_nest() {
        assert_eq!(font_fields("pie").len(), 7);
        assert_eq!(font_fields("polar").len(), 9);
        assert_eq!(font_fields("chart").len(), 10);
        assert!(font_fields("sparkline").is_empty());
    }

    #[test]
    fn test_initialize_selects_section() {
        let mut theme = StaticTheme::from_value(document());
        theme.initialize_theme("chart").unwrap();
        assert_eq!(theme.section(), Some("chart"));
        assert_eq!(theme.theme()["commonSeriesSettings"]["type"], json!("line"));
    }

    #[test]
    fn test_initialize_nested_section() {
        let mut theme = StaticTheme::from_value(document());
        theme.initialize_theme("rangeSelector.chart").unwrap();
        assert_eq!(theme.theme()["commonSeriesSettings"]["type"], json!("area"));
        // chart family fonts apply to nested chart sections
        assert_eq!(theme.theme()["crosshair"]["label"]["font"]["size"], json!(12));
    }

    #[test]
    fn test_initialize_missing_section_is_empty() {
        let mut theme = StaticTheme::from_value(json!({ "chart": {} }));
        theme.initialize_theme("funnel").unwrap();
        assert_eq!(theme.theme(), &json!({}));
    }

    #[test]
    fn test_font_propagation_keeps_field_values() {
        let mut theme = StaticTheme::from_value(document());
        theme.initialize_theme("chart").unwrap();
        assert_eq!(
            theme.theme()["legend"]["font"],
            json!({ "family": "Segoe UI", "size": 12, "color": "#2b2b2b" })
        );
        assert_eq!(
            theme.theme()["commonAxisSettings"]["title"]["font"]["family"],
            json!("Segoe UI")
        );
    }

    #[test]
    fn test_font_propagation_uses_section_font() {
        let mut theme = StaticTheme::from_value(document());
        theme.initialize_theme("pie").unwrap();
        assert_eq!(theme.theme()["tooltip"]["font"]["size"], json!(14));
        // pie family has no axis fonts
        assert_eq!(theme.theme().get("commonAxisSettings"), None);
    }

    #[test]
    fn test_no_font_leaves_section_untouched() {
        let mut theme = StaticTheme::from_value(json!({ "chart": { "valueAxis": {} } }));
        theme.initialize_theme("chart").unwrap();
        assert_eq!(theme.theme(), &json!({ "valueAxis": {} }));
    }

    #[test]
    fn test_from_yaml_and_json() {
        let yaml = StaticTheme::from_yaml("chart:\n  palette: Ocean\n").unwrap();
        let json = StaticTheme::from_json(r#"{ "chart": { "palette": "Ocean" } }"#).unwrap();
        assert_eq!(yaml.document(), json.document());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = StaticTheme::from_yaml("chart: [");
        assert!(matches!(result, Err(ThemeError::Parse { path: None, .. })));
    }

    #[test]
    fn test_from_file_and_refresh() {
        use std::fs;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("generic-light.yaml");
        fs::write(&path, "chart:\n  palette: Office\n").unwrap();

        let mut theme = StaticTheme::from_file(&path).unwrap();
        assert_eq!(theme.name(), Some("generic-light"));
        assert_eq!(theme.source_path(), Some(path.as_path()));
        theme.initialize_theme("chart").unwrap();
        assert_eq!(theme.theme()["palette"], json!("Office"));

        fs::write(&path, "chart:\n  palette: Ocean\n").unwrap();
        theme.refresh().unwrap();
        assert_eq!(theme.theme()["palette"], json!("Ocean"));
    }

    #[test]
    fn test_from_file_json_extension() {
        use std::fs;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dark.json");
        fs::write(&path, r##"{ "chart": { "containerBackgroundColor": "#2a2a2a" } }"##).unwrap();

        let theme = StaticTheme::from_file(&path).unwrap();
        assert_eq!(
            theme.document()["chart"]["containerBackgroundColor"],
            json!("#2a2a2a")
        );
    }

    #[test]
    fn test_from_file_not_found() {
        let result = StaticTheme::from_file("/nonexistent/path/theme.yaml");
        assert!(matches!(result, Err(ThemeError::Load { .. })));
    }

    #[test]
    fn test_load_document_empty_file_is_null() {
        use tempfile::NamedTempFile;

        let file = NamedTempFile::new().unwrap();
        assert_eq!(load_document(file.path()).unwrap(), Value::Null);
    }

    #[test]
    fn test_create_palette() {
        let theme = StaticTheme::from_value(json!({}));
        let mut palette = theme
            .create_palette(Some(&json!(["#010203"])), PaletteOptions::default())
            .unwrap();
        assert_eq!(palette.next_color(1), "#010203");
    }

    #[test]
    fn test_dispose_clears_theme() {
        let mut theme = StaticTheme::from_value(document());
        theme.initialize_theme("chart").unwrap();
        theme.dispose();
        assert_eq!(theme.theme(), &json!({}));
        assert_eq!(theme.section(), None);
    }
}
