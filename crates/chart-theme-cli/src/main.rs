//! `chart-theme`: resolve one option category from a theme document.
//!
//! ```text
//! chart-theme --theme light.yaml --options chart.json legend
//! chart-theme --theme light.yaml valueAxis --axis-options '{"title":"Sales"}' --rotated
//! chart-theme --theme light.yaml --section pie series --series '{}' --format yaml
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG`; `--verbose` raises the
//! default level to `debug`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chart_theme::{
    load_document, Category, MainSeriesColor, Resolved, SeriesSettings, StaticTheme, ThemeManager,
};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Placeholder printed for colours that are only assigned per pie slice.
const PER_POINT_COLOR: &str = "<per-point>";

/// Resolve chart options from a theme document and user options
#[derive(Debug, Parser)]
#[command(name = "chart-theme", version)]
struct Cli {
    /// Theme document (YAML, or JSON with a .json extension)
    #[arg(long)]
    theme: PathBuf,

    /// User options document
    #[arg(long)]
    options: Option<PathBuf>,

    /// Theme section, e.g. "chart", "pie" or "rangeSelector.chart"
    #[arg(long, default_value = "chart")]
    section: String,

    /// Category to resolve ("legend", "valueAxis", "series", ...)
    category: String,

    /// Options of the axis instance, as JSON
    #[arg(long, value_parser = parse_json)]
    axis_options: Option<Value>,

    /// Resolve axes for a rotated chart
    #[arg(long)]
    rotated: bool,

    /// Options of the series instance, as JSON (required for "series")
    #[arg(long, value_parser = parse_json)]
    series: Option<Value>,

    /// Number of series in the widget, passed to the palette
    #[arg(long, default_value_t = 1)]
    series_count: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn parse_json(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    print!("{}", run(&cli)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<String> {
    let theme = StaticTheme::from_file(&cli.theme)
        .with_context(|| format!("cannot read theme {}", cli.theme.display()))?;
    let user_options = match &cli.options {
        Some(path) => load_document(path)
            .with_context(|| format!("cannot read options {}", path.display()))?,
        None => Value::Null,
    };
    debug!(theme = ?theme.name(), section = %cli.section, category = %cli.category, "resolving");

    let mut manager = ThemeManager::new(theme, user_options, cli.section.as_str())?;
    let category = match cli.category.as_str() {
        "series" => Category::Series {
            user_options: cli
                .series
                .as_ref()
                .context("the series category requires --series")?,
            series_count: cli.series_count,
        },
        "argumentAxis" => Category::ArgumentAxis {
            user_options: cli.axis_options.as_ref(),
            rotated: cli.rotated,
        },
        "valueAxis" => Category::ValueAxis {
            user_options: cli.axis_options.as_ref(),
            rotated: cli.rotated,
        },
        name => Category::from_name(name),
    };

    let resolved = match manager.get_options(category)? {
        Resolved::Options(options) => Value::clone(&options),
        Resolved::Series(settings) => series_output(settings),
        Resolved::Missing => bail!(
            "category `{}` is defined by neither the theme nor the options",
            cli.category
        ),
    };
    manager.dispose();

    render(&resolved, cli.format)
}

fn series_output(settings: SeriesSettings) -> Value {
    let SeriesSettings {
        mut options,
        main_series_color,
    } = settings;
    if let (MainSeriesColor::PerPoint(_), Some(map)) = (&main_series_color, options.as_object_mut())
    {
        map.insert(
            "mainSeriesColor".to_string(),
            Value::String(PER_POINT_COLOR.to_string()),
        );
    }
    options
}

fn render(value: &Value, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value)? + "\n",
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}
