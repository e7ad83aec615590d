//! Sequential colour palettes.
//!
//! The theme manager only needs three things from a palette: draw the next
//! colour, restart the sequence, and release it. That is the [`Palette`]
//! trait. [`ExtensiblePalette`] is the default implementation, created from
//! the resolved `palette` and `paletteExtensionMode` options.
//!
//! ## Extension
//!
//! A palette has a fixed number of source colours. Once a chart draws more
//! than that, the palette extends itself according to its [`ExtensionMode`]:
//!
//! - `Alternate`: repeat the sources, each further cycle lighter or darker
//! - `Extrapolate`: repeat the sources, each further cycle lighter
//! - `Blend`: when `count` exceeds the sources, spread `count` colours over
//!   the sources by blending neighbours
//!
//! ```rust
//! use chart_theme::palette::{ExtensiblePalette, Palette, PaletteOptions};
//!
//! let mut palette = ExtensiblePalette::named("Office", PaletteOptions::default()).unwrap();
//! assert_eq!(palette.next_color(2), "#5f8b95");
//! assert_eq!(palette.next_color(2), "#ba4d51");
//! palette.reset();
//! assert_eq!(palette.next_color(2), "#5f8b95");
//! ```

mod builtin;
mod colorspace;

pub use builtin::{lookup as builtin_palette, names as builtin_palette_names, DEFAULT_PALETTE};
pub use colorspace::Rgb;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ThemeError;
use crate::tree::normalize_enum;

/// LAB lightness step between extension cycles.
const CYCLE_LIGHTNESS_STEP: f64 = 12.0;

/// Colour returned by a disposed or empty palette.
const NEUTRAL: Rgb = Rgb(0, 0, 0);

/// A stateful generator of sequential colours.
pub trait Palette {
    /// Returns the next colour in the sequence. `count` is the number of
    /// colours the caller expects to draw in total, which extension modes
    /// may use to spread colours out.
    fn next_color(&mut self, count: usize) -> String;

    /// Restarts the sequence from the first colour.
    fn reset(&mut self);

    /// Releases the palette. Later draws return a neutral colour.
    fn dispose(&mut self);
}

/// How a palette produces colours beyond its source colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionMode {
    #[default]
    Alternate,
    Blend,
    Extrapolate,
}

impl ExtensionMode {
    /// Reads a `paletteExtensionMode` option. Unknown or missing values fall
    /// back to [`ExtensionMode::Alternate`].
    pub fn from_option(value: Option<&Value>) -> Self {
        value
            .map(normalize_enum)
            .and_then(|mode| serde_json::from_value(Value::String(mode)).ok())
            .unwrap_or_default()
    }
}

/// Construction options for a palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteOptions {
    /// Extend with lighter cycles as well as darker ones.
    pub use_highlight: bool,
    pub extension_mode: ExtensionMode,
}

/// The default [`Palette`]: a list of source colours plus an extension mode.
#[derive(Debug, Clone)]
pub struct ExtensiblePalette {
    source: Vec<Rgb>,
    options: PaletteOptions,
    position: usize,
}

impl ExtensiblePalette {
    /// Creates a palette over explicit source colours.
    pub fn new(source: Vec<Rgb>, options: PaletteOptions) -> Self {
        Self {
            source,
            options,
            position: 0,
        }
    }

    /// Creates a palette from a built-in palette name.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::UnknownPalette`] when no built-in palette matches.
    pub fn named(name: &str, options: PaletteOptions) -> Result<Self, ThemeError> {
        let colors =
            builtin::lookup(name).ok_or_else(|| ThemeError::UnknownPalette(name.to_string()))?;
        let source = colors
            .iter()
            .map(|c| Rgb::parse_hex(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(source, options))
    }

    /// Creates a palette from the value of a `palette` option: a built-in
    /// palette name, or an array of hex colours. A missing option selects
    /// [`DEFAULT_PALETTE`].
    pub fn from_option(
        palette_option: Option<&Value>,
        options: PaletteOptions,
    ) -> Result<Self, ThemeError> {
        match palette_option {
            None | Some(Value::Null) => Self::named(DEFAULT_PALETTE, options),
            Some(Value::String(name)) => Self::named(name, options),
            Some(Value::Array(colors)) => {
                let source = colors
                    .iter()
                    .map(|c| match c {
                        Value::String(s) => Rgb::parse_hex(s),
                        other => Err(ThemeError::InvalidColor {
                            value: other.to_string(),
                            reason: "expected a hex color string".to_string(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::new(source, options))
            }
            Some(_) => Err(ThemeError::malformed(
                "palette",
                "a palette name or an array of colors",
            )),
        }
    }

    /// Number of source colours.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Returns true if the palette has no colours (never had any, or was disposed).
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn options(&self) -> PaletteOptions {
        self.options
    }

    fn color_at(&self, position: usize, count: usize) -> Rgb {
        let size = self.source.len();
        if size == 0 {
            return NEUTRAL;
        }

        match self.options.extension_mode {
            ExtensionMode::Blend if count > size => self.blended_at(position, count),
            ExtensionMode::Blend => self.source[position % size],
            ExtensionMode::Alternate | ExtensionMode::Extrapolate => {
                let base = self.source[position % size];
                match position / size {
                    0 => base,
                    cycle => base.shift_lightness(self.cycle_shift(cycle)),
                }
            }
        }
    }

    fn cycle_shift(&self, cycle: usize) -> f64 {
        let steps = match self.options.extension_mode {
            ExtensionMode::Extrapolate => cycle as f64,
            _ if self.options.use_highlight => {
                // lighter, darker, lighter again further out, ...
                let magnitude = cycle.div_ceil(2) as f64;
                if cycle % 2 == 1 {
                    magnitude
                } else {
                    -magnitude
                }
            }
            _ => -(cycle as f64),
        };
        steps * CYCLE_LIGHTNESS_STEP
    }

    /// Colour `position` of a `count`-long sequence that spreads the sources
    /// evenly and blends neighbours in between. Sources keep their slots when
    /// `count` is a multiple of the source size.
    fn blended_at(&self, position: usize, count: usize) -> Rgb {
        let size = self.source.len();
        let slot = (position % count) as f64 * size as f64 / count as f64;
        let index = (slot.floor() as usize).min(size - 1);
        let frac = slot - index as f64;
        let from = self.source[index];
        if frac < 1e-9 {
            from
        } else {
            from.blend(self.source[(index + 1) % size], frac)
        }
    }
}

impl Palette for ExtensiblePalette {
    fn next_color(&mut self, count: usize) -> String {
        let color = self.color_at(self.position, count);
        self.position += 1;
        color.to_hex()
    }

    fn reset(&mut self) {
        self.position = 0;
    }

    fn dispose(&mut self) {
        self.source.clear();
        self.position = 0;
    }
}
