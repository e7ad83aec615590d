//! Option categories and resolution results.

use std::rc::Rc;

use serde_json::Value;

use crate::axis::AxisKind;
use crate::series::SeriesSettings;

/// A configuration section to resolve, with the arguments its merger needs.
///
/// Categories without a dedicated merger resolve through the generic
/// theme-then-user merge under their [`Named`](Category::Named) key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Category<'a> {
    /// One argument axis instance.
    ArgumentAxis {
        user_options: Option<&'a Value>,
        rotated: bool,
    },
    /// One value axis instance.
    ValueAxis {
        user_options: Option<&'a Value>,
        rotated: bool,
    },
    /// The range selector's value axis: the generic merge of `valueAxis`.
    ValueAxisRangeSelector,
    /// One series instance. `series_count` feeds the palette.
    Series {
        user_options: &'a Value,
        series_count: usize,
    },
    /// Animation settings; booleans expand to `{ "enabled": <bool> }`.
    Animation,
    /// The series template; `nameField` defaults to `"series"`.
    SeriesTemplate,
    /// Any other category.
    Named(&'a str),
}

impl<'a> Category<'a> {
    /// Maps a plain category name to its category.
    ///
    /// Axes get no per-instance options and an unrotated chart. `"series"`
    /// needs per-instance options and therefore maps to the generic merger;
    /// use [`Category::Series`] to resolve an actual series.
    pub fn from_name(name: &'a str) -> Self {
        match name {
            "argumentAxis" => Category::ArgumentAxis {
                user_options: None,
                rotated: false,
            },
            "valueAxis" => Category::ValueAxis {
                user_options: None,
                rotated: false,
            },
            "valueAxisRangeSelector" => Category::ValueAxisRangeSelector,
            "animation" => Category::Animation,
            "seriesTemplate" => Category::SeriesTemplate,
            other => Category::Named(other),
        }
    }

    /// Axis kind, for the axis categories.
    pub fn axis_kind(&self) -> Option<AxisKind> {
        match self {
            Category::ArgumentAxis { .. } => Some(AxisKind::ArgumentAxis),
            Category::ValueAxis { .. } => Some(AxisKind::ValueAxis),
            _ => None,
        }
    }
}

/// The outcome of [`ThemeManager::get_options`](crate::ThemeManager::get_options).
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A resolved option tree. Memoized categories hand out the same `Rc`
    /// until the cache entry is invalidated.
    Options(Rc<Value>),
    /// Neither the theme nor the user options define the category.
    Missing,
    /// Settings for one series.
    Series(SeriesSettings),
}

impl Resolved {
    /// The option tree, if any. Series yield their merged options.
    pub fn into_options(self) -> Option<Rc<Value>> {
        match self {
            Resolved::Options(value) => Some(value),
            Resolved::Missing => None,
            Resolved::Series(settings) => Some(Rc::new(settings.options)),
        }
    }

    /// The series settings, for [`Category::Series`] results.
    pub fn into_series(self) -> Option<SeriesSettings> {
        match self {
            Resolved::Series(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }
}
