//! Built-in palettes, looked up by name.

use crate::tree::normalize_enum;
use serde_json::Value;

/// Palette used when the `palette` option is not set.
pub const DEFAULT_PALETTE: &str = "Material";

const PALETTES: &[(&str, &[&str])] = &[
    (
        "Material",
        &["#1db2f5", "#f5564a", "#97c95c", "#ffc720", "#eb3573", "#a63db8"],
    ),
    (
        "Soft Pastel",
        &["#60a69f", "#78b6d9", "#6682bb", "#a37182", "#eeba69"],
    ),
    (
        "Harmony Light",
        &["#fcb65e", "#679ec5", "#ad79ce", "#7abd5c", "#e18e92", "#b6d623", "#b7abea", "#85dbd5"],
    ),
    (
        "Pastel",
        &["#bb7862", "#70b3a1", "#bb626a", "#057d85", "#ab394b", "#dac599", "#153459", "#b1d2c6"],
    ),
    (
        "Bright",
        &["#70c92f", "#f8ca00", "#bd1550", "#e97f02", "#9d419c", "#7e4452", "#9ab57e", "#36a3a6"],
    ),
    (
        "Soft",
        &["#cbc87b", "#9ab57e", "#e55253", "#7e4452", "#e8c267", "#565077", "#6babac", "#ad6082"],
    ),
    (
        "Ocean",
        &["#75c099", "#acc371", "#378a8a", "#5fa26a", "#064970", "#38c5d2", "#00a7c6", "#6f84bb"],
    ),
    (
        "Office",
        &["#5f8b95", "#ba4d51", "#af8a53", "#955f71", "#859666", "#7e688c"],
    ),
    (
        "Vintage",
        &["#dea484", "#efc59c", "#cb715e", "#eb9692", "#a85c4c", "#f2c0b5", "#c96374", "#dd956c"],
    ),
    (
        "Violet",
        &["#d1a1d1", "#eeacc5", "#7b5685", "#7e7cad", "#a13d73", "#5b41ab", "#e287e2", "#689cc1"],
    ),
    (
        "Carmine",
        &["#fb7764", "#73d47f", "#fed85e", "#d47683", "#dde392", "#757ab2"],
    ),
    (
        "Dark Moon",
        &["#4ddac1", "#f4c99a", "#80dd9b", "#f998b3", "#4aaaa0", "#a5aef1"],
    ),
    (
        "Soft Blue",
        &["#7ab8eb", "#97da97", "#facb86", "#e78683", "#839bda", "#4db7be"],
    ),
    (
        "Dark Violet",
        &["#9c63ff", "#64c064", "#eead51", "#d2504b", "#4b6bbf", "#2da7b0"],
    ),
    (
        "Green Mist",
        &["#3cbab2", "#8ed962", "#5b9d95", "#efcc7c", "#f1929f", "#4d8dab"],
    ),
];

/// Finds a built-in palette by name, ignoring case and spaces.
pub fn lookup(name: &str) -> Option<&'static [&'static str]> {
    let wanted = normalize_enum(&Value::String(name.to_string()));
    PALETTES
        .iter()
        .find(|(candidate, _)| normalize_enum(&Value::String((*candidate).to_string())) == wanted)
        .map(|(_, colors)| *colors)
}

/// Names of all built-in palettes.
pub fn names() -> impl Iterator<Item = &'static str> {
    PALETTES.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        assert!(lookup("soft pastel").is_some());
        assert!(lookup("SoftPastel").is_some());
        assert_eq!(lookup("MATERIAL").map(|c| c[0]), Some("#1db2f5"));
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("neon").is_none());
    }

    #[test]
    fn test_all_builtin_colors_parse() {
        for name in names() {
            for color in lookup(name).unwrap() {
                assert!(Rgb::parse_hex(color).is_ok(), "{} in {}", color, name);
            }
        }
    }
}
