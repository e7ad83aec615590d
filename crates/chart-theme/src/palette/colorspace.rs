//! RGB colours and the CIE LAB operations palette extension relies on.
//!
//! Lightness shifts and blends are done in LAB rather than RGB so that
//! generated colours keep their hue and step evenly in perceived brightness.

use crate::error::ThemeError;

// ─── RGB type ───────────────────────────────────────────────────────────────

/// A simple RGB color triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rgb` or `#rrggbb` (the `#` is optional).
    pub fn parse_hex(value: &str) -> Result<Self, ThemeError> {
        let invalid = |reason: &str| ThemeError::InvalidColor {
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(invalid("not a hex color"));
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid("not a hex color"));

        match hex.len() {
            // 3-digit hex: #rgb -> #rrggbb
            3 => Ok(Rgb(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            6 => Ok(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid("must be 3 or 6 hex digits")),
        }
    }

    /// Formats as lower-case `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Moves the colour's LAB lightness by `delta` (−100..=100), keeping hue.
    pub fn shift_lightness(self, delta: f64) -> Rgb {
        let mut lab = rgb_to_lab(self);
        lab.l = (lab.l + delta).clamp(0.0, 100.0);
        lab_to_rgb(lab)
    }

    /// Interpolates towards `other` in LAB; `t = 0` is `self`, `t = 1` is `other`.
    pub fn blend(self, other: Rgb, t: f64) -> Rgb {
        let a = rgb_to_lab(self);
        let b = rgb_to_lab(other);
        lab_to_rgb(lerp_lab(t.clamp(0.0, 1.0), &a, &b))
    }
}

// ─── CIE LAB internals ─────────────────────────────────────────────────────

/// CIE LAB color, the space lightness shifts and blends operate in.
#[derive(Debug, Clone, Copy)]
struct Lab {
    l: f64,
    a: f64,
    b: f64,
}

/// D65 reference white point for CIE XYZ → LAB conversion.
const XN: f64 = 0.95047;
const YN: f64 = 1.00000;
const ZN: f64 = 1.08883;

/// Convert an sRGB component (0–255) to linear light (0.0–1.0).
fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a linear light value (0.0–1.0) to sRGB (0–255), clamped.
fn linear_to_srgb(c: f64) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let s = if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round() as u8
}

/// LAB forward transform helper.
fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// LAB inverse transform helper.
fn lab_f_inv(t: f64) -> f64 {
    if t > 0.206896 {
        t * t * t
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// Convert an [`Rgb`] value to CIE LAB via XYZ (D65 illuminant).
fn rgb_to_lab(rgb: Rgb) -> Lab {
    let r = srgb_to_linear(rgb.0);
    let g = srgb_to_linear(rgb.1);
    let b = srgb_to_linear(rgb.2);

    // sRGB → XYZ (D65) using the standard matrix
    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert a CIE LAB value back to [`Rgb`] via XYZ (D65 illuminant).
fn lab_to_rgb(lab: Lab) -> Rgb {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = lab.a / 500.0 + fy;
    let fz = fy - lab.b / 200.0;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    // XYZ → linear RGB (D65)
    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    Rgb(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}

/// Linearly interpolate between two LAB colors.
fn lerp_lab(t: f64, a: &Lab, b: &Lab) -> Lab {
    Lab {
        l: a.l + t * (b.l - a.l),
        a: a.a + t * (b.a - a.a),
        b: a.b + t * (b.b - a.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luminance(c: Rgb) -> u32 {
        c.0 as u32 + c.1 as u32 + c.2 as u32
    }

    #[test]
    fn test_parse_hex_six_digits() {
        assert_eq!(Rgb::parse_hex("#1db2f5").unwrap(), Rgb(0x1d, 0xb2, 0xf5));
        assert_eq!(Rgb::parse_hex("1DB2F5").unwrap(), Rgb(0x1d, 0xb2, 0xf5));
    }

    #[test]
    fn test_parse_hex_three_digits() {
        assert_eq!(Rgb::parse_hex("#fff").unwrap(), Rgb(255, 255, 255));
        assert_eq!(Rgb::parse_hex("#a0c").unwrap(), Rgb(0xaa, 0x00, 0xcc));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert!(matches!(
            Rgb::parse_hex("#12345"),
            Err(ThemeError::InvalidColor { .. })
        ));
        assert!(Rgb::parse_hex("#gggggg").is_err());
        assert!(Rgb::parse_hex("red").is_err());
    }

    #[test]
    fn test_to_hex_lowercase() {
        assert_eq!(Rgb(0xAB, 0x01, 0xFF).to_hex(), "#ab01ff");
    }

    #[test]
    fn test_lab_roundtrip_is_stable() {
        for color in [Rgb(0, 0, 0), Rgb(255, 255, 255), Rgb(29, 178, 245)] {
            let back = lab_to_rgb(rgb_to_lab(color));
            assert!((back.0 as i16 - color.0 as i16).abs() <= 1);
            assert!((back.1 as i16 - color.1 as i16).abs() <= 1);
            assert!((back.2 as i16 - color.2 as i16).abs() <= 1);
        }
    }

    #[test]
    fn test_shift_lightness_direction() {
        let base = Rgb(29, 178, 245);
        assert!(luminance(base.shift_lightness(15.0)) > luminance(base));
        assert!(luminance(base.shift_lightness(-15.0)) < luminance(base));
        assert_eq!(Rgb(255, 255, 255).shift_lightness(20.0), Rgb(255, 255, 255));
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Rgb(245, 86, 74);
        let b = Rgb(151, 201, 92);
        let start = a.blend(b, 0.0);
        let end = a.blend(b, 1.0);
        assert!((start.0 as i16 - a.0 as i16).abs() <= 1);
        assert!((end.1 as i16 - b.1 as i16).abs() <= 1);
    }
}
