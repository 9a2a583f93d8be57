// Color codec: hex text <-> RGB, interpolation and brightness scaling

use crosec_transport::Rgb;
use thiserror::Error;

/// Malformed color text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected 6 hex digits with optional '#' or '0x' prefix")]
pub struct ColorError(pub String);

/// Canonicalize color text to `0xrrggbb`
///
/// Accepts surrounding whitespace, an optional `#` or `0x`/`0X` prefix and
/// exactly six hex digits in any case.
pub fn normalize(text: &str) -> Result<String, ColorError> {
    let value = parse_u24(text)?;
    Ok(format!("0x{value:06x}"))
}

/// Parse color text into its RGB channels
pub fn parse(text: &str) -> Result<Rgb, ColorError> {
    parse_u24(text).map(Rgb::from_u24)
}

/// Canonical text form of a color
pub fn to_hex(color: Rgb) -> String {
    format!("0x{:06x}", color.to_u24())
}

fn parse_u24(text: &str) -> Result<u32, ColorError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError(text.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| ColorError(text.to_string()))
}

/// Per-channel linear interpolation, `t` clamped to [0, 1]
pub fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Scale brightness by a factor clamped to [0, 1]
pub fn scale(color: Rgb, factor: f64) -> Rgb {
    let f = factor.clamp(0.0, 1.0);
    let mul = |x: u8| (x as f64 * f).round() as u8;
    Rgb::new(mul(color.r), mul(color.g), mul(color.b))
}

pub fn is_black(color: Rgb) -> bool {
    color == Rgb::BLACK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefixes() {
        assert_eq!(normalize("#FF0000").unwrap(), "0xff0000");
        assert_eq!(normalize("0xFF0000").unwrap(), "0xff0000");
        assert_eq!(normalize("0X00Ff00").unwrap(), "0x00ff00");
        assert_eq!(normalize("  00ff00 ").unwrap(), "0x00ff00");
    }

    #[test]
    fn test_normalize_round_trip() {
        for input in ["#ff0000", "0xFF0000", "00ff00"] {
            let canonical = normalize(input).unwrap();
            let again = normalize(&to_hex(parse(&canonical).unwrap())).unwrap();
            assert_eq!(again, canonical);
        }
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        let malformed = [
            "", "#", "0x", "fff", "#12345", "1234567", "0xgg0000", "+12345", "red", "0x 12345",
        ];
        for bad in malformed {
            assert!(normalize(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_channels() {
        assert_eq!(parse("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(to_hex(Rgb::new(0x80, 0x00, 0xff)), "0x8000ff");
    }

    #[test]
    fn test_lerp_rounds_and_clamps() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(255, 100, 51);
        assert_eq!(lerp(a, b, 0.5), Rgb::new(128, 50, 26));
        assert_eq!(lerp(a, b, -1.0), a);
        assert_eq!(lerp(a, b, 2.0), b);
    }

    #[test]
    fn test_scale_rounds_and_clamps() {
        let c = Rgb::new(255, 3, 0);
        assert_eq!(scale(c, 0.5), Rgb::new(128, 2, 0));
        assert_eq!(scale(c, 0.0), Rgb::BLACK);
        assert_eq!(scale(c, 1.5), c);
    }

    #[test]
    fn test_is_black() {
        assert!(is_black(parse("0x000000").unwrap()));
        assert!(!is_black(parse("0x000001").unwrap()));
    }
}
