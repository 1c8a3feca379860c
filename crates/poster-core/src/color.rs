//! Strict `#RRGGBB` colors
//!
//! Poster documents carry colors as hex strings. Parsing is strict: exactly
//! six hex digits, with the leading `#` optional. Anything else is an error
//! the renderer reports instead of guessing.

use std::fmt;
use std::str::FromStr;

use tiny_skia::{ColorU8, PremultipliedColorU8};

use crate::error::{ParseColorError, RenderError};

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a document color, wrapping failures in [`RenderError::InvalidColor`].
    pub fn parse_for_render(value: &str) -> Result<Self, RenderError> {
        value.parse().map_err(|source| RenderError::InvalidColor {
            value: value.to_string(),
            source,
        })
    }

    /// Per-channel linear interpolation, `t` clamped to `0.0..=1.0`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_premultiplied(self) -> PremultipliedColorU8 {
        ColorU8::from_rgba(self.r, self.g, self.b, 255).premultiply()
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError::InvalidCharacter(s.to_string()));
        }
        if hex.len() != 6 {
            return Err(ParseColorError::InvalidLength(hex.len()));
        }

        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        Ok(Rgb::new(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!("#4A90E2".parse::<Rgb>().unwrap(), Rgb::new(74, 144, 226));
        assert_eq!("4a90e2".parse::<Rgb>().unwrap(), Rgb::new(74, 144, 226));
        assert_eq!(" #FFFFFF ".parse::<Rgb>().unwrap(), Rgb::WHITE);
    }

    #[test]
    fn rejects_shorthand_and_garbage() {
        assert_eq!(
            "#FFF".parse::<Rgb>(),
            Err(ParseColorError::InvalidLength(3))
        );
        assert!(matches!(
            "#GG0000".parse::<Rgb>(),
            Err(ParseColorError::InvalidCharacter(_))
        ));
        assert!(matches!(
            "red".parse::<Rgb>(),
            Err(ParseColorError::InvalidCharacter(_))
        ));
        assert!("#+F0000".parse::<Rgb>().is_err());
        assert!("#ÄÄÄ".parse::<Rgb>().is_err());
        assert!("".parse::<Rgb>().is_err());
    }

    #[test]
    fn render_parse_keeps_offending_value() {
        let err = Rgb::parse_for_render("#12345").unwrap_err();
        match err {
            RenderError::InvalidColor { value, .. } => assert_eq!(value, "#12345"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lerp_hits_endpoints() {
        let a = Rgb::new(255, 107, 107);
        let b = Rgb::new(255, 217, 61);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(Rgb::BLACK.lerp(Rgb::WHITE, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn display_is_uppercase_hex() {
        assert_eq!(Rgb::new(74, 144, 226).to_string(), "#4A90E2");
    }
}
