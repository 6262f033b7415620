//! Hex color parsing for container fills.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGBA color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha, 0 to 1.
    pub a: f32,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional) and attach `alpha`.
    ///
    /// Anything else parses as black with the given alpha, so a bad color
    /// never hides the container entirely.
    #[must_use]
    pub fn from_hex(hex: &str, alpha: f32) -> Self {
        let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
        let digits = hex.trim().trim_start_matches('#');
        let channels = match digits.len() {
            3 => expand_short(digits),
            6 => parse_pairs(digits),
            _ => None,
        };
        let (r, g, b) = channels.unwrap_or((0, 0, 0));
        Self { r, g, b, a: alpha }
    }
}

fn expand_short(digits: &str) -> Option<(u8, u8, u8)> {
    let mut nibbles = digits.chars().map(|c| c.to_digit(16));
    let mut next = || -> Option<u8> {
        let value = u8::try_from(nibbles.next()??).ok()?;
        Some(value * 17)
    };
    Some((next()?, next()?, next()?))
}

fn parse_pairs(digits: &str) -> Option<(u8, u8, u8)> {
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}
