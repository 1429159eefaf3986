//! RGB colors and the diagram palette

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Rgb::new(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
            )),
            3 => {
                let short = |s: &str| channel(s).map(|v| v * 17);
                Some(Rgb::new(
                    short(digits.get(0..1)?)?,
                    short(digits.get(1..2)?)?,
                    short(digits.get(2..3)?)?,
                ))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise interpolation, `t` clamped to `[0, 1]`
    pub fn lerp(self, to: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, to.r), mix(self.g, to.g), mix(self.b, to.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Colors the diagram is drawn with
pub mod palette {
    use super::Rgb;

    pub const FOREGROUND: Rgb = Rgb::new(205, 214, 244);
    pub const MUTED: Rgb = Rgb::new(108, 112, 134);
    pub const FRAME: Rgb = Rgb::new(137, 180, 250);
    pub const CURRENT_FRAME: Rgb = Rgb::new(249, 226, 175);
    pub const VALUE: Rgb = Rgb::new(250, 179, 135);
    pub const CLOSURE: Rgb = Rgb::new(148, 226, 213);
    pub const ARROW: Rgb = Rgb::new(166, 173, 200);
    pub const CONTROL: Rgb = Rgb::new(203, 166, 247);
    pub const STASH: Rgb = Rgb::new(166, 227, 161);
    /// A binding whose value just changed
    pub const FLASH: Rgb = Rgb::new(243, 139, 168);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_forms() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("#f80"), Some(Rgb::new(255, 136, 0)));
        assert_eq!(Rgb::from_hex("#zz0000"), None);
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");
    }

    #[test]
    fn test_lerp_per_channel() {
        let black = Rgb::new(0, 0, 0);
        let white = Rgb::new(255, 255, 255);
        assert_eq!(black.lerp(white, 0.0), black);
        assert_eq!(black.lerp(white, 1.0), white);
        assert_eq!(black.lerp(Rgb::new(200, 100, 0), 0.5), Rgb::new(100, 50, 0));
        assert_eq!(black.lerp(white, 2.0), white);
    }
}
