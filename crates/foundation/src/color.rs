/// 8-bit sRGB color, rendered as `#rrggbb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    MissingHash,
    BadLength(usize),
    BadDigit,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorParseError::MissingHash => write!(f, "color must start with '#'"),
            ColorParseError::BadLength(len) => {
                write!(f, "expected 3 or 6 hex digits, got {len}")
            }
            ColorParseError::BadDigit => write!(f, "invalid hex digit in color"),
        }
    }
}

impl std::error::Error for ColorParseError {}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb` (case-insensitive).
    pub fn parse_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.trim().strip_prefix('#').ok_or(ColorParseError::MissingHash)?;
        let nibble = |c: u8| -> Result<u8, ColorParseError> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or(ColorParseError::BadDigit)
        };
        let bytes = digits.as_bytes();
        match bytes.len() {
            3 => {
                let r = nibble(bytes[0])?;
                let g = nibble(bytes[1])?;
                let b = nibble(bytes[2])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let byte = |i: usize| -> Result<u8, ColorParseError> {
                    Ok(nibble(bytes[i])? * 16 + nibble(bytes[i + 1])?)
                };
                Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
            }
            n => Err(ColorParseError::BadLength(n)),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Per-channel linear interpolation; `t` is clamped to `[0, 1]` (NaN → 0).
    ///
    /// `t == 0` returns `self` and `t == 1` returns `other` exactly.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorParseError, Rgb};

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!(Rgb::parse_hex("#ff0000"), Ok(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse_hex("#EF476F"), Ok(Rgb::new(0xef, 0x47, 0x6f)));
        assert_eq!(Rgb::parse_hex("#0f8"), Ok(Rgb::new(0, 255, 136)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Rgb::parse_hex("ff0000"), Err(ColorParseError::MissingHash));
        assert_eq!(Rgb::parse_hex("#ff00"), Err(ColorParseError::BadLength(4)));
        assert_eq!(Rgb::parse_hex("#gg0000"), Err(ColorParseError::BadDigit));
    }

    #[test]
    fn hex_output_is_lowercase_six_digits() {
        assert_eq!(Rgb::new(1, 171, 255).to_hex(), "#01abff");
    }

    #[test]
    fn lerp_hits_endpoints_exactly() {
        let a = Rgb::new(255, 209, 102);
        let b = Rgb::new(239, 71, 111);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 7.5), b);
        assert_eq!(a.lerp(b, f64::NAN), a);
    }

    #[test]
    fn lerp_midpoint() {
        let m = Rgb::new(0, 0, 0).lerp(Rgb::new(200, 100, 50), 0.5);
        assert_eq!(m, Rgb::new(100, 50, 25));
    }
}
