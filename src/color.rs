use serde::{Deserialize, Serialize};
use std::fmt;

/// Color given to points that no group has claimed.
pub const UNASSIGNED_COLOR: &str = "#A0A0A0";

/// A `#RRGGBB` color, stored upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorHex(String);

impl ColorHex {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("#{}", hex.to_ascii_uppercase())))
    }

    pub fn unassigned() -> Self {
        Self(UNASSIGNED_COLOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_rgb(&self) -> [u8; 3] {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        [channel(1), channel(3), channel(5)]
    }

    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ColorHex {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ColorHex::parse(&value).ok_or_else(|| format!("not a #RRGGBB color: {value:?}"))
    }
}

impl From<ColorHex> for String {
    fn from(c: ColorHex) -> Self {
        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case() {
        let c = ColorHex::parse("#4e79a7").unwrap();
        assert_eq!(c.as_str(), "#4E79A7");
        assert_eq!(c.to_rgb(), [0x4E, 0x79, 0xA7]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ColorHex::parse("4E79A7").is_none());
        assert!(ColorHex::parse("#4E79A").is_none());
        assert!(ColorHex::parse("#GGGGGG").is_none());
    }

    #[test]
    fn rgb_conversion_is_symmetric() {
        let c = ColorHex::from_rgb([255, 0, 16]);
        assert_eq!(c.as_str(), "#FF0010");
        assert_eq!(c.to_rgb(), [255, 0, 16]);
    }

    #[test]
    fn serde_goes_through_validation() {
        let c: ColorHex = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(c.as_str(), "#FF0000");
        assert!(serde_json::from_str::<ColorHex>("\"red\"").is_err());
    }
}
