#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a #RRGGBB or #RRGGBBAA color")]
pub struct ColorParseError(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255, 255);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);

    /// Parses `#RRGGBB` or `#RRGGBBAA`. Color props come off the wire as
    /// strings, so a bad literal is a per-property coercion failure.
    pub fn from_hex(hex: &str) -> Result<Color, ColorParseError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || ColorParseError(hex.to_string());
        let byte = |at: usize| {
            digits
                .get(at..at + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match digits.len() {
            6 => Ok(Color(
                byte(0).ok_or_else(bad)?,
                byte(2).ok_or_else(bad)?,
                byte(4).ok_or_else(bad)?,
                255,
            )),
            8 => Ok(Color(
                byte(0).ok_or_else(bad)?,
                byte(2).ok_or_else(bad)?,
                byte(4).ok_or_else(bad)?,
                byte(6).ok_or_else(bad)?,
            )),
            _ => Err(bad()),
        }
    }
}
