//! Theme colour normalisation.
//!
//! Themes carry CSS colours (`#1f2937`, `rgb(31, 41, 55)`, `navy`); output
//! documents want bare six-digit hex.

/// Colour used when a theme value cannot be parsed.
pub const FALLBACK_HEX: &str = "000000";

/// Parse a CSS colour into uppercase `RRGGBB`.
#[must_use]
pub fn to_hex(color: &str) -> Option<String> {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = csscolorparser::parse(trimmed).ok()?;
    let [r, g, b, _] = parsed.to_rgba8();
    Some(format!("{r:02X}{g:02X}{b:02X}"))
}

/// [`to_hex`], falling back to `fallback` for unparseable input.
#[must_use]
pub fn hex_or(color: &str, fallback: &str) -> String {
    to_hex(color).unwrap_or_else(|| {
        tracing::debug!("Unparseable colour {:?}, using {}", color, fallback);
        fallback.to_string()
    })
}
