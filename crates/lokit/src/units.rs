//! Twip/pixel conversion.
//!
//! LibreOfficeKit measures everything in twips (1/1440 inch). Both directions
//! truncate toward zero, like integer division.

/// Twips in one inch.
pub const TWIPS_PER_INCH: i64 = 1440;

/// Convert twips to pixels at the given resolution.
///
/// The result saturates at the `i64` bounds.
pub fn twips_to_pixels(twips: i64, dpi: u32) -> i64 {
    let pixels = i128::from(twips) * i128::from(dpi) / i128::from(TWIPS_PER_INCH);
    saturate(pixels)
}

/// Convert pixels to twips at the given resolution.
///
/// # Panics
///
/// Panics if `dpi` is zero.
pub fn pixels_to_twips(pixels: i64, dpi: u32) -> i64 {
    assert!(dpi > 0, "dpi must be positive");
    let twips = i128::from(pixels) * i128::from(TWIPS_PER_INCH) / i128::from(dpi);
    saturate(twips)
}

fn saturate(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
