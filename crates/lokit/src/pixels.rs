//! Pixel formats of rendered tiles.

use lokit_sys as sys;

/// Channel order of the pixels `paintTile` writes.
///
/// Depends on the engine build: most desktop builds deliver BGRA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileMode {
    Rgba,
    Bgra,
}

impl TileMode {
    /// Map the engine's `LOK_TILEMODE_*` value.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            sys::LOK_TILEMODE_RGBA => Some(TileMode::Rgba),
            sys::LOK_TILEMODE_BGRA => Some(TileMode::Bgra),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            TileMode::Rgba => sys::LOK_TILEMODE_RGBA,
            TileMode::Bgra => sys::LOK_TILEMODE_BGRA,
        }
    }

    /// Whether [`bgra_to_rgba`] must run before treating the pixels as RGBA.
    pub fn needs_swap(self) -> bool {
        self == TileMode::Bgra
    }
}

/// Bytes per pixel of every tile mode.
pub const BYTES_PER_PIXEL: usize = 4;

/// Swap red and blue in a tightly packed 4-byte-per-pixel buffer, in place.
///
/// Green and alpha stay where they are. A trailing partial pixel is left
/// untouched. The swap is its own inverse.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel.swap(0, 2);
    }
}

/// Alias of [`bgra_to_rgba`] for the opposite direction.
pub fn rgba_to_bgra(pixels: &mut [u8]) {
    bgra_to_rgba(pixels)
}

/// Bytes needed for a `width × height` canvas, or `None` on overflow.
pub fn buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}

/// A rendered tile and the channel order it was delivered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub width: u32,
    pub height: u32,
    pub mode: TileMode,
    pub pixels: Vec<u8>,
}

impl Tile {
    /// Pixels in RGBA order, swapping channels if the engine delivered BGRA.
    pub fn into_rgba(mut self) -> Vec<u8> {
        if self.mode.needs_swap() {
            bgra_to_rgba(&mut self.pixels);
        }
        self.pixels
    }

    /// Stride of one row in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }
}
