//! Safe Rust binding to LibreOfficeKit, LibreOffice's embeddable document
//! engine.
//!
//! This crate loads the engine from a LibreOffice installation, opens
//! documents, reads their metadata, drives text selection and renders tiles
//! into pixel buffers. All layout and rendering happens inside the engine;
//! the binding only crosses the C boundary safely.
//!
//! # Architecture
//!
//! ```text
//! Your Rust code
//!     └── Office / Document (this crate)
//!           └── class tables (lokit-sys)
//!                 └── libsofficeapp.so, loaded at runtime
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use lokit::{Office, TextSelectionKind};
//!
//! # fn example() -> lokit::Result<()> {
//! let office = Office::from_env()?;
//! let mut doc = office.load_document("/tmp/sample.odt")?;
//! doc.initialize_for_rendering("")?;
//!
//! // Render the first page at 96 dpi.
//! let page = doc.part_page_rectangles()?[0];
//! let width = lokit::units::twips_to_pixels(page.width(), 96) as u32;
//! let height = lokit::units::twips_to_pixels(page.height(), 96) as u32;
//! let tile = doc.render_tile(width, height, page.x0 as i32, page.y0 as i32,
//!                            page.width() as i32, page.height() as i32)?;
//! let rgba = tile.into_rgba();
//!
//! // Select the whole first page and read it as text.
//! doc.set_text_selection(TextSelectionKind::Start, page.x0 as i32, page.y0 as i32)?;
//! doc.set_text_selection(TextSelectionKind::End, page.x1 as i32, page.y1 as i32)?;
//! let text = doc.text_selection("text/plain;charset=utf-8")?;
//! # let _ = (rgba, text);
//! # Ok(())
//! # }
//! ```
//!
//! # One engine per process
//!
//! LibreOfficeKit cannot run two engines in one process, nor restart one
//! after it was destroyed. [`Office`] enforces this; see its documentation.

pub mod config;
pub mod document;
pub mod error;
mod loader;
mod native;
pub mod office;
pub mod pixels;
pub mod rect;
pub mod units;

#[cfg(any(test, feature = "test-util"))]
#[doc(hidden)]
pub mod fake;

pub use config::OfficeConfig;
pub use document::{
    Document, DocumentType, GraphicSelectionKind, KeyEventKind, MouseEventKind, PartMode,
    TextSelectionKind, ViewId,
};
pub use error::{Error, Result};
pub use office::{Office, VersionInfo};
pub use pixels::{bgra_to_rgba, Tile, TileMode};
pub use rect::Rectangle;
pub use units::{pixels_to_twips, twips_to_pixels};
