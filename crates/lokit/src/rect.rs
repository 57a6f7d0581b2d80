//! Page rectangles of text documents.
//!
//! `getPartPageRectangles` packs one record per page into a string:
//!
//! ```text
//! "x, y, width, height; x, y, width, height; ..."
//! ```
//!
//! All values are twips. Records are separated by `;`, fields by `,`, with
//! optional whitespace around each field. Empty records (a trailing `;`, an
//! empty string) are skipped.

use std::num::IntErrorKind;

use crate::error::{Error, Result};

/// An axis-aligned rectangle in twips, from `(x0, y0)` inclusive to
/// `(x1, y1)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl Rectangle {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build from an origin and a size, as the engine reports pages.
    pub fn from_origin_size(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(width),
            y1: y.saturating_add(height),
        }
    }

    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Parse the engine's page rectangle string.
///
/// Lenient, matching what callers of this binding have always seen: a field
/// that is not an integer reads as `0`, missing fields read as `0`, and fields
/// past the fourth are ignored. Integers out of `i64` range saturate.
pub fn parse_page_rectangles(raw: &str) -> Vec<Rectangle> {
    records(raw)
        .map(|record| {
            let mut values = [0i64; 4];
            for (slot, field) in values.iter_mut().zip(record.split(',')) {
                let field = field.trim();
                *slot = parse_lenient(record, field);
            }
            let [x, y, w, h] = values;
            Rectangle::from_origin_size(x, y, w, h)
        })
        .collect()
}

fn parse_lenient(record: &str, field: &str) -> i64 {
    match field.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => {
                tracing::debug!(record, field, "non-numeric page rectangle field read as 0");
                0
            }
        },
    }
}

/// Parse the engine's page rectangle string, rejecting anything that is not
/// exactly four integers per record.
pub fn parse_page_rectangles_strict(raw: &str) -> Result<Vec<Rectangle>> {
    records(raw)
        .map(|record| {
            let fields: Vec<&str> = record.split(',').map(str::trim).collect();
            if fields.len() != 4 {
                return Err(malformed(record, format!("expected 4 fields, found {}", fields.len())));
            }
            let mut values = [0i64; 4];
            for (slot, field) in values.iter_mut().zip(&fields) {
                *slot = field
                    .parse()
                    .map_err(|e| malformed(record, format!("field '{field}': {e}")))?;
            }
            let [x, y, w, h] = values;
            Ok(Rectangle::from_origin_size(x, y, w, h))
        })
        .collect()
}

fn records(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(';').filter(|record| !record.trim().is_empty())
}

fn malformed(record: &str, reason: String) -> Error {
    Error::MalformedRectangle {
        record: record.trim().to_string(),
        reason,
    }
}
