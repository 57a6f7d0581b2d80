//! Open documents: metadata, navigation, selection and tile rendering.

use std::os::raw::c_long;
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use lokit_sys as sys;

use crate::error::{Error, Result};
use crate::native::{self, entry_point};
use crate::office::OfficeInner;
use crate::pixels::{self, Tile, TileMode};
use crate::rect::{self, Rectangle};

/// Kind of document, fixed for the document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Text,
    Spreadsheet,
    Presentation,
    Drawing,
    Other,
}

impl DocumentType {
    /// Map `LOK_DOCTYPE_*`; values a newer engine might add read as `Other`.
    pub fn from_raw(value: i32) -> Self {
        match value {
            sys::LOK_DOCTYPE_TEXT => DocumentType::Text,
            sys::LOK_DOCTYPE_SPREADSHEET => DocumentType::Spreadsheet,
            sys::LOK_DOCTYPE_PRESENTATION => DocumentType::Presentation,
            sys::LOK_DOCTYPE_DRAWING => DocumentType::Drawing,
            _ => DocumentType::Other,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            DocumentType::Text => sys::LOK_DOCTYPE_TEXT,
            DocumentType::Spreadsheet => sys::LOK_DOCTYPE_SPREADSHEET,
            DocumentType::Presentation => sys::LOK_DOCTYPE_PRESENTATION,
            DocumentType::Drawing => sys::LOK_DOCTYPE_DRAWING,
            DocumentType::Other => sys::LOK_DOCTYPE_OTHER,
        }
    }
}

/// What the parts of a presentation show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartMode {
    Slides,
    Notes,
}

impl PartMode {
    fn as_raw(self) -> i32 {
        match self {
            PartMode::Slides => sys::LOK_PARTMODE_SLIDES,
            PartMode::Notes => sys::LOK_PARTMODE_NOTES,
        }
    }
}

/// Which anchor of the text selection a position sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSelectionKind {
    Start,
    End,
    Reset,
}

impl TextSelectionKind {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            sys::LOK_SETTEXTSELECTION_START => Some(TextSelectionKind::Start),
            sys::LOK_SETTEXTSELECTION_END => Some(TextSelectionKind::End),
            sys::LOK_SETTEXTSELECTION_RESET => Some(TextSelectionKind::Reset),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            TextSelectionKind::Start => sys::LOK_SETTEXTSELECTION_START,
            TextSelectionKind::End => sys::LOK_SETTEXTSELECTION_END,
            TextSelectionKind::Reset => sys::LOK_SETTEXTSELECTION_RESET,
        }
    }
}

/// Which anchor of a graphic (shape) selection a position sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicSelectionKind {
    Start,
    End,
}

impl GraphicSelectionKind {
    fn as_raw(self) -> i32 {
        match self {
            GraphicSelectionKind::Start => sys::LOK_SETGRAPHICSELECTION_START,
            GraphicSelectionKind::End => sys::LOK_SETGRAPHICSELECTION_END,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Input,
    Up,
}

impl KeyEventKind {
    fn as_raw(self) -> i32 {
        match self {
            KeyEventKind::Input => sys::LOK_KEYEVENT_KEYINPUT,
            KeyEventKind::Up => sys::LOK_KEYEVENT_KEYUP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    ButtonDown,
    ButtonUp,
    Move,
}

impl MouseEventKind {
    fn as_raw(self) -> i32 {
        match self {
            MouseEventKind::ButtonDown => sys::LOK_MOUSEEVENT_MOUSEBUTTONDOWN,
            MouseEventKind::ButtonUp => sys::LOK_MOUSEEVENT_MOUSEBUTTONUP,
            MouseEventKind::Move => sys::LOK_MOUSEEVENT_MOUSEMOVE,
        }
    }
}

/// Identifier of a view into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub i32);

/// A document opened through [`Office::load_document`](crate::Office::load_document).
///
/// Calls that move the engine's cursor state (part, selection, view, input
/// events, painting) take `&mut self`, so one document cannot be driven from
/// two threads at once. The native document is released exactly once, by
/// [`Document::close`] or on drop.
pub struct Document {
    raw: NonNull<sys::LibreOfficeKitDocument>,
    office: Arc<OfficeInner>,
    url: String,
    rendering_initialized: bool,
}

// SAFETY: native calls go through the office lock, and `Document` is not
// `Sync`, so the handle is used from one thread at a time.
unsafe impl Send for Document {}

impl Document {
    pub(crate) fn from_raw(raw: NonNull<sys::LibreOfficeKitDocument>, office: Arc<OfficeInner>, url: String) -> Self {
        Self {
            raw,
            office,
            url,
            rendering_initialized: false,
        }
    }

    fn class(&self) -> *const sys::LibreOfficeKitDocumentClass {
        // SAFETY: the document is valid until `destroy` in `Drop`.
        unsafe { (*self.raw.as_ptr()).p_class }
    }

    /// Run a native call under the engine lock.
    fn call<R>(&self, f: impl FnOnce(*mut sys::LibreOfficeKitDocument) -> R) -> R {
        let _guard = self.office.lock();
        f(self.raw.as_ptr())
    }

    /// The path or URL the document was loaded from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document_type(&self) -> Result<DocumentType> {
        let get_document_type = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_document_type)?;
        // SAFETY: valid document.
        let raw = self.call(|doc| unsafe { get_document_type(doc) });
        Ok(DocumentType::from_raw(raw))
    }

    /// Number of parts: pages of a text document, sheets, slides.
    pub fn part_count(&self) -> Result<i32> {
        let get_parts = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_parts)?;
        // SAFETY: valid document.
        Ok(self.call(|doc| unsafe { get_parts(doc) }))
    }

    /// Zero-based index of the current part; 0 right after loading.
    pub fn current_part(&self) -> Result<i32> {
        let get_part = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_part)?;
        // SAFETY: valid document.
        Ok(self.call(|doc| unsafe { get_part(doc) }))
    }

    /// Switch the current part.
    ///
    /// The index is handed to the engine as is; what happens outside
    /// `0..part_count()` is up to the engine.
    pub fn set_part(&mut self, part: i32) -> Result<()> {
        let set_part = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, set_part)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_part(doc, part) });
        Ok(())
    }

    /// Display title of a part: slide name, sheet name or page label.
    pub fn part_name(&self, part: i32) -> Result<String> {
        let get_part_name = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_part_name)?;
        // SAFETY: valid document; the returned string is ours to free.
        Ok(self.call(|doc| unsafe { self.office.take_string(get_part_name(doc, part)) }))
    }

    pub fn set_part_mode(&mut self, mode: PartMode) -> Result<()> {
        let set_part_mode = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, set_part_mode)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_part_mode(doc, mode.as_raw()) });
        Ok(())
    }

    /// Document width and height in twips.
    pub fn size(&self) -> Result<(i64, i64)> {
        let get_document_size = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_document_size)?;
        let mut width: c_long = 0;
        let mut height: c_long = 0;
        // SAFETY: valid document and out-pointers to live locals.
        self.call(|doc| unsafe { get_document_size(doc, &mut width, &mut height) });
        Ok((i64::from(width), i64::from(height)))
    }

    /// Prepare the document for rendering. Call once before any tile or
    /// selection work. `options` is the engine's JSON argument string; pass
    /// `""` for defaults.
    pub fn initialize_for_rendering(&mut self, options: &str) -> Result<()> {
        let c_options = native::to_cstring(options)?;
        let initialize = entry_point!(
            self.class(),
            sys::LibreOfficeKitDocumentClass,
            initialize_for_rendering
        )?;
        // SAFETY: valid document and NUL-terminated arguments.
        self.call(|doc| unsafe { initialize(doc, c_options.as_ptr()) });
        self.rendering_initialized = true;
        Ok(())
    }

    /// Export the document.
    ///
    /// `format` is a filter short name such as `"pdf"` or `"docx"`; `None`
    /// lets the engine pick from the file extension. `filter_options` is
    /// passed through untouched. On failure the engine's message is copied
    /// into [`Error::Save`] and also stays readable through the office's
    /// `last_error`.
    ///
    /// The engine's `saveAs` returns non-zero on success and 0 on failure.
    pub fn save_as(&self, path: impl AsRef<Path>, format: Option<&str>, filter_options: Option<&str>) -> Result<()> {
        let url = native::path_to_str(path.as_ref())?;
        let c_url = native::to_cstring(url)?;
        let c_format = native::to_optional_cstring(format)?;
        let c_filter = native::to_optional_cstring(filter_options)?;
        let save_as = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, save_as)?;

        let _guard = self.office.lock();
        // SAFETY: valid document; arguments are NUL-terminated or null.
        let status = unsafe {
            save_as(
                self.raw.as_ptr(),
                c_url.as_ptr(),
                native::optional_ptr(&c_format),
                native::optional_ptr(&c_filter),
            )
        };

        // The engine returns true on success.
        if status != 0 {
            tracing::info!("Saved {} to {url}", self.url);
            Ok(())
        } else {
            Err(Error::Save {
                url: url.to_string(),
                message: self.office.read_error(),
            })
        }
    }

    /// Create a new view and make it current.
    pub fn create_view(&mut self) -> Result<ViewId> {
        let create_view = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, create_view)?;
        // SAFETY: valid document.
        let id = self.call(|doc| unsafe { create_view(doc) });
        tracing::debug!("Created view {id} on {}", self.url);
        Ok(ViewId(id))
    }

    pub fn current_view(&self) -> Result<ViewId> {
        let get_view = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_view)?;
        // SAFETY: valid document.
        Ok(ViewId(self.call(|doc| unsafe { get_view(doc) })))
    }

    pub fn set_view(&mut self, view: ViewId) -> Result<()> {
        let set_view = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, set_view)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_view(doc, view.0) });
        Ok(())
    }

    pub fn destroy_view(&mut self, view: ViewId) -> Result<()> {
        let destroy_view = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, destroy_view)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { destroy_view(doc, view.0) });
        Ok(())
    }

    /// Number of views open on this document; 1 right after loading.
    pub fn view_count(&self) -> Result<i32> {
        let get_views_count = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_views_count)?;
        // SAFETY: valid document.
        Ok(self.call(|doc| unsafe { get_views_count(doc) }))
    }

    /// Channel order of the pixels [`Document::paint_tile`] writes.
    pub fn tile_mode(&self) -> Result<TileMode> {
        let get_tile_mode = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_tile_mode)?;
        // SAFETY: valid document.
        let raw = self.call(|doc| unsafe { get_tile_mode(doc) });
        TileMode::from_raw(raw).ok_or(Error::UnexpectedValue {
            what: "tile mode",
            value: raw,
        })
    }

    /// Content of the current text selection, serialized as `mime_type`
    /// (e.g. `text/plain;charset=utf-8`). Empty when nothing is selected.
    pub fn text_selection(&self, mime_type: &str) -> Result<String> {
        let c_mime = native::to_cstring(mime_type)?;
        let get_text_selection = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_text_selection)?;
        // SAFETY: valid document; the returned string is ours to free.
        Ok(self.call(|doc| unsafe {
            self.office
                .take_string(get_text_selection(doc, c_mime.as_ptr(), ptr::null_mut()))
        }))
    }

    /// Move one anchor of the text selection to `(x, y)` in twips.
    ///
    /// Call with [`TextSelectionKind::Start`], then [`TextSelectionKind::End`].
    pub fn set_text_selection(&mut self, kind: TextSelectionKind, x: i32, y: i32) -> Result<()> {
        let set_text_selection = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, set_text_selection)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_text_selection(doc, kind.as_raw(), x, y) });
        Ok(())
    }

    /// Clear the selection.
    pub fn reset_selection(&mut self) -> Result<()> {
        let reset_selection = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, reset_selection)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { reset_selection(doc) });
        Ok(())
    }

    /// Move one anchor of a graphic selection to `(x, y)` in twips.
    pub fn set_graphic_selection(&mut self, kind: GraphicSelectionKind, x: i32, y: i32) -> Result<()> {
        let set_graphic_selection = entry_point!(
            self.class(),
            sys::LibreOfficeKitDocumentClass,
            set_graphic_selection
        )?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_graphic_selection(doc, kind.as_raw(), x, y) });
        Ok(())
    }

    /// Paste `data` of the given MIME type at the cursor. Returns whether the
    /// engine accepted it.
    pub fn paste(&mut self, mime_type: &str, data: &[u8]) -> Result<bool> {
        let c_mime = native::to_cstring(mime_type)?;
        let paste = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, paste)?;
        // SAFETY: valid document; `data` is readable for `data.len()` bytes.
        Ok(self.call(|doc| unsafe { paste(doc, c_mime.as_ptr(), data.as_ptr().cast(), data.len()) }))
    }

    /// Dispatch a UNO command such as `.uno:Bold`. `arguments` is the
    /// command's JSON argument string.
    pub fn post_uno_command(&mut self, command: &str, arguments: Option<&str>, notify_when_finished: bool) -> Result<()> {
        let c_command = native::to_cstring(command)?;
        let c_arguments = native::to_optional_cstring(arguments)?;
        let post_uno_command = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, post_uno_command)?;
        // SAFETY: valid document; arguments are NUL-terminated or null.
        self.call(|doc| unsafe {
            post_uno_command(
                doc,
                c_command.as_ptr(),
                native::optional_ptr(&c_arguments),
                notify_when_finished,
            )
        });
        Ok(())
    }

    pub fn post_key_event(&mut self, kind: KeyEventKind, char_code: i32, key_code: i32) -> Result<()> {
        let post_key_event = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, post_key_event)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { post_key_event(doc, kind.as_raw(), char_code, key_code) });
        Ok(())
    }

    /// Post a mouse event at `(x, y)` twips. `buttons` and `modifier` are the
    /// engine's button and key-modifier bit masks.
    #[allow(clippy::too_many_arguments)]
    pub fn post_mouse_event(
        &mut self,
        kind: MouseEventKind,
        x: i32,
        y: i32,
        count: i32,
        buttons: i32,
        modifier: i32,
    ) -> Result<()> {
        let post_mouse_event = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, post_mouse_event)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { post_mouse_event(doc, kind.as_raw(), x, y, count, buttons, modifier) });
        Ok(())
    }

    /// JSON state of a UNO command, e.g. `.uno:CharFontName`.
    pub fn command_values(&self, command: &str) -> Result<String> {
        let c_command = native::to_cstring(command)?;
        let get_command_values = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, get_command_values)?;
        // SAFETY: valid document; the returned string is ours to free.
        Ok(self.call(|doc| unsafe { self.office.take_string(get_command_values(doc, c_command.as_ptr())) }))
    }

    /// Tell the engine the zoom the client renders tiles at.
    pub fn set_client_zoom(
        &mut self,
        tile_pixel_width: i32,
        tile_pixel_height: i32,
        tile_twip_width: i32,
        tile_twip_height: i32,
    ) -> Result<()> {
        let set_client_zoom = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, set_client_zoom)?;
        // SAFETY: valid document.
        self.call(|doc| unsafe {
            set_client_zoom(doc, tile_pixel_width, tile_pixel_height, tile_twip_width, tile_twip_height)
        });
        Ok(())
    }

    /// Tell the engine which area, in twips, the client shows.
    pub fn set_client_visible_area(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let set_client_visible_area = entry_point!(
            self.class(),
            sys::LibreOfficeKitDocumentClass,
            set_client_visible_area
        )?;
        // SAFETY: valid document.
        self.call(|doc| unsafe { set_client_visible_area(doc, x, y, width, height) });
        Ok(())
    }

    /// Page rectangles of a text document, in twips, in page order.
    ///
    /// Parsed leniently: see [`rect::parse_page_rectangles`]. Use
    /// [`Document::part_page_rectangles_raw`] with
    /// [`rect::parse_page_rectangles_strict`] to reject malformed output.
    pub fn part_page_rectangles(&self) -> Result<Vec<Rectangle>> {
        Ok(rect::parse_page_rectangles(&self.part_page_rectangles_raw()?))
    }

    /// The engine's page rectangle string, unparsed.
    pub fn part_page_rectangles_raw(&self) -> Result<String> {
        let get_rectangles = entry_point!(
            self.class(),
            sys::LibreOfficeKitDocumentClass,
            get_part_page_rectangles
        )?;
        // SAFETY: valid document; the returned string is ours to free.
        Ok(self.call(|doc| unsafe { self.office.take_string(get_rectangles(doc)) }))
    }

    /// Render the twip area `[tile_x, tile_x + tile_width) × [tile_y, tile_y + tile_height)`
    /// scaled onto a `canvas_width × canvas_height` pixel canvas.
    ///
    /// `buffer` must hold at least `4 × canvas_width × canvas_height` bytes;
    /// pixels are in [`Document::tile_mode`] order. The engine reports no
    /// errors for this call: a failed paint leaves the buffer as it was.
    #[allow(clippy::too_many_arguments)]
    pub fn paint_tile(
        &mut self,
        buffer: &mut [u8],
        canvas_width: i32,
        canvas_height: i32,
        tile_x: i32,
        tile_y: i32,
        tile_width: i32,
        tile_height: i32,
    ) -> Result<()> {
        if canvas_width <= 0 || canvas_height <= 0 {
            return Err(Error::InvalidArgument(format!(
                "canvas must be at least 1x1 pixels, got {canvas_width}x{canvas_height}"
            )));
        }
        let required = pixels::buffer_len(canvas_width as u32, canvas_height as u32).ok_or_else(|| {
            Error::InvalidArgument(format!("canvas {canvas_width}x{canvas_height} is too large"))
        })?;
        if buffer.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: buffer.len(),
            });
        }
        if !self.rendering_initialized {
            tracing::warn!("Painting {} before initialize_for_rendering", self.url);
        }

        let paint_tile = entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, paint_tile)?;
        // SAFETY: valid document; `buffer` holds the canvas, checked above.
        self.call(|doc| unsafe {
            paint_tile(
                doc,
                buffer.as_mut_ptr(),
                canvas_width,
                canvas_height,
                tile_x,
                tile_y,
                tile_width,
                tile_height,
            )
        });
        Ok(())
    }

    /// Allocate a canvas, paint into it, and record its channel order.
    pub fn render_tile(
        &mut self,
        canvas_width: u32,
        canvas_height: u32,
        tile_x: i32,
        tile_y: i32,
        tile_width: i32,
        tile_height: i32,
    ) -> Result<Tile> {
        let too_large = || Error::InvalidArgument(format!("canvas {canvas_width}x{canvas_height} is too large"));
        let width = i32::try_from(canvas_width).map_err(|_| too_large())?;
        let height = i32::try_from(canvas_height).map_err(|_| too_large())?;
        let len = pixels::buffer_len(canvas_width, canvas_height).ok_or_else(too_large)?;

        let mode = self.tile_mode()?;
        let mut buffer = vec![0u8; len];
        self.paint_tile(&mut buffer, width, height, tile_x, tile_y, tile_width, tile_height)?;

        Ok(Tile {
            width: canvas_width,
            height: canvas_height,
            mode,
            pixels: buffer,
        })
    }

    /// Release the document. Equivalent to dropping it.
    pub fn close(self) {}
}

impl Drop for Document {
    fn drop(&mut self) {
        match entry_point!(self.class(), sys::LibreOfficeKitDocumentClass, destroy) {
            Ok(destroy) => {
                tracing::debug!("Closing document {}", self.url);
                // SAFETY: valid document, released exactly once here.
                self.call(|doc| unsafe { destroy(doc) });
            }
            Err(_) => tracing::warn!("Document {} has no destroy entry point; leaking it", self.url),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("rendering_initialized", &self.rendering_initialized)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{self, FakeEngine};
    use crate::Office;
    use pretty_assertions::assert_eq;
    use std::mem::offset_of;

    fn open(engine: &FakeEngine) -> (Office, Document) {
        let office = engine.office();
        let doc = office.load_document("sample.fodt").unwrap();
        (office, doc)
    }

    #[test]
    fn test_document_type_from_raw() {
        assert_eq!(DocumentType::from_raw(sys::LOK_DOCTYPE_TEXT), DocumentType::Text);
        assert_eq!(DocumentType::from_raw(sys::LOK_DOCTYPE_SPREADSHEET), DocumentType::Spreadsheet);
        assert_eq!(DocumentType::from_raw(sys::LOK_DOCTYPE_PRESENTATION), DocumentType::Presentation);
        assert_eq!(DocumentType::from_raw(sys::LOK_DOCTYPE_DRAWING), DocumentType::Drawing);
        assert_eq!(DocumentType::from_raw(sys::LOK_DOCTYPE_OTHER), DocumentType::Other);
        assert_eq!(DocumentType::from_raw(42), DocumentType::Other);
        assert_eq!(DocumentType::Drawing.as_raw(), sys::LOK_DOCTYPE_DRAWING);
    }

    #[test]
    fn test_text_selection_kind_from_raw() {
        assert_eq!(TextSelectionKind::from_raw(sys::LOK_SETTEXTSELECTION_END), Some(TextSelectionKind::End));
        assert_eq!(TextSelectionKind::from_raw(3), None);
    }

    #[test]
    fn test_metadata() {
        let engine = FakeEngine::new();
        let (_office, doc) = open(&engine);

        assert_eq!(doc.document_type().unwrap(), DocumentType::Text);
        assert_eq!(doc.part_count().unwrap(), 2);
        assert_eq!(doc.current_part().unwrap(), 0);
        assert_eq!(doc.part_name(1).unwrap(), "Page 2");
        assert_eq!(doc.size().unwrap(), fake::DOCUMENT_SIZE);
    }

    #[test]
    fn test_set_part_is_passed_through() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        doc.set_part(1).unwrap();
        assert_eq!(doc.current_part().unwrap(), 1);

        // Out-of-range indices are the engine's business.
        doc.set_part(7).unwrap();
        assert_eq!(engine.state().doc.current_part, 7);
    }

    #[test]
    fn test_set_part_mode() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.set_part_mode(PartMode::Notes).unwrap();
        assert_eq!(engine.state().doc.part_mode, Some(sys::LOK_PARTMODE_NOTES));
    }

    #[test]
    fn test_initialize_for_rendering() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.initialize_for_rendering(r#"{".uno:HideWhitespace":{"type":"boolean","value":"true"}}"#)
            .unwrap();
        let options = engine.state().doc.rendering_options.clone().unwrap();
        assert!(options.contains("HideWhitespace"));
    }

    #[test]
    fn test_views() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        assert_eq!(doc.view_count().unwrap(), 1);
        assert_eq!(doc.current_view().unwrap(), ViewId(0));

        let view = doc.create_view().unwrap();
        assert_eq!(view, ViewId(1));
        assert_eq!(doc.view_count().unwrap(), 2);
        assert_eq!(doc.current_view().unwrap(), view);

        doc.set_view(ViewId(0)).unwrap();
        assert_eq!(doc.current_view().unwrap(), ViewId(0));

        doc.destroy_view(view).unwrap();
        assert_eq!(doc.view_count().unwrap(), 1);
    }

    #[test]
    fn test_tile_mode() {
        let engine = FakeEngine::new();
        let (_office, doc) = open(&engine);
        assert_eq!(doc.tile_mode().unwrap(), TileMode::Bgra);

        engine.with_state(|state| state.doc.tile_mode = 9);
        assert!(matches!(
            doc.tile_mode(),
            Err(Error::UnexpectedValue { what: "tile mode", value: 9 })
        ));
    }

    #[test]
    fn test_text_selection_and_reset() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.initialize_for_rendering("").unwrap();

        assert_eq!(doc.text_selection("text/plain;charset=utf-8").unwrap(), "");

        doc.set_text_selection(TextSelectionKind::Start, 284, 284).unwrap();
        doc.set_text_selection(TextSelectionKind::End, 11906, 16838).unwrap();
        assert_eq!(
            doc.text_selection("text/plain;charset=utf-8").unwrap(),
            fake::SELECTED_TEXT
        );
        assert!(doc.text_selection("text/html").unwrap().starts_with("<p>"));

        doc.reset_selection().unwrap();
        assert_eq!(doc.text_selection("text/plain;charset=utf-8").unwrap(), "");
    }

    #[test]
    fn test_text_selection_reset_kind() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.set_text_selection(TextSelectionKind::Start, 0, 0).unwrap();
        doc.set_text_selection(TextSelectionKind::End, 100, 100).unwrap();
        doc.set_text_selection(TextSelectionKind::Reset, 0, 0).unwrap();
        assert_eq!(doc.text_selection("text/plain").unwrap(), "");
    }

    #[test]
    fn test_graphic_selection() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.set_graphic_selection(GraphicSelectionKind::Start, 10, 20).unwrap();
        doc.set_graphic_selection(GraphicSelectionKind::End, 30, 40).unwrap();
        assert_eq!(
            engine.state().doc.graphic_selection,
            vec![
                (sys::LOK_SETGRAPHICSELECTION_START, 10, 20),
                (sys::LOK_SETGRAPHICSELECTION_END, 30, 40)
            ]
        );
    }

    #[test]
    fn test_page_rectangles() {
        let engine = FakeEngine::new();
        let (_office, doc) = open(&engine);

        let pages = doc.part_page_rectangles().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], Rectangle::from_origin_size(284, 284, 11906, 16838));
        assert_eq!(pages[1].y0, 17406);
        assert!(pages.iter().all(|page| page.width() >= 0 && page.height() >= 0));

        let raw = doc.part_page_rectangles_raw().unwrap();
        assert_eq!(raw, fake::PAGE_RECTANGLES);
        assert_eq!(rect::parse_page_rectangles_strict(&raw).unwrap(), pages);
    }

    #[test]
    fn test_paint_tile() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.initialize_for_rendering("").unwrap();

        let mut buffer = vec![0u8; 4 * 8 * 4];
        doc.paint_tile(&mut buffer, 8, 4, 0, 0, 1440, 720).unwrap();
        assert!(buffer.chunks_exact(4).all(|px| px == fake::PAINTED_PIXEL));
        assert_eq!(engine.state().doc.paints, 1);
    }

    #[test]
    fn test_paint_tile_rejects_small_buffer() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        let mut buffer = vec![0u8; 4 * 8 * 4 - 1];
        let err = doc.paint_tile(&mut buffer, 8, 4, 0, 0, 1440, 720).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { required: 128, actual: 127 }));
        assert_eq!(engine.state().doc.paints, 0);
    }

    #[test]
    fn test_paint_tile_rejects_empty_canvas() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        let mut buffer = vec![0u8; 16];
        assert!(matches!(
            doc.paint_tile(&mut buffer, 0, 4, 0, 0, 1440, 720),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            doc.paint_tile(&mut buffer, 2, -1, 0, 0, 1440, 720),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(engine.state().doc.paints, 0);
    }

    #[test]
    fn test_render_tile_to_rgba() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.initialize_for_rendering("").unwrap();

        let tile = doc.render_tile(16, 16, 0, 0, 2880, 2880).unwrap();
        assert_eq!(tile.mode, TileMode::Bgra);
        assert_eq!(tile.pixels.len(), 16 * 16 * 4);

        let rgba = tile.into_rgba();
        let [b, g, r, a] = fake::PAINTED_PIXEL;
        assert!(rgba.chunks_exact(4).all(|px| px == [r, g, b, a]));
    }

    #[test]
    fn test_save_as() {
        let engine = FakeEngine::new();
        let (_office, doc) = open(&engine);

        doc.save_as("/tmp/out.pdf", Some("pdf"), None).unwrap();
        doc.save_as("/tmp/out.docx", None, Some("SkipImages")).unwrap();
        assert_eq!(
            engine.state().doc.saved,
            vec![
                ("/tmp/out.pdf".to_string(), Some("pdf".to_string()), None),
                ("/tmp/out.docx".to_string(), None, Some("SkipImages".to_string())),
            ]
        );
    }

    #[test]
    fn test_save_as_failure_reports_engine_message() {
        let engine = FakeEngine::new();
        let (office, doc) = open(&engine);

        let err = doc.save_as("/readonly/out.pdf", Some("pdf"), None).unwrap_err();
        match err {
            Error::Save { url, message } => {
                assert_eq!(url, "/readonly/out.pdf");
                assert!(message.contains("Could not write"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(office.last_error().contains("/readonly/out.pdf"));
    }

    #[test]
    fn test_input_events() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        doc.post_key_event(KeyEventKind::Input, 'a' as i32, 0).unwrap();
        doc.post_key_event(KeyEventKind::Up, 'a' as i32, 0).unwrap();
        doc.post_mouse_event(MouseEventKind::ButtonDown, 100, 200, 1, 1, 0).unwrap();
        doc.post_uno_command(".uno:Bold", None, false).unwrap();

        let state = engine.state();
        assert_eq!(
            state.doc.key_events,
            vec![
                (sys::LOK_KEYEVENT_KEYINPUT, 97, 0),
                (sys::LOK_KEYEVENT_KEYUP, 97, 0)
            ]
        );
        assert_eq!(
            state.doc.mouse_events,
            vec![[sys::LOK_MOUSEEVENT_MOUSEBUTTONDOWN, 100, 200, 1, 1, 0]]
        );
        assert_eq!(state.doc.uno_commands, vec![(".uno:Bold".to_string(), None, false)]);
    }

    #[test]
    fn test_paste_and_command_values() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);

        assert!(doc.paste("text/plain;charset=utf-8", b"pasted").unwrap());
        assert!(!doc.paste("text/plain;charset=utf-8", b"").unwrap());

        let values = doc.command_values(".uno:CharFontName").unwrap();
        let json: serde_json::Value = serde_json::from_str(&values).unwrap();
        assert_eq!(json["commandName"], ".uno:CharFontName");
    }

    #[test]
    fn test_client_zoom_and_visible_area() {
        let engine = FakeEngine::new();
        let (_office, mut doc) = open(&engine);
        doc.set_client_zoom(256, 256, 3840, 3840).unwrap();
        doc.set_client_visible_area(0, 0, 12000, 8000).unwrap();
        assert_eq!(engine.state().doc.client_zoom, Some([256, 256, 3840, 3840]));
        assert_eq!(engine.state().doc.visible_area, Some([0, 0, 12000, 8000]));
    }

    #[test]
    fn test_old_engine_lacks_views() {
        let engine = FakeEngine::with_document_class_size(offset_of!(sys::LibreOfficeKitDocumentClass, create_view));
        let (_office, mut doc) = open(&engine);

        assert!(matches!(doc.create_view(), Err(Error::Unsupported("create_view"))));
        assert!(matches!(doc.view_count(), Err(Error::Unsupported("get_views_count"))));
        assert_eq!(doc.part_count().unwrap(), 2);
    }

    #[test]
    fn test_document_destroyed_once() {
        let engine = FakeEngine::new();
        let office = engine.office();

        let first = office.load_document("sample.fodt").unwrap();
        first.close();
        assert_eq!(engine.state().documents_destroyed, 1);

        let second = office.load_document("sample.fodt").unwrap();
        drop(second);
        assert_eq!(engine.state().documents_destroyed, 2);
        assert_eq!(engine.state().office_destroyed, 0);

        drop(office);
        assert_eq!(engine.state().office_destroyed, 1);
    }

    #[test]
    fn test_document_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Document>();
    }
}
