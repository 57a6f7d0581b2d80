//! Document FFI functions

use std::os::raw::{c_char, c_int};

use lokit::{Error, TextSelectionKind};

use crate::error::*;
use crate::handles::{with_document, Handle};
use crate::util::{into_raw_string, optional_str_arg, str_arg};
use crate::with_context;

/// A page rectangle in twips.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LokRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl From<lokit::Rectangle> for LokRect {
    fn from(rect: lokit::Rectangle) -> Self {
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

macro_rules! try_arg {
    ($e:expr) => {
        match $e {
            Ok(value) => value,
            Err(code) => return code,
        }
    };
}

/// Free a document
#[no_mangle]
pub extern "C" fn lok_document_free(handle: Handle) -> c_int {
    with_context!(|mut ctx| {
        if ctx.destroy_document(handle) {
            LOK_OK
        } else {
            LOK_ERR_INVALID_HANDLE
        }
    })
}

/// Document type as a `LOK_DOCTYPE_*` value.
///
/// # Safety
///
/// `out_type` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_type(handle: Handle, out_type: *mut c_int) -> c_int {
    if out_type.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_type = doc.document_type()?.as_raw();
        Ok(())
    })
}

/// # Safety
///
/// `out_count` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_part_count(handle: Handle, out_count: *mut c_int) -> c_int {
    if out_count.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_count = doc.part_count()?;
        Ok(())
    })
}

/// # Safety
///
/// `out_part` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_current_part(handle: Handle, out_part: *mut c_int) -> c_int {
    if out_part.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_part = doc.current_part()?;
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn lok_document_set_part(handle: Handle, part: c_int) -> c_int {
    with_document(handle, |doc| doc.set_part(part))
}

/// Name of a part. Free with `lok_string_free`.
///
/// # Safety
///
/// `out_name` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_part_name(handle: Handle, part: c_int, out_name: *mut *mut c_char) -> c_int {
    if out_name.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_name = into_raw_string(doc.part_name(part)?)?;
        Ok(())
    })
}

/// Document size in twips.
///
/// # Safety
///
/// `out_width` and `out_height` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_size(handle: Handle, out_width: *mut i64, out_height: *mut i64) -> c_int {
    if out_width.is_null() || out_height.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        let (width, height) = doc.size()?;
        *out_width = width;
        *out_height = height;
        Ok(())
    })
}

/// Prepare for rendering. `options` may be null for defaults.
///
/// # Safety
///
/// `options` must be null or a valid string.
#[no_mangle]
pub unsafe extern "C" fn lok_document_initialize_for_rendering(handle: Handle, options: *const c_char) -> c_int {
    let options = try_arg!(optional_str_arg(options));
    with_document(handle, |doc| doc.initialize_for_rendering(options.unwrap_or("")))
}

/// Export the document. `format` and `filter_options` may be null.
///
/// # Safety
///
/// `path` must be a valid string; `format` and `filter_options` must be null
/// or valid strings.
#[no_mangle]
pub unsafe extern "C" fn lok_document_save_as(
    handle: Handle,
    path: *const c_char,
    format: *const c_char,
    filter_options: *const c_char,
) -> c_int {
    let path = try_arg!(str_arg(path));
    let format = try_arg!(optional_str_arg(format));
    let filter_options = try_arg!(optional_str_arg(filter_options));
    with_document(handle, |doc| doc.save_as(path, format, filter_options))
}

/// Create a view and make it current.
///
/// # Safety
///
/// `out_view` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_create_view(handle: Handle, out_view: *mut c_int) -> c_int {
    if out_view.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_view = doc.create_view()?.0;
        Ok(())
    })
}

/// # Safety
///
/// `out_view` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_current_view(handle: Handle, out_view: *mut c_int) -> c_int {
    if out_view.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_view = doc.current_view()?.0;
        Ok(())
    })
}

/// # Safety
///
/// `out_count` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_view_count(handle: Handle, out_count: *mut c_int) -> c_int {
    if out_count.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_count = doc.view_count()?;
        Ok(())
    })
}

/// Pixel order of painted tiles as a `LOK_TILEMODE_*` value.
///
/// # Safety
///
/// `out_mode` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_tile_mode(handle: Handle, out_mode: *mut c_int) -> c_int {
    if out_mode.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        *out_mode = doc.tile_mode()?.as_raw();
        Ok(())
    })
}

/// Selected content as `mime_type`. Free with `lok_string_free`.
///
/// # Safety
///
/// `mime_type` must be a valid string; `out_text` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_text_selection(
    handle: Handle,
    mime_type: *const c_char,
    out_text: *mut *mut c_char,
) -> c_int {
    if out_text.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    let mime_type = try_arg!(str_arg(mime_type));
    with_document(handle, |doc| {
        *out_text = into_raw_string(doc.text_selection(mime_type)?)?;
        Ok(())
    })
}

/// Move a selection anchor. `kind` is a `LOK_SETTEXTSELECTION_*` value.
#[no_mangle]
pub extern "C" fn lok_document_set_text_selection(handle: Handle, kind: c_int, x: c_int, y: c_int) -> c_int {
    let kind = match TextSelectionKind::from_raw(kind) {
        Some(kind) => kind,
        None => return fail(Error::InvalidArgument(format!("unknown text selection type {kind}"))),
    };
    with_document(handle, |doc| doc.set_text_selection(kind, x, y))
}

#[no_mangle]
pub extern "C" fn lok_document_reset_selection(handle: Handle) -> c_int {
    with_document(handle, |doc| doc.reset_selection())
}

/// Page rectangles of a text document.
///
/// Copies up to `capacity` rectangles into `out_rects` and stores the total
/// number of pages in `out_count`. Call with `capacity` 0 to size the array.
///
/// # Safety
///
/// `out_rects` must be valid for `capacity` writes (it may be null when
/// `capacity` is 0); `out_count` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_document_page_rectangles(
    handle: Handle,
    out_rects: *mut LokRect,
    capacity: usize,
    out_count: *mut usize,
) -> c_int {
    if out_count.is_null() || (out_rects.is_null() && capacity > 0) {
        return LOK_ERR_NULL_PTR;
    }
    with_document(handle, |doc| {
        let pages = doc.part_page_rectangles()?;
        for (i, page) in pages.iter().take(capacity).enumerate() {
            *out_rects.add(i) = LokRect::from(*page);
        }
        *out_count = pages.len();
        Ok(())
    })
}

/// Paint a tile into `buffer`, in the document's tile mode.
///
/// `buffer_len` must be at least `4 * canvas_width * canvas_height`.
///
/// Rendering holds the global handle table lock until the tile is painted:
/// calls on any other office or document handle wait for it. The engine runs
/// one native call at a time anyway, so the extra wait is for handle
/// bookkeeping such as `lok_document_free`.
///
/// # Safety
///
/// `buffer` must be valid for writes of `buffer_len` bytes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn lok_document_paint_tile(
    handle: Handle,
    buffer: *mut u8,
    buffer_len: usize,
    canvas_width: c_int,
    canvas_height: c_int,
    tile_x: c_int,
    tile_y: c_int,
    tile_width: c_int,
    tile_height: c_int,
) -> c_int {
    if buffer.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    let buffer = std::slice::from_raw_parts_mut(buffer, buffer_len);
    with_document(handle, |doc| {
        doc.paint_tile(
            buffer,
            canvas_width,
            canvas_height,
            tile_x,
            tile_y,
            tile_width,
            tile_height,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{CONTEXT, HANDLE_NULL};
    use crate::office::{lok_office_free, lok_office_load_document};
    use lokit::fake::{FakeEngine, PAINTED_PIXEL};
    use std::ffi::CString;
    use std::ptr;

    const MISSING: Handle = u64::MAX;

    /// Register a fake office and load its sample document through the C API.
    fn open_sample(engine: &FakeEngine) -> (Handle, Handle) {
        let office = CONTEXT.lock().unwrap().insert_office(engine.office());
        let path = CString::new("sample.fodt").unwrap();
        let mut document = HANDLE_NULL;
        let code = unsafe { lok_office_load_document(office, path.as_ptr(), &mut document) };
        assert_eq!(code, LOK_OK);
        assert_ne!(document, HANDLE_NULL);
        (office, document)
    }

    fn close(office: Handle, document: Handle) {
        assert_eq!(lok_document_free(document), LOK_OK);
        assert_eq!(lok_office_free(office), LOK_OK);
    }

    #[test]
    fn test_page_rectangles_truncated_to_capacity() {
        let engine = FakeEngine::new();
        let (office, document) = open_sample(&engine);

        let mut rects = [LokRect::default(); 1];
        let mut count = 0usize;
        let code = unsafe { lok_document_page_rectangles(document, rects.as_mut_ptr(), rects.len(), &mut count) };
        assert_eq!(code, LOK_OK);
        assert_eq!(count, 2);
        assert_eq!(
            rects[0],
            LokRect {
                x: 284,
                y: 284,
                width: 11906,
                height: 16838
            }
        );

        let mut count = 0usize;
        let code = unsafe { lok_document_page_rectangles(document, ptr::null_mut(), 0, &mut count) };
        assert_eq!(code, LOK_OK);
        assert_eq!(count, 2);

        close(office, document);
    }

    #[test]
    fn test_paint_tile_checks_buffer_len() {
        let engine = FakeEngine::new();
        let (office, document) = open_sample(&engine);

        let mut buffer = vec![0u8; 2 * 2 * 4];
        let code = unsafe {
            lok_document_paint_tile(document, buffer.as_mut_ptr(), buffer.len() - 1, 2, 2, 0, 0, 3840, 3840)
        };
        assert_eq!(code, LOK_ERR_BUFFER_TOO_SMALL);
        assert!(buffer.iter().all(|&b| b == 0));
        assert_eq!(engine.state().doc.paints, 0);

        let code =
            unsafe { lok_document_paint_tile(document, buffer.as_mut_ptr(), buffer.len(), 2, 2, 0, 0, 3840, 3840) };
        assert_eq!(code, LOK_OK);
        assert!(buffer.chunks_exact(4).all(|pixel| pixel == PAINTED_PIXEL));

        close(office, document);
    }

    #[test]
    fn test_freed_document_handle_is_invalid() {
        let engine = FakeEngine::new();
        let (office, document) = open_sample(&engine);

        let mut parts: c_int = 0;
        assert_eq!(unsafe { lok_document_part_count(document, &mut parts) }, LOK_OK);
        assert_eq!(parts, 2);

        assert_eq!(lok_document_free(document), LOK_OK);
        assert_eq!(engine.state().documents_destroyed, 1);
        assert_eq!(unsafe { lok_document_part_count(document, &mut parts) }, LOK_ERR_INVALID_HANDLE);
        assert_eq!(lok_document_set_part(document, 1), LOK_ERR_INVALID_HANDLE);
        assert_eq!(lok_document_free(document), LOK_ERR_INVALID_HANDLE);

        assert_eq!(lok_office_free(office), LOK_OK);
        assert_eq!(engine.state().office_destroyed, 1);
    }

    #[test]
    fn test_rect_from_rectangle() {
        let rect = LokRect::from(lokit::Rectangle::from_origin_size(284, 17406, 11906, 16838));
        assert_eq!(
            rect,
            LokRect {
                x: 284,
                y: 17406,
                width: 11906,
                height: 16838
            }
        );
    }

    #[test]
    fn test_unknown_document_handle() {
        let mut value: c_int = 0;
        let mut width = 0i64;
        let mut height = 0i64;
        let mut count = 0usize;
        let mime = CString::new("text/plain;charset=utf-8").unwrap();
        let mut text = ptr::null_mut();

        assert_eq!(lok_document_free(MISSING), LOK_ERR_INVALID_HANDLE);
        unsafe {
            assert_eq!(lok_document_type(MISSING, &mut value), LOK_ERR_INVALID_HANDLE);
            assert_eq!(lok_document_part_count(MISSING, &mut value), LOK_ERR_INVALID_HANDLE);
            assert_eq!(lok_document_size(MISSING, &mut width, &mut height), LOK_ERR_INVALID_HANDLE);
            assert_eq!(lok_document_view_count(MISSING, &mut value), LOK_ERR_INVALID_HANDLE);
            assert_eq!(
                lok_document_text_selection(MISSING, mime.as_ptr(), &mut text),
                LOK_ERR_INVALID_HANDLE
            );
            assert_eq!(
                lok_document_page_rectangles(MISSING, ptr::null_mut(), 0, &mut count),
                LOK_ERR_INVALID_HANDLE
            );
        }
        assert_eq!(lok_document_set_part(MISSING, 1), LOK_ERR_INVALID_HANDLE);
        assert_eq!(lok_document_reset_selection(MISSING), LOK_ERR_INVALID_HANDLE);
        assert!(text.is_null());
    }

    #[test]
    fn test_null_arguments() {
        let buffer = [0u8; 16];
        let mut count = 0usize;
        unsafe {
            assert_eq!(lok_document_type(1, ptr::null_mut()), LOK_ERR_NULL_PTR);
            assert_eq!(lok_document_size(1, ptr::null_mut(), ptr::null_mut()), LOK_ERR_NULL_PTR);
            assert_eq!(
                lok_document_page_rectangles(1, ptr::null_mut(), 4, &mut count),
                LOK_ERR_NULL_PTR
            );
            assert_eq!(
                lok_document_paint_tile(1, ptr::null_mut(), buffer.len(), 2, 2, 0, 0, 100, 100),
                LOK_ERR_NULL_PTR
            );
            assert_eq!(
                lok_document_save_as(1, ptr::null(), ptr::null(), ptr::null()),
                LOK_ERR_NULL_PTR
            );
        }
    }

    #[test]
    fn test_set_text_selection_rejects_unknown_kind() {
        assert_eq!(lok_document_set_text_selection(MISSING, 7, 0, 0), LOK_ERR_INVALID_ARGUMENT);
    }
}
