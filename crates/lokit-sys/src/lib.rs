//! Raw layout of the LibreOfficeKit C ABI.
//!
//! LibreOfficeKit exposes no exported functions besides its bootstrap hook.
//! Every other entry point is reached through a table of function pointers
//! (a "class") hanging off each handle:
//!
//! ```text
//! LibreOfficeKit          { pClass } ──► LibreOfficeKitClass         { nSize, destroy, documentLoad, ... }
//! LibreOfficeKitDocument  { pClass } ──► LibreOfficeKitDocumentClass { nSize, destroy, saveAs, ... }
//! ```
//!
//! The engine only ever appends to these tables. `n_size` is the byte size of
//! the table the running engine actually provides, so a field is present only
//! if it ends at or before `n_size`. The structs below mirror the tables up to
//! the last entry this workspace uses; reading past `n_size` is undefined, so
//! callers must read fields through raw pointers after checking the offset.
//!
//! # Safety
//!
//! Everything here is plain data. All function pointers are `unsafe extern "C"`
//! and perform no validation of their arguments.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_long, c_uchar, c_ulonglong, c_void};

/// Callback signature used by `registerCallback` on both tables.
pub type LibreOfficeKitCallback =
    Option<unsafe extern "C" fn(n_type: c_int, payload: *const c_char, data: *mut c_void)>;

/// `libreofficekit_hook_2`: create (or fetch) the engine instance.
pub type LokHookFunction2 = unsafe extern "C" fn(
    install_path: *const c_char,
    user_profile_url: *const c_char,
) -> *mut LibreOfficeKit;

/// `libreofficekit_hook`: the pre-profile bootstrap, kept by older engines.
pub type LokHookFunction = unsafe extern "C" fn(install_path: *const c_char) -> *mut LibreOfficeKit;

/// Symbol name of [`LokHookFunction2`].
pub const LOK_HOOK_2: &[u8] = b"libreofficekit_hook_2\0";
/// Symbol name of [`LokHookFunction`].
pub const LOK_HOOK: &[u8] = b"libreofficekit_hook\0";

/// Engine library, relative to the install directory.
#[cfg(all(unix, not(target_os = "macos")))]
pub const TARGET_LIB: &str = "libsofficeapp.so";
#[cfg(target_os = "macos")]
pub const TARGET_LIB: &str = "libsofficeapp.dylib";
#[cfg(windows)]
pub const TARGET_LIB: &str = "sofficeapp.dll";

/// Merged-library builds ship everything in one library instead.
#[cfg(all(unix, not(target_os = "macos")))]
pub const TARGET_MERGED_LIB: &str = "libmergedlo.so";
#[cfg(target_os = "macos")]
pub const TARGET_MERGED_LIB: &str = "libmergedlo.dylib";
#[cfg(windows)]
pub const TARGET_MERGED_LIB: &str = "mergedlo.dll";

// Document types returned by `getDocumentType`.
pub const LOK_DOCTYPE_TEXT: c_int = 0;
pub const LOK_DOCTYPE_SPREADSHEET: c_int = 1;
pub const LOK_DOCTYPE_PRESENTATION: c_int = 2;
pub const LOK_DOCTYPE_DRAWING: c_int = 3;
pub const LOK_DOCTYPE_OTHER: c_int = 4;

// Channel order of `paintTile` output, returned by `getTileMode`.
pub const LOK_TILEMODE_RGBA: c_int = 0;
pub const LOK_TILEMODE_BGRA: c_int = 1;

// `setPartMode`
pub const LOK_PARTMODE_SLIDES: c_int = 0;
pub const LOK_PARTMODE_NOTES: c_int = 1;

// `setTextSelection`
pub const LOK_SETTEXTSELECTION_START: c_int = 0;
pub const LOK_SETTEXTSELECTION_END: c_int = 1;
pub const LOK_SETTEXTSELECTION_RESET: c_int = 2;

// `setGraphicSelection`
pub const LOK_SETGRAPHICSELECTION_START: c_int = 0;
pub const LOK_SETGRAPHICSELECTION_END: c_int = 1;

// `postKeyEvent`
pub const LOK_KEYEVENT_KEYINPUT: c_int = 0;
pub const LOK_KEYEVENT_KEYUP: c_int = 1;

// `postMouseEvent`
pub const LOK_MOUSEEVENT_MOUSEBUTTONDOWN: c_int = 0;
pub const LOK_MOUSEEVENT_MOUSEBUTTONUP: c_int = 1;
pub const LOK_MOUSEEVENT_MOUSEMOVE: c_int = 2;

/// Engine instance handle (`struct _LibreOfficeKit`).
#[repr(C)]
pub struct LibreOfficeKit {
    pub p_class: *mut LibreOfficeKitClass,
}

/// Document handle (`struct _LibreOfficeKitDocument`).
#[repr(C)]
pub struct LibreOfficeKitDocument {
    pub p_class: *mut LibreOfficeKitDocumentClass,
}

/// Entry points of an engine instance (`struct _LibreOfficeKitClass`).
#[repr(C)]
#[derive(Default)]
pub struct LibreOfficeKitClass {
    pub n_size: usize,

    pub destroy: Option<unsafe extern "C" fn(this: *mut LibreOfficeKit)>,
    pub document_load: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKit, url: *const c_char) -> *mut LibreOfficeKitDocument,
    >,
    pub get_error: Option<unsafe extern "C" fn(this: *mut LibreOfficeKit) -> *mut c_char>,
    pub document_load_with_options: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKit,
            url: *const c_char,
            options: *const c_char,
        ) -> *mut LibreOfficeKitDocument,
    >,
    pub free_error: Option<unsafe extern "C" fn(free: *mut c_char)>,
    pub register_callback: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKit, callback: LibreOfficeKitCallback, data: *mut c_void),
    >,
    pub get_filter_types: Option<unsafe extern "C" fn(this: *mut LibreOfficeKit) -> *mut c_char>,
    pub set_optional_features: Option<unsafe extern "C" fn(this: *mut LibreOfficeKit, features: c_ulonglong)>,
    pub set_document_password: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKit, url: *const c_char, password: *const c_char),
    >,
    pub get_version_info: Option<unsafe extern "C" fn(this: *mut LibreOfficeKit) -> *mut c_char>,
}

/// Entry points of a document (`struct _LibreOfficeKitDocumentClass`).
#[repr(C)]
#[derive(Default)]
pub struct LibreOfficeKitDocumentClass {
    pub n_size: usize,

    pub destroy: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument)>,
    pub save_as: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            url: *const c_char,
            format: *const c_char,
            filter_options: *const c_char,
        ) -> c_int,
    >,
    pub get_document_type: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub get_parts: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub get_part_page_rectangles: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> *mut c_char>,
    pub get_part: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub set_part: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, part: c_int)>,
    pub get_part_name: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, part: c_int) -> *mut c_char>,
    pub set_part_mode: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, mode: c_int)>,
    pub paint_tile: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            buffer: *mut c_uchar,
            canvas_width: c_int,
            canvas_height: c_int,
            tile_pos_x: c_int,
            tile_pos_y: c_int,
            tile_width: c_int,
            tile_height: c_int,
        ),
    >,
    pub get_tile_mode: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub get_document_size:
        Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, width: *mut c_long, height: *mut c_long)>,
    pub initialize_for_rendering:
        Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, arguments: *const c_char)>,
    pub register_callback: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, callback: LibreOfficeKitCallback, data: *mut c_void),
    >,
    pub post_key_event: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, n_type: c_int, char_code: c_int, key_code: c_int),
    >,
    pub post_mouse_event: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            n_type: c_int,
            x: c_int,
            y: c_int,
            count: c_int,
            buttons: c_int,
            modifier: c_int,
        ),
    >,
    pub post_uno_command: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            command: *const c_char,
            arguments: *const c_char,
            notify_when_finished: bool,
        ),
    >,
    pub set_text_selection:
        Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, n_type: c_int, x: c_int, y: c_int)>,
    pub get_text_selection: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            mime_type: *const c_char,
            used_mime_type: *mut *mut c_char,
        ) -> *mut c_char,
    >,
    pub paste: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            mime_type: *const c_char,
            data: *const c_char,
            size: usize,
        ) -> bool,
    >,
    pub set_graphic_selection:
        Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, n_type: c_int, x: c_int, y: c_int)>,
    pub reset_selection: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument)>,
    pub get_command_values:
        Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, command: *const c_char) -> *mut c_char>,
    pub set_client_zoom: Option<
        unsafe extern "C" fn(
            this: *mut LibreOfficeKitDocument,
            tile_pixel_width: c_int,
            tile_pixel_height: c_int,
            tile_twip_width: c_int,
            tile_twip_height: c_int,
        ),
    >,
    pub set_client_visible_area: Option<
        unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, x: c_int, y: c_int, width: c_int, height: c_int),
    >,
    pub create_view: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub destroy_view: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, id: c_int)>,
    pub set_view: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument, id: c_int)>,
    pub get_view: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
    pub get_views_count: Option<unsafe extern "C" fn(this: *mut LibreOfficeKitDocument) -> c_int>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    const PTR: usize = size_of::<usize>();

    #[test]
    fn test_office_class_layout() {
        assert_eq!(offset_of!(LibreOfficeKitClass, destroy), PTR);
        assert_eq!(offset_of!(LibreOfficeKitClass, document_load), 2 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitClass, get_error), 3 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitClass, get_filter_types), 7 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitClass, get_version_info), 10 * PTR);
        assert_eq!(size_of::<LibreOfficeKitClass>(), 11 * PTR);
    }

    #[test]
    fn test_document_class_layout() {
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, destroy), PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, save_as), 2 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, get_document_type), 3 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, paint_tile), 10 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, set_text_selection), 18 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, reset_selection), 22 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, create_view), 26 * PTR);
        assert_eq!(offset_of!(LibreOfficeKitDocumentClass, get_views_count), 30 * PTR);
    }

    #[test]
    fn test_nullable_entries_are_pointer_sized() {
        assert_eq!(size_of::<Option<unsafe extern "C" fn(*mut LibreOfficeKit)>>(), PTR);
        assert_eq!(size_of::<LibreOfficeKitCallback>(), PTR);
    }
}
