//! In-process stand-in for the engine, for unit tests. Other crates of the
//! workspace get it through the `test-util` feature.
//!
//! Builds real class tables whose entry points are Rust `extern "C"`
//! functions recording what they were called with. Everything runs on the
//! test's own thread.

use std::cell::{Cell, Ref, RefCell};
use std::ffi::{CStr, CString};
use std::mem::size_of;
use std::os::raw::{c_char, c_int, c_long, c_uchar};
use std::path::PathBuf;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use lokit_sys as sys;

use crate::office::{Office, OfficeInner};

/// Page rectangles of the fake two-page text document.
pub const PAGE_RECTANGLES: &str = "284, 284, 11906, 16838; 284, 17406, 11906, 16838;";
pub const SELECTED_TEXT: &str = "Hello from page one";
pub const DOCUMENT_SIZE: (i64, i64) = (12474, 34528);
/// Pixel value the fake paints, in BGRA order.
pub const PAINTED_PIXEL: [u8; 4] = [0x10, 0x20, 0x30, 0xff];

thread_local! {
    static FREED: Cell<usize> = const { Cell::new(0) };
}

#[derive(Debug, Default)]
pub struct DocState {
    pub current_part: i32,
    pub part_mode: Option<i32>,
    pub tile_mode: i32,
    pub selection_start: Option<(i32, i32)>,
    pub selection_end: Option<(i32, i32)>,
    pub graphic_selection: Vec<(i32, i32, i32)>,
    pub rendering_options: Option<String>,
    pub views: Vec<i32>,
    pub current_view: i32,
    pub saved: Vec<(String, Option<String>, Option<String>)>,
    pub uno_commands: Vec<(String, Option<String>, bool)>,
    pub key_events: Vec<(i32, i32, i32)>,
    pub mouse_events: Vec<[i32; 6]>,
    pub pasted: Vec<(String, Vec<u8>)>,
    pub client_zoom: Option<[i32; 4]>,
    pub visible_area: Option<[i32; 4]>,
    pub paints: usize,
}

#[derive(Debug)]
pub struct FakeState {
    pub available: Vec<String>,
    pub loaded: Vec<String>,
    pub load_options: Vec<String>,
    pub last_error: String,
    pub office_destroyed: usize,
    pub documents_destroyed: usize,
    pub document_class_size: usize,
    /// State of the most recently loaded document.
    pub doc: DocState,
}

#[repr(C)]
struct FakeOffice {
    base: sys::LibreOfficeKit,
    class: Box<sys::LibreOfficeKitClass>,
    state: Rc<RefCell<FakeState>>,
}

#[repr(C)]
struct FakeDocument {
    base: sys::LibreOfficeKitDocument,
    class: Box<sys::LibreOfficeKitDocumentClass>,
    state: Rc<RefCell<FakeState>>,
}

pub struct FakeEngine {
    state: Rc<RefCell<FakeState>>,
    office_class_size: usize,
    freed_baseline: usize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::with_sizes(
            size_of::<sys::LibreOfficeKitClass>(),
            size_of::<sys::LibreOfficeKitDocumentClass>(),
        )
    }

    /// An engine whose office class table ends at `n_size` bytes.
    pub fn with_office_class_size(n_size: usize) -> Self {
        Self::with_sizes(n_size, size_of::<sys::LibreOfficeKitDocumentClass>())
    }

    /// An engine whose document class tables end at `n_size` bytes.
    pub fn with_document_class_size(n_size: usize) -> Self {
        Self::with_sizes(size_of::<sys::LibreOfficeKitClass>(), n_size)
    }

    fn with_sizes(office_class_size: usize, document_class_size: usize) -> Self {
        let state = FakeState {
            available: vec!["sample.fodt".to_string()],
            loaded: Vec::new(),
            load_options: Vec::new(),
            last_error: String::new(),
            office_destroyed: 0,
            documents_destroyed: 0,
            document_class_size,
            doc: DocState::default(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            office_class_size,
            freed_baseline: FREED.with(Cell::get),
        }
    }

    /// Start a fake office. It bypasses the process-wide engine guard.
    pub fn office(&self) -> Office {
        let class = Box::new(office_class(self.office_class_size));
        let mut office = Box::new(FakeOffice {
            base: sys::LibreOfficeKit { p_class: ptr::null_mut() },
            class,
            state: Rc::clone(&self.state),
        });
        office.base.p_class = &mut *office.class;
        let raw = NonNull::from(Box::leak(office)).cast::<sys::LibreOfficeKit>();
        Office::from_inner(OfficeInner::new(raw, PathBuf::from("/fake/program"), false))
    }

    pub fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub fn with_state(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.borrow_mut())
    }

    /// Engine strings released through `freeError` since this engine started.
    pub fn freed_strings(&self) -> usize {
        FREED.with(Cell::get) - self.freed_baseline
    }
}

fn dup(value: &str) -> *mut c_char {
    let owned = CString::new(value).expect("fake strings have no NUL");
    // SAFETY: valid C string; the binding frees the copy.
    unsafe { libc::strdup(owned.as_ptr()) }
}

unsafe fn read(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

// ---------------------------------------------------------------------------
// Office class
// ---------------------------------------------------------------------------

fn office_class(n_size: usize) -> sys::LibreOfficeKitClass {
    sys::LibreOfficeKitClass {
        n_size,
        destroy: Some(office_destroy),
        document_load: Some(office_document_load),
        get_error: Some(office_get_error),
        document_load_with_options: Some(office_document_load_with_options),
        free_error: Some(office_free_error),
        register_callback: None,
        get_filter_types: Some(office_get_filter_types),
        set_optional_features: None,
        set_document_password: None,
        get_version_info: Some(office_get_version_info),
    }
}

unsafe fn office_state<'a>(this: *mut sys::LibreOfficeKit) -> &'a Rc<RefCell<FakeState>> {
    &(*this.cast::<FakeOffice>()).state
}

unsafe extern "C" fn office_destroy(this: *mut sys::LibreOfficeKit) {
    let office = Box::from_raw(this.cast::<FakeOffice>());
    office.state.borrow_mut().office_destroyed += 1;
}

unsafe extern "C" fn office_document_load(
    this: *mut sys::LibreOfficeKit,
    url: *const c_char,
) -> *mut sys::LibreOfficeKitDocument {
    load(this, url, None)
}

unsafe extern "C" fn office_document_load_with_options(
    this: *mut sys::LibreOfficeKit,
    url: *const c_char,
    options: *const c_char,
) -> *mut sys::LibreOfficeKitDocument {
    load(this, url, read(options))
}

unsafe fn load(
    this: *mut sys::LibreOfficeKit,
    url: *const c_char,
    options: Option<String>,
) -> *mut sys::LibreOfficeKitDocument {
    let shared = office_state(this);
    let url = read(url).unwrap_or_default();
    let mut state = shared.borrow_mut();

    if !state.available.contains(&url) {
        state.last_error = format!("Unsupported URL <{url}>: \"type detection failed\"");
        return ptr::null_mut();
    }

    state.loaded.push(url);
    state.load_options.extend(options);
    state.doc = DocState {
        tile_mode: sys::LOK_TILEMODE_BGRA,
        views: vec![0],
        ..DocState::default()
    };

    let mut doc = Box::new(FakeDocument {
        base: sys::LibreOfficeKitDocument { p_class: ptr::null_mut() },
        class: Box::new(document_class(state.document_class_size)),
        state: Rc::clone(shared),
    });
    doc.base.p_class = &mut *doc.class;
    Box::into_raw(doc).cast()
}

unsafe extern "C" fn office_get_error(this: *mut sys::LibreOfficeKit) -> *mut c_char {
    dup(&office_state(this).borrow().last_error)
}

unsafe extern "C" fn office_free_error(free: *mut c_char) {
    FREED.with(|f| f.set(f.get() + 1));
    libc::free(free.cast());
}

unsafe extern "C" fn office_get_filter_types(_this: *mut sys::LibreOfficeKit) -> *mut c_char {
    dup(r#"{"writer8":{"MediaType":"application/vnd.oasis.opendocument.text"},"MS Word 2007 XML":{"MediaType":"application/vnd.openxmlformats-officedocument.wordprocessingml.document"}}"#)
}

unsafe extern "C" fn office_get_version_info(_this: *mut sys::LibreOfficeKit) -> *mut c_char {
    dup(r#"{ "ProductName": "LibreOffice", "ProductVersion": "7.6", "ProductExtension": ".4.1", "BuildId": "e19e193f88cd6c0525a17fb7a176ed8e6a3e2aa1" }"#)
}

// ---------------------------------------------------------------------------
// Document class
// ---------------------------------------------------------------------------

fn document_class(n_size: usize) -> sys::LibreOfficeKitDocumentClass {
    sys::LibreOfficeKitDocumentClass {
        n_size,
        destroy: Some(doc_destroy),
        save_as: Some(doc_save_as),
        get_document_type: Some(doc_get_document_type),
        get_parts: Some(doc_get_parts),
        get_part_page_rectangles: Some(doc_get_part_page_rectangles),
        get_part: Some(doc_get_part),
        set_part: Some(doc_set_part),
        get_part_name: Some(doc_get_part_name),
        set_part_mode: Some(doc_set_part_mode),
        paint_tile: Some(doc_paint_tile),
        get_tile_mode: Some(doc_get_tile_mode),
        get_document_size: Some(doc_get_document_size),
        initialize_for_rendering: Some(doc_initialize_for_rendering),
        register_callback: None,
        post_key_event: Some(doc_post_key_event),
        post_mouse_event: Some(doc_post_mouse_event),
        post_uno_command: Some(doc_post_uno_command),
        set_text_selection: Some(doc_set_text_selection),
        get_text_selection: Some(doc_get_text_selection),
        paste: Some(doc_paste),
        set_graphic_selection: Some(doc_set_graphic_selection),
        reset_selection: Some(doc_reset_selection),
        get_command_values: Some(doc_get_command_values),
        set_client_zoom: Some(doc_set_client_zoom),
        set_client_visible_area: Some(doc_set_client_visible_area),
        create_view: Some(doc_create_view),
        destroy_view: Some(doc_destroy_view),
        set_view: Some(doc_set_view),
        get_view: Some(doc_get_view),
        get_views_count: Some(doc_get_views_count),
    }
}

unsafe fn doc_state<'a>(this: *mut sys::LibreOfficeKitDocument) -> &'a RefCell<FakeState> {
    &(*this.cast::<FakeDocument>()).state
}

unsafe extern "C" fn doc_destroy(this: *mut sys::LibreOfficeKitDocument) {
    let doc = Box::from_raw(this.cast::<FakeDocument>());
    doc.state.borrow_mut().documents_destroyed += 1;
}

unsafe extern "C" fn doc_save_as(
    this: *mut sys::LibreOfficeKitDocument,
    url: *const c_char,
    format: *const c_char,
    filter_options: *const c_char,
) -> c_int {
    let mut state = doc_state(this).borrow_mut();
    let url = read(url).unwrap_or_default();
    if url.starts_with("/readonly/") {
        state.last_error = format!("exception: Could not write {url}");
        return 0;
    }
    state.doc.saved.push((url, read(format), read(filter_options)));
    1
}

unsafe extern "C" fn doc_get_document_type(_this: *mut sys::LibreOfficeKitDocument) -> c_int {
    sys::LOK_DOCTYPE_TEXT
}

unsafe extern "C" fn doc_get_parts(_this: *mut sys::LibreOfficeKitDocument) -> c_int {
    2
}

unsafe extern "C" fn doc_get_part_page_rectangles(_this: *mut sys::LibreOfficeKitDocument) -> *mut c_char {
    dup(PAGE_RECTANGLES)
}

unsafe extern "C" fn doc_get_part(this: *mut sys::LibreOfficeKitDocument) -> c_int {
    doc_state(this).borrow().doc.current_part
}

unsafe extern "C" fn doc_set_part(this: *mut sys::LibreOfficeKitDocument, part: c_int) {
    doc_state(this).borrow_mut().doc.current_part = part;
}

unsafe extern "C" fn doc_get_part_name(_this: *mut sys::LibreOfficeKitDocument, part: c_int) -> *mut c_char {
    dup(&format!("Page {}", part + 1))
}

unsafe extern "C" fn doc_set_part_mode(this: *mut sys::LibreOfficeKitDocument, mode: c_int) {
    doc_state(this).borrow_mut().doc.part_mode = Some(mode);
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn doc_paint_tile(
    this: *mut sys::LibreOfficeKitDocument,
    buffer: *mut c_uchar,
    canvas_width: c_int,
    canvas_height: c_int,
    _tile_pos_x: c_int,
    _tile_pos_y: c_int,
    _tile_width: c_int,
    _tile_height: c_int,
) {
    let pixels = (canvas_width * canvas_height) as usize;
    let buffer = std::slice::from_raw_parts_mut(buffer, pixels * 4);
    for pixel in buffer.chunks_exact_mut(4) {
        pixel.copy_from_slice(&PAINTED_PIXEL);
    }
    doc_state(this).borrow_mut().doc.paints += 1;
}

unsafe extern "C" fn doc_get_tile_mode(this: *mut sys::LibreOfficeKitDocument) -> c_int {
    doc_state(this).borrow().doc.tile_mode
}

unsafe extern "C" fn doc_get_document_size(
    _this: *mut sys::LibreOfficeKitDocument,
    width: *mut c_long,
    height: *mut c_long,
) {
    *width = DOCUMENT_SIZE.0 as c_long;
    *height = DOCUMENT_SIZE.1 as c_long;
}

unsafe extern "C" fn doc_initialize_for_rendering(this: *mut sys::LibreOfficeKitDocument, arguments: *const c_char) {
    doc_state(this).borrow_mut().doc.rendering_options = read(arguments);
}

unsafe extern "C" fn doc_post_key_event(
    this: *mut sys::LibreOfficeKitDocument,
    n_type: c_int,
    char_code: c_int,
    key_code: c_int,
) {
    doc_state(this)
        .borrow_mut()
        .doc
        .key_events
        .push((n_type, char_code, key_code));
}

unsafe extern "C" fn doc_post_mouse_event(
    this: *mut sys::LibreOfficeKitDocument,
    n_type: c_int,
    x: c_int,
    y: c_int,
    count: c_int,
    buttons: c_int,
    modifier: c_int,
) {
    doc_state(this)
        .borrow_mut()
        .doc
        .mouse_events
        .push([n_type, x, y, count, buttons, modifier]);
}

unsafe extern "C" fn doc_post_uno_command(
    this: *mut sys::LibreOfficeKitDocument,
    command: *const c_char,
    arguments: *const c_char,
    notify_when_finished: bool,
) {
    let entry = (read(command).unwrap_or_default(), read(arguments), notify_when_finished);
    doc_state(this).borrow_mut().doc.uno_commands.push(entry);
}

unsafe extern "C" fn doc_set_text_selection(this: *mut sys::LibreOfficeKitDocument, n_type: c_int, x: c_int, y: c_int) {
    let mut state = doc_state(this).borrow_mut();
    let doc = &mut state.doc;
    match n_type {
        sys::LOK_SETTEXTSELECTION_START => doc.selection_start = Some((x, y)),
        sys::LOK_SETTEXTSELECTION_END => doc.selection_end = Some((x, y)),
        _ => {
            doc.selection_start = None;
            doc.selection_end = None;
        }
    }
}

unsafe extern "C" fn doc_get_text_selection(
    this: *mut sys::LibreOfficeKitDocument,
    mime_type: *const c_char,
    used_mime_type: *mut *mut c_char,
) -> *mut c_char {
    let state = doc_state(this).borrow();
    if state.doc.selection_start.is_none() || state.doc.selection_end.is_none() {
        return ptr::null_mut();
    }
    let mime = read(mime_type).unwrap_or_default();
    if !used_mime_type.is_null() {
        *used_mime_type = dup(&mime);
    }
    if mime.starts_with("text/plain") {
        dup(SELECTED_TEXT)
    } else {
        dup(&format!("<p>{SELECTED_TEXT}</p>"))
    }
}

unsafe extern "C" fn doc_paste(
    this: *mut sys::LibreOfficeKitDocument,
    mime_type: *const c_char,
    data: *const c_char,
    size: usize,
) -> bool {
    let bytes = std::slice::from_raw_parts(data.cast::<u8>(), size).to_vec();
    let accepted = !bytes.is_empty();
    let entry = (read(mime_type).unwrap_or_default(), bytes);
    doc_state(this).borrow_mut().doc.pasted.push(entry);
    accepted
}

unsafe extern "C" fn doc_set_graphic_selection(this: *mut sys::LibreOfficeKitDocument, n_type: c_int, x: c_int, y: c_int) {
    doc_state(this).borrow_mut().doc.graphic_selection.push((n_type, x, y));
}

unsafe extern "C" fn doc_reset_selection(this: *mut sys::LibreOfficeKitDocument) {
    let mut state = doc_state(this).borrow_mut();
    let doc = &mut state.doc;
    doc.selection_start = None;
    doc.selection_end = None;
}

unsafe extern "C" fn doc_get_command_values(_this: *mut sys::LibreOfficeKitDocument, command: *const c_char) -> *mut c_char {
    let command = read(command).unwrap_or_default();
    dup(&format!(r#"{{"commandName":"{command}","commandValues":[]}}"#))
}

unsafe extern "C" fn doc_set_client_zoom(
    this: *mut sys::LibreOfficeKitDocument,
    tile_pixel_width: c_int,
    tile_pixel_height: c_int,
    tile_twip_width: c_int,
    tile_twip_height: c_int,
) {
    doc_state(this).borrow_mut().doc.client_zoom =
        Some([tile_pixel_width, tile_pixel_height, tile_twip_width, tile_twip_height]);
}

unsafe extern "C" fn doc_set_client_visible_area(
    this: *mut sys::LibreOfficeKitDocument,
    x: c_int,
    y: c_int,
    width: c_int,
    height: c_int,
) {
    doc_state(this).borrow_mut().doc.visible_area = Some([x, y, width, height]);
}

unsafe extern "C" fn doc_create_view(this: *mut sys::LibreOfficeKitDocument) -> c_int {
    let mut state = doc_state(this).borrow_mut();
    let doc = &mut state.doc;
    let id = doc.views.iter().max().map_or(0, |max| max + 1);
    doc.views.push(id);
    doc.current_view = id;
    id
}

unsafe extern "C" fn doc_destroy_view(this: *mut sys::LibreOfficeKitDocument, id: c_int) {
    doc_state(this).borrow_mut().doc.views.retain(|&view| view != id);
}

unsafe extern "C" fn doc_set_view(this: *mut sys::LibreOfficeKitDocument, id: c_int) {
    doc_state(this).borrow_mut().doc.current_view = id;
}

unsafe extern "C" fn doc_get_view(this: *mut sys::LibreOfficeKitDocument) -> c_int {
    doc_state(this).borrow().doc.current_view
}

unsafe extern "C" fn doc_get_views_count(this: *mut sys::LibreOfficeKitDocument) -> c_int {
    doc_state(this).borrow().doc.views.len() as c_int
}
