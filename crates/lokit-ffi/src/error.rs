//! FFI error codes

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;

use lokit::Error;

// Success
pub const LOK_OK: c_int = 0;

// General errors
pub const LOK_ERR_NULL_PTR: c_int = -1;
pub const LOK_ERR_INVALID_HANDLE: c_int = -2;
pub const LOK_ERR_INTERNAL: c_int = -3;

// Engine lifecycle
pub const LOK_ERR_INIT: c_int = -10;
pub const LOK_ERR_NOT_FOUND: c_int = -11;
pub const LOK_ERR_ALREADY_INITIALIZED: c_int = -12;
pub const LOK_ERR_ENGINE_TERMINATED: c_int = -13;

// Document errors
pub const LOK_ERR_LOAD: c_int = -20;
pub const LOK_ERR_SAVE: c_int = -21;
pub const LOK_ERR_UNSUPPORTED: c_int = -22;

// Argument errors
pub const LOK_ERR_BUFFER_TOO_SMALL: c_int = -30;
pub const LOK_ERR_INVALID_ARGUMENT: c_int = -31;
pub const LOK_ERR_INVALID_PATH: c_int = -32;
pub const LOK_ERR_NUL: c_int = -33;

// Unexpected engine output
pub const LOK_ERR_UNEXPECTED_VALUE: c_int = -40;
pub const LOK_ERR_MALFORMED_RECTANGLE: c_int = -41;
pub const LOK_ERR_VERSION_INFO: c_int = -42;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Status code for a binding error.
pub fn error_code(err: &Error) -> c_int {
    match err {
        Error::Initialization { .. } => LOK_ERR_INIT,
        Error::NotFound => LOK_ERR_NOT_FOUND,
        Error::AlreadyInitialized => LOK_ERR_ALREADY_INITIALIZED,
        Error::EngineTerminated => LOK_ERR_ENGINE_TERMINATED,
        Error::Load { .. } => LOK_ERR_LOAD,
        Error::Save { .. } => LOK_ERR_SAVE,
        Error::Unsupported(_) => LOK_ERR_UNSUPPORTED,
        Error::BufferTooSmall { .. } => LOK_ERR_BUFFER_TOO_SMALL,
        Error::InvalidArgument(_) => LOK_ERR_INVALID_ARGUMENT,
        Error::InvalidPath(_) => LOK_ERR_INVALID_PATH,
        Error::Nul(_) => LOK_ERR_NUL,
        Error::UnexpectedValue { .. } => LOK_ERR_UNEXPECTED_VALUE,
        Error::MalformedRectangle { .. } => LOK_ERR_MALFORMED_RECTANGLE,
        Error::VersionInfo(_) => LOK_ERR_VERSION_INFO,
    }
}

/// Remember `message` as this thread's last error and return `code`.
pub(crate) fn fail_with(code: c_int, message: impl Into<Vec<u8>>) -> c_int {
    let mut bytes = message.into();
    bytes.retain(|&b| b != 0);
    let message = CString::new(bytes).ok();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = message);
    code
}

/// Remember `err` as this thread's last error and return its code.
pub(crate) fn fail(err: Error) -> c_int {
    tracing::debug!("FFI call failed: {err}");
    fail_with(error_code(&err), err.to_string())
}

pub(crate) fn status(result: lokit::Result<()>) -> c_int {
    match result {
        Ok(()) => LOK_OK,
        Err(e) => fail(e),
    }
}

/// Get error message for an error code
#[no_mangle]
pub extern "C" fn lok_error_message(code: c_int) -> *const c_char {
    let msg: &'static [u8] = match code {
        LOK_OK => b"Success\0",
        LOK_ERR_NULL_PTR => b"Null pointer argument\0",
        LOK_ERR_INVALID_HANDLE => b"Invalid handle\0",
        LOK_ERR_INTERNAL => b"Internal error\0",
        LOK_ERR_INIT => b"LibreOfficeKit initialization failed\0",
        LOK_ERR_NOT_FOUND => b"LibreOffice installation not found\0",
        LOK_ERR_ALREADY_INITIALIZED => b"LibreOfficeKit already initialized\0",
        LOK_ERR_ENGINE_TERMINATED => b"LibreOfficeKit already destroyed\0",
        LOK_ERR_LOAD => b"Document load failed\0",
        LOK_ERR_SAVE => b"Document save failed\0",
        LOK_ERR_UNSUPPORTED => b"Unsupported by this LibreOffice version\0",
        LOK_ERR_BUFFER_TOO_SMALL => b"Buffer too small\0",
        LOK_ERR_INVALID_ARGUMENT => b"Invalid argument\0",
        LOK_ERR_INVALID_PATH => b"Invalid path\0",
        LOK_ERR_NUL => b"String contains a NUL byte\0",
        LOK_ERR_UNEXPECTED_VALUE => b"Unexpected value from LibreOfficeKit\0",
        LOK_ERR_MALFORMED_RECTANGLE => b"Malformed page rectangle\0",
        LOK_ERR_VERSION_INFO => b"Invalid version info\0",
        _ => b"Unknown error\0",
    };

    msg.as_ptr() as *const c_char
}

/// Detailed message of the last failed call on this thread, or null.
///
/// The pointer stays valid until the next failing call on the same thread.
/// Do not free it.
#[no_mangle]
pub extern "C" fn lok_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |msg| msg.as_ptr()))
}
