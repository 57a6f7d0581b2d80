//! Office FFI functions

use std::os::raw::{c_char, c_int};
use std::ptr;

use lokit::Office;

use crate::error::*;
use crate::handles::{with_office, Handle};
use crate::util::{into_raw_string, str_arg};
use crate::with_context;

/// Start the engine.
///
/// `install_path` is LibreOffice's `program` directory; null resolves it
/// from `LOK_PATH` and the usual install locations.
///
/// # Safety
///
/// `install_path` must be null or a valid string; `out_handle` must be null
/// or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_office_new(install_path: *const c_char, out_handle: *mut Handle) -> c_int {
    if out_handle.is_null() {
        return LOK_ERR_NULL_PTR;
    }

    let result = if install_path.is_null() {
        Office::from_env()
    } else {
        match str_arg(install_path) {
            Ok(path) => Office::new(path),
            Err(code) => return code,
        }
    };

    match result {
        Ok(office) => with_context!(|mut ctx| {
            *out_handle = ctx.insert_office(office);
            LOK_OK
        }),
        Err(e) => fail(e),
    }
}

/// Free an office handle. The engine shuts down once every document opened
/// from it has been freed too.
#[no_mangle]
pub extern "C" fn lok_office_free(handle: Handle) -> c_int {
    with_context!(|mut ctx| {
        if ctx.destroy_office(handle) {
            LOK_OK
        } else {
            LOK_ERR_INVALID_HANDLE
        }
    })
}

/// The engine's last error message, or null for an unknown handle.
/// Free the result with `lok_string_free`.
#[no_mangle]
pub extern "C" fn lok_office_last_error(handle: Handle) -> *mut c_char {
    let mut message = ptr::null_mut();
    with_office(handle, |office| {
        message = into_raw_string(office.last_error())?;
        Ok(())
    });
    message
}

/// Load a document.
///
/// # Safety
///
/// `path` must be a valid string; `out_document` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_office_load_document(
    handle: Handle,
    path: *const c_char,
    out_document: *mut Handle,
) -> c_int {
    if out_document.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    let path = match str_arg(path) {
        Ok(path) => path,
        Err(code) => return code,
    };

    with_context!(|mut ctx| {
        let result = match ctx.get_office(handle) {
            Some(office) => office.load_document(path),
            None => return LOK_ERR_INVALID_HANDLE,
        };
        match result {
            Ok(doc) => {
                *out_document = ctx.insert_document(doc);
                LOK_OK
            }
            Err(e) => fail(e),
        }
    })
}

/// The engine's filter description JSON. Free with `lok_string_free`.
///
/// # Safety
///
/// `out_json` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_office_filter_types(handle: Handle, out_json: *mut *mut c_char) -> c_int {
    if out_json.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_office(handle, |office| {
        *out_json = into_raw_string(office.filter_types()?)?;
        Ok(())
    })
}

/// The engine's version JSON. Free with `lok_string_free`.
///
/// # Safety
///
/// `out_json` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_office_version_info(handle: Handle, out_json: *mut *mut c_char) -> c_int {
    if out_json.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    with_office(handle, |office| {
        *out_json = into_raw_string(office.version_info_raw()?)?;
        Ok(())
    })
}
