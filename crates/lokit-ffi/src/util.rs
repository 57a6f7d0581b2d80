//! Strings, units and pixel helpers

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use crate::error::*;

/// Borrow a required string argument.
///
/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str, c_int> {
    if ptr.is_null() {
        return Err(LOK_ERR_NULL_PTR);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| fail_with(LOK_ERR_INVALID_ARGUMENT, format!("Argument is not valid UTF-8: {e}")))
}

/// Borrow an optional string argument; null means `None`.
///
/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn optional_str_arg<'a>(ptr: *const c_char) -> Result<Option<&'a str>, c_int> {
    if ptr.is_null() {
        Ok(None)
    } else {
        str_arg(ptr).map(Some)
    }
}

/// Hand a string to the caller, who releases it with `lok_string_free`.
pub(crate) fn into_raw_string(value: String) -> lokit::Result<*mut c_char> {
    Ok(CString::new(value)?.into_raw())
}

/// Release a string returned by this library. Null is ignored.
///
/// # Safety
///
/// `s` must be null or a string from this library not yet freed.
#[no_mangle]
pub unsafe extern "C" fn lok_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Convert twips to pixels at `dpi`, rounding toward zero.
///
/// # Safety
///
/// `out_pixels` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_twips_to_pixels(twips: i64, dpi: u32, out_pixels: *mut i64) -> c_int {
    if out_pixels.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    *out_pixels = lokit::twips_to_pixels(twips, dpi);
    LOK_OK
}

/// Convert pixels to twips at `dpi`. `dpi` must be positive.
///
/// # Safety
///
/// `out_twips` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lok_pixels_to_twips(pixels: i64, dpi: u32, out_twips: *mut i64) -> c_int {
    if out_twips.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    if dpi == 0 {
        return fail_with(LOK_ERR_INVALID_ARGUMENT, "dpi must be positive");
    }
    *out_twips = lokit::pixels_to_twips(pixels, dpi);
    LOK_OK
}

/// Swap the red and blue channels of `len` bytes of 4-byte pixels, in place.
/// Trailing bytes that do not form a whole pixel are left alone.
///
/// # Safety
///
/// `buffer` must be null or valid for reads and writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn lok_bgra_to_rgba(buffer: *mut u8, len: usize) -> c_int {
    if buffer.is_null() {
        return LOK_ERR_NULL_PTR;
    }
    lokit::bgra_to_rgba(std::slice::from_raw_parts_mut(buffer, len));
    LOK_OK
}
