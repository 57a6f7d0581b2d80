//! Helpers for crossing the C boundary.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::error::{Error, Result};

/// Read an entry point out of a LibreOfficeKit class table.
///
/// Evaluates to `Result<fn>`: `Err(Error::Unsupported(name))` if the running
/// engine's table is too short to contain the field, or the slot is null.
/// The table pointer must be valid for at least its own `n_size` bytes.
macro_rules! entry_point {
    ($class:expr, $ty:ty, $field:ident) => {{
        let class: *const $ty = $class;
        // SAFETY: `n_size` is the first field of every class table and always present.
        let size = unsafe { ::std::ptr::addr_of!((*class).n_size).read() };
        let end = ::std::mem::offset_of!($ty, $field) + ::std::mem::size_of::<usize>();
        let slot = if end <= size {
            // SAFETY: the field lies within the `size` bytes the engine provides.
            unsafe { ::std::ptr::addr_of!((*class).$field).read() }
        } else {
            None
        };
        slot.ok_or($crate::error::Error::Unsupported(stringify!($field)))
    }};
}

pub(crate) use entry_point;

/// Copy a NUL-terminated engine string. Null reads as empty.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn copy_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

pub(crate) fn to_cstring(value: &str) -> Result<CString> {
    Ok(CString::new(value)?)
}

/// `None` becomes a null pointer, which the engine reads as "default".
pub(crate) fn to_optional_cstring(value: Option<&str>) -> Result<Option<CString>> {
    value.map(to_cstring).transpose()
}

pub(crate) fn optional_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |s| s.as_ptr())
}

/// Paths cross the boundary as UTF-8; the engine also accepts `file://` URLs.
pub(crate) fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lokit_sys::LibreOfficeKitDocumentClass;
    use std::mem::{offset_of, size_of};
    use std::os::raw::c_int;

    unsafe extern "C" fn fake_get_parts(_this: *mut lokit_sys::LibreOfficeKitDocument) -> c_int {
        7
    }

    fn class_with_size(n_size: usize) -> LibreOfficeKitDocumentClass {
        LibreOfficeKitDocumentClass {
            n_size,
            get_parts: Some(fake_get_parts),
            ..Default::default()
        }
    }

    #[test]
    fn test_entry_point_present() {
        let class = class_with_size(size_of::<LibreOfficeKitDocumentClass>());
        let get_parts = entry_point!(&class, LibreOfficeKitDocumentClass, get_parts).unwrap();
        assert_eq!(unsafe { get_parts(ptr::null_mut()) }, 7);
    }

    #[test]
    fn test_entry_point_beyond_table_size() {
        // A table that ends right before `get_parts`.
        let class = class_with_size(offset_of!(LibreOfficeKitDocumentClass, get_parts));
        let err = entry_point!(&class, LibreOfficeKitDocumentClass, get_parts).unwrap_err();
        assert!(matches!(err, Error::Unsupported("get_parts")));
    }

    #[test]
    fn test_entry_point_null_slot() {
        let class = class_with_size(size_of::<LibreOfficeKitDocumentClass>());
        let err = entry_point!(&class, LibreOfficeKitDocumentClass, paint_tile).unwrap_err();
        assert!(matches!(err, Error::Unsupported("paint_tile")));
    }

    #[test]
    fn test_copy_string() {
        assert_eq!(unsafe { copy_string(ptr::null()) }, "");
        let owned = CString::new("Page 1").unwrap();
        assert_eq!(unsafe { copy_string(owned.as_ptr()) }, "Page 1");
    }

    #[test]
    fn test_optional_cstring() {
        let none = to_optional_cstring(None).unwrap();
        assert!(optional_ptr(&none).is_null());
        let some = to_optional_cstring(Some("docx")).unwrap();
        assert!(!optional_ptr(&some).is_null());
        assert!(to_optional_cstring(Some("a\0b")).is_err());
    }
}
