//! # lokit-ffi
//!
//! C FFI bindings for lokit.
//!
//! Offices and documents are referred to by integer handles. Every function
//! returns a status code (`LOK_OK` or a negative `LOK_ERR_*`) and writes its
//! results through out-pointers. Strings handed out by this library must be
//! released with `lok_string_free`.
//!
//! The C header is generated into `include/lokit.h` at build time.

mod document;
mod error;
mod handles;
mod office;
mod util;

pub use document::*;
pub use error::*;
pub use handles::Handle;
pub use office::*;
pub use util::*;
