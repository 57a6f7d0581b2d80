//! Handle management for FFI

use lazy_static::lazy_static;
use lokit::{Document, Office};
use std::collections::HashMap;
use std::os::raw::c_int;
use std::sync::Mutex;

use crate::error::{status, LOK_ERR_INVALID_HANDLE};

/// Opaque handle type
pub type Handle = u64;

/// Null handle constant
pub const HANDLE_NULL: Handle = 0;

/// Global context for managing FFI objects
///
/// Offices and documents draw from one counter, so a handle never names
/// both kinds.
pub struct FfiContext {
    offices: HashMap<Handle, Office>,
    documents: HashMap<Handle, Document>,
    next_handle: Handle,
}

impl FfiContext {
    fn new() -> Self {
        Self {
            offices: HashMap::new(),
            documents: HashMap::new(),
            next_handle: 1, // Start at 1, 0 is null
        }
    }

    fn next_handle(&mut self) -> Handle {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    pub fn insert_office(&mut self, office: Office) -> Handle {
        let handle = self.next_handle();
        self.offices.insert(handle, office);
        handle
    }

    pub fn get_office(&self, handle: Handle) -> Option<&Office> {
        self.offices.get(&handle)
    }

    pub fn destroy_office(&mut self, handle: Handle) -> bool {
        self.offices.remove(&handle).is_some()
    }

    pub fn insert_document(&mut self, doc: Document) -> Handle {
        let handle = self.next_handle();
        self.documents.insert(handle, doc);
        handle
    }

    pub fn get_document_mut(&mut self, handle: Handle) -> Option<&mut Document> {
        self.documents.get_mut(&handle)
    }

    pub fn destroy_document(&mut self, handle: Handle) -> bool {
        self.documents.remove(&handle).is_some()
    }
}

lazy_static! {
    pub static ref CONTEXT: Mutex<FfiContext> = Mutex::new(FfiContext::new());
}

/// Helper macro for FFI functions
#[macro_export]
macro_rules! with_context {
    (|$ctx:ident| $body:expr) => {
        match $crate::handles::CONTEXT.lock() {
            Ok($ctx) => $body,
            Err(_) => $crate::error::LOK_ERR_INTERNAL,
        }
    };
    (|mut $ctx:ident| $body:expr) => {
        match $crate::handles::CONTEXT.lock() {
            Ok(mut $ctx) => $body,
            Err(_) => $crate::error::LOK_ERR_INTERNAL,
        }
    };
}

/// Run `f` on the office behind `handle` and turn its result into a status.
pub(crate) fn with_office(handle: Handle, f: impl FnOnce(&Office) -> lokit::Result<()>) -> c_int {
    with_context!(|ctx| match ctx.get_office(handle) {
        Some(office) => status(f(office)),
        None => LOK_ERR_INVALID_HANDLE,
    })
}

/// Run `f` on the document behind `handle` and turn its result into a status.
///
/// The handle table stays locked until `f` returns, so a long native call
/// holds up every other FFI call that looks up a handle.
pub(crate) fn with_document(handle: Handle, f: impl FnOnce(&mut Document) -> lokit::Result<()>) -> c_int {
    with_context!(|mut ctx| match ctx.get_document_mut(handle) {
        Some(doc) => status(f(doc)),
        None => LOK_ERR_INVALID_HANDLE,
    })
}
