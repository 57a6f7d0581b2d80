//! The engine instance.

use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lokit_sys as sys;
use serde::Deserialize;

use crate::config::OfficeConfig;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::loader::EngineLibrary;
use crate::native::{self, entry_point};

/// Lifecycle of the one engine a process can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
    Terminated,
}

static ENGINE: Mutex<EngineState> = Mutex::new(EngineState::Idle);

fn engine_state() -> MutexGuard<'static, EngineState> {
    ENGINE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `start` only if no engine was ever started in this process. The state
/// becomes `Running` when `start` succeeds and is left alone when it fails.
fn admit<T>(state: &mut EngineState, start: impl FnOnce() -> Result<T>) -> Result<T> {
    match *state {
        EngineState::Idle => {}
        EngineState::Running => return Err(Error::AlreadyInitialized),
        EngineState::Terminated => return Err(Error::EngineTerminated),
    }
    let started = start()?;
    *state = EngineState::Running;
    Ok(started)
}

/// Product information reported by `getVersionInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VersionInfo {
    pub product_name: String,
    pub product_version: String,
    pub product_extension: String,
    pub build_id: String,
}

/// State shared by an office and every document it opened.
///
/// The native instance is destroyed when the last holder goes away, so a
/// document can never outlive the engine it came from. Every native call
/// goes through `lock`: the engine is not reentrant.
pub(crate) struct OfficeInner {
    raw: NonNull<sys::LibreOfficeKit>,
    lock: Mutex<()>,
    install_path: PathBuf,
    /// Whether this instance holds the process-wide engine slot.
    registered: bool,
}

// SAFETY: the raw instance is only touched while holding `lock`.
unsafe impl Send for OfficeInner {}
unsafe impl Sync for OfficeInner {}

impl OfficeInner {
    pub(crate) fn new(raw: NonNull<sys::LibreOfficeKit>, install_path: PathBuf, registered: bool) -> Self {
        Self {
            raw,
            lock: Mutex::new(()),
            install_path,
            registered,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn raw(&self) -> *mut sys::LibreOfficeKit {
        self.raw.as_ptr()
    }

    fn class(&self) -> *const sys::LibreOfficeKitClass {
        // SAFETY: the instance is valid until `destroy` in `Drop`.
        unsafe { (*self.raw.as_ptr()).p_class }
    }

    /// Read the last-error slot. Caller holds the lock.
    pub(crate) fn read_error(&self) -> String {
        match entry_point!(self.class(), sys::LibreOfficeKitClass, get_error) {
            // SAFETY: valid instance; the returned string is ours to free.
            Ok(get_error) => unsafe { self.take_string(get_error(self.raw())) },
            Err(_) => String::new(),
        }
    }

    /// Copy and release a string allocated by the engine.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a string the engine handed over to the caller.
    pub(crate) unsafe fn take_string(&self, ptr: *mut c_char) -> String {
        if ptr.is_null() {
            return String::new();
        }
        let value = native::copy_string(ptr);
        match entry_point!(self.class(), sys::LibreOfficeKitClass, free_error) {
            Ok(free_error) => free_error(ptr),
            Err(_) => libc::free(ptr.cast()),
        }
        value
    }
}

impl Drop for OfficeInner {
    fn drop(&mut self) {
        let _guard = self.lock();
        match entry_point!(self.class(), sys::LibreOfficeKitClass, destroy) {
            Ok(destroy) => {
                tracing::info!("Destroying LibreOfficeKit instance");
                // SAFETY: last reference; no document can call into it afterwards.
                unsafe { destroy(self.raw()) }
            }
            Err(_) => tracing::warn!("LibreOfficeKit instance has no destroy entry point; leaking it"),
        }
        if self.registered {
            *engine_state() = EngineState::Terminated;
        }
    }
}

/// An initialized LibreOfficeKit engine.
///
/// A process can host one engine, once: while an `Office` (or any document
/// opened from it) is alive, [`Office::new`] fails with
/// [`Error::AlreadyInitialized`]; after it is gone, with
/// [`Error::EngineTerminated`]. Share the handle instead; it is `Send + Sync`
/// and serializes all native calls internally.
///
/// # Example
///
/// ```rust,no_run
/// use lokit::Office;
///
/// # fn example() -> lokit::Result<()> {
/// let office = Office::new("/usr/lib/libreoffice/program")?;
/// let doc = office.load_document("report.docx")?;
/// println!("{} pages", doc.part_count()?);
/// doc.save_as("report.pdf", Some("pdf"), None)?;
/// # Ok(())
/// # }
/// ```
pub struct Office {
    inner: Arc<OfficeInner>,
}

impl Office {
    /// Start the engine installed in `install_path` (LibreOffice's `program`
    /// directory).
    pub fn new(install_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(&OfficeConfig::new(install_path.as_ref()))
    }

    /// Start the engine found through `LOK_PATH` or the well-known install
    /// directories.
    pub fn from_env() -> Result<Self> {
        Self::with_config(&OfficeConfig::default())
    }

    pub fn with_config(config: &OfficeConfig) -> Result<Self> {
        let install_path = config.resolve_install_path()?;
        let user_profile = config.resolve_user_profile_url();

        let mut state = engine_state();

        // A bad path is reported as such even if an engine already runs.
        let library = EngineLibrary::open(&install_path)?;
        library.check_hook()?;

        let raw = admit(&mut state, || library.start(user_profile.as_deref()))?;

        tracing::info!("Initialized LibreOfficeKit from {}", install_path.display());

        Ok(Self {
            inner: Arc::new(OfficeInner::new(raw, install_path, true)),
        })
    }

    #[cfg(any(test, feature = "test-util"))]
    pub(crate) fn from_inner(inner: OfficeInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// The install directory this engine was loaded from.
    pub fn install_path(&self) -> &Path {
        &self.inner.install_path
    }

    /// The most recent error message from the engine.
    ///
    /// This is a single slot shared by every call on this engine and its
    /// documents. It is overwritten by the next failing call and is not tied
    /// to any particular operation, so read it right after the failure you
    /// care about. Empty when the engine reports nothing.
    pub fn last_error(&self) -> String {
        let _guard = self.inner.lock();
        self.inner.read_error()
    }

    /// Open a document from a filesystem path or URL.
    ///
    /// On failure the engine's message is copied into [`Error::Load`] and
    /// also stays readable through [`Office::last_error`].
    pub fn load_document(&self, path: impl AsRef<Path>) -> Result<Document> {
        let url = native::path_to_str(path.as_ref())?.to_string();
        let c_url = native::to_cstring(&url)?;
        let document_load = entry_point!(self.inner.class(), sys::LibreOfficeKitClass, document_load)?;

        let _guard = self.inner.lock();
        // SAFETY: valid instance and NUL-terminated URL.
        let raw = unsafe { document_load(self.inner.raw(), c_url.as_ptr()) };
        self.finish_load(raw, url)
    }

    /// Open a document, passing load options such as `Language=de-DE`.
    pub fn load_document_with_options(&self, path: impl AsRef<Path>, options: &str) -> Result<Document> {
        let url = native::path_to_str(path.as_ref())?.to_string();
        let c_url = native::to_cstring(&url)?;
        let c_options = native::to_cstring(options)?;
        let load = entry_point!(
            self.inner.class(),
            sys::LibreOfficeKitClass,
            document_load_with_options
        )?;

        let _guard = self.inner.lock();
        // SAFETY: valid instance and NUL-terminated arguments.
        let raw = unsafe { load(self.inner.raw(), c_url.as_ptr(), c_options.as_ptr()) };
        self.finish_load(raw, url)
    }

    /// Caller holds the lock.
    fn finish_load(&self, raw: *mut sys::LibreOfficeKitDocument, url: String) -> Result<Document> {
        match NonNull::new(raw) {
            Some(raw) => {
                tracing::info!("Loaded document {url}");
                Ok(Document::from_raw(raw, Arc::clone(&self.inner), url))
            }
            None => {
                let message = self.inner.read_error();
                tracing::debug!("Failed to load {url}: {message}");
                Err(Error::Load { url, message })
            }
        }
    }

    /// The engine's description of its import/export filters, unparsed.
    pub fn filter_types(&self) -> Result<String> {
        let get_filter_types = entry_point!(self.inner.class(), sys::LibreOfficeKitClass, get_filter_types)?;
        let _guard = self.inner.lock();
        // SAFETY: valid instance; the returned string is ours to free.
        Ok(unsafe { self.inner.take_string(get_filter_types(self.inner.raw())) })
    }

    /// The engine's version JSON, unparsed.
    pub fn version_info_raw(&self) -> Result<String> {
        let get_version_info = entry_point!(self.inner.class(), sys::LibreOfficeKitClass, get_version_info)?;
        let _guard = self.inner.lock();
        // SAFETY: valid instance; the returned string is ours to free.
        Ok(unsafe { self.inner.take_string(get_version_info(self.inner.raw())) })
    }

    pub fn version_info(&self) -> Result<VersionInfo> {
        Ok(serde_json::from_str(&self.version_info_raw()?)?)
    }

    /// Release this handle. The engine itself is destroyed once every
    /// document opened from it has been closed too.
    pub fn close(self) {
        tracing::debug!(
            "Closing office handle ({} other holders)",
            Arc::strong_count(&self.inner) - 1
        );
    }
}

impl std::fmt::Debug for Office {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Office")
            .field("install_path", &self.inner.install_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_install_path() {
        let err = Office::new("/etc/passwd").unwrap_err();
        match err {
            Error::Initialization { path, reason } => {
                assert_eq!(path, PathBuf::from("/etc/passwd"));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_admit_starts_idle_engine() {
        let mut state = EngineState::Idle;
        assert_eq!(admit(&mut state, || Ok(7)).unwrap(), 7);
        assert_eq!(state, EngineState::Running);
    }

    #[test]
    fn test_admit_rejects_second_engine() {
        let mut state = EngineState::Running;
        let mut called = false;
        let err = admit(&mut state, || {
            called = true;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized));
        assert!(!called);
        assert_eq!(state, EngineState::Running);
    }

    #[test]
    fn test_admit_rejects_restart_after_destroy() {
        let mut state = EngineState::Terminated;
        let mut called = false;
        let err = admit(&mut state, || {
            called = true;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, Error::EngineTerminated));
        assert!(!called);
        assert_eq!(state, EngineState::Terminated);
    }

    #[test]
    fn test_admit_failed_start_stays_idle() {
        let mut state = EngineState::Idle;
        let err = admit::<()>(&mut state, || {
            Err(Error::Initialization {
                path: PathBuf::from("/opt/office/program"),
                reason: "engine hook returned null".to_string(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, Error::Initialization { .. }));
        assert_eq!(state, EngineState::Idle);

        // A later attempt may still start the engine.
        admit(&mut state, || Ok(())).unwrap();
        assert_eq!(state, EngineState::Running);
    }

    #[test]
    fn test_load_missing_document() {
        let engine = FakeEngine::new();
        let office = engine.office();

        let err = office.load_document("testdata/kittens.docx").unwrap_err();
        match err {
            Error::Load { url, message } => {
                assert_eq!(url, "testdata/kittens.docx");
                assert!(message.contains("kittens.docx"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The slot still holds the message after the failing call.
        assert!(office.last_error().contains("kittens.docx"));
        assert!(engine.freed_strings() >= 2);
    }

    #[test]
    fn test_last_error_is_empty_without_failure() {
        let engine = FakeEngine::new();
        let office = engine.office();
        assert_eq!(office.last_error(), "");
    }

    #[test]
    fn test_load_document() {
        let engine = FakeEngine::new();
        let office = engine.office();
        let doc = office.load_document("sample.fodt").unwrap();
        assert_eq!(doc.url(), "sample.fodt");
        assert_eq!(engine.state().loaded, vec!["sample.fodt".to_string()]);
    }

    #[test]
    fn test_load_with_options() {
        let engine = FakeEngine::new();
        let office = engine.office();
        let _doc = office.load_document_with_options("sample.fodt", "Language=de-DE").unwrap();
        assert_eq!(engine.state().load_options, vec!["Language=de-DE".to_string()]);
    }

    #[test]
    fn test_load_rejects_nul() {
        let engine = FakeEngine::new();
        let office = engine.office();
        assert!(matches!(office.load_document("a\0b"), Err(Error::Nul(_))));
        assert!(engine.state().loaded.is_empty());
    }

    #[test]
    fn test_filter_types_passthrough() {
        let engine = FakeEngine::new();
        let office = engine.office();
        let filters = office.filter_types().unwrap();
        assert!(filters.contains("writer8"), "{filters}");
    }

    #[test]
    fn test_version_info() {
        let engine = FakeEngine::new();
        let office = engine.office();
        let info = office.version_info().unwrap();
        assert_eq!(
            info,
            VersionInfo {
                product_name: "LibreOffice".into(),
                product_version: "7.6".into(),
                product_extension: ".4.1".into(),
                build_id: "e19e193f88cd6c0525a17fb7a176ed8e6a3e2aa1".into(),
            }
        );
    }

    #[test]
    fn test_old_engine_lacks_version_info() {
        let engine = FakeEngine::with_office_class_size(std::mem::offset_of!(
            sys::LibreOfficeKitClass,
            get_version_info
        ));
        let office = engine.office();
        assert!(matches!(office.version_info_raw(), Err(Error::Unsupported("get_version_info"))));
        // Entry points before the cut-off still work.
        assert!(office.filter_types().is_ok());
    }

    #[test]
    fn test_destroy_waits_for_documents() {
        let engine = FakeEngine::new();
        let office = engine.office();
        let doc = office.load_document("sample.fodt").unwrap();

        office.close();
        assert_eq!(engine.state().office_destroyed, 0);

        doc.close();
        assert_eq!(engine.state().documents_destroyed, 1);
        assert_eq!(engine.state().office_destroyed, 1);
    }

    #[test]
    fn test_office_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Office>();
    }
}
