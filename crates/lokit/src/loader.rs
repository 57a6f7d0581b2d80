//! Locating and loading the engine library.
//!
//! Does what LibreOfficeKit's header-only `lok_init_2` does, without a C shim:
//! open the engine library inside the install directory, then call its
//! bootstrap hook.

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libloading::{Library, Symbol};
use lokit_sys as sys;

use crate::error::{Error, Result};
use crate::native;

/// An opened engine library whose bootstrap hook has not been called yet.
pub(crate) struct EngineLibrary {
    library: Library,
    path: PathBuf,
    install_path: PathBuf,
}

impl EngineLibrary {
    /// Open the engine library in `install_path`.
    pub(crate) fn open(install_path: &Path) -> Result<Self> {
        let candidates = [sys::TARGET_LIB, sys::TARGET_MERGED_LIB];
        let mut failures = Vec::new();

        for name in candidates {
            let path = install_path.join(name);
            if !path.is_file() {
                failures.push(format!("{} does not exist", path.display()));
                continue;
            }
            // SAFETY: loading the engine runs its static initializers; this is
            // the documented way to start LibreOfficeKit.
            match unsafe { Library::new(&path) } {
                Ok(library) => {
                    if name == sys::TARGET_MERGED_LIB {
                        tracing::warn!("Using merged engine library {}", path.display());
                    }
                    return Ok(Self {
                        library,
                        path,
                        install_path: install_path.to_path_buf(),
                    });
                }
                Err(e) => failures.push(format!("{}: {e}", path.display())),
            }
        }

        Err(Error::Initialization {
            path: install_path.to_path_buf(),
            reason: failures.join("; "),
        })
    }

    /// Check that a bootstrap hook is exported, without calling it.
    pub(crate) fn check_hook(&self) -> Result<()> {
        // SAFETY: only the symbol address is looked up.
        let found = unsafe {
            self.library.get::<sys::LokHookFunction2>(sys::LOK_HOOK_2).is_ok()
                || self.library.get::<sys::LokHookFunction>(sys::LOK_HOOK).is_ok()
        };
        if found {
            Ok(())
        } else {
            Err(self.init_error("library exports no libreofficekit_hook"))
        }
    }

    /// Call the bootstrap hook and return the engine instance.
    ///
    /// Errors found before the hook is called drop the library again. Once the
    /// hook has run the library is never unloaded, whatever it returned.
    pub(crate) fn start(self, user_profile_url: Option<&str>) -> Result<NonNull<sys::LibreOfficeKit>> {
        let install = CString::new(native::path_to_str(&self.install_path)?)?;
        let profile = native::to_optional_cstring(user_profile_url)?;
        let hook = self.resolve_hook(profile.is_some())?;

        // SAFETY: symbol types match LibreOfficeKitInit.h and both strings
        // outlive the call.
        let instance = unsafe {
            match hook {
                Hook::WithProfile(hook) => {
                    tracing::debug!("Calling libreofficekit_hook_2");
                    hook(install.as_ptr(), native::optional_ptr(&profile))
                }
                Hook::InstallOnly(hook) => {
                    tracing::debug!("Calling libreofficekit_hook");
                    hook(install.as_ptr())
                }
            }
        };

        let Self {
            library,
            path,
            install_path,
        } = self;
        hand_over(library, &path, &install_path, instance)
    }

    fn resolve_hook(&self, with_profile: bool) -> Result<Hook> {
        // SAFETY: symbol types match LibreOfficeKitInit.h. The function
        // pointers are only used while the library is mapped.
        unsafe {
            match self.library.get::<sys::LokHookFunction2>(sys::LOK_HOOK_2) {
                Ok(hook) => Ok(Hook::WithProfile(*hook)),
                Err(_) if !with_profile => {
                    let hook: Symbol<sys::LokHookFunction> = self
                        .library
                        .get(sys::LOK_HOOK)
                        .map_err(|e| self.init_error(e.to_string()))?;
                    tracing::warn!("libreofficekit_hook_2 missing, falling back to libreofficekit_hook");
                    Ok(Hook::InstallOnly(*hook))
                }
                Err(e) => Err(self.init_error(format!(
                    "user profile requested but libreofficekit_hook_2 is unavailable: {e}"
                ))),
            }
        }
    }

    fn init_error(&self, reason: impl Into<String>) -> Error {
        Error::Initialization {
            path: self.install_path.clone(),
            reason: reason.into(),
        }
    }
}

enum Hook {
    WithProfile(sys::LokHookFunction2),
    InstallOnly(sys::LokHookFunction),
}

/// Keep the library mapped, then check what the hook returned.
///
/// After the hook has run the engine may have registered exit handlers
/// inside the library, so it stays mapped until the process exits even when
/// the hook failed.
fn hand_over<L>(
    library: L,
    path: &Path,
    install_path: &Path,
    instance: *mut sys::LibreOfficeKit,
) -> Result<NonNull<sys::LibreOfficeKit>> {
    tracing::debug!("Keeping {} mapped until exit", path.display());
    std::mem::forget(library);
    NonNull::new(instance).ok_or_else(|| Error::Initialization {
        path: install_path.to_path_buf(),
        reason: "engine hook returned null".to_string(),
    })
}
