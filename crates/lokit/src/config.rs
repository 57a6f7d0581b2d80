//! Where to find LibreOffice.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the LibreOffice `program` directory.
pub const LOK_PATH_ENV: &str = "LOK_PATH";

/// Environment variable holding a user profile URL, e.g. `file:///tmp/lok-profile`.
pub const LOK_USER_PROFILE_ENV: &str = "LOK_USER_PROFILE";

/// Install directories searched when nothing is configured.
pub const DEFAULT_INSTALL_PATHS: &[&str] = &[
    "/usr/lib/libreoffice/program",
    "/usr/lib64/libreoffice/program",
    "/opt/libreoffice/program",
    "/usr/local/lib/libreoffice/program",
    "/Applications/LibreOffice.app/Contents/Frameworks",
    r"C:\Program Files\LibreOffice\program",
];

/// Configuration for starting the engine.
#[derive(Debug, Clone, Default)]
pub struct OfficeConfig {
    /// LibreOffice `program` directory. If None, uses `LOK_PATH`, then the
    /// first of [`DEFAULT_INSTALL_PATHS`] that exists.
    pub install_path: Option<PathBuf>,
    /// User profile URL handed to the engine. If None, uses
    /// `LOK_USER_PROFILE`; if that is unset too, the engine picks its own.
    pub user_profile_url: Option<String>,
}

impl OfficeConfig {
    pub fn new(install_path: impl Into<PathBuf>) -> Self {
        Self {
            install_path: Some(install_path.into()),
            user_profile_url: None,
        }
    }

    pub fn user_profile_url(mut self, url: impl Into<String>) -> Self {
        self.user_profile_url = Some(url.into());
        self
    }

    /// Resolve the install directory.
    pub fn resolve_install_path(&self) -> Result<PathBuf> {
        resolve_install_path_with(
            self.install_path.as_deref(),
            std::env::var_os(LOK_PATH_ENV).map(PathBuf::from),
            DEFAULT_INSTALL_PATHS,
        )
    }

    /// Resolve the user profile URL.
    pub fn resolve_user_profile_url(&self) -> Option<String> {
        self.user_profile_url
            .clone()
            .or_else(|| std::env::var(LOK_USER_PROFILE_ENV).ok())
            .filter(|url| !url.is_empty())
    }
}

fn resolve_install_path_with(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    candidates: &[&str],
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_dir())
        .ok_or(Error::NotFound)
}
