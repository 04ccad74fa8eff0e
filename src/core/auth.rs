use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Cookie file not found. Created an empty one at {0}; log in and paste the session cookie into it")]
    Missing(PathBuf),
    #[error("Cookie file {0} is empty; log in and paste the session cookie into it")]
    Empty(PathBuf),
    #[error("Failed to access cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Session cookie read from the operator-maintained cookie file.
#[derive(Clone)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCookie(<redacted>)")
    }
}

/// Read the session cookie from `path`.
///
/// A missing file is replaced by an empty placeholder for the operator to
/// fill in, and reported as [`CredentialError::Missing`].
pub fn read_session_cookie(path: &Path) -> Result<SessionCookie, CredentialError> {
    if !path.exists() {
        create_placeholder(path)?;
        tracing::warn!(path = %path.display(), "created empty cookie file");
        return Err(CredentialError::Missing(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cookie = content.trim();
    if cookie.is_empty() {
        return Err(CredentialError::Empty(path.to_path_buf()));
    }
    Ok(SessionCookie(cookie.to_string()))
}

fn create_placeholder(path: &Path) -> Result<(), CredentialError> {
    let io_err = |source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, "").map_err(io_err)
}
