//! Target executable lookup
//!
//! Follows shell lookup rules: a relative path that exists is made
//! absolute; a bare name is searched on `PATH`, first match wins.

use crate::error::SessionError;
use crate::host::HostEnv;
use std::path::{Path, PathBuf};

/// Resolve the target path given on the command line
pub fn resolve_target(host: &impl HostEnv, raw: &str) -> Result<PathBuf, SessionError> {
    if raw.is_empty() {
        return Err(SessionError::TargetNotFound { path: PathBuf::new() });
    }

    let path = Path::new(raw);
    let mut resolved = path.to_path_buf();

    if path.is_relative() {
        if host.exists(path) {
            resolved = host.current_dir().map_err(SessionError::CurrentDir)?.join(path);
        } else if is_bare_name(path) {
            if let Some(found) = search_path(host, path)? {
                resolved = found;
            }
        }
    }

    if !host.exists(&resolved) {
        return Err(SessionError::TargetNotFound { path: resolved });
    }

    tracing::debug!("Resolved target {} to {}", raw, resolved.display());
    Ok(resolved)
}

fn is_bare_name(path: &Path) -> bool {
    path.parent().map_or(true, |p| p.as_os_str().is_empty())
}

/// Search each `PATH` entry in order for `name`
fn search_path(host: &impl HostEnv, name: &Path) -> Result<Option<PathBuf>, SessionError> {
    let Some(search) = host.search_path() else {
        return Ok(None);
    };

    for root in search.split([':', ';']) {
        let root = Path::new(root);
        let candidate = if root.is_absolute() {
            root.join(name)
        } else {
            host.current_dir()
                .map_err(SessionError::CurrentDir)?
                .join(root)
                .join(name)
        };
        if host.exists(&candidate) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
