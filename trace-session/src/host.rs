//! Host operating system queries used while building session metadata

use crate::digest::sha256_file;
use frame_tracer::FileStats;
use std::ffi::CStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Everything the metadata builder needs to know about the host
///
/// [`SystemHost`] answers from the running system; tests supply their own
/// implementation.
pub trait HostEnv {
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Executable search path (`PATH`), if set
    fn search_path(&self) -> Option<String>;

    /// Whether `path` exists; relative paths are taken from the current directory
    fn exists(&self, path: &Path) -> bool;

    fn stat(&self, path: &Path) -> io::Result<FileStats>;

    /// Content digest of the file at `path`
    fn digest(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn hostname(&self) -> io::Result<String>;

    fn login_name(&self) -> io::Result<String>;

    /// Seconds since the Unix epoch
    fn now(&self) -> Option<u64>;
}

/// The running system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostEnv for SystemHost {
    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn search_path(&self) -> Option<String> {
        std::env::var("PATH").ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn stat(&self, path: &Path) -> io::Result<FileStats> {
        let meta = std::fs::metadata(path)?;
        Ok(file_stats(&meta))
    }

    fn digest(&self, path: &Path) -> io::Result<Vec<u8>> {
        sha256_file(path)
    }

    fn hostname(&self) -> io::Result<String> {
        let mut buf = [0u8; 1024];
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // gethostname may truncate without a terminator
        let last = buf.len() - 1;
        buf[last] = 0;
        let name = CStr::from_bytes_until_nul(&buf)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "unterminated host name"))?;
        Ok(name.to_string_lossy().into_owned())
    }

    fn login_name(&self) -> io::Result<String> {
        let ptr = unsafe { libc::getlogin() };
        if ptr.is_null() {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(0) | None => {
                    io::Error::new(io::ErrorKind::NotFound, "no login name for this session")
                }
                Some(_) => err,
            });
        }
        let name = unsafe { CStr::from_ptr(ptr) };
        Ok(name.to_string_lossy().into_owned())
    }

    fn now(&self) -> Option<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}

#[cfg(unix)]
fn file_stats(meta: &std::fs::Metadata) -> FileStats {
    use std::os::unix::fs::MetadataExt;

    FileStats {
        size: meta.size(),
        atime: meta.atime(),
        mtime: meta.mtime(),
        ctime: meta.ctime(),
    }
}

#[cfg(not(unix))]
fn file_stats(meta: &std::fs::Metadata) -> FileStats {
    fn secs(t: io::Result<SystemTime>) -> i64 {
        t.ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    let mtime = secs(meta.modified());
    FileStats {
        size: meta.len(),
        atime: secs(meta.accessed()),
        mtime,
        ctime: mtime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_stat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog");
        std::fs::write(&path, b"hello").unwrap();

        let stats = SystemHost.stat(&path).unwrap();
        assert_eq!(stats.size, 5);
        assert!(stats.mtime > 0);

        assert!(SystemHost.stat(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_system_hostname_and_clock() {
        assert!(!SystemHost.hostname().unwrap().is_empty());
        assert!(SystemHost.now().unwrap() > 1_600_000_000);
    }
}
