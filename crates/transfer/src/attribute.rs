//! Cache-validation tag stored alongside a fetched artifact.
//!
//! The tag lives in the `user.etag` extended attribute. File systems without
//! extended attribute support get a hidden `.<file>.etag` sidecar instead.

use modsmith_core::{Error, Result, ETAG_ATTRIBUTE};
use std::io;
use std::path::{Path, PathBuf};

/// Read the stored tag of `path`, if any
pub fn read_etag(path: &Path) -> Result<Option<String>> {
    match sys::get(path, ETAG_ATTRIBUTE) {
        Ok(Some(value)) => Ok(Some(String::from_utf8_lossy(&value).into_owned())),
        Ok(None) => read_sidecar(path),
        Err(e) if is_unsupported(&e) => read_sidecar(path),
        Err(e) => Err(Error::file_system(path, "read extended attribute", e)),
    }
}

/// Persist `etag` for `path`
pub fn write_etag(path: &Path, etag: &str) -> Result<()> {
    match sys::set(path, ETAG_ATTRIBUTE, etag.as_bytes()) {
        Ok(()) => {
            let sidecar = sidecar_path(path);
            if sidecar.exists() {
                let _ = std::fs::remove_file(&sidecar);
            }
            Ok(())
        }
        Err(e) if is_unsupported(&e) => {
            let sidecar = sidecar_path(path);
            std::fs::write(&sidecar, etag)
                .map_err(|e| Error::file_system(&sidecar, "write etag sidecar", e))
        }
        Err(e) => Err(Error::file_system(path, "write extended attribute", e)),
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.etag"))
}

fn read_sidecar(path: &Path) -> Result<Option<String>> {
    let sidecar = sidecar_path(path);
    match std::fs::read_to_string(&sidecar) {
        Ok(tag) => Ok(Some(tag)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::file_system(&sidecar, "read etag sidecar", e)),
    }
}

fn is_unsupported(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::Unsupported {
        return true;
    }
    #[cfg(unix)]
    {
        matches!(error.raw_os_error(), Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "macos"))]
mod sys {
    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    #[cfg(target_os = "macos")]
    const MISSING: i32 = libc::ENOATTR;
    #[cfg(not(target_os = "macos"))]
    const MISSING: i32 = libc::ENODATA;

    fn c_string(bytes: &[u8]) -> io::Result<CString> {
        CString::new(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    #[cfg(target_os = "macos")]
    unsafe fn get_raw(
        path: *const libc::c_char,
        name: *const libc::c_char,
        buf: *mut libc::c_void,
        size: usize,
    ) -> isize {
        libc::getxattr(path, name, buf, size, 0, 0)
    }

    #[cfg(not(target_os = "macos"))]
    unsafe fn get_raw(
        path: *const libc::c_char,
        name: *const libc::c_char,
        buf: *mut libc::c_void,
        size: usize,
    ) -> isize {
        libc::getxattr(path, name, buf, size)
    }

    pub fn get(path: &Path, name: &str) -> io::Result<Option<Vec<u8>>> {
        let path = c_string(path.as_os_str().as_bytes())?;
        let name = c_string(name.as_bytes())?;

        // SAFETY: both strings are NUL-terminated; a null buffer queries the size.
        let size = unsafe { get_raw(path.as_ptr(), name.as_ptr(), std::ptr::null_mut(), 0) };
        if size < 0 {
            let error = io::Error::last_os_error();
            return match error.raw_os_error() {
                Some(code) if code == MISSING => Ok(None),
                _ => Err(error),
            };
        }

        let mut buffer = vec![0u8; size as usize];
        // SAFETY: the buffer is valid for `buffer.len()` bytes.
        let read = unsafe {
            get_raw(
                path.as_ptr(),
                name.as_ptr(),
                buffer.as_mut_ptr().cast(),
                buffer.len(),
            )
        };
        if read < 0 {
            return Err(io::Error::last_os_error());
        }
        buffer.truncate(read as usize);
        Ok(Some(buffer))
    }

    pub fn set(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        let path = c_string(path.as_os_str().as_bytes())?;
        let name = c_string(name.as_bytes())?;

        // SAFETY: both strings are NUL-terminated and `value` is valid for its length.
        let result = unsafe {
            #[cfg(target_os = "macos")]
            {
                libc::setxattr(
                    path.as_ptr(),
                    name.as_ptr(),
                    value.as_ptr().cast(),
                    value.len(),
                    0,
                    0,
                )
            }
            #[cfg(not(target_os = "macos"))]
            {
                libc::setxattr(
                    path.as_ptr(),
                    name.as_ptr(),
                    value.as_ptr().cast(),
                    value.len(),
                    0,
                )
            }
        };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos")))]
mod sys {
    use std::io;
    use std::path::Path;

    pub fn get(_path: &Path, _name: &str) -> io::Result<Option<Vec<u8>>> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn set(_path: &Path, _name: &str, _value: &[u8]) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_and_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jar");
        std::fs::write(&path, b"jar").unwrap();

        assert_eq!(read_etag(&path).unwrap(), None);

        write_etag(&path, "\"abc\"").unwrap();
        assert_eq!(read_etag(&path).unwrap().as_deref(), Some("\"abc\""));

        write_etag(&path, "\"def\"").unwrap();
        assert_eq!(read_etag(&path).unwrap().as_deref(), Some("\"def\""));
    }

    #[test]
    fn test_sidecar_name() {
        assert_eq!(
            sidecar_path(Path::new("/lib/a-1.0.jar")),
            PathBuf::from("/lib/.a-1.0.jar.etag")
        );
    }
}
