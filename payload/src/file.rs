//! File helpers built on [`load`] and [`dump`].

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::dump::dump;
use crate::error::{PayloadError, Result};
use crate::load::load;
use crate::payload::Payload;

/// Load the payload appended to the file at `path`.
///
/// Symbolic links in `path` are resolved first. The file is closed before
/// returning on every path.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Payload> {
    let path = fs::canonicalize(path.as_ref())?;
    debug!(path = %path.display(), "loading payload from file");
    let file = File::open(&path)?;
    load(BufReader::new(file))
}

/// Load the payload appended to the currently running executable.
pub fn load_self() -> Result<Payload> {
    let exe = env::current_exe()?;
    load_file(exe)
}

/// Append `payload` as a trailer to the existing file at `path`.
///
/// The host bytes are left untouched. Fails with
/// [`PayloadError::AlreadyPresent`] if the file already ends in a trailer;
/// a corrupt existing trailer is reported as the load error it produces.
pub fn append_to_file<P: AsRef<Path>>(path: P, payload: &Payload) -> Result<u64> {
    let path = path.as_ref();
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;

    match load(&mut file) {
        Err(err) if err.is_missing_magic() => {}
        Ok(_) => return Err(PayloadError::AlreadyPresent),
        Err(err) => return Err(err),
    }

    let written = dump(payload, BufWriter::new(file))?;
    debug!(path = %path.display(), written, "appended payload");
    Ok(written)
}

/// Load the payload appended to `path` through a read-only memory map.
#[cfg(feature = "mmap")]
pub fn load_mapped<P: AsRef<Path>>(path: P) -> Result<Payload> {
    let path = fs::canonicalize(path.as_ref())?;
    let file = File::open(&path)?;

    // Nothing to map, and nowhere for a magic to live.
    if file.metadata()?.len() < crate::footer::MAGIC.len() as u64 {
        return Err(PayloadError::MagicMismatch);
    }

    // SAFETY: the map is read-only and dropped before returning. Concurrent
    // modification of the file is unsupported.
    let map = unsafe { memmap2::Mmap::map(&file)? };
    debug!(path = %path.display(), len = map.len(), "loading payload from mapped file");
    load(std::io::Cursor::new(&map[..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> Payload {
        [("assets/logo.png", vec![0x89u8, b'P', b'N', b'G']), ("readme", b"hi".to_vec())]
            .into_iter()
            .collect()
    }

    fn host_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn append_then_load_file() {
        let host = host_file(b"#!/bin/sh\necho host\n");
        let written = append_to_file(host.path(), &sample()).unwrap();
        assert_eq!(written, sample().encoded_len());

        assert_eq!(load_file(host.path()).unwrap(), sample());

        let bytes = fs::read(host.path()).unwrap();
        assert!(bytes.starts_with(b"#!/bin/sh\necho host\n"));
    }

    #[test]
    fn append_refuses_second_trailer() {
        let host = host_file(b"host");
        append_to_file(host.path(), &sample()).unwrap();
        let err = append_to_file(host.path(), &Payload::new()).unwrap_err();
        assert!(matches!(err, PayloadError::AlreadyPresent));
    }

    #[test]
    fn append_to_empty_file() {
        let host = host_file(b"");
        append_to_file(host.path(), &sample()).unwrap();
        assert_eq!(load_file(host.path()).unwrap(), sample());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PayloadError::Io(_)));
    }

    #[test]
    fn file_without_trailer() {
        let host = host_file(b"plain old file contents");
        assert!(load_file(host.path()).unwrap_err().is_missing_magic());
    }

    #[cfg(unix)]
    #[test]
    fn load_file_follows_the_given_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.bin");
        fs::write(&target, b"host").unwrap();
        append_to_file(&target, &sample()).unwrap();

        let link = dir.path().join("link.bin");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert_eq!(load_file(&link).unwrap(), sample());
    }

    #[test]
    fn test_binary_has_no_payload() {
        let result = crate::ignore_missing(load_self());
        assert!(result.unwrap().is_empty());
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn mapped_load_matches_buffered_load() {
        let host = host_file(b"mapped host");
        append_to_file(host.path(), &sample()).unwrap();
        assert_eq!(load_mapped(host.path()).unwrap(), load_file(host.path()).unwrap());
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn mapped_empty_file_has_no_magic() {
        let host = host_file(b"");
        assert!(load_mapped(host.path()).unwrap_err().is_missing_magic());
    }
}
