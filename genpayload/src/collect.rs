//! Builds a [`Payload`] from files and directories on disk.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use payload::Payload;
use tracing::info;
use walkdir::WalkDir;

/// Collect every path into one payload.
///
/// Directories are walked recursively and each non-directory entry is keyed
/// by its `/`-separated path relative to that directory. Any other path is
/// keyed by its file name. Keys are the raw bytes of the path, so file names
/// need not be UTF-8 on Unix. The first filesystem error aborts the whole walk.
pub fn collect<P: AsRef<Path>>(paths: &[P]) -> Result<Payload> {
    let mut payload = Payload::new();
    for path in paths {
        add_path(&mut payload, path.as_ref())?;
    }
    Ok(payload)
}

fn add_path(payload: &mut Payload, path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;

    if meta.is_dir() {
        return add_dir(payload, path);
    }

    let name = path
        .file_name()
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    add_file(payload, os_bytes(name, path)?, path)
}

fn add_dir(payload: &mut Payload, root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let rel = entry.path().strip_prefix(root)?;
        add_file(payload, key_for(rel)?, entry.path())?;
    }
    Ok(())
}

fn key_for(rel: &Path) -> Result<Vec<u8>> {
    let parts = rel
        .components()
        .map(|c| os_bytes(c.as_os_str(), rel))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(&b'/'))
}

#[cfg(unix)]
fn os_bytes(name: &OsStr, _path: &Path) -> Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Ok(name.as_bytes().to_vec())
}

#[cfg(not(unix))]
fn os_bytes(name: &OsStr, path: &Path) -> Result<Vec<u8>> {
    name.to_str()
        .map(|s| s.as_bytes().to_vec())
        .with_context(|| format!("{} is not valid UTF-8", path.display()))
}

fn add_file(payload: &mut Payload, key: Vec<u8>, path: &Path) -> Result<()> {
    info!("Loading file \"{}\"", String::from_utf8_lossy(&key));
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    payload.insert(key, data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn walks_directories_relative_to_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("assets");
        fs::create_dir_all(root.join("img/icons")).unwrap();
        fs::write(root.join("a.txt"), [1u8, 2, 3]).unwrap();
        fs::write(root.join("img/icons/x.png"), b"png").unwrap();
        fs::write(root.join("img/empty"), b"").unwrap();

        let payload = collect(&[&root]).unwrap();
        let keys: Vec<&[u8]> = payload.keys().collect();
        let expected: [&[u8]; 3] = [b"a.txt", b"img/empty", b"img/icons/x.png"];
        assert_eq!(keys, expected);
        assert_eq!(payload.get("a.txt"), Some(&[1u8, 2, 3][..]));
        assert_eq!(payload.get("img/empty"), Some(&b""[..]));
    }

    #[test]
    fn file_arguments_use_base_name() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("config.toml");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"x = 1").unwrap();

        let payload = collect(&[&file]).unwrap();
        assert_eq!(payload.get("config.toml"), Some(&b"x = 1"[..]));
    }

    #[test]
    fn each_directory_argument_is_walked() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("one");
        let second = dir.path().join("two");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("a"), b"1").unwrap();
        fs::write(second.join("b"), b"2").unwrap();

        let payload = collect(&[&first, &second]).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("b"), Some(&b"2"[..]));
    }

    #[test]
    fn later_paths_override_earlier_keys() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("same"), b"from dir").unwrap();
        let other = dir.path().join("elsewhere");
        fs::create_dir_all(&other).unwrap();
        fs::write(other.join("same"), b"from file").unwrap();

        let payload = collect(&[root, other.join("same")]).unwrap();
        assert_eq!(payload.get("same"), Some(&b"from file"[..]));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_file_names_become_byte_keys() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let dir = tempdir().unwrap();
        let root = dir.path().join("latin1");
        fs::create_dir_all(&root).unwrap();
        let name = OsString::from_vec(b"caf\xe9.txt".to_vec());
        // Some filesystems refuse names that are not UTF-8.
        if fs::write(root.join(&name), b"menu").is_err() {
            return;
        }

        let payload = collect(&[&root]).unwrap();
        assert_eq!(payload.get(b"caf\xe9.txt"), Some(&b"menu"[..]));
    }

    #[test]
    fn missing_path_aborts() {
        let dir = tempdir().unwrap();
        let err = collect(&[dir.path().join("missing")]).unwrap_err();
        assert!(err.to_string().contains("failed to stat"), "{err:#}");
    }
}
