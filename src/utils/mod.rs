pub mod formatters;

use crate::error::{Error, Result};
use std::env;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn resolve_aws_dir(aws_dir: Option<&Path>) -> PathBuf {
    aws_dir.map_or_else(
        || {
            let home_dir = home::home_dir().unwrap_or_else(env::temp_dir);
            home_dir.join(".aws")
        },
        PathBuf::from,
    )
}

/// Writes `contents` to a sibling temp file and renames it over `path`, so a
/// concurrent reader sees either the old file or the new one. An existing
/// file keeps its permissions.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let permissions = fs::metadata(path).ok().map(|metadata| metadata.permissions());
    write_with_permissions(path, contents, permissions)
}

/// Like [`write_atomic`], but the result is readable by its owner only.
pub fn write_secret(path: &Path, contents: &[u8]) -> Result<()> {
    write_with_permissions(path, contents, owner_only())
}

fn write_with_permissions(
    path: &Path,
    contents: &[u8],
    permissions: Option<Permissions>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    remove_if_exists(&tmp_path)?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    if permissions.is_some() {
        restrict_mode(&mut options);
    }
    let mut file = options.open(&tmp_path).map_err(Error::io(&tmp_path))?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions).map_err(Error::io(&tmp_path))?;
    }
    file.write_all(contents).map_err(Error::io(&tmp_path))?;
    drop(file);
    fs::rename(&tmp_path, path).map_err(Error::io(path))
}

#[cfg(unix)]
fn owner_only() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn owner_only() -> Option<Permissions> {
    None
}

/// Creates the temp file owner-only until its final permissions are set.
#[cfg(unix)]
fn restrict_mode(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn restrict_mode(_options: &mut OpenOptions) {}

/// Removes a file, treating an already missing file as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(Error::io(path)(err)),
    }
}

/// Reads a file to a string, returning `None` when it does not exist.
pub fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(path)(err)),
    }
}
