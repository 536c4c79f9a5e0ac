// Whole-file replacement: write a sibling temp file, then rename it over the target.
// The target keeps its permissions; a symlinked target is replaced at its resolved path.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::error::{Error, io_error};

pub fn replace_contents(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let target = resolve_target(path)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| io_error(path, err))?;
    tmp.write_all(contents).map_err(|err| io_error(path, err))?;
    if let Ok(meta) = fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|err| io_error(path, err))?;
    }
    tmp.as_file().sync_all().map_err(|err| io_error(path, err))?;
    tmp.persist(&target).map_err(|err| io_error(path, err.error))?;
    Ok(())
}

fn resolve_target(path: &Path) -> Result<PathBuf, Error> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).map_err(|err| io_error(path, err))
        }
        _ => Ok(path.to_path_buf()),
    }
}
