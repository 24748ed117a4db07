use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use util::PathEncodingError;

use super::Error;

/// Copy the file or tree at `src` to `tgt`; returns the number of files written.
///
/// Links are followed, so the target holds plain files. Links that point
/// nowhere, or at a directory, are skipped. A file already at the target
/// is replaced, whatever it was.
pub fn copy(src: &Path, tgt: &Path) -> Result<usize> {
    let meta = fs::metadata(src)?;
    if meta.is_file() {
        replace_file(src, tgt)?;
        return Ok(1);
    } else if !meta.is_dir() {
        return Err(unknown_path_type(src));
    }

    let mut copied = 0;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), tgt.to_path_buf())];
    while let Some((from_dir, to_dir)) = pending.pop() {
        fs::create_dir_all(&to_dir)?;
        for entry in fs::read_dir(&from_dir)? {
            let entry = entry?;
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let is_link = entry.file_type()?.is_symlink();

            let Ok(meta) = fs::metadata(&from) else {
                log::warn!("skipping dangling link {from:?}");
                continue;
            };
            if meta.is_dir() && is_link {
                log::warn!("skipping link to directory {from:?}");
            } else if meta.is_dir() {
                pending.push((from, to));
            } else if meta.is_file() {
                replace_file(&from, &to)?;
                copied += 1;
            } else {
                return Err(unknown_path_type(&from));
            }
        }
    }
    Ok(copied)
}

/// An earlier collect may have left a link or a directory where the file goes.
fn replace_file(from: &Path, to: &Path) -> Result<()> {
    if to.is_symlink() {
        fs::remove_file(to)?;
    } else if to.is_dir() {
        fs::remove_dir_all(to)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

fn unknown_path_type(path: &Path) -> anyhow::Error {
    match path.to_str() {
        Some(path) => Error::UnknownPathType(path.to_owned()).into(),
        None => PathEncodingError.into(),
    }
}
