use std::path::Path;

use anyhow::{Context, Result};

use crate::fs::Fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collected {
    Copied,
    /// the tool left nothing behind; not an error in itself
    SourceMissing,
}

/// Copy a tool's output tree from its staging area into the output directory.
/// Safe to repeat: files already at `dest` are overwritten.
pub fn collect(fs: &Fs, source: &Path, dest: &Path) -> Result<Collected> {
    if !fs.exists(source) {
        log::warn!("nothing to collect: {source:?} does not exist");
        return Ok(Collected::SourceMissing);
    }
    fs.create_parent_dir(dest)?;
    let files = fs
        .copy(source, dest)
        .with_context(|| format!("collecting results into {dest:?}"))?;
    log::debug!("collected {files} file(s) from {source:?} into {dest:?}");
    Ok(Collected::Copied)
}
