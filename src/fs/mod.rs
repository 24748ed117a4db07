use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Utility fns
mod ops;

/// Defines fns for creating common paths in the output directory
mod paths;
pub use paths::module_dir_name;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path is neither file nor dir: {0}")]
    UnknownPathType(String),
    #[error("Specified output directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
    #[error("Path has no parent directory: \"{0}\"")]
    NoParent(String),
}

/// All file operations in the crate should go through this struct.
///
/// Destructive operations check that the path in question is a child of one
/// of the whitelisted prefixes: the output directory, plus any tool staging
/// directories registered with [`Fs::allow`]. Anything else is refused.
#[derive(Debug)]
pub struct Fs {
    /// The run's output directory; always whitelisted
    output_prefix: PathBuf,
    /// Additional directories we are allowed to modify
    allowed: Vec<PathBuf>,
}

impl Fs {
    /// Create a new `Fs` with the given output directory.
    pub fn new(output_prefix: &Path) -> Self {
        Self {
            output_prefix: output_prefix.to_path_buf(),
            allowed: Vec::with_capacity(2),
        }
    }

    /// The output directory (canonical once `ensure_output_dir_exists` has run).
    pub fn output_dir(&self) -> &Path {
        &self.output_prefix
    }

    /// Whitelist another directory tree for modification.
    pub fn allow(&mut self, prefix: &Path) -> Result<()> {
        let prefix = if prefix.exists() {
            prefix.canonicalize()?
        } else {
            prefix.to_path_buf()
        };
        log::debug!("whitelisting {prefix:?}");
        self.allowed.push(prefix);
        Ok(())
    }

    /// Check whether output dir exists, and create it if not.
    pub fn ensure_output_dir_exists(&mut self, verbose: bool) -> Result<()> {
        if !self.output_prefix.exists() {
            eprintln!(
                "Output directory {:?} doesn't exist. Creating.",
                self.output_prefix
            );
            fs::create_dir_all(&self.output_prefix).context("creating output directory")?;
        } else if !self.output_prefix.is_dir() {
            return Err(Error::NotDirectory(
                self.output_prefix
                    .to_str()
                    .ok_or(PathEncodingError)?
                    .to_string(),
            )
            .into());
        } else if verbose {
            eprintln!(
                "Output directory {:?} already exists. Not creating.",
                self.output_prefix
            );
        }

        self.output_prefix = self.output_prefix.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {path:?}"))?;
        Ok(())
    }

    /// Create parent directory of a given path.
    pub fn create_parent_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| Error::NoParent(path.display().to_string()))?;
        self.check_whitelist(parent)?;
        fs::create_dir_all(parent).context("creating parent dir")?;
        Ok(())
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {path:?}"))?;
        Ok(f)
    }

    /// Write an entire buffer to a file, creating its parent dir if needed.
    pub fn write_file<T: AsRef<Path>, B: AsRef<[u8]>>(&self, path: T, contents: B) -> Result<()> {
        let path = path.as_ref();
        self.create_parent_dir(path)?;
        fs::write(path, contents).with_context(|| format!("writing file {path:?}"))?;
        Ok(())
    }

    /// Recursively delete a directory.
    pub fn delete_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_dir_all(path).context("deleting dir")?;
        Ok(())
    }

    /// Copy `src` to `tgt`, recursively if `src` is a directory.
    /// Existing files at the target are overwritten; returns the number of files copied.
    pub fn copy<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<usize> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.check_whitelist(tgt)?;
        ops::copy(src, tgt).with_context(|| format!("copying {src:?} to {tgt:?}"))
    }

    fn is_whitelisted<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.starts_with(&self.output_prefix)
            || self.allowed.iter().any(|prefix| path.starts_with(prefix))
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}
