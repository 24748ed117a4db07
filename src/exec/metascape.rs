use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use table::ModuleId;

use crate::fs::{module_dir_name, Fs};
use crate::settings::Settings;

use super::{Error, ToolInvocation};

pub const TOOL: &str = "metascape";

const ENTRY_SCRIPT: &str = "bin/ms.sh";
const DATA_DIR: &str = "data";
const INPUT_DIR: &str = "input";
const OUTPUT_DIR: &str = "output";
const BATCH_MANIFEST: &str = "batch.job";
const JOB_MODE: &str = "single";

/// One line of the batch job manifest.
#[derive(Debug, Serialize)]
struct BatchJob {
    input: String,
    output: String,
    mode: &'static str,
    taxonomy_id: u32,
}

/// Builds invocations of a local MSBio installation.
///
/// MSBio runs inside a container that mounts the installation's `data/`
/// directory, so inputs are staged under `data/input/`, results land in
/// `data/output/`, and every path handed to `ms.sh` is rewritten to the
/// container's view of that directory.
#[derive(Debug, Clone)]
pub struct Metascape {
    location: PathBuf,
    /// where the container sees `<location>/data`
    mount: PathBuf,
    taxonomy_id: u32,
}

impl Metascape {
    /// Fails if the installation has no entry script.
    pub fn new(location: &Path, settings: &Settings) -> Result<Self, Error> {
        let entry = location.join(ENTRY_SCRIPT);
        if !entry.is_file() {
            return Err(Error::MissingEntryScript(entry.display().to_string()));
        }
        Ok(Self {
            location: location.to_path_buf(),
            mount: settings.metascape_mount.clone(),
            taxonomy_id: settings.taxonomy_id,
        })
    }

    /// `<location>/data`; must be whitelisted on the `Fs` before staging.
    pub fn data_dir(&self) -> PathBuf {
        self.location.join(DATA_DIR)
    }

    pub fn staged_input(&self, module: ModuleId) -> PathBuf {
        self.data_dir()
            .join(INPUT_DIR)
            .join(format!("{}.txt", module_dir_name(module)))
    }

    pub fn staged_output(&self, module: ModuleId) -> PathBuf {
        self.data_dir().join(OUTPUT_DIR).join(module_dir_name(module))
    }

    fn manifest_path(&self) -> PathBuf {
        self.data_dir().join(INPUT_DIR).join(BATCH_MANIFEST)
    }

    /// Path as seen from inside the container.
    fn container_path(&self, host: &Path) -> PathBuf {
        match host.strip_prefix(self.data_dir()) {
            Ok(relative) => self.mount.join(relative),
            Err(_) => host.to_path_buf(),
        }
    }

    /// Copy a module's gene list into the staging area and clear out
    /// results left there by an earlier run.
    pub fn stage(&self, fs: &Fs, module: ModuleId, gene_list: &Path) -> Result<()> {
        let staged = self.staged_input(module);
        fs.create_parent_dir(&staged)?;
        fs.copy(gene_list, &staged)
            .context("staging gene list for Metascape")?;

        let output = self.staged_output(module);
        if fs.exists(&output) {
            log::info!("removing stale Metascape output {output:?}");
            fs.delete_dir(&output)?;
        }
        Ok(())
    }

    /// `ms.sh -u -o <output> <input>` for one staged module.
    pub fn invocation(&self, fs: &Fs, module: ModuleId) -> ToolInvocation {
        let output = self.staged_output(module);
        ToolInvocation::new(
            TOOL,
            self.location.join(ENTRY_SCRIPT),
            output.clone(),
            fs.tool_log_dir(TOOL, module),
        )
        .current_dir(&self.location)
        .arg("-u")
        .arg("-o")
        .arg(self.container_path(&output))
        .arg(self.container_path(&self.staged_input(module)))
    }

    /// JSON-lines manifest with one job per staged module.
    pub fn batch_manifest(&self, modules: &[ModuleId]) -> Result<String> {
        let mut text = String::with_capacity(160 * modules.len());
        for &module in modules {
            let job = BatchJob {
                input: self.container_path(&self.staged_input(module)).display().to_string(),
                output: self.container_path(&self.staged_output(module)).display().to_string(),
                mode: JOB_MODE,
                taxonomy_id: self.taxonomy_id,
            };
            text.push_str(&serde_json::to_string(&job)?);
            text.push('\n');
        }
        Ok(text)
    }

    /// Write the manifest for `modules` and build the single `ms.sh -u -b <manifest>`
    /// invocation that runs them all.
    pub fn batch_invocation(&self, fs: &Fs, modules: &[ModuleId]) -> Result<ToolInvocation> {
        let manifest = self.manifest_path();
        fs.write_file(&manifest, self.batch_manifest(modules)?)
            .context("writing Metascape job manifest")?;

        Ok(ToolInvocation::new(
            TOOL,
            self.location.join(ENTRY_SCRIPT),
            self.data_dir().join(OUTPUT_DIR),
            fs.batch_log_dir(TOOL),
        )
        .current_dir(&self.location)
        .arg("-u")
        .arg("-b")
        .arg(self.container_path(&manifest)))
    }
}
