use std::path::PathBuf;

use table::ModuleId;

use super::Fs;

const SUBSET_DIR: &str = "module_gene_list";
const GENE_LIST_DIR: &str = "gene_list";
const GO_TABLE_DIR: &str = "go_gene_list";
const METASCAPE_DIR: &str = "metascape_output";
const GOFIGURE_DIR: &str = "GoFigure";
const LOG_DIR: &str = "logs";
const RUN_SUMMARY: &str = "run_summary.tsv";

/// The per-module files derived from the enrichment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// module_gene_list/module_<id>_data.csv
    Subset,
    /// gene_list/module_<id>_genes.txt
    GeneList,
    /// go_gene_list/module_<id>_go_genes.csv
    GoTable,
}

impl ArtifactKind {
    fn dir(self) -> &'static str {
        match self {
            Self::Subset => SUBSET_DIR,
            Self::GeneList => GENE_LIST_DIR,
            Self::GoTable => GO_TABLE_DIR,
        }
    }

    fn file_name(self, module: ModuleId) -> String {
        match self {
            Self::Subset => format!("module_{module}_data.csv"),
            Self::GeneList => format!("module_{module}_genes.txt"),
            Self::GoTable => format!("module_{module}_go_genes.csv"),
        }
    }
}

/// Utility fns for making the paths of the output directory layout.
impl Fs {
    pub fn artifact(&self, kind: ArtifactKind, module: ModuleId) -> PathBuf {
        self.output_prefix.join(kind.dir()).join(kind.file_name(module))
    }

    pub fn subset_file(&self, module: ModuleId) -> PathBuf {
        self.artifact(ArtifactKind::Subset, module)
    }

    pub fn gene_list_file(&self, module: ModuleId) -> PathBuf {
        self.artifact(ArtifactKind::GeneList, module)
    }

    pub fn go_table_file(&self, module: ModuleId) -> PathBuf {
        self.artifact(ArtifactKind::GoTable, module)
    }

    /// $OUTPUT/metascape_output/module_<id>
    pub fn metascape_dir(&self, module: ModuleId) -> PathBuf {
        self.output_prefix
            .join(METASCAPE_DIR)
            .join(module_dir_name(module))
    }

    /// $OUTPUT/GoFigure/module_<id>
    pub fn gofigure_dir(&self, module: ModuleId) -> PathBuf {
        self.output_prefix
            .join(GOFIGURE_DIR)
            .join(module_dir_name(module))
    }

    /// $OUTPUT/logs/<tool>/module_<id>
    pub fn tool_log_dir(&self, tool: &str, module: ModuleId) -> PathBuf {
        self.output_prefix
            .join(LOG_DIR)
            .join(tool)
            .join(module_dir_name(module))
    }

    /// $OUTPUT/logs/<tool>/batch
    pub fn batch_log_dir(&self, tool: &str) -> PathBuf {
        self.output_prefix.join(LOG_DIR).join(tool).join("batch")
    }

    /// $OUTPUT/run_summary.tsv
    pub fn run_summary(&self) -> PathBuf {
        self.output_prefix.join(RUN_SUMMARY)
    }
}

/// module_<id>
pub fn module_dir_name(module: ModuleId) -> String {
    format!("module_{module}")
}
