/// Split an enrichment table into per-module subsets.
mod partition;
pub use partition::{partition, ModuleSubset, Partition, PartitionError};

/// Derive the Metascape gene list for a module.
mod gene_list;
pub use gene_list::{GeneListDeriver, GeneSource};

/// Derive the GO-Figure term/p-value table for a module.
mod go_table;
pub use go_table::derive_go_table;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Required column \"{0}\" is not in the input table")]
    MissingColumn(String),
    #[error("No valid gene identifiers left after filtering {0} values")]
    EmptyGeneList(usize),
    #[error("No GO terms (\"GO:\" prefix) among {0} rows")]
    NoGoTerms(usize),
    #[error("No sheet for this module in the gene-list workbook")]
    NoGeneSheet,
}
