/// Integer module identifiers
mod module_id;
pub use module_id::{ModuleId, ModuleIdError};

/// Column names and resolved column positions
mod schema;
pub use schema::{ColumnNames, Columns};

/// Typed rows of an enrichment table
mod record;
pub use record::{EnrichmentRow, EnrichmentTable};

/// Reading tables from workbooks and delimited text
mod load;
pub use load::{load, load_gene_sheets, render_cell, GeneSheet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to read \"{path}\" as a workbook ({workbook}) or as tab-delimited text ({text})")]
    InputFormat {
        path: String,
        workbook: String,
        text: String,
    },
    #[error("Input table \"{0}\" has no data rows")]
    EmptyInput(String),
    #[error("Required column \"{column}\" not found in \"{path}\" (columns: {found})")]
    MissingColumn {
        column: String,
        path: String,
        found: String,
    },
    #[error("Unable to read gene-list workbook \"{0}\": {1}")]
    GeneWorkbook(String, String),
}
