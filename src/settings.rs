use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use table::ColumnNames;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input file not found: {0}")]
    InputNotFound(String),
    #[error("No Metascape location given (use --metascape-location or --skip-metascape)")]
    NoMetascapeLocation,
    #[error("Metascape location not found: {0}")]
    MetascapeNotFound(String),
    #[error("Gene-list workbook not found: {0}")]
    GeneListNotFound(String),
    #[error("GO-Figure script not found: {0}")]
    GoFigureScriptNotFound(String),
    #[error("Nothing to run: both --skip-metascape and --skip-gofigure were given")]
    NothingToRun,
}

/// Settings are like Args, except all the logic has been applied:
/// paths are checked and canonicalized, and column names are grouped.
/// Every component takes what it needs from here; there is no other config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `None` only when Metascape is skipped
    pub metascape_location: Option<PathBuf>,
    pub metascape_mount: PathBuf,
    pub gene_list_excel: Option<PathBuf>,
    pub gofigure_script: Option<PathBuf>,
    pub python: String,
    pub batch: bool,
    pub taxonomy_id: u32,
    pub timeout: Option<Duration>,
    pub columns: ColumnNames,
    pub run_metascape: bool,
    pub run_gofigure: bool,
    pub verbose: u8,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.skip_metascape && args.skip_gofigure {
            return Err(Error::NothingToRun.into());
        }

        let input = existing(&args.input, Error::InputNotFound)?;

        let metascape_location = if args.skip_metascape {
            None
        } else {
            let location = args.metascape_location.ok_or(Error::NoMetascapeLocation)?;
            Some(existing(&location, Error::MetascapeNotFound)?)
        };

        let gene_list_excel = args
            .gene_list_excel
            .map(|path| existing(&path, Error::GeneListNotFound))
            .transpose()?;

        let gofigure_script = args
            .gofigure_script
            .map(|path| existing(&path, Error::GoFigureScriptNotFound))
            .transpose()?;

        Ok(Self {
            input,
            output: PathBuf::from(&args.output),
            metascape_location,
            metascape_mount: PathBuf::from(&args.metascape_mount),
            gene_list_excel,
            gofigure_script,
            python: args.python,
            batch: args.batch,
            taxonomy_id: args.taxonomy_id,
            timeout: args.timeout.map(Duration::from_secs),
            columns: ColumnNames {
                query: args.query_column,
                term_id: args.term_column,
                p_value: args.p_value_column,
                gene: args.gene_column,
            },
            run_metascape: !args.skip_metascape,
            run_gofigure: !args.skip_gofigure,
            verbose: args.verbose,
        })
    }
}

/// Canonicalize `path`, or fail with `missing` if it doesn't exist.
fn existing(path: &str, missing: fn(String) -> Error) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if path.exists() {
        Ok(path.canonicalize()?)
    } else {
        Err(missing(path.display().to_string()).into())
    }
}
