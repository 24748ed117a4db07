use clap::{ArgAction, Parser};

const CMD_NAME: &str = "gwena-go";
const DEFAULT_OUTPUT: &str = "output";
const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_TAXONOMY: u32 = 9606;

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// GWENA enrichment table (.xlsx workbook or tab-delimited text)
    #[arg(short, long, value_name = "FILE")]
    #[arg(env = "GWENA_GO_INPUT")]
    pub input: String,

    /// Output directory
    #[arg(short, long = "output-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    #[arg(env = "GWENA_GO_OUTPUT")]
    pub output: String,

    /// Metascape (MSBio) installation directory, containing bin/ms.sh
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "METASCAPE_LOCATION")]
    pub metascape_location: Option<String>,

    /// Directory the Metascape container mounts the installation's data dir at
    #[arg(long, value_name = "DIR", default_value = "/data")]
    pub metascape_mount: String,

    /// Workbook with one sheet of genes per module (sheet names like "module_3")
    #[arg(short, long, value_name = "FILE")]
    pub gene_list_excel: Option<String>,

    /// GO-Figure script (gofigure.py); located automatically if not given
    #[arg(long, value_name = "FILE")]
    #[arg(env = "GOFIGURE_SCRIPT")]
    pub gofigure_script: Option<String>,

    /// Interpreter used to run the GO-Figure script
    #[arg(long, value_name = "CMD", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Run all modules through Metascape in one job-manifest invocation
    #[arg(short, long)]
    pub batch: bool,

    /// NCBI taxonomy id written to the Metascape job manifest
    #[arg(long, value_name = "ID", default_value_t = DEFAULT_TAXONOMY)]
    pub taxonomy_id: u32,

    /// Kill a tool invocation after this many seconds (default: wait forever)
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Name of the module/query column
    #[arg(long, value_name = "NAME", default_value = "query")]
    pub query_column: String,

    /// Name of the GO term id column
    #[arg(long, value_name = "NAME", default_value = "term_id")]
    pub term_column: String,

    /// Name of the p-value column
    #[arg(long, value_name = "NAME", default_value = "p_value")]
    pub p_value_column: String,

    /// Name of the gene column (comma-separated genes are split)
    #[arg(long, value_name = "NAME", default_value = "gene")]
    pub gene_column: String,

    /// Don't run Metascape
    #[arg(long)]
    pub skip_metascape: bool,

    /// Don't run GO-Figure
    #[arg(long)]
    pub skip_gofigure: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            CMD_NAME,
            "--input",
            "enrichment.xlsx",
            "--metascape-location",
            "/opt/msbio",
        ])
        .unwrap();
        assert_eq!(args.output, DEFAULT_OUTPUT);
        assert_eq!(args.query_column, "query");
        assert_eq!(args.taxonomy_id, 9606);
        assert_eq!(args.timeout, None);
        assert!(!args.batch);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_repeated_verbose() {
        let args = Args::try_parse_from([CMD_NAME, "-i", "x.tsv", "-vv", "--skip-metascape"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(args.skip_metascape);
    }
}
