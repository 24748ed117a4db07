#![cfg(unix)]

use anyhow::Result;
use clap::Parser;
use gwena_go::{App, Args, ModuleKey, ModuleState, RunSummary, Settings, Stage, Status};
use rust_xlsxwriter::Workbook;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const EXAMPLE_TABLE: &str = "\
query\tgene\tterm_id\tp_value
1\tTP53\tGO:0006915\t0.001
1\tBRCA1\tKEGG:04110\t0.02
2\tMYC\tGO:0008283\t0.0001
";

/// Records its arguments, then creates the output directory it was given
/// (or every output directory named in a batch manifest).
const MS_STUB: &str = r#"#!/bin/sh
echo "metascape $*" >> "$CALLS"
if [ "$2" = "-b" ]; then
    for out in $(sed -n 's/.*"output":"\([^"]*\)".*/\1/p' "$3"); do
        mkdir -p "$out"
        echo ok > "$out/summary.txt"
    done
else
    mkdir -p "$3"
    echo ok > "$3/summary.txt"
fi
"#;

/// Run as `sh gofigure.sh -i <table> -o <dir>`.
const GOFIGURE_STUB: &str = r#"echo "gofigure $*" >> "$CALLS"
mkdir -p "$4"
cp "$2" "$4/terms.tsv"
"#;

/// Scratch layout for one run: input table, stub tools, and output dir.
struct Scratch {
    dir: TempDir,
    input: &'static str,
}

impl Scratch {
    fn new(table: &str) -> Result<Self> {
        let scratch = Self::with_tools("enrichment.tsv")?;
        std::fs::write(scratch.root().join(scratch.input), table)?;
        Ok(scratch)
    }

    fn with_tools(input: &'static str) -> Result<Self> {
        let dir = tempdir()?;
        let root = dir.path().canonicalize()?;
        let calls = root.join("calls.log");

        let bin = root.join("msbio/bin");
        std::fs::create_dir_all(&bin)?;
        std::fs::create_dir_all(root.join("msbio/data"))?;
        let ms = bin.join("ms.sh");
        std::fs::write(&ms, MS_STUB.replace("$CALLS", calls.to_str().unwrap()))?;
        std::fs::set_permissions(&ms, std::fs::Permissions::from_mode(0o755))?;

        std::fs::write(
            root.join("gofigure.sh"),
            GOFIGURE_STUB.replace("$CALLS", calls.to_str().unwrap()),
        )?;

        Ok(Self { dir, input })
    }

    fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn output(&self) -> PathBuf {
        self.root().join("out")
    }

    /// The installation's data dir doubles as the container mount,
    /// so container paths are the host paths.
    fn args(&self, extra: &[&str]) -> Result<Args> {
        let root = self.root();
        let path = |p: &str| root.join(p).to_str().unwrap().to_owned();
        let mut argv = vec![
            "gwena-go".to_owned(),
            "-i".to_owned(),
            path(self.input),
            "-o".to_owned(),
            path("out"),
            "-m".to_owned(),
            path("msbio"),
            "--metascape-mount".to_owned(),
            path("msbio/data"),
            "--gofigure-script".to_owned(),
            path("gofigure.sh"),
            "--python".to_owned(),
            "sh".to_owned(),
            "-v".to_owned(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Ok(Args::try_parse_from(argv)?)
    }

    fn run(&self, extra: &[&str]) -> Result<RunSummary> {
        simple_logging::log_to_stderr(log::LevelFilter::Debug);
        let settings: Settings = self.args(extra)?.try_into()?;
        App::new(settings).run()
    }

    fn calls(&self) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(self.root().join("calls.log"))?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

fn status(summary: &RunSummary, module: i64, stage: Stage) -> Option<Status> {
    let key = ModuleKey::Id(table::ModuleId::new(module));
    summary.outcomes.get(&key, stage).map(|o| o.status)
}

#[test]
fn test_two_modules() -> Result<()> {
    let scratch = Scratch::new(EXAMPLE_TABLE)?;
    let summary = scratch.run(&[])?;
    let out = scratch.output();

    // subsets:
    let subset1 = read(&out.join("module_gene_list/module_1_data.csv"))?;
    assert_eq!(subset1.lines().count(), 3);
    assert!(subset1.contains("BRCA1"));
    let subset2 = read(&out.join("module_gene_list/module_2_data.csv"))?;
    assert_eq!(subset2.lines().count(), 2);
    assert!(!subset2.contains("TP53"));

    // gene lists:
    assert_eq!(read(&out.join("gene_list/module_1_genes.txt"))?, "Gene\nTP53\nBRCA1\n");
    assert_eq!(read(&out.join("gene_list/module_2_genes.txt"))?, "Gene\nMYC\n");

    // GO tables:
    assert_eq!(
        read(&out.join("go_gene_list/module_1_go_genes.csv"))?,
        "GO:0006915\t0.001\n"
    );
    assert_eq!(
        read(&out.join("go_gene_list/module_2_go_genes.csv"))?,
        "GO:0008283\t0.0001\n"
    );

    // four invocations, each with its own output dir:
    let calls = scratch.calls()?;
    assert_eq!(calls.len(), 4);
    let ms_outputs: Vec<&str> = calls
        .iter()
        .filter(|c| c.starts_with("metascape"))
        .map(|c| c.split_whitespace().nth(3).unwrap())
        .collect();
    assert_eq!(ms_outputs.len(), 2);
    assert_ne!(ms_outputs[0], ms_outputs[1]);
    let gf_outputs: Vec<&str> = calls
        .iter()
        .filter(|c| c.starts_with("gofigure"))
        .map(|c| c.split_whitespace().nth(4).unwrap())
        .collect();
    assert_eq!(gf_outputs.len(), 2);
    assert_ne!(gf_outputs[0], gf_outputs[1]);

    // results:
    for id in 1..=2 {
        assert!(out.join(format!("metascape_output/module_{id}/summary.txt")).is_file());
        assert!(out.join(format!("GoFigure/module_{id}/terms.tsv")).is_file());
        assert!(out.join(format!("logs/metascape/module_{id}/stdout.txt")).is_file());
        assert!(out.join(format!("logs/gofigure/module_{id}/stderr.txt")).is_file());
        assert_eq!(status(&summary, id, Stage::Collect), Some(Status::Ok));
    }
    assert!(summary.outcomes.modules_with_failures().is_empty());
    assert!(summary.modules.iter().all(|(_, state)| *state == ModuleState::Collected));

    let run_summary = read(&out.join("run_summary.tsv"))?;
    assert!(run_summary.starts_with("module\tstage\tstatus\tmessage\n"));
    Ok(())
}

#[test]
fn test_batch() -> Result<()> {
    let scratch = Scratch::new(EXAMPLE_TABLE)?;
    let summary = scratch.run(&["--batch"])?;
    let out = scratch.output();

    let calls = scratch.calls()?;
    let metascape: Vec<&String> = calls.iter().filter(|c| c.starts_with("metascape")).collect();
    assert_eq!(metascape.len(), 1);
    assert!(metascape[0].contains(" -u -b "));
    assert_eq!(calls.iter().filter(|c| c.starts_with("gofigure")).count(), 2);

    let manifest = read(&scratch.root().join("msbio/data/input/batch.job"))?;
    assert_eq!(manifest.lines().count(), 2);

    assert!(out.join("logs/metascape/batch/stdout.txt").is_file());
    for id in 1..=2 {
        assert!(out.join(format!("metascape_output/module_{id}/summary.txt")).is_file());
        assert_eq!(status(&summary, id, Stage::Metascape), Some(Status::Ok));
    }
    Ok(())
}

#[test]
fn test_bad_module_value() -> Result<()> {
    let table = format!("{EXAMPLE_TABLE}abc\tEGFR\tGO:0000001\t0.5\n");
    let scratch = Scratch::new(&table)?;
    let summary = scratch.run(&["--skip-metascape"])?;
    let out = scratch.output();

    let partition_failures: Vec<_> = summary
        .outcomes
        .outcomes()
        .iter()
        .filter(|o| o.stage == Stage::Partition && o.status == Status::Failed)
        .collect();
    assert_eq!(partition_failures.len(), 1);
    assert_eq!(partition_failures[0].module, ModuleKey::Raw("abc".to_owned()));

    assert!(out.join("module_gene_list/module_1_data.csv").is_file());
    assert!(out.join("module_gene_list/module_2_data.csv").is_file());
    assert_eq!(status(&summary, 1, Stage::Metascape), Some(Status::Skipped));
    assert_eq!(status(&summary, 1, Stage::GoFigure), Some(Status::Ok));
    assert_eq!(scratch.calls()?.len(), 2);
    Ok(())
}

#[test]
fn test_missing_entry_script() -> Result<()> {
    let scratch = Scratch::new(EXAMPLE_TABLE)?;
    std::fs::remove_file(scratch.root().join("msbio/bin/ms.sh"))?;

    let err = scratch.run(&[]).unwrap_err();
    assert!(err.to_string().contains("entry script"), "{err}");
    assert!(!scratch.root().join("calls.log").exists());
    Ok(())
}

#[test]
fn test_missing_query_column() -> Result<()> {
    let scratch = Scratch::new("module\tgene\n1\tTP53\n")?;
    let err = scratch.run(&[]).unwrap_err();
    assert!(format!("{err:#}").contains("query"), "{err:#}");
    Ok(())
}

#[test]
fn test_workbook_inputs() -> Result<()> {
    let scratch = Scratch::with_tools("enrichment.xlsx")?;
    let root = scratch.root();

    let mut enrichment = Workbook::new();
    let sheet = enrichment.add_worksheet();
    for (col, header) in ["query", "term_id", "p_value"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header)?;
    }
    sheet.write_number(1, 0, 1.0)?;
    sheet.write_string(1, 1, "GO:0006915")?;
    sheet.write_number(1, 2, 0.001)?;
    sheet.write_number(2, 0, 2.0)?;
    sheet.write_string(2, 1, "GO:0008283")?;
    sheet.write_number(2, 2, 0.0001)?;
    enrichment.save(root.join("enrichment.xlsx"))?;

    let mut genes = Workbook::new();
    let module_1 = genes.add_worksheet();
    module_1.set_name("module_1")?;
    module_1.write_string(0, 0, "Gene")?;
    module_1.write_string(1, 0, "tp53")?;
    module_1.write_string(2, 0, "ATM")?;
    let summary = genes.add_worksheet();
    summary.set_name("Summary")?;
    summary.write_string(0, 0, "modules")?;
    genes.save(root.join("genes.xlsx"))?;

    let gene_list = root.join("genes.xlsx");
    let summary = scratch.run(&["--gene-list-excel", gene_list.to_str().unwrap()])?;
    let out = scratch.output();

    assert_eq!(read(&out.join("gene_list/module_1_genes.txt"))?, "Gene\nTP53\nATM\n");
    assert_eq!(
        read(&out.join("go_gene_list/module_2_go_genes.csv"))?,
        "GO:0008283\t0.0001\n"
    );

    // no sheet for module 2: no gene list, so Metascape is skipped for it
    assert_eq!(status(&summary, 2, Stage::GeneList), Some(Status::Failed));
    assert_eq!(status(&summary, 2, Stage::Metascape), Some(Status::Skipped));
    assert_eq!(status(&summary, 2, Stage::GoFigure), Some(Status::Ok));
    assert_eq!(status(&summary, 1, Stage::Collect), Some(Status::Ok));
    Ok(())
}
