use std::path::PathBuf;

use anyhow::anyhow;

use table::{Columns, ModuleId};

use crate::collect::{collect, Collected};
use crate::fs::Fs;
use crate::outcome::{ModuleKey, ModuleState, OutcomeLog, Stage, StageOutcome};
use crate::prep::{derive_go_table, GeneListDeriver, GeneSource, ModuleSubset};
use crate::ui::Ui;

use super::{metascape, gofigure, GoFigure, Metascape, ToolResult, ToolRunner};

/// The external tools configured for a run; `None` when a tool is skipped.
pub struct Tools {
    pub runner: ToolRunner,
    pub metascape: Option<Metascape>,
    pub gofigure: Option<GoFigure>,
}

/// Bookkeeping for one module as it moves through the pipeline.
struct ModuleRun {
    id: ModuleId,
    state: ModuleState,
    gene_list: Option<PathBuf>,
    go_table: Option<PathBuf>,
    /// Metascape was started for this module, whatever its exit code
    metascape_ran: bool,
}

impl ModuleRun {
    fn new(id: ModuleId) -> Self {
        Self {
            id,
            state: ModuleState::Partitioned,
            gene_list: None,
            go_table: None,
            metascape_ran: false,
        }
    }

    fn key(&self) -> ModuleKey {
        ModuleKey::Id(self.id)
    }

    fn advance(&mut self, next: ModuleState) {
        debug_assert!(next > self.state, "{:?} -> {next:?}", self.state);
        log::debug!("module {}: {:?} -> {next:?}", self.id, self.state);
        self.state = next;
    }
}

/// `PipelineRunner` takes partitioned modules through the rest of the pipeline.
///
/// For each module it derives the gene list and GO table, runs Metascape on
/// the gene list and GO-Figure on the GO table, then copies Metascape's
/// results out of its staging area. Every stage's outcome goes into the
/// `OutcomeLog`. A failed stage only causes the stages that depend on it to
/// be skipped; it never stops other modules from running.
///
/// In batch mode all gene lists are staged first and Metascape runs once,
/// from a job manifest, before GO-Figure and collection run per module.
pub struct PipelineRunner<'a> {
    fs: &'a Fs,
    ui: &'a mut Ui,
    tools: Tools,
    genes: GeneListDeriver,
    gene_source: GeneSource<'a>,
    columns: &'a Columns,
    batch: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        fs: &'a Fs,
        ui: &'a mut Ui,
        tools: Tools,
        genes: GeneListDeriver,
        gene_source: GeneSource<'a>,
        columns: &'a Columns,
        batch: bool,
    ) -> Self {
        Self {
            fs,
            ui,
            tools,
            genes,
            gene_source,
            columns,
            batch,
        }
    }

    /// Run every module; returns the state each one finished in.
    pub fn run(
        &mut self,
        modules: &[ModuleSubset],
        log: &mut OutcomeLog,
    ) -> Vec<(ModuleId, ModuleState)> {
        let runs = if self.batch {
            self.run_batch(modules, log)
        } else {
            self.run_each(modules, log)
        };
        runs.into_iter().map(|run| (run.id, run.state)).collect()
    }

    fn run_each(&mut self, modules: &[ModuleSubset], log: &mut OutcomeLog) -> Vec<ModuleRun> {
        let mut runs = Vec::with_capacity(modules.len());
        for subset in modules {
            self.ui.module_header(subset.id);
            self.ui.start_timer();

            let mut run = ModuleRun::new(subset.id);
            self.prepare(subset, &mut run, log);
            self.run_metascape(&mut run, log);
            self.run_gofigure(&mut run, log);
            self.collect(&mut run, log);

            self.ui.print_elapsed(&format!("Module {}", subset.id));
            runs.push(run);
        }
        runs
    }

    fn run_batch(&mut self, modules: &[ModuleSubset], log: &mut OutcomeLog) -> Vec<ModuleRun> {
        let mut runs = Vec::with_capacity(modules.len());
        for subset in modules {
            self.ui.module_header(subset.id);
            let mut run = ModuleRun::new(subset.id);
            self.prepare(subset, &mut run, log);
            runs.push(run);
        }

        self.ui.start_timer();
        self.run_metascape_batch(&mut runs, log);
        self.ui.print_elapsed("Metascape batch");

        for run in &mut runs {
            self.ui.module_header(run.id);
            self.run_gofigure(run, log);
            self.collect(run, log);
        }
        runs
    }

    /// Derive both tool inputs for a module.
    fn prepare(&self, subset: &ModuleSubset, run: &mut ModuleRun, log: &mut OutcomeLog) {
        let path = self.fs.gene_list_file(subset.id);
        let derived = self
            .gene_source
            .values(subset)
            .map_err(anyhow::Error::from)
            .and_then(|values| self.genes.derive(&values, &path, self.fs));
        match derived {
            Ok(n) => {
                self.report(log.ok(run.key(), Stage::GeneList, format!("{n} genes")));
                run.gene_list = Some(path);
            }
            Err(e) => self.report(log.failed(run.key(), Stage::GeneList, &e)),
        }
        run.advance(ModuleState::GeneListReady);

        let path = self.fs.go_table_file(subset.id);
        match derive_go_table(subset, self.columns, &path, self.fs) {
            Ok(n) => {
                self.report(log.ok(run.key(), Stage::GoTable, format!("{n} GO terms")));
                run.go_table = Some(path);
            }
            Err(e) => self.report(log.failed(run.key(), Stage::GoTable, &e)),
        }
        run.advance(ModuleState::GoTableReady);
    }

    fn run_metascape(&self, run: &mut ModuleRun, log: &mut OutcomeLog) {
        match (&self.tools.metascape, &run.gene_list) {
            (None, _) => self.report(log.skipped(run.key(), Stage::Metascape, "disabled")),
            (Some(_), None) => self.report(log.skipped(run.key(), Stage::Metascape, "no gene list")),
            (Some(ms), Some(genes)) => {
                let result = ms
                    .stage(self.fs, run.id, genes)
                    .and_then(|()| self.tools.runner.run(&ms.invocation(self.fs, run.id), self.fs));
                match result {
                    Ok(result) => {
                        run.metascape_ran = true;
                        self.report_tool(log, run.key(), Stage::Metascape, metascape::TOOL, &result);
                    }
                    Err(e) => self.report(log.failed(run.key(), Stage::Metascape, &e)),
                }
            }
        }
        run.advance(ModuleState::ToolADone);
    }

    fn run_metascape_batch(&self, runs: &mut [ModuleRun], log: &mut OutcomeLog) {
        let Some(ms) = &self.tools.metascape else {
            for run in runs.iter_mut() {
                self.report(log.skipped(run.key(), Stage::Metascape, "disabled"));
                run.advance(ModuleState::ToolADone);
            }
            return;
        };

        let mut staged = Vec::with_capacity(runs.len());
        for run in runs.iter() {
            match &run.gene_list {
                None => self.report(log.skipped(run.key(), Stage::Metascape, "no gene list")),
                Some(genes) => match ms.stage(self.fs, run.id, genes) {
                    Ok(()) => staged.push(run.id),
                    Err(e) => self.report(log.failed(run.key(), Stage::Metascape, &e)),
                },
            }
        }

        if !staged.is_empty() {
            eprintln!("\nRunning Metascape once for {} module(s)", staged.len());
            let result = ms
                .batch_invocation(self.fs, &staged)
                .and_then(|invocation| self.tools.runner.run(&invocation, self.fs));
            for run in runs.iter_mut().filter(|run| staged.contains(&run.id)) {
                match &result {
                    Ok(result) => {
                        run.metascape_ran = true;
                        self.report_tool(log, run.key(), Stage::Metascape, metascape::TOOL, result);
                    }
                    Err(e) => self.report(log.failed(run.key(), Stage::Metascape, e)),
                }
            }
        }

        for run in runs.iter_mut() {
            run.advance(ModuleState::ToolADone);
        }
    }

    fn run_gofigure(&self, run: &mut ModuleRun, log: &mut OutcomeLog) {
        match (&self.tools.gofigure, &run.go_table) {
            (None, _) => self.report(log.skipped(run.key(), Stage::GoFigure, "disabled")),
            (Some(_), None) => self.report(log.skipped(run.key(), Stage::GoFigure, "no GO table")),
            (Some(gf), Some(table)) => {
                let invocation = gf.invocation(self.fs, run.id, table);
                match self.tools.runner.run(&invocation, self.fs) {
                    Ok(result) => {
                        self.report_tool(log, run.key(), Stage::GoFigure, gofigure::TOOL, &result)
                    }
                    Err(e) => self.report(log.failed(run.key(), Stage::GoFigure, &e)),
                }
            }
        }
        run.advance(ModuleState::ToolBDone);
    }

    /// Copy Metascape's results out of its staging area.
    /// GO-Figure writes straight into the output directory, so there is nothing to move.
    fn collect(&self, run: &mut ModuleRun, log: &mut OutcomeLog) {
        match &self.tools.metascape {
            None => self.report(log.skipped(run.key(), Stage::Collect, "Metascape disabled")),
            Some(_) if !run.metascape_ran => {
                self.report(log.skipped(run.key(), Stage::Collect, "Metascape did not run"))
            }
            Some(ms) => {
                let source = ms.staged_output(run.id);
                let dest = self.fs.metascape_dir(run.id);
                match collect(self.fs, &source, &dest) {
                    Ok(Collected::Copied) => self.report(log.ok(
                        run.key(),
                        Stage::Collect,
                        dest.display().to_string(),
                    )),
                    Ok(Collected::SourceMissing) => {
                        let e = anyhow!("Metascape produced no output in {source:?}");
                        self.report(log.failed(run.key(), Stage::Collect, &e))
                    }
                    Err(e) => self.report(log.failed(run.key(), Stage::Collect, &e)),
                }
            }
        }
        run.advance(ModuleState::Collected);
    }

    fn report_tool(
        &self,
        log: &mut OutcomeLog,
        module: ModuleKey,
        stage: Stage,
        tool: &'static str,
        result: &ToolResult,
    ) {
        match result.check(tool) {
            Ok(()) => self.report(log.ok(module, stage, result.describe())),
            Err(e) => self.report(log.failed(module, stage, &e.into())),
        }
    }

    fn report(&self, outcome: &StageOutcome) {
        self.ui.outcome(outcome);
    }
}
