use anyhow::{Context, Result};

use table::{EnrichmentTable, GeneSheet, ModuleId};

use crate::exec::{GoFigure, Metascape, PipelineRunner, ToolRunner, Tools};
use crate::fs::Fs;
use crate::outcome::{ModuleState, OutcomeLog, Stage};
use crate::prep::{partition, GeneListDeriver, GeneSource, ModuleSubset};
use crate::settings::Settings;
use crate::ui::Ui;

/// What a completed run leaves behind, besides the files on disk.
#[derive(Debug)]
pub struct RunSummary {
    /// every stage outcome, in the order they happened
    pub outcomes: OutcomeLog,
    /// the state each partitioned module finished in
    pub modules: Vec<(ModuleId, ModuleState)>,
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let fs = Fs::new(&settings.output);
        let ui = Ui::new(&settings);
        Self { settings, fs, ui }
    }

    /// Run the whole pipeline.
    ///
    /// An `Err` means the run was aborted before any module was processed.
    /// Failures inside a module are recorded in the returned summary instead.
    pub fn run(mut self) -> Result<RunSummary> {
        let verbose = self.settings.verbose > 0;
        if verbose {
            eprintln!("Using output directory {:?}", self.settings.output);
        }
        self.fs.ensure_output_dir_exists(verbose)?;

        let metascape = self.metascape()?;
        let gofigure = self
            .settings
            .run_gofigure
            .then(|| GoFigure::new(&self.settings));

        self.ui.start_timer();
        self.ui.verbose_progress_debug("Loading", &self.settings.input);
        let table = table::load(&self.settings.input, &self.settings.columns)
            .with_context(|| format!("loading {:?}", self.settings.input))?;
        self.ui.done();
        log::info!("loaded {} rows from {:?}", table.len(), self.settings.input);
        let gene_sheets = self.load_gene_sheets()?;
        self.ui.print_elapsed("Loading");

        let mut outcomes = OutcomeLog::default();
        let modules = self.partition(&table, &mut outcomes);

        let genes = GeneListDeriver::new().context("compiling gene identifier pattern")?;
        let gene_source = match &gene_sheets {
            Some(sheets) => GeneSource::Sheets(sheets),
            None => GeneSource::Column(table.columns()),
        };
        let tools = Tools {
            runner: ToolRunner::new(self.settings.timeout, verbose),
            metascape,
            gofigure,
        };

        let states = PipelineRunner::new(
            &self.fs,
            &mut self.ui,
            tools,
            genes,
            gene_source,
            table.columns(),
            self.settings.batch,
        )
        .run(&modules, &mut outcomes);

        self.fs
            .write_file(self.fs.run_summary(), outcomes.to_tsv()?)
            .context("writing run summary")?;
        self.ui.recap(&outcomes);

        Ok(RunSummary {
            outcomes,
            modules: states,
        })
    }

    /// Check the Metascape installation and allow staging files inside it.
    fn metascape(&mut self) -> Result<Option<Metascape>> {
        let Some(location) = &self.settings.metascape_location else {
            return Ok(None);
        };
        let metascape = Metascape::new(location, &self.settings)?;
        self.fs.allow(&metascape.data_dir())?;
        log::info!("using Metascape installation at {location:?}");
        Ok(Some(metascape))
    }

    fn load_gene_sheets(&self) -> Result<Option<Vec<GeneSheet>>> {
        let Some(path) = &self.settings.gene_list_excel else {
            return Ok(None);
        };
        self.ui.verbose_progress_debug("Loading gene lists from", path);
        let sheets = table::load_gene_sheets(path)
            .with_context(|| format!("loading gene lists from {path:?}"))?;
        self.ui.done();
        log::info!("loaded {} gene-list sheet(s)", sheets.len());
        Ok(Some(sheets))
    }

    /// Write one subset per module, and record the values that couldn't be partitioned.
    fn partition<'t>(
        &self,
        table: &'t EnrichmentTable,
        outcomes: &mut OutcomeLog,
    ) -> Vec<ModuleSubset<'t>> {
        let partition = partition(table, &self.fs);
        for subset in &partition.modules {
            let message = format!("{} rows for query \"{}\"", subset.rows.len(), subset.query);
            log::debug!("module {}: {message}", subset.id);
            outcomes.ok(subset.id.into(), Stage::Partition, message);
        }
        for e in partition.errors {
            let key = e.key();
            self.ui.outcome(outcomes.failed(key, Stage::Partition, &e.into()));
        }
        if partition.modules.is_empty() {
            log::warn!("no modules to process");
        }
        eprintln!("Found {} module(s)", partition.modules.len());
        partition.modules
    }
}
