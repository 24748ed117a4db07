/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Copying tool results into the output directory
mod collect;
/// Tool invocation and the per-module pipeline
mod exec;
/// Filesystem operations
mod fs;
/// Per-module stage outcomes and the run's completion log
mod outcome;
/// Deriving per-module tool inputs from the enrichment table
mod prep;
/// Interpreted command-line settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::{App, RunSummary};
pub use args::Args;
pub use outcome::{ModuleKey, ModuleState, OutcomeLog, Stage, StageOutcome, Status};
pub use settings::Settings;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    let log_level = match settings.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);

    // RUN THE THING /////////////////
    let app = App::new(settings);
    if let Err(e) = app.run() {
        log::error!("run aborted: {e:#}");
        return Err(e);
    }

    Ok(())
}
