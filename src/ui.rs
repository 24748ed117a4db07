use colored::Colorize;

use table::ModuleId;
use util::Timer;

use crate::outcome::{OutcomeLog, StageOutcome, Status};
use crate::settings::Settings;

/// All interactions with the text UI should go through this struct.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// keeps track of time for each stage
    timer: Timer,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            timer: Timer::now(),
        }
    }

    pub fn start_timer(&mut self) {
        if self.verbose {
            self.timer.reset();
        }
    }

    pub fn print_elapsed(&self, stage: &str) {
        if self.verbose {
            self.timer.print_elapsed(stage);
        }
    }

    pub fn verbose_progress_debug<T: std::fmt::Debug>(&self, msg: &str, arg: T) {
        if self.verbose {
            eprint!("{} {:?}... ", msg.magenta(), arg);
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    pub fn module_header(&self, module: ModuleId) {
        eprintln!("\n{} module {module}", "MODULE".magenta());
    }

    pub fn outcome(&self, outcome: &StageOutcome) {
        let label = match outcome.status {
            Status::Ok => "DONE".green(),
            Status::Failed => "FAILED".red(),
            Status::Skipped => "SKIPPED".yellow(),
        };
        if outcome.message.is_empty() {
            eprintln!("{label} {} ({})", outcome.stage, outcome.module);
        } else {
            eprintln!(
                "{label} {} ({}): {}",
                outcome.stage, outcome.module, outcome.message
            );
        }
    }

    /// Final summary; details live in the log and run_summary.tsv.
    pub fn recap(&self, log: &OutcomeLog) {
        let modules = log.module_count();
        let failed = log.modules_with_failures();
        if failed.is_empty() {
            eprintln!(
                "\n{} {modules} module(s) processed without errors.",
                "Analysis completed.".green()
            );
        } else {
            eprintln!(
                "\n{} {} of {modules} module(s) had failures; see run_summary.tsv for details.",
                "Analysis completed with errors.".yellow(),
                failed.len(),
            );
        }
    }
}
