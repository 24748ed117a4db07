/// Runs the per-module pipeline
mod pipeline_runner;
pub use pipeline_runner::{PipelineRunner, Tools};

/// Run a subprocess
mod run_cmd;

/// Tool invocations and the runner that executes them
mod tool;
pub use tool::{Located, ToolInvocation, ToolLocator, ToolResult, ToolRunner};

/// Metascape (MSBio) invocations
mod metascape;
pub use metascape::Metascape;

/// GO-Figure invocations
mod gofigure;
pub use gofigure::GoFigure;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to start {tool} ({program})")]
    ToolNotFound {
        tool: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while {action} ({tool})")]
    Io {
        tool: &'static str,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot attach to output of {0}")]
    NoPipe(&'static str),
    #[error("Output reader thread for {0} panicked")]
    ReaderThread(&'static str),
    #[error("Metascape entry script not found: {0}")]
    MissingEntryScript(String),
    #[error("{tool} {outcome}")]
    ToolFailed { tool: &'static str, outcome: String },
}
