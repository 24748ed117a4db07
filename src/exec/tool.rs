use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::fs::Fs;

use super::run_cmd::run_cmd;
use super::Error;

const STDOUT_FILE: &str = "stdout.txt";
const STDERR_FILE: &str = "stderr.txt";

/// One external process to run. Built by a tool definition
/// ([`super::Metascape`], [`super::GoFigure`]); never by joining strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// tool name, for logs and errors
    pub tool: &'static str,
    pub program: OsString,
    pub args: Vec<OsString>,
    /// working directory; inherited if `None`
    pub current_dir: Option<PathBuf>,
    /// where the tool is expected to write its results; created before running
    pub output_dir: PathBuf,
    /// where `stdout.txt` and `stderr.txt` are written
    pub log_dir: PathBuf,
}

impl ToolInvocation {
    pub fn new<P: Into<OsString>>(
        tool: &'static str,
        program: P,
        output_dir: PathBuf,
        log_dir: PathBuf,
    ) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::with_capacity(8),
            current_dir: None,
            output_dir,
            log_dir,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Program and args, for display only.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured output of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// `None` if the process was killed by a signal or timed out
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ToolResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable exit status.
    pub fn describe(&self) -> String {
        match (self.exit_code, self.timed_out) {
            (_, true) => String::from("timed out and was killed"),
            (Some(code), _) => format!("exited with code {code}"),
            (None, _) => String::from("was terminated by a signal"),
        }
    }

    /// Last non-empty line of stderr, for one-line summaries.
    pub fn stderr_tail(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }

    /// Ok if the tool exited with 0, o/w an error describing how it failed.
    pub fn check(&self, tool: &'static str) -> Result<(), Error> {
        if self.success() {
            return Ok(());
        }
        let mut outcome = self.describe();
        if let Some(tail) = self.stderr_tail() {
            outcome.push_str(": ");
            outcome.push_str(tail);
        }
        Err(Error::ToolFailed { tool, outcome })
    }
}

/// Executes `ToolInvocation`s, one at a time.
///
/// A non-zero exit code is not an error here: it comes back in the
/// `ToolResult` for the caller to report. Errors are reserved for not being
/// able to run the tool at all (it can't be started, or its output and log
/// directories can't be created).
pub struct ToolRunner {
    /// kill invocations that run longer than this; wait forever if `None`
    timeout: Option<Duration>,
    /// echo the tool's output to the terminal
    verbose: bool,
}

impl ToolRunner {
    pub fn new(timeout: Option<Duration>, verbose: bool) -> Self {
        Self { timeout, verbose }
    }

    pub fn run(&self, invocation: &ToolInvocation, fs: &Fs) -> Result<ToolResult> {
        let tool = invocation.tool;
        fs.create_dir(&invocation.output_dir)
            .with_context(|| format!("creating {tool} output directory"))?;
        fs.create_dir(&invocation.log_dir)
            .with_context(|| format!("creating {tool} log directory"))?;

        let out_file = fs
            .create_file(invocation.log_dir.join(STDOUT_FILE))
            .context("creating stdout.txt file")?;
        let err_file = fs
            .create_file(invocation.log_dir.join(STDERR_FILE))
            .context("creating stderr.txt file")?;

        eprintln!("{} {}", "RUN".green(), invocation.command_line());
        log::info!("running {tool}: {}", invocation.command_line());

        let mut cmd = invocation.command();
        let captured = run_cmd(tool, &mut cmd, out_file, err_file, self.verbose, self.timeout)?;

        let result = ToolResult {
            exit_code: captured.status.and_then(|s| s.code()),
            stdout: String::from_utf8_lossy(&captured.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&captured.stderr).into_owned(),
            timed_out: captured.status.is_none(),
        };
        log::info!("{tool} {}", result.describe());
        Ok(result)
    }
}

/// Where a tool was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// a script or executable at a known path
    Path(PathBuf),
    /// a bare command name, left to `PATH` lookup when it's spawned
    Command(String),
}

/// Finds a tool without the rest of the crate knowing how it was installed:
/// an explicit path, then a known install location under `$HOME`, then a
/// location under an environment-provided prefix, then the bare command name.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    pub explicit: Option<PathBuf>,
    /// relative to `$HOME`
    pub home_relative: &'static str,
    /// environment variable holding an installation prefix
    pub prefix_var: &'static str,
    /// relative to the prefix in `prefix_var`
    pub prefix_relative: &'static str,
    pub command: &'static str,
}

impl ToolLocator {
    pub fn resolve(&self) -> Located {
        self.resolve_with(|var| std::env::var_os(var))
    }

    /// Resolve using `env` to look up environment variables.
    pub fn resolve_with<F>(&self, env: F) -> Located
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(path) = &self.explicit {
            return Located::Path(path.clone());
        }
        let candidates = [
            env("HOME").map(|home| PathBuf::from(home).join(self.home_relative)),
            env(self.prefix_var).map(|prefix| PathBuf::from(prefix).join(self.prefix_relative)),
        ];
        for candidate in candidates.into_iter().flatten() {
            if candidate.is_file() {
                log::debug!("found {} at {candidate:?}", self.command);
                return Located::Path(candidate);
            }
            log::debug!("{} not found at {candidate:?}", self.command);
        }
        Located::Command(self.command.to_owned())
    }
}
