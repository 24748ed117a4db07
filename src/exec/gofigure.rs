use std::ffi::OsString;
use std::path::Path;

use table::ModuleId;

use crate::fs::Fs;
use crate::settings::Settings;

use super::{Located, ToolInvocation, ToolLocator};

pub const TOOL: &str = "gofigure";

/// Where the bioconda package unpacks the script under a miniforge install.
const HOME_SCRIPT: &str = "miniforge3/pkgs/go-figure-1.0.2-hdfd78af_0/python-scripts/gofigure.py";
const PREFIX_VAR: &str = "CONDA_PREFIX";
const PREFIX_SCRIPT: &str = "bin/gofigure.py";
const COMMAND: &str = "gofigure.py";

/// Builds GO-Figure invocations: `<python> gofigure.py -i <table> -o <dir>`.
#[derive(Debug, Clone)]
pub struct GoFigure {
    launcher: Located,
    python: OsString,
}

impl GoFigure {
    pub fn new(settings: &Settings) -> Self {
        let locator = ToolLocator {
            explicit: settings.gofigure_script.clone(),
            home_relative: HOME_SCRIPT,
            prefix_var: PREFIX_VAR,
            prefix_relative: PREFIX_SCRIPT,
            command: COMMAND,
        };
        Self::with_launcher(locator.resolve(), &settings.python)
    }

    pub fn with_launcher(launcher: Located, python: &str) -> Self {
        match &launcher {
            Located::Path(script) => log::info!("using GO-Figure script {script:?}"),
            Located::Command(cmd) => log::warn!("GO-Figure script not found; relying on `{cmd}` being on PATH"),
        }
        Self {
            launcher,
            python: OsString::from(python),
        }
    }

    /// Invocation for one module, writing into `GoFigure/module_<id>`.
    /// A script is run through the interpreter; a bare command is run directly.
    pub fn invocation(&self, fs: &Fs, module: ModuleId, go_table: &Path) -> ToolInvocation {
        let output = fs.gofigure_dir(module);
        let log_dir = fs.tool_log_dir(TOOL, module);
        let invocation = match &self.launcher {
            Located::Path(script) => {
                ToolInvocation::new(TOOL, self.python.clone(), output.clone(), log_dir).arg(script)
            }
            Located::Command(cmd) => ToolInvocation::new(TOOL, cmd, output.clone(), log_dir),
        };
        invocation
            .current_dir(&output)
            .arg("-i")
            .arg(go_table)
            .arg("-o")
            .arg(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_script_runs_through_interpreter() {
        let fs = Fs::new(Path::new("/out"));
        let gofigure = GoFigure::with_launcher(
            Located::Path(PathBuf::from("/opt/gofigure.py")),
            "python3",
        );

        let inv = gofigure.invocation(&fs, ModuleId::new(2), Path::new("/out/go.csv"));
        assert_eq!(inv.program, "python3");
        assert_eq!(
            inv.command_line(),
            "python3 /opt/gofigure.py -i /out/go.csv -o /out/GoFigure/module_2"
        );
        assert_eq!(inv.output_dir, Path::new("/out/GoFigure/module_2"));
        assert_eq!(inv.log_dir, Path::new("/out/logs/gofigure/module_2"));
    }

    #[test]
    fn test_bare_command() {
        let fs = Fs::new(Path::new("/out"));
        let gofigure = GoFigure::with_launcher(Located::Command(COMMAND.into()), "python3");

        let inv = gofigure.invocation(&fs, ModuleId::new(5), Path::new("/out/go.csv"));
        assert_eq!(
            inv.command_line(),
            "gofigure.py -i /out/go.csv -o /out/GoFigure/module_5"
        );
    }
}
