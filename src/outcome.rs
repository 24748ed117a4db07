use std::fmt;

use anyhow::Result;

use table::ModuleId;
use util::HashSet;

/// What an outcome is about: a partitioned module, or a query value
/// that never became one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKey {
    Id(ModuleId),
    Raw(String),
}

impl ModuleKey {
    /// Value written to the `module` column of run_summary.tsv.
    fn label(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "module {id}"),
            Self::Raw(raw) => write!(f, "query value {raw:?}"),
        }
    }
}

impl From<ModuleId> for ModuleKey {
    fn from(id: ModuleId) -> Self {
        Self::Id(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Partition,
    GeneList,
    GoTable,
    Metascape,
    GoFigure,
    Collect,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Partition => "partition",
            Self::GeneList => "gene list",
            Self::GoTable => "GO table",
            Self::Metascape => "Metascape",
            Self::GoFigure => "GO-Figure",
            Self::Collect => "collect results",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    /// a prerequisite stage failed, or the tool was disabled
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        })
    }
}

/// Progress of one module through the pipeline.
/// A module moves forward whether or not the stage it just left succeeded;
/// `Collected` means every stage was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
    Partitioned,
    GeneListReady,
    GoTableReady,
    ToolADone,
    ToolBDone,
    Collected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub module: ModuleKey,
    pub stage: Stage,
    pub status: Status,
    pub message: String,
}

/// Append-only record of every stage outcome in a run.
#[derive(Debug, Default)]
pub struct OutcomeLog {
    outcomes: Vec<StageOutcome>,
}

impl OutcomeLog {
    pub fn record(
        &mut self,
        module: ModuleKey,
        stage: Stage,
        status: Status,
        message: String,
    ) -> &StageOutcome {
        match status {
            Status::Failed => log::warn!("{module}: {stage} failed: {message}"),
            _ => log::info!("{module}: {stage} {status} {message}"),
        }
        self.outcomes.push(StageOutcome {
            module,
            stage,
            status,
            message,
        });
        &self.outcomes[self.outcomes.len() - 1]
    }

    pub fn ok(&mut self, module: ModuleKey, stage: Stage, message: String) -> &StageOutcome {
        self.record(module, stage, Status::Ok, message)
    }

    /// Record a failure; the message is the error's full context chain on one line.
    pub fn failed(
        &mut self,
        module: ModuleKey,
        stage: Stage,
        e: &anyhow::Error,
    ) -> &StageOutcome {
        log::debug!("{module}: {stage}: {e:?}");
        self.record(module, stage, Status::Failed, format!("{e:#}"))
    }

    pub fn skipped(&mut self, module: ModuleKey, stage: Stage, reason: &str) -> &StageOutcome {
        self.record(module, stage, Status::Skipped, reason.to_owned())
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    pub fn get(&self, module: &ModuleKey, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|o| &o.module == module && o.stage == stage)
    }

    /// Distinct modules (or raw query values) with at least one failed stage.
    pub fn modules_with_failures(&self) -> Vec<&ModuleKey> {
        let mut seen = HashSet::default();
        self.outcomes
            .iter()
            .filter(|o| o.status == Status::Failed)
            .map(|o| &o.module)
            .filter(|m| seen.insert(*m))
            .collect()
    }

    pub fn module_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| &o.module)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Render as tab-delimited text with a header row.
    pub fn to_tsv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::with_capacity(64 * (self.outcomes.len() + 1)));
        writer.write_record(["module", "stage", "status", "message"])?;
        for o in &self.outcomes {
            writer.write_record([
                o.module.label(),
                o.stage.to_string(),
                o.status.to_string(),
                o.message.clone(),
            ])?;
        }
        Ok(writer.into_inner().map_err(|e| e.into_error())?)
    }
}
