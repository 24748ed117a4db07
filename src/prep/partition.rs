use std::path::{Path, PathBuf};

use anyhow::Result;

use table::{EnrichmentRow, EnrichmentTable, ModuleId, ModuleIdError};
use util::HashMap;

use crate::fs::Fs;
use crate::outcome::ModuleKey;

/// The rows of one module, and the file they were written to.
#[derive(Debug)]
pub struct ModuleSubset<'t> {
    pub id: ModuleId,
    /// raw query value shared by every row
    pub query: &'t str,
    pub rows: Vec<&'t EnrichmentRow>,
    /// module_gene_list/module_<id>_data.csv
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error(transparent)]
    ModuleId(#[from] ModuleIdError),
    #[error("query values \"{first}\" and \"{second}\" both name module {id}; only \"{first}\" was kept")]
    Collision {
        id: ModuleId,
        first: String,
        second: String,
    },
    #[error("unable to write subset file: {1}")]
    Write(ModuleId, String),
}

impl PartitionError {
    /// The module (or raw query value) this error belongs to.
    pub fn key(&self) -> ModuleKey {
        match self {
            Self::ModuleId(ModuleIdError(raw)) => ModuleKey::Raw(raw.clone()),
            Self::Collision { second, .. } => ModuleKey::Raw(second.clone()),
            Self::Write(id, _) => ModuleKey::Id(*id),
        }
    }
}

/// Result of partitioning: the modules that were written,
/// and a record of every query value that couldn't be.
#[derive(Debug)]
pub struct Partition<'t> {
    pub modules: Vec<ModuleSubset<'t>>,
    pub errors: Vec<PartitionError>,
}

/// Split `table` into one subset per distinct query value and write each
/// to `module_gene_list/`.
///
/// Rows are selected by exact equality on the raw query value; the integer
/// id is only used to name the module. A value that can't be coerced to an
/// id, or whose id is already taken by another value, is recorded as an
/// error and skipped, and the remaining values are still processed.
pub fn partition<'t>(table: &'t EnrichmentTable, fs: &Fs) -> Partition<'t> {
    let queries = table.distinct_queries();
    let mut modules = Vec::with_capacity(queries.len());
    let mut errors = Vec::with_capacity(0);
    let mut ids: HashMap<ModuleId, &str> = HashMap::default();

    for query in queries {
        let id = match ModuleId::coerce(query) {
            Ok(id) => id,
            Err(e) => {
                log::error!("Error converting {query:?} to a module id: {e}");
                errors.push(e.into());
                continue;
            }
        };

        if let Some(first) = ids.get(&id) {
            errors.push(PartitionError::Collision {
                id,
                first: (*first).to_owned(),
                second: query.to_owned(),
            });
            continue;
        }
        ids.insert(id, query);

        let rows: Vec<&EnrichmentRow> = table.rows_for_query(query).collect();
        let path = fs.subset_file(id);
        if let Err(e) = write_subset(table.headers(), &rows, &path, fs) {
            errors.push(PartitionError::Write(id, format!("{e:#}")));
            continue;
        }
        log::debug!("module {id}: {} rows written to {path:?}", rows.len());

        modules.push(ModuleSubset {
            id,
            query,
            rows,
            path,
        });
    }

    Partition { modules, errors }
}

fn write_subset(headers: &[String], rows: &[&EnrichmentRow], path: &Path, fs: &Fs) -> Result<()> {
    fs.create_parent_dir(path)?;
    let file = fs.create_file(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row.cells)?;
    }
    writer.flush()?;
    Ok(())
}
