use std::path::Path;

use anyhow::Result;
use regex::Regex;

use table::{Columns, GeneSheet};
use util::HashSet;

use crate::fs::Fs;

use super::{Error, ModuleSubset};

/// Header line Metascape expects at the top of a gene list.
const HEADER: &str = "Gene";

/// Where a module's gene values come from.
#[derive(Debug, Clone, Copy)]
pub enum GeneSource<'a> {
    /// First column of the module's sheet in the gene-list workbook.
    Sheets(&'a [GeneSheet]),
    /// The gene column of the module's own rows; cells may hold comma-separated lists.
    Column(&'a Columns),
}

impl GeneSource<'_> {
    /// Raw gene values for `subset`, before any cleanup.
    pub fn values(&self, subset: &ModuleSubset) -> Result<Vec<String>, Error> {
        match self {
            Self::Sheets(sheets) => sheets
                .iter()
                .find(|sheet| sheet.module == subset.id)
                .map(|sheet| sheet.values.clone())
                .ok_or(Error::NoGeneSheet),
            Self::Column(columns) => {
                if columns.gene.is_none() {
                    return Err(Error::MissingColumn(columns.names.gene.clone()));
                }
                Ok(subset
                    .rows
                    .iter()
                    .filter_map(|row| row.genes.as_deref())
                    .flat_map(|cell| cell.split(','))
                    .map(str::to_owned)
                    .collect())
            }
        }
    }
}

/// Cleans gene values into a list of identifiers and writes it out.
///
/// Values are trimmed and upper-cased. Only identifiers made of letters,
/// digits, `-`, `_` and `.` are kept, except ones that read as numbers
/// (fold changes and p-values, including `1E-05` style, that ended up in
/// the gene column). Plain digit strings stay: they are Entrez ids.
/// Duplicates keep their first position, so the output is deterministic.
pub struct GeneListDeriver {
    identifier: Regex,
}

impl GeneListDeriver {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            identifier: Regex::new(r"^[A-Z0-9._-]+$")?,
        })
    }

    pub fn normalize<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let mut seen = HashSet::default();
        values
            .iter()
            .map(|v| v.as_ref().trim().to_uppercase())
            .filter(|v| self.identifier.is_match(v) && !is_number(v))
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }

    /// Write the cleaned list to `path`; returns the number of genes written.
    pub fn derive<S: AsRef<str>>(&self, values: &[S], path: &Path, fs: &Fs) -> Result<usize> {
        let genes = self.normalize(values);
        if genes.is_empty() {
            return Err(Error::EmptyGeneList(values.len()).into());
        }

        let mut text = String::with_capacity(8 * (genes.len() + 1));
        text.push_str(HEADER);
        text.push('\n');
        for gene in &genes {
            text.push_str(gene);
            text.push('\n');
        }
        fs.write_file(path, text)?;
        Ok(genes.len())
    }
}

/// A finite float that isn't just digits.
fn is_number(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite) && !value.bytes().all(|b| b.is_ascii_digit())
}
