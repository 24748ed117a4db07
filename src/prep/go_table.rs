use std::path::Path;

use anyhow::Result;

use table::Columns;

use crate::fs::Fs;

use super::{Error, ModuleSubset};

const GO_PREFIX: &str = "GO:";

/// Write the GO-Figure input for one module: `term<TAB>p-value` per line,
/// no header, only terms in the GO namespace.
/// Returns the number of terms written.
pub fn derive_go_table(
    subset: &ModuleSubset,
    columns: &Columns,
    path: &Path,
    fs: &Fs,
) -> Result<usize> {
    if columns.term_id.is_none() {
        return Err(Error::MissingColumn(columns.names.term_id.clone()).into());
    }
    if columns.p_value.is_none() {
        return Err(Error::MissingColumn(columns.names.p_value.clone()).into());
    }

    let mut text = String::with_capacity(32 * subset.rows.len());
    let mut count = 0;
    for row in &subset.rows {
        let term = row.term_id.as_deref().unwrap_or_default().trim();
        if !term.starts_with(GO_PREFIX) {
            continue;
        }
        let p_value = row.p_value.as_deref().unwrap_or_default().trim();
        if p_value.is_empty() {
            log::warn!("module {}: skipping {term}, which has no p-value", subset.id);
            continue;
        }
        text.push_str(term);
        text.push('\t');
        text.push_str(p_value);
        text.push('\n');
        count += 1;
    }

    if count == 0 {
        return Err(Error::NoGoTerms(subset.rows.len()).into());
    }
    fs.write_file(path, text)?;
    Ok(count)
}
