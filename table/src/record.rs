use util::HashSet;

use crate::{ColumnNames, Columns, Error};

/// One row of an enrichment table.
///
/// The typed fields are copies of the cells in the resolved columns;
/// `cells` keeps the whole row so module subsets can be written out unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRow {
    /// raw value of the query column, exactly as read
    pub query: String,
    /// `None` if the table has no term id column
    pub term_id: Option<String>,
    /// `None` if the table has no p-value column
    pub p_value: Option<String>,
    /// `None` if the table has no gene column
    pub genes: Option<String>,
    /// every cell in the row, padded to the header length
    pub cells: Vec<String>,
}

/// A validated enrichment table: at least one row, and a query column.
/// Read-only once loaded.
#[derive(Debug, Clone)]
pub struct EnrichmentTable {
    headers: Vec<String>,
    columns: Columns,
    rows: Vec<EnrichmentRow>,
}

impl EnrichmentTable {
    /// Validate raw header and cell rows and build typed records.
    /// Blank rows are dropped. `source` names the input in error messages.
    pub fn from_raw(
        source: &str,
        headers: Vec<String>,
        raw_rows: Vec<Vec<String>>,
        names: &ColumnNames,
    ) -> Result<Self, Error> {
        let raw_rows: Vec<Vec<String>> = raw_rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        if raw_rows.is_empty() {
            return Err(Error::EmptyInput(source.to_owned()));
        }

        let columns = Columns::resolve(names, &headers).ok_or_else(|| Error::MissingColumn {
            column: names.query.clone(),
            path: source.to_owned(),
            found: headers.join(", "),
        })?;

        let width = headers.len();
        let rows = raw_rows
            .into_iter()
            .map(|mut cells| {
                if cells.len() < width {
                    cells.resize(width, String::new());
                }
                let cell = |idx: Option<usize>| idx.map(|i| cells[i].clone());
                EnrichmentRow {
                    query: cells[columns.query].clone(),
                    term_id: cell(columns.term_id),
                    p_value: cell(columns.p_value),
                    genes: cell(columns.gene),
                    cells,
                }
            })
            .collect();

        log::debug!(
            "loaded {source}: {} columns, query column at index {}",
            width,
            columns.query
        );

        Ok(Self {
            headers,
            columns,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn rows(&self) -> &[EnrichmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct raw query values, in the order they first appear.
    pub fn distinct_queries(&self) -> Vec<&str> {
        let mut seen = HashSet::default();
        self.rows
            .iter()
            .map(|row| row.query.as_str())
            .filter(|query| seen.insert(*query))
            .collect()
    }

    /// Rows whose raw query value is exactly `query`.
    pub fn rows_for_query<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a EnrichmentRow> {
        self.rows.iter().filter(move |row| row.query == query)
    }
}
