/// Names of the columns we look for in an enrichment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    /// module/query id column (required)
    pub query: String,
    /// ontology term id column, e.g. `GO:0006915`
    pub term_id: String,
    /// enrichment p-value column
    pub p_value: String,
    /// gene identifiers column; may hold several comma-separated genes
    pub gene: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            query: String::from("query"),
            term_id: String::from("term_id"),
            p_value: String::from("p_value"),
            gene: String::from("gene"),
        }
    }
}

/// Column positions, resolved once against the header row at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub names: ColumnNames,
    pub query: usize,
    pub term_id: Option<usize>,
    pub p_value: Option<usize>,
    pub gene: Option<usize>,
}

impl Columns {
    /// Find each named column in `headers`; `None` if the query column is missing.
    /// Matching ignores case and surrounding whitespace.
    pub fn resolve(names: &ColumnNames, headers: &[String]) -> Option<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        };
        Some(Self {
            query: find(&names.query)?,
            term_id: find(&names.term_id),
            p_value: find(&names.p_value),
            gene: find(&names.gene),
            names: names.clone(),
        })
    }

    /// Both columns needed for a GO-term/p-value table are present.
    pub fn has_go_columns(&self) -> bool {
        self.term_id.is_some() && self.p_value.is_some()
    }
}
