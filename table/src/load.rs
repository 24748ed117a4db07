use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::{ColumnNames, EnrichmentTable, Error, ModuleId};

/// First column of one worksheet in the gene-list workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSheet {
    pub module: ModuleId,
    pub sheet: String,
    pub values: Vec<String>,
}

/// Load an enrichment table, trying the workbook reader first and
/// falling back to tab-delimited text.
pub fn load(path: &Path, names: &ColumnNames) -> Result<EnrichmentTable, Error> {
    let source = path.display().to_string();

    let (headers, rows) = match read_workbook(path) {
        Ok(raw) => raw,
        Err(workbook_err) => {
            log::debug!("{source} is not a workbook ({workbook_err}); trying tab-delimited text");
            read_delimited(path).map_err(|text_err| Error::InputFormat {
                path: source.clone(),
                workbook: workbook_err,
                text: text_err.to_string(),
            })?
        }
    };

    EnrichmentTable::from_raw(&source, headers, rows, names)
}

/// Read the first column of every worksheet whose name maps to a module id.
pub fn load_gene_sheets(path: &Path) -> Result<Vec<GeneSheet>, Error> {
    let source = path.display().to_string();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| Error::GeneWorkbook(source.clone(), e.to_string()))?;

    let mut sheets = Vec::with_capacity(16);
    for name in workbook.sheet_names() {
        let Some(module) = ModuleId::from_sheet_name(&name) else {
            log::warn!("ignoring sheet \"{name}\" in {source}: name is not a module id");
            continue;
        };
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| Error::GeneWorkbook(source.clone(), e.to_string()))?;
        // first row is the sheet's header:
        let values = range
            .rows()
            .skip(1)
            .filter_map(|row| row.first())
            .map(render_cell)
            .collect();
        sheets.push(GeneSheet {
            module,
            sheet: name,
            values,
        });
    }
    Ok(sheets)
}

type RawTable = (Vec<String>, Vec<Vec<String>>);

fn read_workbook(path: &Path) -> Result<RawTable, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| String::from("workbook has no worksheets"))?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(render_cell).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(render_cell).collect())
        .collect();
    Ok((headers, rows))
}

fn read_delimited(path: &Path) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_owned).collect();
    let mut rows = Vec::with_capacity(256);
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_owned).collect());
    }
    Ok((headers, rows))
}

/// Render a workbook cell the way it would appear in a text export.
/// Integral floats lose their trailing `.0`, so module `1` stays `"1"`.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => String::from("TRUE"),
        Data::Bool(false) => String::from("FALSE"),
        Data::Error(_) => String::from("#ERR"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    /// Enrichment results on the first sheet, as GWENA's Excel export lays them out.
    /// Module ids and p-values are numeric cells.
    fn write_enrichment_workbook(path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("enrichment")?;
        for (col, header) in ["query", "gene", "term_id", "p_value"].into_iter().enumerate() {
            sheet.write_string(0, col as u16, header)?;
        }
        sheet.write_number(1, 0, 1.0)?;
        sheet.write_string(1, 1, "TP53")?;
        sheet.write_string(1, 2, "GO:0006915")?;
        sheet.write_number(1, 3, 0.001)?;
        // no gene on this row:
        sheet.write_number(2, 0, 2.0)?;
        sheet.write_string(2, 2, "GO:0008283")?;
        sheet.write_number(2, 3, 0.0001)?;

        let notes = workbook.add_worksheet();
        notes.set_name("notes")?;
        notes.write_string(0, 0, "not read")?;
        workbook.save(path)?;
        Ok(())
    }

    #[test]
    fn test_load_workbook() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("enrichment.xlsx");
        write_enrichment_workbook(&path)?;

        // read as a workbook: the text reader can't make sense of zip bytes
        let table = load(&path, &ColumnNames::default())?;
        assert_eq!(table.headers(), ["query", "gene", "term_id", "p_value"]);
        assert_eq!(table.len(), 2);

        let rows = table.rows();
        assert_eq!(rows[0].query, "1");
        assert_eq!(rows[0].genes.as_deref(), Some("TP53"));
        assert_eq!(rows[0].p_value.as_deref(), Some("0.001"));
        assert_eq!(rows[1].query, "2");
        assert_eq!(rows[1].genes.as_deref(), Some(""));
        assert_eq!(rows[1].cells, ["2", "", "GO:0008283", "0.0001"]);
        assert_eq!(table.distinct_queries(), ["1", "2"]);
        Ok(())
    }

    #[test]
    fn test_load_gene_sheets() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("genes.xlsx");

        let mut workbook = Workbook::new();
        let first = workbook.add_worksheet();
        first.set_name("module_1")?;
        first.write_string(0, 0, "Gene")?;
        first.write_string(1, 0, "tp53")?;
        first.write_string(2, 0, "BRCA1")?;
        first.write_string(1, 1, "ignored second column")?;

        let second = workbook.add_worksheet();
        second.set_name("Module 2")?;
        second.write_string(0, 0, "Genes")?;
        second.write_string(1, 0, "MYC")?;
        second.write_number(2, 0, 7157.0)?;

        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        summary.write_string(0, 0, "module")?;
        summary.write_string(1, 0, "1")?;
        workbook.save(&path)?;

        let sheets = load_gene_sheets(&path)?;
        assert_eq!(
            sheets,
            vec![
                GeneSheet {
                    module: ModuleId::new(1),
                    sheet: "module_1".into(),
                    values: vec!["tp53".into(), "BRCA1".into()],
                },
                GeneSheet {
                    module: ModuleId::new(2),
                    sheet: "Module 2".into(),
                    values: vec!["MYC".into(), "7157".into()],
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_gene_sheets_from_text_file_fails() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("genes.tsv");
        fs::write(&path, "Gene\nTP53\n")?;

        let err = load_gene_sheets(&path).unwrap_err();
        assert!(matches!(err, Error::GeneWorkbook(..)), "{err:?}");
        Ok(())
    }

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(&Data::Float(1.0)), "1");
        assert_eq!(render_cell(&Data::Float(0.001)), "0.001");
        assert_eq!(render_cell(&Data::Int(42)), "42");
        assert_eq!(render_cell(&Data::String("GO:0008150".into())), "GO:0008150");
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::Bool(true)), "TRUE");
    }

    #[test]
    fn test_load_falls_back_to_tab_delimited() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("enrichment.tsv");
        fs::write(
            &path,
            "query\tgene\tterm_id\tp_value\n1\tTP53\tGO:0006915\t0.001\n2\tMYC\tGO:0008283\t0.0001\n",
        )?;

        let table = load(&path, &ColumnNames::default())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers(), ["query", "gene", "term_id", "p_value"]);
        assert_eq!(table.rows()[1].term_id.as_deref(), Some("GO:0008283"));
        Ok(())
    }

    #[test]
    fn test_load_header_only_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.tsv");
        fs::write(&path, "query\tterm_id\n")?;

        let err = load(&path, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput(_)), "{err:?}");
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_format_error() {
        let err = load(Path::new("/nonexistent/enrichment.xlsx"), &ColumnNames::default())
            .unwrap_err();
        assert!(matches!(err, Error::InputFormat { .. }), "{err:?}");
    }

    #[test]
    fn test_load_unreadable_text_is_format_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("garbage.xlsx");
        fs::write(&path, [b'q', b'\t', 0xff, 0xfe, b'\n', 0xc3, 0x28, b'\n'])?;

        let err = load(&path, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, Error::InputFormat { .. }), "{err:?}");
        Ok(())
    }
}
