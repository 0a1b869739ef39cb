use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use bytes::Bytes;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse an in-memory source into a [`Dataset`].  Dispatch by the extension
/// of `name`.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.xlsb` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row, cell types guessed per value
/// * `.json`    – `[{ "CollegeName": "...", "ST": 55, ... }, ...]`
/// * `.parquet` – one column per schema field
pub fn load_bytes(name: &str, bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(bytes),
        "csv" => load_csv(&bytes),
        "json" => load_json(&bytes),
        "parquet" | "pq" => load_parquet(bytes),
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    }
    .map_err(|source| LoadError::Parse {
        file: name.to_string(),
        source,
    })?;

    raw.into_dataset(name)
}

// ---------------------------------------------------------------------------
// Raw table shared by every format
// ---------------------------------------------------------------------------

struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Validate the shape and normalise the header.  Rows with no values at
    /// all are skipped.
    fn into_dataset(self, file: &str) -> Result<Dataset, LoadError> {
        if self.header.is_empty() {
            return Err(LoadError::NoColumns(file.to_string()));
        }
        let expected = self.header.len();
        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.into_iter().enumerate() {
            if row.len() > expected && row[expected..].iter().any(|c| !c.is_missing()) {
                return Err(LoadError::RaggedRow {
                    file: file.to_string(),
                    row: i + 1,
                    found: row.len(),
                    expected,
                });
            }
            if row.iter().all(CellValue::is_missing) {
                continue;
            }
            rows.push(row);
        }
        Ok(Dataset::new(normalize_header(self.header), rows))
    }
}

/// Blank header cells become `Unnamed: {index}` and repeated names get a
/// `.{n}` suffix, so every column stays addressable by name.
fn normalize_header(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            let base = if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let out = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            out
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workbook loader (calamine)
// ---------------------------------------------------------------------------

fn load_workbook(bytes: Vec<u8>) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(|c| workbook_cell(c).to_string()).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|cells| cells.iter().map(workbook_cell).collect())
        .collect();

    Ok(RawTable { header, rows })
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        other => CellValue::Date(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.  Short
/// records are padded later; long ones are rejected.
fn load_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let header: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable { header, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ChoiceCodeDisplay": "101", "CollegeName": "Alpha College", "ST": 55 },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; absent keys become `Missing`.
fn load_json(bytes: &[u8]) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut header: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            header
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Missing))
                .collect()
        })
        .collect();

    Ok(RawTable { header, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by **Pandas** (`df.to_parquet()`) or
/// **Polars** (`df.write_parquet()`).  Every schema field becomes a column.
fn load_parquet(bytes: Vec<u8>) -> Result<RawTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
        .context("reading parquet metadata")?;
    let header: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        if batch.num_columns() != header.len() {
            bail!(
                "record batch has {} columns, schema has {}",
                batch.num_columns(),
                header.len()
            );
        }
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { header, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(|d| CellValue::Date(d.to_string()))
            .unwrap_or(CellValue::Missing),
        _ => arrow::util::display::array_value_to_string(col.as_ref(), row)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Missing),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Cutoffs" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

    /// Header in row 1 with C1 left blank, data in rows 2 and 4, row 3 empty.
    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1">
<c r="A1" t="inlineStr"><is><t>CollegeName</t></is></c>
<c r="B1" t="inlineStr"><is><t>ST</t></is></c>
<c r="D1" t="inlineStr"><is><t>General</t></is></c>
</row>
<row r="2">
<c r="A2" t="inlineStr"><is><t>Alpha Pune</t></is></c>
<c r="B2"><v>45.5</v></c>
<c r="D2"><v>70</v></c>
</row>
<row r="4">
<c r="A4" t="inlineStr"><is><t>Beta Mumbai</t></is></c>
<c r="D4"><v>80</v></c>
</row>
</sheetData>
</worksheet>"#;

    fn xlsx_fixture() -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
        ];
        for (name, xml) in parts {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file(name, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn csv_header_defines_columns_in_order() {
        let csv = "ChoiceCodeDisplay,CollegeName,Reservation Details,ST\n\
                   101,Alpha College,OPEN,55\n\
                   102,Beta Institute,SC,\n";
        let ds = load_bytes("cutoffs.csv", csv.as_bytes().to_vec()).unwrap();
        assert_eq!(
            ds.columns(),
            ["ChoiceCodeDisplay", "CollegeName", "Reservation Details", "ST"]
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0][3], CellValue::Integer(55));
        assert!(ds.rows()[1][3].is_missing());
    }

    #[test]
    fn blank_and_duplicate_headers_are_renamed() {
        let csv = "ST,,ST\n1,2,3\n";
        let ds = load_bytes("x.csv", csv.as_bytes().to_vec()).unwrap();
        assert_eq!(ds.columns(), ["ST", "Unnamed: 1", "ST.1"]);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let ok = load_bytes("a.csv", b"a,b,c\n1\n".to_vec()).unwrap();
        assert_eq!(ok.rows()[0].len(), 3);

        let err = load_bytes("b.csv", b"a,b\n1,2,3\n".to_vec()).unwrap_err();
        assert!(matches!(err, LoadError::RaggedRow { row: 1, found: 3, expected: 2, .. }));
    }

    #[test]
    fn empty_source_has_no_columns() {
        let err = load_bytes("empty.csv", Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::NoColumns(_)));
    }

    #[test]
    fn json_records_keep_first_seen_key_order() {
        let json = r#"[{"CollegeName": "Alpha", "ST": 55}, {"CollegeName": "Beta", "SC": "x"}]"#;
        let ds = load_bytes("cutoffs.json", json.as_bytes().to_vec()).unwrap();
        assert_eq!(ds.columns(), ["CollegeName", "ST", "SC"]);
        assert!(ds.rows()[1][1].is_missing());
    }

    #[test]
    fn garbage_workbook_is_a_parse_error() {
        let err = load_bytes("broken.xlsx", b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_bytes("notes.docx", Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "docx"));
    }

    #[test]
    fn workbook_first_sheet_becomes_the_dataset() {
        let ds = load_bytes("cutoffs.xlsx", xlsx_fixture()).unwrap();
        assert_eq!(ds.columns(), ["CollegeName", "ST", "Unnamed: 2", "General"]);
        // the empty third row is skipped
        assert_eq!(ds.len(), 2);

        let alpha = &ds.rows()[0];
        assert_eq!(alpha[0], CellValue::Text("Alpha Pune".into()));
        assert_eq!(alpha[1], CellValue::Float(45.5));
        assert!(alpha[2].is_missing());
        assert_eq!(alpha[3].as_f64(), Some(70.0));

        let beta = &ds.rows()[1];
        assert_eq!(beta[0], CellValue::Text("Beta Mumbai".into()));
        assert!(beta[1].is_missing());
        assert_eq!(beta[3].as_f64(), Some(80.0));
    }

    #[test]
    fn parquet_columns_keep_their_types() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ChoiceCodeDisplay", DataType::Utf8, false),
            Field::new("ST", DataType::Float64, true),
            Field::new("Seats", DataType::Int64, false),
            Field::new("Open", DataType::Boolean, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["610124510", "610124610"])),
            Arc::new(Float64Array::from(vec![Some(45.5), None])),
            Arc::new(Int64Array::from(vec![60, 120])),
            Arc::new(BooleanArray::from(vec![true, false])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_bytes("cutoffs.parquet", buf).unwrap();
        assert_eq!(ds.columns(), ["ChoiceCodeDisplay", "ST", "Seats", "Open"]);
        assert_eq!(
            ds.rows()[0],
            vec![
                CellValue::Text("610124510".into()),
                CellValue::Float(45.5),
                CellValue::Integer(60),
                CellValue::Bool(true),
            ]
        );
        assert!(ds.rows()[1][1].is_missing());
        assert_eq!(ds.rows()[1][2], CellValue::Integer(120));
    }
}
