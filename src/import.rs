//! Tabular student import: format detection, CSV and XLS/XLSX parsing, and
//! the case-insensitive header mapping onto student fields.
//!
//! The first row names the columns; recognized names are "family name",
//! "name", "email" and "group id", in any order. Absent columns default to
//! an empty string (names) or null (email, group id).

use std::fmt;
use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xls, Xlsx};
use uuid::Uuid;

use crate::err::Error;

const COL_FAMILY_NAME: &str = "family name";
const COL_NAME: &str = "name";
const COL_EMAIL: &str = "email";
const COL_GROUP_ID: &str = "group id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xls,
    Xlsx,
}

impl ImportFormat {
    /// Detects the upload format from the multipart content type, falling
    /// back to the filename extension.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<ImportFormat> {
        // Mime parameters ("text/csv; charset=utf-8") don't matter here.
        let mime = content_type.and_then(|ct| ct.split(';').next()).map(str::trim);
        match mime {
            Some("text/csv") | Some("application/csv") => return Some(ImportFormat::Csv),
            Some("application/vnd.ms-excel") => return Some(ImportFormat::Xls),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => {
                return Some(ImportFormat::Xlsx)
            }
            _ => {}
        }
        let name = file_name?.to_lowercase();
        if name.ends_with(".csv") {
            Some(ImportFormat::Csv)
        } else if name.ends_with(".xls") {
            Some(ImportFormat::Xls)
        } else if name.ends_with(".xlsx") {
            Some(ImportFormat::Xlsx)
        } else {
            None
        }
    }
}

/// One parsed data row, not yet an inserted student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedStudent {
    pub fname: String,
    pub name: String,
    pub email: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ImportError {
    /// The workbook/file could not be read at all.
    Malformed(String),
    /// No header row to map columns from.
    EmptySheet,
    /// A data row that cannot be imported. `row` is the 1-based sheet row,
    /// header included.
    Row { row: usize, message: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Malformed(msg) => write!(f, "could not read the uploaded file: {}", msg),
            ImportError::EmptySheet => write!(f, "the uploaded file has no header row"),
            ImportError::Row { row, message } => write!(f, "row {}: {}", row, message),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<ImportError> for Error {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Malformed(message) => Error::InternalError {
                kind: "ImportError",
                message,
            },
            other => Error::invalid("file", other.to_string()),
        }
    }
}

pub fn parse(format: ImportFormat, data: &[u8]) -> Result<Vec<ImportedStudent>, ImportError> {
    match format {
        ImportFormat::Csv => parse_csv(data),
        ImportFormat::Xls => {
            let mut workbook = Xls::new(Cursor::new(data.to_vec()))
                .map_err(|e| ImportError::Malformed(e.to_string()))?;
            parse_range(&first_sheet(&mut workbook)?)
        }
        ImportFormat::Xlsx => {
            let mut workbook = Xlsx::new(Cursor::new(data.to_vec()))
                .map_err(|e| ImportError::Malformed(e.to_string()))?;
            parse_range(&first_sheet(&mut workbook)?)
        }
    }
}

fn first_sheet<RS, R>(workbook: &mut R) -> Result<Range<DataType>, ImportError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: fmt::Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptySheet)?
        .map_err(|e| ImportError::Malformed(e.to_string()))
}

fn parse_csv(data: &[u8]) -> Result<Vec<ImportedStudent>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(data);
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Malformed(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(ImportError::EmptySheet);
    }

    let mut students = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.map_err(|e| ImportError::Row {
            row,
            message: e.to_string(),
        })?;
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        students.push(build_student(&header, &cells, row)?);
    }
    Ok(students)
}

fn parse_range(range: &Range<DataType>) -> Result<Vec<ImportedStudent>, ImportError> {
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or(ImportError::EmptySheet)?
        .iter()
        .map(|c| cell_text(c).to_lowercase())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(ImportError::EmptySheet);
    }

    let mut students = Vec::new();
    for (i, row) in rows.enumerate() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        students.push(build_student(&header, &cells, i + 2)?);
    }
    Ok(students)
}

fn build_student(
    header: &[String],
    cells: &[String],
    row: usize,
) -> Result<ImportedStudent, ImportError> {
    let fname = column(header, cells, COL_FAMILY_NAME).unwrap_or_default();
    let name = column(header, cells, COL_NAME).unwrap_or_default();
    let email = column(header, cells, COL_EMAIL).filter(|v| !v.is_empty());
    let group_id = match column(header, cells, COL_GROUP_ID) {
        None => None,
        Some(raw) if raw.is_empty() => None,
        Some(raw) => Some(Uuid::parse_str(&raw).map_err(|_| ImportError::Row {
            row,
            message: format!("invalid group id `{}`", raw),
        })?),
    };
    Ok(ImportedStudent {
        fname,
        name,
        email,
        group_id,
    })
}

fn column(header: &[String], cells: &[String], name: &str) -> Option<String> {
    header
        .iter()
        .position(|h| h == name)
        .and_then(|idx| cells.get(idx))
        .map(|v| v.trim().to_string())
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_content_type_first() {
        assert_eq!(
            ImportFormat::detect(Some("roster.bin"), Some("text/csv")),
            Some(ImportFormat::Csv)
        );
        assert_eq!(
            ImportFormat::detect(None, Some("application/vnd.ms-excel")),
            Some(ImportFormat::Xls)
        );
        assert_eq!(
            ImportFormat::detect(
                None,
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            ),
            Some(ImportFormat::Xlsx)
        );
    }

    #[test]
    fn detects_by_extension_fallback() {
        assert_eq!(
            ImportFormat::detect(Some("Roster.CSV"), Some("application/octet-stream")),
            Some(ImportFormat::Csv)
        );
        assert_eq!(
            ImportFormat::detect(Some("roster.xls"), None),
            Some(ImportFormat::Xls)
        );
        assert_eq!(
            ImportFormat::detect(Some("roster.xlsx"), None),
            Some(ImportFormat::Xlsx)
        );
        assert_eq!(ImportFormat::detect(Some("roster.pdf"), None), None);
        assert_eq!(ImportFormat::detect(None, None), None);
    }

    #[test]
    fn csv_maps_columns_by_header_in_any_order() {
        let gid = Uuid::new_v4();
        let data = format!(
            "email,group id,Family Name,NAME\njane@x.com,{},Doe,Jane\n",
            gid
        );
        let rows = parse(ImportFormat::Csv, data.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![ImportedStudent {
                fname: "Doe".to_string(),
                name: "Jane".to_string(),
                email: Some("jane@x.com".to_string()),
                group_id: Some(gid),
            }]
        );
    }

    #[test]
    fn csv_absent_columns_default_to_empty_and_null() {
        let data = b"name\nJane\nJohn\n";
        let rows = parse(ImportFormat::Csv, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fname, "");
        assert_eq!(rows[0].name, "Jane");
        assert_eq!(rows[0].email, None);
        assert_eq!(rows[0].group_id, None);
    }

    #[test]
    fn csv_blank_cells_become_null() {
        let data = b"family name,name,email,group id\nDoe,Jane,,\n";
        let rows = parse(ImportFormat::Csv, data).unwrap();
        assert_eq!(rows[0].email, None);
        assert_eq!(rows[0].group_id, None);
    }

    #[test]
    fn csv_bad_group_id_names_the_row() {
        let data = b"family name,name,group id\nDoe,Jane,not-a-uuid\n";
        match parse(ImportFormat::Csv, data) {
            Err(ImportError::Row { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("not-a-uuid"));
            }
            other => panic!("expected a row error, got {:?}", other),
        }
    }

    #[test]
    fn csv_ragged_record_is_a_row_error() {
        let data = b"family name,name\nDoe,Jane\nDoe,Jane,extra\n";
        match parse(ImportFormat::Csv, data) {
            Err(ImportError::Row { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected a row error, got {:?}", other),
        }
    }

    #[test]
    fn empty_csv_is_rejected() {
        assert!(matches!(
            parse(ImportFormat::Csv, b""),
            Err(ImportError::EmptySheet)
        ));
    }

    #[test]
    fn sheet_cells_render_as_text() {
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(cell_text(&DataType::String("  Doe ".to_string())), "Doe");
        assert_eq!(cell_text(&DataType::Int(7)), "7");
        assert_eq!(cell_text(&DataType::Float(7.0)), "7");
        assert_eq!(cell_text(&DataType::Bool(true)), "true");
    }

    #[test]
    fn sheet_rows_map_like_csv_rows() {
        let header = vec![
            "family name".to_string(),
            "name".to_string(),
            "email".to_string(),
            "group id".to_string(),
        ];
        let gid = Uuid::new_v4();
        let cells = vec![
            "Doe".to_string(),
            "Jane".to_string(),
            "".to_string(),
            gid.to_string(),
        ];
        let student = build_student(&header, &cells, 2).unwrap();
        assert_eq!(student.fname, "Doe");
        assert_eq!(student.email, None);
        assert_eq!(student.group_id, Some(gid));
    }
}
