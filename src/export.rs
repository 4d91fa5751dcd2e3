//! Export of usage/activity data to CSV and JSON report documents.
//!
//! CSV shape follows the reporting screens: the header row is the object
//! keys of the first record, and every data cell is the JSON-stringified
//! field value (strings keep their quotes, missing fields serialize as
//! `null`). The JSON report is a `{title, period, generated_at, data}`
//! document.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::Record;

/// Error type for export operations
#[derive(Debug)]
pub enum ExportError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
    /// CSV export needs at least one record to derive its header.
    NoRecords,
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::JsonError(err)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::JsonError(e) => write!(f, "JSON error: {}", e),
            ExportError::IoError(e) => write!(f, "IO error: {}", e),
            ExportError::NoRecords => write!(f, "No records to export"),
        }
    }
}

impl std::error::Error for ExportError {}

/// CSV writer over row records.
///
/// Column set and order come from the first record's keys; later records
/// are projected onto that header.
pub struct CsvExporter<W: Write> {
    writer: W,
}

impl<W: Write> CsvExporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write header plus one line per record.
    pub fn write_all(&mut self, records: &[Record]) -> Result<(), ExportError> {
        let first = records.first().ok_or(ExportError::NoRecords)?;
        let header: Vec<&String> = first.keys().collect();

        let header_line: Vec<&str> = header.iter().map(|k| k.as_str()).collect();
        writeln!(self.writer, "{}", header_line.join(","))?;

        for record in records {
            let mut cells = Vec::with_capacity(header.len());
            for key in &header {
                let value = record.get(key).cloned().unwrap_or(serde_json::Value::Null);
                cells.push(serde_json::to_string(&value)?);
            }
            writeln!(self.writer, "{}", cells.join(","))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON report document for usage/activity exports.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    /// Human-readable reporting period ("2026-07-01 a 2026-07-31").
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub data: Vec<Record>,
}

impl Report {
    /// Build a report stamped with the current time.
    pub fn new(title: impl Into<String>, period: impl Into<String>, data: Vec<Record>) -> Self {
        Self {
            title: title.into(),
            period: period.into(),
            generated_at: Utc::now(),
            data,
        }
    }

    /// Serialize the document as pretty JSON.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            Record::new()
                .with_field("fecha", json!("2026-07-01"))
                .with_field("sesiones", json!(12))
                .with_field("institucion", json!("Uni A")),
            Record::new()
                .with_field("fecha", json!("2026-07-02"))
                .with_field("sesiones", json!(3)),
        ]
    }

    #[test]
    fn test_csv_header_from_first_record_keys() {
        let mut buf = Vec::new();
        CsvExporter::new(&mut buf).write_all(&records()).unwrap();

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "fecha,sesiones,institucion");
        // Values are JSON-stringified: strings quoted, numbers bare.
        assert_eq!(lines[1], r#""2026-07-01",12,"Uni A""#);
        // Missing fields serialize as null.
        assert_eq!(lines[2], r#""2026-07-02",3,null"#);
    }

    #[test]
    fn test_csv_empty_input_is_an_error() {
        let mut buf = Vec::new();
        let result = CsvExporter::new(&mut buf).write_all(&[]);
        assert!(matches!(result, Err(ExportError::NoRecords)));
    }

    #[test]
    fn test_report_document() {
        let report = Report::new("Uso mensual", "2026-07", records());
        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["title"], "Uso mensual");
        assert_eq!(value["period"], "2026-07");
        assert!(value["generated_at"].is_string());
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_report_to_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporte.json");
        let report = Report::new("Actividad", "2026-07", records());

        report.write_to(std::fs::File::create(&path).unwrap()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Actividad"));
    }
}
