//! Purpose: Record store over comma-delimited files with a header row.
//! Exports: `TabularStore`.
//! Role: Tabular variant of `RecordStore`.
//! Invariants: The first row names the fields; header order survives every rewrite.
//! Invariants: Append writes one row in place; every other mutation rewrites the file.
//! Invariants: Short rows read as empty fields; cells past the header are ignored.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::atomic::replace_contents;
use crate::core::error::{Error, ErrorKind, io_error};
use crate::core::format::Format;
use crate::core::record::Record;
use crate::core::store::{RecordStore, read_text, record_not_found};

pub struct TabularStore {
    path: PathBuf,
}

/// Parsed file contents: header plus data rows.
#[derive(Debug, Default, PartialEq, Eq)]
struct Table {
    header: Vec<String>,
    records: Vec<Record>,
}

impl TabularStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_table(&self) -> Result<Table, Error> {
        let text = read_text(&self.path)?.ok_or_else(|| {
            Error::new(ErrorKind::Io)
                .with_message("file does not exist")
                .with_path(&self.path)
        })?;
        parse_table(&text).map_err(|err| err.with_path(&self.path))
    }

    fn write_table(&self, table: &Table) -> Result<(), Error> {
        let mut bytes = encode_row(&table.header)?;
        for record in &table.records {
            bytes.extend(encode_row(&row_values(&table.header, record))?);
        }
        replace_contents(&self.path, &bytes)
    }
}

impl RecordStore for TabularStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Format {
        Format::Tabular
    }

    fn load(&self) -> Result<Vec<Record>, Error> {
        let table = self.read_table()?;
        tracing::debug!(
            path = %self.path.display(),
            records = table.records.len(),
            "loaded tabular records"
        );
        Ok(table.records)
    }

    fn field_names(&self) -> Result<Option<Vec<String>>, Error> {
        let table = self.read_table()?;
        if table.header.is_empty() {
            return Ok(None);
        }
        Ok(Some(table.header))
    }

    fn append(&self, record: &Record) -> Result<(), Error> {
        let text = read_text(&self.path)?.unwrap_or_default();
        let table = parse_table(&text).map_err(|err| err.with_path(&self.path))?;

        let mut bytes = Vec::new();
        let header = if table.header.is_empty() {
            let header = record.keys().map(str::to_string).collect::<Vec<_>>();
            if header.is_empty() {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message("cannot derive a header from an empty record")
                    .with_path(&self.path));
            }
            bytes.extend(encode_row(&header)?);
            header
        } else {
            let known = |key: &str| table.header.iter().any(|h| h.as_str() == key);
            if let Some(unknown) = record.keys().find(|key| !known(*key)) {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message(format!("field '{unknown}' is not in the header"))
                    .with_path(&self.path)
                    .with_hint(format!("Known fields: {}.", table.header.join(", "))));
            }
            if !text.ends_with('\n') {
                ensure_last_row_closed(&text, &table).map_err(|err| err.with_path(&self.path))?;
                bytes.push(b'\n');
            }
            table.header
        };
        bytes.extend(encode_row(&row_values(&header, record))?);

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|err| io_error(&self.path, err))?;
        file.write_all(&bytes)
            .map_err(|err| io_error(&self.path, err))?;
        tracing::info!(path = %self.path.display(), "appended tabular record");
        Ok(())
    }

    fn delete_at(&self, index: usize) -> Result<usize, Error> {
        let mut table = self.read_table()?;
        if index >= table.records.len() {
            tracing::debug!(
                path = %self.path.display(),
                index,
                records = table.records.len(),
                "delete position out of range"
            );
            return Ok(0);
        }
        table.records.remove(index);
        self.write_table(&table)?;
        tracing::info!(path = %self.path.display(), index, "deleted tabular record");
        Ok(1)
    }

    fn replace_record_at(&self, index: usize, record: &Record) -> Result<(), Error> {
        let mut table = self.read_table()?;
        if index >= table.records.len() {
            return Err(record_not_found(&self.path, index, table.records.len()));
        }
        for key in record.keys() {
            if !table.header.iter().any(|h| h.as_str() == key) {
                table.header.push(key.to_string());
            }
        }
        table.records[index] = record.clone();
        self.write_table(&table)?;
        tracing::info!(path = %self.path.display(), index, "replaced tabular record");
        Ok(())
    }

    fn check_new_record(&self, record: &Record) -> Result<(), Error> {
        let empty = record.empty_fields();
        if empty.is_empty() && !record.is_empty() {
            return Ok(());
        }
        Err(Error::new(ErrorKind::Validation)
            .with_message("all fields are required")
            .with_path(&self.path)
            .with_hint(if empty.is_empty() {
                "Provide at least one field.".to_string()
            } else {
                format!("Empty fields: {}.", empty.join(", "))
            }))
    }
}

fn parse_table(text: &str) -> Result<Table, Error> {
    if text.trim().is_empty() {
        return Ok(Table::default());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = reader
        .headers()
        .map_err(format_error)?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(format_error)?;
        let record = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), row.get(idx).unwrap_or("")))
            .collect::<Record>();
        records.push(record);
    }
    Ok(Table { header, records })
}

// An unterminated quote on the last line swallows anything appended after it.
fn ensure_last_row_closed(text: &str, table: &Table) -> Result<(), Error> {
    let terminated = parse_table(&format!("{text}\n"))?;
    if terminated == *table {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Format)
        .with_message("last row has an unterminated quote")
        .with_hint("Close the quoted field on the last line before appending."))
}

fn row_values<'a>(header: &[String], record: &'a Record) -> Vec<&'a str> {
    header
        .iter()
        .map(|name| record.get(name).unwrap_or(""))
        .collect()
}

fn encode_row<I, T>(cells: I) -> Result<Vec<u8>, Error>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(cells).map_err(format_error)?;
    writer.into_inner().map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to flush csv row")
            .with_source(err.into_error())
    })
}

fn format_error(err: csv::Error) -> Error {
    Error::new(ErrorKind::Format)
        .with_message("malformed csv")
        .with_source(err)
}
