//! Purpose: Record store over a JSON document holding a list of field mappings.
//! Exports: `StructuredStore`.
//! Role: Structured variant of `RecordStore`.
//! Invariants: Absent, blank, or `[]` documents load as an empty list.
//! Invariants: Every mutation rewrites the whole document.
//! Invariants: Records need not share fields; no header reconciliation.
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::core::atomic::replace_contents;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;
use crate::core::record::Record;
use crate::core::store::{RecordStore, read_text, record_not_found};

const INDENT: &[u8] = b"    ";

pub struct StructuredStore {
    path: PathBuf,
}

impl StructuredStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_all(&self, records: &[Record]) -> Result<(), Error> {
        let bytes = encode_document(records)?;
        replace_contents(&self.path, &bytes)
    }
}

impl RecordStore for StructuredStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Format {
        Format::Structured
    }

    fn load(&self) -> Result<Vec<Record>, Error> {
        let records = match read_text(&self.path)? {
            Some(text) => parse_document(&text).map_err(|err| err.with_path(&self.path))?,
            None => Vec::new(),
        };
        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "loaded structured records"
        );
        Ok(records)
    }

    /// Every key seen across the list, in first-seen order.
    fn field_names(&self) -> Result<Option<Vec<String>>, Error> {
        let mut names: Vec<String> = Vec::new();
        for record in self.load()? {
            for key in record.keys() {
                if !names.iter().any(|name| name == key) {
                    names.push(key.to_string());
                }
            }
        }
        Ok((!names.is_empty()).then_some(names))
    }

    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut records = self.load()?;
        records.push(record.clone());
        self.write_all(&records)?;
        tracing::info!(
            path = %self.path.display(),
            records = records.len(),
            "appended structured record"
        );
        Ok(())
    }

    fn delete_at(&self, index: usize) -> Result<usize, Error> {
        let mut records = self.load()?;
        if index >= records.len() {
            tracing::debug!(
                path = %self.path.display(),
                index,
                records = records.len(),
                "delete position out of range"
            );
            return Ok(0);
        }
        records.remove(index);
        self.write_all(&records)?;
        tracing::info!(path = %self.path.display(), index, "deleted structured record");
        Ok(1)
    }

    fn replace_record_at(&self, index: usize, record: &Record) -> Result<(), Error> {
        let mut records = self.load()?;
        if index >= records.len() {
            return Err(record_not_found(&self.path, index, records.len()));
        }
        records[index] = record.clone();
        self.write_all(&records)?;
        tracing::info!(path = %self.path.display(), index, "replaced structured record");
        Ok(())
    }

    // Structured files accept partially filled records.
    fn check_new_record(&self, _record: &Record) -> Result<(), Error> {
        Ok(())
    }
}

fn parse_document(text: &str) -> Result<Vec<Record>, Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Format)
            .with_message("invalid json")
            .with_source(err)
    })?;
    let Value::Array(items) = value else {
        return Err(Error::new(ErrorKind::Format)
            .with_message("top-level json value must be a list")
            .with_hint("Structured files hold a list of objects, for example [{\"name\":\"Ana\"}]."));
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Record::from_json_object(map).map_err(|err| err.with_index(idx)),
            _ => Err(Error::new(ErrorKind::Format)
                .with_message("list entries must be objects")
                .with_index(idx)),
        })
        .collect()
}

fn encode_document(records: &[Record]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    records.serialize(&mut serializer).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::StructuredStore;
    use crate::core::error::ErrorKind;
    use crate::core::record::Record;
    use crate::core::store::RecordStore;
    use std::fs;

    fn store_with(contents: &str) -> (tempfile::TempDir, StructuredStore) {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("data.json");
        fs::write(&path, contents).expect("seed");
        (temp, StructuredStore::new(path))
    }

    #[test]
    fn absent_blank_and_empty_list_load_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let absent = StructuredStore::new(temp.path().join("absent.json"));
        assert!(absent.load().unwrap().is_empty());
        assert_eq!(absent.field_names().unwrap(), None);

        for contents in ["", "  \n", "[]"] {
            let (_temp, store) = store_with(contents);
            assert!(store.load().unwrap().is_empty());
        }
    }

    #[test]
    fn records_may_differ_in_fields() {
        let (_temp, store) = store_with(r#"[{"a":"1"},{"b":"2","c":"3"}]"#);
        let records = store.load().unwrap();
        assert_eq!(records[1], Record::new().with("b", "2").with("c", "3"));
        assert_eq!(
            store.field_names().unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );

        store.append(&Record::new().with("z", "")).unwrap();
        assert_eq!(store.load().unwrap().len(), 3);
    }

    #[test]
    fn rewrite_is_pretty_and_keeps_field_order() {
        let (_temp, store) = store_with("[]");
        store
            .append(&Record::new().with("name", "José").with("age", "30"))
            .unwrap();
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "[\n    {\n        \"name\": \"José\",\n        \"age\": \"30\"\n    }\n]\n"
        );
    }

    #[test]
    fn append_creates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StructuredStore::new(temp.path().join("new.json"));
        store.append(&Record::new().with("x", "1")).unwrap();
        assert_eq!(store.load().unwrap(), vec![Record::new().with("x", "1")]);
    }

    #[test]
    fn wrong_shapes_are_format_errors() {
        for contents in ["{\"a\":1}", "[1,2]", "[{\"a\":[1]}]", "[{"] {
            let (_temp, store) = store_with(contents);
            let err = store.load().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "contents: {contents}");
            assert!(err.path().is_some());
        }
    }

    #[test]
    fn failed_parse_leaves_file_untouched_on_append() {
        let (_temp, store) = store_with("not json");
        assert!(store.append(&Record::new().with("x", "1")).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "not json");
    }

    #[test]
    fn replace_swaps_whole_mapping() {
        let (_temp, store) = store_with(r#"[{"a":"1","b":"2"}]"#);
        store
            .replace_record_at(0, &Record::new().with("a", "9"))
            .unwrap();
        assert_eq!(store.load().unwrap(), vec![Record::new().with("a", "9")]);
        assert_eq!(
            store
                .replace_record_at(1, &Record::new())
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn partial_records_are_accepted() {
        let (_temp, store) = store_with("[]");
        assert!(store
            .check_new_record(&Record::new().with("a", "").with("b", "x"))
            .is_ok());
    }
}
