//! Purpose: Decide which store variant handles a file.
//! Exports: `Format`.
//! Role: Single place where file suffixes map to on-disk representations.
//! Invariants: Selection is by suffix only (`.csv`, `.json`), case-insensitive.
//! Invariants: Unsupported suffixes never reach a store.
use std::fmt;
use std::path::Path;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// Comma-delimited rows under a header line.
    Tabular,
    /// A JSON list of field mappings.
    Structured,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Format::Tabular),
            Some("json") => Ok(Format::Structured),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message("unsupported file format")
                .with_path(path)
                .with_hint("Use a file ending in .csv or .json.")),
        }
    }

    /// Contents written when a new file is created.
    pub fn empty_contents(self) -> &'static str {
        match self {
            Format::Tabular => "",
            Format::Structured => "[]",
        }
    }

    /// Lowercase suffix, as used in machine-readable output.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Tabular => "csv",
            Format::Structured => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Format::Tabular => "CSV",
            Format::Structured => "JSON",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::Format;
    use crate::core::error::ErrorKind;
    use std::path::Path;

    #[test]
    fn suffix_selects_format() {
        assert_eq!(Format::from_path(Path::new("people.csv")).unwrap(), Format::Tabular);
        assert_eq!(Format::from_path(Path::new("DATA.JSON")).unwrap(), Format::Structured);
        assert_eq!(
            Format::from_path(Path::new("dir/x.Csv")).unwrap(),
            Format::Tabular
        );
    }

    #[test]
    fn other_suffixes_are_usage_errors() {
        for name in ["notes.txt", "noext", "archive.csv.gz"] {
            let err = Format::from_path(Path::new(name)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Usage);
            assert!(err.hint().is_some());
        }
    }
}
