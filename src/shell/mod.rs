//! Purpose: Menu-driven interactive session over one record file at a time.
//! Exports: `Session`, `LineSource`, `Line`, `RustylineSource`, `ScriptedSource`.
//! Role: Owns all prompting; calls into `RecordStore` for every file operation.
//! Invariants: At most one `StoreHandle` is active; loading a file replaces it.
//! Invariants: Store failures are reported and the menu loop continues.
//! Invariants: Users see 1-based positions; stores receive 0-based ones.
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

mod input;

pub use input::{Line, LineSource, RustylineSource, ScriptedSource};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;
use crate::core::record::Record;
use crate::core::store::{StoreHandle, create_store_file};
use crate::render::{render_record_fields, render_records};

const MENU_RULE_WIDTH: usize = 50;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Session<S, W> {
    source: S,
    out: W,
    handle: Option<StoreHandle>,
    interrupted: bool,
}

impl<S: LineSource, W: Write> Session<S, W> {
    pub fn new(source: S, out: W) -> Self {
        Self {
            source,
            out,
            handle: None,
            interrupted: false,
        }
    }

    pub fn with_handle(mut self, handle: StoreHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn handle(&self) -> Option<&StoreHandle> {
        self.handle.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, W) {
        (self.source, self.out)
    }

    /// Runs the menu loop until the user exits, input ends, or output fails.
    pub fn run(&mut self) -> Result<(), Error> {
        loop {
            self.show_menu()?;
            let choice = match self.source.read_line("\nSelect an option (1-6): ")? {
                Line::Text(text) => text,
                Line::Interrupted => {
                    self.say("\nInterrupted. Exiting.")?;
                    return Ok(());
                }
                Line::Eof => return Ok(()),
            };
            tracing::debug!(choice = choice.trim(), "menu selection");

            let result = match choice.trim() {
                "1" => self.load_file(),
                "2" => self.list_records(),
                "3" => self.add_record(),
                "4" => self.delete_record(),
                "5" => self.modify_record(),
                "6" => {
                    self.say("\nGoodbye!")?;
                    return Ok(());
                }
                _ => self.say("Invalid option. Choose 1-6.").map(|_| Flow::Continue),
            };

            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    if self.interrupted {
                        self.say("\nInterrupted. Exiting.")?;
                    }
                    return Ok(());
                }
                Err(err) => {
                    tracing::debug!(error = %err, "operation failed");
                    self.say(format!("error: {}", describe(&err)))?;
                }
            }
        }
    }

    fn show_menu(&mut self) -> Result<(), Error> {
        let rule = "=".repeat(MENU_RULE_WIDTH);
        let current = match &self.handle {
            Some(handle) => format!(
                "Current file: {} ({})",
                handle.path().display(),
                handle.format()
            ),
            None => "Current file: none".to_string(),
        };
        self.say(format!(
            "\n{rule}\nCSV/JSON RECORD MANAGER\n{rule}\n{current}\n{rule}\n\
             1. Load file (CSV/JSON)\n\
             2. List records\n\
             3. Add record\n\
             4. Delete record\n\
             5. Modify record\n\
             6. Exit\n{rule}"
        ))
    }

    fn load_file(&mut self) -> Result<Flow, Error> {
        self.say("\nLOAD FILE")?;
        let Some(name) = self.ask("File name (e.g. data.csv or data.json): ")? else {
            return Ok(Flow::Exit);
        };
        if name.is_empty() {
            self.say("No file name given.")?;
            return Ok(Flow::Continue);
        }
        let path = PathBuf::from(&name);
        if Format::from_path(&path).is_err() {
            self.say("Unsupported format. Use .csv or .json.")?;
            return Ok(Flow::Continue);
        }

        if !path.exists() {
            let prompt = format!("File '{name}' does not exist. Create it? (y/n): ");
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(Flow::Exit);
            };
            if !is_yes(&answer) {
                self.say("Cancelled.")?;
                return Ok(Flow::Continue);
            }
            create_store_file(&path)?;
            self.handle = Some(StoreHandle::open(path)?);
            self.say(format!("File '{name}' created."))?;
            return Ok(Flow::Continue);
        }

        self.handle = Some(StoreHandle::open(path)?);
        self.say(format!("File '{name}' loaded."))?;
        Ok(Flow::Continue)
    }

    fn list_records(&mut self) -> Result<Flow, Error> {
        let Some(handle) = self.active()? else {
            return Ok(Flow::Continue);
        };
        let records = handle.load()?;
        let source = handle.path().display().to_string();
        self.say(format!("\n{}", render_records(&records, &source)))?;
        Ok(Flow::Continue)
    }

    fn add_record(&mut self) -> Result<Flow, Error> {
        let Some(handle) = self.active()? else {
            return Ok(Flow::Continue);
        };
        let fields = match handle.field_names()? {
            Some(fields) => fields,
            None => {
                let Some(line) = self.ask("Enter field names separated by commas: ")? else {
                    return Ok(Flow::Exit);
                };
                split_field_names(&line)
            }
        };
        if fields.is_empty() {
            self.say("No field names given.")?;
            return Ok(Flow::Continue);
        }

        self.say("\nEnter the values for the new record:")?;
        let mut record = Record::new();
        for field in fields {
            let Some(value) = self.ask(&format!("{field}: "))? else {
                return Ok(Flow::Exit);
            };
            record.insert(field, value);
        }

        let handle = self.require_handle()?;
        handle.check_new_record(&record)?;
        handle.append(&record)?;
        self.say("Record added.")?;
        Ok(Flow::Continue)
    }

    fn delete_record(&mut self) -> Result<Flow, Error> {
        let Some(handle) = self.active()? else {
            return Ok(Flow::Continue);
        };
        let records = handle.load()?;
        if records.is_empty() {
            self.say("No records to delete.")?;
            return Ok(Flow::Continue);
        }
        let Some(index) = self.choose_record(&records, "delete")? else {
            return Ok(Flow::Exit);
        };
        let Some(index) = index else {
            return Ok(Flow::Continue);
        };

        self.say(format!(
            "\nSelected record:\n{}",
            render_record_fields(&records[index])
        ))?;
        let Some(answer) = self.ask("Delete this record? (y/n): ")? else {
            return Ok(Flow::Exit);
        };
        if !is_yes(&answer) {
            self.say("Cancelled.")?;
            return Ok(Flow::Continue);
        }
        let removed = self.require_handle()?.delete_at(index)?;
        self.say(format!("Deleted {removed} record(s)."))?;
        Ok(Flow::Continue)
    }

    fn modify_record(&mut self) -> Result<Flow, Error> {
        let Some(handle) = self.active()? else {
            return Ok(Flow::Continue);
        };
        let records = handle.load()?;
        if records.is_empty() {
            self.say("No records to modify.")?;
            return Ok(Flow::Continue);
        }
        let Some(index) = self.choose_record(&records, "modify")? else {
            return Ok(Flow::Exit);
        };
        let Some(index) = index else {
            return Ok(Flow::Continue);
        };

        self.say("\nEnter new values (leave empty to keep the current value):")?;
        let current = &records[index];
        let mut updated = current.clone();
        for (field, value) in current.iter() {
            let Some(answer) = self.ask(&format!("{field} [{value}]: "))? else {
                return Ok(Flow::Exit);
            };
            if !answer.is_empty() {
                updated.insert(field, answer);
            }
        }
        loop {
            let Some(field) = self.ask("New field name (leave empty to finish): ")? else {
                return Ok(Flow::Exit);
            };
            if field.is_empty() {
                break;
            }
            let Some(value) = self.ask(&format!("{field}: "))? else {
                return Ok(Flow::Exit);
            };
            updated.insert(field, value);
        }

        if updated == *current {
            self.say("No changes.")?;
            return Ok(Flow::Continue);
        }
        self.require_handle()?.replace_record_at(index, &updated)?;
        self.say(format!("Record {} updated.", index + 1))?;
        Ok(Flow::Continue)
    }

    /// Shows the records and asks for a 1-based number.
    /// Outer `None` means input ended; inner `None` means no valid choice.
    fn choose_record(
        &mut self,
        records: &[Record],
        action: &str,
    ) -> Result<Option<Option<usize>>, Error> {
        let source = self.require_handle()?.path().display().to_string();
        self.say(format!("\n{}", render_records(records, &source)))?;
        let prompt = format!("\nNumber of the record to {action} (1, 2, 3...): ");
        let Some(answer) = self.ask(&prompt)? else {
            return Ok(None);
        };
        let Ok(number) = answer.parse::<usize>() else {
            self.say("Please enter a valid number.")?;
            return Ok(Some(None));
        };
        match number.checked_sub(1).filter(|index| *index < records.len()) {
            Some(index) => Ok(Some(Some(index))),
            None => {
                self.say("Invalid record number.")?;
                Ok(Some(None))
            }
        }
    }

    /// The loaded handle, or `None` after telling the user to load a file first.
    fn active(&mut self) -> Result<Option<&StoreHandle>, Error> {
        if self.handle.is_none() {
            self.say("\nerror: load a file first (option 1).")?;
            return Ok(None);
        }
        Ok(self.handle.as_ref())
    }

    fn require_handle(&self) -> Result<&StoreHandle, Error> {
        self.handle
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Internal).with_message("no file loaded"))
    }

    /// Trimmed answer, or `None` on end of input or interrupt.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>, Error> {
        match self.source.read_line(prompt)? {
            Line::Text(text) => Ok(Some(text.trim().to_string())),
            Line::Eof => Ok(None),
            Line::Interrupted => {
                self.interrupted = true;
                Ok(None)
            }
        }
    }

    fn say(&mut self, text: impl Display) -> Result<(), Error> {
        writeln!(self.out, "{text}").map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write output")
                .with_source(err)
        })
    }
}

fn split_field_names(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe(err: &Error) -> String {
    let mut text = err.message().map(str::to_string).unwrap_or_else(|| match err.kind() {
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Format => "file content is not in the expected format".to_string(),
        ErrorKind::Validation => "invalid record".to_string(),
        ErrorKind::NotFound => "record not found".to_string(),
        ErrorKind::Usage => "invalid input".to_string(),
        ErrorKind::Internal => "internal error".to_string(),
    });
    if let Some(path) = err.path() {
        text.push_str(&format!(" ({})", path.display()));
    }
    if let Some(source) = std::error::Error::source(err) {
        text.push_str(&format!(": {source}"));
    }
    if let Some(hint) = err.hint() {
        text.push_str(&format!("\nhint: {hint}"));
    }
    text
}
