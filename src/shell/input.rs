//! Purpose: Line-oriented input sources for the interactive shell.
//! Exports: `LineSource`, `Line`, `RustylineSource`, `ScriptedSource`.
//! Role: Seam between the session logic and the terminal.
//! Invariants: Sources never print anything except their own prompt.
use std::collections::VecDeque;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    Text(String),
    Eof,
    Interrupted,
}

pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line, Error>;
}

/// Terminal input with line editing and in-memory history.
pub struct RustylineSource {
    editor: DefaultEditor,
}

impl RustylineSource {
    pub fn new() -> Result<Self, Error> {
        let editor = DefaultEditor::new().map_err(|err| {
            Error::new(ErrorKind::Io).with_message(format!("failed to open terminal: {err}"))
        })?;
        Ok(Self { editor })
    }
}

impl LineSource for RustylineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line, Error> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Line::Text(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Line::Interrupted),
            Err(ReadlineError::Eof) => Ok(Line::Eof),
            Err(err) => Err(Error::new(ErrorKind::Io).with_message(format!("failed to read input: {err}"))),
        }
    }
}

/// Replays canned answers; reports `Eof` once they run out.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    lines: VecDeque<Line>,
    prompts: Vec<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|line| Line::Text(line.into())).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn then_interrupt(mut self) -> Self {
        self.lines.push_back(Line::Interrupted);
        self
    }

    /// Every prompt shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line, Error> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front().unwrap_or(Line::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::{Line, LineSource, ScriptedSource};

    #[test]
    fn scripted_source_replays_then_ends() {
        let mut source = ScriptedSource::new(["1", "people.csv"]).then_interrupt();
        assert_eq!(source.read_line("a> ").unwrap(), Line::Text("1".into()));
        assert_eq!(source.read_line("b> ").unwrap(), Line::Text("people.csv".into()));
        assert_eq!(source.read_line("c> ").unwrap(), Line::Interrupted);
        assert_eq!(source.read_line("d> ").unwrap(), Line::Eof);
        assert_eq!(source.prompts(), ["a> ", "b> ", "c> ", "d> "]);
    }
}
