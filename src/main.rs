//! Purpose: `recstore` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Record positions on the command line are 1-based.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All file access goes through `api::RecordStore`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use recstore::api::{Error, ErrorKind, Format, Record, to_exit_code};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

const LOG_ENV: &str = "RECSTORE_LOG";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command)
        .map_err(add_file_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "recstore",
    version,
    about = "Read, add, delete, and modify records in CSV or JSON files",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"The file suffix picks the format:
  - `.csv`  header row, then one record per line
  - `.json` a list of objects with string values

Record numbers start at 1.
"#,
    after_help = r#"EXAMPLES
  $ recstore create people.csv
  $ recstore add people.csv name=Ana age=30
  $ recstore list people.csv --table
  $ recstore update people.csv 1 age=31
  $ recstore delete people.csv 1
  $ recstore shell people.csv          # interactive menu

LEARN MORE
  $ recstore <command> --help
  Set RECSTORE_LOG=debug to trace file operations on stderr."#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Open the interactive menu",
        long_about = r#"Open the interactive menu (load, list, add, delete, modify).

Without FILE, start with no file loaded and pick one from the menu."#
    )]
    Shell {
        #[arg(help = "File to load on start", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    #[command(about = "Create an empty CSV or JSON file")]
    Create {
        #[arg(help = "New file path (.csv or .json)", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "List every record")]
    List {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Render an aligned table instead of JSON")]
        table: bool,
    },
    #[command(about = "Show one record by number")]
    Get {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Record number (1-based)", value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
    #[command(
        about = "Append a record",
        after_help = r#"EXAMPLES
  $ recstore add people.csv name=Ana age=30
  $ recstore add data.json x=1

CSV files require a value for every field."#
    )]
    Add {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(required = true, help = "Fields as name=value")]
        fields: Vec<String>,
    },
    #[command(about = "Delete a record by number")]
    Delete {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Record number (1-based)", value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
    #[command(
        about = "Change fields of a record",
        long_about = r#"Change fields of a record.

Fields not named keep their current value. Naming a new field adds it
(CSV files gain a new header column)."#
    )]
    Update {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Record number (1-based)", value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
        #[arg(required = true, help = "Fields as name=value")]
        fields: Vec<String>,
    },
    #[command(about = "Print the field names a new record would use")]
    Fields {
        #[arg(help = "File path", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

fn to_index(number: u64) -> Result<usize, Error> {
    usize::try_from(number.saturating_sub(1)).map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("record number {number} is too large"))
    })
}

fn file_json(path: &Path, format: Format) -> Value {
    json!({
        "path": path.display().to_string(),
        "format": format.extension(),
    })
}

fn record_entry_json(index: usize, record: &Record) -> Value {
    json!({
        "number": index + 1,
        "record": record.to_json(),
    })
}

fn add_file_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io if err.path().is_some() => {
            err.with_hint("Check that the file and its directory exist.")
        }
        ErrorKind::Permission => err.with_hint("Check file permissions for the current user."),
        ErrorKind::Format => {
            err.with_hint("Fix the file contents or point at a different file.")
        }
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected internal failure. Retry with RECSTORE_LOG=debug for details.")
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Validation => "invalid record".to_string(),
        ErrorKind::Format => "malformed file".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(index) = err.index() {
        inner.insert("number".to_string(), json!(index + 1));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(index) = err.index() {
        lines.push(format!(
            "{} {}",
            colorize_label("record:", use_color, AnsiColor::Yellow),
            index + 1
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `recstore --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "recstore") else {
        return "Try `recstore --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `recstore --help`.".to_string();
    }
    format!("Try `recstore {} --help`.", parts.join(" "))
}
