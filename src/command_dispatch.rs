//! Purpose: Hold top-level CLI command dispatch for `recstore`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command opens the store fresh; nothing is cached between calls.
//! Invariants: Out-of-range deletes report `{"deleted":0}` and exit with the NotFound code.

use clap::CommandFactory;
use recstore::api::{StoreHandle, create_store_file, open_store, parse_assignment};
use recstore::render::records_table;
use recstore::shell::{RustylineSource, Session};

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "recstore", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_json(json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Shell { file } => {
            let source = RustylineSource::new()?;
            let mut session = Session::new(source, io::stdout());
            if let Some(file) = file {
                if !file.exists() {
                    return Err(Error::new(ErrorKind::NotFound)
                        .with_message("file does not exist")
                        .with_path(&file)
                        .with_hint("Create it with `recstore create <file>` or pick one from the menu."));
                }
                session = session.with_handle(StoreHandle::open(file)?);
            }
            session.run()?;
            Ok(RunOutcome::ok())
        }
        Command::Create { file } => {
            let format = create_store_file(&file)?;
            emit_json(json!({ "created": file_json(&file, format) }));
            Ok(RunOutcome::ok())
        }
        Command::List { file, table } => {
            let store = open_store(&file)?;
            let records = store.load()?;
            if table {
                if records.is_empty() {
                    println!("No records.");
                } else {
                    println!("{}", records_table(&records));
                }
            } else {
                let mut value = file_json(store.path(), store.format());
                value["count"] = json!(records.len());
                value["records"] = Value::Array(records.iter().map(Record::to_json).collect());
                emit_json(value);
            }
            Ok(RunOutcome::ok())
        }
        Command::Get { file, number } => {
            let store = open_store(&file)?;
            let index = to_index(number)?;
            let record = store.get_record_at(index)?;
            emit_json(record_entry_json(index, &record));
            Ok(RunOutcome::ok())
        }
        Command::Add { file, fields } => {
            let store = open_store(&file)?;
            let record = parse_fields(&fields)?;
            store.check_new_record(&record)?;
            store.append(&record)?;
            let count = store.load()?.len();
            emit_json(json!({ "added": record_entry_json(count.saturating_sub(1), &record) }));
            Ok(RunOutcome::ok())
        }
        Command::Delete { file, number } => {
            let store = open_store(&file)?;
            let deleted = store.delete_at(to_index(number)?)?;
            emit_json(json!({ "deleted": deleted }));
            if deleted == 0 {
                return Ok(RunOutcome::with_code(to_exit_code(ErrorKind::NotFound)));
            }
            Ok(RunOutcome::ok())
        }
        Command::Update {
            file,
            number,
            fields,
        } => {
            let store = open_store(&file)?;
            let index = to_index(number)?;
            let changes = parse_fields(&fields)?;
            let mut record = store.get_record_at(index)?;
            for (field, value) in changes.iter() {
                record.insert(field, value);
            }
            store.replace_record_at(index, &record)?;
            emit_json(json!({ "updated": record_entry_json(index, &record) }));
            Ok(RunOutcome::ok())
        }
        Command::Fields { file } => {
            let store = open_store(&file)?;
            let fields = store.field_names()?;
            emit_json(json!({ "fields": fields }));
            Ok(RunOutcome::ok())
        }
    }
}

fn parse_fields(args: &[String]) -> Result<Record, Error> {
    let mut record = Record::new();
    for arg in args {
        let (field, value) = parse_assignment(arg)?;
        if record.contains(&field) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("field '{field}' given more than once")));
        }
        record.insert(field, value);
    }
    Ok(record)
}
