//! `grade-ledger` command line
//!
//! Prints a JSON document on stdout. Failures print a JSON error body on
//! stderr and exit with 2 (validation), 3 (not found) or 4 (storage).

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use grade_ledger::{
    BatchImport, CsvGradeLedger, DeleteRequest, ErrorKind, GradeStore, LedgerConfig, LedgerError,
    NumericInput, UpsertRequest,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn grade_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("date")
            .long("date")
            .required(true)
            .help("Record date as YYYY/M/D"),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .required(true)
            .help("Grade type: feed, product or tailing"),
    )
}

fn cli() -> Command {
    Command::new("grade-ledger")
        .version(grade_ledger::VERSION)
        .about("Daily ore-grade ledger over a flat table file")
        .subcommand_required(true)
        .arg(
            Arg::new("file")
                .long("file")
                .global(true)
                .env("GRADE_LEDGER_FILE")
                .default_value(grade_ledger::config::DEFAULT_TABLE_FILE)
                .value_parser(value_parser!(PathBuf))
                .help("Grade table file"),
        )
        .arg(
            Arg::new("backup-dir")
                .long("backup-dir")
                .global(true)
                .env("GRADE_LEDGER_BACKUP_DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Backup directory (defaults to backups/ next to the table)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            grade_args(Command::new("upsert").about("Record a grade, creating the row if needed"))
                .arg(Arg::new("value").long("value").required(true).help("Grade percentage")),
        )
        .subcommand(
            grade_args(Command::new("update").about("Change a grade on an existing row"))
                .arg(Arg::new("value").long("value").required(true).help("Grade percentage")),
        )
        .subcommand(
            grade_args(Command::new("delete").about("Clear a grade, removing the row once empty"))
                .arg(
                    Arg::new("recorded-by")
                        .long("recorded-by")
                        .required(true)
                        .help("Operator performing the delete"),
                ),
        )
        .subcommand(Command::new("list").about("Print all rows"))
        .subcommand(Command::new("stats").about("Count recorded grades"))
        .subcommand(Command::new("export").about("Print every positive grade as an entry"))
        .subcommand(Command::new("prune").about("Back up, then drop rows without positive grades"))
        .subcommand(Command::new("backup").about("Copy the table into the backup directory"))
        .subcommand(
            Command::new("import")
                .about("Apply a batch upload document")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with {\"grades\": [...], \"clear_existing\": bool}"),
                ),
        )
}

fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn ledger_from(matches: &ArgMatches) -> anyhow::Result<CsvGradeLedger> {
    let path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .context("no grade table file configured")?;

    let mut config = LedgerConfig::new(path);
    if let Some(dir) = matches.get_one::<PathBuf>("backup-dir") {
        config = config.with_backup_dir(dir);
    }
    Ok(CsvGradeLedger::new(config))
}

fn arg(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}

fn upsert_request(args: &ArgMatches) -> UpsertRequest {
    UpsertRequest {
        date: arg(args, "date"),
        grade_type: arg(args, "type"),
        grade_value: arg(args, "value").map(NumericInput::Text),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<Value> {
    let ledger = ledger_from(matches)?;

    let output = match matches.subcommand() {
        Some(("upsert", args)) => {
            let valid = upsert_request(args).validate().map_err(LedgerError::from)?;
            let outcome = ledger.upsert(valid.date, valid.grade_type, &valid.value)?;
            json!({ "success": true, "message": "grade recorded", "outcome": outcome })
        }
        Some(("update", args)) => {
            let valid = upsert_request(args).validate().map_err(LedgerError::from)?;
            ledger.update(valid.date, valid.grade_type, &valid.value)?;
            json!({ "success": true, "message": "grade updated" })
        }
        Some(("delete", args)) => {
            let request = DeleteRequest {
                date: arg(args, "date"),
                grade_type: arg(args, "type"),
                recorded_by: arg(args, "recorded-by"),
            };
            let valid = request.validate().map_err(LedgerError::from)?;
            let outcome = ledger.delete(valid.date, valid.grade_type, &valid.actor)?;
            json!({ "success": true, "message": "grade deleted", "outcome": outcome })
        }
        Some(("list", _)) => {
            let records = ledger.load()?;
            json!({ "success": true, "count": records.len(), "records": records })
        }
        Some(("stats", _)) => json!({ "success": true, "stats": ledger.stats()? }),
        Some(("export", _)) => {
            let data = ledger.export()?;
            json!({ "success": true, "count": data.len(), "data": data })
        }
        Some(("prune", _)) => json!({ "success": true, "report": ledger.prune_empty()? }),
        Some(("backup", _)) => json!({ "success": true, "backup": ledger.backup()? }),
        Some(("import", args)) => {
            let input = args
                .get_one::<PathBuf>("input")
                .context("no input document given")?;
            let text = std::fs::read_to_string(input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let batch: BatchImport = serde_json::from_str(&text)
                .with_context(|| format!("invalid batch document {}", input.display()))?;
            let report = ledger.import_batch(&batch)?;
            json!({
                "success": true,
                "uploaded_count": report.uploaded_count,
                "errors": report.errors,
            })
        }
        _ => anyhow::bail!("unknown command"),
    };

    Ok(output)
}

fn failure(err: &anyhow::Error) -> (Value, i32) {
    let Some(ledger_err) = err.downcast_ref::<LedgerError>() else {
        return (
            json!({ "success": false, "error": "usage_error", "message": format!("{err:#}") }),
            1,
        );
    };

    let kind = ledger_err.kind();
    let mut body = json!({
        "success": false,
        "error": kind.as_str(),
        "message": ledger_err.to_string(),
    });
    if let LedgerError::Storage(storage) = ledger_err {
        body["details"] = json!({
            "path": storage.path,
            "permissions": storage.permissions,
        });
    }

    let code = match kind {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Storage => 4,
    };
    (body, code)
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(output) => println!("{output:#}"),
        Err(err) => {
            tracing::error!("Command failed: {:#}", err);
            let (body, code) = failure(&err);
            eprintln!("{body:#}");
            std::process::exit(code);
        }
    }
}
