//! Command-line entry point.
//!
//! # Usage
//! - `kanban_cli` reads one request `{"headers": {...}, "operation": ..., "arguments": {...}}`
//!   from stdin and prints the response envelope.
//! - `kanban_cli add-user <username> [id]` provisions an account and prints it.
//! - `kanban_cli version` prints the core version.
//!
//! Configuration comes from `KANBAN_*` environment variables.

use clap::{Parser, Subcommand};
use kanban_api::{ApiConfig, KanbanApi};
use kanban_core::db::open_db;
use kanban_core::{init_logging, Headers, SqliteKanbanRepository, UserId, UserRepository};
use log::info;
use serde_json::Value;
use std::io::Read;
use std::process::ExitCode;

/// Kanban board backend driver.
///
/// Without a subcommand, reads one JSON request from stdin and prints the
/// response envelope.
#[derive(Debug, Parser)]
#[command(name = "kanban_cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Provision a user account and print its id.
    AddUser {
        username: String,
        /// Fixed id instead of a generated one.
        id: Option<UserId>,
    },
    /// Print the core library version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let outcome = match cli.command {
        None => run_request(config),
        Some(Command::AddUser { username, id }) => add_user(&config, &username, id),
        Some(Command::Version) => {
            println!("kanban_core version={}", kanban_core::core_version());
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run_request(config: ApiConfig) -> Result<(), String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| format!("failed to read stdin: {err}"))?;

    let (headers, body) = split_request(&input);
    let api = KanbanApi::from_config(config);
    println!("{}", api.execute_json(&headers, &body));
    Ok(())
}

/// Separates the header map from the operation body.
///
/// Input that is not a JSON object is passed through untouched so the
/// facade answers it with a validation error.
fn split_request(input: &str) -> (Headers, String) {
    let mut value = match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => map,
        _ => return (Headers::new(), input.to_string()),
    };

    let headers = match value.remove("headers") {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(value) => Some((name, value)),
                _ => None,
            })
            .collect(),
        _ => Headers::new(),
    };
    (headers, Value::Object(value).to_string())
}

fn add_user(config: &ApiConfig, username: &str, id: Option<UserId>) -> Result<(), String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("failed to open store: {err}"))?;
    let repo = SqliteKanbanRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let user = match id {
        Some(id) => repo.create_user_with_id(id, username),
        None => repo.create_user(username),
    }
    .map_err(|err| format!("failed to create user: {err}"))?;

    info!("event=user_create module=cli status=ok user_id={}", user.id);
    println!("{}", user.id);
    Ok(())
}
