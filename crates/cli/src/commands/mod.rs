pub mod config;
pub mod migrate;
pub mod seed;

use std::future::Future;

use serde::Serialize;

use triage_core::config::{AppConfig, LoadOptions};
use triage_db::{DbPool, connect, migrations};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// A failed command step: error class, message, and process exit code.
pub(crate) struct CommandFailure {
    error_class: &'static str,
    message: String,
    exit_code: u8,
}

impl CommandFailure {
    pub(crate) fn new(
        error_class: &'static str,
        message: impl ToString,
        exit_code: u8,
    ) -> Self {
        Self { error_class, message: message.to_string(), exit_code }
    }
}

/// Shared plumbing for commands that operate on the database: load the
/// configuration, stand up a current-thread runtime, connect, apply
/// pending migrations, then hand the pool to the command body. The pool
/// is closed before the result is reported.
pub(crate) fn run_database_command<F, Fut>(command: &'static str, body: F) -> CommandResult
where
    F: FnOnce(DbPool) -> Fut,
    Fut: Future<Output = Result<String, CommandFailure>>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let outcome = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| CommandFailure::new("db_connectivity", error, 4))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error, 5))?;

        let result = body(pool.clone()).await;
        pool.close().await;
        result
    });

    match outcome {
        Ok(message) => CommandResult::success(command, message),
        Err(failure) => {
            CommandResult::failure(command, failure.error_class, failure.message, failure.exit_code)
        }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
