use crate::commands::{CommandResult, run_database_command};

pub fn run() -> CommandResult {
    // Migrations are applied by the shared plumbing; nothing left to do
    // with the pool.
    run_database_command("migrate", |_pool| async move {
        Ok("applied pending migrations".to_string())
    })
}
