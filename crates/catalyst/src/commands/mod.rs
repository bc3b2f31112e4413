//! Command dispatch: one module per resource.

pub mod auth;
pub mod clients;
pub mod config_cmd;
pub mod devices;
pub mod interfaces;
pub mod sites;
pub mod util;

use catalyst_core::QueryExecutor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a controller-backed command to its handler.
pub async fn dispatch(
    cmd: Command,
    executor: &QueryExecutor,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(executor, args, global).await,
        Command::Sites(args) => sites::handle(executor, args, global).await,
        Command::Interfaces(args) => interfaces::handle(executor, args, global).await,
        Command::Clients(args) => clients::handle(executor, args, global).await,
        Command::Auth(args) => auth::handle(executor, args, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before dispatch")
        }
    }
}
