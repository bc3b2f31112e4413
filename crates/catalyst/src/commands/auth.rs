//! Authentication check.

use serde::Serialize;

use catalyst_core::QueryExecutor;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthStatus {
    username: String,
    state: String,
    expires_in_secs: u64,
}

pub async fn handle(
    executor: &QueryExecutor,
    args: AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Check => {
            let tokens = executor.tokens();
            let token = tokens.get_valid_token().await?;
            let status = AuthStatus {
                username: tokens.username().to_owned(),
                state: tokens.state().to_string(),
                expires_in_secs: token
                    .expires_at()
                    .saturating_duration_since(tokio::time::Instant::now())
                    .as_secs(),
            };
            let out = output::render_single(
                global.output,
                &status,
                |s| {
                    format!(
                        "Authenticated as {} (token valid for {}s)",
                        s.username, s.expires_in_secs
                    )
                },
                |s| s.state.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
