//! Network device command handlers.

use serde_json::Value;
use tabled::Tabled;

use catalyst_core::QueryExecutor;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Management IP")]
    ip: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Reachability")]
    reachability: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&Value> for DeviceRow {
    fn from(d: &Value) -> Self {
        Self {
            hostname: util::text(d, "hostname"),
            ip: util::text(d, "managementIpAddress"),
            platform: util::text(d, "platformId"),
            role: util::text(d, "role"),
            version: util::text(d, "softwareVersion"),
            reachability: util::text(d, "reachabilityStatus"),
            id: util::text(d, "id"),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    executor: &QueryExecutor,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list) => {
            let filters = util::parse_filters(&list.filter)?;
            let result = executor
                .devices(filters, util::page_request(&list.page))
                .await?;
            let out = output::render_list(
                global.output,
                &result.items,
                |d| DeviceRow::from(d),
                |d| util::text(d, "id"),
            )?;
            output::print_output(&out, global.quiet);
            output::page_notice(&result, list.page.limit, global.quiet);
            Ok(())
        }
    }
}
