//! Device interface command handlers.

use serde_json::Value;
use tabled::Tabled;

use catalyst_core::QueryExecutor;

use crate::cli::{GlobalOpts, InterfacesArgs, InterfacesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Admin")]
    admin: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "VLAN")]
    vlan: String,
    #[tabled(rename = "MAC")]
    mac: String,
}

impl From<&Value> for InterfaceRow {
    fn from(i: &Value) -> Self {
        Self {
            port: util::text(i, "portName"),
            status: util::text(i, "status"),
            admin: util::text(i, "adminStatus"),
            speed: util::text(i, "speed"),
            vlan: util::text(i, "vlanId"),
            mac: util::text(i, "macAddress"),
        }
    }
}

pub async fn handle(
    executor: &QueryExecutor,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        InterfacesCommand::List { device_id, page } => {
            let result = executor
                .interfaces(&device_id, util::page_request(&page))
                .await?;
            let out = output::render_list(
                global.output,
                &result.items,
                |i| InterfaceRow::from(i),
                |i| util::text(i, "portName"),
            )?;
            output::print_output(&out, global.quiet);
            output::page_notice(&result, page.limit, global.quiet);
            Ok(())
        }
    }
}
