//! Client command handlers.

use serde_json::{Value, json};
use tabled::Tabled;

use catalyst_core::{QueryExecutor, RawFilters};

use crate::cli::{ClientsArgs, ClientsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Site")]
    site: String,
}

impl From<&Value> for ClientRow {
    fn from(c: &Value) -> Self {
        Self {
            mac: util::text(c, "macAddress"),
            ip: util::first_text(c, &["ipv4Address", "hostIpV4"]),
            user: util::first_text(c, &["username", "userId"]),
            kind: util::first_text(c, &["type", "hostType"]),
            ssid: util::text(c, "ssid"),
            band: util::text(c, "band"),
            os: util::first_text(c, &["osType", "hostOs"]),
            site: util::first_text(c, &["siteHierarchy", "location"]),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    executor: &QueryExecutor,
    args: ClientsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ClientsCommand::List(list) => {
            let mut filters = util::parse_filters(&list.filter)?;
            util::apply_time_args(&mut filters, &list.time);
            let result = executor
                .clients(filters, util::page_request(&list.page))
                .await?;
            let out = output::render_list(
                global.output,
                &result.items,
                |c| ClientRow::from(c),
                |c| util::text(c, "macAddress"),
            )?;
            output::print_output(&out, global.quiet);
            output::page_notice(&result, list.page.limit, global.quiet);
            Ok(())
        }

        ClientsCommand::Get { mac, time } => {
            let mut filters = RawFilters::new();
            util::apply_time_args(&mut filters, &time);
            let detail = executor
                .client(&mac, filters)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "client".into(),
                    identifier: mac.clone(),
                    list_command: "clients list".into(),
                })?;
            let out = output::render_single(global.output, &detail, util::detail_lines, |c| {
                util::text(c, "macAddress")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClientsCommand::Count { filter, time } => {
            let mut filters = util::parse_filters(&filter)?;
            util::apply_time_args(&mut filters, &time);
            let count = executor.client_count(filters).await?;
            let out = output::render_single(
                global.output,
                &json!({ "count": count }),
                |_| count.to_string(),
                |_| count.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
