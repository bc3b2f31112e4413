//! Site command handlers.

use serde_json::Value;
use tabled::Tabled;

use catalyst_core::QueryExecutor;

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hierarchy")]
    hierarchy: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&Value> for SiteRow {
    fn from(s: &Value) -> Self {
        Self {
            name: util::text(s, "name"),
            hierarchy: util::first_text(s, &["siteNameHierarchy", "nameHierarchy"]),
            id: util::text(s, "id"),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    executor: &QueryExecutor,
    args: SitesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List(list) => {
            let filters = util::parse_filters(&list.filter)?;
            let result = executor
                .sites(filters, util::page_request(&list.page))
                .await?;
            let out = output::render_list(
                global.output,
                &result.items,
                |s| SiteRow::from(s),
                |s| util::text(s, "id"),
            )?;
            output::print_output(&out, global.quiet);
            output::page_notice(&result, list.page.limit, global.quiet);
            Ok(())
        }
    }
}
