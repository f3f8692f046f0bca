//! `teamcost audit` - list manual-refresh audit records.

use crate::audit::{AuditEntry, AuditWriter};
use crate::cli::args::AuditArgs;
use crate::error::Result;
use crate::util::time::format_relative_time;

use super::AppContext;

pub async fn execute(ctx: &AppContext, args: &AuditArgs) -> Result<()> {
    let writer = AuditWriter::new(ctx.client.clone());
    let keys = writer.list_keys(&args.team).await?;
    if keys.is_empty() {
        println!("No manual refreshes recorded for {}.", args.team);
        return Ok(());
    }

    let now = ctx.client.clock().now();
    for key in keys {
        // Skip records that fail to decode; the trail is best-effort.
        let Some(entry) = ctx.client.get_json::<AuditEntry>(&key).await.ok().flatten() else {
            continue;
        };
        println!(
            "{}  {:<20} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.actor,
            format_relative_time(entry.timestamp, now)
        );
    }
    Ok(())
}
