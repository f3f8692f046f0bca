//! `teamcost status` - show cached cost state per team.

use crate::cli::args::StatusArgs;
use crate::error::Result;
use crate::util::time::{format_countdown, format_relative_time};

use super::AppContext;

pub async fn execute(ctx: &AppContext, args: &StatusArgs) -> Result<()> {
    let teams = match &args.team {
        Some(team) => vec![team.clone()],
        None => ctx.coordinator.tracked_teams(),
    };
    if teams.is_empty() {
        println!("No teams configured. Add [[teams]] entries to the config file.");
        return Ok(());
    }

    let now = ctx.client.clock().now();
    for team_id in teams {
        let state = ctx.coordinator.state(&team_id).await?;
        let refreshed = state.last_refreshed_at.map_or_else(
            || "never refreshed".to_string(),
            |t| {
                format!(
                    "refreshed {} by {}",
                    format_relative_time(t, now),
                    state.refreshed_by.as_deref().unwrap_or("unknown")
                )
            },
        );
        let manual = if state.is_manual_refresh_enabled(now) {
            "manual: available".to_string()
        } else {
            format!(
                "manual: {}",
                format_countdown(state.next_manual_eligible_at, now)
            )
        };
        println!(
            "{} {:<16} {:<11} {:<40} v{:<5} {}",
            state.freshness.glyph(),
            state.team_id,
            state.freshness.label(),
            refreshed,
            state.version,
            manual
        );
        if let Some(error) = &state.last_error {
            println!("  last error: {error}");
        }
    }
    Ok(())
}
