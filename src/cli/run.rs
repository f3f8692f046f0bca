//! `teamcost run` - run the auto-refresh scheduler until interrupted.

use crate::error::Result;

use super::AppContext;

pub async fn execute(ctx: &AppContext) -> Result<()> {
    let teams = ctx.coordinator.tracked_teams();
    if teams.is_empty() {
        println!("No teams configured; nothing to schedule.");
        return Ok(());
    }
    println!(
        "Scheduling {} team(s) as {}. Press Ctrl-C to stop.",
        teams.len(),
        ctx.coordinator.identity().display_name
    );
    ctx.coordinator.start();

    tokio::signal::ctrl_c()
        .await
        .map_err(crate::error::TeamCostError::Io)?;

    // Waits for any in-flight refresh so its lease is released cleanly.
    ctx.coordinator.stop().await;
    println!("Stopped.");
    Ok(())
}
