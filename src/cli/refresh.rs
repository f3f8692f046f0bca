//! `teamcost refresh` - request a manual refresh.

use crate::cli::args::RefreshArgs;
use crate::error::Result;
use crate::scheduler::ManualRefreshOutcome;

use super::AppContext;

pub async fn execute(ctx: &AppContext, args: &RefreshArgs) -> Result<()> {
    match ctx.coordinator.request_manual_refresh(&args.team).await? {
        ManualRefreshOutcome::Accepted { refreshed: true } => {
            let state = ctx.coordinator.state(&args.team).await?;
            println!("Refreshed {} (v{}).", args.team, state.version);
        }
        ManualRefreshOutcome::Accepted { refreshed: false } => {
            println!(
                "Another client is refreshing {} right now; the shared cache will update shortly.",
                args.team
            );
        }
        ManualRefreshOutcome::Rejected { seconds_remaining } => {
            println!(
                "Refresh for {} is cooling down; try again in {seconds_remaining}s.",
                args.team
            );
        }
    }
    Ok(())
}
