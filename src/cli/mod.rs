//! CLI commands.

pub mod args;
pub mod audit;
pub mod refresh;
pub mod run;
pub mod status;

use std::sync::Arc;

pub use args::{Cli, Commands};

use crate::config::{ResolvedConfig, Settings, config_file_path};
use crate::core::clock::system_clock;
use crate::core::identity::ClientIdentity;
use crate::error::{Result, TeamCostError};
use crate::fetch::{CostFetcher, JsonFileFetcher};
use crate::scheduler::{RefreshCoordinator, SchedulerConfig};
use crate::store::fs::FsStore;
use crate::store::CacheClient;

/// Everything a command needs, wired from config.
pub struct AppContext {
    pub config: ResolvedConfig,
    pub client: CacheClient,
    pub coordinator: RefreshCoordinator,
}

impl AppContext {
    /// Resolve config, open the store, and build a coordinator tracking the
    /// configured teams.
    pub fn build(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(config_file_path);
        let settings = Settings::load(&config_path)?;
        let config = ResolvedConfig::resolve(
            settings,
            cli.store_root.clone(),
            cli.data_file.clone(),
            cli.name.clone(),
        )?;

        let store = Arc::new(FsStore::open(&config.store_root)?);
        let client = CacheClient::new(store, system_clock());
        let fetcher: Arc<dyn CostFetcher> = match &config.data_file {
            Some(path) => Arc::new(JsonFileFetcher::new(path)),
            None => {
                return Err(TeamCostError::Config(
                    "no data file configured; set dataFile in config or pass --data-file"
                        .to_string(),
                ));
            }
        };
        let identity = ClientIdentity::with_display_name(config.display_name.clone());
        let coordinator =
            RefreshCoordinator::new(client.clone(), fetcher, identity, SchedulerConfig::default());
        for team in &config.teams {
            coordinator.track_team(team.clone());
        }
        Ok(Self {
            config,
            client,
            coordinator,
        })
    }
}
