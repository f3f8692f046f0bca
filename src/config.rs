//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux/macOS: `~/.config/teamcost/config.toml`
//! - Windows: `%APPDATA%/teamcost/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `TEAMCOST_CONFIG`: Override config file path
//! - `TEAMCOST_STORE_ROOT`: Filesystem object-store root directory
//! - `TEAMCOST_DATA_FILE`: JSON file the file-backed fetcher reads
//! - `TEAMCOST_DISPLAY_NAME`: Human-readable client name shown to teammates

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TeamCostError};
use crate::scheduler::TeamProfile;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override the config file path.
pub const ENV_CONFIG: &str = "TEAMCOST_CONFIG";
/// Environment variable for the store root directory.
pub const ENV_STORE_ROOT: &str = "TEAMCOST_STORE_ROOT";
/// Environment variable for the fetcher's data file.
pub const ENV_DATA_FILE: &str = "TEAMCOST_DATA_FILE";
/// Environment variable for the client display name.
pub const ENV_DISPLAY_NAME: &str = "TEAMCOST_DISPLAY_NAME";

// =============================================================================
// Settings
// =============================================================================

/// On-disk configuration, all fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Human-readable client name, shown as `refreshedBy` to teammates.
    pub display_name: Option<String>,
    /// Root directory of the filesystem object store.
    pub store_root: Option<PathBuf>,
    /// JSON file the file-backed fetcher reads cost reports from.
    pub data_file: Option<PathBuf>,
    /// Teams to track.
    #[serde(default)]
    pub teams: Vec<TeamProfile>,
}

impl Settings {
    /// Load settings from `path`, or defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| TeamCostError::Config(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the default location, honoring `TEAMCOST_CONFIG`.
    pub fn load_default() -> Result<Self> {
        Self::load(&config_file_path())
    }

    fn validate(&self) -> Result<()> {
        for team in &self.teams {
            if team.team_id.is_empty() || team.account_id.is_empty() {
                return Err(TeamCostError::Config(
                    "team entries need both teamId and accountId".to_string(),
                ));
            }
        }
        let mut ids: Vec<&str> = self.teams.iter().map(|t| t.team_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.teams.len() {
            return Err(TeamCostError::Config(
                "duplicate teamId in config".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fully resolved runtime configuration after merging CLI, env, and file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub display_name: String,
    pub store_root: PathBuf,
    pub data_file: Option<PathBuf>,
    pub teams: Vec<TeamProfile>,
}

impl ResolvedConfig {
    /// Resolve final configuration. CLI overrides come in as `Option`s.
    pub fn resolve(
        settings: Settings,
        cli_store_root: Option<PathBuf>,
        cli_data_file: Option<PathBuf>,
        cli_display_name: Option<String>,
    ) -> Result<Self> {
        let display_name = cli_display_name
            .or_else(|| std::env::var(ENV_DISPLAY_NAME).ok())
            .or(settings.display_name)
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "anonymous".to_string());

        let store_root = cli_store_root
            .or_else(|| std::env::var(ENV_STORE_ROOT).ok().map(PathBuf::from))
            .or(settings.store_root)
            .unwrap_or_else(default_store_root);

        let data_file = cli_data_file
            .or_else(|| std::env::var(ENV_DATA_FILE).ok().map(PathBuf::from))
            .or(settings.data_file);

        Ok(Self {
            display_name,
            store_root,
            data_file,
            teams: settings.teams,
        })
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Path of the config file, honoring `TEAMCOST_CONFIG`.
#[must_use]
pub fn config_file_path() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "teamcost").map_or_else(
        || PathBuf::from("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default store root when nothing is configured: a shared directory under
/// the platform data dir. Real deployments point this at a mounted bucket.
#[must_use]
pub fn default_store_root() -> PathBuf {
    ProjectDirs::from("", "", "teamcost").map_or_else(
        || PathBuf::from("store"),
        |dirs| dirs.data_dir().join("store"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(settings.teams.is_empty());
        assert!(settings.display_name.is_none());
    }

    #[test]
    fn parses_full_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
displayName = "alice"
storeRoot = "/srv/teamcost"

[[teams]]
teamId = "platform"
accountId = "123456789012"
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.display_name.as_deref(), Some("alice"));
        assert_eq!(settings.teams.len(), 1);
        assert_eq!(settings.teams[0].account_id, "123456789012");
    }

    #[test]
    fn duplicate_team_ids_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[teams]]
teamId = "platform"
accountId = "a"

[[teams]]
teamId = "platform"
accountId = "b"
"#,
        )
        .unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, TeamCostError::Config(_)));
    }

    #[test]
    fn cli_overrides_win() {
        let settings = Settings {
            display_name: Some("from-file".into()),
            store_root: Some(PathBuf::from("/from/file")),
            data_file: None,
            teams: vec![],
        };
        let resolved = ResolvedConfig::resolve(
            settings,
            Some(PathBuf::from("/from/cli")),
            None,
            Some("from-cli".into()),
        )
        .unwrap();
        assert_eq!(resolved.display_name, "from-cli");
        assert_eq!(resolved.store_root, PathBuf::from("/from/cli"));
    }
}
