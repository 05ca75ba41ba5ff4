//! Configuration management for lp-to-jira
//!
//! Settings live in `~/.config/lp-to-jira/config.yaml`. Every secret can also
//! come from the environment, which wins over the file:
//!
//! - `JIRA_URL`, `JIRA_USER`, `JIRA_TOKEN`
//! - `LP_ACCESS_TOKEN`, `LP_ACCESS_SECRET`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "lp-to-jira";

/// Name of the configuration file inside the config directory
const CONFIG_FILE: &str = "config.yaml";

/// Jira field holding the epic link on Jira Cloud
pub const DEFAULT_EPIC_FIELD: &str = "customfield_10014";

pub const DEFAULT_LP_API_URL: &str = "https://api.launchpad.net/devel";

/// Issue search endpoint of the Jira instance
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchApi {
    /// `search/jql`, the only one left on Jira Cloud
    #[default]
    Jql,
    /// `search`, for Jira Data Center / Server
    Legacy,
}

impl SearchApi {
    /// Path of the endpoint below `rest/api/2/`
    pub fn path(self) -> &'static str {
        match self {
            SearchApi::Jql => "search/jql",
            SearchApi::Legacy => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JiraConfig {
    /// Base URL of the Jira instance (e.g., "https://company.atlassian.net")
    pub url: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    /// Field id used to link an issue to its epic
    pub epic_field: String,
    pub search_api: SearchApi,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            token: None,
            epic_field: DEFAULT_EPIC_FIELD.to_string(),
            search_api: SearchApi::default(),
        }
    }
}

impl JiraConfig {
    /// The configured URL without trailing slash, if any
    pub fn base_url(&self) -> Option<String> {
        self.url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchpadConfig {
    pub api_url: String,
    pub consumer_key: String,
    /// OAuth access token, only needed to write to Launchpad
    pub token: Option<String>,
    pub token_secret: Option<String>,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LP_API_URL.to_string(),
            consumer_key: PKG_NAME.to_string(),
            token: None,
            token_secret: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub jira: JiraConfig,
    pub launchpad: LaunchpadConfig,
    /// Launchpad user name -> Jira account id
    pub user_map: BTreeMap<String, String>,
    /// Launchpad task status -> Jira status
    pub status_map: BTreeMap<String, String>,
}

impl Config {
    /// Load the configuration from `dir`, then apply environment overrides
    ///
    /// A missing file gives the default configuration.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut config = Self::from_file(dir.as_ref().join(CONFIG_FILE))?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Read a configuration file, or the defaults if it does not exist
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Override settings with the values returned by `lookup` for the
    /// supported environment variables
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = var("JIRA_URL") {
            self.jira.url = Some(url);
        }
        if let Some(user) = var("JIRA_USER") {
            self.jira.user = Some(user);
        }
        if let Some(token) = var("JIRA_TOKEN") {
            self.jira.token = Some(token);
        }
        if let Some(token) = var("LP_ACCESS_TOKEN") {
            self.launchpad.token = Some(token);
        }
        if let Some(secret) = var("LP_ACCESS_SECRET") {
            self.launchpad.token_secret = Some(secret);
        }
    }
}

/// Get the configuration directory path
///
/// Returns the path to `~/.config/lp-to-jira/`, creating it if it doesn't exist.
pub fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("HOME environment variable not set".into()))?;
    let path = PathBuf::from(home).join(".config").join(PKG_NAME);

    ensure_config_dir_exists(&path)?;

    Ok(path)
}

/// Ensure the configuration directory exists, creating it if necessary
pub fn ensure_config_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
