use std::collections::BTreeMap;

use crate::config::{Config, DEFAULT_EPIC_FIELD};

/// Options controlling how a bug is copied into Jira
///
/// Every flag defaults to the conservative path: nothing beyond the issue
/// creation itself happens unless asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Print what would be done without writing to either tracker
    pub dry_run: bool,
    /// Extra label to put on the Jira issue
    pub label: Option<String>,
    /// Do not copy Launchpad bug tags into Jira labels
    pub no_lp_tag: bool,
    /// Comment on the Launchpad bug with a link to the Jira issue
    pub lp_link: bool,
    /// Keep the Jira fix versions in sync with the Launchpad milestone
    pub sync_milestone: bool,
    /// Launchpad user name -> Jira account id
    pub user_map: BTreeMap<String, String>,
    /// Launchpad task status -> Jira status
    pub status_map: BTreeMap<String, String>,
    /// Key of the epic the issue belongs to
    pub epic: Option<String>,
    /// Field id used for the epic link
    pub epic_field: String,
    /// Component to use instead of the bug's package
    pub component: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dry_run: false,
            label: None,
            no_lp_tag: false,
            lp_link: false,
            sync_milestone: false,
            user_map: BTreeMap::new(),
            status_map: BTreeMap::new(),
            epic: None,
            epic_field: DEFAULT_EPIC_FIELD.to_string(),
            component: None,
        }
    }
}

/// Keep only non blank values
fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Options {
    /// Creates new Options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the mappings and the epic field from the configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.user_map = config.user_map.clone();
        self.status_map = config.status_map.clone();
        self.epic_field = config.jira.epic_field.clone();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the extra label, blank labels are ignored
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = non_blank(label);
        self
    }

    pub fn with_no_lp_tag(mut self, no_lp_tag: bool) -> Self {
        self.no_lp_tag = no_lp_tag;
        self
    }

    pub fn with_lp_link(mut self, lp_link: bool) -> Self {
        self.lp_link = lp_link;
        self
    }

    pub fn with_sync_milestone(mut self, sync_milestone: bool) -> Self {
        self.sync_milestone = sync_milestone;
        self
    }

    /// Sets the epic key, blank keys are ignored
    pub fn with_epic(mut self, epic: impl Into<String>) -> Self {
        self.epic = non_blank(epic);
        self
    }

    /// Sets the component override, blank names are ignored
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = non_blank(component);
        self
    }

    pub fn with_user(mut self, lp_user: impl Into<String>, jira_account: impl Into<String>) -> Self {
        self.user_map.insert(lp_user.into(), jira_account.into());
        self
    }

    pub fn with_status(mut self, lp_status: impl Into<String>, jira_status: impl Into<String>) -> Self {
        self.status_map.insert(lp_status.into(), jira_status.into());
        self
    }
}
