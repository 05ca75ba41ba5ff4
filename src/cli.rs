use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::options::Options;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// Configuration directory (defaults to ~/.config/lp-to-jira)
    #[clap(long, global = true, env = "LP_TO_JIRA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show what would be done without writing anything
    #[clap(short, long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Add this label to the Jira issue
    #[clap(short, long, global = true)]
    pub label: Option<String>,

    /// Do not copy the Launchpad bug tags into Jira labels
    #[clap(long, global = true, default_value_t = false)]
    pub no_lp_tag: bool,

    /// Comment on the Launchpad bug with a link to the Jira issue
    #[clap(long, global = true, default_value_t = false)]
    pub lp_link: bool,

    /// Add the Launchpad milestone to the Jira fix versions
    #[clap(short = 'm', long, global = true, default_value_t = false)]
    pub sync_milestone: bool,

    /// Key of the Jira epic to attach the issue to
    #[clap(short, long, global = true)]
    pub epic: Option<String>,

    /// Jira component to use instead of the bug's package
    #[clap(short, long, global = true)]
    pub component: Option<String>,

    /// Log API calls to stderr
    #[clap(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Copy a single Launchpad bug into Jira
    Bug {
        /// Launchpad bug number
        bug_id: u64,
        /// Jira project key
        project: String,
    },
    /// Copy the open bugs of a Launchpad project into Jira
    Project {
        /// Launchpad project name
        lp_project: String,
        /// Jira project key
        project: String,
        /// Only bugs created in the last DAYS days
        #[clap(long)]
        days: Option<u32>,
        /// Do not ask for confirmation
        #[clap(short, long, default_value_t = false)]
        yes: bool,
    },
}

impl Args {
    /// Options for the run, on top of the configuration
    pub fn options(&self, config: &Config) -> Options {
        let mut opts = Options::new()
            .with_config(config)
            .with_dry_run(self.dry_run)
            .with_no_lp_tag(self.no_lp_tag)
            .with_lp_link(self.lp_link)
            .with_sync_milestone(self.sync_milestone);

        if let Some(label) = &self.label {
            opts = opts.with_label(label.as_str());
        }
        if let Some(epic) = &self.epic {
            opts = opts.with_epic(epic.as_str());
        }
        if let Some(component) = &self.component {
            opts = opts.with_component(component.as_str());
        }
        opts
    }
}
