//! # lp-to-jira
//!
//! Copy Launchpad bugs into Jira issues and keep their fix versions in sync
//! with the Launchpad milestones.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod issue;
pub mod jira;
pub mod launchpad;
pub mod milestone;
pub mod options;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use app::{lp_to_jira_bug, Outcome};
pub use config::Config;
pub use error::{Error, Result};
pub use jira::{Jira, JiraClient};
pub use launchpad::{Bug, BugTask, Launchpad, LaunchpadClient, Milestone};
pub use options::Options;
