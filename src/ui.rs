use colored::Colorize;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{set_global_render_config, Confirm};

use crate::error::Error;
use crate::launchpad::Bug;

/// Initialize the global render configuration for inquire prompts
pub fn init_render_config() {
    let mut style = RenderConfig::default_colored();
    style.prompt_prefix = Styled::new(">").with_fg(Color::LightGreen);
    set_global_render_config(style);
}

/// Ask before copying a batch of bugs
pub fn confirm_sync(lp_project: &str, project: &str, count: usize) -> Result<bool, Error> {
    Confirm::new(&format!(
        "Copy {} bugs from {} into {}?",
        count, lp_project, project
    ))
    .with_default(false)
    .prompt()
    .map_err(Error::from)
}

/// Report a newly created issue
pub fn print_created(bug: &Bug, url: &str) {
    println!(
        "{} LP#{} created: {}",
        "+".bright_green(),
        bug.id,
        url.bright_cyan()
    );
}

/// Report a bug already tracked in Jira
pub fn print_existing(bug: &Bug, url: &str) {
    println!(
        "{} LP#{} already in Jira: {}",
        ">".bright_green(),
        bug.id,
        url.bright_cyan()
    );
}

/// Report a fix version added to an issue
pub fn print_fix_version(key: &str, version: &str) {
    println!(
        "{} {} fix version: {}",
        "+".bright_green(),
        key,
        version.bright_cyan()
    );
}

/// Report a write skipped because of dry-run
pub fn print_dry_run(action: &str) {
    println!("{} {}", "[dry-run]".yellow(), action);
}

/// Report a listed bug that Launchpad no longer returns
pub fn print_skipped(bug_id: u64) {
    println!("{} LP#{} not found, skipped", "-".yellow(), bug_id);
}

/// Report a bug that could not be processed
pub fn print_failed(bug_id: u64, reason: &str) {
    println!("{} LP#{} failed: {}", "x".red(), bug_id, reason);
}
