use lazy_static::lazy_static;
use regex::Regex;

use crate::launchpad::Bug;

/// Distribution whose source packages map to Jira components
pub const DISTRIBUTION: &str = "Ubuntu";

lazy_static! {
    // "<package> (<distro>[ <series>])", e.g. "systemd (Ubuntu Focal)"
    static ref TARGET_PATTERN: Regex =
        Regex::new(r"^(?P<package>[a-z0-9][a-z0-9+.\-]*) \((?P<distro>\w+)(?: (?P<series>\w+))?\)$")
            .unwrap();
}

/// Extract the package from a bug task target name
/// (e.g., "systemd (Ubuntu Focal)" -> "systemd")
///
/// Returns `None` for malformed names and for other distributions.
pub fn package_from_target(target_name: &str, distribution: &str) -> Option<String> {
    let captures = TARGET_PATTERN.captures(target_name.trim())?;
    if &captures["distro"] != distribution {
        return None;
    }
    Some(captures["package"].to_string())
}

/// Get the Ubuntu package a bug is filed against
///
/// The first task with a valid Ubuntu target wins.
pub fn get_lp_bug_pkg(bug: &Bug) -> Option<String> {
    bug.bug_tasks
        .iter()
        .find_map(|task| package_from_target(&task.bug_target_name, DISTRIBUTION))
}

/// Get the name of the first milestone set on any of the bug's tasks
pub fn get_lp_bug_milestone(bug: &Bug) -> Option<String> {
    bug.bug_tasks
        .iter()
        .find_map(|task| task.milestone.as_ref())
        .map(|milestone| milestone.name.clone())
}

/// Get every distinct milestone name set on the bug's tasks, in task order
pub fn get_lp_bug_milestones(bug: &Bug) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for milestone in bug.bug_tasks.iter().filter_map(|task| task.milestone.as_ref()) {
        if !names.contains(&milestone.name) {
            names.push(milestone.name.clone());
        }
    }
    names
}
