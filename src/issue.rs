//! Mapping of Launchpad bugs to Jira issues
//!
//! An issue created from a bug carries `LP#<id>` in its summary, which is
//! what the existence check searches for on later runs.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::extract::{get_lp_bug_milestones, get_lp_bug_pkg};
use crate::jira::{
    browse_url, ComponentRef, IssueFields, IssueTypeRef, Jira, JiraIssue, ProjectRef, RemoteLink,
    UserRef,
};
use crate::launchpad::Bug;
use crate::options::Options;
use crate::ui;

/// Issue type of every issue created from a bug
pub const ISSUE_TYPE: &str = "Bug";

/// Marker identifying a bug in Jira summaries (e.g., "LP#123456")
pub fn bug_marker(bug: &Bug) -> String {
    format!("LP#{}", bug.id)
}

/// JQL finding the issues of `project` created from `bug`
pub fn bug_jql(bug: &Bug, project: &str) -> String {
    format!(
        "project = \"{}\" AND summary ~ \"\\\"{}\\\"\"",
        project,
        bug_marker(bug)
    )
}

/// Whether `issue` was created from `bug`, judging by its summary prefix
///
/// The summary search also hits issues merely mentioning the marker
/// (e.g., "LP#456 [systemd] regression of LP#123").
pub fn is_issue_of_bug(issue: &JiraIssue, bug: &Bug) -> bool {
    let marker = bug_marker(bug);
    match issue.fields.summary.as_deref() {
        Some(summary) => summary == marker || summary.starts_with(&format!("{} ", marker)),
        None => false,
    }
}

/// Find the Jira issue created from `bug`, if any
pub fn find_jira_issue(jira: &dyn Jira, bug: &Bug, project: &str) -> Result<Option<JiraIssue>> {
    let jql = bug_jql(bug, project);
    debug!(jql = %jql, "searching Jira");

    let issues = jira.search_issues(&jql)?;
    let found = issues.into_iter().find(|issue| {
        let matches = is_issue_of_bug(issue, bug);
        if !matches {
            debug!(key = %issue.key, "search hit belongs to another bug");
        }
        matches
    });
    Ok(found)
}

/// Check whether `bug` already has an issue in `project`
pub fn is_bug_in_jira(jira: &dyn Jira, bug: &Bug, project: &str) -> Result<bool> {
    Ok(find_jira_issue(jira, bug, project)?.is_some())
}

/// Labels of the issue: the custom label, then the milestones, then the bug tags
fn build_labels(bug: &Bug, opts: &Options) -> Option<Vec<String>> {
    let mut labels: Vec<String> = Vec::new();

    let candidates = opts
        .label
        .iter()
        .cloned()
        .chain(get_lp_bug_milestones(bug))
        .chain(bug.tags.iter().filter(|_| !opts.no_lp_tag).cloned());

    for label in candidates {
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }

    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

/// The Jira account of the first assignee present in the user map
fn build_assignee(bug: &Bug, opts: &Options) -> Option<UserRef> {
    bug.bug_tasks
        .iter()
        .filter_map(|task| task.assignee.as_ref())
        .find_map(|lp_user| opts.user_map.get(lp_user))
        .map(|account_id| UserRef {
            account_id: account_id.clone(),
        })
}

/// Build the fields of the Jira issue mirroring `bug`
///
/// # Arguments
/// * `bug` - The Launchpad bug
/// * `project` - The Jira project key
/// * `opts` - Label, epic and component settings
pub fn build_jira_issue(bug: &Bug, project: &str, opts: &Options) -> IssueFields {
    let package = get_lp_bug_pkg(bug);

    let summary = format!(
        "{} [{}] {}",
        bug_marker(bug),
        package.as_deref().unwrap_or("None"),
        bug.title
    );

    let component = opts.component.clone().or(package);

    let mut custom = BTreeMap::new();
    if let Some(epic) = &opts.epic {
        custom.insert(
            opts.epic_field.clone(),
            serde_json::Value::String(epic.clone()),
        );
    }

    IssueFields {
        project: ProjectRef {
            key: project.to_string(),
        },
        summary,
        description: bug.description.clone(),
        issuetype: IssueTypeRef {
            name: ISSUE_TYPE.to_string(),
        },
        components: vec![ComponentRef { name: component }],
        labels: build_labels(bug, opts),
        assignee: build_assignee(bug, opts),
        custom,
    }
}

/// The create-issue payload as pretty-printed JSON
pub fn render_payload(fields: &IssueFields) -> Result<String> {
    Ok(serde_json::to_string_pretty(fields)?)
}

/// Create the issue, link it back to the bug and print its URL
pub fn create_jira_issue(jira: &dyn Jira, fields: &IssueFields, bug: &Bug) -> Result<JiraIssue> {
    let issue = jira.create_issue(fields)?;

    if bug.web_link.is_empty() {
        warn!(bug_id = bug.id, "bug has no web link, not linking it");
    } else {
        let link = RemoteLink {
            url: bug.web_link.clone(),
            title: bug_marker(bug),
        };
        jira.add_simple_link(&issue, &link)?;
    }

    ui::print_created(bug, &browse_url(jira, &issue));

    Ok(issue)
}
