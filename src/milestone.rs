//! Launchpad milestone to Jira fix version synchronization

use tracing::{debug, info};

use crate::error::Result;
use crate::extract::get_lp_bug_milestone;
use crate::jira::{IssueUpdate, Jira, JiraIssue, Version, VersionRef};
use crate::launchpad::Bug;
use crate::ui;

/// Make sure `project` has a version called `name`
///
/// # Returns
/// The existing or created version. `None` when no name is given, or when
/// the version is missing and `dry_run` prevents creating it.
///
/// Only a not-found lookup leads to creation, any other error is returned.
pub fn ensure_jira_version(
    jira: &dyn Jira,
    project: &str,
    name: Option<&str>,
    dry_run: bool,
) -> Result<Option<Version>> {
    let name = match name {
        Some(name) => name,
        None => return Ok(None),
    };

    match jira.get_project_version_by_name(project, name) {
        Ok(version) => {
            debug!(project, name, "version exists");
            Ok(Some(version))
        }
        Err(err) if err.is_not_found() => {
            if dry_run {
                ui::print_dry_run(&format!("create version {} in {}", name, project));
                return Ok(None);
            }
            info!(project, name, "version missing, creating it");
            Ok(Some(jira.create_version(project, name)?))
        }
        Err(err) => Err(err),
    }
}

/// Add the bug's milestone to the issue fix versions
///
/// Existing fix versions are kept, the milestone is appended after them.
/// Nothing happens when the bug has no milestone or the issue already
/// lists it.
///
/// # Returns
/// Whether the issue was updated
pub fn sync_milestone_to_jira(
    jira: &dyn Jira,
    bug: &Bug,
    issue: &JiraIssue,
    project: &str,
    dry_run: bool,
) -> Result<bool> {
    let milestone = match get_lp_bug_milestone(bug) {
        Some(milestone) => milestone,
        None => {
            debug!(bug_id = bug.id, "bug has no milestone");
            return Ok(false);
        }
    };

    let version = match ensure_jira_version(jira, project, Some(&milestone), dry_run)? {
        Some(version) => version,
        None => return Ok(false),
    };

    if issue.has_fix_version(&version.name) {
        debug!(key = %issue.key, version = %version.name, "fix version already set");
        return Ok(false);
    }

    let mut fix_versions: Vec<VersionRef> = issue
        .fields
        .fix_versions
        .iter()
        .map(|v| VersionRef {
            name: v.name.clone(),
        })
        .collect();
    fix_versions.push(VersionRef {
        name: version.name.clone(),
    });

    if dry_run {
        ui::print_dry_run(&format!(
            "add fix version {} to {}",
            version.name, issue.key
        ));
        return Ok(false);
    }

    jira.update_issue(issue, &IssueUpdate { fix_versions })?;
    ui::print_fix_version(&issue.key, &version.name);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::launchpad::BugTask;
    use crate::testing::{bug_with_milestones, issue_with_versions, FakeJira};

    #[test]
    fn test_ensure_jira_version_existing() {
        let jira = FakeJira::new().with_version("TEST", "ubuntu-22.04");

        let version = ensure_jira_version(&jira, "TEST", Some("ubuntu-22.04"), false)
            .unwrap()
            .unwrap();

        assert_eq!(version.name, "ubuntu-22.04");
        assert_eq!(
            *jira.version_lookups.borrow(),
            vec![("TEST".to_string(), "ubuntu-22.04".to_string())]
        );
        assert!(jira.versions_created.borrow().is_empty());
    }

    #[test]
    fn test_ensure_jira_version_create_new() {
        let jira = FakeJira::new();

        let version = ensure_jira_version(&jira, "TEST", Some("ubuntu-22.04"), false)
            .unwrap()
            .unwrap();

        assert_eq!(version.name, "ubuntu-22.04");
        assert_eq!(version.project.as_deref(), Some("TEST"));
        assert_eq!(
            *jira.versions_created.borrow(),
            vec![("TEST".to_string(), "ubuntu-22.04".to_string())]
        );
    }

    #[test]
    fn test_ensure_jira_version_dry_run() {
        let jira = FakeJira::new();

        let result = ensure_jira_version(&jira, "TEST", Some("ubuntu-22.04"), true).unwrap();

        assert_eq!(result, None);
        assert_eq!(jira.version_lookups.borrow().len(), 1);
        assert!(jira.versions_created.borrow().is_empty());
    }

    #[test]
    fn test_ensure_jira_version_none_name() {
        let jira = FakeJira::new();

        let result = ensure_jira_version(&jira, "TEST", None, false).unwrap();

        assert_eq!(result, None);
        assert!(jira.version_lookups.borrow().is_empty());
    }

    #[test]
    fn test_ensure_jira_version_lookup_error_propagates() {
        let jira = FakeJira {
            lookup_fails: true,
            ..FakeJira::new()
        };

        let err = ensure_jira_version(&jira, "TEST", Some("ubuntu-22.04"), false).unwrap_err();

        assert!(matches!(err, Error::Jira { status: 503, .. }));
        assert!(jira.versions_created.borrow().is_empty());
    }

    #[test]
    fn test_sync_milestone_to_jira_no_milestone() {
        let jira = FakeJira::new();
        let bug = Bug {
            bug_tasks: vec![BugTask::default()],
            ..Bug::default()
        };
        let issue = issue_with_versions("TEST-123", &[]);

        assert!(!sync_milestone_to_jira(&jira, &bug, &issue, "TEST", false).unwrap());
        assert!(jira.version_lookups.borrow().is_empty());
        assert!(jira.updates.borrow().is_empty());
    }

    #[test]
    fn test_sync_milestone_to_jira_with_milestone() {
        let jira = FakeJira::new().with_version("TEST", "ubuntu-22.04");
        let bug = bug_with_milestones(1, &["ubuntu-22.04"]);
        let issue = issue_with_versions("TEST-123", &[]);

        assert!(sync_milestone_to_jira(&jira, &bug, &issue, "TEST", false).unwrap());

        let updates = jira.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "TEST-123");
        assert_eq!(
            updates[0].1.fix_versions,
            vec![VersionRef {
                name: "ubuntu-22.04".into()
            }]
        );
    }

    #[test]
    fn test_sync_milestone_to_jira_keeps_existing_versions() {
        let jira = FakeJira::new().with_version("TEST", "ubuntu-22.04");
        let bug = bug_with_milestones(1, &["ubuntu-22.04"]);
        let issue = issue_with_versions("TEST-123", &["1.0", "1.1"]);

        assert!(sync_milestone_to_jira(&jira, &bug, &issue, "TEST", false).unwrap());

        let updates = jira.updates.borrow();
        assert_eq!(updates.len(), 1);
        let names: Vec<&str> = updates[0]
            .1
            .fix_versions
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["1.0", "1.1", "ubuntu-22.04"]);
    }

    #[test]
    fn test_sync_milestone_to_jira_already_present() {
        let jira = FakeJira::new().with_version("TEST", "ubuntu-22.04");
        let bug = bug_with_milestones(1, &["ubuntu-22.04"]);
        let issue = issue_with_versions("TEST-123", &["1.0", "ubuntu-22.04"]);

        assert!(!sync_milestone_to_jira(&jira, &bug, &issue, "TEST", false).unwrap());
        assert!(jira.updates.borrow().is_empty());
    }

    #[test]
    fn test_sync_milestone_to_jira_creates_missing_version() {
        let jira = FakeJira::new();
        let bug = bug_with_milestones(1, &["ubuntu-24.04"]);
        let issue = issue_with_versions("TEST-123", &[]);

        assert!(sync_milestone_to_jira(&jira, &bug, &issue, "TEST", false).unwrap());
        assert_eq!(jira.versions_created.borrow().len(), 1);
        assert_eq!(jira.updates.borrow().len(), 1);
    }

    #[test]
    fn test_sync_milestone_to_jira_dry_run() {
        let bug = bug_with_milestones(1, &["ubuntu-22.04"]);
        let issue = issue_with_versions("TEST-123", &[]);

        // version exists, issue lacks it
        let jira = FakeJira::new().with_version("TEST", "ubuntu-22.04");
        assert!(!sync_milestone_to_jira(&jira, &bug, &issue, "TEST", true).unwrap());
        assert!(jira.updates.borrow().is_empty());

        // version missing
        let jira = FakeJira::new();
        assert!(!sync_milestone_to_jira(&jira, &bug, &issue, "TEST", true).unwrap());
        assert!(jira.versions_created.borrow().is_empty());
        assert!(jira.updates.borrow().is_empty());
    }
}
