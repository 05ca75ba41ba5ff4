use tracing::warn;

use crate::cli::{Args, Command};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::extract::get_lp_bug_milestone;
use crate::issue::{build_jira_issue, create_jira_issue, find_jira_issue, render_payload};
use crate::jira::{browse_url, IssueFields, Jira, JiraClient, JiraIssue};
use crate::launchpad::{
    get_all_lp_project_bug_tasks, get_lp_bug, Bug, Launchpad, LaunchpadClient,
};
use crate::milestone::{ensure_jira_version, sync_milestone_to_jira};
use crate::options::Options;
use crate::ui;

/// What happened to a bug
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The bug already had an issue
    Existing(JiraIssue),
    /// A new issue was created
    Created(JiraIssue),
    /// Dry-run: the issue that would have been created
    DryRun(IssueFields),
}

/// Tally of a project sync
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub existing: usize,
    pub dry_run: usize,
    /// Listed bugs Launchpad no longer returns
    pub skipped: usize,
    pub failed: usize,
}

/// Main application entry point
pub fn run(args: Args) -> Result<()> {
    ui::init_render_config();

    let config_dir = match &args.config {
        Some(dir) => {
            config::ensure_config_dir_exists(dir)?;
            dir.clone()
        }
        None => config::get_config_dir()?,
    };
    let config = Config::load(&config_dir)?;
    let opts = args.options(&config);

    let lp = LaunchpadClient::new(&config.launchpad)?;
    let jira = JiraClient::new(&config.jira)?;

    match &args.command {
        Command::Bug { bug_id, project } => {
            let bug = get_lp_bug(&lp, *bug_id)?
                .ok_or_else(|| Error::NotFound(format!("Launchpad bug {}", bug_id)))?;
            lp_to_jira_bug(&lp, &jira, &bug, project, &opts)?;
        }
        Command::Project {
            lp_project,
            project,
            days,
            yes,
        } => {
            let bug_ids = project_bug_ids(&lp, lp_project, *days)?;
            if bug_ids.is_empty() {
                println!("No open bug found in {}", lp_project);
                return Ok(());
            }

            if !yes && !opts.dry_run && !ui::confirm_sync(lp_project, project, bug_ids.len())? {
                return Err(Error::Cancelled);
            }

            let report = sync_project_bugs(&lp, &jira, &bug_ids, project, &opts);
            println!(
                "Done: {} created, {} already in Jira, {} dry-run, {} skipped, {} failed",
                report.created,
                report.existing,
                report.dry_run,
                report.skipped,
                report.failed
            );
        }
    }

    Ok(())
}

/// Copy a Launchpad bug into a Jira project
///
/// If the bug already has an issue, only the milestone is reconciled (when
/// `opts.sync_milestone` is set). Otherwise the issue is created, then,
/// each when enabled: the Launchpad bug gets a link to it, the issue is
/// moved to the status mapped from the bug task status, and the milestone
/// is added to its fix versions.
pub fn lp_to_jira_bug(
    lp: &dyn Launchpad,
    jira: &dyn Jira,
    bug: &Bug,
    project: &str,
    opts: &Options,
) -> Result<Outcome> {
    if let Some(issue) = find_jira_issue(jira, bug, project)? {
        ui::print_existing(bug, &browse_url(jira, &issue));
        if opts.sync_milestone {
            sync_milestone_to_jira(jira, bug, &issue, project, opts.dry_run)?;
        }
        return Ok(Outcome::Existing(issue));
    }

    let fields = build_jira_issue(bug, project, opts);

    if opts.dry_run {
        ui::print_dry_run(&format!("create issue in {}: {}", project, fields.summary));
        println!("{}", render_payload(&fields)?);
        if opts.sync_milestone {
            let milestone = get_lp_bug_milestone(bug);
            ensure_jira_version(jira, project, milestone.as_deref(), true)?;
        }
        return Ok(Outcome::DryRun(fields));
    }

    let issue = create_jira_issue(jira, &fields, bug)?;

    if opts.lp_link {
        let comment = format!("Tracked in Jira: {}", browse_url(jira, &issue));
        lp.add_bug_comment(bug.id, &comment)?;
    }

    if let Some(status) = mapped_status(bug, opts) {
        jira.transition_issue(&issue, status)?;
    }

    if opts.sync_milestone {
        sync_milestone_to_jira(jira, bug, &issue, project, false)?;
    }

    Ok(Outcome::Created(issue))
}

/// Jira status of the first bug task whose status is mapped
fn mapped_status<'a>(bug: &Bug, opts: &'a Options) -> Option<&'a str> {
    bug.bug_tasks
        .iter()
        .find_map(|task| opts.status_map.get(&task.status))
        .map(|s| s.as_str())
}

/// Ids of the bugs with an open task in `lp_project`, in listing order
pub fn project_bug_ids(lp: &dyn Launchpad, lp_project: &str, days: Option<u32>) -> Result<Vec<u64>> {
    let tasks = get_all_lp_project_bug_tasks(lp, lp_project, days)?.unwrap_or_default();

    let mut ids: Vec<u64> = Vec::new();
    for task in tasks {
        if task.bug_id != 0 && !ids.contains(&task.bug_id) {
            ids.push(task.bug_id);
        }
    }
    Ok(ids)
}

/// Copy every bug of `bug_ids` into `project`
///
/// A bug Launchpad no longer returns is skipped with a warning. A failing
/// bug is reported and does not stop the others.
pub fn sync_project_bugs(
    lp: &dyn Launchpad,
    jira: &dyn Jira,
    bug_ids: &[u64],
    project: &str,
    opts: &Options,
) -> SyncReport {
    let mut report = SyncReport::default();

    for &bug_id in bug_ids {
        let outcome = get_lp_bug(lp, bug_id).and_then(|bug| match bug {
            Some(bug) => lp_to_jira_bug(lp, jira, &bug, project, opts).map(Some),
            None => Ok(None),
        });

        match outcome {
            Ok(Some(Outcome::Created(_))) => report.created += 1,
            Ok(Some(Outcome::Existing(_))) => report.existing += 1,
            Ok(Some(Outcome::DryRun(_))) => report.dry_run += 1,
            Ok(None) => {
                warn!(bug_id, "bug listed but not found, skipping");
                ui::print_skipped(bug_id);
                report.skipped += 1;
            }
            Err(err) => {
                warn!(bug_id, error = %err, "bug not copied");
                ui::print_failed(bug_id, &err.to_string());
                report.failed += 1;
            }
        }
    }

    report
}
