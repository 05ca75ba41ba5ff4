//! In-memory trackers recording every call, for unit tests

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::jira::{IssueFields, IssueSnapshot, IssueUpdate, Jira, JiraIssue, RemoteLink, Version};
use crate::launchpad::{Bug, BugTask, Launchpad, Milestone, TaskFilter};

/// A bug with one task per target name
pub fn bug_with_targets(id: u64, targets: &[&str]) -> Bug {
    Bug {
        id,
        bug_tasks: targets
            .iter()
            .map(|target| BugTask {
                bug_id: id,
                bug_target_name: target.to_string(),
                ..BugTask::default()
            })
            .collect(),
        ..Bug::default()
    }
}

/// A bug with one Ubuntu task per milestone
pub fn bug_with_milestones(id: u64, milestones: &[&str]) -> Bug {
    Bug {
        id,
        title: format!("Test bug {}", id),
        description: format!("Test description {}", id),
        web_link: format!("https://bugs.launchpad.net/bugs/{}", id),
        bug_tasks: milestones
            .iter()
            .map(|name| BugTask {
                bug_id: id,
                bug_target_name: "testpkg (Ubuntu)".into(),
                milestone: Some(Milestone {
                    name: name.to_string(),
                }),
                ..BugTask::default()
            })
            .collect(),
        ..Bug::default()
    }
}

/// An issue created from bug `bug_id`, listing the given fix versions
pub fn issue_for_bug(key: &str, bug_id: u64, versions: &[&str]) -> JiraIssue {
    let mut issue = issue_with_versions(key, versions);
    issue.fields.summary = Some(format!("LP#{} [testpkg] Test bug {}", bug_id, bug_id));
    issue
}

/// An issue listing the given fix versions
pub fn issue_with_versions(key: &str, versions: &[&str]) -> JiraIssue {
    JiraIssue {
        key: key.to_string(),
        fields: IssueSnapshot {
            summary: None,
            fix_versions: versions
                .iter()
                .enumerate()
                .map(|(i, name)| Version {
                    id: Some(i.to_string()),
                    name: name.to_string(),
                    project: None,
                })
                .collect(),
        },
    }
}

#[derive(Default)]
pub struct FakeLaunchpad {
    bugs: HashMap<u64, Bug>,
    projects: HashMap<String, Vec<BugTask>>,
    pub filters: RefCell<Vec<TaskFilter>>,
    pub comments: RefCell<Vec<(u64, String)>>,
}

impl FakeLaunchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bug(mut self, bug: Bug) -> Self {
        self.bugs.insert(bug.id, bug);
        self
    }

    pub fn with_project(mut self, name: &str, tasks: Vec<BugTask>) -> Self {
        self.projects.insert(name.to_string(), tasks);
        self
    }

    pub fn last_filter(&self) -> Option<TaskFilter> {
        self.filters.borrow().last().cloned()
    }
}

impl Launchpad for FakeLaunchpad {
    fn get_bug(&self, bug_id: u64) -> Result<Option<Bug>> {
        Ok(self.bugs.get(&bug_id).cloned())
    }

    fn search_project_tasks(
        &self,
        project: &str,
        filter: &TaskFilter,
    ) -> Result<Option<Vec<BugTask>>> {
        self.filters.borrow_mut().push(filter.clone());
        Ok(self.projects.get(project).cloned())
    }

    fn add_bug_comment(&self, bug_id: u64, content: &str) -> Result<()> {
        self.comments.borrow_mut().push((bug_id, content.to_string()));
        Ok(())
    }
}

pub struct FakeJira {
    /// Returned by every search
    pub existing: Vec<JiraIssue>,
    /// Versions known to exist, by (project, name)
    pub versions: RefCell<Vec<(String, String)>>,
    /// Make version lookups fail with a server error
    pub lookup_fails: bool,
    pub created_key: String,

    pub searches: RefCell<Vec<String>>,
    pub created: RefCell<Vec<IssueFields>>,
    pub links: RefCell<Vec<(String, RemoteLink)>>,
    pub version_lookups: RefCell<Vec<(String, String)>>,
    pub versions_created: RefCell<Vec<(String, String)>>,
    pub updates: RefCell<Vec<(String, IssueUpdate)>>,
    pub transitions: RefCell<Vec<(String, String)>>,
}

impl Default for FakeJira {
    fn default() -> Self {
        Self {
            existing: Vec::new(),
            versions: RefCell::new(Vec::new()),
            lookup_fails: false,
            created_key: "TEST-001".to_string(),
            searches: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
            links: RefCell::new(Vec::new()),
            version_lookups: RefCell::new(Vec::new()),
            versions_created: RefCell::new(Vec::new()),
            updates: RefCell::new(Vec::new()),
            transitions: RefCell::new(Vec::new()),
        }
    }
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(mut self, issue: JiraIssue) -> Self {
        self.existing.push(issue);
        self
    }

    pub fn with_version(self, project: &str, name: &str) -> Self {
        self.versions
            .borrow_mut()
            .push((project.to_string(), name.to_string()));
        self
    }
}

impl Jira for FakeJira {
    fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>> {
        self.searches.borrow_mut().push(jql.to_string());
        Ok(self.existing.clone())
    }

    fn create_issue(&self, fields: &IssueFields) -> Result<JiraIssue> {
        self.created.borrow_mut().push(fields.clone());
        Ok(issue_with_versions(&self.created_key, &[]))
    }

    fn add_simple_link(&self, issue: &JiraIssue, link: &RemoteLink) -> Result<()> {
        self.links
            .borrow_mut()
            .push((issue.key.clone(), link.clone()));
        Ok(())
    }

    fn client_info(&self) -> String {
        "jira".to_string()
    }

    fn get_project_version_by_name(&self, project: &str, name: &str) -> Result<Version> {
        self.version_lookups
            .borrow_mut()
            .push((project.to_string(), name.to_string()));

        if self.lookup_fails {
            return Err(Error::Jira {
                status: 503,
                message: "unavailable".into(),
            });
        }

        let known = self
            .versions
            .borrow()
            .iter()
            .any(|(p, n)| p == project && n == name);
        if known {
            Ok(Version {
                id: Some("100".into()),
                name: name.to_string(),
                project: Some(project.to_string()),
            })
        } else {
            Err(Error::NotFound(format!("version '{}'", name)))
        }
    }

    fn create_version(&self, project: &str, name: &str) -> Result<Version> {
        self.versions_created
            .borrow_mut()
            .push((project.to_string(), name.to_string()));
        self.versions
            .borrow_mut()
            .push((project.to_string(), name.to_string()));
        Ok(Version {
            id: Some("200".into()),
            name: name.to_string(),
            project: Some(project.to_string()),
        })
    }

    fn update_issue(&self, issue: &JiraIssue, update: &IssueUpdate) -> Result<()> {
        self.updates
            .borrow_mut()
            .push((issue.key.clone(), update.clone()));
        Ok(())
    }

    fn transition_issue(&self, issue: &JiraIssue, status: &str) -> Result<()> {
        self.transitions
            .borrow_mut()
            .push((issue.key.clone(), status.to_string()));
        Ok(())
    }
}
