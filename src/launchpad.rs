//! Launchpad integration for lp-to-jira
//!
//! This module provides:
//! - The bug model read from Launchpad (`Bug`, `BugTask`, `Milestone`)
//! - The `Launchpad` trait the rest of the crate talks to
//! - Bug lookup and project bug task listing helpers
//! - `LaunchpadClient`, the live implementation over the REST API
//!
//! Reads are anonymous unless credentials are configured. Commenting on a
//! bug needs an OAuth access token and secret (see `config`).

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LaunchpadConfig;
use crate::error::{Error, Result};

/// Bug task statuses considered open when listing a project's bugs
pub const OPEN_STATUSES: [&str; 6] = [
    "New",
    "Incomplete",
    "Confirmed",
    "Triaged",
    "In Progress",
    "Fix Committed",
];

/// A Launchpad milestone, used as the Jira version name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub name: String,
}

/// A (package, series) assignment on a bug
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct BugTask {
    /// Id of the bug this task belongs to
    pub bug_id: u64,
    /// Target name, e.g. "systemd (Ubuntu Focal)"
    pub bug_target_name: String,
    pub milestone: Option<Milestone>,
    /// Task status, e.g. "Confirmed"
    pub status: String,
    /// Launchpad user name of the assignee, without the leading `~`
    pub assignee: Option<String>,
}

/// A Launchpad bug with its tasks
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Bug {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub web_link: String,
    pub bug_tasks: Vec<BugTask>,
}

/// Filter applied when listing a project's bug tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub statuses: Vec<String>,
    pub created_since: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Open tasks, optionally limited to those created in the last `days` days
    pub fn open(days: Option<u32>) -> Self {
        Self {
            statuses: OPEN_STATUSES.iter().map(|s| s.to_string()).collect(),
            created_since: days.map(|d| Utc::now() - Duration::days(i64::from(d))),
        }
    }
}

/// Read and write access to Launchpad
pub trait Launchpad {
    /// Fetch a bug and its tasks. Returns `None` when the bug does not exist.
    fn get_bug(&self, bug_id: u64) -> Result<Option<Bug>>;

    /// List bug tasks of a project. Returns `None` when the project does not exist.
    fn search_project_tasks(
        &self,
        project: &str,
        filter: &TaskFilter,
    ) -> Result<Option<Vec<BugTask>>>;

    /// Post a comment on a bug
    fn add_bug_comment(&self, bug_id: u64, content: &str) -> Result<()>;
}

/// Look up a bug by id
///
/// Unknown ids (including 0) give `None` rather than an error, callers
/// are expected to check.
pub fn get_lp_bug(lp: &dyn Launchpad, bug_id: u64) -> Result<Option<Bug>> {
    if bug_id == 0 {
        return Ok(None);
    }

    let bug = lp.get_bug(bug_id)?;
    if bug.is_none() {
        warn!(bug_id, "bug not found on Launchpad");
    }
    Ok(bug)
}

/// List the open bug tasks of a Launchpad project
///
/// # Arguments
/// * `lp` - The Launchpad client
/// * `project` - The Launchpad project name (e.g. "subiquity")
/// * `days` - Only keep tasks created in the last `days` days
///
/// # Returns
/// `None` when the project does not exist or has no matching task
pub fn get_all_lp_project_bug_tasks(
    lp: &dyn Launchpad,
    project: &str,
    days: Option<u32>,
) -> Result<Option<Vec<BugTask>>> {
    let filter = TaskFilter::open(days);

    match lp.search_project_tasks(project, &filter)? {
        None => {
            warn!(project, "project not found on Launchpad");
            Ok(None)
        }
        Some(tasks) if tasks.is_empty() => {
            debug!(project, "project has no matching bug task");
            Ok(None)
        }
        Some(tasks) => Ok(Some(tasks)),
    }
}

// Wire types of the Launchpad REST API

#[derive(Deserialize)]
struct RawBug {
    id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    web_link: String,
    bug_tasks_collection_link: String,
}

#[derive(Deserialize)]
struct RawBugTask {
    bug_link: String,
    bug_target_name: String,
    #[serde(default)]
    milestone_link: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    assignee_link: Option<String>,
}

#[derive(Deserialize)]
struct Collection<T> {
    entries: Vec<T>,
    #[serde(default)]
    next_collection_link: Option<String>,
}

/// Last path segment of an API link (".../+milestone/ubuntu-22.04" -> "ubuntu-22.04")
fn last_segment(link: &str) -> &str {
    link.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

impl From<RawBugTask> for BugTask {
    fn from(raw: RawBugTask) -> Self {
        Self {
            bug_id: last_segment(&raw.bug_link).parse().unwrap_or_default(),
            bug_target_name: raw.bug_target_name,
            milestone: raw.milestone_link.as_deref().map(|link| Milestone {
                name: last_segment(link).to_string(),
            }),
            status: raw.status,
            assignee: raw
                .assignee_link
                .as_deref()
                .map(|link| last_segment(link).trim_start_matches('~').to_string()),
        }
    }
}

/// OAuth 1.0 credentials for the Launchpad API (PLAINTEXT signature)
#[derive(Debug, Clone)]
struct OAuthCredentials {
    consumer_key: String,
    token: String,
    secret: String,
}

impl OAuthCredentials {
    fn header(&self) -> String {
        format!(
            "OAuth realm=\"https://api.launchpad.net/\", \
             oauth_consumer_key=\"{}\", \
             oauth_token=\"{}\", \
             oauth_signature_method=\"PLAINTEXT\", \
             oauth_signature=\"%26{}\", \
             oauth_timestamp=\"{}\", \
             oauth_nonce=\"{}\", \
             oauth_version=\"1.0\"",
            self.consumer_key,
            self.token,
            self.secret,
            Utc::now().timestamp(),
            uuid::Uuid::new_v4().simple(),
        )
    }
}

/// Live Launchpad client
pub struct LaunchpadClient {
    client: Client,
    api_url: String,
    credentials: Option<OAuthCredentials>,
}

impl LaunchpadClient {
    /// Build a client from configuration
    pub fn new(config: &LaunchpadConfig) -> Result<Self> {
        let credentials = match (&config.token, &config.token_secret) {
            (Some(token), Some(secret)) => Some(OAuthCredentials {
                consumer_key: config.consumer_key.clone(),
                token: token.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        };

        let client = Client::builder()
            .user_agent(concat!("lp-to-jira/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => request.header(reqwest::header::AUTHORIZATION, credentials.header()),
            None => request,
        }
    }

    /// GET a resource, `None` on 404
    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<Option<T>> {
        debug!(url, "GET");
        let response = self
            .authorized(self.client.get(url).query(query))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response)?;
        Ok(Some(response.json()?))
    }

    /// Fetch every page of a collection, starting at `url`
    fn get_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Vec<T>>> {
        let mut page: Collection<T> = match self.get_json(url, query)? {
            Some(page) => page,
            None => return Ok(None),
        };

        let mut entries = std::mem::take(&mut page.entries);
        while let Some(next) = page.next_collection_link.take() {
            page = self
                .get_json(&next, &[])?
                .ok_or_else(|| Error::NotFound(next.clone()))?;
            entries.append(&mut page.entries);
        }

        Ok(Some(entries))
    }
}

/// Turn a non-success response into an error
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().unwrap_or_default();
    Err(Error::Launchpad {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

/// Query parameters of a `searchTasks` call
fn search_query(filter: &TaskFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("ws.op", "searchTasks".to_string())];
    for status in &filter.statuses {
        query.push(("status", status.clone()));
    }
    if let Some(since) = filter.created_since {
        query.push(("created_since", since.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
    }
    query
}

impl Launchpad for LaunchpadClient {
    fn get_bug(&self, bug_id: u64) -> Result<Option<Bug>> {
        let url = format!("{}/bugs/{}", self.api_url, bug_id);
        let raw: RawBug = match self.get_json(&url, &[])? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let tasks: Vec<RawBugTask> = self
            .get_collection(&raw.bug_tasks_collection_link, &[])?
            .unwrap_or_default();

        Ok(Some(Bug {
            id: raw.id,
            title: raw.title,
            description: raw.description.unwrap_or_default(),
            tags: raw.tags,
            web_link: raw.web_link,
            bug_tasks: tasks.into_iter().map(BugTask::from).collect(),
        }))
    }

    fn search_project_tasks(
        &self,
        project: &str,
        filter: &TaskFilter,
    ) -> Result<Option<Vec<BugTask>>> {
        let url = format!("{}/{}", self.api_url, project);
        let tasks: Option<Vec<RawBugTask>> = self.get_collection(&url, &search_query(filter))?;
        Ok(tasks.map(|tasks| tasks.into_iter().map(BugTask::from).collect()))
    }

    fn add_bug_comment(&self, bug_id: u64, content: &str) -> Result<()> {
        if self.credentials.is_none() {
            return Err(Error::Config(
                "Launchpad credentials are required to comment on bugs".into(),
            ));
        }

        let url = format!("{}/bugs/{}", self.api_url, bug_id);
        info!(bug_id, "commenting on Launchpad bug");
        let response = self
            .authorized(self.client.post(&url))
            .form(&[("ws.op", "newMessage"), ("content", content)])
            .send()?;
        check(response)?;
        Ok(())
    }
}
