//! Jira integration for lp-to-jira
//!
//! This module provides:
//! - The Jira types exchanged with the core (`JiraIssue`, `IssueFields`, `Version`, ...)
//! - The `Jira` trait the rest of the crate talks to
//! - `JiraClient`, the live implementation over the Jira REST API v2
//!
//! # Configuration
//!
//! The client needs a base URL, a user and an API token. They come from the
//! `jira` section of the config file or from `JIRA_URL`, `JIRA_USER` and
//! `JIRA_TOKEN` (see `config`).

use std::collections::BTreeMap;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::config::{JiraConfig, SearchApi};
use crate::error::{Error, Result};

/// Reference to a project by key
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub key: String,
}

/// Reference to an issue type by name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueTypeRef {
    pub name: String,
}

/// Reference to a component by name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub name: Option<String>,
}

/// Reference to a user by account id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// Reference to a version by name, as sent in `fixVersions`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub name: String,
}

/// Fields of an issue to create
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IssueFields {
    pub project: ProjectRef,
    pub summary: String,
    pub description: String,
    pub issuetype: IssueTypeRef,
    #[serde(serialize_with = "named_components")]
    pub components: Vec<ComponentRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
    /// Custom fields keyed by field id (e.g. the epic link)
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// Jira rejects components without a name, so they never reach the wire
fn named_components<S>(
    components: &[ComponentRef],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let named: Vec<&ComponentRef> = components.iter().filter(|c| c.name.is_some()).collect();
    named.serialize(serializer)
}

/// Field update sent for an existing issue
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    #[serde(rename = "fixVersions")]
    pub fix_versions: Vec<VersionRef>,
}

/// A project version
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Version {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Project key, only known for versions this tool created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// The subset of issue fields read back from Jira
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "fixVersions")]
    pub fix_versions: Vec<Version>,
}

/// An existing Jira issue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JiraIssue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueSnapshot,
}

impl JiraIssue {
    /// Whether the issue already lists a fix version with this name
    pub fn has_fix_version(&self, name: &str) -> bool {
        self.fields.fix_versions.iter().any(|v| v.name == name)
    }
}

/// A web link attached to an issue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteLink {
    pub url: String,
    pub title: String,
}

/// Read and write access to Jira
pub trait Jira {
    /// Run a JQL search
    fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>>;

    /// Create an issue and return it
    fn create_issue(&self, fields: &IssueFields) -> Result<JiraIssue>;

    /// Attach a web link to an issue
    fn add_simple_link(&self, issue: &JiraIssue, link: &RemoteLink) -> Result<()>;

    /// Base URL of the Jira instance, without trailing slash
    fn client_info(&self) -> String;

    /// Find a project version by name. Fails with `Error::NotFound` when absent.
    fn get_project_version_by_name(&self, project: &str, name: &str) -> Result<Version>;

    /// Create a project version
    fn create_version(&self, project: &str, name: &str) -> Result<Version>;

    /// Update fields of an existing issue
    fn update_issue(&self, issue: &JiraIssue, update: &IssueUpdate) -> Result<()>;

    /// Move an issue to the named status
    fn transition_issue(&self, issue: &JiraIssue, status: &str) -> Result<()>;
}

/// Browsable URL of an issue
pub fn browse_url(jira: &dyn Jira, issue: &JiraIssue) -> String {
    format!("{}/browse/{}", jira.client_info(), issue.key)
}

// Wire types of the Jira REST API

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    fields: &'a IssueFields,
}

#[derive(Serialize)]
struct RemoteLinkRequest<'a> {
    object: &'a RemoteLink,
}

#[derive(Serialize)]
struct CreateVersionRequest<'a> {
    name: &'a str,
    project: &'a str,
}

#[derive(Serialize)]
struct UpdateIssueRequest<'a> {
    fields: &'a IssueUpdate,
}

#[derive(Deserialize)]
struct TransitionTarget {
    name: String,
}

#[derive(Deserialize)]
struct Transition {
    id: String,
    name: String,
    to: TransitionTarget,
}

#[derive(Deserialize)]
struct Transitions {
    transitions: Vec<Transition>,
}

#[derive(Serialize)]
struct TransitionId<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct TransitionRequest<'a> {
    transition: TransitionId<'a>,
}

/// Pick the transition leading to `status`, matching either the
/// transition name or its target status, ignoring case
fn find_transition<'a>(transitions: &'a [Transition], status: &str) -> Option<&'a Transition> {
    transitions.iter().find(|t| {
        t.to.name.eq_ignore_ascii_case(status) || t.name.eq_ignore_ascii_case(status)
    })
}

/// Live Jira client
pub struct JiraClient {
    client: Client,
    base_url: String,
    user: String,
    token: String,
    search_api: SearchApi,
}

impl JiraClient {
    /// Build a client from configuration
    ///
    /// Fails with `Error::Config` when the URL, user or token is missing.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .ok_or_else(|| Error::Config("Jira URL not configured. Set jira.url or JIRA_URL".into()))?;
        let user = config
            .user
            .clone()
            .ok_or_else(|| Error::Config("Jira user not configured. Set jira.user or JIRA_USER".into()))?;
        let token = config
            .token
            .clone()
            .ok_or_else(|| Error::Config("Jira token not configured. Set jira.token or JIRA_TOKEN".into()))?;

        let client = Client::builder()
            .user_agent(concat!("lp-to-jira/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            user,
            token,
            search_api: config.search_api,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        debug!(path, "GET");
        self.client
            .get(self.url(path))
            .basic_auth(&self.user, Some(&self.token))
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.user, Some(&self.token))
            .json(body)
            .send()?;
        check(response)
    }
}

/// Turn a non-success response into an error
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().unwrap_or_default();
    Err(Error::Jira {
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

impl Jira for JiraClient {
    fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>> {
        let response = self
            .get(self.search_api.path())
            .query(&[("jql", jql), ("fields", "summary,fixVersions"), ("maxResults", "50")])
            .send()?;
        let found: SearchResponse = check(response)?.json()?;
        Ok(found.issues)
    }

    fn create_issue(&self, fields: &IssueFields) -> Result<JiraIssue> {
        info!(summary = %fields.summary, "creating Jira issue");
        let issue: JiraIssue = self.post("issue", &CreateIssueRequest { fields })?.json()?;
        Ok(issue)
    }

    fn add_simple_link(&self, issue: &JiraIssue, link: &RemoteLink) -> Result<()> {
        self.post(
            &format!("issue/{}/remotelink", issue.key),
            &RemoteLinkRequest { object: link },
        )?;
        Ok(())
    }

    fn client_info(&self) -> String {
        self.base_url.clone()
    }

    fn get_project_version_by_name(&self, project: &str, name: &str) -> Result<Version> {
        let response = self.get(&format!("project/{}/versions", project)).send()?;
        let versions: Vec<Version> = check(response)?.json()?;

        versions
            .into_iter()
            .find(|v| v.name == name)
            .map(|v| Version {
                project: Some(project.to_string()),
                ..v
            })
            .ok_or_else(|| Error::NotFound(format!("version '{}' in project {}", name, project)))
    }

    fn create_version(&self, project: &str, name: &str) -> Result<Version> {
        info!(project, name, "creating Jira version");
        let version: Version = self
            .post("version", &CreateVersionRequest { name, project })?
            .json()?;
        Ok(Version {
            project: Some(project.to_string()),
            ..version
        })
    }

    fn update_issue(&self, issue: &JiraIssue, update: &IssueUpdate) -> Result<()> {
        info!(key = %issue.key, "updating Jira issue");
        let response = self
            .client
            .put(self.url(&format!("issue/{}", issue.key)))
            .basic_auth(&self.user, Some(&self.token))
            .json(&UpdateIssueRequest { fields: update })
            .send()?;
        check(response)?;
        Ok(())
    }

    fn transition_issue(&self, issue: &JiraIssue, status: &str) -> Result<()> {
        let path = format!("issue/{}/transitions", issue.key);
        let available: Transitions = check(self.get(&path).send()?)?.json()?;

        let transition = find_transition(&available.transitions, status).ok_or_else(|| {
            Error::NotFound(format!("transition to '{}' on {}", status, issue.key))
        })?;

        info!(key = %issue.key, status, "transitioning Jira issue");
        self.post(
            &path,
            &TransitionRequest {
                transition: TransitionId { id: &transition.id },
            },
        )?;
        Ok(())
    }
}
