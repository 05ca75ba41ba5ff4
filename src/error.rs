use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Launchpad API error ({status}): {message}")]
    Launchpad { status: u16, message: String },

    #[error("Jira API error ({status}): {message}")]
    Jira { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User cancelled operation")]
    Cancelled,

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl From<inquire::error::InquireError> for Error {
    fn from(err: inquire::error::InquireError) -> Self {
        match err {
            inquire::error::InquireError::OperationCanceled => Error::Cancelled,
            inquire::error::InquireError::OperationInterrupted => Error::Cancelled,
            other => Error::Prompt(other.to_string()),
        }
    }
}

impl Error {
    /// Whether this error means the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Jira { status, .. } | Error::Launchpad { status, .. } => *status == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
