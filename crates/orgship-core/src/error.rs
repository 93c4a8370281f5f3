//! Error types for orgship.
//!
//! Variants follow the failure categories of a deployment run: configuration
//! problems and VCS problems are raised before anything is sent to the org,
//! service errors and timeouts come out of the deploy protocol. Content
//! failures (a component that does not compile, a failing test) are not
//! errors; they are a normal [`crate::deploy::DeploymentOutcome`].

use thiserror::Error;

/// Result type alias for orgship operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for orgship
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration (credentials, regex, baseline)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A revision name that does not resolve to a commit
    #[error("Unable to resolve revision '{revision}'")]
    RevisionNotFound { revision: String },

    /// A blob expected at a commit is not there
    #[error("Object not found: '{path}' at {commit}")]
    ObjectNotFound { path: String, commit: String },

    /// Any other version-control failure
    #[error("Version control error: {0}")]
    Vcs(#[from] git2::Error),

    /// The remote service rejected the request independently of its content
    #[error("Service error: {code} msg:{message}")]
    Service { code: String, message: String },

    /// Polling ran out of attempts; the deployment may still finish remotely
    #[error(
        "Request timed out after {attempts} status checks. \
         You can check the result later using async id {async_id}"
    )]
    Timeout { async_id: String, attempts: u32 },

    /// The caller cancelled the run while it was waiting on the org
    #[error("Deployment polling cancelled (async id {async_id})")]
    Cancelled { async_id: String },

    /// HTTP transport failure talking to the org
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Archive could not be written or read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Manifest XML could not be written
    #[error("Failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An XML document could not be deserialized
    #[error("Failed to parse XML: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a service error
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an object-not-found error
    pub fn object_not_found(path: impl Into<String>, commit: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            path: path.into(),
            commit: commit.into(),
        }
    }

    /// Create an unresolvable-revision error
    pub fn revision_not_found(revision: impl Into<String>) -> Self {
        Self::RevisionNotFound {
            revision: revision.into(),
        }
    }

    /// Whether this error is an invalid or missing setting.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error came from reading the repository.
    pub fn is_vcs(&self) -> bool {
        matches!(
            self,
            Self::RevisionNotFound { .. } | Self::ObjectNotFound { .. } | Self::Vcs(_)
        )
    }
}
