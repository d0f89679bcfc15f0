use std::fmt;

use k8_client::meta_client::ObjectKeyNotFound;
use k8_types::MetaStatus;

/// Errors returned by a platform API call
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The object does not exist
    #[error("not found")]
    NotFound,
    /// The write lost an optimistic-concurrency race or the object already exists
    #[error("conflict: {0}")]
    Conflict(String),
    /// The platform rejected or failed the request
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Transport or protocol error from the Kubernetes client
    #[error("Kubernetes client error: {0}")]
    Client(anyhow::Error),
    /// The in-memory platform could not (de)serialize an object
    #[error("store serialization error: {0}")]
    Store(#[from] serde_yaml::Error),
    /// No usable kubeconfig or in-cluster credentials
    #[error("loading Kubernetes config: {0}")]
    Config(#[from] k8_config::ConfigError),
    /// An object could not be encoded as an update patch
    #[error("encoding patch: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<ObjectKeyNotFound>().is_some() {
            return Self::NotFound;
        }

        let code = err.downcast_ref::<MetaStatus>().and_then(|status| status.code);
        match code {
            Some(404) => Self::NotFound,
            Some(409) => Self::Conflict(err.to_string()),
            _ => Self::Client(err),
        }
    }
}

/// Operation a resource client was performing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let verb = match self {
            Self::Get => "getting",
            Self::List => "listing",
            Self::Create => "creating",
            Self::Update => "updating",
            Self::Delete => "deleting",
        };
        write!(f, "{verb}")
    }
}

/// Failure of one resource client operation, carrying the full resource identity
#[derive(thiserror::Error, Debug)]
#[error("{verb} {kind} {name} in namespace {namespace}: {source}")]
pub struct ResourceError {
    pub verb: Verb,
    pub kind: &'static str,
    pub name: String,
    pub namespace: String,
    #[source]
    pub source: ApiError,
}

impl ResourceError {
    pub fn new(
        verb: Verb,
        kind: &'static str,
        name: impl Into<String>,
        namespace: impl Into<String>,
        source: ApiError,
    ) -> Self {
        Self {
            verb,
            kind,
            name: name.into(),
            namespace: namespace.into(),
            source,
        }
    }
}

/// Errors from namespace management
#[derive(thiserror::Error, Debug)]
pub enum NamespaceError {
    /// Refused to touch a namespace this tool does not manage
    #[error("namespace {name} is not managed by {expected} (managed-by: {found:?})")]
    NotManaged {
        name: String,
        expected: String,
        found: Option<String>,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
