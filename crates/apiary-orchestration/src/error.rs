use std::num::ParseIntError;

use handlebars::{RenderError, TemplateError};

use apiary_k8::{NamespaceError, ResourceError};

/// Why a listen address did not yield a port
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("no port segment")]
    Missing,
    #[error(transparent)]
    Invalid(#[from] ParseIntError),
}

/// A `<host>:<port>` field of the node configuration could not be parsed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("parsing port of {field} from {value:?}: {source}")]
pub struct PortParseError {
    pub field: &'static str,
    pub value: String,
    #[source]
    pub source: PortError,
}

/// Errors from provisioning nodes and clusters
#[derive(thiserror::Error, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    Port(#[from] PortParseError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
    /// The node configuration template failed to render
    #[error("rendering node configuration: {0}")]
    Render(#[from] RenderError),
    #[error("node configuration template: {0}")]
    Template(#[from] TemplateError),
    #[error("timed out provisioning node {node}")]
    Timeout { node: String },
    #[error("node {name} not found in namespace {namespace}")]
    NodeMissing { name: String, namespace: String },
    #[error("unknown node group {0}")]
    UnknownNodeGroup(String),
    #[error("unknown node {0}")]
    UnknownNode(String),
    #[error("node {0} already exists")]
    DuplicateNode(String),
    #[error("node group {0} already exists")]
    DuplicateNodeGroup(String),
    /// Attempted to build a config without all required fields
    #[error("missing required config option {0}")]
    Config(String),
}
