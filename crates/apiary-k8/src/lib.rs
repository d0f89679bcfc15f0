//! Kubernetes plumbing for apiary: the platform seam, an in-memory platform,
//! the object kinds apiary writes and the resource clients that converge them.

mod client;
mod error;
mod identity;
mod memory;
mod namespace;
mod reconcile;

pub mod objects;

pub use self::client::{K8Api, connect};
pub use self::error::{ApiError, NamespaceError, ResourceError, Verb};
pub use self::identity::{CREATED_BY_ANNOTATION, ClientIdentity, DEFAULT_TOOL, MANAGED_BY_LABEL};
pub use self::memory::{ApiCall, FailureMode, MemoryClient};
pub use self::namespace::NamespaceClient;
pub use self::reconcile::{
    ConfigMapClient, IngressClient, ResourceClient, SecretClient, ServiceAccountClient,
    ServiceClient, StatefulSetClient,
};

pub use k8_client;
pub use k8_types;
