//! Provisioning of bee storage nodes on Kubernetes.
//!
//! A [`NodeSpec`] is translated into the objects backing one node and converged by
//! the [`NodeProvisioner`]; a [`Cluster`] fans the provisioner out over node groups.

mod cluster;
mod config;
mod error;
mod features;
mod port;
mod provisioner;
mod spec;

pub mod defaults;
pub mod translate;

pub use self::cluster::{
    Cluster, ClusterConfig, ClusterConfigBuilder, NodeGroup, NodeOverride, Topology,
};
pub use self::config::NodeConfig;
pub use self::error::{OrchestrationError, PortError, PortParseError};
pub use self::features::{KEY_VOLUMES, KeyFeatures, KeyKind, KeySecret, KeyVolume};
pub use self::port::{NodePorts, parse_port};
pub use self::provisioner::{
    NodeProvisioner, NodeState, ProvisionerConfig, ProvisionerConfigBuilder,
};
pub use self::spec::{
    IngressSettings, NodeKeys, NodeResources, NodeSpec, NodeSpecBuilder, Persistence,
};
