//! Named groups of nodes provisioned together.

use std::collections::HashMap;
use std::time::Duration;

use derive_builder::Builder;
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument};

use fluvio_future::future::timeout;

use apiary_k8::K8Api;

use crate::config::NodeConfig;
use crate::defaults::*;
use crate::error::OrchestrationError;
use crate::provisioner::{NodeProvisioner, NodeState};
use crate::spec::{NodeKeys, NodeResources, NodeSpec};

/// Cluster-wide provisioning settings
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(build_fn(private, name = "build_impl"))]
pub struct ClusterConfig {
    #[builder(setter(into))]
    pub name: String,
    /// namespace every node of the cluster lives in
    #[builder(setter(into), default = "DEFAULT_NAMESPACE.to_string()")]
    pub namespace: String,
    /// deadline for provisioning one node
    #[builder(default = "Duration::from_secs(DEFAULT_NODE_TIMEOUT_SECS)")]
    pub node_timeout: Duration,
    /// provision the nodes of one group concurrently
    #[builder(default = "true")]
    pub concurrent: bool,
    /// create the namespace before the first group and remove it on delete
    #[builder(default = "false")]
    pub create_namespace: bool,
}

impl ClusterConfig {
    pub fn builder(name: impl Into<String>) -> ClusterConfigBuilder {
        let mut builder = ClusterConfigBuilder::default();
        builder.name(name);
        builder
    }
}

impl ClusterConfigBuilder {
    pub fn build(&self) -> Result<ClusterConfig, OrchestrationError> {
        let config = self
            .build_impl()
            .map_err(|err| OrchestrationError::Config(err.to_string()))?;
        Ok(config)
    }
}

/// Per-node departures from the group template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeOverride {
    pub config: Option<NodeConfig>,
    pub keys: Option<NodeKeys>,
    pub resources: Option<NodeResources>,
    pub labels: HashMap<String, String>,
}

/// Nodes sharing one template
#[derive(Debug, Clone)]
pub struct NodeGroup {
    name: String,
    template: NodeSpec,
    nodes: Vec<String>,
    overrides: HashMap<String, NodeOverride>,
}

impl NodeGroup {
    pub fn new(name: impl Into<String>, template: NodeSpec) -> Self {
        Self {
            name: name.into(),
            template,
            nodes: vec![],
            overrides: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &NodeSpec {
        &self.template
    }

    /// node names in insertion order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.iter().any(|name| name == node)
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        overrides: NodeOverride,
    ) -> Result<(), OrchestrationError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(OrchestrationError::DuplicateNode(name));
        }

        self.overrides.insert(name.clone(), overrides);
        self.nodes.push(name);
        Ok(())
    }

    /// Add `count` nodes named `<group>-<index>`, continuing after the existing ones
    pub fn add_nodes(&mut self, count: usize) -> Result<(), OrchestrationError> {
        let start = self.nodes.len();
        for index in start..start + count {
            self.add_node(format!("{}-{index}", self.name), NodeOverride::default())?;
        }
        Ok(())
    }

    fn remove_node(&mut self, name: &str) {
        self.nodes.retain(|node| node != name);
        self.overrides.remove(name);
    }

    /// Spec of one node: the template with the node's identity and overrides applied
    pub fn node_spec(&self, name: &str, namespace: &str) -> Result<NodeSpec, OrchestrationError> {
        let overrides = self
            .overrides
            .get(name)
            .ok_or_else(|| OrchestrationError::UnknownNode(name.to_owned()))?;

        let mut spec = self.template.clone();
        spec.name = name.to_owned();
        spec.namespace = namespace.to_owned();

        if let Some(config) = &overrides.config {
            spec.config = config.clone();
        }
        if let Some(keys) = &overrides.keys {
            spec.keys = keys.clone();
        }
        if let Some(resources) = &overrides.resources {
            spec.resources = resources.clone();
        }
        spec.labels.extend(overrides.labels.clone());

        Ok(spec)
    }
}

/// Node counts of a standard bee network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topology {
    pub bootnodes: usize,
    pub full_nodes: usize,
    pub light_nodes: usize,
}

impl Topology {
    /// Groups in provisioning order, bootnodes first; empty groups are left out
    pub fn groups(&self, template: &NodeSpec) -> Result<Vec<NodeGroup>, OrchestrationError> {
        let roles = [
            (BOOTNODE_GROUP, self.bootnodes, true, true),
            (FULL_NODE_GROUP, self.full_nodes, false, true),
            (LIGHT_NODE_GROUP, self.light_nodes, false, false),
        ];

        let mut groups = vec![];
        for (name, count, bootnode_mode, full_node) in roles {
            if count == 0 {
                continue;
            }

            let mut template = template.clone();
            template.config.bootnode_mode = bootnode_mode;
            template.config.full_node = full_node;

            let mut group = NodeGroup::new(name, template);
            group.add_nodes(count)?;
            groups.push(group);
        }

        Ok(groups)
    }
}

/// Ordered node groups sharing one namespace and one provisioner
pub struct Cluster<C> {
    config: ClusterConfig,
    provisioner: NodeProvisioner<C>,
    groups: Vec<NodeGroup>,
}

impl<C> Cluster<C>
where
    C: K8Api + Clone,
{
    pub fn new(config: ClusterConfig, provisioner: NodeProvisioner<C>) -> Self {
        Self {
            config,
            provisioner,
            groups: vec![],
        }
    }

    pub fn from_topology(
        config: ClusterConfig,
        provisioner: NodeProvisioner<C>,
        topology: Topology,
        template: &NodeSpec,
    ) -> Result<Self, OrchestrationError> {
        let mut cluster = Self::new(config, provisioner);
        for group in topology.groups(template)? {
            cluster.add_node_group(group)?;
        }
        Ok(cluster)
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Append a group; node names must be unique across the cluster
    pub fn add_node_group(&mut self, group: NodeGroup) -> Result<(), OrchestrationError> {
        if self.groups.iter().any(|existing| existing.name == group.name) {
            return Err(OrchestrationError::DuplicateNodeGroup(group.name));
        }

        if let Some(node) = group
            .nodes
            .iter()
            .find(|node| self.groups.iter().any(|existing| existing.contains(node)))
        {
            return Err(OrchestrationError::DuplicateNode(node.clone()));
        }

        self.groups.push(group);
        Ok(())
    }

    pub fn node_group(&self, name: &str) -> Result<&NodeGroup, OrchestrationError> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .ok_or_else(|| OrchestrationError::UnknownNodeGroup(name.to_owned()))
    }

    fn node_group_mut(&mut self, name: &str) -> Result<&mut NodeGroup, OrchestrationError> {
        self.groups
            .iter_mut()
            .find(|group| group.name == name)
            .ok_or_else(|| OrchestrationError::UnknownNodeGroup(name.to_owned()))
    }

    /// every node name, group by group
    pub fn node_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|group| group.nodes.iter().cloned())
            .collect()
    }

    /// Provision every group in insertion order
    #[instrument(skip(self), fields(cluster = %self.config.name, namespace = %self.config.namespace))]
    pub async fn start(&self) -> Result<(), OrchestrationError> {
        if self.config.create_namespace {
            self.provisioner
                .namespaces()
                .create(&self.config.namespace)
                .await?;
        }

        for group in &self.groups {
            self.start_group(group).await?;
        }

        info!(nodes = self.node_names().len(), "cluster started");
        Ok(())
    }

    /// Provision the nodes of one group
    pub async fn start_node_group(&self, name: &str) -> Result<(), OrchestrationError> {
        self.start_group(self.node_group(name)?).await
    }

    async fn start_group(&self, group: &NodeGroup) -> Result<(), OrchestrationError> {
        info!(group = %group.name, nodes = group.nodes.len(), "starting node group");

        let specs = group
            .nodes
            .iter()
            .map(|node| {
                let mut spec = group.node_spec(node, &self.config.namespace)?;
                spec.labels
                    .insert(PART_OF_LABEL.to_owned(), self.config.name.clone());
                Ok(spec)
            })
            .collect::<Result<Vec<_>, OrchestrationError>>()?;

        if self.config.concurrent {
            try_join_all(specs.iter().map(|spec| self.start_node_within(spec))).await?;
        } else {
            for spec in &specs {
                self.start_node_within(spec).await?;
            }
        }

        Ok(())
    }

    async fn start_node_within(&self, spec: &NodeSpec) -> Result<(), OrchestrationError> {
        match timeout(self.config.node_timeout, self.provisioner.start_node(spec)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(node = %spec.name, timeout = ?self.config.node_timeout, "node timed out");
                Err(OrchestrationError::Timeout {
                    node: spec.name.clone(),
                })
            }
        }
    }

    async fn nodes_in_state(
        &self,
        group: &str,
        state: NodeState,
    ) -> Result<Vec<String>, OrchestrationError> {
        let group = self.node_group(group)?;

        let mut nodes = vec![];
        for node in &group.nodes {
            if self
                .provisioner
                .node_state(node, &self.config.namespace)
                .await?
                == state
            {
                nodes.push(node.clone());
            }
        }
        Ok(nodes)
    }

    /// nodes of the group whose workload is fully ready
    pub async fn running_nodes(&self, group: &str) -> Result<Vec<String>, OrchestrationError> {
        self.nodes_in_state(group, NodeState::Running).await
    }

    /// nodes of the group scaled to zero
    pub async fn stopped_nodes(&self, group: &str) -> Result<Vec<String>, OrchestrationError> {
        self.nodes_in_state(group, NodeState::Stopped).await
    }

    /// Remove a node's objects and drop it from its group
    #[instrument(skip(self))]
    pub async fn delete_node(&mut self, group: &str, name: &str) -> Result<(), OrchestrationError> {
        if !self.node_group(group)?.contains(name) {
            return Err(OrchestrationError::UnknownNode(name.to_owned()));
        }

        self.provisioner
            .delete_node(name, &self.config.namespace)
            .await?;
        self.node_group_mut(group)?.remove_node(name);
        Ok(())
    }

    /// Remove every node, last group first, then the namespace if the cluster created it
    #[instrument(skip(self), fields(cluster = %self.config.name))]
    pub async fn delete(&mut self) -> Result<(), OrchestrationError> {
        let groups: Vec<(String, Vec<String>)> = self
            .groups
            .iter()
            .rev()
            .map(|group| (group.name.clone(), group.nodes.clone()))
            .collect();

        for (group, nodes) in groups {
            for node in nodes {
                self.delete_node(&group, &node).await?;
            }
        }

        if self.config.create_namespace {
            self.provisioner
                .namespaces()
                .delete(&self.config.namespace)
                .await?;
        }

        info!("cluster deleted");
        Ok(())
    }
}
