use std::collections::BTreeMap;
use std::collections::HashMap;

use derive_builder::Builder;

use apiary_k8::objects::pod::{ResourceRequirements, Toleration};

use crate::config::NodeConfig;
use crate::defaults::*;
use crate::error::OrchestrationError;

/// Key material supplied for a node; an empty string means the key is absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeKeys {
    pub libp2p: String,
    pub swarm: String,
    pub clef: String,
    pub clef_password: String,
}

impl NodeKeys {
    pub fn swarm(key: impl Into<String>) -> Self {
        Self {
            swarm: key.into(),
            ..Default::default()
        }
    }
}

/// CPU and memory for the bee container; empty values are left unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeResources {
    pub limit_cpu: String,
    pub limit_memory: String,
    pub request_cpu: String,
    pub request_memory: String,
}

impl NodeResources {
    pub(crate) fn requirements(&self) -> Option<ResourceRequirements> {
        fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, String> {
            [("cpu", cpu), ("memory", memory)]
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect()
        }

        let requirements = ResourceRequirements {
            limits: quantities(&self.limit_cpu, &self.limit_memory),
            requests: quantities(&self.request_cpu, &self.request_memory),
        };

        if requirements.limits.is_empty() && requirements.requests.is_empty() {
            None
        } else {
            Some(requirements)
        }
    }
}

/// Host-routed exposure of the API and debug API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngressSettings {
    pub class: String,
    pub host: String,
    pub debug_class: String,
    pub debug_host: String,
    pub annotations: HashMap<String, String>,
    pub debug_annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persistence {
    pub enabled: bool,
    pub storage_class: String,
    pub storage_request: String,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            enabled: false,
            storage_class: String::new(),
            storage_request: STORAGE_REQUEST.to_owned(),
        }
    }
}

/// Description of one bee node, the input of the node provisioner
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(build_fn(private, name = "build_impl"))]
pub struct NodeSpec {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into), default = "DEFAULT_NAMESPACE.to_string()")]
    pub namespace: String,
    #[builder(default)]
    pub config: NodeConfig,
    #[builder(default)]
    pub keys: NodeKeys,
    #[builder(setter(into), default = "BEE_IMAGE.to_string()")]
    pub image: String,
    #[builder(setter(into), default = "IMAGE_PULL_POLICY.to_string()")]
    pub image_pull_policy: String,
    #[builder(default)]
    pub image_pull_secrets: Vec<String>,
    #[builder(setter(into), default = "CLEF_IMAGE.to_string()")]
    pub clef_image: String,
    #[builder(default)]
    pub resources: NodeResources,
    #[builder(default)]
    pub node_selector: BTreeMap<String, String>,
    #[builder(default)]
    pub tolerations: Vec<Toleration>,
    #[builder(default)]
    pub ingress: IngressSettings,
    #[builder(default)]
    pub persistence: Persistence,
    #[builder(setter(into), default = "UPDATE_STRATEGY.to_string()")]
    pub update_strategy: String,
    #[builder(setter(into), default = "POD_MANAGEMENT_POLICY.to_string()")]
    pub pod_management_policy: String,
    /// extra labels put on every object of the node
    #[builder(default)]
    pub labels: HashMap<String, String>,
    /// extra annotations put on every object of the node
    #[builder(default)]
    pub annotations: HashMap<String, String>,
}

impl NodeSpec {
    pub fn builder(name: impl Into<String>) -> NodeSpecBuilder {
        let mut builder = NodeSpecBuilder::default();
        builder.name(name);
        builder
    }
}

impl NodeSpecBuilder {
    pub fn build(&self) -> Result<NodeSpec, OrchestrationError> {
        let spec = self
            .build_impl()
            .map_err(|err| OrchestrationError::Config(err.to_string()))?;
        Ok(spec)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = NodeSpec::builder("bee-0")
            .namespace("swarm")
            .build()
            .expect("build");

        assert_eq!(spec.name, "bee-0");
        assert_eq!(spec.namespace, "swarm");
        assert_eq!(spec.image, BEE_IMAGE);
        assert_eq!(spec.update_strategy, UPDATE_STRATEGY);
        assert!(!spec.persistence.enabled);
        assert_eq!(spec.keys, NodeKeys::default());
    }

    #[test]
    fn test_builder_requires_name() {
        let err = NodeSpecBuilder::default().build().expect_err("no name");
        assert!(matches!(err, OrchestrationError::Config(_)));
    }

    #[test]
    fn test_resources_skip_empty() {
        assert_eq!(NodeResources::default().requirements(), None);

        let resources = NodeResources {
            limit_memory: "2Gi".to_owned(),
            request_cpu: "750m".to_owned(),
            ..Default::default()
        };
        let requirements = resources.requirements().expect("requirements");
        assert_eq!(requirements.limits.len(), 1);
        assert_eq!(requirements.limits.get("memory").map(String::as_str), Some("2Gi"));
        assert_eq!(requirements.requests.get("cpu").map(String::as_str), Some("750m"));
    }
}
