//! Stands up, scales and tears down one bee node.

use derive_builder::Builder;
use tracing::{debug, info, instrument};

use apiary_k8::objects::ObjectLabels;
use apiary_k8::objects::statefulset::{StatefulSetOptions, StatefulSetSpec};
use apiary_k8::{
    ClientIdentity, ConfigMapClient, IngressClient, K8Api, NamespaceClient, SecretClient,
    ServiceAccountClient, ServiceClient, StatefulSetClient,
};
use apiary_k8::k8_types::K8Obj;

use crate::error::OrchestrationError;
use crate::port::NodePorts;
use crate::spec::NodeSpec;
use crate::translate::{self, NodeNames};

/// Settings shared by every node a provisioner touches
#[derive(Builder, Debug, Clone, Default)]
#[builder(build_fn(private, name = "build_impl"))]
pub struct ProvisionerConfig {
    /// provenance stamped on every object written
    #[builder(default)]
    pub identity: ClientIdentity,
}

impl ProvisionerConfig {
    pub fn builder() -> ProvisionerConfigBuilder {
        ProvisionerConfigBuilder::default()
    }
}

impl ProvisionerConfigBuilder {
    pub fn build(&self) -> Result<ProvisionerConfig, OrchestrationError> {
        let config = self
            .build_impl()
            .map_err(|err| OrchestrationError::Config(err.to_string()))?;
        Ok(config)
    }
}

/// Observed state of a node, read from its statefulset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// every desired replica is ready
    Running,
    /// scaled to zero
    Stopped,
    /// scaled up but not all replicas ready yet
    Starting,
    /// no statefulset exists
    Missing,
}

impl NodeState {
    fn from_statefulset(live: &K8Obj<StatefulSetSpec>) -> Self {
        let desired = live.spec.replicas.unwrap_or(1);
        if desired == 0 {
            return Self::Stopped;
        }

        let ready = live.status.ready_replicas.unwrap_or_default();
        if ready >= desired {
            Self::Running
        } else {
            Self::Starting
        }
    }
}

/// Converges the full set of objects backing a node.
///
/// Steps run one after another and stop at the first failure; nothing is rolled
/// back and a later call re-converges whatever was left behind.
#[derive(Clone)]
pub struct NodeProvisioner<C> {
    config_maps: ConfigMapClient<C>,
    secrets: SecretClient<C>,
    service_accounts: ServiceAccountClient<C>,
    services: ServiceClient<C>,
    ingresses: IngressClient<C>,
    statefulsets: StatefulSetClient<C>,
    namespaces: NamespaceClient<C>,
}

impl<C> NodeProvisioner<C>
where
    C: K8Api + Clone,
{
    pub fn new(client: C, config: ProvisionerConfig) -> Self {
        let identity = config.identity;
        Self {
            config_maps: ConfigMapClient::new(client.clone(), identity.clone()),
            secrets: SecretClient::new(client.clone(), identity.clone()),
            service_accounts: ServiceAccountClient::new(client.clone(), identity.clone()),
            services: ServiceClient::new(client.clone(), identity.clone()),
            ingresses: IngressClient::new(client.clone(), identity.clone()),
            statefulsets: StatefulSetClient::new(client.clone(), identity.clone()),
            namespaces: NamespaceClient::new(client, identity),
        }
    }

    pub fn namespaces(&self) -> &NamespaceClient<C> {
        &self.namespaces
    }

    /// Create or update every object of the node
    #[instrument(skip(self, spec), fields(node = %spec.name, namespace = %spec.namespace))]
    pub async fn start_node(&self, spec: &NodeSpec) -> Result<(), OrchestrationError> {
        let ports = NodePorts::derive(&spec.config)?;
        let rendered = spec.config.render()?;
        let names = NodeNames::new(&spec.name);
        let ns = spec.namespace.as_str();
        debug!(?ports, "derived ports");

        self.config_maps
            .set(&names.config_map, ns, translate::config_map(spec, rendered))
            .await?;

        self.secrets
            .set(&names.keys_secret, ns, translate::keys_secret(spec))
            .await?;
        if let Some(clef) = translate::clef_secret(spec) {
            self.secrets.set(&names.clef_secret, ns, clef).await?;
        }

        self.service_accounts
            .set(&names.service_account, ns, translate::service_account(spec))
            .await?;

        self.services
            .set(&names.api_service, ns, translate::api_service(spec, &ports))
            .await?;
        self.services
            .set(&names.debug_service, ns, translate::debug_service(spec, &ports))
            .await?;
        self.services
            .set(&names.p2p_service, ns, translate::p2p_service(spec, &ports))
            .await?;
        self.services
            .set(&names.headless_service, ns, translate::headless_service(spec, &ports))
            .await?;

        self.ingresses
            .set(&names.api_ingress, ns, translate::api_ingress(spec))
            .await?;
        self.ingresses
            .set(&names.debug_ingress, ns, translate::debug_ingress(spec))
            .await?;

        self.statefulsets
            .set(&names.statefulset, ns, translate::statefulset(spec, &ports))
            .await?;

        info!("node started");
        Ok(())
    }

    /// Delete every object of the node, workload first
    #[instrument(skip(self))]
    pub async fn delete_node(&self, name: &str, namespace: &str) -> Result<(), OrchestrationError> {
        let names = NodeNames::new(name);

        self.statefulsets.delete(&names.statefulset, namespace).await?;
        self.ingresses.delete(&names.debug_ingress, namespace).await?;
        self.ingresses.delete(&names.api_ingress, namespace).await?;
        self.services.delete(&names.headless_service, namespace).await?;
        self.services.delete(&names.p2p_service, namespace).await?;
        self.services.delete(&names.debug_service, namespace).await?;
        self.services.delete(&names.api_service, namespace).await?;
        self.service_accounts
            .delete(&names.service_account, namespace)
            .await?;
        self.secrets.delete(&names.clef_secret, namespace).await?;
        self.secrets.delete(&names.keys_secret, namespace).await?;
        self.config_maps.delete(&names.config_map, namespace).await?;

        info!("node deleted");
        Ok(())
    }

    /// Scale the node's workload to zero
    #[instrument(skip(self))]
    pub async fn stop_node(&self, name: &str, namespace: &str) -> Result<(), OrchestrationError> {
        self.scale(name, namespace, 0).await?;
        info!("node stopped");
        Ok(())
    }

    /// Scale a stopped node back to one replica
    #[instrument(skip(self))]
    pub async fn resume_node(&self, name: &str, namespace: &str) -> Result<(), OrchestrationError> {
        self.scale(name, namespace, 1).await?;
        info!("node resumed");
        Ok(())
    }

    async fn scale(
        &self,
        name: &str,
        namespace: &str,
        replicas: i32,
    ) -> Result<K8Obj<StatefulSetSpec>, OrchestrationError> {
        let names = NodeNames::new(name);
        let live = self
            .statefulsets
            .get(&names.statefulset, namespace)
            .await?
            .ok_or_else(|| OrchestrationError::NodeMissing {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            })?;

        let mut spec = live.spec;
        spec.replicas = Some(replicas);
        let options = StatefulSetOptions {
            meta: ObjectLabels::new(live.metadata.labels)
                .with_annotations(live.metadata.annotations),
            spec,
        };

        debug!(replicas, "scaling");
        Ok(self
            .statefulsets
            .set(&names.statefulset, namespace, options)
            .await?)
    }

    /// Read the node state from the live statefulset
    pub async fn node_state(&self, name: &str, namespace: &str) -> Result<NodeState, OrchestrationError> {
        let names = NodeNames::new(name);
        let state = match self.statefulsets.get(&names.statefulset, namespace).await? {
            Some(live) => NodeState::from_statefulset(&live),
            None => NodeState::Missing,
        };
        Ok(state)
    }
}

#[cfg(test)]
mod test {

    use std::sync::Arc;

    use apiary_k8::objects::config_map::ConfigMapSpec;
    use apiary_k8::objects::ingress::IngressSpec;
    use apiary_k8::objects::secret::SecretSpec;
    use apiary_k8::objects::service::ServiceSpec;
    use apiary_k8::objects::service_account::ServiceAccountSpec;
    use apiary_k8::objects::statefulset::StatefulSetStatus;
    use apiary_k8::{ApiCall, FailureMode, MemoryClient, Verb};
    use apiary_k8::k8_types::Spec;

    use crate::spec::NodeKeys;

    use super::*;

    fn provisioner(memory: &Arc<MemoryClient>) -> NodeProvisioner<Arc<MemoryClient>> {
        let config = ProvisionerConfig::builder()
            .identity(ClientIdentity::new("beekeeper", "0.1.0"))
            .build()
            .expect("config");
        NodeProvisioner::new(memory.clone(), config)
    }

    fn clef_node() -> NodeSpec {
        NodeSpec::builder("bee-0")
            .namespace("swarm")
            .keys(NodeKeys {
                swarm: "swarm-key".to_owned(),
                clef: "clef-key".to_owned(),
                clef_password: "secret".to_owned(),
                ..Default::default()
            })
            .build()
            .expect("spec")
    }

    fn kinds(calls: &[ApiCall]) -> Vec<&str> {
        calls.iter().map(|call| call.kind.as_str()).collect()
    }

    #[fluvio_future::test]
    async fn test_start_node_creates_everything() {
        let memory = MemoryClient::new_shared();
        provisioner(&memory)
            .start_node(&clef_node())
            .await
            .expect("start");

        assert_eq!(memory.count::<ConfigMapSpec>(Verb::Create).await, 1);
        assert_eq!(memory.count::<SecretSpec>(Verb::Create).await, 2);
        assert_eq!(memory.count::<ServiceAccountSpec>(Verb::Create).await, 1);
        assert_eq!(memory.count::<ServiceSpec>(Verb::Create).await, 4);
        assert_eq!(memory.count::<IngressSpec>(Verb::Create).await, 2);
        assert_eq!(memory.count::<StatefulSetSpec>(Verb::Create).await, 1);

        for name in ["bee-0", "bee-0-debug", "bee-0-p2p", "bee-0-headless"] {
            assert!(memory.peek::<ServiceSpec>(name, "swarm").await.is_some(), "{name}");
        }
        assert!(memory.peek::<SecretSpec>("bee-0-clef", "swarm").await.is_some());
    }

    #[fluvio_future::test]
    async fn test_start_node_stops_at_first_failure() {
        let memory = MemoryClient::new_shared();
        memory
            .fail_on::<SecretSpec>(Verb::Update, "bee-0-clef", FailureMode::Unavailable)
            .await;

        let err = provisioner(&memory)
            .start_node(&clef_node())
            .await
            .expect_err("clef secret fails");
        let message = err.to_string();
        assert!(message.contains("updating secret bee-0-clef in namespace swarm"), "{message}");

        let calls = memory.calls().await;
        let seen = kinds(&calls);
        assert!(seen.contains(&ConfigMapSpec::kind().as_str()));
        for later in [
            ServiceAccountSpec::kind(),
            ServiceSpec::kind(),
            IngressSpec::kind(),
            StatefulSetSpec::kind(),
        ] {
            assert!(!seen.contains(&later.as_str()), "{later} was called");
        }
    }

    #[fluvio_future::test]
    async fn test_bad_port_fails_before_any_call() {
        let memory = MemoryClient::new_shared();
        let mut spec = clef_node();
        spec.config.p2p_addr = "invalid".to_owned();

        let err = provisioner(&memory)
            .start_node(&spec)
            .await
            .expect_err("bad port");
        assert!(matches!(err, OrchestrationError::Port(_)));
        assert!(memory.calls().await.is_empty());
    }

    #[fluvio_future::test]
    async fn test_delete_node_reverse_order() {
        let memory = MemoryClient::new_shared();
        let provisioner = provisioner(&memory);
        provisioner.start_node(&clef_node()).await.expect("start");
        memory.clear_calls().await;

        provisioner
            .delete_node("bee-0", "swarm")
            .await
            .expect("delete");

        let calls = memory.calls().await;
        assert!(calls.iter().all(|call| call.verb == Verb::Delete));
        let order: Vec<(&str, &str)> = calls
            .iter()
            .map(|call| (call.kind.as_str(), call.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("StatefulSet", "bee-0"),
                ("Ingress", "bee-0-debug"),
                ("Ingress", "bee-0"),
                ("Service", "bee-0-headless"),
                ("Service", "bee-0-p2p"),
                ("Service", "bee-0-debug"),
                ("Service", "bee-0"),
                ("ServiceAccount", "bee-0"),
                ("Secret", "bee-0-clef"),
                ("Secret", "bee-0-keys"),
                ("ConfigMap", "bee-0"),
            ]
        );
        assert!(memory.peek::<StatefulSetSpec>("bee-0", "swarm").await.is_none());

        // nothing left, still fine
        provisioner
            .delete_node("bee-0", "swarm")
            .await
            .expect("delete again");
    }

    #[fluvio_future::test]
    async fn test_stop_and_resume() {
        let memory = MemoryClient::new_shared();
        let provisioner = provisioner(&memory);
        provisioner.start_node(&clef_node()).await.expect("start");

        assert_eq!(
            provisioner.node_state("bee-0", "swarm").await.expect("state"),
            NodeState::Starting
        );

        memory
            .set_status::<StatefulSetSpec>(
                "bee-0",
                "swarm",
                StatefulSetStatus {
                    replicas: 1,
                    ready_replicas: Some(1),
                    ..Default::default()
                },
            )
            .await
            .expect("status");
        assert_eq!(
            provisioner.node_state("bee-0", "swarm").await.expect("state"),
            NodeState::Running
        );

        provisioner.stop_node("bee-0", "swarm").await.expect("stop");
        let live = memory
            .peek::<StatefulSetSpec>("bee-0", "swarm")
            .await
            .expect("statefulset");
        assert_eq!(live.spec.replicas, Some(0));
        assert_eq!(live.spec.service_name, "bee-0-headless");
        assert_eq!(
            provisioner.node_state("bee-0", "swarm").await.expect("state"),
            NodeState::Stopped
        );

        provisioner.resume_node("bee-0", "swarm").await.expect("resume");
        let live = memory
            .peek::<StatefulSetSpec>("bee-0", "swarm")
            .await
            .expect("statefulset");
        assert_eq!(live.spec.replicas, Some(1));
    }

    #[fluvio_future::test]
    async fn test_missing_node() {
        let memory = MemoryClient::new_shared();
        let provisioner = provisioner(&memory);

        assert_eq!(
            provisioner.node_state("bee-9", "swarm").await.expect("state"),
            NodeState::Missing
        );
        let err = provisioner
            .stop_node("bee-9", "swarm")
            .await
            .expect_err("missing");
        assert!(matches!(err, OrchestrationError::NodeMissing { .. }));
    }
}
