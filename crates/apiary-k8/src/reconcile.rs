//! Generic converge algorithm shared by all resource kinds.

use std::marker::PhantomData;

use tracing::{debug, instrument};

use k8_types::K8Obj;

use crate::client::K8Api;
use crate::error::{ApiError, ResourceError, Verb};
use crate::identity::ClientIdentity;
use crate::objects::config_map::ConfigMapSpec;
use crate::objects::ingress::IngressSpec;
use crate::objects::secret::SecretSpec;
use crate::objects::service::ServiceSpec;
use crate::objects::service_account::ServiceAccountSpec;
use crate::objects::statefulset::StatefulSetSpec;
use crate::objects::{DesiredObject, ObjectKind, Upsert};

pub type ConfigMapClient<C> = ResourceClient<C, ConfigMapSpec>;
pub type SecretClient<C> = ResourceClient<C, SecretSpec>;
pub type ServiceAccountClient<C> = ResourceClient<C, ServiceAccountSpec>;
pub type ServiceClient<C> = ResourceClient<C, ServiceSpec>;
pub type IngressClient<C> = ResourceClient<C, IngressSpec>;
pub type StatefulSetClient<C> = ResourceClient<C, StatefulSetSpec>;

/// Converges and deletes objects of one kind.
///
/// `set` issues at most two platform calls and `delete` exactly one.
pub struct ResourceClient<C, S> {
    client: C,
    identity: ClientIdentity,
    kind: PhantomData<fn() -> S>,
}

impl<C: Clone, S> Clone for ResourceClient<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            identity: self.identity.clone(),
            kind: PhantomData,
        }
    }
}

impl<C, S> ResourceClient<C, S>
where
    C: K8Api,
    S: ObjectKind,
{
    pub fn new(client: C, identity: ClientIdentity) -> Self {
        Self {
            client,
            identity,
            kind: PhantomData,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Make the live object match `options`, creating it if absent.
    /// Returns the object as reported back by the platform.
    #[instrument(skip(self, options), fields(kind = S::LABEL))]
    pub async fn set<D>(
        &self,
        name: &str,
        namespace: &str,
        options: D,
    ) -> Result<K8Obj<S>, ResourceError>
    where
        D: DesiredObject<Kind = S>,
    {
        let mut desired = options.into_object(name, namespace);
        self.identity.stamp(&mut desired);

        match S::UPSERT {
            Upsert::UpdateFirst => self.update_or_create(desired).await,
            Upsert::FetchFirst => self.fetch_then_update(desired).await,
        }
    }

    async fn update_or_create(&self, desired: K8Obj<S>) -> Result<K8Obj<S>, ResourceError> {
        match self.client.update(desired.clone()).await {
            Ok(live) => {
                debug!(name = %live.metadata.name, "updated");
                Ok(live)
            }
            Err(err) if err.is_not_found() => self.create(desired).await,
            Err(err) => Err(self.error(Verb::Update, &desired, err)),
        }
    }

    async fn fetch_then_update(&self, mut desired: K8Obj<S>) -> Result<K8Obj<S>, ResourceError> {
        let name = desired.metadata.name.clone();
        let namespace = desired.metadata.namespace.clone();

        match self.client.retrieve::<S>(&name, &namespace).await {
            Ok(live) => {
                S::prepare_update(&mut desired, &live);
                match self.client.update(desired.clone()).await {
                    Ok(live) => {
                        debug!(%name, "updated");
                        Ok(live)
                    }
                    Err(err) => Err(self.error(Verb::Update, &desired, err)),
                }
            }
            Err(err) if err.is_not_found() => self.create(desired).await,
            Err(err) => Err(self.error(Verb::Get, &desired, err)),
        }
    }

    async fn create(&self, desired: K8Obj<S>) -> Result<K8Obj<S>, ResourceError> {
        match self.client.create(desired.clone()).await {
            Ok(live) => {
                debug!(name = %live.metadata.name, "created");
                Ok(live)
            }
            Err(err) => Err(self.error(Verb::Create, &desired, err)),
        }
    }

    /// Delete the object; a missing object counts as deleted.
    #[instrument(skip(self), fields(kind = S::LABEL))]
    pub async fn delete(&self, name: &str, namespace: &str) -> Result<(), ResourceError> {
        match self.client.delete::<S>(name, namespace).await {
            Ok(()) => {
                debug!("deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!("already gone");
                Ok(())
            }
            Err(err) => Err(ResourceError::new(Verb::Delete, S::LABEL, name, namespace, err)),
        }
    }

    /// Fetch the live object, `None` if it does not exist
    pub async fn get(&self, name: &str, namespace: &str) -> Result<Option<K8Obj<S>>, ResourceError> {
        match self.client.retrieve::<S>(name, namespace).await {
            Ok(live) => Ok(Some(live)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(ResourceError::new(Verb::Get, S::LABEL, name, namespace, err)),
        }
    }

    pub async fn list(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ResourceError> {
        self.client
            .list::<S>(namespace)
            .await
            .map_err(|err| ResourceError::new(Verb::List, S::LABEL, "", namespace, err))
    }

    fn error(&self, verb: Verb, obj: &K8Obj<S>, source: ApiError) -> ResourceError {
        ResourceError::new(
            verb,
            S::LABEL,
            obj.metadata.name.as_str(),
            obj.metadata.namespace.as_str(),
            source,
        )
    }
}

#[cfg(test)]
mod test {

    use std::sync::Arc;

    use crate::identity::{CREATED_BY_ANNOTATION, MANAGED_BY_LABEL};
    use crate::memory::{FailureMode, MemoryClient};
    use crate::objects::DesiredObject;
    use crate::objects::config_map::ConfigMapOptions;
    use crate::objects::service::{ServiceOptions, ServicePort, ServiceSpec as Svc};

    use super::*;

    fn identity() -> ClientIdentity {
        ClientIdentity::new("beekeeper", "0.1.0")
    }

    fn config_options(value: &str) -> ConfigMapOptions {
        let mut options = ConfigMapOptions::default();
        options.data.insert(".bee.yaml".to_owned(), value.to_owned());
        options
    }

    fn service_options() -> ServiceOptions {
        ServiceOptions {
            spec: Svc {
                ports: vec![ServicePort::named("api", 1633)],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[fluvio_future::test]
    async fn test_set_is_idempotent() {
        let memory = MemoryClient::new_shared();
        let client: ConfigMapClient<Arc<MemoryClient>> =
            ResourceClient::new(memory.clone(), identity());

        let first = client
            .set("bee-0", "swarm", config_options("api-addr: :1633"))
            .await
            .expect("first set");
        let second = client
            .set("bee-0", "swarm", config_options("api-addr: :1633"))
            .await
            .expect("second set");

        assert_eq!(first.header.data, second.header.data);
        assert_eq!(memory.count::<ConfigMapSpec>(Verb::Create).await, 1);
        // first update misses, second one lands
        assert_eq!(memory.count::<ConfigMapSpec>(Verb::Update).await, 2);

        let live = memory
            .peek::<ConfigMapSpec>("bee-0", "swarm")
            .await
            .expect("stored");
        assert_eq!(live.metadata.resource_version, "2");
        assert_eq!(
            live.metadata.annotations.get(CREATED_BY_ANNOTATION).map(String::as_str),
            Some("beekeeper:0.1.0")
        );
        assert_eq!(
            live.metadata.labels.get(MANAGED_BY_LABEL).map(String::as_str),
            Some("beekeeper")
        );
    }

    #[fluvio_future::test]
    async fn test_set_replaces_content() {
        let memory = MemoryClient::new_shared();
        let client = ConfigMapClient::new(memory.clone(), identity());

        client
            .set("bee-0", "swarm", config_options("verbosity: 1"))
            .await
            .expect("set");
        let live = client
            .set("bee-0", "swarm", config_options("verbosity: 5"))
            .await
            .expect("set");

        assert_eq!(
            live.header.data.get(".bee.yaml").map(String::as_str),
            Some("verbosity: 5")
        );
    }

    #[fluvio_future::test]
    async fn test_service_update_carries_live_fields() {
        let memory = MemoryClient::new_shared();
        let mut live = service_options().into_object("bee-0", "swarm");
        live.spec.cluster_ip = Some("10.0.0.5".to_owned());
        live.metadata.resource_version = "42".to_owned();
        memory.seed(live).await.expect("seed");

        let client = ServiceClient::new(memory.clone(), identity());
        let updated = client
            .set("bee-0", "swarm", service_options())
            .await
            .expect("set");

        assert_eq!(updated.spec.cluster_ip.as_deref(), Some("10.0.0.5"));
        // the update was accepted against version 42
        assert_eq!(updated.metadata.resource_version, "43");

        let calls = memory.calls().await;
        let verbs: Vec<Verb> = calls.iter().map(|call| call.verb).collect();
        assert_eq!(verbs, vec![Verb::Get, Verb::Update]);
    }

    #[fluvio_future::test]
    async fn test_service_created_when_missing() {
        let memory = MemoryClient::new_shared();
        let client = ServiceClient::new(memory.clone(), identity());

        client
            .set("bee-0", "swarm", service_options())
            .await
            .expect("set");

        assert_eq!(memory.count::<Svc>(Verb::Get).await, 1);
        assert_eq!(memory.count::<Svc>(Verb::Create).await, 1);
        assert_eq!(memory.count::<Svc>(Verb::Update).await, 0);
    }

    #[fluvio_future::test]
    async fn test_service_get_error() {
        let memory = MemoryClient::new_shared();
        memory
            .fail_on::<Svc>(Verb::Get, "bee-0", FailureMode::Unavailable)
            .await;
        let client = ServiceClient::new(memory.clone(), identity());

        let err = client
            .set("bee-0", "swarm", service_options())
            .await
            .expect_err("get fails");
        assert_eq!(
            err.to_string(),
            "getting service bee-0 in namespace swarm: unavailable: injected failure"
        );
        assert_eq!(memory.calls().await.len(), 1);
    }

    #[fluvio_future::test]
    async fn test_update_error_does_not_create() {
        let memory = MemoryClient::new_shared();
        memory
            .fail_on::<ConfigMapSpec>(Verb::Update, "bee-0", FailureMode::Unavailable)
            .await;
        let client = ConfigMapClient::new(memory.clone(), identity());

        let err = client
            .set("bee-0", "swarm", config_options(""))
            .await
            .expect_err("update fails");
        assert_eq!(err.verb, Verb::Update);
        assert!(err.to_string().starts_with("updating configmap bee-0 in namespace swarm"));
        assert_eq!(memory.count::<ConfigMapSpec>(Verb::Create).await, 0);
    }

    #[fluvio_future::test]
    async fn test_create_error() {
        let memory = MemoryClient::new_shared();
        memory
            .fail_on::<ConfigMapSpec>(Verb::Create, "bee-0", FailureMode::Conflict)
            .await;
        let client = ConfigMapClient::new(memory.clone(), identity());

        let err = client
            .set("bee-0", "swarm", config_options(""))
            .await
            .expect_err("create fails");
        assert_eq!(
            err.to_string(),
            "creating configmap bee-0 in namespace swarm: conflict: injected conflict"
        );
    }

    #[fluvio_future::test]
    async fn test_delete_missing_is_ok() {
        let memory = MemoryClient::new_shared();
        let client = ConfigMapClient::new(memory.clone(), identity());

        client.delete("bee-0", "swarm").await.expect("delete");
        assert_eq!(memory.count::<ConfigMapSpec>(Verb::Delete).await, 1);

        memory
            .fail_on::<ConfigMapSpec>(Verb::Delete, "bee-0", FailureMode::Unavailable)
            .await;
        let err = client.delete("bee-0", "swarm").await.expect_err("fails");
        assert_eq!(err.verb, Verb::Delete);
    }

    #[fluvio_future::test]
    async fn test_get_and_list() {
        let memory = MemoryClient::new_shared();
        let client = ConfigMapClient::new(memory.clone(), identity());

        assert!(client.get("bee-0", "swarm").await.expect("get").is_none());

        client
            .set("bee-0", "swarm", config_options(""))
            .await
            .expect("set");
        client
            .set("bee-1", "swarm", config_options(""))
            .await
            .expect("set");

        assert!(client.get("bee-0", "swarm").await.expect("get").is_some());
        assert_eq!(client.list("swarm").await.expect("list").len(), 2);
    }
}
