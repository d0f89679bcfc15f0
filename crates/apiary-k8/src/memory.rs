//! In-memory platform used to exercise resource clients without a cluster.
//!
//! Objects are stored per kind as yaml values, keyed by `namespace/name`.
//! Every call is recorded in a journal and failures can be injected per
//! (kind, verb, name).

use std::collections::HashMap;
use std::sync::Arc;

use async_lock::Mutex;
use async_lock::RwLock;
use async_trait::async_trait;
use serde_yaml::Value;
use tracing::debug;

use k8_types::K8Obj;
use k8_types::Spec;

use crate::client::K8Api;
use crate::error::{ApiError, Verb};

fn store_key(name: &str, namespace: &str) -> String {
    format!("{namespace}/{name}")
}

#[derive(Debug, Default)]
struct SpecStore {
    data: RwLock<HashMap<String, Value>>,
}

impl SpecStore {
    async fn get<S: Spec>(&self, key: &str) -> Result<Option<K8Obj<S>>, ApiError> {
        let lock = self.data.read().await;
        let Some(value) = lock.get(key) else {
            return Ok(None);
        };

        let output = value.clone();
        drop(lock);

        Ok(Some(serde_yaml::from_value(output)?))
    }

    async fn insert<S: Spec>(&self, key: String, k8_obj: &K8Obj<S>) -> Result<(), ApiError> {
        let value = serde_yaml::to_value(k8_obj)?;
        self.data.write().await.insert(key, value);
        Ok(())
    }

    /// read and write one entry under a single write lock; `write` decides the stored
    /// object from the live one or rejects the change
    async fn write_with<S, F>(&self, key: String, write: F) -> Result<K8Obj<S>, ApiError>
    where
        S: Spec,
        F: FnOnce(Option<K8Obj<S>>) -> Result<K8Obj<S>, ApiError>,
    {
        let mut lock = self.data.write().await;
        let live: Option<K8Obj<S>> = lock
            .get(&key)
            .cloned()
            .map(serde_yaml::from_value)
            .transpose()?;

        let obj = write(live)?;
        lock.insert(key, serde_yaml::to_value(&obj)?);
        Ok(obj)
    }

    async fn items<S: Spec>(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ApiError> {
        let prefix = format!("{namespace}/");
        let lock = self.data.read().await;
        let mut keys: Vec<&String> = lock.keys().filter(|key| key.starts_with(&prefix)).collect();
        keys.sort();

        let items: Result<Vec<K8Obj<S>>, _> = keys
            .into_iter()
            .filter_map(|key| lock.get(key))
            .map(|value| serde_yaml::from_value(value.clone()))
            .collect();

        Ok(items?)
    }

    async fn remove(&self, key: &str) -> Option<Value> {
        self.data.write().await.remove(key)
    }
}

/// One recorded platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub kind: String,
    pub verb: Verb,
    pub name: String,
    pub namespace: String,
}

/// Error returned by an injected failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    NotFound,
    Conflict,
    Unavailable,
}

impl FailureMode {
    fn to_error(self) -> ApiError {
        match self {
            Self::NotFound => ApiError::NotFound,
            Self::Conflict => ApiError::Conflict("injected conflict".to_owned()),
            Self::Unavailable => ApiError::Unavailable("injected failure".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FailureKey {
    kind: String,
    verb: Verb,
    name: String,
}

#[derive(Debug, Default)]
pub struct MemoryClient {
    data: Mutex<HashMap<String, Arc<SpecStore>>>,
    journal: Mutex<Vec<ApiCall>>,
    failures: Mutex<HashMap<FailureKey, FailureMode>>,
}

impl MemoryClient {
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn get_store<S: Spec>(&self) -> Arc<SpecStore> {
        let kind: String = S::kind();
        let mut stores = self.data.lock().await;
        stores.entry(kind).or_default().clone()
    }

    /// record the call and return the injected failure for it, if any
    async fn enter<S: Spec>(&self, verb: Verb, name: &str, namespace: &str) -> Result<(), ApiError> {
        let kind = S::kind();
        debug!(%kind, %verb, %name, %namespace, "memory call");

        self.journal.lock().await.push(ApiCall {
            kind: kind.clone(),
            verb,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        });

        let key = FailureKey {
            kind,
            verb,
            name: name.to_owned(),
        };
        match self.failures.lock().await.get(&key) {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }

    /// make every `verb` call on the named object of kind `S` fail
    pub async fn fail_on<S: Spec>(&self, verb: Verb, name: &str, mode: FailureMode) {
        self.failures.lock().await.insert(
            FailureKey {
                kind: S::kind(),
                verb,
                name: name.to_owned(),
            },
            mode,
        );
    }

    pub async fn clear_failures(&self) {
        self.failures.lock().await.clear();
    }

    /// every call made so far, in order
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.journal.lock().await.clone()
    }

    /// number of `verb` calls made against kind `S`
    pub async fn count<S: Spec>(&self, verb: Verb) -> usize {
        let kind = S::kind();
        self.journal
            .lock()
            .await
            .iter()
            .filter(|call| call.kind == kind && call.verb == verb)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.journal.lock().await.clear();
    }

    /// store an object as-is, bypassing the journal
    pub async fn seed<S: Spec>(&self, obj: K8Obj<S>) -> Result<(), ApiError> {
        let key = store_key(&obj.metadata.name, &obj.metadata.namespace);
        self.get_store::<S>().await.insert(key, &obj).await
    }

    /// read an object, bypassing the journal
    pub async fn peek<S: Spec>(&self, name: &str, namespace: &str) -> Option<K8Obj<S>> {
        self.get_store::<S>()
            .await
            .get::<S>(&store_key(name, namespace))
            .await
            .ok()
            .flatten()
    }

    /// overwrite the status of a stored object, as a platform controller would
    pub async fn set_status<S: Spec>(
        &self,
        name: &str,
        namespace: &str,
        status: S::Status,
    ) -> Result<(), ApiError> {
        self.get_store::<S>()
            .await
            .write_with::<S, _>(store_key(name, namespace), |live| {
                let mut obj = live.ok_or(ApiError::NotFound)?;
                obj.status = status;
                Ok(obj)
            })
            .await
            .map(|_| ())
    }
}

fn next_version(current: &str) -> String {
    (current.parse::<u64>().unwrap_or_default() + 1).to_string()
}

#[async_trait]
impl K8Api for MemoryClient {
    async fn retrieve<S: Spec>(&self, name: &str, namespace: &str) -> Result<K8Obj<S>, ApiError> {
        self.enter::<S>(Verb::Get, name, namespace).await?;

        self.get_store::<S>()
            .await
            .get::<S>(&store_key(name, namespace))
            .await?
            .ok_or(ApiError::NotFound)
    }

    async fn create<S: Spec>(&self, mut obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        let name = obj.metadata.name.clone();
        let namespace = obj.metadata.namespace.clone();
        self.enter::<S>(Verb::Create, &name, &namespace).await?;

        self.get_store::<S>()
            .await
            .write_with::<S, _>(store_key(&name, &namespace), |live| {
                if live.is_some() {
                    return Err(ApiError::Conflict(format!("{name} already exists")));
                }
                obj.metadata.resource_version = "1".to_owned();
                Ok(obj)
            })
            .await
    }

    async fn update<S: Spec>(&self, mut obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        let name = obj.metadata.name.clone();
        let namespace = obj.metadata.namespace.clone();
        self.enter::<S>(Verb::Update, &name, &namespace).await?;

        self.get_store::<S>()
            .await
            .write_with::<S, _>(store_key(&name, &namespace), |live| {
                let live = live.ok_or(ApiError::NotFound)?;

                let live_version = &live.metadata.resource_version;
                if !obj.metadata.resource_version.is_empty()
                    && &obj.metadata.resource_version != live_version
                {
                    return Err(ApiError::Conflict(format!(
                        "{name} has version {live_version}, update carried {}",
                        obj.metadata.resource_version
                    )));
                }

                obj.metadata.resource_version = next_version(live_version);
                obj.status = live.status;
                Ok(obj)
            })
            .await
    }

    async fn delete<S: Spec>(&self, name: &str, namespace: &str) -> Result<(), ApiError> {
        self.enter::<S>(Verb::Delete, name, namespace).await?;

        self.get_store::<S>()
            .await
            .remove(&store_key(name, namespace))
            .await
            .map(|_| ())
            .ok_or(ApiError::NotFound)
    }

    async fn list<S: Spec>(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ApiError> {
        self.enter::<S>(Verb::List, "", namespace).await?;

        self.get_store::<S>().await.items::<S>(namespace).await
    }
}

#[cfg(test)]
mod test {

    use crate::objects::DesiredObject;
    use crate::objects::config_map::{ConfigMapOptions, ConfigMapSpec};

    use super::*;

    fn config_map(name: &str) -> K8Obj<ConfigMapSpec> {
        ConfigMapOptions::default().into_object(name, "swarm")
    }

    #[fluvio_future::test]
    async fn test_memory_client_versions() {
        let client = MemoryClient::new_shared();

        let created = client.create(config_map("bee-0")).await.expect("create");
        assert_eq!(created.metadata.resource_version, "1");

        let err = client
            .create(config_map("bee-0"))
            .await
            .expect_err("duplicate create");
        assert!(matches!(err, ApiError::Conflict(_)));

        let updated = client.update(config_map("bee-0")).await.expect("update");
        assert_eq!(updated.metadata.resource_version, "2");

        // stale version is rejected
        let mut stale = config_map("bee-0");
        stale.metadata.resource_version = "1".to_owned();
        let err = client.update(stale).await.expect_err("stale update");
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = client
            .update(config_map("bee-1"))
            .await
            .expect_err("missing update");
        assert!(err.is_not_found());

        assert_eq!(client.count::<ConfigMapSpec>(Verb::Update).await, 3);
        assert_eq!(client.count::<ConfigMapSpec>(Verb::Create).await, 2);
    }

    #[fluvio_future::test]
    async fn test_concurrent_creates_admit_one() {
        let client = MemoryClient::new_shared();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let client = client.clone();
                fluvio_future::task::spawn_task(async move {
                    client.create(config_map("bee-0")).await
                })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await {
                Ok(_) => created += 1,
                Err(ApiError::Conflict(_)) => conflicts += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
        let live = client
            .peek::<ConfigMapSpec>("bee-0", "swarm")
            .await
            .expect("stored");
        assert_eq!(live.metadata.resource_version, "1");
    }

    #[fluvio_future::test]
    async fn test_concurrent_updates_with_same_version_admit_one() {
        let client = MemoryClient::new_shared();
        client.create(config_map("bee-0")).await.expect("create");

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let client = client.clone();
                fluvio_future::task::spawn_task(async move {
                    let mut obj = config_map("bee-0");
                    obj.metadata.resource_version = "1".to_owned();
                    client.update(obj).await
                })
            })
            .collect();

        let mut updated = 0;
        for task in tasks {
            if task.await.is_ok() {
                updated += 1;
            }
        }

        assert_eq!(updated, 1);
        let live = client
            .peek::<ConfigMapSpec>("bee-0", "swarm")
            .await
            .expect("stored");
        assert_eq!(live.metadata.resource_version, "2");
    }

    #[fluvio_future::test]
    async fn test_memory_client_list_and_delete() {
        let client = MemoryClient::new_shared();
        client.create(config_map("bee-1")).await.expect("create");
        client.create(config_map("bee-0")).await.expect("create");
        client
            .create(ConfigMapOptions::default().into_object("bee-0", "other"))
            .await
            .expect("create");

        let items = client.list::<ConfigMapSpec>("swarm").await.expect("list");
        let names: Vec<&str> = items.iter().map(|obj| obj.metadata.name.as_str()).collect();
        assert_eq!(names, vec!["bee-0", "bee-1"]);

        client
            .delete::<ConfigMapSpec>("bee-0", "swarm")
            .await
            .expect("delete");
        let err = client
            .delete::<ConfigMapSpec>("bee-0", "swarm")
            .await
            .expect_err("second delete");
        assert!(err.is_not_found());
        assert!(client.peek::<ConfigMapSpec>("bee-0", "other").await.is_some());
    }

    #[fluvio_future::test]
    async fn test_memory_client_injected_failure() {
        let client = MemoryClient::new_shared();
        client
            .fail_on::<ConfigMapSpec>(Verb::Create, "bee-0", FailureMode::Unavailable)
            .await;

        let err = client
            .create(config_map("bee-0"))
            .await
            .expect_err("injected");
        assert!(matches!(err, ApiError::Unavailable(_)));
        assert!(client.peek::<ConfigMapSpec>("bee-0", "swarm").await.is_none());

        client.clear_failures().await;
        client.create(config_map("bee-0")).await.expect("create");

        let calls = client.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].verb, Verb::Create);
        assert_eq!(calls[0].name, "bee-0");
    }
}
