use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;
use tracing::trace;

use k8_client::K8Client;
use k8_config::K8Config;
use k8_client::meta_client::MetadataClient;
use k8_client::meta_client::PatchMergeType;
use k8_types::InputObjectMeta;
use k8_types::K8Obj;
use k8_types::Spec;

use crate::error::ApiError;

/// Calls the provisioning layer makes against the orchestration platform.
///
/// Implemented by the real Kubernetes client and by [`MemoryClient`](crate::MemoryClient).
/// Cluster-scoped kinds use an empty namespace.
#[async_trait]
pub trait K8Api: Send + Sync {
    async fn retrieve<S: Spec>(&self, name: &str, namespace: &str) -> Result<K8Obj<S>, ApiError>;

    async fn create<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError>;

    /// write the object over the existing one, fails with `NotFound` if absent
    async fn update<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError>;

    async fn delete<S: Spec>(&self, name: &str, namespace: &str) -> Result<(), ApiError>;

    async fn list<S: Spec>(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ApiError>;
}

#[async_trait]
impl<T: K8Api> K8Api for Arc<T> {
    async fn retrieve<S: Spec>(&self, name: &str, namespace: &str) -> Result<K8Obj<S>, ApiError> {
        self.as_ref().retrieve::<S>(name, namespace).await
    }

    async fn create<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        self.as_ref().create(obj).await
    }

    async fn update<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        self.as_ref().update(obj).await
    }

    async fn delete<S: Spec>(&self, name: &str, namespace: &str) -> Result<(), ApiError> {
        self.as_ref().delete::<S>(name, namespace).await
    }

    async fn list<S: Spec>(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ApiError> {
        self.as_ref().list::<S>(namespace).await
    }
}

#[async_trait]
impl K8Api for K8Client {
    async fn retrieve<S: Spec>(&self, name: &str, namespace: &str) -> Result<K8Obj<S>, ApiError> {
        let meta = InputObjectMeta::named(name, namespace);
        self.retrieve_item::<S, _>(&meta)
            .await?
            .ok_or(ApiError::NotFound)
    }

    async fn create<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        Ok(self.create_item(obj.as_input()).await?)
    }

    async fn update<S: Spec>(&self, obj: K8Obj<S>) -> Result<K8Obj<S>, ApiError> {
        let patch = update_patch(&obj)?;
        trace!(%patch, "update patch");
        Ok(self
            .patch::<S, _>(&obj.metadata.as_input(), &patch, PatchMergeType::Json)
            .await?)
    }

    async fn delete<S: Spec>(&self, name: &str, namespace: &str) -> Result<(), ApiError> {
        let meta = InputObjectMeta::named(name, namespace);
        self.delete_item_with_option::<S, _>(&meta, None).await?;
        Ok(())
    }

    async fn list<S: Spec>(&self, namespace: &str) -> Result<Vec<K8Obj<S>>, ApiError> {
        Ok(self.retrieve_items::<S, _>(namespace).await?.items)
    }
}

/// Connect with credentials from `$KUBECONFIG`, `~/.kube/config` or the pod environment
pub fn connect() -> Result<Arc<K8Client>, ApiError> {
    let config = K8Config::load()?;
    Ok(Arc::new(K8Client::new(config)?))
}

/// JSON patch (RFC 6902) replacing the caller-owned parts of an object.
///
/// Every top-level field except status is replaced whole, so entries dropped from a
/// map disappear on the platform. A non-empty resource version becomes a `test` op
/// and a stale write fails.
fn update_patch<S: Spec>(obj: &K8Obj<S>) -> Result<Value, serde_json::Error> {
    let mut ops = Vec::new();

    if !obj.metadata.resource_version.is_empty() {
        ops.push(json!({
            "op": "test",
            "path": "/metadata/resourceVersion",
            "value": obj.metadata.resource_version,
        }));
    }
    ops.push(json!({
        "op": "add",
        "path": "/metadata/labels",
        "value": obj.metadata.labels,
    }));
    ops.push(json!({
        "op": "add",
        "path": "/metadata/annotations",
        "value": obj.metadata.annotations,
    }));

    if let Value::Object(fields) = serde_json::to_value(obj)? {
        for (field, value) in fields {
            match field.as_str() {
                "apiVersion" | "kind" | "metadata" | "status" => continue,
                // configmaps and secrets carry no spec
                "spec" if value.as_object().is_some_and(|spec| spec.is_empty()) => continue,
                _ => {}
            }
            ops.push(json!({
                "op": "add",
                "path": format!("/{}", pointer_token(&field)),
                "value": value,
            }));
        }
    }

    Ok(Value::Array(ops))
}

fn pointer_token(field: &str) -> String {
    field.replace('~', "~0").replace('/', "~1")
}
