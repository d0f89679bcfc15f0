//! Platform object kinds managed by apiary.
//!
//! Each kind is a `k8_types::Spec` with its own `Crd` so that the same
//! `K8Obj<S>` envelope flows through the real client and the in-memory
//! platform alike.

pub mod config_map;
pub mod ingress;
pub mod namespace;
pub mod pod;
pub mod secret;
pub mod service;
pub mod service_account;
pub mod statefulset;

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use k8_types::K8Obj;
use k8_types::Spec;

/// How the generic reconcile algorithm converges a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// write directly, create on not-found
    UpdateFirst,
    /// read the live object first, carry platform-assigned fields into the update
    FetchFirst,
}

/// A resource kind the resource clients can converge
pub trait ObjectKind: Spec + 'static {
    /// lower-case kind name used in errors and logs
    const LABEL: &'static str;

    const UPSERT: Upsert = Upsert::UpdateFirst;

    /// copy fields the platform owns from the live object into the desired one
    fn prepare_update(_desired: &mut K8Obj<Self>, _live: &K8Obj<Self>) {}
}

/// Desired state of one object before it is addressed to a name and namespace
pub trait DesiredObject: Send {
    type Kind: ObjectKind;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<Self::Kind>;
}

/// Caller-controlled metadata shared by every kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectLabels {
    pub annotations: HashMap<String, String>,
    pub labels: HashMap<String, String>,
}

impl ObjectLabels {
    pub fn new<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_annotations(mut self, annotations: HashMap<String, String>) -> Self {
        self.annotations.extend(annotations);
        self
    }
}

/// build an addressed object with the caller's labels and annotations
pub(crate) fn new_object<S: Spec>(
    name: &str,
    namespace: &str,
    meta: ObjectLabels,
    spec: S,
) -> K8Obj<S> {
    let mut obj = K8Obj::new(name.to_owned(), spec);
    obj.metadata.namespace = namespace.to_owned();
    obj.metadata.labels = meta.labels;
    obj.metadata.annotations = meta.annotations;
    obj
}

/// Either a port number or a named port
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i32),
    String(String),
}

impl From<&str> for IntOrString {
    fn from(name: &str) -> Self {
        Self::String(name.to_owned())
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalObjectReference {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new_labels<K: ToString, V: ToString>(labels: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
