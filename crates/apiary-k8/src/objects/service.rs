use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use k8_types::{Crd, CrdNames, DefaultHeader, K8Obj, Spec, Status};

use super::{DesiredObject, IntOrString, ObjectKind, ObjectLabels, Upsert, new_object};

const SERVICE_API: Crd = Crd {
    group: "core",
    version: "v1",
    names: CrdNames {
        kind: "Service",
        plural: "services",
        singular: "service",
    },
};

/// `clusterIP` value for a headless service
pub const CLUSTER_IP_NONE: &str = "None";

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "clusterIP", default, skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_traffic_policy: Option<ExternalTrafficPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_not_ready_addresses: Option<bool>,
}

impl Spec for ServiceSpec {
    type Status = ServiceStatus;
    type Header = DefaultHeader;

    fn metadata() -> &'static Crd {
        &SERVICE_API
    }
}

impl ObjectKind for ServiceSpec {
    const LABEL: &'static str = "service";
    const UPSERT: Upsert = Upsert::FetchFirst;

    /// cluster IP is immutable once assigned and updates must carry the live version
    fn prepare_update(desired: &mut K8Obj<Self>, live: &K8Obj<Self>) {
        if desired.spec.cluster_ip.is_none() {
            desired.spec.cluster_ip = live.spec.cluster_ip.clone();
        }
        desired.metadata.resource_version = live.metadata.resource_version.clone();
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<IntOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

impl ServicePort {
    /// TCP port whose target is the container port of the same name
    pub fn named(name: &str, port: i32) -> Self {
        Self {
            name: Some(name.to_owned()),
            port,
            target_port: Some(IntOrString::from(name)),
            protocol: Some("TCP".to_owned()),
            node_port: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    ClusterIP,
    NodePort,
    LoadBalancer,
    ExternalName,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTrafficPolicy {
    Local,
    Cluster,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerStatus>,
}

impl Status for ServiceStatus {}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadBalancerStatus {
    #[serde(default)]
    pub ingress: Vec<LoadBalancerIngress>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadBalancerIngress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub meta: ObjectLabels,
    pub spec: ServiceSpec,
}

impl DesiredObject for ServiceOptions {
    type Kind = ServiceSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<ServiceSpec> {
        new_object(name, namespace, self.meta, self.spec)
    }
}
