use serde::Deserialize;
use serde::Serialize;

use k8_types::{Crd, CrdNames, DefaultHeader, K8Obj, Spec, Status};

use super::pod::{PersistentVolumeClaim, PodTemplateSpec};
use super::{DesiredObject, LabelSelector, ObjectKind, ObjectLabels, new_object};

const STATEFULSET_API: Crd = Crd {
    group: "apps",
    version: "v1",
    names: CrdNames {
        kind: "StatefulSet",
        plural: "statefulsets",
        singular: "statefulset",
    },
};

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    pub selector: LabelSelector,
    pub service_name: String,
    pub template: PodTemplateSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_strategy: Option<StatefulSetUpdateStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_management_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

impl Spec for StatefulSetSpec {
    type Status = StatefulSetStatus;
    type Header = DefaultHeader;

    fn metadata() -> &'static Crd {
        &STATEFULSET_API
    }
}

impl ObjectKind for StatefulSetSpec {
    const LABEL: &'static str = "statefulset";
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct StatefulSetUpdateStrategy {
    #[serde(rename = "type")]
    pub strategy_type: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetStatus {
    #[serde(default)]
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Status for StatefulSetStatus {}

#[derive(Debug, Clone, Default)]
pub struct StatefulSetOptions {
    pub meta: ObjectLabels,
    pub spec: StatefulSetSpec,
}

impl DesiredObject for StatefulSetOptions {
    type Kind = StatefulSetSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<StatefulSetSpec> {
        new_object(name, namespace, self.meta, self.spec)
    }
}
