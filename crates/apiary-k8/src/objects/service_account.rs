use serde::Deserialize;
use serde::Serialize;

use k8_types::{Crd, CrdNames, Header, K8Obj, Spec, Status};

use super::{DesiredObject, LocalObjectReference, ObjectKind, ObjectLabels, new_object};

const SERVICE_ACCOUNT_API: Crd = Crd {
    group: "core",
    version: "v1",
    names: CrdNames {
        kind: "ServiceAccount",
        plural: "serviceaccounts",
        singular: "serviceaccount",
    },
};

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceAccountSpec {}

impl Spec for ServiceAccountSpec {
    type Status = ServiceAccountStatus;
    type Header = ServiceAccountHeader;

    fn metadata() -> &'static Crd {
        &SERVICE_ACCOUNT_API
    }
}

impl ObjectKind for ServiceAccountSpec {
    const LABEL: &'static str = "service account";
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceAccountStatus {}

impl Status for ServiceAccountStatus {}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountHeader {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
}

impl Header for ServiceAccountHeader {}

#[derive(Debug, Clone, Default)]
pub struct ServiceAccountOptions {
    pub meta: ObjectLabels,
    pub image_pull_secrets: Vec<String>,
}

impl DesiredObject for ServiceAccountOptions {
    type Kind = ServiceAccountSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<ServiceAccountSpec> {
        let mut obj = new_object(name, namespace, self.meta, ServiceAccountSpec::default());
        obj.header = ServiceAccountHeader {
            image_pull_secrets: self
                .image_pull_secrets
                .into_iter()
                .map(|name| LocalObjectReference { name })
                .collect(),
        };
        obj
    }
}
