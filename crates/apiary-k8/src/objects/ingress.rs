use serde::Deserialize;
use serde::Serialize;

use k8_types::{Crd, CrdNames, DefaultHeader, K8Obj, Spec, Status};

use super::{DesiredObject, ObjectKind, ObjectLabels, new_object};

const INGRESS_API: Crd = Crd {
    group: "networking.k8s.io",
    version: "v1",
    names: CrdNames {
        kind: "Ingress",
        plural: "ingresses",
        singular: "ingress",
    },
};

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
    #[serde(default)]
    pub rules: Vec<IngressRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<IngressTls>,
}

impl Spec for IngressSpec {
    type Status = IngressStatus;
    type Header = DefaultHeader;

    fn metadata() -> &'static Crd {
        &INGRESS_API
    }
}

impl ObjectKind for IngressSpec {
    const LABEL: &'static str = "ingress";
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IngressStatus {}

impl Status for IngressStatus {}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpIngressRuleValue>,
}

impl IngressRule {
    /// rule sending every path under `path` on `host` to a named service port
    pub fn route(host: &str, path: &str, service: &str, port_name: &str) -> Self {
        Self {
            host: Some(host.to_owned()),
            http: Some(HttpIngressRuleValue {
                paths: vec![HttpIngressPath {
                    path: Some(path.to_owned()),
                    path_type: "ImplementationSpecific".to_owned(),
                    backend: IngressBackend {
                        service: Some(IngressServiceBackend {
                            name: service.to_owned(),
                            port: ServiceBackendPort {
                                name: Some(port_name.to_owned()),
                                number: None,
                            },
                        }),
                    },
                }],
            }),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct HttpIngressRuleValue {
    #[serde(default)]
    pub paths: Vec<HttpIngressPath>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub path_type: String,
    pub backend: IngressBackend,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IngressBackend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<IngressServiceBackend>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct IngressServiceBackend {
    pub name: String,
    pub port: ServiceBackendPort,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceBackendPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngressTls {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngressOptions {
    pub meta: ObjectLabels,
    pub spec: IngressSpec,
}

impl DesiredObject for IngressOptions {
    type Kind = IngressSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<IngressSpec> {
        new_object(name, namespace, self.meta, self.spec)
    }
}
