use std::collections::BTreeMap;

use k8_types::K8Obj;
pub use k8_types::core::config_map::{ConfigMapHeader, ConfigMapSpec, ConfigMapStatus};

use super::{DesiredObject, ObjectKind, ObjectLabels, new_object};

impl ObjectKind for ConfigMapSpec {
    const LABEL: &'static str = "configmap";
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMapOptions {
    pub meta: ObjectLabels,
    pub data: BTreeMap<String, String>,
}

impl DesiredObject for ConfigMapOptions {
    type Kind = ConfigMapSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<ConfigMapSpec> {
        let mut obj = new_object(name, namespace, self.meta, ConfigMapSpec::default());
        obj.header = ConfigMapHeader { data: self.data };
        obj
    }
}
