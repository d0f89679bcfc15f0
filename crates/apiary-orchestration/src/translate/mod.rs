//! Pure translation of a [`NodeSpec`] into the desired state of each object kind.

mod network;
mod workload;

pub use self::network::*;
pub use self::workload::*;

use std::collections::BTreeMap;

use apiary_k8::objects::ObjectLabels;
use apiary_k8::objects::config_map::ConfigMapOptions;
use apiary_k8::objects::secret::SecretOptions;
use apiary_k8::objects::service_account::ServiceAccountOptions;

use crate::defaults::*;
use crate::features::{KeyFeatures, KeyKind};
use crate::spec::NodeSpec;

/// Names of every object that makes up one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeNames {
    pub node: String,
    pub config_map: String,
    pub keys_secret: String,
    pub clef_secret: String,
    pub service_account: String,
    pub api_service: String,
    pub debug_service: String,
    pub p2p_service: String,
    pub headless_service: String,
    pub api_ingress: String,
    pub debug_ingress: String,
    pub statefulset: String,
}

impl NodeNames {
    pub fn new(node: &str) -> Self {
        Self {
            node: node.to_owned(),
            config_map: node.to_owned(),
            keys_secret: format!("{node}-keys"),
            clef_secret: format!("{node}-clef"),
            service_account: node.to_owned(),
            api_service: node.to_owned(),
            debug_service: format!("{node}-debug"),
            p2p_service: format!("{node}-p2p"),
            headless_service: format!("{node}-headless"),
            api_ingress: node.to_owned(),
            debug_ingress: format!("{node}-debug"),
            statefulset: node.to_owned(),
        }
    }
}

/// labels matching the pods of a node
pub fn selector_labels(spec: &NodeSpec) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(NAME_LABEL.to_owned(), BEE_APP_NAME.to_owned());
    labels.insert(INSTANCE_LABEL.to_owned(), spec.name.clone());
    labels
}

/// labels and annotations carried by every object of a node
pub fn object_labels(spec: &NodeSpec) -> ObjectLabels {
    let mut meta = ObjectLabels::new(selector_labels(spec)).with_annotations(spec.annotations.clone());
    meta.labels.extend(spec.labels.clone());
    meta
}

pub fn config_map(spec: &NodeSpec, rendered: String) -> ConfigMapOptions {
    let mut data = BTreeMap::new();
    data.insert(BEE_CONFIG_FILE.to_owned(), rendered);

    ConfigMapOptions {
        meta: object_labels(spec),
        data,
    }
}

/// shared keys secret with one entry per non-empty libp2p/swarm key
pub fn keys_secret(spec: &NodeSpec) -> SecretOptions {
    let features = KeyFeatures::from_keys(&spec.keys);
    let string_data = features
        .shared_volumes()
        .map(|volume| {
            let key = match volume.kind {
                KeyKind::Libp2p => &spec.keys.libp2p,
                KeyKind::Swarm => &spec.keys.swarm,
                KeyKind::Clef => &spec.keys.clef,
            };
            (volume.secret_key.to_owned(), key.clone())
        })
        .collect();

    SecretOptions {
        meta: object_labels(spec),
        string_data,
        secret_type: None,
    }
}

/// clef signer secret, only when a clef key is configured
pub fn clef_secret(spec: &NodeSpec) -> Option<SecretOptions> {
    if !KeyFeatures::from_keys(&spec.keys).enabled(KeyKind::Clef) {
        return None;
    }

    let mut string_data = BTreeMap::new();
    string_data.insert("key".to_owned(), spec.keys.clef.clone());
    string_data.insert("password".to_owned(), spec.keys.clef_password.clone());

    Some(SecretOptions {
        meta: object_labels(spec),
        string_data,
        secret_type: None,
    })
}

pub fn service_account(spec: &NodeSpec) -> ServiceAccountOptions {
    ServiceAccountOptions {
        meta: object_labels(spec),
        image_pull_secrets: spec.image_pull_secrets.clone(),
    }
}

#[cfg(test)]
mod test {

    use crate::spec::NodeKeys;

    use super::*;

    fn node(keys: NodeKeys) -> NodeSpec {
        NodeSpec::builder("bee-0")
            .namespace("swarm")
            .keys(keys)
            .build()
            .expect("spec")
    }

    #[test]
    fn test_node_names() {
        let names = NodeNames::new("bee-0");
        assert_eq!(names.keys_secret, "bee-0-keys");
        assert_eq!(names.clef_secret, "bee-0-clef");
        assert_eq!(names.p2p_service, "bee-0-p2p");
        assert_eq!(names.headless_service, "bee-0-headless");
        assert_eq!(names.debug_ingress, "bee-0-debug");
    }

    #[test]
    fn test_keys_secret_only_present_keys() {
        let secret = keys_secret(&node(NodeKeys::swarm("abc")));
        let keys: Vec<&String> = secret.string_data.keys().collect();
        assert_eq!(keys, vec!["swarm"]);
        assert_eq!(secret.string_data.get("swarm").map(String::as_str), Some("abc"));

        assert!(keys_secret(&node(NodeKeys::default())).string_data.is_empty());
    }

    #[test]
    fn test_clef_secret_presence() {
        assert!(clef_secret(&node(NodeKeys::swarm("abc"))).is_none());

        let keys = NodeKeys {
            clef: "{\"address\":\"0x1\"}".to_owned(),
            clef_password: "secret".to_owned(),
            ..Default::default()
        };
        let secret = clef_secret(&node(keys)).expect("clef secret");
        assert_eq!(secret.string_data.len(), 2);
        assert_eq!(secret.string_data.get("password").map(String::as_str), Some("secret"));
    }

    #[test]
    fn test_object_labels() {
        let mut spec = node(NodeKeys::default());
        spec.labels.insert("team".to_owned(), "storage".to_owned());
        let meta = object_labels(&spec);

        assert_eq!(meta.labels.get(NAME_LABEL).map(String::as_str), Some("bee"));
        assert_eq!(meta.labels.get(INSTANCE_LABEL).map(String::as_str), Some("bee-0"));
        assert_eq!(meta.labels.get("team").map(String::as_str), Some("storage"));
    }
}
