use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use k8_types::K8Obj;
pub use k8_types::core::secret::{SecretHeader, SecretSpec, SecretStatus};

use super::{DesiredObject, ObjectKind, ObjectLabels, new_object};

pub const OPAQUE_SECRET: &str = "Opaque";

impl ObjectKind for SecretSpec {
    const LABEL: &'static str = "secret";
}

/// decoded value of one entry; the API stores values base64 encoded
pub fn decoded(header: &SecretHeader, key: &str) -> Option<String> {
    let encoded = header.data.get(key)?;
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

#[derive(Debug, Clone, Default)]
pub struct SecretOptions {
    pub meta: ObjectLabels,
    /// plain-text entries, encoded on the way out
    pub string_data: BTreeMap<String, String>,
    pub secret_type: Option<String>,
}

impl DesiredObject for SecretOptions {
    type Kind = SecretSpec;

    fn into_object(self, name: &str, namespace: &str) -> K8Obj<SecretSpec> {
        let data = self
            .string_data
            .into_iter()
            .map(|(key, value)| (key, STANDARD.encode(value)))
            .collect();

        let mut obj = new_object(name, namespace, self.meta, SecretSpec::default());
        obj.header = SecretHeader {
            data,
            ty: self
                .secret_type
                .unwrap_or_else(|| OPAQUE_SECRET.to_owned()),
        };
        obj
    }
}
