pub use k8_types::core::namespace::NamespaceSpec;

use super::ObjectKind;

impl ObjectKind for NamespaceSpec {
    const LABEL: &'static str = "namespace";
}
