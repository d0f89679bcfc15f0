use k8_types::K8Obj;
use k8_types::ObjectMeta;
use k8_types::Spec;

/// annotation recording the tool and version that last wrote an object
pub const CREATED_BY_ANNOTATION: &str = "createdBy";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

pub const DEFAULT_TOOL: &str = "apiary";

/// Identity of the tool writing to the platform, stamped on every object it writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    tool: String,
    version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL, env!("CARGO_PKG_VERSION"))
    }
}

impl ClientIdentity {
    pub fn new(tool: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// value of the `createdBy` annotation
    pub fn created_by(&self) -> String {
        format!("{}:{}", self.tool, self.version)
    }

    pub fn stamp<S: Spec>(&self, obj: &mut K8Obj<S>) {
        obj.metadata
            .annotations
            .insert(CREATED_BY_ANNOTATION.to_owned(), self.created_by());
        obj.metadata
            .labels
            .insert(MANAGED_BY_LABEL.to_owned(), self.tool.clone());
    }

    /// true if the object carries this tool's managed-by label
    pub fn manages(&self, metadata: &ObjectMeta) -> bool {
        metadata
            .labels
            .get(MANAGED_BY_LABEL)
            .is_some_and(|tool| tool == &self.tool)
    }
}

#[cfg(test)]
mod test {

    use crate::objects::DesiredObject;
    use crate::objects::config_map::ConfigMapOptions;

    use super::*;

    #[test]
    fn test_stamp_provenance() {
        let identity = ClientIdentity::new("beekeeper", "0.4.1");
        let mut obj = ConfigMapOptions::default().into_object("bee-0", "swarm");

        assert!(!identity.manages(&obj.metadata));
        identity.stamp(&mut obj);

        assert_eq!(
            obj.metadata.annotations.get(CREATED_BY_ANNOTATION).map(String::as_str),
            Some("beekeeper:0.4.1")
        );
        assert_eq!(
            obj.metadata.labels.get(MANAGED_BY_LABEL).map(String::as_str),
            Some("beekeeper")
        );
        assert!(identity.manages(&obj.metadata));
        assert!(!ClientIdentity::new("other", "1.0.0").manages(&obj.metadata));
    }
}
