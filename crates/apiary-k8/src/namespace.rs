use tracing::{debug, info, instrument};

use k8_types::K8Obj;

use crate::client::K8Api;
use crate::error::{NamespaceError, ResourceError, Verb};
use crate::identity::{ClientIdentity, MANAGED_BY_LABEL};
use crate::objects::ObjectKind;
use crate::objects::namespace::NamespaceSpec;

/// namespace field used for cluster-scoped objects
const CLUSTER_SCOPE: &str = "";

/// Creates and removes the namespaces nodes are provisioned into.
///
/// Deletion is gated on the managed-by label so that namespaces this tool did not
/// create are never removed.
#[derive(Clone)]
pub struct NamespaceClient<C> {
    client: C,
    identity: ClientIdentity,
}

impl<C: K8Api> NamespaceClient<C> {
    pub fn new(client: C, identity: ClientIdentity) -> Self {
        Self { client, identity }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<K8Obj<NamespaceSpec>, NamespaceError> {
        if let Some(existing) = self.get(name).await? {
            debug!(managed = self.identity.manages(&existing.metadata), "namespace exists");
            return Ok(existing);
        }

        let mut ns = K8Obj::new(name.to_owned(), NamespaceSpec::default());
        self.identity.stamp(&mut ns);

        let created = self
            .client
            .create(ns)
            .await
            .map_err(|err| self.error(Verb::Create, name, err))?;
        info!(%name, "namespace created");
        Ok(created)
    }

    /// Delete a namespace this tool manages; a missing namespace counts as deleted
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), NamespaceError> {
        let Some(existing) = self.get(name).await? else {
            debug!("namespace already gone");
            return Ok(());
        };

        if !self.identity.manages(&existing.metadata) {
            return Err(NamespaceError::NotManaged {
                name: name.to_owned(),
                expected: self.identity.tool().to_owned(),
                found: existing.metadata.labels.get(MANAGED_BY_LABEL).cloned(),
            });
        }

        match self.client.delete::<NamespaceSpec>(name, CLUSTER_SCOPE).await {
            Ok(()) => {
                info!(%name, "namespace deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(self.error(Verb::Delete, name, err).into()),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Option<K8Obj<NamespaceSpec>>, NamespaceError> {
        match self.client.retrieve::<NamespaceSpec>(name, CLUSTER_SCOPE).await {
            Ok(ns) => Ok(Some(ns)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(self.error(Verb::Get, name, err).into()),
        }
    }

    fn error(&self, verb: Verb, name: &str, source: crate::error::ApiError) -> ResourceError {
        ResourceError::new(verb, NamespaceSpec::LABEL, name, CLUSTER_SCOPE, source)
    }
}
