use tracing::{info, warn};

use crate::kubernetes::model::{ClusterError, ObjectKey, SharedK8sClient};
use crate::resources::error::{ResourceError, Verb};
use crate::resources::request::{validated_key, ResourceKind};

/// Deletes single named objects. Every failure is returned to the caller;
/// an object that is already gone is reported as not found.
pub struct ResourceDeleter {
    k8s_client: SharedK8sClient,
}

impl ResourceDeleter {
    pub fn new(k8s_client: SharedK8sClient) -> ResourceDeleter {
        ResourceDeleter { k8s_client }
    }

    pub async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ResourceError> {
        let key = validated_key(ResourceKind::Pod, namespace, name)?;
        let result = self.k8s_client.delete_pod(&key).await;
        finish(ResourceKind::Pod, &key, result)
    }

    pub async fn delete_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<(), ResourceError> {
        let key = validated_key(ResourceKind::Deployment, namespace, name)?;
        let result = self.k8s_client.delete_deployment(&key).await;
        finish(ResourceKind::Deployment, &key, result)
    }

    pub async fn delete_service(&self, name: &str, namespace: &str) -> Result<(), ResourceError> {
        let key = validated_key(ResourceKind::Service, namespace, name)?;
        let result = self.k8s_client.delete_service(&key).await;
        finish(ResourceKind::Service, &key, result)
    }

    pub async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), ResourceError> {
        let key = validated_key(ResourceKind::Secret, namespace, name)?;
        let result = self.k8s_client.delete_secret(&key).await;
        finish(ResourceKind::Secret, &key, result)
    }
}

fn finish(
    kind: ResourceKind,
    key: &ObjectKey,
    result: Result<(), ClusterError>,
) -> Result<(), ResourceError> {
    match result {
        Ok(()) => {
            info!(%kind, namespace = %key.namespace, name = %key.name, "resource deleted");
            Ok(())
        }
        Err(source) => {
            warn!(%kind, namespace = %key.namespace, name = %key.name, error = %source, "resource deletion failed");
            Err(ResourceError::from_call(Verb::Delete, kind, key, source))
        }
    }
}
