use tracing::{debug, warn};

use crate::kubernetes::model::{ClusterError, SharedK8sClient};
use crate::resources::error::{ResourceError, ValidationError};
use crate::resources::request::ResourceKind;
use crate::resources::summary::{DeploymentSummary, NamespaceSummary, PodSummary, ServiceSummary};

/// Reads live cluster state and projects it into summaries. Nothing is cached.
pub struct ResourceLister {
    k8s_client: SharedK8sClient,
}

fn require_namespace(kind: ResourceKind, namespace: &str) -> Result<(), ValidationError> {
    if namespace.trim().is_empty() {
        return Err(ValidationError::MissingField {
            kind: kind.as_str(),
            field: "namespace",
        });
    }
    Ok(())
}

fn list_failure(kind: ResourceKind, namespace: &str, source: ClusterError) -> ResourceError {
    warn!(%kind, namespace, error = %source, "listing failed");
    ResourceError::List { kind, source }
}

impl ResourceLister {
    pub fn new(k8s_client: SharedK8sClient) -> ResourceLister {
        ResourceLister { k8s_client }
    }

    pub async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ResourceError> {
        let kind = ResourceKind::Pod;
        require_namespace(kind, namespace)?;
        let pods = self
            .k8s_client
            .list_pods(namespace)
            .await
            .map_err(|source| list_failure(kind, namespace, source))?;
        debug!(namespace, count = pods.len(), "listed pods");
        Ok(pods.into_iter().map(PodSummary::from).collect())
    }

    pub async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ResourceError> {
        let kind = ResourceKind::Deployment;
        require_namespace(kind, namespace)?;
        let deployments = self
            .k8s_client
            .list_deployments(namespace)
            .await
            .map_err(|source| list_failure(kind, namespace, source))?;
        debug!(namespace, count = deployments.len(), "listed deployments");
        Ok(deployments
            .into_iter()
            .map(DeploymentSummary::from)
            .collect())
    }

    pub async fn list_services(
        &self,
        namespace: &str,
    ) -> Result<Vec<ServiceSummary>, ResourceError> {
        let kind = ResourceKind::Service;
        require_namespace(kind, namespace)?;
        let services = self
            .k8s_client
            .list_services(namespace)
            .await
            .map_err(|source| list_failure(kind, namespace, source))?;
        debug!(namespace, count = services.len(), "listed services");
        Ok(services.into_iter().map(ServiceSummary::from).collect())
    }

    /// Names in the order the cluster returned them.
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>, ResourceError> {
        let namespaces = self
            .k8s_client
            .list_namespaces()
            .await
            .map_err(|source| list_failure(ResourceKind::Namespace, "", source))?;
        debug!(count = namespaces.len(), "listed namespaces");
        Ok(namespaces
            .into_iter()
            .map(NamespaceSummary::from)
            .collect())
    }
}
