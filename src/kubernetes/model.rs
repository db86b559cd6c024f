use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;

/// Namespace and name of a single object. Namespace objects use an empty namespace.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

pub fn object_key(namespace: impl Into<String>, name: impl Into<String>) -> ObjectKey {
    ObjectKey {
        namespace: namespace.into(),
        name: name.into(),
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Outcome of a failed call against the cluster API.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict on {0}: {1}")]
    Conflict(String, String),

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Typed verbs against the cluster collections this service manages.
///
/// Implementations only talk to the cluster. Validation, object building and
/// projection into summaries happen in [`crate::resources`], so a fake backend
/// exercises the same code paths as the real one.
#[async_trait]
pub trait K8sClient {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError>;

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError>;

    async fn create_service(
        &self,
        namespace: &str,
        service: &Service,
    ) -> Result<Service, ClusterError>;

    async fn create_secret(&self, namespace: &str, secret: &Secret)
        -> Result<Secret, ClusterError>;

    async fn create_ingress(
        &self,
        namespace: &str,
        ingress: &Ingress,
    ) -> Result<Ingress, ClusterError>;

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError>;

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError>;

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError>;

    /// Cluster scoped, the only listing without a namespace.
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError>;

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment, ClusterError>;

    /// Submits `deployment` as the new state, carrying whatever resourceVersion it was read with.
    async fn replace_deployment(
        &self,
        key: &ObjectKey,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError>;

    async fn delete_pod(&self, key: &ObjectKey) -> Result<(), ClusterError>;

    async fn delete_deployment(&self, key: &ObjectKey) -> Result<(), ClusterError>;

    async fn delete_service(&self, key: &ObjectKey) -> Result<(), ClusterError>;

    async fn delete_secret(&self, key: &ObjectKey) -> Result<(), ClusterError>;
}

// Thread safe handle shared by every resource component.
pub type SharedK8sClient = Arc<dyn K8sClient + Send + Sync + 'static>;
