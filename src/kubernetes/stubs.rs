use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::ErrorResponse;
use kube::Resource;

use crate::kubernetes::model::{object_key, ClusterError, K8sClient, ObjectKey};

/// Objects of one kind, keyed the way the API server keys them. Listings come
/// back in the order objects were stored, never re-sorted.
pub struct Store<K> {
    objects: DashMap<ObjectKey, (u64, K)>,
    sequence: AtomicU64,
}

impl<K: Resource + Clone> Store<K> {
    fn new() -> Store<K> {
        Store {
            objects: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_position(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Puts an object straight into the store, bypassing create semantics.
    pub fn seed(&self, namespace: &str, object: K) {
        let name = object.meta().name.clone().unwrap_or_default();
        let position = self.next_position();
        self.objects
            .insert(object_key(namespace, name), (position, object));
    }

    pub fn get(&self, key: &ObjectKey) -> Option<K> {
        self.objects.get(key).map(|entry| entry.value().1.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    fn insert(&self, namespace: &str, object: &K) -> Result<K, ClusterError> {
        let name = object.meta().name.clone().unwrap_or_default();
        let key = object_key(namespace, name);
        match self.objects.entry(key.clone()) {
            Entry::Occupied(_) => Err(ClusterError::Conflict(
                key.to_string(),
                "already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                let mut stored = object.clone();
                if !namespace.is_empty() {
                    stored.meta_mut().namespace = Some(namespace.to_string());
                }
                stored.meta_mut().resource_version = Some("1".to_string());
                slot.insert((self.next_position(), stored.clone()));
                Ok(stored)
            }
        }
    }

    fn list(&self, namespace: &str) -> Vec<K> {
        let mut matching: Vec<(u64, K)> = self
            .objects
            .iter()
            .filter(|entry| entry.key().namespace == namespace)
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by_key(|(position, _)| *position);
        matching.into_iter().map(|(_, object)| object).collect()
    }

    fn fetch(&self, key: &ObjectKey) -> Result<K, ClusterError> {
        self.get(key)
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))
    }

    fn replace(&self, key: &ObjectKey, object: &K) -> Result<K, ClusterError> {
        let mut current = self
            .objects
            .get_mut(key)
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))?;
        let current_version = current.1.meta().resource_version.clone();
        if object.meta().resource_version != current_version {
            return Err(ClusterError::Conflict(
                key.to_string(),
                "the object has been modified".to_string(),
            ));
        }
        let mut stored = object.clone();
        stored.meta_mut().resource_version = Some(next_version(current_version.as_deref()));
        current.1 = stored.clone();
        Ok(stored)
    }

    fn bump(&self, key: &ObjectKey) {
        if let Some(mut current) = self.objects.get_mut(key) {
            let next = next_version(current.1.meta().resource_version.as_deref());
            current.1.meta_mut().resource_version = Some(next);
        }
    }

    fn remove(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))
    }
}

fn next_version(current: Option<&str>) -> String {
    let current: u64 = current.and_then(|v| v.parse().ok()).unwrap_or(0);
    (current + 1).to_string()
}

/// Fake cluster that keeps objects in memory and counts every call made against it.
pub struct InMemoryCluster {
    pub pods: Store<Pod>,
    pub deployments: Store<Deployment>,
    pub services: Store<Service>,
    pub secrets: Store<Secret>,
    pub ingresses: Store<Ingress>,
    pub namespaces: Store<Namespace>,
    calls: AtomicUsize,
    fail_service_creation: AtomicBool,
    fail_deployment_deletes: AtomicBool,
    fail_deployment_replaces: AtomicBool,
    race_next_read: AtomicBool,
}

impl InMemoryCluster {
    pub fn new() -> InMemoryCluster {
        InMemoryCluster {
            pods: Store::new(),
            deployments: Store::new(),
            services: Store::new(),
            secrets: Store::new(),
            ingresses: Store::new(),
            namespaces: Store::new(),
            calls: AtomicUsize::new(0),
            fail_service_creation: AtomicBool::new(false),
            fail_deployment_deletes: AtomicBool::new(false),
            fail_deployment_replaces: AtomicBool::new(false),
            race_next_read: AtomicBool::new(false),
        }
    }

    /// Number of calls issued against the cluster so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reject_services(&self) {
        self.fail_service_creation.store(true, Ordering::SeqCst);
    }

    pub fn reject_deployment_deletes(&self) {
        self.fail_deployment_deletes.store(true, Ordering::SeqCst);
    }

    /// Reads keep working, writes back to an existing deployment are forbidden.
    pub fn reject_deployment_replaces(&self) {
        self.fail_deployment_replaces.store(true, Ordering::SeqCst);
    }

    /// Simulates another writer updating the deployment right after the next read.
    pub fn race_next_read(&self) {
        self.race_next_read.store(true, Ordering::SeqCst);
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl K8sClient for InMemoryCluster {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError> {
        self.record();
        self.pods.insert(namespace, pod)
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        self.record();
        self.deployments.insert(namespace, deployment)
    }

    async fn create_service(
        &self,
        namespace: &str,
        service: &Service,
    ) -> Result<Service, ClusterError> {
        self.record();
        if self.fail_service_creation.load(Ordering::SeqCst) {
            return Err(ClusterError::Kube(forbidden()));
        }
        self.services.insert(namespace, service)
    }

    async fn create_secret(
        &self,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, ClusterError> {
        self.record();
        self.secrets.insert(namespace, secret)
    }

    async fn create_ingress(
        &self,
        namespace: &str,
        ingress: &Ingress,
    ) -> Result<Ingress, ClusterError> {
        self.record();
        self.ingresses.insert(namespace, ingress)
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError> {
        self.record();
        self.namespaces.insert("", namespace)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        self.record();
        Ok(self.pods.list(namespace))
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        self.record();
        Ok(self.deployments.list(namespace))
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError> {
        self.record();
        Ok(self.services.list(namespace))
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        self.record();
        Ok(self.namespaces.list(""))
    }

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment, ClusterError> {
        self.record();
        let deployment = self.deployments.fetch(key)?;
        if self.race_next_read.swap(false, Ordering::SeqCst) {
            self.deployments.bump(key);
        }
        Ok(deployment)
    }

    async fn replace_deployment(
        &self,
        key: &ObjectKey,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        self.record();
        if self.fail_deployment_replaces.load(Ordering::SeqCst) {
            return Err(ClusterError::Kube(forbidden()));
        }
        self.deployments.replace(key, deployment)
    }

    async fn delete_pod(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.record();
        self.pods.remove(key)
    }

    async fn delete_deployment(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.record();
        if self.fail_deployment_deletes.load(Ordering::SeqCst) {
            return Err(ClusterError::Kube(forbidden()));
        }
        self.deployments.remove(key)
    }

    async fn delete_service(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.record();
        self.services.remove(key)
    }

    async fn delete_secret(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.record();
        self.secrets.remove(key)
    }
}

fn forbidden() -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "forbidden by policy".to_string(),
        reason: "Forbidden".to_string(),
        code: 403,
    })
}

/// Cluster that rejects every call, as an unreachable or unauthorized API server would.
pub struct AlwaysFail;

impl AlwaysFail {
    fn fail<T>() -> Result<T, ClusterError> {
        Err(ClusterError::Kube(forbidden()))
    }
}

#[async_trait]
impl K8sClient for AlwaysFail {
    async fn create_pod(&self, _namespace: &str, _pod: &Pod) -> Result<Pod, ClusterError> {
        Self::fail()
    }

    async fn create_deployment(
        &self,
        _namespace: &str,
        _deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        Self::fail()
    }

    async fn create_service(
        &self,
        _namespace: &str,
        _service: &Service,
    ) -> Result<Service, ClusterError> {
        Self::fail()
    }

    async fn create_secret(
        &self,
        _namespace: &str,
        _secret: &Secret,
    ) -> Result<Secret, ClusterError> {
        Self::fail()
    }

    async fn create_ingress(
        &self,
        _namespace: &str,
        _ingress: &Ingress,
    ) -> Result<Ingress, ClusterError> {
        Self::fail()
    }

    async fn create_namespace(&self, _namespace: &Namespace) -> Result<Namespace, ClusterError> {
        Self::fail()
    }

    async fn list_pods(&self, _namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        Self::fail()
    }

    async fn list_deployments(&self, _namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        Self::fail()
    }

    async fn list_services(&self, _namespace: &str) -> Result<Vec<Service>, ClusterError> {
        Self::fail()
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        Self::fail()
    }

    async fn get_deployment(&self, _key: &ObjectKey) -> Result<Deployment, ClusterError> {
        Self::fail()
    }

    async fn replace_deployment(
        &self,
        _key: &ObjectKey,
        _deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        Self::fail()
    }

    async fn delete_pod(&self, _key: &ObjectKey) -> Result<(), ClusterError> {
        Self::fail()
    }

    async fn delete_deployment(&self, _key: &ObjectKey) -> Result<(), ClusterError> {
        Self::fail()
    }

    async fn delete_service(&self, _key: &ObjectKey) -> Result<(), ClusterError> {
        Self::fail()
    }

    async fn delete_secret(&self, _key: &ObjectKey) -> Result<(), ClusterError> {
        Self::fail()
    }
}
