use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube_client::config::{KubeConfigOptions, Kubeconfig};
use kube_client::{Api, Client, Config};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::configuration::ClusterConfig;
use crate::kubernetes::model::{ClusterError, K8sClient, ObjectKey};

/// [`K8sClient`] backed by kube-rs, built once from a kubeconfig file.
pub struct KubeRsBased {
    client: Client,
}

impl KubeRsBased {
    pub fn new(client: Client) -> KubeRsBased {
        KubeRsBased { client }
    }

    pub async fn connect(cluster: &ClusterConfig) -> anyhow::Result<KubeRsBased> {
        let kubeconfig_path = cluster.kubeconfig_path()?;
        let kubeconfig = Kubeconfig::read_from(&kubeconfig_path)?;
        let context_options = KubeConfigOptions {
            context: cluster.context.clone(),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &context_options).await?;
        info!(
            kubeconfig = %kubeconfig_path.display(),
            cluster_url = %config.cluster_url,
            "loaded cluster credentials"
        );
        let client = Client::try_from(config)?;
        Ok(KubeRsBased::new(client))
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

// The API server reports missing objects and version clashes as status codes.
fn classify(err: kube::Error, what: String) -> ClusterError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ClusterError::NotFound(what),
        kube::Error::Api(response) if response.code == 409 => {
            ClusterError::Conflict(what, response.message)
        }
        other => ClusterError::Kube(other),
    }
}

async fn create<K>(api: Api<K>, object: &K, what: String) -> Result<K, ClusterError>
where
    K: Clone + DeserializeOwned + Serialize + Debug,
{
    api.create(&PostParams::default(), object)
        .await
        .map_err(|e| classify(e, what))
}

async fn list<K>(api: Api<K>, what: String) -> Result<Vec<K>, ClusterError>
where
    K: Clone + DeserializeOwned + Debug,
{
    api.list(&ListParams::default())
        .await
        .map(|list| list.items)
        .map_err(|e| classify(e, what))
}

async fn delete<K>(api: Api<K>, name: &str, what: String) -> Result<(), ClusterError>
where
    K: Clone + DeserializeOwned + Debug,
{
    api.delete(name, &DeleteParams::default())
        .await
        .map(|_| ())
        .map_err(|e| classify(e, what))
}

fn describe(kind: &str, namespace: &str, name: &str) -> String {
    format!("{kind} {namespace}/{name}")
}

fn name_of(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> &str {
    meta.name.as_deref().unwrap_or_default()
}

#[async_trait]
impl K8sClient for KubeRsBased {
    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError> {
        let what = describe("pod", namespace, name_of(&pod.metadata));
        create(self.namespaced(namespace), pod, what).await
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        let what = describe("deployment", namespace, name_of(&deployment.metadata));
        create(self.namespaced(namespace), deployment, what).await
    }

    async fn create_service(
        &self,
        namespace: &str,
        service: &Service,
    ) -> Result<Service, ClusterError> {
        let what = describe("service", namespace, name_of(&service.metadata));
        create(self.namespaced(namespace), service, what).await
    }

    async fn create_secret(
        &self,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, ClusterError> {
        let what = describe("secret", namespace, name_of(&secret.metadata));
        create(self.namespaced(namespace), secret, what).await
    }

    async fn create_ingress(
        &self,
        namespace: &str,
        ingress: &Ingress,
    ) -> Result<Ingress, ClusterError> {
        let what = describe("ingress", namespace, name_of(&ingress.metadata));
        create(self.namespaced(namespace), ingress, what).await
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError> {
        let what = format!("namespace {}", name_of(&namespace.metadata));
        create(Api::all(self.client.clone()), namespace, what).await
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        list(self.namespaced(namespace), format!("pods in {namespace}")).await
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        list(self.namespaced(namespace), format!("deployments in {namespace}")).await
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError> {
        list(self.namespaced(namespace), format!("services in {namespace}")).await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        list(Api::all(self.client.clone()), "namespaces".to_string()).await
    }

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Deployment, ClusterError> {
        let api: Api<Deployment> = self.namespaced(&key.namespace);
        api.get(&key.name)
            .await
            .map_err(|e| classify(e, describe("deployment", &key.namespace, &key.name)))
    }

    async fn replace_deployment(
        &self,
        key: &ObjectKey,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        let api: Api<Deployment> = self.namespaced(&key.namespace);
        api.replace(&key.name, &PostParams::default(), deployment)
            .await
            .map_err(|e| classify(e, describe("deployment", &key.namespace, &key.name)))
    }

    async fn delete_pod(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        let what = describe("pod", &key.namespace, &key.name);
        delete::<Pod>(self.namespaced(&key.namespace), &key.name, what).await
    }

    async fn delete_deployment(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        let what = describe("deployment", &key.namespace, &key.name);
        delete::<Deployment>(self.namespaced(&key.namespace), &key.name, what).await
    }

    async fn delete_service(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        let what = describe("service", &key.namespace, &key.name);
        delete::<Service>(self.namespaced(&key.namespace), &key.name, what).await
    }

    async fn delete_secret(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        let what = describe("secret", &key.namespace, &key.name);
        delete::<Secret>(self.namespaced(&key.namespace), &key.name, what).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} happened"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn missing_objects_are_classified_as_not_found() {
        let err = classify(api_error(404, "NotFound"), "pod default/ghost".to_string());
        assert!(matches!(err, ClusterError::NotFound(what) if what == "pod default/ghost"));
    }

    #[test]
    fn version_clashes_are_classified_as_conflicts() {
        let err = classify(api_error(409, "Conflict"), "deployment default/web".to_string());
        assert!(matches!(err, ClusterError::Conflict(_, message) if message == "Conflict happened"));
    }

    #[test]
    fn other_failures_keep_the_kube_error() {
        let err = classify(api_error(403, "Forbidden"), "pods in default".to_string());
        assert!(matches!(err, ClusterError::Kube(kube::Error::Api(response)) if response.code == 403));
    }

    const KUBECONFIG: &str = "
apiVersion: v1
kind: Config
current-context: kind-dev
clusters:
- name: kind-dev
  cluster:
    server: https://127.0.0.1:6443
contexts:
- name: kind-dev
  context:
    cluster: kind-dev
    user: admin
users:
- name: admin
  user:
    token: not-a-real-token
";

    #[tokio::test]
    async fn connect_fails_without_a_kubeconfig() {
        let cluster = ClusterConfig {
            kubeconfig: Some("/nonexistent/kubeconfig".into()),
            context: None,
        };
        assert!(KubeRsBased::connect(&cluster).await.is_err());
    }

    #[tokio::test]
    async fn connect_fails_for_an_unknown_context() {
        let path = std::env::temp_dir().join(format!(
            "kube_control-unknown-context-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, KUBECONFIG).unwrap();

        let cluster = ClusterConfig {
            kubeconfig: Some(path.clone()),
            context: Some("staging".to_string()),
        };
        let result = KubeRsBased::connect(&cluster).await;
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }
}
