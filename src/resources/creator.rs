use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, Namespace, Pod, PodSpec, PodTemplateSpec, Secret, Service,
    ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;
use tracing::{error, info, warn};

use crate::kubernetes::model::SharedK8sClient;
use crate::resources::error::{ResourceError, Verb};
use crate::resources::request::{
    CreateApplicationRequest, CreateResourceRequest, DeploymentRequest, IngressRequest,
    NamespaceRequest, PodRequest, ResourceKind, ResourceSpec, SecretRequest, ServiceRequest,
};

const APP_LABEL: &str = "app";

/// Confirmation echoed back once the cluster accepted the object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub kind: ResourceKind,
    pub name: String,
}

pub struct ResourceCreator {
    k8s_client: SharedK8sClient,
}

impl ResourceCreator {
    pub fn new(k8s_client: SharedK8sClient) -> ResourceCreator {
        ResourceCreator { k8s_client }
    }

    /// Validates an untrusted request and creates the object it describes.
    pub async fn create_resource(
        &self,
        request: CreateResourceRequest,
    ) -> Result<Created, ResourceError> {
        let spec = ResourceSpec::try_from(request).map_err(|err| {
            warn!(error = %err, "rejected creation request");
            err
        })?;
        self.create(spec).await
    }

    /// Submits exactly one object. Does not wait for it to become ready.
    pub async fn create(&self, spec: ResourceSpec) -> Result<Created, ResourceError> {
        let kind = spec.kind();
        let key = spec.key();
        let client = &self.k8s_client;

        let submitted = match &spec {
            ResourceSpec::Pod(request) => client
                .create_pod(&request.namespace, &build_pod(request))
                .await
                .map(|_| ()),
            ResourceSpec::Deployment(request) => client
                .create_deployment(&request.namespace, &build_deployment(request))
                .await
                .map(|_| ()),
            ResourceSpec::Service(request) => client
                .create_service(&request.namespace, &build_service(request))
                .await
                .map(|_| ()),
            ResourceSpec::Secret(request) => client
                .create_secret(&request.namespace, &build_secret(request))
                .await
                .map(|_| ()),
            ResourceSpec::Ingress(request) => client
                .create_ingress(&request.namespace, &build_ingress(request))
                .await
                .map(|_| ()),
            ResourceSpec::Namespace(request) => client
                .create_namespace(&build_namespace(request))
                .await
                .map(|_| ()),
        };

        match submitted {
            Ok(()) => {
                info!(%kind, namespace = %key.namespace, name = %key.name, "resource created");
                Ok(Created {
                    kind,
                    name: key.name,
                })
            }
            Err(source) => {
                warn!(%kind, namespace = %key.namespace, name = %key.name, error = %source, "resource creation failed");
                Err(ResourceError::from_call(Verb::Create, kind, &key, source))
            }
        }
    }

    /// Creates a deployment and a service selecting its pods.
    ///
    /// Both halves are validated before anything is submitted. When the service is
    /// rejected the deployment that was just created is deleted again, on a best
    /// effort basis, and the service failure is returned.
    pub async fn create_application(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<Vec<Created>, ResourceError> {
        let (deployment, service) = request.validate()?;
        let deployment_key = ResourceSpec::Deployment(deployment.clone()).key();

        let created_deployment = self.create(ResourceSpec::Deployment(deployment)).await?;
        match self.create(ResourceSpec::Service(service)).await {
            Ok(created_service) => Ok(vec![created_deployment, created_service]),
            Err(err) => {
                if let Err(rollback) = self.k8s_client.delete_deployment(&deployment_key).await {
                    error!(
                        namespace = %deployment_key.namespace,
                        name = %deployment_key.name,
                        error = %rollback,
                        "could not remove deployment after service creation failed"
                    );
                } else {
                    info!(
                        namespace = %deployment_key.namespace,
                        name = %deployment_key.name,
                        "removed deployment after service creation failed"
                    );
                }
                Err(err)
            }
        }
    }
}

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

fn metadata(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn env_vars(env: &BTreeMap<String, String>) -> Option<Vec<EnvVar>> {
    if env.is_empty() {
        return None;
    }
    Some(
        env.iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                value_from: None,
            })
            .collect(),
    )
}

pub fn build_pod(request: &PodRequest) -> Pod {
    Pod {
        metadata: metadata(&request.namespace, &request.name),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: request.name.clone(),
                image: Some(request.image.clone()),
                env: env_vars(&request.env),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: None,
    }
}

/// Selector and template labels are both `app: <name>`; the API server rejects a mismatch.
pub fn build_deployment(request: &DeploymentRequest) -> Deployment {
    let labels = app_labels(&request.name);
    let ports = request.container_port.map(|container_port| {
        vec![ContainerPort {
            container_port,
            ..Default::default()
        }]
    });

    Deployment {
        metadata: metadata(&request.namespace, &request.name),
        spec: Some(DeploymentSpec {
            replicas: Some(request.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: request.name.clone(),
                        image: Some(request.image.clone()),
                        ports,
                        env: env_vars(&request.env),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

pub fn build_service(request: &ServiceRequest) -> Service {
    Service {
        metadata: metadata(&request.namespace, &request.name),
        spec: Some(ServiceSpec {
            type_: Some(request.service_type.clone()),
            selector: Some(app_labels(&request.name)),
            ports: Some(vec![ServicePort {
                port: request.port,
                target_port: Some(IntOrString::Int(request.target_port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Values are stored as their raw bytes, no encoding is applied here.
pub fn build_secret(request: &SecretRequest) -> Secret {
    let data = request
        .data
        .iter()
        .map(|(key, value)| (key.clone(), ByteString(value.as_bytes().to_vec())))
        .collect();

    Secret {
        metadata: metadata(&request.namespace, &request.name),
        type_: Some(request.secret_type.clone()),
        data: Some(data),
        ..Default::default()
    }
}

pub fn build_ingress(request: &IngressRequest) -> Ingress {
    Ingress {
        metadata: metadata(&request.namespace, &request.name),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(request.host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: request.service_name.clone(),
                                port: Some(ServiceBackendPort {
                                    number: Some(request.service_port),
                                    name: None,
                                }),
                            }),
                            resource: None,
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn build_namespace(request: &NamespaceRequest) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(request.name.clone()),
            ..Default::default()
        },
        ..Default::default()
    }
}
