//! Normalized creation requests.
//!
//! [`CreateResourceRequest`] is the loose wire shape the gateway decodes: every
//! field optional and `kind` a plain string. [`ResourceSpec`] is the closed sum
//! type the creator dispatches on. Converting one into the other is where all
//! kind-specific validation happens, so a [`ResourceSpec`] value is always
//! complete and the creator never sees a malformed request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extensions::option::{OptionExt, OptionStringExt};
use crate::kubernetes::model::{object_key, ObjectKey};
use crate::resources::error::ValidationError;

pub const VALID_KINDS: [&str; 7] = [
    "pod",
    "container",
    "deployment",
    "service",
    "secret",
    "ingress",
    "namespace",
];

pub const OPAQUE_SECRET_TYPE: &str = "Opaque";
pub const DEFAULT_SERVICE_TYPE: &str = "ClusterIP";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
    Secret,
    Ingress,
    Namespace,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Deployment => "deployment",
            ResourceKind::Service => "service",
            ResourceKind::Secret => "secret",
            ResourceKind::Ingress => "ingress",
            ResourceKind::Namespace => "namespace",
        }
    }

    /// `container` is accepted as an alias of `pod`.
    pub fn parse(kind: &str) -> Result<ResourceKind, ValidationError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "pod" | "container" => Ok(ResourceKind::Pod),
            "deployment" => Ok(ResourceKind::Deployment),
            "service" => Ok(ResourceKind::Service),
            "secret" => Ok(ResourceKind::Secret),
            "ingress" => Ok(ResourceKind::Ingress),
            "namespace" => Ok(ResourceKind::Namespace),
            _ => Err(ValidationError::UnknownKind(kind.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation payload as it arrives on the wire.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub replicas: Option<i32>,
    pub container_port: Option<i32>,
    pub env: Option<BTreeMap<String, String>>,
    pub secret_type: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
    pub host: Option<String>,
    pub service_name: Option<String>,
    pub service_port: Option<i32>,
    pub service_type: Option<String>,
    pub port: Option<i32>,
    pub target_port: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRequest {
    pub namespace: String,
    pub name: String,
    pub image: String,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub namespace: String,
    pub name: String,
    pub image: String,
    pub replicas: i32,
    /// `None` means no port is declared on the container at all.
    pub container_port: Option<i32>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub namespace: String,
    pub name: String,
    pub service_type: String,
    pub port: i32,
    pub target_port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub namespace: String,
    pub name: String,
    pub secret_type: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRequest {
    pub namespace: String,
    pub name: String,
    pub host: String,
    pub service_name: String,
    pub service_port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRequest {
    pub name: String,
}

/// A validated creation request, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    Pod(PodRequest),
    Deployment(DeploymentRequest),
    Service(ServiceRequest),
    Secret(SecretRequest),
    Ingress(IngressRequest),
    Namespace(NamespaceRequest),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Pod(_) => ResourceKind::Pod,
            ResourceSpec::Deployment(_) => ResourceKind::Deployment,
            ResourceSpec::Service(_) => ResourceKind::Service,
            ResourceSpec::Secret(_) => ResourceKind::Secret,
            ResourceSpec::Ingress(_) => ResourceKind::Ingress,
            ResourceSpec::Namespace(_) => ResourceKind::Namespace,
        }
    }

    pub fn key(&self) -> ObjectKey {
        match self {
            ResourceSpec::Pod(r) => object_key(&r.namespace, &r.name),
            ResourceSpec::Deployment(r) => object_key(&r.namespace, &r.name),
            ResourceSpec::Service(r) => object_key(&r.namespace, &r.name),
            ResourceSpec::Secret(r) => object_key(&r.namespace, &r.name),
            ResourceSpec::Ingress(r) => object_key(&r.namespace, &r.name),
            ResourceSpec::Namespace(r) => object_key("", &r.name),
        }
    }
}

fn required(
    value: Option<String>,
    kind: ResourceKind,
    field: &'static str,
) -> Result<String, ValidationError> {
    value.non_blank().to_result(|| ValidationError::MissingField {
        kind: kind.as_str(),
        field,
    })
}

fn required_number(
    value: Option<i32>,
    kind: ResourceKind,
    field: &'static str,
) -> Result<i32, ValidationError> {
    value.to_result(|| ValidationError::MissingField {
        kind: kind.as_str(),
        field,
    })
}

fn port(value: i32, field: &'static str) -> Result<i32, ValidationError> {
    if (1..=65535).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidPort { field, value })
    }
}

/// Any non-negative count is accepted. Negative counts are refused at creation as
/// well as when scaling.
fn replicas(value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        Err(ValidationError::NegativeReplicas(value))
    } else {
        Ok(value)
    }
}

/// 0 and absent both mean "declare no port". A negative port is a validation
/// error instead of being dropped silently.
fn optional_port(value: Option<i32>, field: &'static str) -> Result<Option<i32>, ValidationError> {
    match value {
        None | Some(0) => Ok(None),
        Some(value) => port(value, field).map(Some),
    }
}

/// Checks namespace and name of an object addressed by an existing-object operation.
pub fn validated_key(
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) -> Result<ObjectKey, ValidationError> {
    let namespace = required(Some(namespace.to_string()), kind, "namespace")?;
    let name = required(Some(name.to_string()), kind, "name")?;
    Ok(object_key(namespace, name))
}

fn deployment_request(request: CreateResourceRequest) -> Result<DeploymentRequest, ValidationError> {
    let kind = ResourceKind::Deployment;
    Ok(DeploymentRequest {
        namespace: required(request.namespace, kind, "namespace")?,
        name: required(request.name, kind, "name")?,
        image: required(request.image, kind, "image")?,
        replicas: replicas(required_number(request.replicas, kind, "replicas")?)?,
        container_port: optional_port(request.container_port, "containerPort")?,
        env: request.env.unwrap_or_default(),
    })
}

// The target port follows the service port unless given.
fn service_request(request: CreateResourceRequest) -> Result<ServiceRequest, ValidationError> {
    let kind = ResourceKind::Service;
    let namespace = required(request.namespace, kind, "namespace")?;
    let name = required(request.name, kind, "name")?;
    let service_port = port(required_number(request.port, kind, "port")?, "port")?;
    let target_port = match request.target_port {
        Some(target_port) => port(target_port, "targetPort")?,
        None => service_port,
    };
    Ok(ServiceRequest {
        namespace,
        name,
        service_type: request
            .service_type
            .non_blank()
            .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string()),
        port: service_port,
        target_port,
    })
}

impl TryFrom<CreateResourceRequest> for ResourceSpec {
    type Error = ValidationError;

    fn try_from(request: CreateResourceRequest) -> Result<Self, Self::Error> {
        let kind_field = request
            .kind
            .clone()
            .non_blank()
            .to_result(|| ValidationError::MissingField {
                kind: "resource",
                field: "kind",
            })?;
        let kind = ResourceKind::parse(&kind_field)?;

        let spec = match kind {
            ResourceKind::Namespace => ResourceSpec::Namespace(NamespaceRequest {
                name: required(request.name, kind, "name")?,
            }),
            ResourceKind::Pod => ResourceSpec::Pod(PodRequest {
                namespace: required(request.namespace, kind, "namespace")?,
                name: required(request.name, kind, "name")?,
                image: required(request.image, kind, "image")?,
                env: request.env.unwrap_or_default(),
            }),
            ResourceKind::Deployment => ResourceSpec::Deployment(deployment_request(request)?),
            ResourceKind::Service => ResourceSpec::Service(service_request(request)?),
            ResourceKind::Secret => ResourceSpec::Secret(SecretRequest {
                namespace: required(request.namespace, kind, "namespace")?,
                name: required(request.name, kind, "name")?,
                secret_type: request
                    .secret_type
                    .non_blank()
                    .unwrap_or_else(|| OPAQUE_SECRET_TYPE.to_string()),
                data: request.data.unwrap_or_default(),
            }),
            ResourceKind::Ingress => ResourceSpec::Ingress(IngressRequest {
                namespace: required(request.namespace, kind, "namespace")?,
                name: required(request.name, kind, "name")?,
                host: required(request.host, kind, "host")?,
                service_name: required(request.service_name, kind, "serviceName")?,
                service_port: port(
                    required_number(request.service_port, kind, "servicePort")?,
                    "servicePort",
                )?,
            }),
        };
        Ok(spec)
    }
}

/// A deployment plus a service in front of it, created together.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub replicas: Option<i32>,
    pub container_port: Option<i32>,
    pub env: Option<BTreeMap<String, String>>,
    pub service_type: Option<String>,
    pub service_port: Option<i32>,
    pub target_port: Option<i32>,
}

impl CreateApplicationRequest {
    /// Validates both halves up front so nothing is created from a bad request.
    pub fn validate(self) -> Result<(DeploymentRequest, ServiceRequest), ValidationError> {
        let deployment = deployment_request(CreateResourceRequest {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            image: self.image,
            replicas: self.replicas,
            container_port: self.container_port,
            env: self.env,
            ..Default::default()
        })?;

        // Without an explicit target the service forwards to the declared container port.
        let target_port = self.target_port.or(deployment.container_port);
        let service = service_request(CreateResourceRequest {
            namespace: self.namespace,
            name: self.name,
            service_type: self.service_type,
            port: self.service_port,
            target_port,
            ..Default::default()
        })?;

        Ok((deployment, service))
    }
}
