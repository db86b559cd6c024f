use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Serialize, Serializer};

use crate::extensions::option::OptionVecExt;

// Absent values go out as "" or 0, which is what clients of the listing routes expect.
fn or_default<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + Default,
{
    match value {
        Some(value) => value.serialize(serializer),
        None => T::default().serialize(serializer),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PodSummary {
    #[serde(rename = "nome")]
    pub name: String,
    pub namespace: String,
    #[serde(serialize_with = "or_default")]
    pub status: Option<String>,
    #[serde(serialize_with = "or_default")]
    pub ip: Option<String>,
    #[serde(serialize_with = "or_default")]
    pub node: Option<String>,
    /// Image of the first container, absent when the pod declares none.
    #[serde(serialize_with = "or_default")]
    pub image: Option<String>,
}

impl From<Pod> for PodSummary {
    fn from(pod: Pod) -> Self {
        let spec = pod.spec.unwrap_or_default();
        let status = pod.status.unwrap_or_default();
        PodSummary {
            name: pod.metadata.name.unwrap_or_default(),
            namespace: pod.metadata.namespace.unwrap_or_default(),
            status: status.phase,
            ip: status.pod_ip,
            node: spec.node_name,
            image: spec
                .containers
                .first()
                .and_then(|container| container.image.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeploymentStatus {
    Ready,
    NotReady,
    Unknown,
}

impl DeploymentStatus {
    pub fn derive(ready_replicas: i32, desired_replicas: i32) -> DeploymentStatus {
        if ready_replicas == desired_replicas && desired_replicas > 0 {
            DeploymentStatus::Ready
        } else if ready_replicas < desired_replicas {
            DeploymentStatus::NotReady
        } else {
            DeploymentStatus::Unknown
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    #[serde(rename = "nome")]
    pub name: String,
    pub namespace: String,
    pub status: DeploymentStatus,
    #[serde(serialize_with = "or_default")]
    pub image: Option<String>,
    pub replicas: i32,
    /// First port declared by the first container.
    #[serde(serialize_with = "or_default")]
    pub container_port: Option<i32>,
    pub selector: BTreeMap<String, String>,
}

impl From<Deployment> for DeploymentSummary {
    fn from(deployment: Deployment) -> Self {
        let spec = deployment.spec.unwrap_or_default();
        let desired_replicas = spec.replicas.unwrap_or(0);
        let ready_replicas = deployment
            .status
            .and_then(|status| status.ready_replicas)
            .unwrap_or(0);
        let first_container = spec
            .template
            .spec
            .as_ref()
            .and_then(|pod_spec| pod_spec.containers.first());

        DeploymentSummary {
            name: deployment.metadata.name.unwrap_or_default(),
            namespace: deployment.metadata.namespace.unwrap_or_default(),
            status: DeploymentStatus::derive(ready_replicas, desired_replicas),
            image: first_container.and_then(|container| container.image.clone()),
            replicas: desired_replicas,
            container_port: first_container
                .and_then(|container| container.ports.first_item())
                .map(|port| port.container_port),
            selector: spec.selector.match_labels.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    #[serde(rename = "nome")]
    pub name: String,
    pub namespace: String,
    #[serde(serialize_with = "or_default")]
    pub port: Option<i32>,
    /// Absent when the target is a named port.
    #[serde(serialize_with = "or_default")]
    pub target_port: Option<i32>,
    pub selector: BTreeMap<String, String>,
    #[serde(rename = "type", serialize_with = "or_default")]
    pub service_type: Option<String>,
    #[serde(rename = "clusterIP", serialize_with = "or_default")]
    pub cluster_ip: Option<String>,
    #[serde(rename = "externalIP", serialize_with = "or_default")]
    pub external_ip: Option<String>,
    #[serde(rename = "loadBalancerIP", serialize_with = "or_default")]
    pub load_balancer_ip: Option<String>,
}

impl From<Service> for ServiceSummary {
    fn from(service: Service) -> Self {
        let spec = service.spec.unwrap_or_default();
        let first_port = spec.ports.first_item();
        let ingress_ip = service
            .status
            .and_then(|status| status.load_balancer)
            .and_then(|load_balancer| load_balancer.ingress)
            .and_then(|ingress| ingress.into_iter().next())
            .and_then(|ingress| ingress.ip)
            .filter(|ip| !ip.is_empty());

        ServiceSummary {
            name: service.metadata.name.unwrap_or_default(),
            namespace: service.metadata.namespace.unwrap_or_default(),
            port: first_port.map(|port| port.port),
            target_port: first_port
                .and_then(|port| port.target_port.as_ref())
                .and_then(|target| match target {
                    IntOrString::Int(number) => Some(*number),
                    IntOrString::String(_) => None,
                }),
            external_ip: spec.external_ips.first_item().cloned(),
            // spec.loadBalancerIP is deprecated but still set on older clusters.
            load_balancer_ip: ingress_ip.or(spec.load_balancer_ip),
            selector: spec.selector.unwrap_or_default(),
            service_type: spec.type_,
            cluster_ip: spec.cluster_ip,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceSummary(pub String);

impl From<Namespace> for NamespaceSummary {
    fn from(namespace: Namespace) -> Self {
        NamespaceSummary(namespace.metadata.name.unwrap_or_default())
    }
}
