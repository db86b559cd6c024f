use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, HttpResponse, Responder};
use serde::Deserialize;

use crate::gateway::response::StatusMessage;
use crate::resources::error::ResourceError;
use crate::resources::request::{CreateApplicationRequest, CreateResourceRequest};
use crate::resources::ControlPlane;

#[derive(Debug, Deserialize)]
pub struct ObjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    pub replicas: i32,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(StatusMessage::success("ok"))
}

#[get("/listAllPods/{namespace}")]
pub async fn list_pods(
    control_plane: Data<ControlPlane>,
    namespace: Path<String>,
) -> Result<impl Responder, ResourceError> {
    let pods = control_plane.lister.list_pods(&namespace).await?;
    Ok(Json(pods))
}

#[get("/listAllDeployments/{namespace}")]
pub async fn list_deployments(
    control_plane: Data<ControlPlane>,
    namespace: Path<String>,
) -> Result<impl Responder, ResourceError> {
    let deployments = control_plane.lister.list_deployments(&namespace).await?;
    Ok(Json(deployments))
}

#[get("/listAllServices/{namespace}")]
pub async fn list_services(
    control_plane: Data<ControlPlane>,
    namespace: Path<String>,
) -> Result<impl Responder, ResourceError> {
    let services = control_plane.lister.list_services(&namespace).await?;
    Ok(Json(services))
}

#[get("/listAllNs")]
pub async fn list_namespaces(
    control_plane: Data<ControlPlane>,
) -> Result<impl Responder, ResourceError> {
    let namespaces = control_plane.lister.list_namespaces().await?;
    Ok(Json(namespaces))
}

#[post("/createResource")]
pub async fn create_resource(
    control_plane: Data<ControlPlane>,
    request: Json<CreateResourceRequest>,
) -> Result<impl Responder, ResourceError> {
    let created = control_plane
        .creator
        .create_resource(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(StatusMessage::success(format!(
        "{} '{}' is being created",
        created.kind, created.name
    ))))
}

#[post("/createApplication")]
pub async fn create_application(
    control_plane: Data<ControlPlane>,
    request: Json<CreateApplicationRequest>,
) -> Result<impl Responder, ResourceError> {
    let created = control_plane
        .creator
        .create_application(request.into_inner())
        .await?;
    let names: Vec<String> = created
        .iter()
        .map(|created| format!("{} '{}'", created.kind, created.name))
        .collect();
    Ok(HttpResponse::Created().json(StatusMessage::success(format!(
        "{} are being created",
        names.join(" and ")
    ))))
}

#[post("/deletePod")]
pub async fn delete_pod(
    control_plane: Data<ControlPlane>,
    request: Json<ObjectRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .deleter
        .delete_pod(&request.name, &request.namespace)
        .await?;
    Ok(deleted("pod", &request.name))
}

#[post("/deleteDeployment")]
pub async fn delete_deployment(
    control_plane: Data<ControlPlane>,
    request: Json<ObjectRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .deleter
        .delete_deployment(&request.name, &request.namespace)
        .await?;
    Ok(deleted("deployment", &request.name))
}

#[post("/deleteService")]
pub async fn delete_service(
    control_plane: Data<ControlPlane>,
    request: Json<ObjectRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .deleter
        .delete_service(&request.name, &request.namespace)
        .await?;
    Ok(deleted("service", &request.name))
}

#[post("/deleteSecret")]
pub async fn delete_secret(
    control_plane: Data<ControlPlane>,
    request: Json<ObjectRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .deleter
        .delete_secret(&request.name, &request.namespace)
        .await?;
    Ok(deleted("secret", &request.name))
}

fn deleted(kind: &str, name: &str) -> HttpResponse {
    HttpResponse::Ok().json(StatusMessage::success(format!("{kind} '{name}' deleted")))
}

#[post("/scaleDeployment")]
pub async fn scale_deployment(
    control_plane: Data<ControlPlane>,
    request: Json<ScaleRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .updater
        .scale_deployment(&request.namespace, &request.name, request.replicas)
        .await?;
    Ok(HttpResponse::Ok().json(StatusMessage::success(format!(
        "deployment '{}' scaled to {} replicas",
        request.name, request.replicas
    ))))
}

#[post("/updateDeploymentImage")]
pub async fn update_deployment_image(
    control_plane: Data<ControlPlane>,
    request: Json<ImageRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .updater
        .update_deployment_image(&request.namespace, &request.name, &request.image)
        .await?;
    Ok(HttpResponse::Ok().json(StatusMessage::success(format!(
        "deployment '{}' now runs {}",
        request.name, request.image
    ))))
}

#[post("/restartDeployment")]
pub async fn restart_deployment(
    control_plane: Data<ControlPlane>,
    request: Json<ObjectRequest>,
) -> Result<impl Responder, ResourceError> {
    control_plane
        .updater
        .restart_deployment(&request.namespace, &request.name)
        .await?;
    Ok(HttpResponse::Ok().json(StatusMessage::success(format!(
        "deployment '{}' is restarting",
        request.name
    ))))
}
