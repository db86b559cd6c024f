//! Thin HTTP layer: decodes JSON into the normalized requests, calls the
//! resource components and encodes their results. Every response carries
//! permissive CORS headers so a browser frontend on another origin can call it.

pub mod response;
pub mod routes;

use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::error::InternalError;
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web::{self, Data, JsonConfig, ServiceConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::gateway::response::StatusMessage;
use crate::resources::ControlPlane;

pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
}

// Preflight requests match no route; answer them here and 404 everything else.
async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::NotFound().json(StatusMessage::error(format!(
            "no route for {} {}",
            req.method(),
            req.path()
        )))
    }
}

fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(StatusMessage::error(err.to_string()));
        InternalError::from_response(err, response).into()
    })
}

/// Registers every route, shared by the server and the tests.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(json_config())
        .service(routes::health_check)
        .service(routes::list_pods)
        .service(routes::list_deployments)
        .service(routes::list_services)
        .service(routes::list_namespaces)
        .service(routes::create_resource)
        .service(routes::create_application)
        .service(routes::delete_pod)
        .service(routes::delete_deployment)
        .service(routes::delete_service)
        .service(routes::delete_secret)
        .service(routes::scale_deployment)
        .service(routes::update_deployment_image)
        .service(routes::restart_deployment)
        .default_service(web::to(fallback));
}

pub fn run(listener: TcpListener, control_plane: ControlPlane) -> std::io::Result<Server> {
    let control_plane = Data::new(control_plane);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(TracingLogger::default())
            .app_data(control_plane.clone())
            .configure(configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
