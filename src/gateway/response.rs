use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::kubernetes::model::ClusterError;
use crate::resources::error::ResourceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> StatusMessage {
        StatusMessage {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> StatusMessage {
        StatusMessage {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

impl ResponseError for ResourceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ResourceError::Validation(_) => StatusCode::BAD_REQUEST,
            ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResourceError::Conflict { .. } => StatusCode::CONFLICT,
            ResourceError::Call {
                source: ClusterError::Conflict(..),
                ..
            } => StatusCode::CONFLICT,
            ResourceError::NoContainers { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ResourceError::List { .. } | ResourceError::Call { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(StatusMessage::error(self.to_string()))
    }
}
