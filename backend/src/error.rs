use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;

use crate::inference::client::GatewayError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request-failing errors, in taxonomy order: validation fails before any
/// network call, configuration before the gateway call, gateway failures fail
/// the whole request. Persistence failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("inference gateway failure: {0}")]
    Gateway(#[from] GatewayError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Gateway(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Configuration(msg) => {
                error!("configuration error: {msg}");
                msg.clone()
            }
            // Raw gateway diagnostics stay in the server log; callers get a
            // generic retry message.
            ApiError::Gateway(err) => {
                error!("inference gateway failure: {err}");
                "Failed to analyze image. Please try again.".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse { error: message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::Validation("No image provided".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn configuration_and_gateway_map_to_server_error() {
        let config = ApiError::Configuration("credential missing".to_string());
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let gateway = ApiError::Gateway(GatewayError::Endpoint {
            status: 503,
            body: "model loading".to_string(),
        });
        assert_eq!(gateway.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn gateway_body_text_is_not_shown_to_callers() {
        let gateway = ApiError::Gateway(GatewayError::Endpoint {
            status: 500,
            body: "internal stack trace".to_string(),
        });
        let response = gateway.error_response();
        let bytes = actix_web::body::to_bytes(response.into_body())
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("stack trace"));
        assert!(text.contains("try again"));
    }
}
