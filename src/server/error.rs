use crate::utils::error::{ErrorCategory, LeadError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub erro: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            erro: message.into(),
        }
    }
}

pub fn status_for(error: &LeadError) -> StatusCode {
    match error {
        LeadError::DuplicateLead { .. } => StatusCode::CONFLICT,
        other => match other.category() {
            ErrorCategory::Data => StatusCode::BAD_REQUEST,
            ErrorCategory::Access => StatusCode::FORBIDDEN,
            ErrorCategory::Quota => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Network | ErrorCategory::Provider => StatusCode::BAD_GATEWAY,
            ErrorCategory::Configuration | ErrorCategory::System => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {} (Severity: {:?})", self, self.severity());
        } else {
            tracing::debug!("Request rejected with {}: {}", status, self);
        }
        (status, Json(ErrorBody::new(self.user_friendly_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&LeadError::QuotaExhausted { user_id: 1 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&LeadError::NotFound { entity: "Coleta", id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&LeadError::AccessDenied { reason: "x".to_string() }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&LeadError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: "bad".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&LeadError::InvalidConfigValueError {
                field: "raio_km".to_string(),
                value: "99".to_string(),
                reason: "range".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
    }
}
