//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// El backend espacial no respondió - el caller debe reintentar,
    /// nunca se confunde con "cero zonas encontradas".
    #[error("Geometry query failed: {0}")]
    GeometryQueryFailed(String),

    /// Muestra GPS anterior a la última procesada para el mismo vehículo.
    #[error("Out of order GPS sample: {0}")]
    OutOfOrderSample(String),

    /// Polígono de zona inválido - se rechaza al crear la zona.
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    /// Monto inválido para operaciones de wallet (recargas/reembolsos).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Timeout en operación de wallet - se reintenta internamente con
    /// backoff y degrada a transacción pendiente, no llega al caller GPS.
    #[error("Wallet operation timeout: {0}")]
    WalletOperationTimeout(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code: Some("UNAUTHORIZED".to_string()),
                },
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: Some("CONFLICT".to_string()),
                },
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BAD_REQUEST".to_string()),
                },
            ),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: "Service Unavailable".to_string(),
                    message: msg,
                    details: None,
                    code: Some("SERVICE_UNAVAILABLE".to_string()),
                },
            ),

            AppError::GeometryQueryFailed(msg) => {
                tracing::error!("Geometry query failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Geometry Query Failed".to_string(),
                        message: "Spatial backend unavailable, retry the sample".to_string(),
                        details: Some(json!({ "geometry_error": msg })),
                        code: Some("GEOMETRY_QUERY_FAILED".to_string()),
                    },
                )
            }

            AppError::OutOfOrderSample(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Out Of Order Sample".to_string(),
                    message: msg,
                    details: None,
                    code: Some("OUT_OF_ORDER_SAMPLE".to_string()),
                },
            ),

            AppError::InvalidPolygon(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid Polygon".to_string(),
                    message: msg,
                    details: None,
                    code: Some("INVALID_POLYGON".to_string()),
                },
            ),

            AppError::InvalidAmount(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid Amount".to_string(),
                    message: msg,
                    details: None,
                    code: Some("INVALID_AMOUNT".to_string()),
                },
            ),

            AppError::WalletOperationTimeout(msg) => {
                tracing::error!("Wallet operation timeout: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Wallet Operation Timeout".to_string(),
                        message: "Wallet backend did not respond in time".to_string(),
                        details: Some(json!({ "timeout_error": msg })),
                        code: Some("WALLET_TIMEOUT".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_message() {
        let err = not_found_error("Vehicle", "abc-123");
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("Vehicle"));
        assert!(err.to_string().contains("abc-123"));
    }

    #[test]
    fn test_conflict_error_message() {
        let err = conflict_error("Vehicle", "plate_number", "KA-01-1234");
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("KA-01-1234"));
    }
}
