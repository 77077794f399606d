use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Taxonomia de erros de toda a superfície da API. Cada handler retorna
// `Result<_, AppError>` e o mapeamento para status HTTP vive aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    // Invariante de negócio: um agendamento exige um lead prévio. O
    // cliente usa a flag `needsRegistration` para abrir o formulário.
    #[error("Registration required before booking")]
    RegistrationRequired,

    #[error("Visitor ID required")]
    VisitorIdRequired,

    #[error("Visitor not found")]
    VisitorNotFound,

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna cada detalhe de validação, indexado por campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "success": false,
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::RegistrationRequired => {
                let body = Json(json!({
                    "success": false,
                    "error": "Registration required before booking",
                    "needsRegistration": true,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::VisitorIdRequired => (StatusCode::BAD_REQUEST, "Visitor ID required"),
            AppError::VisitorNotFound => (StatusCode::NOT_FOUND, "Visitor not found"),

            // Falhas de armazenamento e de upstream viram um 500
            // genérico. O detalhe vai para o log, nunca para o cliente.
            ref e => {
                tracing::error!("Internal server error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn registration_required_carries_flag() {
        let (status, body) = body_json(AppError::RegistrationRequired).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["needsRegistration"], true);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn database_errors_stay_generic() {
        let (status, body) = body_json(AppError::DatabaseError(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("length");
        err.message = Some("required".into());
        errors.add("name", err);

        let (status, body) = body_json(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["name"][0], "required");
    }
}
