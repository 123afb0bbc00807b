pub mod docs;
pub mod grades;
pub mod policies;
pub mod students;

pub use docs::*;
pub use grades::*;
pub use policies::*;
pub use students::*;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::GradeError;

/// Ejecuta trabajo con I/O de disco en el pool bloqueante de tokio.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, GradeError>
where
    F: FnOnce() -> Result<T, GradeError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res,
        Err(e) => Err(GradeError::Internal(format!("task join error: {}", e))),
    }
}

/// Traduce un `GradeError` a la respuesta HTTP: 400 validación, 404 no
/// encontrado, 500 el resto. El cuerpo lleva siempre `error` (código) y `message`.
pub(crate) fn error_response(err: &GradeError) -> HttpResponse {
    let body = json!({"error": err.code(), "message": err.to_string()});
    match err {
        GradeError::Validation(_) => {
            tracing::info!(code = err.code(), "request rejected: {}", err);
            HttpResponse::BadRequest().json(body)
        }
        GradeError::NotFound { .. } => HttpResponse::NotFound().json(body),
        GradeError::Storage(_) | GradeError::Config(_) | GradeError::Internal(_) => {
            tracing::error!(code = err.code(), "request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}
