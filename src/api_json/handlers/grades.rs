use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use super::{blocking, error_response};
use crate::api_json::{CalculateGradeRequest, GradeCalculationResponse};
use crate::error::GradeError;
use crate::server::AppState;
use crate::service;

/// POST /api/v1/calculate-grade
/// Calcula la nota final, guarda las entradas en el registro del alumno y
/// añade el cálculo a su historial.
pub async fn calculate_grade_handler(state: web::Data<AppState>, body: web::Json<CalculateGradeRequest>) -> impl Responder {
    let start = std::time::Instant::now();
    let config = state.config;
    let request = body.into_inner().into_grade_request(&config);
    let store = state.store.clone();

    let res = blocking(move || service::grade_student(store.as_ref(), &config, request)).await;
    match res {
        Ok(entry) => {
            tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "calculate-grade served");
            HttpResponse::Ok().json(GradeCalculationResponse::from(entry.result))
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/grade-detail/{id}
/// Último cálculo registrado del estudiante.
pub async fn grade_detail_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let store = state.store.clone();
    let lookup_id = student_id.clone();
    match blocking(move || store.latest_calculation(&lookup_id)).await {
        Ok(Some(entry)) => {
            let detail = entry.result.detail();
            HttpResponse::Ok().json(json!({"calculation": entry, "detail": detail}))
        }
        Ok(None) => no_calculations(&student_id),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/calculations/{id}
/// Historial completo, del más antiguo al más reciente.
pub async fn calculation_history_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let store = state.store.clone();
    let lookup_id = student_id.clone();
    match blocking(move || store.calculations(&lookup_id)).await {
        Ok(history) if history.is_empty() => no_calculations(&student_id),
        Ok(history) => HttpResponse::Ok().json(history),
        Err(e) => error_response(&e),
    }
}

fn no_calculations(student_id: &str) -> HttpResponse {
    let err = GradeError::not_found(student_id);
    HttpResponse::NotFound().json(json!({
        "error": err.code(),
        "message": format!("no calculations recorded for student {}", student_id)
    }))
}
