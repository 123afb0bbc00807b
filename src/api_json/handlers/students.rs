use actix_web::{HttpResponse, Responder, web};

use super::{blocking, error_response};
use crate::api_json::{RegisterStudentRequest, UpdateEvaluationsRequest};
use crate::server::AppState;
use crate::service;

/// POST /api/v1/students
/// Registra un estudiante (o actualiza su nombre si ya existe).
pub async fn register_student_handler(state: web::Data<AppState>, body: web::Json<RegisterStudentRequest>) -> impl Responder {
    let req = body.into_inner();
    let store = state.store.clone();
    match blocking(move || service::register_student(store.as_ref(), &req.student_id, req.name)).await {
        Ok(record) => HttpResponse::Created().json(record),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/students
pub async fn list_students_handler(state: web::Data<AppState>) -> impl Responder {
    let store = state.store.clone();
    match blocking(move || store.list()).await {
        Ok(students) => HttpResponse::Ok().json(students),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/students/{id}
pub async fn get_student_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let store = state.store.clone();
    match blocking(move || store.load(&student_id)).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/v1/students/{id}
/// Borra el registro y su historial de cálculos.
pub async fn delete_student_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let store = state.store.clone();
    match blocking(move || store.delete(&student_id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/v1/students/{id}/evaluations
/// Reemplaza (por defecto) o amplía (`"mode": "append"`) el conjunto de evaluaciones.
pub async fn update_evaluations_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateEvaluationsRequest>,
) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let req = body.into_inner();
    let store = state.store.clone();
    let config = state.config;
    let res = blocking(move || {
        service::update_evaluations(
            store.as_ref(),
            &config,
            &student_id,
            req.evaluations,
            req.attendance_percentage,
            req.mode,
        )
    })
    .await;
    match res {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => error_response(&e),
    }
}
