use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use crate::api_json::CalculateGradeRequest;
use crate::models::Evaluation;
use crate::server::AppState;

pub async fn root_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Grade Calculator API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "help": "/help"
    }))
}

pub async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

pub async fn help_handler(state: web::Data<AppState>) -> impl Responder {
    // Ejemplo de petición para POST /api/v1/calculate-grade
    let example = CalculateGradeRequest {
        student_id: "202012345".to_string(),
        evaluations: Some(vec![
            Evaluation::new("Midterm", 16.0, 0.6),
            Evaluation::new("Final", 14.0, 0.4),
        ]),
        attendance_percentage: Some(80.0),
        extra_points: Some(2.0),
        all_years_teachers: None,
    };

    let help = json!({
        "description": "Final grade calculator. Register a student, then POST /api/v1/calculate-grade with weighted evaluations (weights sum to 1.0), attendance percentage and optional extra points.",
        "post_example": example,
        "endpoints": [
            "POST /api/v1/students",
            "GET /api/v1/students",
            "GET /api/v1/students/{id}",
            "DELETE /api/v1/students/{id}",
            "PUT /api/v1/students/{id}/evaluations",
            "POST /api/v1/calculate-grade",
            "GET /api/v1/grade-detail/{id}",
            "GET /api/v1/calculations/{id}",
            "GET /api/v1/attendance/{id}?percentage=80",
            "GET /api/v1/extra-points/{id}?all_years_teachers=true,true"
        ],
        "config": state.config
    });

    HttpResponse::Ok().json(help)
}
