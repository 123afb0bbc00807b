use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use super::error_response;
use crate::algorithm::{attendance, extra_points, validation};
use crate::api_json::{AttendanceQuery, ExtraPointsQuery, parse_year_flags};
use crate::server::AppState;

/// GET /api/v1/attendance/{id}?percentage=80
/// Consulta la compuerta de asistencia sin calcular la nota.
pub async fn attendance_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<AttendanceQuery>,
) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let percentage = query.percentage;
    if let Err(e) = validation::validate_attendance(percentage) {
        return error_response(&e.into());
    }

    let minimum = state.config.attendance_min;
    let ok = attendance::check(percentage, minimum);
    let detail = if ok { "meets minimum attendance" } else { "below minimum attendance" };
    HttpResponse::Ok().json(json!({
        "student_id": student_id,
        "percentage": percentage,
        "minimum": minimum,
        "attendance_ok": ok,
        "detail": detail
    }))
}

/// GET /api/v1/extra-points/{id}?all_years_teachers=true,true,false
/// Consulta la elegibilidad para puntos extra (criterio cumplido todos los años).
pub async fn extra_points_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ExtraPointsQuery>,
) -> impl Responder {
    let student_id = path.into_inner().trim().to_string();
    let years = match parse_year_flags(&query.all_years_teachers) {
        Ok(v) => v,
        Err(msg) => {
            return HttpResponse::BadRequest().json(json!({"error": "invalid_year_flags", "message": msg}));
        }
    };

    let eligible = extra_points::check_eligibility(&years);
    let points = extra_points::points_for(eligible, state.config.default_extra_points);
    let detail = if eligible {
        format!("eligible for {:.2} extra points", points)
    } else {
        "not eligible for extra points".to_string()
    };
    HttpResponse::Ok().json(json!({
        "student_id": student_id,
        "all_years_teachers": years,
        "eligible": eligible,
        "extra_points": points,
        "cap": state.config.extra_cap,
        "detail": detail
    }))
}
