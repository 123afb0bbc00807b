use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, web};
use serde_json::json;
use std::sync::Arc;

use crate::api_json::handlers::*;
use crate::config::{GradingConfig, ServerConfig};
use crate::error::GradeError;
use crate::storage::{JsonStore, StudentStore};

/// Estado compartido por todos los workers. La calculadora no guarda estado;
/// el almacenamiento serializa sus propias escrituras.
pub struct AppState {
    pub config: GradingConfig,
    pub store: Arc<dyn StudentStore>,
}

impl AppState {
    pub fn new(config: GradingConfig, store: Arc<dyn StudentStore>) -> Self {
        Self { config, store }
    }
}

/// Rutas de la API. Separado de `run_server` para poder montarlo en tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_cfg = web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({"error": "invalid_json", "message": format!("invalid JSON body: {}", err)});
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_cfg)
        .route("/", web::get().to(root_handler))
        .route("/health", web::get().to(health_handler))
        .route("/help", web::get().to(help_handler))
        .service(
            web::scope("/api/v1")
                .route("/students", web::post().to(register_student_handler))
                .route("/students", web::get().to(list_students_handler))
                .route("/students/{id}", web::get().to(get_student_handler))
                .route("/students/{id}", web::delete().to(delete_student_handler))
                .route("/students/{id}/evaluations", web::put().to(update_evaluations_handler))
                .route("/calculate-grade", web::post().to(calculate_grade_handler))
                .route("/grade-detail/{id}", web::get().to(grade_detail_handler))
                .route("/calculations/{id}", web::get().to(calculation_history_handler))
                .route("/attendance/{id}", web::get().to(attendance_handler))
                .route("/extra-points/{id}", web::get().to(extra_points_handler)),
        );
}

pub async fn run_server(config: ServerConfig) -> Result<(), GradeError> {
    let store = JsonStore::open(&config.data_dir)?;
    let state = web::Data::new(AppState::new(config.grading, Arc::new(store)));

    tracing::info!(
        bind = %config.bind,
        workers = config.workers,
        data_dir = %config.data_dir.display(),
        "starting HTTP server"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .workers(config.workers)
    .bind(&config.bind)
    .map_err(|e| GradeError::Internal(format!("failed to bind {}: {}", config.bind, e)))?
    .run()
    .await
    .map_err(|e| GradeError::Internal(format!("server error: {}", e)))
}
