// Biblioteca raíz del crate `gradecalc`.
// Reexporta los módulos principales y la API de conveniencia que usan `main`,
// los handlers HTTP y los tests de integración.
pub mod algorithm;
pub mod api_json;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod server;
pub mod service;
pub mod storage;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;

pub use algorithm::calculate;
pub use config::{GradingConfig, ServerConfig};
pub use error::{ConfigError, GradeError, StorageError, ValidationError};
pub use models::{AttendanceRecord, CalculationRecord, CalculationResult, Evaluation, ExtraPointsPolicy, StudentRecord};
pub use storage::{JsonStore, StudentStore};
