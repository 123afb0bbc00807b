//! Tipos de error del crate.
//!
//! - `ValidationError`: entrada mal formada (evaluaciones, asistencia, puntos extra).
//! - `StorageError`: fallos de I/O o JSON corrupto en el almacenamiento.
//! - `ConfigError`: configuración inconsistente al arrancar.
//! - `GradeError`: error de alto nivel que ven la API y la CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Rechazo de una entrada mal formada. Nunca se corrige ni se reintenta.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("at least one evaluation is required")]
    Empty,

    #[error("too many evaluations: {count} (maximum is {max})")]
    TooManyEvaluations { count: usize, max: usize },

    #[error("evaluation #{index} has score {score}, expected a value in [0, {max}]")]
    ScoreOutOfRange { index: usize, score: f64, max: f64 },

    #[error("evaluation #{index} has weight {weight}, expected a value in (0, 1]")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },

    #[error("attendance percentage {percentage} is outside [0, 100]")]
    AttendanceOutOfRange { percentage: f64 },

    #[error("invalid extra points policy: points={points}, cap={cap}")]
    InvalidExtraPoints { points: f64, cap: f64 },

    #[error("student id must not be empty")]
    EmptyStudentId,
}

impl ValidationError {
    /// Código estable para clientes de la API.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Empty => "empty_evaluations",
            ValidationError::TooManyEvaluations { .. } => "too_many_evaluations",
            ValidationError::ScoreOutOfRange { .. } => "score_out_of_range",
            ValidationError::InvalidWeight { .. } => "invalid_weight",
            ValidationError::WeightSum { .. } => "weights_do_not_sum_to_one",
            ValidationError::AttendanceOutOfRange { .. } => "attendance_out_of_range",
            ValidationError::InvalidExtraPoints { .. } => "invalid_extra_points",
            ValidationError::EmptyStudentId => "empty_student_id",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt JSON in {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("student not found: {student_id}")]
    NotFound { student_id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GradeError {
    pub fn not_found(student_id: impl Into<String>) -> Self {
        GradeError::NotFound { student_id: student_id.into() }
    }

    /// Código legible por máquina, usado en las respuestas JSON de error.
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::Validation(e) => e.code(),
            GradeError::NotFound { .. } => "not_found",
            GradeError::Storage(_) => "storage_error",
            GradeError::Config(_) => "config_error",
            GradeError::Internal(_) => "internal_error",
        }
    }
}

pub type Result<T, E = GradeError> = std::result::Result<T, E>;
