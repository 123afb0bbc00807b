/// Validación del conjunto de evaluaciones de un estudiante.
///
/// El conjunto se rechaza (nunca se normaliza) si está vacío, supera el máximo
/// configurado, contiene notas fuera de escala o pesos fuera de (0, 1], o si
/// los pesos no suman 1.0 dentro de la tolerancia.

use crate::config::GradingConfig;
use crate::error::ValidationError;
use crate::models::{Evaluation, UpdateMode};

pub fn validate_evaluations(evaluations: &[Evaluation], config: &GradingConfig) -> Result<(), ValidationError> {
    if evaluations.is_empty() {
        return Err(ValidationError::Empty);
    }

    if evaluations.len() > config.max_evaluations {
        return Err(ValidationError::TooManyEvaluations {
            count: evaluations.len(),
            max: config.max_evaluations,
        });
    }

    for (i, e) in evaluations.iter().enumerate() {
        // índice 1-based para mensajes legibles
        let index = i + 1;
        if !e.score.is_finite() || e.score < 0.0 || e.score > config.scale_max {
            return Err(ValidationError::ScoreOutOfRange { index, score: e.score, max: config.scale_max });
        }
        if !e.weight.is_finite() || e.weight <= 0.0 || e.weight > 1.0 {
            return Err(ValidationError::InvalidWeight { index, weight: e.weight });
        }
    }

    let sum = weight_sum(evaluations);
    if (sum - 1.0).abs() > config.weight_tolerance {
        return Err(ValidationError::WeightSum { sum });
    }

    Ok(())
}

/// Suma de pesos en orden de entrada.
pub fn weight_sum(evaluations: &[Evaluation]) -> f64 {
    evaluations.iter().fold(0.0, |acc, e| acc + e.weight)
}

pub fn validate_attendance(percentage: f64) -> Result<(), ValidationError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(ValidationError::AttendanceOutOfRange { percentage });
    }
    Ok(())
}

pub fn validate_student_id(student_id: &str) -> Result<(), ValidationError> {
    if student_id.trim().is_empty() {
        return Err(ValidationError::EmptyStudentId);
    }
    Ok(())
}

/// Id sin espacios alrededor; es la forma con la que se guarda y se busca.
pub fn normalize_student_id(student_id: &str) -> Result<&str, ValidationError> {
    let trimmed = student_id.trim();
    validate_student_id(trimmed)?;
    Ok(trimmed)
}

/// Combina el conjunto guardado con el nuevo según `mode` y valida el resultado
/// completo. Devuelve el conjunto que debe persistirse.
pub fn merge_evaluations(
    existing: &[Evaluation],
    incoming: Vec<Evaluation>,
    mode: UpdateMode,
    config: &GradingConfig,
) -> Result<Vec<Evaluation>, ValidationError> {
    let merged = match mode {
        UpdateMode::Replace => incoming,
        UpdateMode::Append => {
            let mut all = existing.to_vec();
            all.extend(incoming);
            all
        }
    };
    validate_evaluations(&merged, config)?;
    Ok(merged)
}
