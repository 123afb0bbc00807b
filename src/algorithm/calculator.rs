/// Calculadora de nota final.
///
/// Proceso determinista:
/// 1. Validar evaluaciones, asistencia y política de puntos extra
/// 2. Promedio ponderado en orden de entrada
/// 3. Compuerta de asistencia (si falla, nota = `failing_grade` y no hay bonus)
/// 4. Puntos extra con tope y recorte a la escala

use crate::algorithm::{attendance, extra_points, validation};
use crate::config::GradingConfig;
use crate::error::ValidationError;
use crate::models::{AttendanceRecord, CalculationResult, Contribution, Evaluation, ExtraPointsPolicy};

pub fn calculate(
    config: &GradingConfig,
    evaluations: &[Evaluation],
    attendance_record: &AttendanceRecord,
    policy: &ExtraPointsPolicy,
) -> Result<CalculationResult, ValidationError> {
    validation::validate_evaluations(evaluations, config)?;
    validation::validate_attendance(attendance_record.percentage)?;
    extra_points::validate_policy(policy)?;

    let breakdown = breakdown(evaluations);
    let weighted_sum = breakdown.iter().fold(0.0, |acc, c| acc + c.contribution);

    let attendance_ok = attendance::check(attendance_record.percentage, config.attendance_min);
    let result = if !attendance_ok {
        CalculationResult {
            weighted_sum,
            attendance_ok,
            attendance_penalty: weighted_sum,
            extra_applied: 0.0,
            final_grade: config.failing_grade,
            breakdown,
        }
    } else {
        let extra_applied = extra_points::awarded(weighted_sum, policy.points, policy.cap, config.scale_max);
        let final_grade = extra_points::apply(weighted_sum, policy.points, policy.cap, config.scale_max);
        CalculationResult {
            weighted_sum,
            attendance_ok,
            attendance_penalty: 0.0,
            extra_applied,
            final_grade,
            breakdown,
        }
    };

    tracing::debug!(
        evaluations = evaluations.len(),
        weighted_sum = result.weighted_sum,
        attendance_ok = result.attendance_ok,
        final_grade = result.final_grade,
        "grade calculated"
    );

    Ok(result)
}

/// Aporte `score × weight` de cada evaluación, conservando el orden.
pub fn breakdown(evaluations: &[Evaluation]) -> Vec<Contribution> {
    evaluations
        .iter()
        .map(|e| Contribution {
            name: e.name.clone(),
            score: e.score,
            weight: e.weight,
            contribution: e.score * e.weight,
        })
        .collect()
}
