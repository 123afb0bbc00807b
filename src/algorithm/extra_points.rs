/// Política de puntos extra.
///
/// La bonificación otorgada es `min(points, cap)` y además nunca supera lo que
/// falta para llegar a `scale_max`. La nota final queda en `[0, scale_max]`.

use crate::error::ValidationError;
use crate::models::ExtraPointsPolicy;

pub fn validate_policy(policy: &ExtraPointsPolicy) -> Result<(), ValidationError> {
    let ExtraPointsPolicy { points, cap } = *policy;
    if !points.is_finite() || !cap.is_finite() || points < 0.0 || cap < 0.0 {
        return Err(ValidationError::InvalidExtraPoints { points, cap });
    }
    Ok(())
}

/// Puntos efectivamente sumados a `base_grade`.
pub fn awarded(base_grade: f64, extra_points: f64, cap: f64, scale_max: f64) -> f64 {
    let headroom = (scale_max - base_grade).max(0.0);
    extra_points.min(cap).min(headroom).max(0.0)
}

pub fn apply(base_grade: f64, extra_points: f64, cap: f64, scale_max: f64) -> f64 {
    let bonus = awarded(base_grade, extra_points, cap, scale_max);
    (base_grade + bonus).clamp(0.0, scale_max)
}

/// Elegible solo si cumplió el criterio en todos los años (lista no vacía).
pub fn check_eligibility(all_years_teachers: &[bool]) -> bool {
    !all_years_teachers.is_empty() && all_years_teachers.iter().all(|&y| y)
}

pub fn points_for(eligible: bool, amount: f64) -> f64 {
    if eligible { amount } else { 0.0 }
}
