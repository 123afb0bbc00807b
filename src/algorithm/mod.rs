// Módulo de alto nivel para el cálculo de notas
// Declarar submódulos (archivos en la carpeta `src/algorithm`)
pub mod attendance;
pub mod extra_points;
pub mod validation;
mod calculator;

// Reexportar solo la API pública que se usa desde la API y la CLI
pub use calculator::{breakdown, calculate};
pub use validation::{merge_evaluations, validate_evaluations};

use crate::config::GradingConfig;
use crate::models::ExtraPointsPolicy;

/// Resuelve la política de puntos extra de una petición: puntos explícitos o,
/// si no vienen, la regla de elegibilidad por años. El tope siempre sale de la
/// configuración.
pub fn resolve_extra_policy(
    config: &GradingConfig,
    extra_points: Option<f64>,
    all_years_teachers: Option<&[bool]>,
) -> ExtraPointsPolicy {
    let points = match (extra_points, all_years_teachers) {
        (Some(p), _) => p,
        (None, Some(years)) => {
            extra_points::points_for(extra_points::check_eligibility(years), config.default_extra_points)
        }
        (None, None) => 0.0,
    };
    ExtraPointsPolicy::new(points, config.extra_cap)
}
