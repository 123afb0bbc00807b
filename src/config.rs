// Parámetros de calificación inyectables.
//
// Nada en el cálculo está fijo en el código: el umbral de asistencia, el tope de
// puntos extra, la escala y el máximo de evaluaciones llegan siempre a través de
// `GradingConfig`. La CLI construye esta estructura desde flags/entorno (.env).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_ATTENDANCE_MIN: f64 = 70.0;
pub const DEFAULT_EXTRA_CAP: f64 = 2.0;
pub const DEFAULT_SCALE_MAX: f64 = 20.0;
pub const DEFAULT_MAX_EVALUATIONS: usize = 10;
pub const DEFAULT_FAILING_GRADE: f64 = 0.0;
pub const DEFAULT_EXTRA_POINTS: f64 = 2.0;
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Porcentaje mínimo de asistencia (0-100) para poder aprobar.
    pub attendance_min: f64,
    /// Máximo de puntos extra que se pueden otorgar.
    pub extra_cap: f64,
    /// Nota máxima de la escala (20 en el sistema vigesimal).
    pub scale_max: f64,
    pub max_evaluations: usize,
    /// Nota final forzada cuando no se cumple la asistencia.
    pub failing_grade: f64,
    /// Bonificación otorgada por la regla de elegibilidad por años.
    pub default_extra_points: f64,
    pub weight_tolerance: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            attendance_min: DEFAULT_ATTENDANCE_MIN,
            extra_cap: DEFAULT_EXTRA_CAP,
            scale_max: DEFAULT_SCALE_MAX,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            failing_grade: DEFAULT_FAILING_GRADE,
            default_extra_points: DEFAULT_EXTRA_POINTS,
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
        }
    }
}

impl GradingConfig {
    /// Rechaza combinaciones que harían el cálculo incoherente.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let finite = [
            self.attendance_min,
            self.extra_cap,
            self.scale_max,
            self.failing_grade,
            self.default_extra_points,
            self.weight_tolerance,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::Invalid("all numeric settings must be finite".into()));
        }
        if !(0.0..=100.0).contains(&self.attendance_min) {
            return Err(ConfigError::Invalid(format!(
                "attendance_min must be within [0, 100], got {}",
                self.attendance_min
            )));
        }
        if self.scale_max <= 0.0 {
            return Err(ConfigError::Invalid(format!("scale_max must be positive, got {}", self.scale_max)));
        }
        if self.extra_cap < 0.0 || self.default_extra_points < 0.0 {
            return Err(ConfigError::Invalid("extra points settings must not be negative".into()));
        }
        if self.max_evaluations == 0 {
            return Err(ConfigError::Invalid("max_evaluations must be at least 1".into()));
        }
        if !(0.0..=self.scale_max).contains(&self.failing_grade) {
            return Err(ConfigError::Invalid(format!(
                "failing_grade must be within [0, {}], got {}",
                self.scale_max, self.failing_grade
            )));
        }
        if self.weight_tolerance < 0.0 {
            return Err(ConfigError::Invalid("weight_tolerance must not be negative".into()));
        }
        Ok(self)
    }
}

/// Configuración del servidor HTTP.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub workers: usize,
    pub data_dir: PathBuf,
    pub grading: GradingConfig,
}

impl ServerConfig {
    pub fn new(bind: impl Into<String>, data_dir: impl Into<PathBuf>, grading: GradingConfig) -> Self {
        Self {
            bind: bind.into(),
            workers: std::cmp::max(1, num_cpus::get()),
            data_dir: data_dir.into(),
            grading,
        }
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        if let Some(n) = workers {
            self.workers = std::cmp::max(1, n);
        }
        self
    }
}

/// Carga `.env` si existe. Las variables ya definidas en el entorno ganan.
///
/// Devuelve la ruta cargada, `None` si no hay `.env`, o el error de lectura o
/// de sintaxis. Se llama antes de instalar el logging, así que quien llama
/// decide cuándo reportarlo.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenv::Error> {
    dotenv_outcome(dotenv::dotenv())
}

fn dotenv_outcome(res: Result<PathBuf, dotenv::Error>) -> Result<Option<PathBuf>, dotenv::Error> {
    match res {
        Ok(path) => Ok(Some(path)),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GradingConfig::default().validate().expect("defaults must validate");
        assert_eq!(cfg.scale_max, 20.0);
        assert_eq!(cfg.max_evaluations, 10);
        assert_eq!(cfg.attendance_min, 70.0);
    }

    #[test]
    fn rejects_attendance_min_above_100() {
        let cfg = GradingConfig { attendance_min: 120.0, ..GradingConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_failing_grade_outside_scale() {
        let cfg = GradingConfig { failing_grade: 25.0, ..GradingConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_max_evaluations() {
        let cfg = GradingConfig { max_evaluations: 0, ..GradingConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn workers_never_drop_to_zero() {
        let cfg = ServerConfig::new("127.0.0.1:0", "data", GradingConfig::default()).with_workers(Some(0));
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn missing_dotenv_is_not_an_error() {
        let missing = dotenv::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(dotenv_outcome(Err(missing)), Ok(None)));
        assert_eq!(dotenv_outcome(Ok(PathBuf::from(".env"))).unwrap(), Some(PathBuf::from(".env")));
    }

    #[test]
    fn malformed_dotenv_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "this line is not a key value pair\n").unwrap();
        let res = dotenv_outcome(dotenv::from_path(&path).map(|_| path.clone()));
        assert!(matches!(res, Err(dotenv::Error::LineParse(..))));

        let denied = dotenv::Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(dotenv_outcome(Err(denied)).is_err());
    }
}
