// Estructuras de datos principales

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Una evaluación con su nota y su peso (fracción de 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

impl Evaluation {
    pub fn new(name: impl Into<String>, score: f64, weight: f64) -> Self {
        Self { name: name.into(), score, weight }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Porcentaje de asistencia (0.0 - 100.0)
    pub percentage: f64,
}

impl AttendanceRecord {
    pub fn new(percentage: f64) -> Self {
        Self { percentage }
    }
}

impl Default for AttendanceRecord {
    fn default() -> Self {
        Self { percentage: 0.0 }
    }
}

/// Bonificación solicitada y su tope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtraPointsPolicy {
    pub points: f64,
    pub cap: f64,
}

impl ExtraPointsPolicy {
    pub fn new(points: f64, cap: f64) -> Self {
        Self { points, cap }
    }

    pub fn none() -> Self {
        Self { points: 0.0, cap: 0.0 }
    }
}

/// Aporte de una evaluación al promedio ponderado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub weighted_sum: f64,
    pub attendance_ok: bool,
    /// Parte del promedio perdida por no cumplir la asistencia.
    pub attendance_penalty: f64,
    pub extra_applied: f64,
    pub final_grade: f64,
    /// Aportes por evaluación, en el orden de entrada.
    pub breakdown: Vec<Contribution>,
}

impl CalculationResult {
    /// Resumen de una línea para mostrar en terminal o en la API.
    pub fn detail(&self) -> String {
        let mut parts = vec![format!("Weighted sum: {:.2}", self.weighted_sum)];
        if self.attendance_ok {
            parts.push("Attendance: OK".to_string());
            if self.extra_applied > 0.0 {
                parts.push(format!("Extra points: +{:.2}", self.extra_applied));
            } else {
                parts.push("Extra points: 0.00".to_string());
            }
        } else {
            parts.push(format!("Attendance: BELOW MINIMUM (penalty {:.2})", self.attendance_penalty));
        }
        parts.push(format!("Final grade: {:.2}", self.final_grade));
        parts.join(" | ")
    }
}

/// Registro persistido de un estudiante.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub attendance: AttendanceRecord,
}

impl StudentRecord {
    pub fn new(student_id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name,
            evaluations: Vec::new(),
            attendance: AttendanceRecord::default(),
        }
    }
}

/// Entrada del historial de cálculos de un estudiante.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub student_id: String,
    pub timestamp: DateTime<Utc>,
    pub evaluations: Vec<Evaluation>,
    pub attendance: AttendanceRecord,
    pub extra_points: ExtraPointsPolicy,
    pub result: CalculationResult,
}

/// Cómo se combinan las evaluaciones nuevas con las ya guardadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    #[default]
    Replace,
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_name_defaults_when_missing() {
        let e: Evaluation = serde_json::from_str(r#"{"score": 15.5, "weight": 0.3}"#).unwrap();
        assert_eq!(e.name, "");
        assert_eq!(e.score, 15.5);
    }

    #[test]
    fn student_without_name_omits_field() {
        let s = StudentRecord::new("202012345", None);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("name").is_none());
        assert_eq!(json["student_id"], "202012345");
    }

    #[test]
    fn update_mode_defaults_to_replace() {
        assert_eq!(UpdateMode::default(), UpdateMode::Replace);
        let m: UpdateMode = serde_json::from_str("\"append\"").unwrap();
        assert_eq!(m, UpdateMode::Append);
    }

    #[test]
    fn detail_mentions_penalty_when_attendance_fails() {
        let r = CalculationResult {
            weighted_sum: 18.5,
            attendance_ok: false,
            attendance_penalty: 18.5,
            extra_applied: 0.0,
            final_grade: 0.0,
            breakdown: vec![],
        };
        let d = r.detail();
        assert!(d.contains("BELOW MINIMUM"));
        assert!(d.ends_with("Final grade: 0.00"));
    }
}
