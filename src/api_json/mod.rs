pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::algorithm::resolve_extra_policy;
use crate::config::GradingConfig;
use crate::models::{AttendanceRecord, CalculationResult, Evaluation, UpdateMode};
use crate::service::GradeRequest;

/// Parámetros de entrada para calcular la nota final
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "student_id": "202012345",
///   "evaluations": [
///     { "name": "Parcial", "score": 16.0, "weight": 0.6 },
///     { "name": "Final",   "score": 14.0, "weight": 0.4 }
///   ],
///   "attendance_percentage": 80.0,
///   "extra_points": 2.0,
///   "all_years_teachers": null
/// }
/// ```
///
/// # Campos:
/// - `student_id`: código del estudiante (requerido, debe estar registrado)
/// - `evaluations`: si se omite se usan las evaluaciones guardadas
/// - `attendance_percentage`: si se omite se usa la asistencia guardada
/// - `extra_points`: bonificación explícita (se recorta al tope configurado)
/// - `all_years_teachers`: alternativa a `extra_points`; todos `true` => bonificación por defecto
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateGradeRequest {
	pub student_id: String,
	#[serde(default)]
	pub evaluations: Option<Vec<Evaluation>>,
	#[serde(default)]
	pub attendance_percentage: Option<f64>,
	#[serde(default)]
	pub extra_points: Option<f64>,
	#[serde(default)]
	pub all_years_teachers: Option<Vec<bool>>,
}

impl CalculateGradeRequest {
	pub fn into_grade_request(self, config: &GradingConfig) -> GradeRequest {
		let policy = resolve_extra_policy(config, self.extra_points, self.all_years_teachers.as_deref());
		GradeRequest {
			student_id: self.student_id,
			evaluations: self.evaluations,
			attendance: self.attendance_percentage.map(AttendanceRecord::new),
			policy,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterStudentRequest {
	pub student_id: String,
	#[serde(default)]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvaluationsRequest {
	pub evaluations: Vec<Evaluation>,
	#[serde(default)]
	pub attendance_percentage: Option<f64>,
	/// "replace" (por defecto) o "append"
	#[serde(default)]
	pub mode: UpdateMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeCalculationResponse {
	#[serde(flatten)]
	pub result: CalculationResult,
	pub detail: String,
}

impl From<CalculationResult> for GradeCalculationResponse {
	fn from(result: CalculationResult) -> Self {
		let detail = result.detail();
		Self { result, detail }
	}
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
	pub percentage: f64,
}

#[derive(Debug, Deserialize)]
pub struct ExtraPointsQuery {
	#[serde(default)]
	pub all_years_teachers: String,
}

pub fn parse_json_input(json_str: &str) -> Result<CalculateGradeRequest, serde_json::Error> {
	serde_json::from_str::<CalculateGradeRequest>(json_str)
}

/// Convierte `"true,false,true"` en `[true, false, true]`. Cadena vacía => lista vacía.
pub fn parse_year_flags(s: &str) -> Result<Vec<bool>, String> {
	s.split(',')
		.map(|p| p.trim())
		.filter(|p| !p.is_empty())
		.map(|p| match p.to_lowercase().as_str() {
			"true" | "1" | "yes" | "si" | "sí" => Ok(true),
			"false" | "0" | "no" => Ok(false),
			other => Err(format!("invalid year flag '{}', expected true/false", other)),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_request() {
		let json_data = r#"
		{
			"student_id": "202012345",
			"evaluations": [
				{ "name": "Parcial", "score": 16.0, "weight": 0.6 },
				{ "name": "Final", "score": 14.0, "weight": 0.4 }
			],
			"attendance_percentage": 80.0,
			"extra_points": 2.0
		}
		"#;

		let req = parse_json_input(json_data).expect("Debe parsear la petición completa");
		assert_eq!(req.student_id, "202012345");
		let evals = req.evaluations.as_ref().expect("Debe haber evaluaciones");
		assert_eq!(evals.len(), 2);
		assert_eq!(evals[1].name, "Final");
		assert_eq!(req.attendance_percentage, Some(80.0));
		assert!(req.all_years_teachers.is_none());

		let grade = req.into_grade_request(&GradingConfig::default());
		assert_eq!(grade.policy.points, 2.0);
		assert_eq!(grade.policy.cap, 2.0);
		assert_eq!(grade.attendance, Some(AttendanceRecord::new(80.0)));
	}

	#[test]
	fn test_parse_minimal_request() {
		// Solo el código: evaluaciones y asistencia salen del registro guardado
		let req = parse_json_input(r#"{ "student_id": "202012345" }"#).expect("Debe parsear");
		assert!(req.evaluations.is_none());
		assert!(req.attendance_percentage.is_none());
		let grade = req.into_grade_request(&GradingConfig::default());
		assert_eq!(grade.policy.points, 0.0);
	}

	#[test]
	fn test_years_flags_drive_policy() {
		let req = parse_json_input(r#"{ "student_id": "x", "all_years_teachers": [true, true, true] }"#).unwrap();
		assert_eq!(req.into_grade_request(&GradingConfig::default()).policy.points, 2.0);
	}

	#[test]
	fn test_parse_year_flags() {
		assert_eq!(parse_year_flags("true,false, TRUE").unwrap(), vec![true, false, true]);
		assert!(parse_year_flags("").unwrap().is_empty());
		assert!(parse_year_flags("true,maybe").is_err());
	}

	#[test]
	fn test_response_flattens_result() {
		let result = CalculationResult {
			weighted_sum: 16.0,
			attendance_ok: true,
			attendance_penalty: 0.0,
			extra_applied: 2.0,
			final_grade: 18.0,
			breakdown: vec![],
		};
		let value = serde_json::to_value(GradeCalculationResponse::from(result)).unwrap();
		assert_eq!(value["final_grade"], 18.0);
		assert_eq!(value["detail"], "Weighted sum: 16.00 | Attendance: OK | Extra points: +2.00 | Final grade: 18.00");
	}
}
