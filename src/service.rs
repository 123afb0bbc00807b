// Orquestación de casos de uso sobre el almacenamiento.
//
// Tanto los handlers HTTP como la CLI pasan por aquí para registrar alumnos,
// actualizar evaluaciones y calcular/guardar notas, de modo que las reglas son
// las mismas en ambas interfaces.

use chrono::Utc;

use crate::algorithm::{self, validation};
use crate::config::GradingConfig;
use crate::error::{GradeError, Result};
use crate::models::{AttendanceRecord, CalculationRecord, Evaluation, ExtraPointsPolicy, StudentRecord, UpdateMode};
use crate::storage::StudentStore;

/// Petición de cálculo ya resuelta (política de puntos extra incluida).
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRequest {
    pub student_id: String,
    /// `None` => usar las evaluaciones guardadas.
    pub evaluations: Option<Vec<Evaluation>>,
    /// `None` => usar la asistencia guardada.
    pub attendance: Option<AttendanceRecord>,
    pub policy: ExtraPointsPolicy,
}

/// Registra un estudiante o actualiza su nombre. Las evaluaciones existentes se conservan.
pub fn register_student(store: &dyn StudentStore, student_id: &str, name: Option<String>) -> Result<StudentRecord> {
    let student_id = validation::normalize_student_id(student_id)?;
    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    let record = store.modify(student_id, &mut |current| {
        Ok(match current {
            Some(mut existing) => {
                existing.name = name.clone();
                existing
            }
            None => StudentRecord::new(student_id, name.clone()),
        })
    })?;
    tracing::info!(student_id, "student registered");
    Ok(record)
}

pub fn update_evaluations(
    store: &dyn StudentStore,
    config: &GradingConfig,
    student_id: &str,
    evaluations: Vec<Evaluation>,
    attendance_percentage: Option<f64>,
    mode: UpdateMode,
) -> Result<StudentRecord> {
    let student_id = validation::normalize_student_id(student_id)?;
    if let Some(p) = attendance_percentage {
        validation::validate_attendance(p)?;
    }

    let mut incoming = Some(evaluations);
    let record = store.modify(student_id, &mut |current| {
        let mut record = current.ok_or_else(|| GradeError::not_found(student_id))?;
        let new_set = incoming.take().unwrap_or_default();
        record.evaluations = validation::merge_evaluations(&record.evaluations, new_set, mode, config)?;
        if let Some(p) = attendance_percentage {
            record.attendance = AttendanceRecord::new(p);
        }
        Ok(record)
    })?;
    tracing::info!(student_id, ?mode, evaluations = record.evaluations.len(), "evaluations updated");
    Ok(record)
}

/// Calcula la nota de un estudiante registrado, guarda las entradas usadas en
/// su registro y añade el resultado a su historial.
///
/// Las entradas omitidas se toman del registro dentro de la misma sección
/// crítica que escribe el registro y el historial.
pub fn grade_student(store: &dyn StudentStore, config: &GradingConfig, request: GradeRequest) -> Result<CalculationRecord> {
    let student_id = validation::normalize_student_id(&request.student_id)?;
    let policy = request.policy;

    let entry = store.record_calculation(student_id, &mut |mut record| {
        let evaluations = request.evaluations.clone().unwrap_or_else(|| record.evaluations.clone());
        let attendance = request.attendance.unwrap_or(record.attendance);
        let result = algorithm::calculate(config, &evaluations, &attendance, &policy)?;

        record.evaluations = evaluations.clone();
        record.attendance = attendance;
        let entry = CalculationRecord {
            student_id: student_id.to_string(),
            timestamp: Utc::now(),
            evaluations,
            attendance,
            extra_points: policy,
            result,
        };
        Ok((record, entry))
    })?;

    tracing::info!(
        student_id,
        final_grade = entry.result.final_grade,
        attendance_ok = entry.result.attendance_ok,
        "grade recorded"
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_register_keeps_evaluations_on_rename() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        register_student(&store, "s1", Some("Ana".into())).unwrap();
        update_evaluations(&store, &cfg, "s1", vec![Evaluation::new("Final", 15.0, 1.0)], Some(90.0), UpdateMode::Replace)
            .unwrap();

        let renamed = register_student(&store, "s1", Some("Ana María".into())).unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Ana María"));
        assert_eq!(renamed.evaluations.len(), 1);
        assert_eq!(renamed.attendance.percentage, 90.0);
    }

    #[test]
    fn test_register_rejects_blank_id() {
        let (_dir, store) = store();
        let err = register_student(&store, "   ", None).unwrap_err();
        assert_eq!(err.code(), "empty_student_id");
    }

    #[test]
    fn test_update_unknown_student_is_not_found() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        let err = update_evaluations(&store, &cfg, "ghost", vec![Evaluation::new("F", 10.0, 1.0)], None, UpdateMode::Replace)
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_invalid_update_leaves_record_untouched() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        register_student(&store, "s1", None).unwrap();
        update_evaluations(&store, &cfg, "s1", vec![Evaluation::new("F", 12.0, 1.0)], None, UpdateMode::Replace).unwrap();

        let err = update_evaluations(&store, &cfg, "s1", vec![Evaluation::new("G", 12.0, 0.5)], None, UpdateMode::Replace)
            .unwrap_err();
        assert_eq!(err.code(), "weights_do_not_sum_to_one");
        assert_eq!(store.load("s1").unwrap().evaluations[0].name, "F");
    }

    #[test]
    fn test_grade_uses_stored_inputs_when_omitted() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        register_student(&store, "s1", None).unwrap();
        update_evaluations(&store, &cfg, "s1", vec![Evaluation::new("F", 16.0, 1.0)], Some(85.0), UpdateMode::Replace)
            .unwrap();

        let request = GradeRequest {
            student_id: "s1".into(),
            evaluations: None,
            attendance: None,
            policy: ExtraPointsPolicy::new(2.0, cfg.extra_cap),
        };
        let entry = grade_student(&store, &cfg, request).unwrap();
        assert_eq!(entry.result.final_grade, 18.0);
        assert_eq!(store.calculations("s1").unwrap().len(), 1);
    }

    #[test]
    fn test_grade_unknown_student_is_not_found() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        let request = GradeRequest {
            student_id: "ghost".into(),
            evaluations: Some(vec![Evaluation::new("F", 16.0, 1.0)]),
            attendance: Some(AttendanceRecord::new(90.0)),
            policy: ExtraPointsPolicy::none(),
        };
        assert_eq!(grade_student(&store, &cfg, request).unwrap_err().code(), "not_found");
    }

    /// Store que mete una actualización de evaluaciones justo cuando
    /// `grade_student` empieza a leer, como haría otra petición concurrente.
    struct InterleavingStore {
        inner: JsonStore,
        config: GradingConfig,
        fired: AtomicBool,
    }

    impl InterleavingStore {
        fn interleave(&self, student_id: &str) {
            if !self.fired.swap(true, Ordering::SeqCst) {
                let newer = vec![Evaluation::new("NEW", 18.0, 1.0)];
                update_evaluations(&self.inner, &self.config, student_id, newer, None, UpdateMode::Replace).unwrap();
            }
        }
    }

    impl StudentStore for InterleavingStore {
        fn load(&self, student_id: &str) -> Result<StudentRecord> {
            let record = self.inner.load(student_id);
            self.interleave(student_id);
            record
        }
        fn save(&self, record: &StudentRecord) -> Result<()> {
            self.inner.save(record)
        }
        fn delete(&self, student_id: &str) -> Result<()> {
            self.inner.delete(student_id)
        }
        fn list(&self) -> Result<Vec<StudentRecord>> {
            self.inner.list()
        }
        fn modify(
            &self,
            student_id: &str,
            f: &mut dyn FnMut(Option<StudentRecord>) -> Result<StudentRecord>,
        ) -> Result<StudentRecord> {
            self.inner.modify(student_id, f)
        }
        fn append_calculation(&self, record: &CalculationRecord) -> Result<()> {
            self.inner.append_calculation(record)
        }
        fn record_calculation(
            &self,
            student_id: &str,
            f: &mut dyn FnMut(StudentRecord) -> Result<(StudentRecord, CalculationRecord)>,
        ) -> Result<CalculationRecord> {
            self.interleave(student_id);
            self.inner.record_calculation(student_id, f)
        }
        fn calculations(&self, student_id: &str) -> Result<Vec<CalculationRecord>> {
            self.inner.calculations(student_id)
        }
    }

    #[test]
    fn test_grade_does_not_overwrite_concurrent_update() {
        let (_dir, inner) = store();
        let cfg = GradingConfig::default();
        register_student(&inner, "s1", None).unwrap();
        update_evaluations(&inner, &cfg, "s1", vec![Evaluation::new("OLD", 10.0, 1.0)], Some(90.0), UpdateMode::Replace)
            .unwrap();

        let store = InterleavingStore { inner, config: cfg, fired: AtomicBool::new(false) };
        let request = GradeRequest {
            student_id: "s1".into(),
            evaluations: None,
            attendance: None,
            policy: ExtraPointsPolicy::none(),
        };
        let entry = grade_student(&store, &cfg, request).unwrap();

        let stored = store.load("s1").unwrap();
        assert_eq!(stored.evaluations[0].name, "NEW");
        assert_eq!(entry.evaluations[0].name, "NEW");
        assert_eq!(entry.result.final_grade, 18.0);
        assert_eq!(store.calculations("s1").unwrap().len(), 1);
    }

    #[test]
    fn test_padded_id_matches_registered_student() {
        let (_dir, store) = store();
        let cfg = GradingConfig::default();
        register_student(&store, " s1 ", None).unwrap();
        update_evaluations(&store, &cfg, "s1 ", vec![Evaluation::new("F", 14.0, 1.0)], Some(80.0), UpdateMode::Replace)
            .unwrap();

        let request = GradeRequest {
            student_id: " s1 ".into(),
            evaluations: None,
            attendance: None,
            policy: ExtraPointsPolicy::none(),
        };
        let entry = grade_student(&store, &cfg, request).unwrap();
        assert_eq!(entry.student_id, "s1");
        assert_eq!(store.calculations("s1").unwrap().len(), 1);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
