use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

use super::StudentStore;
use crate::error::{GradeError, Result, StorageError};
use crate::models::{CalculationRecord, StudentRecord};

const STUDENTS_FILE: &str = "students.json";
const CALCULATIONS_FILE: &str = "calculations.json";

/// Almacenamiento en archivos JSON planos dentro de `data_dir`:
///
/// - `students.json`: objeto `{ student_id: StudentRecord }`
/// - `calculations.json`: objeto `{ student_id: [CalculationRecord] }`
///
/// Todas las escrituras pasan por un único mutex (un solo escritor) y se
/// publican con escritura a archivo temporal + rename. Las lecturas no toman el
/// mutex: siempre ven la última versión completa renombrada.
///
/// El mutex es por proceso. Dos procesos sobre el mismo `data_dir` nunca dejan
/// un archivo a medias, pero uno puede pisar la actualización del otro: el
/// directorio de datos debe tener un solo proceso escritor.
#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
    students_file: PathBuf,
    calculations_file: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Abre (y crea si hace falta) el directorio de datos.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io { path: data_dir.clone(), source })?;
        tracing::debug!(data_dir = %data_dir.display(), "json store opened");
        Ok(Self {
            students_file: data_dir.join(STUDENTS_FILE),
            calculations_file: data_dir.join(CALCULATIONS_FILE),
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // el guard no protege datos en memoria; un panic previo no deja nada a medias
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn students(&self) -> Result<BTreeMap<String, StudentRecord>, StorageError> {
        read_map(&self.students_file)
    }

    fn history(&self) -> Result<BTreeMap<String, Vec<CalculationRecord>>, StorageError> {
        read_map(&self.calculations_file)
    }
}

impl StudentStore for JsonStore {
    fn load(&self, student_id: &str) -> Result<StudentRecord> {
        self.students()?
            .remove(student_id)
            .ok_or_else(|| GradeError::not_found(student_id))
    }

    fn save(&self, record: &StudentRecord) -> Result<()> {
        let _guard = self.lock();
        let mut students = self.students()?;
        students.insert(record.student_id.clone(), record.clone());
        write_map(&self.students_file, &students)?;
        tracing::debug!(student_id = %record.student_id, "student saved");
        Ok(())
    }

    fn delete(&self, student_id: &str) -> Result<()> {
        let _guard = self.lock();
        let mut students = self.students()?;
        if students.remove(student_id).is_none() {
            return Err(GradeError::not_found(student_id));
        }

        // primero el historial: si falla la segunda escritura el alumno sigue
        // existiendo y no queda historial huérfano
        let mut history = self.history()?;
        if history.remove(student_id).is_some() {
            write_map(&self.calculations_file, &history)?;
        }
        write_map(&self.students_file, &students)?;
        tracing::debug!(student_id, "student deleted");
        Ok(())
    }

    fn list(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.students()?.into_values().collect())
    }

    fn modify(
        &self,
        student_id: &str,
        f: &mut dyn FnMut(Option<StudentRecord>) -> Result<StudentRecord>,
    ) -> Result<StudentRecord> {
        let _guard = self.lock();
        let mut students = self.students()?;
        let current = students.remove(student_id);
        let updated = f(current)?;
        if updated.student_id != student_id {
            return Err(GradeError::Internal(format!(
                "record id changed during update: {} -> {}",
                student_id, updated.student_id
            )));
        }
        students.insert(updated.student_id.clone(), updated.clone());
        write_map(&self.students_file, &students)?;
        tracing::debug!(student_id, evaluations = updated.evaluations.len(), "student updated");
        Ok(updated)
    }

    fn append_calculation(&self, record: &CalculationRecord) -> Result<()> {
        let _guard = self.lock();
        let mut history = self.history()?;
        history.entry(record.student_id.clone()).or_default().push(record.clone());
        write_map(&self.calculations_file, &history)?;
        tracing::debug!(student_id = %record.student_id, final_grade = record.result.final_grade, "calculation stored");
        Ok(())
    }

    fn record_calculation(
        &self,
        student_id: &str,
        f: &mut dyn FnMut(StudentRecord) -> Result<(StudentRecord, CalculationRecord)>,
    ) -> Result<CalculationRecord> {
        let _guard = self.lock();
        let previous = self.students()?;
        let current = previous
            .get(student_id)
            .cloned()
            .ok_or_else(|| GradeError::not_found(student_id))?;
        let (updated, entry) = f(current)?;
        if updated.student_id != student_id || entry.student_id != student_id {
            return Err(GradeError::Internal(format!(
                "record id changed during calculation: {} -> {}/{}",
                student_id, updated.student_id, entry.student_id
            )));
        }

        let mut history = self.history()?;
        let mut students = previous.clone();
        students.insert(updated.student_id.clone(), updated);
        write_map(&self.students_file, &students)?;

        history.entry(entry.student_id.clone()).or_default().push(entry.clone());
        if let Err(e) = write_map(&self.calculations_file, &history) {
            // sin historial no se deja el registro modificado
            if let Err(rollback) = write_map(&self.students_file, &previous) {
                tracing::error!(student_id, error = %rollback, "failed to roll back student record");
            }
            return Err(e.into());
        }
        tracing::debug!(student_id, final_grade = entry.result.final_grade, "calculation recorded");
        Ok(entry)
    }

    fn calculations(&self, student_id: &str) -> Result<Vec<CalculationRecord>> {
        Ok(self.history()?.remove(student_id).unwrap_or_default())
    }
}

/// Lee un mapa JSON. Un archivo inexistente o vacío equivale a un mapa vacío;
/// un archivo corrupto es un error.
fn read_map<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, StorageError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => return Err(StorageError::Io { path: path.to_path_buf(), source }),
    };
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })
}

fn write_map<T: Serialize>(path: &Path, map: &BTreeMap<String, T>) -> Result<(), StorageError> {
    let text = serde_json::to_string_pretty(map)?;
    write_atomic(path, text.as_bytes())
}

/// Escribe `bytes` en un archivo temporal hermano con nombre único, sincroniza
/// y renombra sobre `path`. Quien lee nunca ve una escritura parcial, aunque
/// otro proceso escriba en el mismo directorio.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |source| StorageError::Io { path: p, source }
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(io_err(parent))?;
    temp.write_all(bytes).map_err(io_err(temp.path()))?;
    temp.as_file().sync_all().map_err(io_err(temp.path()))?;

    temp.persist(path)
        .map_err(|e| StorageError::Io { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}
