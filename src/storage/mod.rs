//! Storage layer abstraction and the flat JSON backend.
//!
//! `StudentStore` is the seam used by the API and the CLI. Every method works
//! with a single student record; read-modify-write cycles go through `modify`
//! so a backend can serialize them.

mod json;

pub use json::{JsonStore, write_atomic};

use crate::error::{GradeError, Result};
use crate::models::{CalculationRecord, StudentRecord};

pub trait StudentStore: Send + Sync {
    /// Load a student by id. Unknown ids yield `GradeError::NotFound`.
    fn load(&self, student_id: &str) -> Result<StudentRecord>;

    /// Insert or overwrite a record keyed by its `student_id`.
    fn save(&self, record: &StudentRecord) -> Result<()>;

    /// Remove a student and its calculation history.
    fn delete(&self, student_id: &str) -> Result<()>;

    /// All students, ordered by id.
    fn list(&self) -> Result<Vec<StudentRecord>>;

    /// Atomic read-modify-write of one record. `f` receives the current record
    /// (or `None`) and returns the record to persist.
    fn modify(
        &self,
        student_id: &str,
        f: &mut dyn FnMut(Option<StudentRecord>) -> Result<StudentRecord>,
    ) -> Result<StudentRecord>;

    fn append_calculation(&self, record: &CalculationRecord) -> Result<()>;

    /// Read-modify-write of an existing record plus a history append, as one
    /// critical section. `f` receives the current record and returns the
    /// record to persist with the calculation to append. Unknown ids yield
    /// `GradeError::NotFound` without calling `f`.
    fn record_calculation(
        &self,
        student_id: &str,
        f: &mut dyn FnMut(StudentRecord) -> Result<(StudentRecord, CalculationRecord)>,
    ) -> Result<CalculationRecord>;

    /// Calculation history for a student, oldest first. Empty when none.
    fn calculations(&self, student_id: &str) -> Result<Vec<CalculationRecord>>;

    fn latest_calculation(&self, student_id: &str) -> Result<Option<CalculationRecord>> {
        Ok(self.calculations(student_id)?.pop())
    }

    fn exists(&self, student_id: &str) -> Result<bool> {
        match self.load(student_id) {
            Ok(_) => Ok(true),
            Err(GradeError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
