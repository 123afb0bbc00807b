// Sesión interactiva por terminal.
//
// Genérica sobre la entrada y la salida para poder conducirla desde tests con
// un `Cursor`. Los errores de dominio se muestran y el bucle sigue; solo los
// errores de E/S del terminal cortan la sesión.

use std::io::{self, BufRead, Write};

use crate::algorithm::{self, extra_points, validation};
use crate::config::GradingConfig;
use crate::models::{AttendanceRecord, CalculationResult, Evaluation, ExtraPointsPolicy};
use crate::service::{self, GradeRequest};
use crate::storage::StudentStore;

use super::write_report;

/// Años que se preguntan como máximo para la regla de puntos extra.
const MAX_YEARS: usize = 10;

enum Flow<T> {
    Continue(T),
    Eof,
}

pub struct Session<'a, R: BufRead, W: Write> {
    input: R,
    out: W,
    store: &'a dyn StudentStore,
    config: GradingConfig,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(input: R, out: W, store: &'a dyn StudentStore, config: GradingConfig) -> Self {
        Self { input, out, store, config }
    }

    /// Bucle del menú principal. Termina con la opción 5 o al llegar a EOF.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "=== Grade Calculator ===")?;
        loop {
            self.print_menu()?;
            let choice = match self.prompt("Choose an option: ")? {
                Flow::Continue(c) => c,
                Flow::Eof => break,
            };
            let flow = match choice.to_lowercase().as_str() {
                "1" => self.register()?,
                "2" => self.calculate()?,
                "3" => self.show_latest()?,
                "4" => self.list_students()?,
                "5" | "q" | "quit" | "exit" => break,
                "" => Flow::Continue(()),
                other => {
                    writeln!(self.out, "Unknown option '{}'", other)?;
                    Flow::Continue(())
                }
            };
            if let Flow::Eof = flow {
                break;
            }
        }
        writeln!(self.out, "Goodbye!")?;
        self.out.flush()
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "1. Register student")?;
        writeln!(self.out, "2. Calculate final grade")?;
        writeln!(self.out, "3. Show latest calculation")?;
        writeln!(self.out, "4. List students")?;
        writeln!(self.out, "5. Exit")
    }

    /// Lee una línea recortada. `Eof` si la entrada se agotó.
    fn prompt(&mut self, label: &str) -> io::Result<Flow<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Flow::Eof);
        }
        Ok(Flow::Continue(line.trim().to_string()))
    }

    /// Pide un número hasta que sea válido según `check`.
    fn prompt_number(&mut self, label: &str, check: impl Fn(f64) -> Result<(), String>) -> io::Result<Flow<f64>> {
        loop {
            let raw = match self.prompt(label)? {
                Flow::Continue(s) => s,
                Flow::Eof => return Ok(Flow::Eof),
            };
            match raw.replace(',', ".").parse::<f64>() {
                Ok(v) => match check(v) {
                    Ok(()) => return Ok(Flow::Continue(v)),
                    Err(msg) => writeln!(self.out, "  {}", msg)?,
                },
                Err(_) => writeln!(self.out, "  '{}' is not a number", raw)?,
            }
        }
    }

    fn register(&mut self) -> io::Result<Flow<()>> {
        let id = match self.prompt("Student id: ")? {
            Flow::Continue(s) => s,
            Flow::Eof => return Ok(Flow::Eof),
        };
        let name = match self.prompt("Name (optional): ")? {
            Flow::Continue(s) => s,
            Flow::Eof => return Ok(Flow::Eof),
        };
        match service::register_student(self.store, &id, Some(name)) {
            Ok(record) => writeln!(self.out, "Student {} registered", record.student_id)?,
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(Flow::Continue(()))
    }

    fn calculate(&mut self) -> io::Result<Flow<()>> {
        let id = match self.prompt("Student id: ")? {
            Flow::Continue(s) => s,
            Flow::Eof => return Ok(Flow::Eof),
        };
        if let Err(e) = validation::validate_student_id(&id) {
            writeln!(self.out, "Error: {}", e)?;
            return Ok(Flow::Continue(()));
        }

        let mut save = match self.store.exists(&id) {
            Ok(exists) => exists,
            Err(e) => {
                writeln!(self.out, "Error: {}", e)?;
                return Ok(Flow::Continue(()));
            }
        };
        if !save {
            let answer = match self.prompt("Student not registered. Register now? (y/n): ")? {
                Flow::Continue(s) => s,
                Flow::Eof => return Ok(Flow::Eof),
            };
            if is_yes(&answer) {
                if let Err(e) = service::register_student(self.store, &id, None) {
                    writeln!(self.out, "Error: {}", e)?;
                    return Ok(Flow::Continue(()));
                }
                save = true;
            } else {
                writeln!(self.out, "The result will not be saved.")?;
            }
        }

        let evaluations = match self.read_evaluations()? {
            Flow::Continue(v) => v,
            Flow::Eof => return Ok(Flow::Eof),
        };

        let percentage = match self.prompt_number("Attendance percentage (0-100): ", |p| {
            validation::validate_attendance(p).map_err(|e| e.to_string())
        })? {
            Flow::Continue(p) => p,
            Flow::Eof => return Ok(Flow::Eof),
        };

        let policy = match self.read_extra_policy()? {
            Flow::Continue(p) => p,
            Flow::Eof => return Ok(Flow::Eof),
        };

        let attendance = AttendanceRecord::new(percentage);
        let outcome: crate::error::Result<CalculationResult> = if save {
            let request = GradeRequest {
                student_id: id.trim().to_string(),
                evaluations: Some(evaluations),
                attendance: Some(attendance),
                policy,
            };
            service::grade_student(self.store, &self.config, request).map(|entry| entry.result)
        } else {
            algorithm::calculate(&self.config, &evaluations, &attendance, &policy).map_err(Into::into)
        };

        match outcome {
            Ok(result) => write_report(&mut self.out, &result)?,
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(Flow::Continue(()))
    }

    /// Pide nota y peso por evaluación. Termina al completar el 100% del peso,
    /// al llegar al máximo de evaluaciones o con "done".
    fn read_evaluations(&mut self) -> io::Result<Flow<Vec<Evaluation>>> {
        let max = self.config.max_evaluations;
        let tolerance = self.config.weight_tolerance;
        let scale_max = self.config.scale_max;
        let mut evaluations: Vec<Evaluation> = Vec::new();

        writeln!(self.out, "Enter up to {} evaluations; weights must add up to 1.0. Type 'done' to finish.", max)?;
        while evaluations.len() < max {
            let used = validation::weight_sum(&evaluations);
            if (1.0 - used).abs() <= tolerance {
                break;
            }
            let n = evaluations.len() + 1;

            let raw = match self.prompt(&format!("Evaluation {} score (0-{}): ", n, scale_max))? {
                Flow::Continue(s) => s,
                Flow::Eof => return Ok(Flow::Eof),
            };
            if matches!(raw.to_lowercase().as_str(), "done" | "fin") {
                if evaluations.is_empty() {
                    writeln!(self.out, "  At least one evaluation is required")?;
                    continue;
                }
                break;
            }
            let score = match raw.replace(',', ".").parse::<f64>() {
                Ok(s) if s.is_finite() && (0.0..=scale_max).contains(&s) => s,
                _ => {
                    writeln!(self.out, "  Score must be a number between 0 and {}", scale_max)?;
                    continue;
                }
            };

            let remaining = (1.0 - used).max(0.0);
            let label = format!("Evaluation {} weight (remaining {:.2}): ", n, remaining);
            let weight = match self.prompt_number(&label, |w| {
                if !(w > 0.0 && w <= 1.0) {
                    Err("Weight must be greater than 0 and at most 1".to_string())
                } else if used + w > 1.0 + tolerance {
                    Err(format!("Total weight would exceed 1.0 (remaining {:.2})", remaining))
                } else {
                    Ok(())
                }
            })? {
                Flow::Continue(w) => w,
                Flow::Eof => return Ok(Flow::Eof),
            };

            evaluations.push(Evaluation::new(format!("Evaluation {}", n), score, weight));
        }
        Ok(Flow::Continue(evaluations))
    }

    /// Vacío => sin bonus; número => puntos pedidos; "years" => regla por años.
    fn read_extra_policy(&mut self) -> io::Result<Flow<ExtraPointsPolicy>> {
        loop {
            let raw = match self.prompt("Extra points (number, 'years' or empty for none): ")? {
                Flow::Continue(s) => s,
                Flow::Eof => return Ok(Flow::Eof),
            };
            if raw.is_empty() {
                return Ok(Flow::Continue(algorithm::resolve_extra_policy(&self.config, None, None)));
            }
            if raw.eq_ignore_ascii_case("years") {
                return self.read_years_policy();
            }
            match raw.replace(',', ".").parse::<f64>() {
                Ok(p) if p.is_finite() && p >= 0.0 => {
                    return Ok(Flow::Continue(algorithm::resolve_extra_policy(&self.config, Some(p), None)));
                }
                _ => writeln!(self.out, "  Extra points must be a non-negative number")?,
            }
        }
    }

    fn read_years_policy(&mut self) -> io::Result<Flow<ExtraPointsPolicy>> {
        let label = format!("Number of years (1-{}): ", MAX_YEARS);
        let years = match self.prompt_number(&label, |n| {
            if (1.0..=MAX_YEARS as f64).contains(&n) && n.fract() == 0.0 {
                Ok(())
            } else {
                Err(format!("Enter a whole number of years between 1 and {}", MAX_YEARS))
            }
        })? {
            Flow::Continue(n) => n as usize,
            Flow::Eof => return Ok(Flow::Eof),
        };

        let mut flags = Vec::new();
        for year in 1..=years {
            let answer = match self.prompt(&format!("Year {}: criterion met? (y/n): ", year))? {
                Flow::Continue(s) => s,
                Flow::Eof => return Ok(Flow::Eof),
            };
            flags.push(is_yes(&answer));
        }

        let eligible = extra_points::check_eligibility(&flags);
        if eligible {
            writeln!(self.out, "  Eligible for {:.2} extra points", self.config.default_extra_points)?;
        } else {
            writeln!(self.out, "  Not eligible for extra points")?;
        }
        Ok(Flow::Continue(algorithm::resolve_extra_policy(&self.config, None, Some(&flags))))
    }

    fn show_latest(&mut self) -> io::Result<Flow<()>> {
        let id = match self.prompt("Student id: ")? {
            Flow::Continue(s) => s,
            Flow::Eof => return Ok(Flow::Eof),
        };
        match self.store.latest_calculation(id.trim()) {
            Ok(Some(entry)) => {
                writeln!(self.out, "Calculated at {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))?;
                write_report(&mut self.out, &entry.result)?;
            }
            Ok(None) => writeln!(self.out, "No calculations recorded for student {}", id.trim())?,
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(Flow::Continue(()))
    }

    fn list_students(&mut self) -> io::Result<Flow<()>> {
        match self.store.list() {
            Ok(students) if students.is_empty() => writeln!(self.out, "No students registered")?,
            Ok(students) => {
                for s in students {
                    match s.name.as_deref() {
                        Some(name) => writeln!(self.out, "{}: {}", s.student_id, name)?,
                        None => writeln!(self.out, "{}", s.student_id)?,
                    }
                }
            }
            Err(e) => writeln!(self.out, "Error: {}", e)?,
        }
        Ok(Flow::Continue(()))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStore;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_script(store: &JsonStore, script: &str) -> String {
        let mut out = Vec::new();
        Session::new(Cursor::new(script.as_bytes()), &mut out, store, GradingConfig::default())
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_eof_ends_session() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let out = run_script(&store, "");
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_weight_overflow_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        // Registra, luego intenta 0.7 + 0.5, corrige a 0.3
        let script = "1\ns1\n\n2\ns1\n15\n0.7\n10\n0.5\n0.3\n90\n\n5\n";
        let out = run_script(&store, script);
        assert!(out.contains("Total weight would exceed 1.0"));
        assert!(out.contains("FINAL GRADE:    13.50"));
        assert_eq!(store.calculations("s1").unwrap().len(), 1);
    }

    #[test]
    fn test_unregistered_student_not_saved() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let script = "2\nghost\nn\n12\n1\n100\n1\n5\n";
        let out = run_script(&store, script);
        assert!(out.contains("will not be saved"));
        assert!(out.contains("FINAL GRADE:    13.00"));
        assert!(!store.exists("ghost").unwrap());
    }

    #[test]
    fn test_years_rule_grants_default_bonus() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let script = "2\nx\nn\n10\n1\n80\nyears\n2\ny\ny\n5\n";
        let out = run_script(&store, script);
        assert!(out.contains("Eligible for 2.00 extra points"));
        assert!(out.contains("FINAL GRADE:    12.00"));
    }

    #[test]
    fn test_year_count_is_bounded() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let script = "2\nx\nn\n10\n1\n80\nyears\n1e30\n11\n0\n2.5\n1\ny\n5\n";
        let out = run_script(&store, script);
        assert_eq!(out.matches("Enter a whole number of years between 1 and 10").count(), 4);
        assert!(out.contains("FINAL GRADE:    12.00"));
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("Y"));
        assert!(is_yes("sí"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
