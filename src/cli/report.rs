use std::io::{self, Write};

use crate::models::CalculationResult;

/// Imprime el resultado de un cálculo en formato tabla.
pub fn write_report<W: Write>(out: &mut W, result: &CalculationResult) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "==================== GRADE REPORT ====================")?;
    writeln!(out, "{:<24} {:>8} {:>8} {:>12}", "Evaluation", "Score", "Weight", "Contribution")?;
    writeln!(out, "{}", "-".repeat(55))?;
    for (i, c) in result.breakdown.iter().enumerate() {
        let name = if c.name.is_empty() { format!("Evaluation {}", i + 1) } else { c.name.clone() };
        writeln!(
            out,
            "{:<24} {:>8.2} {:>7.0}% {:>12.2}",
            name,
            c.score,
            c.weight * 100.0,
            c.contribution
        )?;
    }
    writeln!(out, "{}", "-".repeat(55))?;
    writeln!(out, "Weighted sum:   {:.2}", result.weighted_sum)?;
    if result.attendance_ok {
        writeln!(out, "Attendance:     OK")?;
        writeln!(out, "Extra points:   +{:.2}", result.extra_applied)?;
    } else {
        writeln!(out, "Attendance:     BELOW MINIMUM (penalty {:.2})", result.attendance_penalty)?;
        writeln!(out, "Extra points:   not applied")?;
    }
    writeln!(out, "FINAL GRADE:    {:.2}", result.final_grade)?;
    writeln!(out, "======================================================")?;
    writeln!(out, "Detail: {}", result.detail())?;
    Ok(())
}
