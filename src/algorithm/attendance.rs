/// Política de asistencia mínima: compuerta booleana, sin crédito parcial.
pub fn check(percentage: f64, minimum: f64) -> bool {
    percentage >= minimum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_minimum() {
        assert!(check(80.0, 70.0));
        assert!(check(70.0, 70.0));
    }

    #[test]
    fn test_below_minimum() {
        assert!(!check(50.0, 70.0));
        assert!(!check(69.99, 70.0));
    }
}
