use crate::analysis::ReturnSeries;

/// Mean absolute return divided by the population standard deviation of the
/// returns, over the finite steps only.
///
/// No finite steps, or constant finite steps, yield exactly 0.
pub fn memory_strength(returns: &ReturnSeries) -> f64 {
    let values: Vec<f64> = returns.finite().collect();
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|value| *value == first) {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return 0.0;
    }

    let mean_abs = values.iter().map(|value| value.abs()).sum::<f64>() / n;
    let strength = mean_abs / std_dev;
    if strength.is_finite() {
        strength
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_returns_have_zero_strength() {
        let returns = ReturnSeries::from_values(vec![0.05, 0.05, 0.05]);
        assert_eq!(memory_strength(&returns), 0.0);
    }

    #[test]
    fn empty_returns_have_zero_strength() {
        assert_eq!(memory_strength(&ReturnSeries::from_values(Vec::new())), 0.0);
    }

    #[test]
    fn symmetric_moves_have_unit_strength() {
        // |r| = 0.1 everywhere and the population std of ±0.1 is 0.1.
        let returns = ReturnSeries::from_values(vec![0.1, -0.1, 0.1, -0.1]);
        assert!((memory_strength(&returns) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_steps_are_left_out() {
        // Finite steps are -1.0 and 0.5: mean |r| 0.75, population std 0.75.
        let returns = ReturnSeries::from_levels(&[1.0, 0.0, 2.0, 3.0]);
        assert!((memory_strength(&returns) - 1.0).abs() < 1e-12);

        let flat = ReturnSeries::from_values(vec![f64::NAN, f64::INFINITY]);
        assert_eq!(memory_strength(&flat), 0.0);
    }
}
