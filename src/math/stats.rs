//! Descriptive statistics over magnitude and color samples.
//!
//! All functions require a non-empty sample. An empty input is a caller error
//! and is reported as a precondition violation rather than a silent `0.0`.
//! Inputs are never reordered; `median` sorts an owned copy.

use crate::error::AppError;

fn require_samples(values: &[f64], what: &str) -> Result<(), AppError> {
    if values.is_empty() {
        return Err(AppError::precondition(format!(
            "Cannot compute {what} of an empty sample."
        )));
    }
    Ok(())
}

pub fn mean(values: &[f64]) -> Result<f64, AppError> {
    require_samples(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn standard_deviation(values: &[f64]) -> Result<f64, AppError> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// `standard_deviation / sqrt(n)`.
pub fn standard_error(values: &[f64]) -> Result<f64, AppError> {
    let sd = standard_deviation(values)?;
    Ok(sd / (values.len() as f64).sqrt())
}

/// Middle value of the sorted sample; mean of the two central values for even `n`.
pub fn median(values: &[f64]) -> Result<f64, AppError> {
    require_samples(values, "median")?;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn median_leaves_input_order_alone() {
        let values = vec![5.0, 1.0, 3.0];
        let _ = median(&values).unwrap();
        assert_eq!(values, vec![5.0, 1.0, 3.0]);
    }

    #[test]
    fn population_standard_deviation() {
        // Classic example: population sd of this sample is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).unwrap() - 5.0).abs() < 1e-12);
        assert!((standard_deviation(&values).unwrap() - 2.0).abs() < 1e-12);
        let se = standard_error(&values).unwrap();
        assert!((se - 2.0 / 8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_sample_is_a_precondition_error() {
        for result in [
            mean(&[]),
            median(&[]),
            standard_deviation(&[]),
            standard_error(&[]),
        ] {
            let err = result.unwrap_err();
            assert_eq!(err.exit_code(), crate::error::EXIT_PRECONDITION);
        }
    }
}
