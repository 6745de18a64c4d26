// Chi-squared survival function for likelihood-ratio tests
//
// Under the null model twice the log-likelihood gain of a nested richer model
// is asymptotically χ²-distributed with as many degrees of freedom as the
// richer model adds.
//
// Scientific Foundation:
// - Wilks, S. S. (1938). The large-sample distribution of the likelihood
//   ratio for testing composite hypotheses. Ann. Math. Statist. 9.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// P(X >= statistic) for X ~ χ²(degrees_of_freedom)
///
/// Zero degrees of freedom or a non-positive statistic give 1.
pub fn chi_squared_survival(statistic: f64, degrees_of_freedom: usize) -> f64 {
    if degrees_of_freedom == 0 || statistic.is_nan() || statistic <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(degrees_of_freedom as f64) {
        Ok(distribution) => distribution.sf(statistic).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Outcome of a likelihood-ratio test between two nested models
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LikelihoodRatioTest {
    /// Maximum order of the restricted model
    pub null_order: usize,

    /// Maximum order of the richer model
    pub alt_order: usize,

    /// 2 (LL(alt) - LL(null))
    pub statistic: f64,

    /// Difference in free parameters
    pub degrees_of_freedom: usize,

    /// Chi-squared survival of the statistic
    /// - p < significance: the richer model explains the paths significantly better
    pub p_value: f64,
}

impl LikelihoodRatioTest {
    pub fn new(
        null_order: usize,
        alt_order: usize,
        null_log_likelihood: f64,
        alt_log_likelihood: f64,
        degrees_of_freedom: usize,
    ) -> Self {
        let statistic = 2.0 * (alt_log_likelihood - null_log_likelihood);
        Self {
            null_order,
            alt_order,
            statistic,
            degrees_of_freedom,
            p_value: chi_squared_survival(statistic, degrees_of_freedom),
        }
    }

    /// True when the null model is rejected at `significance`
    pub fn rejects(&self, significance: f64) -> bool {
        self.p_value < significance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_survival_with_two_degrees_of_freedom_is_exponential() {
        // χ²(2) survival is exp(-x/2)
        for x in [0.1, 1.0, 3.0, 7.5, 20.0] {
            assert_close(chi_squared_survival(x, 2), (-x / 2.0).exp(), 1e-10);
        }
    }

    #[test]
    fn test_survival_critical_values() {
        // tabulated 5% and 1% critical values
        assert_close(chi_squared_survival(3.841_458_820_694_124, 1), 0.05, 1e-8);
        assert_close(chi_squared_survival(6.634_896_601_021_213, 1), 0.01, 1e-8);
        assert_close(chi_squared_survival(11.070_497_693_516_35, 5), 0.05, 1e-8);
        assert_close(chi_squared_survival(23.209_251_158_954_36, 10), 0.01, 1e-8);
    }

    #[test]
    fn test_survival_degenerate_inputs() {
        assert_eq!(chi_squared_survival(10.0, 0), 1.0);
        assert_eq!(chi_squared_survival(0.0, 3), 1.0);
        assert_eq!(chi_squared_survival(-1e-12, 3), 1.0);
        assert_eq!(chi_squared_survival(f64::NAN, 3), 1.0);
        assert!(chi_squared_survival(1e4, 1) < 1e-100);
    }

    #[test]
    fn test_survival_decreases_with_statistic() {
        let mut previous = 1.0;
        for step in 1..50 {
            let p = chi_squared_survival(step as f64 * 0.5, 4);
            assert!(p < previous);
            previous = p;
        }
    }

    #[test]
    fn test_likelihood_ratio_test() {
        let test = LikelihoodRatioTest::new(1, 2, -120.0, -100.0, 3);
        assert_eq!(test.statistic, 40.0);
        assert!(test.p_value < 1e-6);
        assert!(test.rejects(0.01));

        let flat = LikelihoodRatioTest::new(1, 2, -100.0, -100.0, 3);
        assert_eq!(flat.p_value, 1.0);
        assert!(!flat.rejects(0.01));
    }

    #[test]
    fn test_rejection_is_strict() {
        let test = LikelihoodRatioTest {
            null_order: 0,
            alt_order: 1,
            statistic: 1.0,
            degrees_of_freedom: 1,
            p_value: 0.05,
        };
        assert!(!test.rejects(0.05));
        assert!(test.rejects(0.050_000_1));
    }
}
