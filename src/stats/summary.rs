//! Column summary statistics and the report line
//!
//! Report format: `|mean|stddev|max|min|`, optionally prefixed by a label
//! field. Mean, max and min are printed with no decimals, the standard
//! deviation with five; downstream tables depend on this exact shape.

/// Aggregates of a numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divisor N)
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
}

impl ColumnSummary {
    /// Compute the summary; `None` for an empty column
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            max,
            min,
        })
    }

    /// Format the report line
    pub fn report_line(&self, label: Option<&str>) -> String {
        let stats = format!(
            "{:.0}|{:.5}|{:.0}|{:.0}|",
            self.mean, self.std_dev, self.max, self.min
        );
        match label {
            Some(label) => format!("|{}|{}", label, stats),
            None => format!("|{}", stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE_TO_FIVE: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    #[test]
    fn test_one_to_five() {
        let summary = ColumnSummary::compute(&ONE_TO_FIVE).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 3.0);
        assert!((summary.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.min, 1.0);
    }

    #[test]
    fn test_report_line_without_label() {
        let summary = ColumnSummary::compute(&ONE_TO_FIVE).unwrap();
        assert_eq!(summary.report_line(None), "|3|1.41421|5|1|");
    }

    #[test]
    fn test_report_line_with_label() {
        let summary = ColumnSummary::compute(&ONE_TO_FIVE).unwrap();
        assert_eq!(summary.report_line(Some("L")), "|L|3|1.41421|5|1|");
    }

    #[test]
    fn test_population_not_sample_deviation() {
        // Sample deviation of [2, 4] would be 1.41421
        let summary = ColumnSummary::compute(&[2.0, 4.0]).unwrap();
        assert_eq!(summary.std_dev, 1.0);
    }

    #[test]
    fn test_integer_fields_round() {
        let summary = ColumnSummary::compute(&[10.4, 20.2, 31.9]).unwrap();
        assert_eq!(summary.report_line(None), "|21|8.78876|32|10|");

        let summary = ColumnSummary::compute(&[2.5, 3.5, -1.25, 8.0]).unwrap();
        assert_eq!(summary.report_line(Some("mixed")), "|mixed|3|3.29476|8|-1|");
    }

    #[test]
    fn test_constant_column() {
        let summary = ColumnSummary::compute(&[7.0; 4]).unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.report_line(Some("flat")), "|flat|7|0.00000|7|7|");
    }

    #[test]
    fn test_empty_column() {
        assert_eq!(ColumnSummary::compute(&[]), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_mean_between_min_and_max(
            values in prop::collection::vec(-1_000_000i32..1_000_000, 1..64),
        ) {
            let values: Vec<f64> = values.into_iter().map(f64::from).collect();
            let s = ColumnSummary::compute(&values).unwrap();
            prop_assert!(s.max >= s.mean);
            prop_assert!(s.mean >= s.min);
            prop_assert!(s.std_dev >= 0.0);
        }

        #[test]
        fn prop_permutation_invariant(
            values in prop::collection::vec(-1000i32..1000, 1..64),
            rotate in 0usize..64,
        ) {
            let values: Vec<f64> = values.into_iter().map(f64::from).collect();
            let mut shuffled = values.clone();
            shuffled.reverse();
            let len = shuffled.len();
            shuffled.rotate_left(rotate % len);

            let a = ColumnSummary::compute(&values).unwrap();
            let b = ColumnSummary::compute(&shuffled).unwrap();
            prop_assert_eq!(a.mean, b.mean);
            prop_assert!((a.std_dev - b.std_dev).abs() <= 1e-9 * a.std_dev.max(1.0));
            prop_assert_eq!(a.max, b.max);
            prop_assert_eq!(a.min, b.min);
        }

        #[test]
        fn prop_zero_deviation_means_constant(
            value in -1_000_000i32..1_000_000,
            len in 1usize..32,
        ) {
            let value = f64::from(value);
            let s = ColumnSummary::compute(&vec![value; len]).unwrap();
            prop_assert_eq!(s.std_dev, 0.0);
            prop_assert_eq!(s.max, s.min);
            prop_assert_eq!(s.max, value);
        }
    }
}
