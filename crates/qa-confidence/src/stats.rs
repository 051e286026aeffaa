//! Small sample-statistics helpers shared by the aggregation methods and
//! the uncertainty quantifier. Kept local rather than pulled from a crate
//! since each is a couple of lines and the set needed is fixed.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample variance (n-1 denominator), matching Python's `statistics.variance`.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    sum_sq / (values.len() - 1) as f64
}

pub fn stdev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn variance_of_single_value_is_zero() {
        assert_eq!(variance(&[0.5]), 0.0);
    }

    #[test]
    fn stdev_matches_hand_computed_value() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((stdev(&values) - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn median_of_even_length_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
