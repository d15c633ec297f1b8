/// Arithmetic mean, `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let avg = mean(data)?;
    let variance = data.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_attempts() {
        assert_eq!(mean(&[1., 2., 1., 4.]), Some(2.0));
        assert_eq!(mean(&[3.0]), Some(3.0));
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_std_dev_of_contact_times() {
        assert_eq!(std_dev(&[2., 4., 4., 4., 5., 5., 7., 9.]), Some(2.0));
        assert_eq!(std_dev(&[6.5, 6.5, 6.5]), Some(0.0));
    }
}
