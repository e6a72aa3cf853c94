//! Phred-scaled quality conversions.

/// Probability that a call with the given Phred score is wrong.
#[inline]
pub fn error_probability(phred: u8) -> f64 {
    10f64.powf(-f64::from(phred) / 10.0)
}

/// Probability that a call with the given Phred score is right.
#[inline]
pub fn accuracy(phred: u8) -> f64 {
    1.0 - error_probability(phred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_common_scores() {
        assert_eq!(error_probability(0), 1.0);
        assert_eq!(accuracy(0), 0.0);
        assert!((accuracy(10) - 0.9).abs() < 1e-12);
        assert!((accuracy(20) - 0.99).abs() < 1e-12);
        assert!((accuracy(30) - 0.999).abs() < 1e-12);
    }

    #[test]
    fn accuracy_is_monotonic() {
        let mut last = -1.0;
        for q in 0..=60u8 {
            let acc = accuracy(q);
            assert!(acc > last);
            last = acc;
        }
    }
}
