//! Distance between binary feature vectors.

use crate::error::{EngineError, Result};
use catalog::FeatureVector;

/// Fraction of positions where `a` and `b` differ (normalized Hamming distance).
///
/// The result lies in `[0, 1]`. Two empty vectors are at distance 0.
/// Vectors of unequal length are never truncated; they fail with
/// `LengthMismatch`.
pub fn distance(a: &FeatureVector, b: &FeatureVector) -> Result<f64> {
    if a.len() != b.len() {
        return Err(EngineError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let mismatches = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .filter(|(x, y)| x != y)
        .count();

    Ok(mismatches as f64 / a.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(bits: &str) -> FeatureVector {
        bits.parse().unwrap()
    }

    #[test]
    fn test_distance_counts_mismatches() {
        assert_eq!(distance(&fv("1100"), &fv("1010")).unwrap(), 0.5);
        assert_eq!(distance(&fv("1111"), &fv("0000")).unwrap(), 1.0);
        assert_eq!(distance(&fv("10110"), &fv("10110")).unwrap(), 0.0);
        assert_eq!(distance(&fv("1000"), &fv("0000")).unwrap(), 0.25);
    }

    #[test]
    fn test_distance_length_mismatch() {
        let err = distance(&fv("101"), &fv("1010")).unwrap_err();
        assert_eq!(err, EngineError::LengthMismatch { left: 3, right: 4 });
    }

    #[test]
    fn test_distance_empty_vectors() {
        assert_eq!(distance(&fv(""), &fv("")).unwrap(), 0.0);
    }
}
