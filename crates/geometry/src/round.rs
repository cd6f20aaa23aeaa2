//! Rounding helpers for compact on-disk encodings.

/// Round `value` to `digits` decimal places.
#[must_use]
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(digits).unwrap_or(i32::MAX));
    // Adding +0.0 turns a rounded -0.0 into 0.0 so the database never shows "-0.0".
    (value * factor).round() / factor + 0.0
}

/// Elementwise comparison of two equally long slices within `eps`.
#[must_use]
pub fn approx_eq_slice(a: &[f64], b: &[f64], eps: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_four_digits() {
        assert!((round_to(0.123_456, 4) - 0.1235).abs() < 1e-12);
        assert!((round_to(-1.570_796_3, 4) + 1.5708).abs() < 1e-12);
    }

    #[test]
    fn negative_zero_is_normalized() {
        let v = round_to(-0.000_01, 4);
        assert!(v.is_sign_positive());
    }

    #[test]
    fn rpy_tolerance_match() {
        assert!(approx_eq_slice(&[1.57, 1.57, -1.57], &[1.5708, 1.5708, -1.5708], 0.1));
        assert!(!approx_eq_slice(&[1.57, 0.0, -1.57], &[1.57, 1.57, -1.57], 0.1));
        assert!(!approx_eq_slice(&[1.0], &[1.0, 2.0], 0.1));
    }
}
