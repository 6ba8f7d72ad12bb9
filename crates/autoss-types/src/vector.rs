//! Dense vector arithmetic over `f64` components.
//!
//! Vectors are plain `Vec<f64>` so records serialize as JSON number arrays.

/// Zero vector of the given dimension.
pub fn zeros(dimension: usize) -> Vec<f64> {
    vec![0.0; dimension]
}

/// Elementwise `acc += v`. Returns false (leaving `acc` untouched) on a
/// dimension mismatch.
pub fn add_assign(acc: &mut [f64], v: &[f64]) -> bool {
    if acc.len() != v.len() {
        return false;
    }
    for (a, b) in acc.iter_mut().zip(v) {
        *a += b;
    }
    true
}

/// Elementwise `a - b`, or `None` on a dimension mismatch.
pub fn sub(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| x - y).collect())
}

/// Euclidean (L2) norm.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

pub fn is_zero(v: &[f64]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Unit-length direction of `v`; the zero vector maps to itself.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let norm = l2_norm(v);
    if is_zero(v) || norm == 0.0 {
        return zeros(v.len());
    }
    v.iter().map(|x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign() {
        let mut acc = zeros(3);
        assert!(add_assign(&mut acc, &[1.0, 2.0, 3.0]));
        assert!(add_assign(&mut acc, &[1.0, 0.0, -1.0]));
        assert_eq!(acc, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_add_assign_mismatch() {
        let mut acc = zeros(2);
        assert!(!add_assign(&mut acc, &[1.0, 2.0, 3.0]));
        assert_eq!(acc, vec![0.0, 0.0]);
    }

    #[test]
    fn test_sub() {
        assert_eq!(sub(&[3.0, 1.0], &[1.0, 1.0]), Some(vec![2.0, 0.0]));
        assert_eq!(sub(&[3.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_normalize_3_4_5() {
        let n = normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 1e-12);
        assert!((n[1] - 0.8).abs() < 1e-12);
        assert!((l2_norm(&n) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize(&zeros(4)), zeros(4));
    }
}
