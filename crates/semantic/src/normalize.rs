/// In-place L2 normalization. Zero vectors are left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Normalizes every vector of a batch when `enabled`.
pub(crate) fn normalize_all(vectors: &mut [Vec<f32>], enabled: bool) {
    if enabled {
        for vector in vectors.iter_mut() {
            l2_normalize_in_place(vector);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_simple_vector() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector_stays_zero() {
        let mut v = vec![0.0f32; 4];
        l2_normalize_in_place(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn normalize_all_respects_flag() {
        let mut batch = vec![vec![2.0f32, 0.0], vec![0.0, 5.0]];
        normalize_all(&mut batch, false);
        assert_eq!(batch[0], vec![2.0, 0.0]);

        normalize_all(&mut batch, true);
        assert_eq!(batch[0], vec![1.0, 0.0]);
        assert_eq!(batch[1], vec![0.0, 1.0]);
    }
}
