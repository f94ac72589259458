//! Vector and matrix helpers.
//!
//! Matrices are row-major flat buffers with an explicit `(rows, cols)` shape.
//! Length mismatches are programmer error and panic.

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "dot: len {} vs {}", a.len(), b.len());
    let mut acc = 0.0_f32;
    for (&x, &y) in a.iter().zip(b) {
        acc = x.mul_add(y, acc);
    }
    acc
}

/// `out = a + b`.
#[inline]
pub fn add(a: &[f32], b: &[f32], out: &mut [f32]) {
    assert_eq!(a.len(), b.len(), "add: len {} vs {}", a.len(), b.len());
    assert_eq!(a.len(), out.len(), "add: out len {}", out.len());
    for i in 0..a.len() {
        out[i] = a[i] + b[i];
    }
}

/// `out = a - b`.
#[inline]
pub fn sub(a: &[f32], b: &[f32], out: &mut [f32]) {
    assert_eq!(a.len(), b.len(), "sub: len {} vs {}", a.len(), b.len());
    assert_eq!(a.len(), out.len(), "sub: out len {}", out.len());
    for i in 0..a.len() {
        out[i] = a[i] - b[i];
    }
}

/// Element-wise product, in place: `a[i] *= b[i]`.
#[inline]
pub fn hadamard_in_place(a: &mut [f32], b: &[f32]) {
    assert_eq!(a.len(), b.len(), "hadamard: len {} vs {}", a.len(), b.len());
    for (x, &y) in a.iter_mut().zip(b) {
        *x *= y;
    }
}

#[inline]
pub fn scale_in_place(a: &mut [f32], factor: f32) {
    for x in a {
        *x *= factor;
    }
}

/// Largest absolute element-wise difference. A NaN difference is returned as NaN.
#[inline]
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "max_abs_diff: len {} vs {}", a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y).abs())
        .fold(0.0, |m, d| if d.is_nan() || d > m { d } else { m })
}

#[inline]
pub fn all_finite(a: &[f32]) -> bool {
    a.iter().all(|v| v.is_finite())
}

/// Transpose a `(rows, cols)` matrix into a `(cols, rows)` one.
pub fn transpose(m: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    assert_eq!(m.len(), rows * cols, "transpose: len {} vs {rows}x{cols}", m.len());
    let mut t = vec![0.0_f32; m.len()];
    for r in 0..rows {
        for c in 0..cols {
            t[c * rows + r] = m[r * cols + c];
        }
    }
    t
}

/// `out = M v` for a `(rows, cols)` matrix.
#[inline]
pub fn mul_vec(m: &[f32], rows: usize, cols: usize, v: &[f32], out: &mut [f32]) {
    assert_eq!(m.len(), rows * cols, "mul_vec: len {} vs {rows}x{cols}", m.len());
    assert_eq!(v.len(), cols, "mul_vec: v len {} vs cols {cols}", v.len());
    assert_eq!(out.len(), rows, "mul_vec: out len {} vs rows {rows}", out.len());
    for r in 0..rows {
        out[r] = dot(&m[r * cols..(r + 1) * cols], v);
    }
}

/// `out = Mᵀ v` for a `(rows, cols)` matrix, without materialising the transpose.
///
/// This is how an error signal travels backwards through a weight matrix.
#[inline]
pub fn mul_vec_transposed(m: &[f32], rows: usize, cols: usize, v: &[f32], out: &mut [f32]) {
    assert_eq!(m.len(), rows * cols, "mul_vec_t: len {} vs {rows}x{cols}", m.len());
    assert_eq!(v.len(), rows, "mul_vec_t: v len {} vs rows {rows}", v.len());
    assert_eq!(out.len(), cols, "mul_vec_t: out len {} vs cols {cols}", out.len());
    out.fill(0.0);
    for r in 0..rows {
        let vr = v[r];
        let row = &m[r * cols..(r + 1) * cols];
        for (o, &w) in out.iter_mut().zip(row) {
            *o = w.mul_add(vr, *o);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposed_product_matches_explicit_transpose() {
        // 2x3
        let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let v = [0.5_f32, -1.0];

        let mut fast = [0.0_f32; 3];
        mul_vec_transposed(&m, 2, 3, &v, &mut fast);

        let t = transpose(&m, 2, 3);
        let mut slow = [0.0_f32; 3];
        mul_vec(&t, 3, 2, &v, &mut slow);

        assert_eq!(fast, slow);
        assert_eq!(fast, [-3.5, -4.0, -4.5]);
    }

    #[test]
    fn elementwise_helpers() {
        let mut out = [0.0_f32; 2];
        sub(&[3.0, 1.0], &[1.0, 2.0], &mut out);
        assert_eq!(out, [2.0, -1.0]);

        add(&[3.0, 1.0], &[1.0, 2.0], &mut out);
        assert_eq!(out, [4.0, 3.0]);

        hadamard_in_place(&mut out, &[0.5, 2.0]);
        assert_eq!(out, [2.0, 6.0]);

        scale_in_place(&mut out, 0.5);
        assert_eq!(out, [1.0, 3.0]);

        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(max_abs_diff(&[1.0, 5.0], &[1.5, 2.0]), 3.0);
        assert!(!all_finite(&[1.0, f32::NAN]));
    }

    #[test]
    fn max_abs_diff_keeps_nan() {
        assert!(max_abs_diff(&[1.0, f32::NAN], &[1.0, 0.0]).is_nan());
        assert!(max_abs_diff(&[f32::NAN, 9.0], &[0.0, 0.0]).is_nan());
        assert_eq!(max_abs_diff(&[f32::INFINITY], &[0.0]), f32::INFINITY);
    }

    #[test]
    #[should_panic]
    fn dot_panics_on_length_mismatch() {
        dot(&[1.0], &[1.0, 2.0]);
    }
}
