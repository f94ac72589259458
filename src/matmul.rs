//! GEMM wrapper used by batched inference.
//!
//! `C = alpha * A B + beta * C` over strided `f32` buffers. The default backend is a
//! plain triple loop; the `matrixmultiply` feature swaps in the blocked kernel.

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f32(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    rsa: usize,
    csa: usize,
    b: &[f32],
    rsb: usize,
    csb: usize,
    beta: f32,
    c: &mut [f32],
    rsc: usize,
    csc: usize,
) {
    debug_assert!(m > 0 && n > 0 && k > 0);
    debug_assert!(a.len() > (m - 1) * rsa + (k - 1) * csa);
    debug_assert!(b.len() > (k - 1) * rsb + (n - 1) * csb);
    debug_assert!(c.len() > (m - 1) * rsc + (n - 1) * csc);

    #[cfg(feature = "matrixmultiply")]
    // SAFETY: the debug assertions above describe the extents the callers guarantee;
    // every index the kernel touches lies inside `a`, `b` and `c`.
    unsafe {
        matrixmultiply::sgemm(
            m,
            k,
            n,
            alpha,
            a.as_ptr(),
            rsa as isize,
            csa as isize,
            b.as_ptr(),
            rsb as isize,
            csb as isize,
            beta,
            c.as_mut_ptr(),
            rsc as isize,
            csc as isize,
        );
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f32;
            for p in 0..k {
                acc = a[i * rsa + p * csa].mul_add(b[p * rsb + j * csb], acc);
            }
            let idx = i * rsc + j * csc;
            c[idx] = alpha * acc + beta * c[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_with_transposed_operand_and_accumulate() {
        // A (2x3) times Bᵀ where B is stored (2x3) row-major, plus C.
        let a = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0_f32, 0.0, -1.0, 0.5, 0.5, 0.5];
        let mut c = [10.0_f32, 0.0, 0.0, 1.0];

        gemm_f32(2, 2, 3, 1.0, &a, 3, 1, &b, 1, 3, 1.0, &mut c, 2, 1);

        assert_eq!(c, [8.0, 3.0, -2.0, 8.5]);
    }
}
