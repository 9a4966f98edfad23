use half::f16;

/// Row-major GEMM: `C = alpha * op(A) * op(B) + beta * C`.
///
/// `a` holds an m×k matrix (k×m if `transpose_a`) with leading dimension
/// `lda`; `b` holds k×n (n×k if `transpose_b`) with leading dimension `ldb`;
/// `c` holds m×n with leading dimension `ldc`. Slices are pre-offset by the
/// caller.
#[allow(clippy::too_many_arguments)]
pub fn gemm_f32(
    transpose_a: bool,
    transpose_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) {
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                let av = if transpose_a { a[p * lda + i] } else { a[i * lda + p] };
                let bv = if transpose_b { b[j * ldb + p] } else { b[p * ldb + j] };
                sum += av * bv;
            }
            let idx = i * ldc + j;
            c[idx] = alpha * sum + beta * c[idx];
        }
    }
}

/// Half-precision GEMM with f32 accumulation.
#[allow(clippy::too_many_arguments)]
pub fn gemm_f16(
    transpose_a: bool,
    transpose_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f16],
    lda: usize,
    b: &[f16],
    ldb: usize,
    beta: f32,
    c: &mut [f16],
    ldc: usize,
) {
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                let av = if transpose_a { a[p * lda + i] } else { a[i * lda + p] };
                let bv = if transpose_b { b[j * ldb + p] } else { b[p * ldb + j] };
                sum += av.to_f32() * bv.to_f32();
            }
            let idx = i * ldc + j;
            c[idx] = f16::from_f32(alpha * sum + beta * c[idx].to_f32());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_matmul() {
        // [1 2; 3 4] * [5 6; 7 8] = [19 22; 43 50]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        gemm_f32(false, false, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_transpose_b() {
        // A [2x3] * B^T where B is stored [2x3]: C[i][j] = sum_p A[i][p]*B[j][p]
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mut c = [0.0; 4];
        gemm_f32(false, true, 2, 2, 3, 1.0, &a, 3, &b, 3, 0.0, &mut c, 2);
        assert_eq!(c, [4.0, 2.0, 10.0, 5.0]);
    }

    #[test]
    fn test_alpha_beta_accumulate() {
        let a = [1.0, 1.0];
        let b = [2.0, 3.0];
        let mut c = [10.0, 10.0];
        // 1x2 times 2x1? Use m=1, n=2, k=1: C = 2*A*B + 1*C
        gemm_f32(false, false, 1, 2, 1, 2.0, &a, 1, &b, 2, 1.0, &mut c, 2);
        assert_eq!(c, [14.0, 16.0]);
    }

    #[test]
    fn test_rank1_bias_broadcast() {
        // bias [3x1] times ones [1x4], beta = 1: adds bias[i] to every column.
        let bias = [1.0, 2.0, 3.0];
        let ones = [1.0; 4];
        let mut c = [0.5; 12];
        gemm_f32(false, false, 3, 4, 1, 1.0, &bias, 1, &ones, 4, 1.0, &mut c, 4);
        for j in 0..4 {
            assert_eq!(c[j], 1.5);
            assert_eq!(c[4 + j], 2.5);
            assert_eq!(c[8 + j], 3.5);
        }
    }

    #[test]
    fn test_fractional_alpha() {
        use approx::assert_relative_eq;
        // C = 0.5 * [0.1 0.2] * [0.3; 0.4]
        let a = [0.1, 0.2];
        let b = [0.3, 0.4];
        let mut c = [0.0];
        gemm_f32(false, false, 1, 1, 2, 0.5, &a, 2, &b, 1, 0.0, &mut c, 1);
        assert_relative_eq!(c[0], 0.055, epsilon = 1e-6);
    }

    #[test]
    fn test_f16_matmul() {
        let a: Vec<f16> = [1.0f32, 2.0, 3.0, 4.0].iter().map(|&v| f16::from_f32(v)).collect();
        let b: Vec<f16> = [5.0f32, 6.0, 7.0, 8.0].iter().map(|&v| f16::from_f32(v)).collect();
        let mut c = vec![f16::ZERO; 4];
        gemm_f16(false, false, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        let out: Vec<f32> = c.iter().map(|v| v.to_f32()).collect();
        assert_eq!(out, vec![19.0, 22.0, 43.0, 50.0]);
    }
}
