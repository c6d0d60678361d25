use std::f64::consts::{FRAC_1_SQRT_2, PI};

use super::DiscreteCosineTransformer;

/// Orthonormal DCT-II as the matrix product `A X Aᵀ`, inverted by `Aᵀ Y A`.
pub struct SeparatedDiscreteCosineTransformer {
    size: usize,
    // row k holds basis function k
    basis: Vec<f64>,
}

impl SeparatedDiscreteCosineTransformer {
    pub fn new(size: usize) -> Self {
        let scale = (2.0 / size as f64).sqrt();
        let mut basis = Vec::with_capacity(size * size);
        for k in 0..size {
            let c = if k == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            for n in 0..size {
                let argument = (2 * n + 1) as f64 * k as f64 * PI / (2 * size) as f64;
                basis.push(c * scale * argument.cos());
            }
        }
        Self { size, basis }
    }

    fn a(&self, row: usize, column: usize) -> f64 {
        self.basis[row * self.size + column]
    }

    /// `left · block · right` where `transpose_left` picks `A` or `Aᵀ` on the left
    /// and the right factor is always the transpose of the left.
    fn sandwich(&self, block: &mut [f64], transpose_left: bool) {
        let n = self.size;
        let left = |i: usize, k: usize| if transpose_left { self.a(k, i) } else { self.a(i, k) };
        let mut intermediate = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                intermediate[i * n + j] = (0..n).map(|k| left(i, k) * block[k * n + j]).sum();
            }
        }
        for i in 0..n {
            for j in 0..n {
                block[i * n + j] = (0..n).map(|k| intermediate[i * n + k] * left(j, k)).sum();
            }
        }
    }
}

impl DiscreteCosineTransformer for SeparatedDiscreteCosineTransformer {
    fn transform(&self, block: &mut [f64]) {
        debug_assert_eq!(block.len(), self.size * self.size);
        self.sandwich(block, false);
    }

    fn inverse_transform(&self, block: &mut [f64]) {
        debug_assert_eq!(block.len(), self.size * self.size);
        self.sandwich(block, true);
    }
}
