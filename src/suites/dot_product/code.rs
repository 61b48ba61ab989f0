//! Dot product implementations.

/// Reference implementation.
///
/// # Panics
/// Panics if the vectors have different lengths.
pub fn dot_product_original(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Four elements per iteration into four accumulators, so consecutive
/// multiply-adds do not wait on each other.
///
/// # Panics
/// Panics if the vectors have different lengths.
pub fn dot_product_unrolled(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    let mut sums = [0.0f32; 4];
    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);
    for (x, y) in a_chunks.by_ref().zip(b_chunks.by_ref()) {
        sums[0] += x[0] * y[0];
        sums[1] += x[1] * y[1];
        sums[2] += x[2] * y[2];
        sums[3] += x[3] * y[3];
    }

    for (x, y) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        sums[0] += x * y;
    }

    (sums[0] + sums[1]) + (sums[2] + sums[3])
}

/// Relative error allowed between the two summation orders.
const TOLERANCE: f32 = 1e-4;

pub fn verify_all() -> Result<(), String> {
    for len in [0usize, 1, 3, 4, 7, 64, 1000] {
        let (a, b) = super::random_vectors(len, 99);
        let expected = dot_product_original(&a, &b);
        let actual = dot_product_unrolled(&a, &b);
        let scale = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum::<f32>().max(1.0);
        if (expected - actual).abs() / scale > TOLERANCE {
            return Err(format!(
                "unrolled variant failed for length {}: expected {}, got {}",
                len, expected, actual
            ));
        }
    }
    Ok(())
}
