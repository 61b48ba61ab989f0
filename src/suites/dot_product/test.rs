//! Tests for dot product implementations

use super::code::{dot_product_original, dot_product_unrolled, verify_all};
use super::random_vectors;

#[test]
fn test_variants_agree() {
    verify_all().expect("unrolled variant should match the reference");
}

#[test]
fn test_simple_values() {
    let a = [1.0, 2.0, 3.0];
    let b = [4.0, 5.0, 6.0];
    assert_eq!(dot_product_original(&a, &b), 32.0);
    assert_eq!(dot_product_unrolled(&a, &b), 32.0);
}

#[test]
fn test_exact_chunks() {
    let a = [1.0f32; 8];
    let b = [2.0f32; 8];
    assert_eq!(dot_product_unrolled(&a, &b), 16.0);
}

#[test]
fn test_empty() {
    assert_eq!(dot_product_original(&[], &[]), 0.0);
    assert_eq!(dot_product_unrolled(&[], &[]), 0.0);
}

#[test]
#[should_panic(expected = "same length")]
fn test_length_mismatch_panics() {
    dot_product_unrolled(&[1.0], &[1.0, 2.0]);
}

#[test]
fn test_random_vectors() {
    let (a, b) = random_vectors(100, 5);
    assert_eq!((a.len(), b.len()), (100, 100));
    assert!(a.iter().chain(&b).all(|x| (-1.0..1.0).contains(x)));
    assert_eq!(random_vectors(100, 5), (a, b));
}
