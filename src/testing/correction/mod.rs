//! Multiple testing correction to control for false positives when performing many
//! statistical tests simultaneously.
//!
//! Corrections are batch operations: the adjusted value of one test depends on the
//! p-values of every other test in the batch, so callers must pass the complete set.

use anyhow::{Result, anyhow};
use num_traits::Float;
use std::cmp::Ordering;

fn validate_p_values<T: Float>(p_values: &[T]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(p >= T::zero() && p <= T::one()) {
            return Err(anyhow!(
                "Invalid p-value at index {}: {}",
                i,
                p.to_f64().unwrap_or(f64::NAN)
            ));
        }
    }

    Ok(())
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
///
/// The BH procedure controls the false discovery rate (FDR), which is the expected
/// proportion of false positives among all rejected null hypotheses. The returned
/// q-values are monotone in p-value order and never smaller than the raw p-value.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<T>>` - Vector of adjusted p-values, in input order
///
/// # Example
/// ```
/// use decopath_consensus::testing::correction::benjamini_hochberg_correction;
///
/// let p_values = vec![0.01_f64, 0.03, 0.05];
/// let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
/// assert!((adjusted[2] - 0.05).abs() < 1e-12);
/// ```
pub fn benjamini_hochberg_correction<T: Float>(p_values: &[T]) -> Result<Vec<T>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let n_t = T::from(n).ok_or_else(|| anyhow!("Too many p-values"))?;

    // Create index-value pairs and sort by p-value in ascending order
    let mut indexed_p_values: Vec<(usize, T)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed_p_values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut adjusted_p_values = vec![T::zero(); n];
    let mut current_min = T::one();

    // Process from largest to smallest p-value
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed_p_values[i];
        let rank = T::from(i + 1).ok_or_else(|| anyhow!("Too many p-values"))?;

        let adjustment = (p_val * n_t / rank).min(T::one());
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}
