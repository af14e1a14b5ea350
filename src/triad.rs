//! Thesis–antithesis–synthesis reduction and the text/byte amplitude transforms.
//!
//! ```text
//! chunk([1, 2, 3, 4])  → [[1, 2, 3], [4, 0, 0]]
//! triad([a, b, c…], m) → (a − b + Σ c…) × m
//! ```

use crate::config::TriadPolicy;
use crate::error::{AetherError, AetherResult};

/// Width of a triad chunk.
pub const TRIAD_WIDTH: usize = 3;

/// Split a sequence into chunks of exactly [`TRIAD_WIDTH`], zero-padding the last.
///
/// An empty sequence yields no chunks.
pub fn chunk(seq: &[f64]) -> Vec<[f64; TRIAD_WIDTH]> {
    seq.chunks(TRIAD_WIDTH)
        .map(|part| {
            let mut out = [0.0; TRIAD_WIDTH];
            out[..part.len()].copy_from_slice(part);
            out
        })
        .collect()
}

/// Reduce a chunk: `(thesis − antithesis + Σ rest) × modifier`.
///
/// Inputs shorter than three values are zero-padded under [`TriadPolicy::Pad`]
/// and rejected under [`TriadPolicy::Strict`].
pub fn triad(values: &[f64], modifier: f64, policy: TriadPolicy) -> AetherResult<f64> {
    if values.len() < TRIAD_WIDTH && policy == TriadPolicy::Strict {
        return Err(AetherError::InsufficientArguments {
            needed: TRIAD_WIDTH,
            got: values.len(),
        });
    }
    let thesis = values.first().copied().unwrap_or(0.0);
    let antithesis = values.get(1).copied().unwrap_or(0.0);
    let rest: f64 = values.iter().skip(2).sum();
    Ok((thesis - antithesis + rest) * modifier)
}

/// Reduce a whole argument list, one value per chunk.
///
/// Under [`TriadPolicy::Pad`] the list goes through [`chunk`]. Under
/// [`TriadPolicy::Strict`] a short final chunk is rejected instead.
pub fn triads(seq: &[f64], modifier: f64, policy: TriadPolicy) -> AetherResult<Vec<f64>> {
    match policy {
        TriadPolicy::Pad => chunk(seq)
            .iter()
            .map(|part| triad(part, modifier, policy))
            .collect(),
        TriadPolicy::Strict => seq
            .chunks(TRIAD_WIDTH)
            .map(|part| triad(part, modifier, policy))
            .collect(),
    }
}

/// Amplitude of a text: `ln(1 + Σ code points)`.
pub fn text_to_amp(text: &str) -> f64 {
    let total: f64 = text.chars().map(|c| c as u32 as f64).sum();
    total.ln_1p()
}

/// Amplitude of a byte chunk: `ln(1 + Σ bytes)`.
pub fn bytes_to_amp(bytes: &[u8]) -> f64 {
    let total: f64 = bytes.iter().map(|&b| b as f64).sum();
    total.ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_always_width_three() {
        for n in 1..=10 {
            let seq: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
            let chunks = chunk(&seq);
            assert_eq!(chunks.len(), (n + 2) / 3, "n={n}");
            assert_eq!(chunks.last().map(|c| c.len()), Some(3));
        }
    }

    #[test]
    fn test_chunk_pads_with_zero() {
        assert_eq!(chunk(&[1.0, 2.0, 3.0, 4.0]), vec![[1.0, 2.0, 3.0], [4.0, 0.0, 0.0]]);
        assert_eq!(chunk(&[7.0]), vec![[7.0, 0.0, 0.0]]);
        assert!(chunk(&[]).is_empty());
    }

    #[test]
    fn test_triad_exact() {
        assert_eq!(triad(&[10.0, 20.0, 30.0], 1.0, TriadPolicy::Pad).unwrap(), 20.0);
        assert_eq!(triad(&[10.0, 20.0, 30.0], -0.5, TriadPolicy::Pad).unwrap(), -10.0);
        assert_eq!(triad(&[1.0, 2.0, 3.0, 4.0], 2.0, TriadPolicy::Strict).unwrap(), 12.0);
    }

    #[test]
    fn test_triad_short_input_policies() {
        assert_eq!(triad(&[5.0], 1.5, TriadPolicy::Pad).unwrap(), 7.5);
        assert_eq!(triad(&[], 1.0, TriadPolicy::Pad).unwrap(), 0.0);
        assert_eq!(
            triad(&[5.0, 1.0], 1.0, TriadPolicy::Strict).unwrap_err(),
            AetherError::InsufficientArguments { needed: 3, got: 2 }
        );
    }

    #[test]
    fn test_triads_one_value_per_chunk() {
        let seq = [10.0, 20.0, 30.0, 4.0];
        assert_eq!(triads(&seq, 1.0, TriadPolicy::Pad).unwrap(), vec![20.0, 4.0]);
        assert!(triads(&[], 1.0, TriadPolicy::Pad).unwrap().is_empty());
        assert_eq!(
            triads(&seq, 1.0, TriadPolicy::Strict).unwrap_err(),
            AetherError::InsufficientArguments { needed: 3, got: 1 }
        );
        assert_eq!(triads(&seq[..3], -1.0, TriadPolicy::Strict).unwrap(), vec![-20.0]);
    }

    #[test]
    fn test_text_to_amp() {
        assert_eq!(text_to_amp(""), 0.0);
        // 'A' = 65
        assert!((text_to_amp("A") - 66.0_f64.ln()).abs() < 1e-12);
        assert!(text_to_amp("LUX") > text_to_amp("LU"));
    }

    #[test]
    fn test_bytes_to_amp() {
        assert_eq!(bytes_to_amp(&[]), 0.0);
        assert!((bytes_to_amp(&[1, 2, 3]) - 7.0_f64.ln()).abs() < 1e-12);
    }
}
