//! The locker toggle problem, kept as a deterministic reference check.
//!
//! Pass `i` toggles every `i`-th locker. A locker ends open exactly when it
//! has an odd number of divisors, i.e. when its number is a perfect square.

/// Run `n` passes over `n` lockers.
///
/// Returns the open count and the 1-based open positions in ascending order.
pub fn lockers(n: usize) -> (usize, Vec<usize>) {
    let mut open = vec![false; n];
    for step in 1..=n {
        for idx in (step - 1..n).step_by(step) {
            open[idx] = !open[idx];
        }
    }
    let positions: Vec<usize> = open
        .iter()
        .enumerate()
        .filter(|(_, &is_open)| is_open)
        .map(|(i, _)| i + 1)
        .collect();
    (positions.len(), positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_lockers() {
        let (count, positions) = lockers(100);
        assert_eq!(count, 10);
        assert_eq!(positions, vec![1, 4, 9, 16, 25, 36, 49, 64, 81, 100]);
    }

    #[test]
    fn test_open_positions_are_perfect_squares() {
        for n in [0, 1, 2, 17, 250] {
            let (count, positions) = lockers(n);
            let expected: Vec<usize> = (1..=n).filter(|k| {
                let r = (*k as f64).sqrt() as usize;
                r * r == *k || (r + 1) * (r + 1) == *k
            }).collect();
            assert_eq!(positions, expected, "n={n}");
            assert_eq!(count, expected.len());
        }
    }
}
