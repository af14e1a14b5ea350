//! Sextet sensor collaborator.
//!
//! A sensor hands the dispatcher snapshot readings: a full [`Sextet`] and,
//! optionally, an observed grid. Readings may be stale or synthetic; the
//! core clamps what it cannot use.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sextet::Sextet;

/// Snapshot source of sextet readings.
pub trait SextetSensor: Send {
    /// Latest sextet reading.
    fn sextet(&mut self) -> Sextet;

    /// Latest observed grid, if the sensor has an imager.
    fn visual_grid(&mut self) -> Option<Array2<f64>> {
        None
    }
}

/// Synthetic ferrocell. Drift follows a tick counter; jitter comes from a seeded RNG.
///
/// ```text
/// R  = 1e-9 · (1 + 0.1·sin(0.2t))
/// C  = |0.5·cos(0.5t)|
/// P  = 1 + U(−0.1, 0.1)
/// M  = U(0, 0.2)
/// Pt = 1 + 0.05·sin(0.3t)
/// D  = U(0, 0.4)
/// ```
#[derive(Debug, Clone)]
pub struct MockFerrocell {
    rng: StdRng,
    tick: u64,
    imager: Option<usize>,
}

impl MockFerrocell {
    /// A sensor without an imager.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tick: 0,
            imager: None,
        }
    }

    /// Also produce a `size × size` observed grid on every read.
    pub fn with_imager(mut self, size: usize) -> Self {
        self.imager = Some(size);
        self
    }

    /// Readings taken so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

impl SextetSensor for MockFerrocell {
    fn sextet(&mut self) -> Sextet {
        self.tick += 1;
        let t = self.tick as f64;
        Sextet {
            resistance: 1e-9 * (1.0 + (t * 0.2).sin() * 0.1),
            capacitance: ((t * 0.5).cos() * 0.5).abs(),
            permeability: 1.0 + self.rng.gen_range(-0.1..0.1),
            magnetism: self.rng.gen_range(0.0..0.2),
            permittivity: 1.0 + (t * 0.3).sin() * 0.05,
            dielectricity: self.rng.gen_range(0.0..0.4),
        }
    }

    fn visual_grid(&mut self) -> Option<Array2<f64>> {
        let size = self.imager?;
        let t = self.tick as f64;
        Some(Array2::from_shape_fn((size, size), |(i, j)| {
            0.1 * (i as f64 * 0.3 + t).sin() * (j as f64 * 0.3).cos()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_readings_in_range() {
        let mut sensor = MockFerrocell::new(7);
        for _ in 0..50 {
            let s = sensor.sextet();
            assert!(s.resistance > 0.0 && s.resistance < 2e-9);
            assert!((0.0..=0.5).contains(&s.capacitance));
            assert!((0.9..1.1).contains(&s.permeability));
            assert!((0.0..0.2).contains(&s.magnetism));
            assert!((0.95..=1.05).contains(&s.permittivity));
            assert!((0.0..0.4).contains(&s.dielectricity));
        }
        assert_eq!(sensor.ticks(), 50);
    }

    #[test]
    fn test_mock_is_reproducible() {
        let mut a = MockFerrocell::new(3);
        let mut b = MockFerrocell::new(3);
        for _ in 0..5 {
            assert_eq!(a.sextet(), b.sextet());
        }
    }

    #[test]
    fn test_imager_optional() {
        assert!(MockFerrocell::new(1).visual_grid().is_none());
        let grid = MockFerrocell::new(1).with_imager(6).visual_grid().unwrap();
        assert_eq!(grid.dim(), (6, 6));
        assert!(grid.iter().all(|v| v.abs() <= 0.1));
    }
}
