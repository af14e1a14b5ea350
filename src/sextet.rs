/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The six derived properties of a materia and the per-architecture profile table.
//!
//! - [`Sextet`]: resistance, capacitance, permeability, magnetism, permittivity,
//!   dielectricity.
//! - [`Architecture`]: tagged variant selecting an Intellectus physics profile.
//! - [`ArchitectureProfile`]: constant overrides applied at construction and
//!   after each sextet recompute.
//!
//! # Invariants
//!
//! - **SX-001**: `permittivity = 1 − dielectricity` after every recompute.
//! - **SX-002**: `dielectricity ≥ DIELECTRIC_FLOOR` (0.1) after every recompute.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lower bound on dielectricity.
pub const DIELECTRIC_FLOOR: f64 = 0.1;

/// Guard added to divisors throughout the physics.
pub const EPSILON: f64 = 1e-9;

// ─── Sextet ─────────────────────────────────────────────────────────────────

/// Six scalar properties recomputed from grid statistics after every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sextet {
    /// Inertia against change: grid variance scaled by capacitance.
    pub resistance: f64,
    /// Stored energy.
    pub capacitance: f64,
    /// Shielding: `1 / (1 + magnetism)`. Scales every perturbation.
    pub permeability: f64,
    /// Mean absolute flux. Bias added during converge.
    pub magnetism: f64,
    /// `1 − dielectricity`. Fraction of a perturbation stored as energy.
    pub permittivity: f64,
    /// Insulation against the most recent change.
    pub dielectricity: f64,
}

impl Sextet {
    /// The quiescent sextet of a freshly created materia.
    pub fn quiescent() -> Self {
        Self {
            resistance: EPSILON,
            capacitance: 0.0,
            permeability: 1.0,
            magnetism: 0.0,
            permittivity: 1.0 - DIELECTRIC_FLOOR,
            dielectricity: DIELECTRIC_FLOOR,
        }
    }

    /// Component-wise sum, used when one materia absorbs another.
    pub fn summed(&self, other: &Sextet) -> Sextet {
        Sextet {
            resistance: self.resistance + other.resistance,
            capacitance: self.capacitance + other.capacitance,
            permeability: self.permeability + other.permeability,
            magnetism: self.magnetism + other.magnetism,
            permittivity: self.permittivity + other.permittivity,
            dielectricity: self.dielectricity + other.dielectricity,
        }
    }

    /// Component-wise scale, used when a materia is split.
    pub fn scaled(&self, factor: f64) -> Sextet {
        Sextet {
            resistance: self.resistance * factor,
            capacitance: self.capacitance * factor,
            permeability: self.permeability * factor,
            magnetism: self.magnetism * factor,
            permittivity: self.permittivity * factor,
            dielectricity: self.dielectricity * factor,
        }
    }
}

impl Default for Sextet {
    fn default() -> Self {
        Self::quiescent()
    }
}

impl fmt::Display for Sextet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R={:.2}, C={:.2}, M={:.2}, P={:.2}, Pt={:.2}, D={:.2}",
            self.resistance,
            self.capacitance,
            self.magnetism,
            self.permeability,
            self.permittivity,
            self.dielectricity
        )
    }
}

// ─── Architecture ───────────────────────────────────────────────────────────

/// Intellectus architecture. A plain materia has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    /// High pattern memory, logarithmic learning.
    Transformer,
    /// Low initial resistance; favours sequential rhythm.
    Procedural,
    /// Strong initial magnetism; promotes density clustering.
    Object,
    /// Raised permeability; pure wave interaction.
    Functional,
}

impl Architecture {
    /// Name as written in `MODO '…'`.
    pub fn name(self) -> &'static str {
        match self {
            Architecture::Transformer => "TRANSFORMER",
            Architecture::Procedural => "PROCEDURAL",
            Architecture::Object => "OBJECT",
            Architecture::Functional => "FUNCTIONAL",
        }
    }

    /// Constant overrides for this architecture.
    pub fn profile(self) -> ArchitectureProfile {
        match self {
            Architecture::Transformer => ArchitectureProfile {
                magnetism: Some(2.0),
                permittivity: Some(0.5),
                log_magnetism_gain: true,
                resistance_decay: Some(0.9),
                ..ArchitectureProfile::NONE
            },
            Architecture::Procedural => ArchitectureProfile {
                resistance: Some(0.5),
                ..ArchitectureProfile::NONE
            },
            Architecture::Object => ArchitectureProfile {
                magnetism: Some(3.0),
                ..ArchitectureProfile::NONE
            },
            Architecture::Functional => ArchitectureProfile {
                permeability: Some(1.5),
                ..ArchitectureProfile::NONE
            },
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRANSFORMER" => Ok(Architecture::Transformer),
            "PROCEDURAL" => Ok(Architecture::Procedural),
            "OBJECT" => Ok(Architecture::Object),
            "FUNCTIONAL" => Ok(Architecture::Functional),
            other => Err(other.to_string()),
        }
    }
}

/// Parameter overrides for one [`Architecture`].
///
/// Initial overrides replace the quiescent sextet at construction. The two
/// post-update fields run after every recompute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchitectureProfile {
    /// Initial resistance.
    pub resistance: Option<f64>,
    /// Initial magnetism.
    pub magnetism: Option<f64>,
    /// Initial permeability.
    pub permeability: Option<f64>,
    /// Initial permittivity.
    pub permittivity: Option<f64>,
    /// After each recompute: `magnetism += ln(1 + |change|)`.
    pub log_magnetism_gain: bool,
    /// After each recompute: `resistance *= factor`.
    pub resistance_decay: Option<f64>,
}

impl ArchitectureProfile {
    /// A profile that changes nothing.
    pub const NONE: ArchitectureProfile = ArchitectureProfile {
        resistance: None,
        magnetism: None,
        permeability: None,
        permittivity: None,
        log_magnetism_gain: false,
        resistance_decay: None,
    };

    /// Apply the initial overrides to a sextet.
    pub fn seed(&self, sextet: &mut Sextet) {
        if let Some(r) = self.resistance {
            sextet.resistance = r;
        }
        if let Some(m) = self.magnetism {
            sextet.magnetism = m;
        }
        if let Some(p) = self.permeability {
            sextet.permeability = p;
        }
        if let Some(pt) = self.permittivity {
            sextet.permittivity = pt;
        }
    }

    /// Apply the post-update hook for a mutation of magnitude `change`.
    pub fn after_update(&self, sextet: &mut Sextet, change: f64) {
        if self.log_magnetism_gain {
            sextet.magnetism += change.abs().ln_1p();
        }
        if let Some(factor) = self.resistance_decay {
            sextet.resistance *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiescent_respects_floor() {
        let s = Sextet::quiescent();
        assert!(s.dielectricity >= DIELECTRIC_FLOOR);
        assert!((s.permittivity - (1.0 - s.dielectricity)).abs() < 1e-12);
    }

    #[test]
    fn test_profiles_match_architectures() {
        let mut s = Sextet::quiescent();
        Architecture::Transformer.profile().seed(&mut s);
        assert_eq!(s.magnetism, 2.0);
        assert_eq!(s.permittivity, 0.5);

        let mut s = Sextet::quiescent();
        Architecture::Procedural.profile().seed(&mut s);
        assert_eq!(s.resistance, 0.5);

        let mut s = Sextet::quiescent();
        Architecture::Object.profile().seed(&mut s);
        assert_eq!(s.magnetism, 3.0);

        let mut s = Sextet::quiescent();
        Architecture::Functional.profile().seed(&mut s);
        assert_eq!(s.permeability, 1.5);
    }

    #[test]
    fn test_transformer_after_update() {
        let mut s = Sextet::quiescent();
        s.resistance = 10.0;
        Architecture::Transformer.profile().after_update(&mut s, -1.0);
        assert!((s.magnetism - 2.0_f64.ln()).abs() < 1e-12);
        assert!((s.resistance - 9.0).abs() < 1e-12);

        let mut plain = Sextet::quiescent();
        Architecture::Object.profile().after_update(&mut plain, 5.0);
        assert_eq!(plain, Sextet::quiescent());
    }

    #[test]
    fn test_architecture_from_str() {
        assert_eq!("object".parse::<Architecture>(), Ok(Architecture::Object));
        assert_eq!(" TRANSFORMER ".parse::<Architecture>(), Ok(Architecture::Transformer));
        assert!("LISP".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_sum_and_scale() {
        let a = Sextet::quiescent();
        let doubled = a.summed(&a);
        let halved = doubled.scaled(0.5);
        assert!((halved.permeability - a.permeability).abs() < 1e-12);
        assert!((halved.dielectricity - a.dielectricity).abs() < 1e-12);
    }
}
