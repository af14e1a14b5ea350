//! Session configuration.
//!
//! Every tunable the dispatcher and the grid consult lives here so a session
//! can be pinned down completely (grid size, seed, tie-break policies) from a
//! single JSON document.

use serde::{Deserialize, Serialize};

use crate::error::{AetherError, AetherResult};

/// How the triad engine treats inputs shorter than three values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriadPolicy {
    /// Zero-pad to three values.
    #[default]
    Pad,
    /// Reject with [`AetherError::InsufficientArguments`].
    Strict,
}

/// Tie-break used when more than one verb root is a prefix of the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbMatch {
    /// The longest matching root wins, independent of declaration order.
    #[default]
    Longest,
    /// The first root in declaration order wins.
    FirstDeclared,
}

/// Runtime configuration for a [`Contextus`](crate::contextus::Contextus) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    /// Side length of every new FluxCore grid.
    /// Default: 10.
    pub grid_size: usize,

    /// Seed for the session RNG. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Short-input policy for the triad engine.
    pub triad_policy: TriadPolicy,

    /// Verb-root prefix tie-break.
    pub verb_match: VerbMatch,

    /// Add the current magnetism to every smoothed cell during converge.
    /// Default: true.
    pub converge_bias: bool,

    /// Maximum follow-up perturbations drained per mutation while an
    /// entropic cascade is active.
    /// Default: 32.
    pub cascade_limit: usize,

    /// Name of the root entity that redemption folds into.
    /// Default: "GENESIS".
    pub genesis_name: String,

    /// Regulator sleep range in milliseconds, `[min, max]`.
    /// Default: [800, 1200].
    pub regulator_interval_ms: [u64; 2],

    /// Largest locker count `TOGGEO` accepts.
    /// Default: 1_000_000.
    pub max_lockers: usize,
}

impl Default for AetherConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            seed: None,
            triad_policy: TriadPolicy::Pad,
            verb_match: VerbMatch::Longest,
            converge_bias: true,
            cascade_limit: 32,
            genesis_name: "GENESIS".to_string(),
            regulator_interval_ms: [800, 1200],
            max_lockers: 1_000_000,
        }
    }
}

impl AetherConfig {
    /// Default configuration with a pinned seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> AetherResult<()> {
        if self.grid_size < 3 {
            return Err(AetherError::Config(format!(
                "grid_size must be >= 3, got {}",
                self.grid_size
            )));
        }
        if self.genesis_name.trim().is_empty() {
            return Err(AetherError::Config(
                "genesis_name must not be empty".to_string(),
            ));
        }
        if self.genesis_name != self.genesis_name.to_uppercase() {
            return Err(AetherError::Config(format!(
                "genesis_name must be uppercase, got {}",
                self.genesis_name
            )));
        }
        let [lo, hi] = self.regulator_interval_ms;
        if lo == 0 || lo > hi {
            return Err(AetherError::Config(format!(
                "regulator_interval_ms must satisfy 0 < min <= max, got [{lo}, {hi}]"
            )));
        }
        if self.max_lockers == 0 {
            return Err(AetherError::Config(
                "max_lockers must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> AetherResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AetherError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
