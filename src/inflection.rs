//! Inflection suffixes and the modifier table.
//!
//! ```text
//! suffix   mood                  modifier
//! ──────   ───────────────────   ─────────────────────────────
//! O        present active         1.0   (also the default)
//! E        present passive       -1.0
//! ABAM     future active          1.5
//! EBAM     past passive          -0.5
//! AM       subjunctive            U[0.5, 1.5), drawn once per session
//! other    -                      1.0
//! ```

use core::fmt;

use rand::Rng;

/// Closed set of recognised suffixes, longest first so that suffix lookups
/// never mistake `ABAM` for `AM`.
pub const KNOWN_SUFFIXES: [&str; 5] = ["ABAM", "EBAM", "AM", "O", "E"];

/// Grammatical inflection carried by a verb token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Inflection {
    /// Present active. Default when a token is a bare verb root.
    #[default]
    O,
    /// Present passive.
    E,
    /// Future active.
    Abam,
    /// Past passive.
    Ebam,
    /// Subjunctive.
    Am,
    /// Any suffix outside the closed set. Carries modifier 1.0.
    Other(String),
}

impl Inflection {
    /// Classify a suffix. An empty suffix is the present active default.
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "" | "O" => Self::O,
            "E" => Self::E,
            "ABAM" => Self::Abam,
            "EBAM" => Self::Ebam,
            "AM" => Self::Am,
            other => Self::Other(other.to_string()),
        }
    }

    /// The suffix as written in a command token.
    pub fn suffix(&self) -> &str {
        match self {
            Self::O => "O",
            Self::E => "E",
            Self::Abam => "ABAM",
            Self::Ebam => "EBAM",
            Self::Am => "AM",
            Self::Other(s) => s,
        }
    }

    /// `true` for the five recognised suffixes.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Inflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Static inflection → modifier mapping.
///
/// The subjunctive modifier is rolled once at construction from the session
/// RNG and then held for the lifetime of the table, so it is random per run
/// but reproducible under a fixed seed.
#[derive(Clone, Debug, PartialEq)]
pub struct InflectionTable {
    subjunctive: f64,
}

impl InflectionTable {
    /// Build the table, drawing the subjunctive modifier from `rng`.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            subjunctive: rng.gen_range(0.5..1.5),
        }
    }

    /// Build the table with an explicit subjunctive modifier.
    pub fn with_subjunctive(subjunctive: f64) -> Self {
        Self { subjunctive }
    }

    /// Numeric modifier for an inflection. Unknown suffixes map to 1.0.
    pub fn modifier_for(&self, inflection: &Inflection) -> f64 {
        match inflection {
            Inflection::O => 1.0,
            Inflection::E => -1.0,
            Inflection::Abam => 1.5,
            Inflection::Ebam => -0.5,
            Inflection::Am => self.subjunctive,
            Inflection::Other(_) => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fixed_modifiers() {
        let table = InflectionTable::with_subjunctive(0.75);
        assert_eq!(table.modifier_for(&Inflection::O), 1.0);
        assert_eq!(table.modifier_for(&Inflection::E), -1.0);
        assert_eq!(table.modifier_for(&Inflection::Abam), 1.5);
        assert_eq!(table.modifier_for(&Inflection::Ebam), -0.5);
        assert_eq!(table.modifier_for(&Inflection::Am), 0.75);
    }

    #[test]
    fn test_unknown_suffix_defaults_to_one() {
        let table = InflectionTable::with_subjunctive(1.2);
        let inflection = Inflection::from_suffix("XYZ");
        assert!(!inflection.is_known());
        assert_eq!(table.modifier_for(&inflection), 1.0);
    }

    #[test]
    fn test_subjunctive_drawn_in_range_and_fixed() {
        let mut rng = StdRng::seed_from_u64(42);
        let table = InflectionTable::new(&mut rng);
        let first = table.modifier_for(&Inflection::Am);
        assert!((0.5..1.5).contains(&first), "am={first}");
        for _ in 0..10 {
            assert_eq!(table.modifier_for(&Inflection::Am), first);
        }
    }

    #[test]
    fn test_subjunctive_reproducible_under_seed() {
        let a = InflectionTable::new(&mut StdRng::seed_from_u64(9));
        let b = InflectionTable::new(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_suffix_round_trip() {
        for s in KNOWN_SUFFIXES {
            assert_eq!(Inflection::from_suffix(s).suffix(), s);
        }
        assert_eq!(Inflection::from_suffix(""), Inflection::O);
    }
}
