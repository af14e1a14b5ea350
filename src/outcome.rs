//! Structured command results.
//!
//! Every recoverable result of a command is an [`Outcome`] variant carrying
//! its payload. `Display` renders the REPL reply; callers that need the data
//! match on the variant instead of parsing text.

use core::fmt;

use crate::flux::MateriaReport;
use crate::parser::Verb;
use crate::sextet::Architecture;

/// Which side of a two-party command a missing name played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The acted-upon materia.
    Materia,
    /// The source of a split, transfer, or lesson.
    Source,
    /// The receiver of a lesson.
    Target,
}

impl Role {
    fn word(self) -> &'static str {
        match self {
            Role::Materia => "MATERIA",
            Role::Source => "FONS",
            Role::Target => "SCOPUS",
        }
    }
}

/// Result of one successfully dispatched command.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// `CREO`: a plain materia was created and focused.
    Created {
        /// New materia name.
        name: String,
    },
    /// `INSTAURO`: an Intellectus was created and focused.
    Instantiated {
        /// New materia name.
        name: String,
        /// Its architecture.
        architecture: Architecture,
    },
    /// A create was refused because the name is taken.
    AlreadyExists {
        /// The taken name.
        name: String,
    },
    /// `FOCUS`: focus moved.
    Focused {
        /// New focus.
        name: String,
    },
    /// A named materia is absent from the registry.
    NotFound {
        /// Role the name played in the command.
        role: Role,
        /// The missing name.
        name: String,
    },
    /// A required literal or keyword argument is absent.
    MissingArgument {
        /// Verb that needed it.
        verb: Verb,
        /// What was expected, as shown to the user.
        expected: &'static str,
    },
    /// `OSTENDO`: a materia's state.
    Report(MateriaReport),
    /// `PERTURBO`/`CONVERGO`: the focused materia after the transition.
    Coherent {
        /// Verb token as typed, e.g. `PERTURBOABAM`.
        token: String,
        /// Energy after the command.
        energy: f64,
        /// Identity wave after the command.
        identity: f64,
    },
    /// `ANOMALIA`: anomaly set on the focus.
    AnomalyInduced {
        /// Anomaly name.
        name: String,
    },
    /// `VERITAS` with fewer than two materiae.
    TruthNeedsPlurality,
    /// `VERITAS`: the average was folded into genesis.
    TruthSynthesized,
    /// `MIRACULUM`: identity after the miracle.
    Miracle {
        /// Identity wave of the focus.
        identity: f64,
    },
    /// `REDIMO`: materiae folded into genesis.
    Redeemed {
        /// Names absorbed, in processing order.
        absorbed: Vec<String>,
        /// Genesis identity after the redemption.
        identity: f64,
    },
    /// `DIALECTICA`: source split in two.
    DialecticComplete {
        /// Removed source.
        source: String,
        /// First half, grid `+g/2`. Becomes the focus.
        thesis: String,
        /// Second half, grid `−g/2`.
        antithesis: String,
    },
    /// `DIALECTICA` on a plain materia.
    DialecticNeedsIntellectus,
    /// `INSTAURO` with an unrecognised `MODO`.
    UnknownArchitecture {
        /// Name as given.
        name: String,
    },
    /// `INTERROGO`: the oracle reply was folded into the materia.
    OracleAnswered {
        /// Queried materia.
        name: String,
        /// Reply text, or the oracle error text.
        reply: String,
    },
    /// `DOCEO`/`DISCERE`: annotations transferred.
    WisdomIntegrated {
        /// Materia the annotations came from.
        source: String,
        /// Materia that received them.
        target: String,
    },
    /// `EXERCEO` without a `FLUMINE` path.
    StreamRequired,
    /// `EXERCEO` could not open or read the stream.
    StreamUnreadable {
        /// Path as given.
        path: String,
        /// I/O error text.
        reason: String,
    },
    /// `EXERCEO`: training finished.
    Trained {
        /// Trained materia.
        name: String,
        /// Number of 256-byte chunks consumed.
        chunks: usize,
    },
    /// `TOGGEO`: locker result.
    Lockers {
        /// Verb token as typed.
        token: String,
        /// Number of open lockers.
        open: usize,
        /// Open positions, ascending.
        positions: Vec<usize>,
    },
    /// `TOGGEO n` above the configured limit.
    TooManyLockers {
        /// Requested count.
        requested: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// The verb token matched no root.
    UnknownVerb {
        /// Token as typed, uppercased.
        token: String,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { name } => write!(f, "CREO MATERIAM '{name}'."),
            Outcome::Instantiated { name, architecture } => {
                write!(f, "INSTAURO INTELLECTUM '{name}' MODO '{architecture}'.")
            }
            Outcome::AlreadyExists { name } => write!(f, "'{name}' IAM EXISTIT"),
            Outcome::Focused { name } => write!(f, "FOCUS NUNC IN '{name}'."),
            Outcome::NotFound { role, name } => write!(f, "{} '{name}' NON EXISTIT", role.word()),
            Outcome::MissingArgument { verb, expected } => write!(f, "{verb} REQUIRET {expected}"),
            Outcome::Report(report) => write!(f, "{report}"),
            Outcome::Coherent {
                token,
                energy,
                identity,
            } => write!(
                f,
                "{token} FLUXUM COHERENTEM {energy:.2} IDENTITATEM {identity:.2}"
            ),
            Outcome::AnomalyInduced { name } => write!(f, "ANOMALIA '{name}' INDUCTA EST."),
            Outcome::TruthNeedsPlurality => f.write_str("VERITAS REQUIRET PLURITAS"),
            Outcome::TruthSynthesized => {
                f.write_str("VERITAS UNIVERSALIS IN GENESIM SYNTHESITA EST.")
            }
            Outcome::Miracle { identity } => {
                write!(f, "MIRACULUM! FLUXUS DIVINUS. IDENTITAS NUNC {identity:.2}")
            }
            Outcome::Redeemed { identity, .. } => {
                write!(f, "REDEMPTIO PLENUM. IDENTITAS GENESIS NUNC {identity:.2}.")
            }
            Outcome::DialecticComplete {
                source,
                thesis,
                antithesis,
            } => write!(
                f,
                "DIALECTICA PERFECTA. '{source}' NUNC EST '{thesis}' ET '{antithesis}'."
            ),
            Outcome::DialecticNeedsIntellectus => f.write_str("DIALECTICA REQUIRET INTELLECTUM"),
            Outcome::UnknownArchitecture { name } => write!(f, "ARCHITECTURA '{name}' IGNOTA"),
            Outcome::OracleAnswered { name, .. } => {
                write!(f, "ORACULUM RESPONDIT. FLUXUM '{name}' SYNTHESITUR.")
            }
            Outcome::WisdomIntegrated { source, target } => {
                write!(f, "SAPIENTIA EX '{source}' IN '{target}' INTEGRATA EST.")
            }
            Outcome::StreamRequired => f.write_str("FLUMINE DATA REQUIRETUR"),
            Outcome::StreamUnreadable { path, reason } => {
                write!(f, "FLUMEN '{path}' LEGI NON POTEST: {reason}")
            }
            Outcome::Trained { name, chunks } => {
                write!(f, "EXERCEO PERFECTUM PRO '{name}'. {chunks} FRUSTA.")
            }
            Outcome::Lockers { token, open, .. } => write!(f, "{token} {open} APERTOS"),
            Outcome::TooManyLockers { requested, limit } => {
                write!(f, "TOGGEO NIMIS: {requested} > {limit}")
            }
            Outcome::UnknownVerb { token } => write!(f, "VERBUM IGNORATUM '{token}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_strings() {
        let cases = [
            (
                Outcome::Created {
                    name: "LUX".into(),
                },
                "CREO MATERIAM 'LUX'.",
            ),
            (
                Outcome::NotFound {
                    role: Role::Source,
                    name: "NOX".into(),
                },
                "FONS 'NOX' NON EXISTIT",
            ),
            (
                Outcome::MissingArgument {
                    verb: Verb::Doceo,
                    expected: "FONTEM CUM 'CUM'",
                },
                "DOCEO REQUIRET FONTEM CUM 'CUM'",
            ),
            (
                Outcome::Coherent {
                    token: "PERTURBOO".into(),
                    energy: 1.234,
                    identity: 0.5,
                },
                "PERTURBOO FLUXUM COHERENTEM 1.23 IDENTITATEM 0.50",
            ),
            (
                Outcome::Lockers {
                    token: "TOGGEOO".into(),
                    open: 10,
                    positions: vec![],
                },
                "TOGGEOO 10 APERTOS",
            ),
            (
                Outcome::UnknownVerb {
                    token: "DELEO".into(),
                },
                "VERBUM IGNORATUM 'DELEO'",
            ),
        ];
        for (outcome, expected) in cases {
            assert_eq!(outcome.to_string(), expected);
        }
    }

    #[test]
    fn test_instantiated_names_architecture() {
        let o = Outcome::Instantiated {
            name: "ADAM".into(),
            architecture: Architecture::Object,
        };
        assert_eq!(o.to_string(), "INSTAURO INTELLECTUM 'ADAM' MODO 'OBJECT'.");
    }
}
