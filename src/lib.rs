//! # aether-core
//!
//! AetherLang: a Latin-flavoured command language driving a small grid-field
//! simulation. Every named entity (a *materia*) is a square flux grid with an
//! energy, a memory of recent perturbations, an identity wave, and six derived
//! properties (the *sextet*) recomputed after each mutation.
//!
//! ---
//!
//! ## The command
//!
//! ```text
//! PERTURBOABAM 10 20 30
//! └──────┘└──┘ └──────┘
//!   verb  mood  numerics → triads → perturbations
//! ```
//!
//! The verb picks the handler. The mood suffix picks a numeric modifier
//! (`O` 1.0, `E` −1.0, `ABAM` 1.5, `EBAM` −0.5, `AM` drawn once per session).
//! Quoted literals name materiae or become text amplitudes.
//!
//! ## The pipeline
//!
//! ```text
//! text → parser → Command → Contextus → FluxCore → Sextet → Outcome
//!                    ↑          ↑          ↑
//!             InflectionTable  Oracle    triad
//!                            SextetSensor
//!                               ↓
//!                           Regulator  (background upkeep)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`parser`] | [`Verb`], [`Command`] | Raw text → verb, inflection, literals, numerics |
//! | [`inflection`] | [`Inflection`], [`InflectionTable`] | Mood suffix → numeric modifier |
//! | [`triad`] | [`triad()`], [`triads`], [`chunk`] | Thesis–antithesis–synthesis reduction, text amplitudes |
//! | [`lockers`] | [`lockers()`] | Locker toggle reference computation |
//! | [`sextet`] | [`Sextet`], [`Architecture`] | Derived properties and Intellectus profiles |
//! | [`flux`] | [`FluxCore`], [`MateriaReport`] | The grid, its transitions, composition, grounding |
//! | [`contextus`] | [`Contextus`] | Registry, focus, session RNG, verb dispatch |
//! | [`outcome`] | [`Outcome`] | Structured command results and their replies |
//! | [`oracle`] | [`Oracle`], [`ScriptedOracle`] | Prompt-in, text-out collaborator |
//! | [`sensor`] | [`SextetSensor`], [`MockFerrocell`] | Sextet and grid readings |
//! | [`regulator`] | [`Regulator`], [`SharedContextus`] | Background regulation passes |
//! | [`config`] | [`AetherConfig`] | Session configuration |
//! | [`error`] | [`AetherError`] | Error hierarchy |
//!
//! ## Determinism
//!
//! All randomness flows from one seeded `StdRng` owned by the session. Pin
//! [`AetherConfig::seed`] and the same command sequence reproduces the same
//! grid, energy, and replies.
//!
//! ```
//! use aether_core::{AetherConfig, Contextus, Outcome};
//!
//! let mut ctx = Contextus::new(AetherConfig::seeded(7)).unwrap();
//! ctx.execute("CREO 'LUX'").unwrap();
//! let out = ctx.execute("PERTURBOO 10 20 30").unwrap();
//! assert!(matches!(out, Outcome::Coherent { .. }));
//! ```
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod contextus;
pub mod error;
pub mod flux;
pub mod inflection;
pub mod lockers;
pub mod oracle;
pub mod outcome;
pub mod parser;
pub mod regulator;
pub mod sensor;
pub mod sextet;
pub mod triad;

pub use config::{AetherConfig, TriadPolicy, VerbMatch};
pub use contextus::Contextus;
pub use error::{AetherError, AetherResult};
pub use flux::{Annotation, Anomaly, FluxCore, MateriaReport};
pub use inflection::{Inflection, InflectionTable};
pub use lockers::lockers;
pub use oracle::{OfflineOracle, Oracle, OracleError, ScriptedOracle};
pub use outcome::{Outcome, Role};
pub use parser::{parse, Command, Verb};
pub use regulator::{Regulator, RegulatorHandle, SharedContextus};
pub use sensor::{MockFerrocell, SextetSensor};
pub use sextet::{Architecture, Sextet};
pub use triad::{chunk, text_to_amp, triad, triads};
