//! Error hierarchy for the AetherLang core.
//!
//! Almost every domain failure (missing entity, missing literal, unknown verb)
//! is reported to the user as an [`Outcome`](crate::outcome::Outcome) so the
//! REPL keeps running. The variants here are the failures that abort a single
//! command: malformed input, bounds violations, and the self-referential
//! truth guard.

use thiserror::Error;

/// Root error type for all AetherLang failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AetherError {
    /// The command string was empty or whitespace only.
    #[error("PRAECEPTUM INANE EST")]
    EmptyCommand,

    /// The command string does not start with a verb token.
    #[error("FORMATUM INVALIDUM: {0}")]
    MalformedCommand(String),

    /// The leading token matches no known verb root.
    #[error("VERBUM IGNORATUM '{0}'")]
    UnknownVerb(String),

    /// The triad engine received fewer values than it needs (strict policy).
    #[error("TRIAD REQUIRET {needed} ARGUMENTA, {got} DATA")]
    InsufficientArguments {
        /// Values required.
        needed: usize,
        /// Values supplied.
        got: usize,
    },

    /// A grid write or ground-truth update addressed a cell outside the grid.
    #[error("INDEX ({x}, {y}) EXTRA GRIDUM {size}x{size}")]
    IndexOutOfRange {
        /// Row index requested.
        x: usize,
        /// Column index requested.
        y: usize,
        /// Side length of the grid.
        size: usize,
    },

    /// Truth was predicated of itself. Always fatal to the command.
    #[error("VERITAS DE SE IPSA PRAEDICARI NON POTEST")]
    SelfReferentialTruth,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type AetherResult<T> = Result<T, AetherError>;
