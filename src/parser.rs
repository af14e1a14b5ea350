//! Lexical parser: raw command text → [`Command`].
//!
//! A command is a verb token followed by free arguments:
//!
//! ```text
//! PERTURBOABAM 10 20 30 'LUX'
//! └──────┘└──┘ └──────┘ └───┘
//!  root  suffix numeric  literal
//! ```
//!
//! # Invariants
//!
//! - The verb token is ASCII letters only; everything after it is argument text.
//! - A bare root carries the present active inflection `O`.
//! - Literals are the `'…'` spans of the argument text, in order.
//! - Numerics are the whitespace tokens outside quotes that parse as signed decimals.
//! - Unknown roots are an error here; the dispatcher turns that error into a reply.

use core::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::VerbMatch;
use crate::error::{AetherError, AetherResult};
use crate::inflection::Inflection;

// ─── Verb ───────────────────────────────────────────────────────────────────

/// Known verb roots, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Perturb the focused materia.
    Perturbo,
    /// Converge (smooth) the focused materia.
    Convergo,
    /// Create a plain materia.
    Creo,
    /// Display a materia.
    Ostendo,
    /// Move the focus.
    Focus,
    /// Induce an anomaly on the focused materia.
    Anomalia,
    /// Synthesise the average of all materiae into genesis.
    Veritas,
    /// Perturb with suspended physics.
    Miraculum,
    /// Fold materiae back into genesis.
    Redimo,
    /// Query the oracle on behalf of a materia.
    Interrogo,
    /// Create an Intellectus with an architecture.
    Instauro,
    /// Train a materia on a byte stream.
    Exerceo,
    /// Split an Intellectus into two opposed halves.
    Dialectica,
    /// Teach one materia's annotations to another.
    Doceo,
    /// Learn another materia's annotations into the focus.
    Discere,
    /// Run the locker toggle reference.
    Toggeo,
}

impl Verb {
    /// Every verb, in declaration order.
    pub const ALL: [Verb; 16] = [
        Verb::Perturbo,
        Verb::Convergo,
        Verb::Creo,
        Verb::Ostendo,
        Verb::Focus,
        Verb::Anomalia,
        Verb::Veritas,
        Verb::Miraculum,
        Verb::Redimo,
        Verb::Interrogo,
        Verb::Instauro,
        Verb::Exerceo,
        Verb::Dialectica,
        Verb::Doceo,
        Verb::Discere,
        Verb::Toggeo,
    ];

    /// The root as written in commands.
    pub fn root(self) -> &'static str {
        match self {
            Verb::Perturbo => "PERTURBO",
            Verb::Convergo => "CONVERGO",
            Verb::Creo => "CREO",
            Verb::Ostendo => "OSTENDO",
            Verb::Focus => "FOCUS",
            Verb::Anomalia => "ANOMALIA",
            Verb::Veritas => "VERITAS",
            Verb::Miraculum => "MIRACULUM",
            Verb::Redimo => "REDIMO",
            Verb::Interrogo => "INTERROGO",
            Verb::Instauro => "INSTAURO",
            Verb::Exerceo => "EXERCEO",
            Verb::Dialectica => "DIALECTICA",
            Verb::Doceo => "DOCEO",
            Verb::Discere => "DISCERE",
            Verb::Toggeo => "TOGGEO",
        }
    }

    /// Resolve a verb token to a root and the remaining suffix.
    ///
    /// Returns `None` when no root is a prefix of `token`.
    pub fn resolve(token: &str, policy: VerbMatch) -> Option<(Verb, &str)> {
        let mut candidates = Verb::ALL
            .iter()
            .copied()
            .filter(|v| token.starts_with(v.root()));
        let verb = match policy {
            VerbMatch::FirstDeclared => candidates.next(),
            VerbMatch::Longest => candidates.max_by_key(|v| v.root().len()),
        }?;
        Some((verb, &token[verb.root().len()..]))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root())
    }
}

// ─── Command ────────────────────────────────────────────────────────────────

/// A parsed command. Ephemeral: produced by [`parse`], consumed by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Resolved verb root.
    pub verb: Verb,
    /// Inflection suffix (present active when absent).
    pub inflection: Inflection,
    /// Quoted literals, uppercased, in order of appearance.
    pub literal_args: Vec<String>,
    /// Signed decimal tokens outside quotes, in order of appearance.
    pub numeric_args: Vec<f64>,
    /// Argument text exactly as typed (original case).
    pub remainder: String,
}

impl Command {
    /// The verb token echoed in replies, e.g. `PERTURBOABAM`.
    pub fn token(&self) -> String {
        format!("{}{}", self.verb, self.inflection)
    }

    /// First literal argument, if any.
    pub fn first_literal(&self) -> Option<&str> {
        self.literal_args.first().map(String::as_str)
    }

    /// Value of a `KEYWORD 'value'` pair in the uppercased arguments.
    pub fn keyword_literal(&self, keyword: &str) -> Option<String> {
        keyword_capture(&self.remainder.to_uppercase(), keyword, false)
            .map(|v| v.to_uppercase())
    }

    /// Value of a `KEYWORD 'value'` pair with the value's case preserved.
    ///
    /// The keyword itself is matched case-insensitively.
    pub fn raw_keyword_literal(&self, keyword: &str) -> Option<String> {
        keyword_capture(&self.remainder, keyword, true)
    }
}

fn keyword_capture(text: &str, keyword: &str, case_insensitive: bool) -> Option<String> {
    let flags = if case_insensitive { "(?i)" } else { "" };
    let pattern = format!(r"{flags}\b{}\s+'([^']*)'", regex::escape(keyword));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// ─── Parsing ────────────────────────────────────────────────────────────────

fn head_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^([A-Za-z]+)\s*(.*)$").expect("static regex"))
}

fn quoted_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([^']*)'").expect("static regex"))
}

fn numeric_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("static regex"))
}

/// Fold typographic quotes to the ASCII apostrophe.
fn normalize_quotes(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{201C}' | '\u{201D}' => '\'',
            other => other,
        })
        .collect()
}

/// Parse a raw command string.
///
/// Errors:
/// - [`AetherError::EmptyCommand`] for empty or whitespace-only input.
/// - [`AetherError::MalformedCommand`] when the text does not open with a verb token.
/// - [`AetherError::UnknownVerb`] when no known root prefixes the token.
pub fn parse(raw: &str, policy: VerbMatch) -> AetherResult<Command> {
    let normalized = normalize_quotes(raw);
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(AetherError::EmptyCommand);
    }

    let caps = head_pattern()
        .captures(trimmed)
        .ok_or_else(|| AetherError::MalformedCommand(trimmed.to_string()))?;
    let token = caps.get(1).map_or("", |m| m.as_str()).to_ascii_uppercase();
    let remainder = caps.get(2).map_or("", |m| m.as_str()).to_string();

    let (verb, suffix) =
        Verb::resolve(&token, policy).ok_or_else(|| AetherError::UnknownVerb(token.clone()))?;
    let inflection = Inflection::from_suffix(suffix);

    let upper = remainder.to_uppercase();
    let literal_args: Vec<String> = quoted_pattern()
        .captures_iter(&upper)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();

    let unquoted = quoted_pattern().replace_all(&upper, " ");
    let numeric_args: Vec<f64> = unquoted
        .split_whitespace()
        .filter(|t| numeric_pattern().is_match(t))
        .filter_map(|t| t.parse::<f64>().ok())
        .collect();

    log::debug!(
        "parsed {verb}{inflection}: literals={literal_args:?} numerics={numeric_args:?}"
    );

    Ok(Command {
        verb,
        inflection,
        literal_args,
        numeric_args,
        remainder,
    })
}
