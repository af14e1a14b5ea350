//! Text oracle collaborator.
//!
//! The dispatcher only needs prompt-in, text-out, can-fail. Transport is the
//! implementor's business; the crate ships an offline oracle (always fails)
//! and a scripted oracle (replays queued replies).

use std::collections::VecDeque;

use thiserror::Error;

/// Model used when `INTERROGO` names none.
pub const DEFAULT_MODEL: &str = "google-gemini-1.5-flash";

/// Oracle failure. Rendered into the reply text, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No transport is configured for the requested model.
    #[error("model '{0}' configuration could not be loaded")]
    Unconfigured(String),
    /// The scripted oracle ran out of replies.
    #[error("no reply queued")]
    Exhausted,
    /// The transport failed.
    #[error("{0}")]
    Transport(String),
}

/// Prompt-in, text-out collaborator.
pub trait Oracle: Send {
    /// Ask `model` about `prompt`.
    fn query(&mut self, model: &str, prompt: &str) -> Result<String, OracleError>;
}

/// Oracle with no transport. Every query fails with [`OracleError::Unconfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineOracle;

impl Oracle for OfflineOracle {
    fn query(&mut self, model: &str, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Unconfigured(model.to_string()))
    }
}

/// Oracle that replays queued replies in order and records every prompt.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOracle {
    replies: VecDeque<String>,
    prompts: Vec<(String, String)>,
}

impl ScriptedOracle {
    /// Queue the given replies.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// `(model, prompt)` pairs received so far.
    pub fn prompts(&self) -> &[(String, String)] {
        &self.prompts
    }
}

impl Oracle for ScriptedOracle {
    fn query(&mut self, model: &str, prompt: &str) -> Result<String, OracleError> {
        self.prompts.push((model.to_string(), prompt.to_string()));
        self.replies.pop_front().ok_or(OracleError::Exhausted)
    }
}
