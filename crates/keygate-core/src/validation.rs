//! Local key checks, the rejection taxonomy, and the full validation pipeline.
//!
//! The pipeline runs in a fixed order: blank input, provider prefix, minimum
//! length, then (optionally) a live probe against the provider. The first
//! three steps never touch the network.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::verifier::{GeminiVerifier, VerificationOutcome};

/// Prefix every Gemini API key starts with.
pub const DEFAULT_KEY_PREFIX: &str = "AIza";

/// Minimum accepted key length, counted on the trimmed input.
pub const DEFAULT_MIN_KEY_LENGTH: usize = 30;

/// Why a candidate key was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace was entered.
    EmptyInput,
    /// The key does not start with the provider prefix.
    BadFormat,
    /// The key is shorter than the configured minimum.
    TooShort,
    /// The provider answered 400 or 403 for this key.
    RemoteRejected,
    /// The provider could not be reached and the policy is fail-closed.
    Unverified,
}

impl RejectReason {
    /// Whether this rejection was decided without a network round trip.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            RejectReason::EmptyInput | RejectReason::BadFormat | RejectReason::TooShort
        )
    }
}

/// Outcome of one confirm attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The trimmed key, ready to hand to the confirm callback.
    Accepted(String),
    Rejected(RejectReason),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }
}

/// Shape rules applied before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRules {
    pub prefix: String,
    pub min_length: usize,
}

impl KeyRules {
    pub fn new(prefix: impl Into<String>, min_length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            min_length,
        }
    }

    /// Run the local checks and return the trimmed candidate on success.
    pub fn precheck<'a>(&self, input: &'a str) -> Result<&'a str, RejectReason> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RejectReason::EmptyInput);
        }
        if !trimmed.starts_with(self.prefix.as_str()) {
            return Err(RejectReason::BadFormat);
        }
        if trimmed.chars().count() < self.min_length {
            return Err(RejectReason::TooShort);
        }
        Ok(trimmed)
    }
}

impl Default for KeyRules {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX, DEFAULT_MIN_KEY_LENGTH)
    }
}

/// What to do when the provider neither confirms nor rejects a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Accept the key; connectivity trouble should not block the user.
    #[default]
    FailOpen,
    /// Refuse the key until the provider gives a definite answer.
    FailClosed,
}

impl AmbiguityPolicy {
    /// Turn a probe outcome for `key` into the final verdict.
    pub fn resolve(self, key: String, outcome: &VerificationOutcome) -> ValidationResult {
        match outcome {
            VerificationOutcome::Valid => ValidationResult::Accepted(key),
            VerificationOutcome::Invalid { .. } => {
                ValidationResult::Rejected(RejectReason::RemoteRejected)
            }
            VerificationOutcome::Unsendable => ValidationResult::Rejected(RejectReason::BadFormat),
            VerificationOutcome::Ambiguous(cause) => match self {
                AmbiguityPolicy::FailOpen => {
                    warn!(%cause, "API key could not be verified; accepting it (fail-open)");
                    ValidationResult::Accepted(key)
                }
                AmbiguityPolicy::FailClosed => {
                    warn!(%cause, "API key could not be verified; rejecting it (fail-closed)");
                    ValidationResult::Rejected(RejectReason::Unverified)
                }
            },
        }
    }
}

/// Run every pipeline step for `input`.
///
/// Passing `None` as the verifier skips the live probe, so a key that passes
/// the local checks is accepted as-is.
pub async fn validate_key(
    input: &str,
    rules: &KeyRules,
    verifier: Option<&GeminiVerifier>,
    policy: AmbiguityPolicy,
) -> ValidationResult {
    let candidate = match rules.precheck(input) {
        Ok(candidate) => candidate.to_string(),
        Err(reason) => {
            debug!(?reason, "API key rejected by local checks");
            return ValidationResult::Rejected(reason);
        }
    };

    match verifier {
        Some(verifier) => {
            let outcome = verifier.verify(&candidate).await;
            policy.resolve(candidate, &outcome)
        }
        None => ValidationResult::Accepted(candidate),
    }
}
