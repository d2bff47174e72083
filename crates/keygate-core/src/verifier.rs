//! Best-effort live check of a Gemini API key.
//!
//! The probe lists models with the candidate key. Only 400/403 count as a
//! definite rejection; every other status and every transport failure is
//! reported as ambiguous and left to the caller's [`AmbiguityPolicy`].
//!
//! [`AmbiguityPolicy`]: crate::validation::AmbiguityPolicy

use std::fmt;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const MODELS_PATH: &str = "/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Where the candidate key travels in the probe request.
///
/// `Query` matches the provider's documented `?key=` form but exposes the key
/// to anything that logs URLs along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialPlacement {
    #[default]
    Query,
    Header,
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    Invalid { status: u16 },
    Ambiguous(AmbiguousCause),
    /// The key cannot be carried by the configured placement; nothing was sent.
    Unsendable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbiguousCause {
    UnexpectedStatus(u16),
    Transport(String),
}

impl fmt::Display for AmbiguousCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmbiguousCause::UnexpectedStatus(status) => {
                write!(f, "unexpected HTTP status {status}")
            }
            AmbiguousCause::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid API base URL '{0}': expected http:// or https://")]
    BaseUrl(String),
}

/// Map a provider status code onto a probe outcome.
pub fn classify_status(status: u16) -> VerificationOutcome {
    match status {
        200..=299 => VerificationOutcome::Valid,
        400 | 403 => VerificationOutcome::Invalid { status },
        other => VerificationOutcome::Ambiguous(AmbiguousCause::UnexpectedStatus(other)),
    }
}

/// Connection settings for [`GeminiVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    pub api_base: String,
    pub placement: CredentialPlacement,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            placement: CredentialPlacement::default(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiVerifier {
    client: reqwest::Client,
    endpoint: String,
    placement: CredentialPlacement,
}

impl GeminiVerifier {
    pub fn new(settings: &VerifierSettings) -> Result<Self, VerifierError> {
        let base = settings.api_base.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(VerifierError::BaseUrl(settings.api_base.clone()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{base}{MODELS_PATH}"),
            placement: settings.placement,
        })
    }

    /// The model listing endpoint, without credentials.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full probe URL for `key` under the configured placement.
    pub fn request_url(&self, key: &str) -> String {
        match self.placement {
            CredentialPlacement::Query => {
                format!("{}?key={}", self.endpoint, urlencoding::encode(key))
            }
            CredentialPlacement::Header => self.endpoint.clone(),
        }
    }

    /// Issue one probe request for `key`.
    pub async fn verify(&self, key: &str) -> VerificationOutcome {
        let mut request = self
            .client
            .get(self.request_url(key))
            .header(CONTENT_TYPE, "application/json");
        if self.placement == CredentialPlacement::Header {
            match HeaderValue::from_str(key) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request = request.header(API_KEY_HEADER, value);
                }
                Err(_) => {
                    warn!(
                        endpoint = %self.endpoint,
                        "API key contains characters that cannot be sent in a header"
                    );
                    return VerificationOutcome::Unsendable;
                }
            }
        }

        debug!(endpoint = %self.endpoint, placement = ?self.placement, "Probing API key");

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                // reqwest includes the URL (and therefore a query key) in its message.
                let err = err.without_url();
                let cause = AmbiguousCause::Transport(err.to_string());
                warn!(%cause, endpoint = %self.endpoint, "Could not validate API key");
                return VerificationOutcome::Ambiguous(cause);
            }
        };

        let status = response.status().as_u16();
        let outcome = classify_status(status);
        match &outcome {
            VerificationOutcome::Valid => info!(status, "API key verified by provider"),
            VerificationOutcome::Invalid { .. } => {
                let detail = response
                    .text()
                    .await
                    .ok()
                    .and_then(|body| provider_error_message(&body));
                info!(
                    status,
                    detail = detail.as_deref().unwrap_or("-"),
                    "Provider rejected API key"
                );
            }
            VerificationOutcome::Ambiguous(cause) => {
                warn!(%cause, endpoint = %self.endpoint, "Could not validate API key");
            }
            VerificationOutcome::Unsendable => {}
        }
        outcome
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Pull the human-readable reason out of a Google API error body.
fn provider_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match (envelope.error.status, envelope.error.message) {
        (Some(status), Some(message)) => Some(format!("{status}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(status), None) => Some(status),
        (None, None) => None,
    }
}

/// Shorten a key for display: prefix, ellipsis, last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
