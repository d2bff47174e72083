//! Core library for keygate: the API key dialog controller, the key
//! validation pipeline, the provider probe, configuration and logging.

pub mod config;
pub mod dialog;
pub mod logging;
pub mod messages;
pub mod validation;
pub mod verifier;

pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, ProviderPreferences,
    ThemePreference, UiPreferences, ValidationPreferences, config_directory, config_path,
    load_config, load_config_from, save_config, save_config_to,
};
pub use dialog::{ConfirmStep, DialogProps, DialogSession, DialogState, KeyDialog, VerifyTicket};
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use messages::Locale;
pub use validation::{AmbiguityPolicy, KeyRules, RejectReason, ValidationResult, validate_key};
pub use verifier::{
    AmbiguousCause, CredentialPlacement, GeminiVerifier, VerificationOutcome, VerifierError,
    VerifierSettings,
};
