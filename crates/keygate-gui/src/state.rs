//! Application state management for keygate GUI

use keygate_core::{
    AmbiguityPolicy, FileConfig, GeminiVerifier, KeyDialog, VerifierError,
};

/// Main application state (domain/persistent)
pub struct AppState {
    /// Configuration from keygate-core
    pub config: FileConfig,

    /// Dialog controller; survives open/close cycles, sessions do not
    pub dialog: KeyDialog,

    /// Probe client, absent when remote checks are disabled
    pub verifier: Option<GeminiVerifier>,

    /// Warnings gathered while loading, shown in the technical log at start-up
    pub startup_warnings: Vec<String>,
}

impl AppState {
    pub fn new() -> Self {
        let load = keygate_core::load_config();
        Self::from_config(load.config, load.warnings)
    }

    pub fn from_config(config: FileConfig, mut warnings: Vec<String>) -> Self {
        let dialog = KeyDialog::new(config.key_rules(), config.ui.locale)
            .with_remote_check(config.validation.remote_check);

        let verifier = match build_verifier(&config) {
            Ok(verifier) => verifier,
            Err(err) => {
                warnings.push(format!("API key checks will be skipped: {err}"));
                None
            }
        };

        Self {
            config,
            dialog,
            verifier,
            startup_warnings: warnings,
        }
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.config.validation.ambiguity_policy
    }

    /// Save configuration to disk
    pub fn save_config(&self) -> Result<(), String> {
        keygate_core::save_config(&self.config).map_err(|e| e.to_string())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn build_verifier(config: &FileConfig) -> Result<Option<GeminiVerifier>, VerifierError> {
    if !config.validation.remote_check {
        return Ok(None);
    }
    GeminiVerifier::new(&config.verifier_settings()).map(Some)
}
