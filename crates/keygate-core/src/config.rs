use crate::messages::Locale;
use crate::validation::{
    AmbiguityPolicy, DEFAULT_KEY_PREFIX, DEFAULT_MIN_KEY_LENGTH, KeyRules,
};
use crate::verifier::{CredentialPlacement, DEFAULT_API_BASE, VerifierSettings, mask_key};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_NAME: &str = "keygate";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_HELP_URL: &str = "https://makersuite.google.com/app/apikey";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    /// Last accepted key. Stored as plain text; the file is owner-only on unix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub provider: ProviderPreferences,
    #[serde(default)]
    pub validation: ValidationPreferences,
    #[serde(default)]
    pub ui: UiPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            api_key: None,
            provider: ProviderPreferences::default(),
            validation: ValidationPreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn key_rules(&self) -> KeyRules {
        KeyRules::new(self.provider.key_prefix.clone(), self.provider.min_key_length)
    }

    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            api_base: self.provider.api_base.clone(),
            placement: self.provider.credential_placement,
            timeout: self.provider.probe_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            self.clear_api_key();
        } else {
            self.api_key = Some(trimmed.to_string());
        }
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// The saved key shortened for display, never the full value.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_key)
    }
}

/// Provider endpoint and key shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPreferences {
    #[serde(default = "ProviderPreferences::default_api_base")]
    pub api_base: String,
    #[serde(default = "ProviderPreferences::default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "ProviderPreferences::default_min_key_length")]
    pub min_key_length: usize,
    #[serde(default)]
    pub credential_placement: CredentialPlacement,
    /// Upper bound for the probe request; unset keeps the transport default.
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
    #[serde(default = "ProviderPreferences::default_help_url")]
    pub help_url: String,
}

impl Default for ProviderPreferences {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            key_prefix: Self::default_key_prefix(),
            min_key_length: Self::default_min_key_length(),
            credential_placement: CredentialPlacement::default(),
            probe_timeout_secs: None,
            help_url: Self::default_help_url(),
        }
    }
}

impl ProviderPreferences {
    fn default_api_base() -> String {
        DEFAULT_API_BASE.to_string()
    }

    fn default_key_prefix() -> String {
        DEFAULT_KEY_PREFIX.to_string()
    }

    const fn default_min_key_length() -> usize {
        DEFAULT_MIN_KEY_LENGTH
    }

    fn default_help_url() -> String {
        DEFAULT_HELP_URL.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPreferences {
    #[serde(default)]
    pub ambiguity_policy: AmbiguityPolicy,
    #[serde(default = "ValidationPreferences::default_remote_check")]
    pub remote_check: bool,
}

impl Default for ValidationPreferences {
    fn default() -> Self {
        Self {
            ambiguity_policy: AmbiguityPolicy::default(),
            remote_check: Self::default_remote_check(),
        }
    }
}

impl ValidationPreferences {
    const fn default_remote_check() -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub theme: ThemePreference,
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration from the default location.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

/// Load the configuration at `path`, falling back to defaults on any problem.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to the default location.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

/// Persist the configuration to `path`.
pub fn save_config_to(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    let mut file = open_private(path)?;
    file.write_all(serialized.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Open `path` for writing, owner-only on unix before any byte is written.
/// The file may hold the raw key.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten files that already existed.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    let provider = &mut config.provider;
    let base = provider.api_base.trim();
    if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
        warnings.push(format!(
            "Invalid provider.api_base '{}'. Using {}.",
            provider.api_base, DEFAULT_API_BASE
        ));
        provider.api_base = ProviderPreferences::default_api_base();
    }

    if provider.key_prefix.trim().is_empty() {
        warnings.push(format!(
            "provider.key_prefix cannot be empty. Using \"{}\".",
            DEFAULT_KEY_PREFIX
        ));
        provider.key_prefix = ProviderPreferences::default_key_prefix();
    } else if provider.key_prefix.trim() != provider.key_prefix {
        provider.key_prefix = provider.key_prefix.trim().to_string();
    }

    if provider.min_key_length == 0 {
        warnings.push(format!(
            "provider.min_key_length must be positive. Using {}.",
            DEFAULT_MIN_KEY_LENGTH
        ));
        provider.min_key_length = DEFAULT_MIN_KEY_LENGTH;
    }

    if provider.probe_timeout_secs == Some(0) {
        warnings.push("provider.probe_timeout_secs of 0 ignored; using no timeout.".to_string());
        provider.probe_timeout_secs = None;
    }

    if provider.help_url.trim().is_empty() {
        provider.help_url = ProviderPreferences::default_help_url();
    }

    if config
        .api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty())
    {
        warnings.push("Ignoring blank api_key in configuration.".to_string());
        config.api_key = None;
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_provider() {
        let config = FileConfig::default();
        assert_eq!(config.key_rules(), KeyRules::default());
        assert_eq!(config.verifier_settings(), VerifierSettings::default());
        assert_eq!(config.validation.ambiguity_policy, AmbiguityPolicy::FailOpen);
        assert!(config.validation.remote_check);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_sanitize_wrong_schema_version() {
        let mut config = FileConfig::default();
        config.schema_version = 42;
        config.api_key = Some("AIzaSomething".to_string());

        let (sanitized, warnings) = sanitize_config(config);
        assert_eq!(sanitized, FileConfig::default());
        assert!(warnings.iter().any(|w| w.contains("schema version")));
    }

    #[test]
    fn test_sanitize_invalid_provider_values() {
        let mut config = FileConfig::default();
        config.provider.api_base = "localhost:8080".to_string();
        config.provider.key_prefix = "   ".to_string();
        config.provider.min_key_length = 0;
        config.provider.probe_timeout_secs = Some(0);

        let (sanitized, warnings) = sanitize_config(config);
        assert_eq!(sanitized.provider.api_base, DEFAULT_API_BASE);
        assert_eq!(sanitized.provider.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(sanitized.provider.min_key_length, DEFAULT_MIN_KEY_LENGTH);
        assert_eq!(sanitized.provider.probe_timeout_secs, None);
        assert_eq!(warnings.len(), 4, "{warnings:?}");
    }

    #[test]
    fn test_sanitize_blank_api_key() {
        let mut config = FileConfig::default();
        config.api_key = Some("  ".to_string());
        let (sanitized, warnings) = sanitize_config(config);
        assert_eq!(sanitized.api_key, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempdir().expect("tempdir");
        let load = load_config_from(&dir.path().join("config.toml"));
        assert_eq!(load.source, ConfigSource::Default);
        assert!(load.warnings.is_empty());
        assert_eq!(load.config, FileConfig::default());
    }

    #[test]
    fn test_load_config_bad_toml() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").expect("write");

        let load = load_config_from(&path);
        assert_eq!(load.source, ConfigSource::Default);
        assert!(load.warnings.iter().any(|w| w.contains("Failed to parse")));
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
schema_version = 1

[validation]
ambiguity_policy = "fail-closed"

[ui]
locale = "vi"
"#,
        )
        .expect("write");

        let load = load_config_from(&path);
        assert_eq!(load.source, ConfigSource::File);
        assert_eq!(
            load.config.validation.ambiguity_policy,
            AmbiguityPolicy::FailClosed
        );
        assert!(load.config.validation.remote_check);
        assert_eq!(load.config.ui.locale, Locale::Vi);
        assert_eq!(load.config.provider, ProviderPreferences::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = FileConfig::default();
        config.set_api_key("  AIzaSyA1234567890abcdefghijklmnopqrs \n");
        config.provider.credential_placement = CredentialPlacement::Header;
        config.provider.probe_timeout_secs = Some(10);
        config.ui.theme = ThemePreference::Light;
        save_config_to(&path, &config).expect("save");

        let load = load_config_from(&path);
        assert_eq!(load.source, ConfigSource::File);
        assert!(load.warnings.is_empty(), "{:?}", load.warnings);
        assert_eq!(load.config, config);
        assert_eq!(
            load.config.api_key.as_deref(),
            Some("AIzaSyA1234567890abcdefghijklmnopqrs")
        );
        assert_eq!(
            load.config.verifier_settings().timeout,
            Some(Duration::from_secs(10))
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "schema_version = 1\n").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        let mut config = FileConfig::default();
        config.set_api_key("AIzaSyA1234567890abcdefghijklmnopqrs");
        save_config_to(&path, &config).expect("save");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load_config_from(&path).config, config);
    }

    #[test]
    fn test_save_under_file_parent_reports_io_error() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").expect("write");

        let err = save_config_to(&blocker.join("config.toml"), &FileConfig::default())
            .expect_err("parent is a file");
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_set_blank_key_clears() {
        let mut config = FileConfig::default();
        config.set_api_key("AIzaSyA1234567890abcdefghijklmnopqrs");
        assert!(config.has_api_key());
        assert_eq!(config.masked_api_key().as_deref(), Some("AIza…pqrs"));

        config.set_api_key("   ");
        assert!(!config.has_api_key());
        assert_eq!(config.masked_api_key(), None);
    }
}
