//! Command-line surface for keygate.
//!
//! Runs the same validation pipeline as the dialog, so a key can be checked
//! or stored without a display.

pub mod cli_args;

use std::path::Path;

use clap::Parser;
use cli_args::{CheckArgs, Cli, Command, ConfigCommand};
use keygate_core::messages::reject_message;
use keygate_core::verifier::mask_key;
use keygate_core::{
    FileConfig, GeminiVerifier, ValidationResult, load_config_from, save_config_to, validate_key,
};
use rpassword::prompt_password;
use tracing::{info, warn};

/// True when the process was started with any arguments at all.
pub fn should_run_cli_mode() -> bool {
    std::env::args_os().len() > 1
}

/// Parse `std::env::args` and run the selected command against the default config file.
pub async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    dispatch(cli, &keygate_core::config_path()).await
}

/// Run a parsed command against the config file at `config_path`.
pub async fn dispatch(cli: Cli, config_path: &Path) -> Result<(), String> {
    let load = load_config_from(config_path);
    for warning in &load.warnings {
        warn!(target: "keygate_cli", "{warning}");
    }
    let mut config = load.config;

    match cli.command {
        Command::Check(args) => handle_check(args, &mut config, config_path).await,
        Command::ClearKey => {
            if !config.has_api_key() {
                println!("No API key saved.");
                return Ok(());
            }
            config.clear_api_key();
            save_config_to(config_path, &config).map_err(|err| err.to_string())?;
            info!(target: "keygate_cli", "API key cleared");
            println!("API key removed from {}", config_path.display());
            Ok(())
        }
        Command::Config(ConfigCommand::Path) => {
            println!("{}", config_path.display());
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            print!("{}", render_redacted(&config)?);
            Ok(())
        }
    }
}

async fn handle_check(
    args: CheckArgs,
    config: &mut FileConfig,
    config_path: &Path,
) -> Result<(), String> {
    let input = match args.key {
        Some(key) => key,
        None => prompt_password("API key: ").map_err(|err| format!("Failed to read key: {err}"))?,
    };

    match check_key(config, &input, args.offline).await? {
        ValidationResult::Accepted(key) => {
            println!("API key accepted: {}", mask_key(&key));
            if args.save {
                config.set_api_key(&key);
                save_config_to(config_path, config).map_err(|err| err.to_string())?;
                println!("Saved to {}", config_path.display());
            }
            Ok(())
        }
        ValidationResult::Rejected(reason) => Err(reject_message(
            config.ui.locale,
            reason,
            &config.key_rules(),
        )),
    }
}

/// Validate `input` with the rules, probe and policy from `config`.
///
/// `offline` skips the provider probe even when the config enables it.
pub async fn check_key(
    config: &FileConfig,
    input: &str,
    offline: bool,
) -> Result<ValidationResult, String> {
    let verifier = if offline || !config.validation.remote_check {
        None
    } else {
        Some(GeminiVerifier::new(&config.verifier_settings()).map_err(|err| err.to_string())?)
    };

    Ok(validate_key(
        input,
        &config.key_rules(),
        verifier.as_ref(),
        config.validation.ambiguity_policy,
    )
    .await)
}

/// TOML rendering of `config` with the saved key masked.
pub fn render_redacted(config: &FileConfig) -> Result<String, String> {
    let mut shown = config.clone();
    shown.api_key = config.masked_api_key();
    toml::to_string_pretty(&shown).map_err(|err| err.to_string())
}
