use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "keygate", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate an API key the same way the dialog does.
    Check(CheckArgs),
    /// Remove the saved API key from config.toml.
    #[command(alias = "forget")]
    ClearKey,
    /// Inspect the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Args, Default)]
pub struct CheckArgs {
    /// Key to check; prompted for (without echo) when omitted.
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Save the key to config.toml when it is accepted.
    #[arg(long, action = ArgAction::SetTrue)]
    pub save: bool,

    /// Run only the local format checks.
    #[arg(long, action = ArgAction::SetTrue)]
    pub offline: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the path of config.toml.
    Path,
    /// Print the effective configuration with the key redacted.
    Show,
}
