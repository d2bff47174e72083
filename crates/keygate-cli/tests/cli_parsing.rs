use clap::Parser;
use keygate_cli::cli_args::{Cli, Command, ConfigCommand};
use keygate_cli::dispatch;
use keygate_core::load_config_from;

// Integration tests for argument parsing and the offline command paths.

const GOOD_KEY: &str = "AIzaSyA1234567890abcdefghijklmnopqrs";

#[test]
fn test_check_flags_parse() {
    let cli = Cli::try_parse_from(["keygate", "check", "--key", GOOD_KEY, "--save", "--offline"])
        .expect("parse");
    match cli.command {
        Command::Check(args) => {
            assert_eq!(args.key.as_deref(), Some(GOOD_KEY));
            assert!(args.save);
            assert!(args.offline);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_check_defaults_to_prompt() {
    let cli = Cli::try_parse_from(["keygate", "check"]).expect("parse");
    match cli.command {
        Command::Check(args) => {
            assert!(args.key.is_none());
            assert!(!args.save);
            assert!(!args.offline);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_config_subcommands_parse() {
    let cli = Cli::try_parse_from(["keygate", "config", "show"]).expect("parse");
    assert!(matches!(cli.command, Command::Config(ConfigCommand::Show)));
    let cli = Cli::try_parse_from(["keygate", "config", "path"]).expect("parse");
    assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
}

#[test]
fn test_forget_alias() {
    let cli = Cli::try_parse_from(["keygate", "forget"]).expect("parse");
    assert!(matches!(cli.command, Command::ClearKey));
}

#[test]
fn test_missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["keygate"]).is_err());
    assert!(Cli::try_parse_from(["keygate", "check", "--bogus"]).is_err());
}

#[tokio::test]
async fn test_offline_check_saves_then_clear_removes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    let padded = format!("  {GOOD_KEY}\n");

    let check = Cli::try_parse_from([
        "keygate",
        "check",
        "--key",
        padded.as_str(),
        "--save",
        "--offline",
    ])
    .expect("parse");
    dispatch(check, &path).await.expect("check");
    assert_eq!(
        load_config_from(&path).config.api_key.as_deref(),
        Some(GOOD_KEY)
    );

    let clear = Cli::try_parse_from(["keygate", "clear-key"]).expect("parse");
    dispatch(clear, &path).await.expect("clear");
    assert!(!load_config_from(&path).config.has_api_key());
}

#[tokio::test]
async fn test_rejected_key_is_not_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");

    let check = Cli::try_parse_from([
        "keygate", "check", "--key", "sk-not-a-gemini-key", "--save", "--offline",
    ])
    .expect("parse");
    let err = dispatch(check, &path).await.expect_err("rejected");
    assert!(err.contains("AIza"));
    assert!(!path.exists());
}
