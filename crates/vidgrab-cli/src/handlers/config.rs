//! Config command handler.
//!
//! Reads and writes individual settings through the settings service,
//! which validates every change before it is persisted.

use anyhow::Result;
use serde_json::Value;
use vidgrab_core::{Settings, SettingsError, SettingsServiceError};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;
use crate::utils::input::prompt_confirmation;

/// Execute the config command.
pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let settings = ctx.settings().get().await.map_err(CliError::from)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommand::Get { key } => {
            let value = ctx.settings().get_value(&key).await.map_err(CliError::from)?;
            println!("{}", display_value(&value));
        }
        ConfigCommand::Set { key, value } => {
            let updated = set_value(ctx, &key, &value).await?;
            let stored = updated.get_value(&key).unwrap_or(Value::Null);
            println!("✓ {key} = {}", display_value(&stored));
        }
        ConfigCommand::Reset { force } => {
            if !force && !prompt_confirmation("Restore all settings to their defaults?")? {
                println!("Nothing changed.");
                return Ok(());
            }
            ctx.settings().reset().await.map_err(CliError::from)?;
            println!("✓ Settings restored to defaults.");
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths().settings_file().display());
        }
    }
    Ok(())
}

/// Read a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Store `raw` under `key`. A value that parses as JSON but does not fit
/// the setting (`2024` for a path) is retried as a string.
async fn set_value(ctx: &CliContext, key: &str, raw: &str) -> Result<Settings, CliError> {
    let parsed = parse_value(raw);
    let retry_as_string = !parsed.is_string();
    match ctx.settings().set_value(key, parsed).await {
        Err(SettingsServiceError::Invalid(SettingsError::InvalidValue { .. })) if retry_as_string => ctx
            .settings()
            .set_value(key, Value::String(raw.to_string()))
            .await
            .map_err(CliError::from),
        other => other.map_err(CliError::from),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "(empty)".to_string(),
        Value::String(s) => s.clone(),
        Value::Null => "(unset)".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CliConfig, bootstrap};
    use serde_json::json;
    use tempfile::tempdir;
    use vidgrab_core::AppPaths;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("8"), json!(8));
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("1080p"), json!("1080p"));
        assert_eq!(parse_value("/home/me/Videos"), json!("/home/me/Videos"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("mkv")), "mkv");
        assert_eq!(display_value(&json!("")), "(empty)");
        assert_eq!(display_value(&Value::Null), "(unset)");
        assert_eq!(display_value(&json!(2.5)), "2.5");
    }

    #[tokio::test]
    async fn test_set_then_get_persists() {
        let dir = tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            paths: AppPaths::with_root(dir.path()),
        })
        .await
        .unwrap();

        execute(
            &ctx,
            ConfigCommand::Set {
                key: "concurrent_fragments".to_string(),
                value: "12".to_string(),
            },
        )
        .await
        .unwrap();

        let value = ctx.settings().get_value("concurrent_fragments").await.unwrap();
        assert_eq!(value, json!(12));
        assert!(dir.path().join("config.json").is_file());
    }

    #[tokio::test]
    async fn test_numeric_looking_path_is_kept_as_string() {
        let dir = tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            paths: AppPaths::with_root(dir.path()),
        })
        .await
        .unwrap();

        let updated = set_value(&ctx, "download_path", "2024").await.unwrap();
        assert_eq!(updated.download_path, "2024");
    }

    #[tokio::test]
    async fn test_invalid_value_is_argument_error() {
        let dir = tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            paths: AppPaths::with_root(dir.path()),
        })
        .await
        .unwrap();

        let err = execute(
            &ctx,
            ConfigCommand::Set {
                key: "concurrent_fragments".to_string(),
                value: "0".to_string(),
            },
        )
        .await
        .unwrap_err();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_forced_reset_restores_defaults() {
        let dir = tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            paths: AppPaths::with_root(dir.path()),
        })
        .await
        .unwrap();
        ctx.settings()
            .set_value("auto_concurrency", json!(false))
            .await
            .unwrap();

        execute(&ctx, ConfigCommand::Reset { force: true }).await.unwrap();

        let value = ctx.settings().get_value("auto_concurrency").await.unwrap();
        assert_eq!(value, json!(true));
    }
}
