//! Configuration commands.

use super::Env;
use anyhow::{Context, Result};
use colored::Colorize;
use docloader_config::{Config, IngestBackend};

pub fn show(env: &Env) -> Result<()> {
    let paths = &env.paths;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if paths.config_file.exists() {
        let contents =
            std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;
        println!("{}", contents);
    } else {
        println!(
            "{}",
            format!("# No config file at {}; showing defaults", paths.config_file.display()).dimmed()
        );
        println!("{}", env.config.to_toml_string()?);
    }

    Ok(())
}

pub fn path(env: &Env) -> Result<()> {
    println!("{}", env.paths.config_file.display());
    Ok(())
}

pub fn set(env: &Env, key: &str, value: &str) -> Result<()> {
    let mut config = env.config.clone();
    apply(&mut config, key, value)?;
    config.validate().context("Refusing to save invalid configuration")?;

    config
        .save_to(&env.paths.config_file)
        .context("Failed to save config")?;

    println!("{} Set {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}

/// Apply a `section.key = value` assignment.
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "data_dir"] => config.general.data_dir = Some(value.to_string()),
        ["loader", "location"] => config.loader.location = value.to_string(),
        ["loader", "period_seconds"] => {
            config.loader.period_seconds = value.parse().context("Invalid period_seconds value")?;
        }
        ["loader", "delay_seconds"] => {
            config.loader.delay_seconds = value.parse().context("Invalid delay_seconds value")?;
        }
        ["loader", "file_timeout_seconds"] => {
            config.loader.file_timeout_seconds =
                value.parse().context("Invalid file_timeout_seconds value")?;
        }
        ["loader", "max_concurrent_files"] => {
            config.loader.max_concurrent_files =
                value.parse().context("Invalid max_concurrent_files value")?;
        }
        ["loader", "include_patterns"] => config.loader.include_patterns = split_list(value),
        ["loader", "ignore_patterns"] => config.loader.ignore_patterns = split_list(value),
        ["ingest", "backend"] => {
            config.ingest.backend = IngestBackend::from_str(value)
                .with_context(|| format!("Unknown backend: {} (expected log, command or http)", value))?;
        }
        ["ingest", "command"] => config.ingest.command = value.to_string(),
        ["ingest", "args"] => config.ingest.args = value.split_whitespace().map(String::from).collect(),
        ["ingest", "endpoint"] => config.ingest.endpoint = value.to_string(),
        ["ingest", "timeout_seconds"] => {
            config.ingest.timeout_seconds = value.parse().context("Invalid timeout value")?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "loader.location", "/srv/inbox").unwrap();
        apply(&mut config, "loader.period_seconds", "15").unwrap();
        apply(&mut config, "loader.include_patterns", "*.pdf, *.docx").unwrap();
        apply(&mut config, "ingest.backend", "http").unwrap();
        apply(&mut config, "ingest.endpoint", "http://localhost:8080/ingest").unwrap();
        apply(&mut config, "ingest.args", "--collection docs").unwrap();

        assert_eq!(config.loader.location, "/srv/inbox");
        assert_eq!(config.loader.period_seconds, 15);
        assert_eq!(config.loader.include_patterns, vec!["*.pdf", "*.docx"]);
        assert_eq!(config.ingest.backend, IngestBackend::Http);
        assert_eq!(config.ingest.args, vec!["--collection", "docs"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply(&mut config, "loader.period_seconds", "soon").is_err());
        assert!(apply(&mut config, "ingest.backend", "kafka").is_err());
        assert!(apply(&mut config, "nope.key", "1").is_err());
    }
}
