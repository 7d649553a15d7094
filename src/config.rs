use anyhow::{Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookmarkd")]
#[command(about = "Runs the bookmarks service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookmarkd")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_api_token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::parse(&yaml_str)
    }

    pub fn parse(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app.database.trim().is_empty() {
            bail!("app.database must be set");
        }
        if self.app.get_api_token().is_none() {
            bail!("app.api_token must be set");
        }
        Ok(())
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal() {
        let cfg = Config::parse("app:\n  database: bookmarks.db\n  port: 8000\n  api_token: secret\n").unwrap();
        assert_eq!(cfg.app.get_db(), "bookmarks.db");
        assert_eq!(cfg.app.get_port(), 8000);
        assert_eq!(cfg.app.get_api_token(), Some("secret"));
        assert_eq!(cfg.app.sync_interval_seconds, 60);
        assert!(cfg.app.turso_url.is_none());
    }

    #[test]
    fn test_env_substitution_with_defaults() {
        let yaml = "app:\n  database: ${BOOKMARKD_TEST_UNSET_DB:-fallback.db}\n  port: ${BOOKMARKD_TEST_UNSET_PORT:-9000}\n  api_token: ${BOOKMARKD_TEST_UNSET_TOKEN:-tok}\n  turso_url: ${BOOKMARKD_TEST_UNSET_TURSO:-}\n";
        let cfg = Config::parse(yaml).unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
        assert_eq!(cfg.app.get_port(), 9000);
        assert_eq!(cfg.app.get_api_token(), Some("tok"));
        assert!(cfg.app.turso_url.is_none());
    }

    #[test]
    fn test_missing_token_rejected() {
        let yaml = "app:\n  database: db\n  port: 1\n  api_token: ${BOOKMARKD_TEST_UNSET_TOKEN}\n";
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app:\n  database: \":memory:\"\n  port: 8080\n  api_token: abc").unwrap();
        let cfg = Config::new(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.app.get_db(), ":memory:");
        assert_eq!(cfg.app.get_port(), 8080);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Config::new("/definitely/not/here/config.yaml").is_err());
    }
}
