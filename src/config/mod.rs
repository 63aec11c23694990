use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DATABASE_PATH_ENV: &str = "FOLIO_DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "FOLIO_JWT_SECRET";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: String,
    #[serde(default = "default_refresh_token_lifetime")]
    pub refresh_token_lifetime: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_lifetime: default_access_token_lifetime(),
            refresh_token_lifetime: default_refresh_token_lifetime(),
        }
    }
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Result<Duration> {
        parse_duration(&self.access_token_lifetime)
    }

    pub fn refresh_ttl(&self) -> Result<Duration> {
        parse_duration(&self.refresh_token_lifetime)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> String {
    "data/folio.db".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_access_token_lifetime() -> String {
    "5m".to_string()
}

fn default_refresh_token_lifetime() -> String {
    "1d".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

/// Parses lifetimes written as `<n><unit>` where unit is one of `s`, `m`, `h`, `d`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow::anyhow!("Duration '{}' is missing a unit (s, m, h, d)", value))?;
    let (amount, unit) = value.split_at(split);
    let amount: u64 = amount
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid duration '{}'", value))?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => anyhow::bail!("Unknown duration unit '{}' in '{}'", unit, value),
    };
    let seconds = amount
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Invalid duration '{}'", value))?;

    if seconds == 0 {
        anyhow::bail!("Duration '{}' must be greater than zero", value);
    }

    Ok(Duration::from_secs(seconds))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run `folio init` to create one.",
                path.display(),
                e
            )
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!(
                "auth.jwt_secret must be set (or provide {} in the environment)",
                JWT_SECRET_ENV
            );
        }
        self.auth.access_ttl()?;
        self.auth.refresh_ttl()?;
        if self.api.page_size == 0 {
            anyhow::bail!("api.page_size must be greater than 0");
        }
        if self.api.page_size > self.api.max_page_size {
            anyhow::bail!("api.page_size must not exceed api.max_page_size");
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        Ok(())
    }
}
