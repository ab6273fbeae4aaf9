//! Process configuration.
//!
//! Settings are read once at start-up from an optional TOML file and the
//! environment (environment wins), validated, and then handed to each
//! component by value. Keys use the environment spelling in both sources,
//! lowercased in the file:
//!
//! ```toml
//! deepseek_api_key = "sk-..."
//! db_user = "joomla"
//! db_name = "site"
//! records_limit = 2
//! api_delay = 1
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::batch::BatchConfig;
use crate::store::TableName;
use crate::{MetagenError, Result};

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_API_DELAY_SECS: f64 = 1.0;

const CONFIG_FILE_NAME: &str = "metagen.toml";

/// Remote generation settings.
#[derive(Clone)]
pub struct GeneratorSettings {
    pub api_key: String,
    pub api_url: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl fmt::Debug for GeneratorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSettings")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Content database connection settings.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub table: TableName,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("table", &self.table.as_str())
            .finish()
    }
}

/// Everything the process needs, validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub database: DatabaseSettings,
    pub batch: BatchConfig,
}

/// Flat key space shared by the file and the environment.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    deepseek_api_key: Option<String>,
    deepseek_api_url: Option<String>,
    deepseek_model: Option<String>,
    deepseek_temperature: Option<f32>,
    deepseek_max_tokens: Option<u32>,
    deepseek_timeout: Option<u64>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    db_table: Option<String>,
    records_limit: Option<String>,
    api_delay: Option<f64>,
}

impl Settings {
    /// Loads settings from `file` (or the default locations) and the process environment.
    ///
    /// An explicit file must exist. Without one, `./metagen.toml` and
    /// `<config dir>/metagen/metagen.toml` are read when present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let files = match file {
            Some(path) => vec![(path.to_path_buf(), true)],
            None => default_files(),
        };
        Self::from_sources(&files, None)
    }

    fn from_sources(files: &[(PathBuf, bool)], env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        for (path, required) in files {
            builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(*required));
        }
        builder = builder.add_source(Environment::default().ignore_empty(true).source(env));

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let api_key = required(raw.deepseek_api_key, "DEEPSEEK_API_KEY")?;

        let api_url_raw = raw.deepseek_api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url_raw).map_err(|e| MetagenError::InvalidUrl(format!("{}: {}", api_url_raw, e)))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(MetagenError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                api_url_raw
            )));
        }

        let temperature = raw.deepseek_temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(MetagenError::ConfigError(format!(
                "DEEPSEEK_TEMPERATURE must be between 0 and 2, got {}",
                temperature
            )));
        }

        let max_tokens = raw.deepseek_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(MetagenError::ConfigError("DEEPSEEK_MAX_TOKENS must be positive".to_string()));
        }

        let timeout_secs = raw.deepseek_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(MetagenError::ConfigError("DEEPSEEK_TIMEOUT must be positive".to_string()));
        }

        let generator = GeneratorSettings {
            api_key,
            api_url,
            model: raw.deepseek_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            max_tokens,
            timeout: Duration::from_secs(timeout_secs),
        };

        let database = DatabaseSettings {
            host: raw.db_host.unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: raw.db_port.unwrap_or(DEFAULT_DB_PORT),
            user: required(raw.db_user, "DB_USER")?,
            password: raw.db_password.unwrap_or_default(),
            name: required(raw.db_name, "DB_NAME")?,
            table: match raw.db_table {
                Some(table) => TableName::new(table)?,
                None => TableName::default(),
            },
        };

        let batch = BatchConfig {
            limit: parse_limit(raw.records_limit.as_deref())?,
            delay: parse_delay(raw.api_delay.unwrap_or(DEFAULT_API_DELAY_SECS))?,
        };

        Ok(Self { generator, database, batch })
    }
}

fn default_files() -> Vec<(PathBuf, bool)> {
    let mut files = vec![(PathBuf::from(CONFIG_FILE_NAME), false)];
    if let Some(dir) = dirs::config_dir() {
        files.push((dir.join("metagen").join(CONFIG_FILE_NAME), false));
    }
    // Later sources override earlier ones: the working directory wins.
    files.reverse();
    files
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MetagenError::ConfigError(format!("{} is not set", key))),
    }
}

/// Parses a record limit. Empty, `0`, `all` and `none` mean unbounded.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<u64>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match raw.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(MetagenError::ConfigError(format!(
            "RECORDS_LIMIT must be a positive integer or 'all', got {:?}",
            raw
        ))),
    }
}

/// Converts a delay in seconds into a [`Duration`].
pub fn parse_delay(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| MetagenError::ConfigError(format!("API_DELAY must be a non-negative number of seconds, got {}", secs)))
}
