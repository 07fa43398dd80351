// configuration - flags, environment, and an optional toml file
// precedence: flag > env > file > default

use crate::Error;
use clap::{Args, ValueEnum};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SQLITE_PATH: &str = "gene.db";
pub const DEFAULT_MAX_ROWS: usize = 20;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const CLAUDE_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Mysql,
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
    Gateway,
    Claude,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gateway => "gateway",
            Provider::Claude => "claude",
        }
    }

    // env vars checked for credentials, in order
    fn key_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Gateway => &["AI_GATEWAY_TOKEN"],
            Provider::Claude => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "CLAUDE_KEY"],
        }
    }

    pub fn key_hint(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gateway => "AI_GATEWAY_TOKEN",
            Provider::Claude => "one of ANTHROPIC_API_KEY, CLAUDE_API_KEY, or CLAUDE_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Gateway => "gpt-4o-2024-11-20",
            Provider::Claude => "claude-sonnet-4-20250514",
        }
    }
}

/// Raw settings as they arrive from flags/env or a config file.
///
/// The same struct is parsed by clap and deserialized from toml, so a file
/// uses the long flag names with underscores (`db_host = "127.0.0.1"`).
#[derive(Debug, Clone, Default, Args, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// database connection url (overrides the individual db settings)
    #[arg(long = "db", env = "DATABASE_URL", global = true, hide_env_values = true)]
    #[serde(rename = "database_url")]
    pub db_url: Option<String>,

    /// database backend when no url is given
    #[arg(long, env = "GENE_DB_BACKEND", global = true)]
    pub backend: Option<Backend>,

    /// sqlite database file
    #[arg(long, env = "GENE_SQLITE_PATH", global = true)]
    pub sqlite_path: Option<PathBuf>,

    #[arg(long, env = "DB_HOST", global = true)]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_PORT", global = true)]
    pub db_port: Option<u16>,

    #[arg(long, env = "DB_USER", global = true)]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", global = true, hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_NAME", global = true)]
    pub db_name: Option<String>,

    /// seconds to wait for a database connection
    #[arg(long, env = "GENE_CONNECT_TIMEOUT", global = true, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// language model provider
    #[arg(long, short = 'p', env = "GENE_PROVIDER", global = true)]
    pub provider: Option<Provider>,

    /// api key (or gateway token) for the provider
    #[arg(long, short = 'k', global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "GENE_MODEL", global = true)]
    pub model: Option<String>,

    /// model api url (required for the gateway provider)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// gateway registration id
    #[arg(long, global = true)]
    pub registration_id: Option<String>,

    /// seconds to wait for the model api
    #[arg(long, env = "GENE_REQUEST_TIMEOUT", global = true, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// rows shown per result table
    #[arg(long, env = "GENE_MAX_ROWS", global = true)]
    pub max_rows: Option<usize>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    // fill anything unset from a lower-precedence source
    pub fn or(self, other: Settings) -> Settings {
        Settings {
            db_url: self.db_url.or(other.db_url),
            backend: self.backend.or(other.backend),
            sqlite_path: self.sqlite_path.or(other.sqlite_path),
            db_host: self.db_host.or(other.db_host),
            db_port: self.db_port.or(other.db_port),
            db_user: self.db_user.or(other.db_user),
            db_password: self.db_password.or(other.db_password),
            db_name: self.db_name.or(other.db_name),
            connect_timeout: self.connect_timeout.or(other.connect_timeout),
            provider: self.provider.or(other.provider),
            api_key: self.api_key.or(other.api_key),
            model: self.model.or(other.model),
            endpoint: self.endpoint.or(other.endpoint),
            registration_id: self.registration_id.or(other.registration_id),
            request_timeout: self.request_timeout.or(other.request_timeout),
            max_rows: self.max_rows.or(other.max_rows),
        }
    }

    // the provider credentials that live in the environment
    fn credentials(provider: Provider, env: impl Fn(&str) -> Option<String>) -> Settings {
        let var = |key: &str| env(key).filter(|v| !v.is_empty());
        Settings {
            api_key: provider.key_vars().iter().find_map(|key| var(*key)),
            registration_id: var("AI_GATEWAY_REGISTRATION_ID")
                .or_else(|| var("AI_GATEWAY_CLIENT_REGISTRATION")),
            endpoint: match provider {
                Provider::Gateway => var("AI_GATEWAY_URL"),
                _ => None,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub max_rows: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: Option<String>,
    pub registration_id: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Config {
    /// Build the config from parsed flags/env plus an optional toml file.
    pub fn load(settings: Settings, file: Option<&Path>) -> Result<Self, Error> {
        let file = match file {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        Self::layered(settings, file, |key| std::env::var(key).ok())
    }

    /// Resolve settings into a config, reading provider credentials via `env`.
    pub fn resolve(settings: Settings, env: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        Self::layered(settings, Settings::default(), env)
    }

    /// Like [`Config::resolve`], with a lower-precedence file layer.
    ///
    /// Credentials found through `env` sit between `flags` and `file`.
    pub fn layered(
        flags: Settings,
        file: Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let provider = flags
            .provider
            .or(file.provider)
            .unwrap_or(Provider::OpenAi);
        let settings = flags.or(Settings::credentials(provider, env)).or(file);
        Self::build(settings, provider)
    }

    fn build(settings: Settings, provider: Provider) -> Result<Self, Error> {
        let connect_timeout =
            Duration::from_secs(settings.connect_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let url = match settings.db_url {
            Some(url) => url,
            None => database_url(&settings)?,
        };

        let endpoint = settings.endpoint.or_else(|| match provider {
            Provider::OpenAi => Some(OPENAI_URL.to_string()),
            Provider::Claude => Some(CLAUDE_URL.to_string()),
            Provider::Gateway => None,
        });

        let ai = AiConfig {
            provider,
            api_key: settings.api_key,
            model: settings
                .model
                .unwrap_or_else(|| provider.default_model().to_string()),
            endpoint,
            registration_id: settings.registration_id,
            timeout: Duration::from_secs(settings.request_timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            max_tokens: match provider {
                Provider::Claude => 1024,
                _ => 500,
            },
            temperature: 0.1,
        };

        Ok(Self {
            database: DatabaseConfig { url, connect_timeout },
            ai,
            max_rows: settings.max_rows.unwrap_or(DEFAULT_MAX_ROWS).max(1),
        })
    }
}

impl DatabaseConfig {
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            url: sqlite_url(path.as_ref()),
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connection url with the password masked, for display.
    pub fn display_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            _ => self.url.clone(),
        }
    }
}

fn sqlite_url(path: &Path) -> String {
    // rwc: create the file on first use
    format!("sqlite://{}?mode=rwc", path.display())
}

fn database_url(settings: &Settings) -> Result<String, Error> {
    let backend = settings.backend.unwrap_or(if settings.db_host.is_some() {
        Backend::Mysql
    } else {
        Backend::Sqlite
    });

    let (scheme, default_port) = match backend {
        Backend::Sqlite => {
            let path = settings
                .sqlite_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH));
            return Ok(sqlite_url(&path));
        }
        Backend::Mysql => ("mysql", 3306),
        Backend::Postgres => ("postgres", 5432),
    };

    let host = settings.db_host.as_deref().unwrap_or("127.0.0.1");
    let port = settings.db_port.unwrap_or(default_port);
    let user = settings
        .db_user
        .as_deref()
        .ok_or_else(|| Error::Config("database user missing (set DB_USER or --db-user)".into()))?;
    let name = settings
        .db_name
        .as_deref()
        .ok_or_else(|| Error::Config("database name missing (set DB_NAME or --db-name)".into()))?;

    let mut url = Url::parse(&format!("{scheme}://{host}:{port}/"))
        .map_err(|e| Error::Config(format!("invalid database host {host:?}: {e}")))?;
    url.set_username(user)
        .map_err(|_| Error::Config(format!("invalid database user {user:?}")))?;
    if let Some(password) = settings.db_password.as_deref().filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|_| Error::Config("invalid database password".into()))?;
    }
    url.set_path(&format!("/{name}"));

    Ok(url.to_string())
}
