use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Empty means the in-memory store is used.
    #[serde(default)]
    pub database_url: String,

    #[serde(default)]
    pub seed_path: Option<String>,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u64,

    #[serde(default = "default_api_rate_window")]
    pub api_rate_window_secs: u64,

    #[serde(default = "default_contact_rate_limit")]
    pub contact_rate_limit: u64,

    #[serde(default = "default_contact_rate_window")]
    pub contact_rate_window_secs: u64,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub email_user: Option<String>,

    #[serde(default)]
    pub email_pass: Option<String>,

    #[serde(default)]
    pub receive_email: Option<String>,

    #[serde(default = "default_email_wait")]
    pub email_wait_ms: u64,

    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default)]
    pub admin_password_hash: Option<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default = "default_archive_after_days")]
    pub archive_after_days: i64,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-API".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> String {
    "*".to_string()
}
fn default_api_rate_limit() -> u64 {
    100
}
fn default_api_rate_window() -> u64 {
    15 * 60
}
fn default_contact_rate_limit() -> u64 {
    5
}
fn default_contact_rate_window() -> u64 {
    60 * 60
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_email_wait() -> u64 {
    5_000
}
fn default_owner_name() -> String {
    "Portfolio Owner".to_string()
}
fn default_site_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_jwt_expiration() -> i64 {
    60
}
fn default_archive_after_days() -> i64 {
    30
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Unprefixed names used by existing deployments
        config.database_url = fill_from_env(config.database_url, &["DATABASE_URL"]);
        if config.database_url.trim().is_empty() {
            // Older deployments exported MONGODB_URI; only a Postgres URL there is usable.
            if let Some(url) = non_empty_env("MONGODB_URI").filter(|url| is_postgres_url(url)) {
                config.database_url = url;
            }
        }
        config.jwt_secret = fill_from_env(config.jwt_secret, &["JWT_SECRET"]);
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            if env::var("APP_PORT").is_err() {
                config.port = port;
            }
        }
        config.email_user = config.email_user.or_else(|| non_empty_env("EMAIL_USER"));
        config.email_pass = config.email_pass.or_else(|| non_empty_env("EMAIL_PASS"));
        config.receive_email = config.receive_email.or_else(|| non_empty_env("RECEIVE_EMAIL"));

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.admin_enabled() && self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters when admin login is enabled");
        }
        if self.api_rate_limit == 0 || self.contact_rate_limit == 0 {
            errors.push("Rate limits must be greater than zero");
        }
        if self.api_rate_window_secs == 0 || self.contact_rate_window_secs == 0 {
            errors.push("Rate limit windows must be greater than zero");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if self.uses_database() && !is_postgres_url(&self.database_url) {
            errors.push("DATABASE_URL must be a postgres:// or postgresql:// URL");
        }
        if self.is_production() && !self.uses_database() {
            errors.push("DATABASE_URL must be set in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    /// Defaults with in-memory storage and no mail transport, for tests and tooling.
    pub fn testing() -> Self {
        AppConfig {
            env: AppEnvironment::Testing,
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: 1,
            database_url: String::new(),
            seed_path: None,
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: false,
            api_rate_limit: default_api_rate_limit(),
            api_rate_window_secs: default_api_rate_window(),
            contact_rate_limit: default_contact_rate_limit(),
            contact_rate_window_secs: default_contact_rate_window(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            email_user: None,
            email_pass: None,
            receive_email: None,
            email_wait_ms: default_email_wait(),
            owner_name: default_owner_name(),
            site_url: default_site_url(),
            admin_password_hash: None,
            jwt_secret: "test-secret-key-that-is-at-least-32-chars".to_string(),
            jwt_expiration_minutes: default_jwt_expiration(),
            archive_after_days: default_archive_after_days(),
            log_format: default_log_format(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn uses_database(&self) -> bool {
        !self.database_url.trim().is_empty()
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_password_hash
            .as_deref()
            .is_some_and(|hash| !hash.trim().is_empty())
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Address that receives owner notifications.
    pub fn notification_recipient(&self) -> Option<&str> {
        self.receive_email
            .as_deref()
            .or(self.email_user.as_deref())
    }
}

fn fill_from_env(current: String, keys: &[&str]) -> String {
    if !current.trim().is_empty() {
        return current;
    }
    keys.iter()
        .find_map(|key| non_empty_env(key))
        .unwrap_or(current)
}

fn is_postgres_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            Some(value) => value.redact(),
            None => "[MISSING]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("seed_path", &self.seed_path)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("api_rate_limit", &self.api_rate_limit)
            .field("api_rate_window_secs", &self.api_rate_window_secs)
            .field("contact_rate_limit", &self.contact_rate_limit)
            .field("contact_rate_window_secs", &self.contact_rate_window_secs)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("email_user", &self.email_user)
            .field("email_pass", &self.email_pass.redact())
            .field("receive_email", &self.receive_email)
            .field("email_wait_ms", &self.email_wait_ms)
            .field("owner_name", &self.owner_name)
            .field("site_url", &self.site_url)
            .field("admin_password_hash", &self.admin_password_hash.redact())
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("archive_after_days", &self.archive_after_days)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_names_parse_case_insensitively() {
        assert_eq!(AppEnvironment::from_str("Production").unwrap(), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_str("TESTING").unwrap(), AppEnvironment::Testing);
        assert!(AppEnvironment::from_str("staging").is_err());
    }

    #[test]
    fn testing_defaults_pass_validation() {
        let mut config = AppConfig::testing();
        assert!(config.validate().is_ok());
        assert!(!config.uses_database());

        config.admin_password_hash = Some("$argon2id$stub".into());
        config.jwt_secret = "short".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let mut config = AppConfig::testing();
        config.env = AppEnvironment::Production;
        config.database_url = "postgres://localhost/portfolio".into();
        assert!(config.validate().is_err());

        config.cors_allowed_origins = "https://example.com".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn database_url_must_be_postgres() {
        let mut config = AppConfig::testing();
        config.database_url = "mongodb://localhost:27017/portfolio".into();
        assert!(config.validate().is_err());

        config.database_url = "postgresql://localhost/portfolio".into();
        assert!(config.validate().is_ok());
        assert!(is_postgres_url(" postgres://user@db/portfolio"));
        assert!(!is_postgres_url("mongodb+srv://cluster/portfolio"));
    }

    #[test]
    fn redaction_hides_secrets() {
        assert_eq!("hunter2".redact(), "[REDACTED]");
        assert_eq!("".redact(), "[MISSING]");
        assert_eq!(None::<String>.redact(), "[MISSING]");
    }
}
