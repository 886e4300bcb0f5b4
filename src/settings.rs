use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::ConfigError;

/// Path of the OAuth callback relative to the redirect base URL
pub const CALLBACK_PATH: &str = "/auth/provider/callback";

/// Longest session lifetime accepted from configuration (one leap year)
pub const MAX_SESSION_DURATION_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateSettings {
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub views: ViewSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub redirect_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub api_base_url: String,
    /// Organization the signed-in user must follow
    pub organization: String,
    pub scopes: Vec<String>,
    /// Explicit callback URL; derived from `redirect_base_url` when empty
    pub callback_url: String,
    /// Client identifier sent as `User-Agent` on provider API calls
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    pub session_duration_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Folder holding `index.hbs`, `success.hbs` and `not_follow.hbs` overrides
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

/// Validated secrets the core refuses to run without
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    session_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting any empty value
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first empty field
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        session_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = require("client_id", client_id.into())?;
        let client_secret = require("client_secret", client_secret.into())?;
        let session_secret = require("session_secret", session_secret.into())?;

        Ok(Self {
            client_id,
            client_secret,
            session_secret,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn session_secret(&self) -> &[u8] {
        self.session_secret.as_bytes()
    }
}

fn require(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(field))
    } else {
        Ok(value)
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redirect_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_endpoint: "https://github.com/login/oauth/authorize".to_string(),
            token_endpoint: "https://github.com/login/oauth/access_token".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            organization: String::new(),
            scopes: vec!["user:follow".to_string()],
            callback_url: String::new(),
            user_agent: concat!("followgate/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Required, no generated fallback
            session_duration_hours: 24,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            folder: "views".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GateSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Logging is not initialised here; call [`GateSettings::init_logging`]
    /// once the settings are known.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialise `env_logger`, using the configured level unless `RUST_LOG` is set
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    pub fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.logging.level.as_str()),
        )
        .try_init()
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `FOLLOWGATE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("FOLLOWGATE_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ FOLLOWGATE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_provider_env_overrides(&mut settings.provider);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        override_string("VIEWS_FOLDER", &mut settings.views.folder);
        override_string("RUST_LOG", &mut settings.logging.level);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        override_string("HOST", &mut app_settings.host);
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            app_settings.port = port;
        }
        override_string("REDIRECT_BASE_URL", &mut app_settings.redirect_base_url);
    }

    fn apply_provider_env_overrides(provider_settings: &mut ProviderSettings) {
        override_string("GITHUB_CLIENT_ID", &mut provider_settings.client_id);
        override_string("GITHUB_CLIENT_SECRET", &mut provider_settings.client_secret);
        override_string("ORGANIZATION", &mut provider_settings.organization);
        override_string("CALLBACK_URL", &mut provider_settings.callback_url);
        override_numeric(
            "PROVIDER_TIMEOUT_SECS",
            &mut provider_settings.request_timeout_secs,
        );
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        override_string("SESSION_SECRET", &mut session_settings.session_secret);
        override_numeric(
            "SESSION_DURATION_HOURS",
            &mut session_settings.session_duration_hours,
        );
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Some(secure) = std::env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            cookie_settings.secure = secure;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    // Real environment wins over .env
                    if std::env::var_os(key.trim()).is_none() {
                        std::env::set_var(key.trim(), value.trim());
                    }
                }
            }
        }
    }

    /// Validated provider and session secrets
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if any secret is empty
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::new(
            self.provider.client_id.clone(),
            self.provider.client_secret.clone(),
            self.session.session_secret.clone(),
        )
    }

    /// Check everything the gate needs before it may accept traffic
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed setting
    pub fn validate(&self) -> Result<Credentials, ConfigError> {
        let credentials = self.credentials()?;
        if self.provider.organization.trim().is_empty() {
            return Err(ConfigError::Missing("organization"));
        }
        let callback = self.callback_url();
        url::Url::parse(&callback).map_err(|e| ConfigError::Invalid {
            field: "callback_url",
            message: format!("{callback}: {e}"),
        })?;
        let hours = self.session.session_duration_hours;
        if !(1..=MAX_SESSION_DURATION_HOURS).contains(&hours) {
            return Err(ConfigError::Invalid {
                field: "session_duration_hours",
                message: format!("{hours} is outside 1..={MAX_SESSION_DURATION_HOURS}"),
            });
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(credentials)
    }

    /// Callback URL registered with the provider
    #[must_use]
    pub fn callback_url(&self) -> String {
        if self.provider.callback_url.is_empty() {
            format!(
                "{}{CALLBACK_PATH}",
                self.application.redirect_base_url.trim_end_matches('/')
            )
        } else {
            self.provider.callback_url.clone()
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider.request_timeout_secs)
    }
}

fn override_string(env_var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

fn override_numeric(env_var: &str, target: &mut u64) {
    if let Some(value) = std::env::var(env_var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        *target = value;
    }
}
