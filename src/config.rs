//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the fixed constants of the figurine flow.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// `OpenRouter` chat completions endpoint
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Image-capable model used for generation
pub const DEFAULT_FIGURINE_MODEL: &str = "google/gemini-2.5-flash-image-preview:free";

/// Output token limit sent with every generation request
pub const DEFAULT_FIGURINE_MAX_TOKENS: u32 = 1000;

/// Per-call network timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Avatar reference, `{id}` is replaced by the participant id.
///
/// The default points at the Telegram profile photo, fetched through the
/// Bot API. Set `AVATAR_URL_TEMPLATE` to an HTTP URL to use another host.
pub const DEFAULT_AVATAR_URL_TEMPLATE: &str = "tg-avatar://{id}";

/// Directory holding the key file and generated images
pub const DEFAULT_DATA_DIR: &str = "data/figurine";

/// Name of the key store document inside the data directory
pub const KEYS_FILE_NAME: &str = "openrouter_keys.json";

/// Only credentials with this prefix are accepted by `/addkeys`
pub const API_KEY_PREFIX: &str = "sk-or-v1-";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Comma-separated list of user IDs allowed to manage API keys
    #[serde(rename = "admin_users")]
    pub admin_users_str: Option<String>,

    /// Chat completions endpoint
    #[serde(default = "default_openrouter_api_url")]
    pub openrouter_api_url: String,
    /// Site URL for `OpenRouter` identification
    #[serde(default)]
    pub openrouter_site_url: String,
    /// Site name for `OpenRouter` identification
    #[serde(default = "default_openrouter_site_name")]
    pub openrouter_site_name: String,

    /// Model identifier sent in the request body
    #[serde(default = "default_figurine_model")]
    pub figurine_model: String,
    /// `max_tokens` sent in the request body
    #[serde(default = "default_figurine_max_tokens")]
    pub figurine_max_tokens: u32,

    /// Timeout applied to every outbound HTTP call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Route outbound HTTP through `proxy_url`
    #[serde(default)]
    pub use_proxy: bool,
    /// Proxy for all schemes, used only when `use_proxy` is set
    pub proxy_url: Option<String>,

    /// Templated avatar URL with an `{id}` placeholder
    #[serde(default = "default_avatar_url_template")]
    pub avatar_url_template: String,

    /// Directory for the key file and generated images
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_openrouter_api_url() -> String {
    OPENROUTER_API_URL.to_string()
}

fn default_openrouter_site_name() -> String {
    "Figurine Bot".to_string()
}

fn default_figurine_model() -> String {
    DEFAULT_FIGURINE_MODEL.to_string()
}

const fn default_figurine_max_tokens() -> u32 {
    DEFAULT_FIGURINE_MAX_TOKENS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_avatar_url_template() -> String {
    DEFAULT_AVATAR_URL_TEMPLATE.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use figurine_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP_USE_PROXY=true ./target/figurine-bot` sets `use_proxy`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables, empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Returns a set of Telegram IDs that may add and list API keys
    #[must_use]
    pub fn admin_users(&self) -> HashSet<i64> {
        self.admin_users_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Proxy URL to use, if proxying is enabled and configured
    #[must_use]
    pub fn effective_proxy(&self) -> Option<&str> {
        if !self.use_proxy {
            return None;
        }
        self.proxy_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Path of the key store document
    #[must_use]
    pub fn keys_file(&self) -> PathBuf {
        self.data_dir.join(KEYS_FILE_NAME)
    }
}

#[cfg(test)]
pub(crate) fn test_settings(data_dir: PathBuf) -> Settings {
    Settings {
        telegram_token: "dummy".to_string(),
        admin_users_str: None,
        openrouter_api_url: OPENROUTER_API_URL.to_string(),
        openrouter_site_url: String::new(),
        openrouter_site_name: String::new(),
        figurine_model: DEFAULT_FIGURINE_MODEL.to_string(),
        figurine_max_tokens: DEFAULT_FIGURINE_MAX_TOKENS,
        request_timeout_secs: 5,
        use_proxy: false,
        proxy_url: None,
        avatar_url_template: DEFAULT_AVATAR_URL_TEMPLATE.to_string(),
        data_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("FIGURINE_MAX_TOKENS", "2048");
        env::set_var("PROXY_URL", "");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.figurine_max_tokens, 2048);
        assert_eq!(settings.figurine_model, DEFAULT_FIGURINE_MODEL);
        // Empty env values are ignored
        assert_eq!(settings.proxy_url, None);

        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("FIGURINE_MAX_TOKENS");
        env::remove_var("PROXY_URL");
        Ok(())
    }

    #[test]
    fn test_admin_list_parsing() {
        let mut settings = test_settings(PathBuf::from(DEFAULT_DATA_DIR));

        settings.admin_users_str = Some("123,456".to_string());
        let admins = settings.admin_users();
        assert!(admins.contains(&123));
        assert!(admins.contains(&456));
        assert_eq!(admins.len(), 2);

        settings.admin_users_str = Some("333; 444 555".to_string());
        assert_eq!(settings.admin_users().len(), 3);

        settings.admin_users_str = Some("abc, 777".to_string());
        let admins = settings.admin_users();
        assert!(admins.contains(&777));
        assert_eq!(admins.len(), 1);
    }

    #[test]
    fn test_proxy_requires_flag() {
        let mut settings = test_settings(PathBuf::from(DEFAULT_DATA_DIR));
        settings.proxy_url = Some("http://127.0.0.1:7890".to_string());
        assert_eq!(settings.effective_proxy(), None);

        settings.use_proxy = true;
        assert_eq!(settings.effective_proxy(), Some("http://127.0.0.1:7890"));

        settings.proxy_url = Some(String::new());
        assert_eq!(settings.effective_proxy(), None);
    }

    #[test]
    fn test_keys_file_under_data_dir() {
        let settings = test_settings(PathBuf::from("/var/lib/figurine"));
        assert_eq!(
            settings.keys_file(),
            PathBuf::from("/var/lib/figurine/openrouter_keys.json")
        );
    }
}
