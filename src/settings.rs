//! Configuration for the portal client
//!
//! Settings are loaded once at startup from `Settings.toml` (when present)
//! with `STOM_*` environment variable overrides, and threaded through to
//! collaborators. The environment descriptor (relying-party id and backing
//! resource) is resolved from the active host name here, once, rather than
//! re-derived per call.

use std::fs;

use log::warn;
use serde::{Deserialize, Serialize};

/// Production portal host; also the fallback for unrecognized hosts
pub const PRODUCTION_HOST: &str = "sixtwoonemind.com";

/// Suffix identifying preview deployments, which get per-host credentials
pub const PREVIEW_HOST_SUFFIX: &str = ".portal-ar3.pages.dev";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortalSettings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub chat: ChatSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the job-execution backend
    pub base_url: String,
    /// Per-endpoint bearer token required by webhook-style deployments,
    /// distinct from the user's session token
    pub webhook_token: Option<String>,
    /// Host name the client is acting for; drives environment resolution
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path of the JSON state file backing the session store
    pub state_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Transport strategy: "direct" (run and wait) or "poll" (submit + poll)
    pub transport: String,
    /// Base delay between status polls, in milliseconds
    pub poll_base_interval_ms: u64,
    /// Poll attempts before the call fails with a timeout
    pub poll_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://viento.dev.sixtwoone.net/api/w/sixtwoonemind".to_string(),
            webhook_token: None,
            host: PRODUCTION_HOST.to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            state_path: "portal-state.json".to_string(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            transport: "direct".to_string(),
            poll_base_interval_ms: 1000,
            poll_max_attempts: 30,
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

impl PortalSettings {
    /// Load settings from `Settings.toml` and environment variables
    ///
    /// Also initializes the logger. Priority, highest first: `STOM_*`
    /// environment variables, `Settings.toml` in the current directory,
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `Settings.toml` exists but cannot be read or
    /// parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        // RUST_LOG still wins over the configured level
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&settings.logging.level),
        )
        .try_init()
        .ok();

        Ok(settings)
    }

    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::path::PathBuf::from("Settings.toml");
        if config_path.exists() {
            let toml_content = fs::read_to_string(&config_path)?;
            Ok(basic_toml::from_str(&toml_content)?)
        } else {
            Ok(Self::default())
        }
    }

    fn apply_env_overrides(settings: &mut Self) {
        if let Ok(base_url) = std::env::var("STOM_API_BASE_URL") {
            settings.api.base_url = base_url;
        }
        if let Ok(token) = std::env::var("STOM_WEBHOOK_TOKEN") {
            settings.api.webhook_token = Some(token);
        }
        if let Ok(host) = std::env::var("STOM_HOST") {
            settings.api.host = host;
        }
        if let Ok(path) = std::env::var("STOM_STATE_PATH") {
            settings.storage.state_path = path;
        }
        if let Ok(transport) = std::env::var("STOM_CHAT_TRANSPORT") {
            settings.chat.transport = transport;
        }
        if let Ok(level) = std::env::var("STOM_LOG_LEVEL") {
            settings.logging.level = level;
        }
    }

    /// Environment descriptor for the configured host
    #[must_use]
    pub fn environment(&self) -> Environment {
        Environment::resolve(&self.api.host)
    }
}

/// Which backing resource an environment's handshake requests target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingResource {
    /// The production project
    Production,
    /// The per-preview project slice
    Preview,
}

/// Typed environment descriptor, decided once from the active host name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Relying-party identifier credentials are scoped to
    pub relying_party_id: String,
    /// Backing resource handshake requests are routed to
    pub backing_resource: BackingResource,
}

impl Environment {
    /// Map a host name to its environment
    ///
    /// Total by construction: the production host and preview hosts map to
    /// themselves, anything else degrades to the production environment with
    /// a logged warning rather than failing.
    #[must_use]
    pub fn resolve(host: &str) -> Self {
        match host {
            PRODUCTION_HOST | "www.sixtwoonemind.com" => Self::production(),
            preview if preview.ends_with(PREVIEW_HOST_SUFFIX) => Self {
                relying_party_id: preview.to_string(),
                backing_resource: BackingResource::Preview,
            },
            other => {
                warn!("Unrecognized host {other}, falling back to production environment");
                Self::production()
            }
        }
    }

    /// Resolve from a full origin URL rather than a bare host name
    ///
    /// Unparseable origins degrade to production, like unrecognized hosts.
    #[must_use]
    pub fn from_origin(origin: &str) -> Self {
        let host = url::Url::parse(origin)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string));
        match host {
            Some(host) => Self::resolve(&host),
            None => {
                warn!("Unparseable origin {origin:?}, falling back to production environment");
                Self::production()
            }
        }
    }

    #[must_use]
    pub fn production() -> Self {
        Self {
            relying_party_id: PRODUCTION_HOST.to_string(),
            backing_resource: BackingResource::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn production_host_maps_to_itself() {
        let env = Environment::resolve("sixtwoonemind.com");
        assert_eq!(env.relying_party_id, "sixtwoonemind.com");
        assert_eq!(env.backing_resource, BackingResource::Production);

        let www = Environment::resolve("www.sixtwoonemind.com");
        assert_eq!(www.relying_party_id, "sixtwoonemind.com");
    }

    #[test]
    fn preview_host_maps_to_full_host() {
        let env = Environment::resolve("foo.portal-ar3.pages.dev");
        assert_eq!(env.relying_party_id, "foo.portal-ar3.pages.dev");
        assert_eq!(env.backing_resource, BackingResource::Preview);
    }

    #[test]
    fn unrecognized_host_falls_back_to_production() {
        let env = Environment::resolve("evil.example.net");
        assert_eq!(env.relying_party_id, "sixtwoonemind.com");
        assert_eq!(env.backing_resource, BackingResource::Production);

        // Total even for degenerate input
        let empty = Environment::resolve("");
        assert_eq!(empty.relying_party_id, "sixtwoonemind.com");
    }

    #[test]
    fn origin_resolution_extracts_the_host() {
        let env = Environment::from_origin("https://foo.portal-ar3.pages.dev/chat.html");
        assert_eq!(env.relying_party_id, "foo.portal-ar3.pages.dev");

        let junk = Environment::from_origin("not a url");
        assert_eq!(junk.relying_party_id, "sixtwoonemind.com");
    }

    #[test]
    fn defaults_use_direct_transport() {
        let settings = PortalSettings::default();
        assert_eq!(settings.chat.transport, "direct");
        assert_eq!(settings.chat.poll_base_interval_ms, 1000);
        assert_eq!(settings.chat.poll_max_attempts, 30);
        assert_eq!(settings.api.host, PRODUCTION_HOST);
    }

    #[test]
    #[serial]
    fn env_overrides_take_precedence() {
        std::env::set_var("STOM_API_BASE_URL", "https://staging.example.com/api");
        std::env::set_var("STOM_CHAT_TRANSPORT", "poll");

        let mut settings = PortalSettings::default();
        PortalSettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.api.base_url, "https://staging.example.com/api");
        assert_eq!(settings.chat.transport, "poll");

        std::env::remove_var("STOM_API_BASE_URL");
        std::env::remove_var("STOM_CHAT_TRANSPORT");
    }
}
