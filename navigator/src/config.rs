use crate::error::NavigatorError;
use crate::error::Result;
use crate::navigator::ResortPolicy;
use obsnav_protocol::Direction;
use obsnav_protocol::OBSERVATIONS_OTYPE;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Query;
use obsnav_protocol::SortKey;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Configuration for one navigator and the transport it talks through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Base URL of the server holding the collection
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Collection type to browse and to match notifications against
    #[serde(default = "default_otype")]
    pub otype: String,

    /// Quiet period before a burst of filter edits triggers a recount
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// What happens to the cursor after the ordering changes
    #[serde(default)]
    pub resort_policy: ResortPolicy,

    /// Path of the server-sent events feed, relative to `server_url`
    #[serde(default = "default_events_path")]
    pub events_path: String,

    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    #[serde(default = "default_reconnect_multiplier")]
    pub reconnect_multiplier: f64,

    /// HTTP basic credentials
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Query and record shown when the navigator starts
    #[serde(default)]
    pub initial: InitialView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub search: String,
    pub sort: SortKey,
    pub direction: Direction,
    pub oid: Option<ObjectId>,
}

impl InitialView {
    pub fn query(&self) -> Query {
        Query::new(self.search.clone(), self.sort, self.direction)
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:4000".to_string()
}

fn default_otype() -> String {
    OBSERVATIONS_OTYPE.to_string()
}

fn default_quiet_period_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_events_path() -> String {
    "/events".to_string()
}

fn default_reconnect_initial_ms() -> u64 {
    500
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

fn default_reconnect_multiplier() -> f64 {
    2.0
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            otype: default_otype(),
            quiet_period_ms: default_quiet_period_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            resort_policy: ResortPolicy::default(),
            events_path: default_events_path(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_multiplier: default_reconnect_multiplier(),
            username: None,
            password: None,
            initial: InitialView::default(),
        }
    }
}

impl NavigatorConfig {
    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        let url = Url::parse(&self.server_url)
            .map_err(|err| format!("Invalid server URL {}: {err}", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Unsupported URL scheme: {}", url.scheme()));
        }

        if self.otype.trim().is_empty() {
            return Err("Collection type must not be empty".to_string());
        }

        if self.quiet_period_ms == 0 {
            return Err("Quiet period must be > 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be > 0".to_string());
        }

        if !self.reconnect_multiplier.is_finite() || self.reconnect_multiplier < 1.0 {
            return Err("Reconnect multiplier must be a finite number >= 1.0".to_string());
        }

        if self.reconnect_initial_ms > self.reconnect_max_ms {
            return Err("Initial reconnect delay exceeds the maximum".to_string());
        }

        if self.password.is_some() && self.username.is_none() {
            return Err("A password was configured without a username".to_string());
        }

        Ok(())
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.server_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn events_url(&self) -> Result<Url> {
        let relative = self.events_path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(NavigatorError::Config(
                "events path must not be empty".to_string(),
            ));
        }
        Ok(self.base_url()?.join(relative)?)
    }
}
