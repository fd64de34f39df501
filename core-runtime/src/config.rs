//! # Sync Configuration
//!
//! A [`SyncConfig`] is built once at startup, either through
//! [`SyncConfig::builder`] or from the JSON plugin options the build host
//! passes in ([`SyncConfig::from_options`]). Both paths end in
//! [`SyncConfig::validate`], so malformed input is rejected before any
//! component is constructed or any request is sent.
//!
//! ## Plugin options
//!
//! ```json
//! {
//!   "url": "https://cms.example.com",
//!   "auth": { "email": "editor@example.com", "password": "secret" },
//!   "type": { "name": "DirectusData", "field": "directus" },
//!   "dev": { "refresh": "5m" },
//!   "graphql": { "batch": true },
//!   "concurrency": 10,
//!   "retries": 5
//! }
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncConfig;
//!
//! let config = SyncConfig::builder()
//!     .url("https://cms.example.com")
//!     .token("static-token")
//!     .concurrency(20)
//!     .build()?;
//! ```

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use bridge_traits::http::RetryPolicy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Page size and per-batch parallelism when none is configured
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Attempts per request when none is configured
pub const DEFAULT_RETRIES: u32 = 5;

/// Credential used to authenticate against the remote API.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Unauthenticated; requests carry no `Authorization` header
    #[default]
    None,
    /// Static access token adopted as-is
    Token(String),
    /// Exchanged for a session token at startup
    Password { email: String, password: String },
}

impl Credentials {
    pub fn is_none(&self) -> bool {
        matches!(self, Credentials::None)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
            Credentials::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Type and field names the two datasets are exposed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetNames {
    pub type_name: String,
    pub field_name: String,
    pub system_type_name: String,
    pub system_field_name: String,
}

impl Default for DatasetNames {
    fn default() -> Self {
        Self {
            type_name: "DirectusData".to_string(),
            field_name: "directus".to_string(),
            system_type_name: "DirectusSystemData".to_string(),
            system_field_name: "directus_system".to_string(),
        }
    }
}

/// Callable producing extra request headers on demand
pub type HeaderFn = Arc<dyn Fn() -> HashMap<String, String> + Send + Sync>;

/// User-supplied headers merged into every request.
#[derive(Clone)]
pub enum HeaderSource {
    Static(HashMap<String, String>),
    /// Evaluated on every `headers()` call
    Dynamic(HeaderFn),
}

impl HeaderSource {
    pub fn resolve(&self) -> HashMap<String, String> {
        match self {
            HeaderSource::Static(map) => map.clone(),
            HeaderSource::Dynamic(source) => source(),
        }
    }
}

impl PartialEq for HeaderSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeaderSource::Static(a), HeaderSource::Static(b)) => a == b,
            (HeaderSource::Dynamic(a), HeaderSource::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for HeaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderSource::Static(map) => {
                f.debug_tuple("Static").field(&map.keys().collect::<Vec<_>>()).finish()
            }
            HeaderSource::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// Validated sync configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Root URL of the remote instance, as configured
    pub url: String,
    pub credentials: Credentials,
    pub names: DatasetNames,
    /// Page size of the file listing and parallel downloads per batch
    pub concurrency: usize,
    /// Attempts per request, including the first
    pub retries: u32,
    pub headers: Option<HeaderSource>,
    /// Development refetch interval in whole seconds
    pub refresh_interval: Option<u64>,
    /// Options forwarded untouched to the schema delegator
    pub passthrough: serde_json::Value,
}

impl SyncConfig {
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Build a configuration from the host's JSON plugin options.
    pub fn from_options(options: serde_json::Value) -> Result<Self> {
        let options: PluginOptions = serde_json::from_value(options)
            .map_err(|e| Error::Config(format!("Invalid plugin options: {}", e)))?;

        let credentials = match options.auth {
            None => Credentials::None,
            Some(auth) => auth.into_credentials()?,
        };

        let mut names = DatasetNames::default();
        if let Some(overrides) = options.type_names {
            if let Some(name) = overrides.name {
                names.type_name = name;
            }
            if let Some(field) = overrides.field {
                names.field_name = field;
            }
            if let Some(name) = overrides.system_name {
                names.system_type_name = name;
            }
            if let Some(field) = overrides.system_field {
                names.system_field_name = field;
            }
        }

        let refresh_interval = options
            .dev
            .and_then(|dev| dev.refresh)
            .map(|setting| setting.to_seconds())
            .transpose()?;

        let config = SyncConfig {
            url: options.url,
            credentials,
            names,
            concurrency: options.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            retries: options.retries.unwrap_or(DEFAULT_RETRIES),
            headers: options.headers.map(HeaderSource::Static),
            refresh_interval,
            passthrough: options.graphql.unwrap_or(serde_json::Value::Null),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The root URL is an absolute http(s) URL
    /// - A static token is not empty
    /// - Email and password are both present and non-empty
    /// - Concurrency and retries are at least 1
    /// - Dataset names are not empty
    pub fn validate(&self) -> Result<()> {
        Endpoints::resolve(&self.url)?;

        match &self.credentials {
            Credentials::None => {}
            Credentials::Token(token) => {
                if token.trim().is_empty() {
                    return Err(Error::Config("Auth token cannot be empty".to_string()));
                }
            }
            Credentials::Password { email, password } => {
                if email.trim().is_empty() || password.is_empty() {
                    return Err(Error::Config(
                        "Email and password must both be provided and non-empty".to_string(),
                    ));
                }
            }
        }

        if self.concurrency == 0 {
            return Err(Error::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.retries == 0 {
            return Err(Error::Config("Retries must be greater than 0".to_string()));
        }

        if self.refresh_interval == Some(0) {
            return Err(Error::Config(
                "Refresh interval must be at least 1 second".to_string(),
            ));
        }

        let names = [
            &self.names.type_name,
            &self.names.field_name,
            &self.names.system_type_name,
            &self.names.system_field_name,
        ];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::Config(
                "Dataset type and field names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries)
    }
}

/// Builder for [`SyncConfig`]
#[derive(Default)]
pub struct SyncConfigBuilder {
    url: Option<String>,
    credentials: Credentials,
    names: Option<DatasetNames>,
    concurrency: Option<usize>,
    retries: Option<u32>,
    headers: Option<HeaderSource>,
    refresh_interval: Option<RefreshSetting>,
    passthrough: Option<serde_json::Value>,
}

impl SyncConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Credentials::Token(token.into());
        self
    }

    pub fn email_password(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::Password {
            email: email.into(),
            password: password.into(),
        };
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn names(mut self, names: DatasetNames) -> Self {
        self.names = Some(names);
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn headers(mut self, headers: HeaderSource) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn refresh_interval_secs(mut self, seconds: u64) -> Self {
        self.refresh_interval = Some(RefreshSetting::Seconds(seconds));
        self
    }

    /// Duration string such as `"90s"` or `"5m"`, parsed at `build()`
    pub fn refresh_interval(mut self, duration: impl Into<String>) -> Self {
        self.refresh_interval = Some(RefreshSetting::Text(duration.into()));
        self
    }

    pub fn passthrough(mut self, options: serde_json::Value) -> Self {
        self.passthrough = Some(options);
        self
    }

    pub fn build(self) -> Result<SyncConfig> {
        let url = self
            .url
            .ok_or_else(|| Error::Config("Root URL is required. Use .url() to set it.".to_string()))?;

        let refresh_interval = self
            .refresh_interval
            .map(|setting| setting.to_seconds())
            .transpose()?;

        let config = SyncConfig {
            url,
            credentials: self.credentials,
            names: self.names.unwrap_or_default(),
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            retries: self.retries.unwrap_or(DEFAULT_RETRIES),
            headers: self.headers,
            refresh_interval,
            passthrough: self.passthrough.unwrap_or(serde_json::Value::Null),
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct PluginOptions {
    url: String,
    #[serde(default)]
    auth: Option<AuthOptions>,
    #[serde(default, rename = "type")]
    type_names: Option<TypeOptions>,
    #[serde(default)]
    dev: Option<DevOptions>,
    #[serde(default)]
    graphql: Option<serde_json::Value>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(default)]
    retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthOptions {
    token: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl AuthOptions {
    fn into_credentials(self) -> Result<Credentials> {
        match (self.token, self.email, self.password) {
            (None, None, None) => Ok(Credentials::None),
            (Some(token), None, None) => Ok(Credentials::Token(token)),
            (None, Some(email), Some(password)) => Ok(Credentials::Password { email, password }),
            (Some(_), _, _) => Err(Error::Config(
                "auth.token cannot be combined with auth.email/auth.password".to_string(),
            )),
            (None, _, _) => Err(Error::Config(
                "auth.email and auth.password must be provided together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TypeOptions {
    name: Option<String>,
    field: Option<String>,
    system_name: Option<String>,
    system_field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DevOptions {
    refresh: Option<RefreshSetting>,
}

/// Refresh interval as it appears in the options: seconds or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RefreshSetting {
    Seconds(u64),
    Text(String),
}

impl RefreshSetting {
    pub fn to_seconds(&self) -> Result<u64> {
        match self {
            RefreshSetting::Seconds(0) => Err(Error::Config(
                "Refresh interval must be at least 1 second".to_string(),
            )),
            RefreshSetting::Seconds(secs) => Ok(*secs),
            RefreshSetting::Text(text) => parse_refresh_interval(text),
        }
    }
}

/// Parse a refresh interval into whole seconds.
///
/// Accepts a bare number of seconds or a number followed by one of
/// `ms`, `s`, `m`, `h`, `d`, `w`. Sub-second values round up to 1.
pub fn parse_refresh_interval(input: &str) -> Result<u64> {
    let s = input.trim().to_ascii_lowercase();
    let invalid = || Error::Config(format!("Invalid refresh interval '{}'", input));

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().map_err(|_| invalid())?;

    let millis_per_unit = match unit.trim() {
        "" | "s" => 1_000.0,
        "ms" => 1.0,
        "m" => 60_000.0,
        "h" => 3_600_000.0,
        "d" => 86_400_000.0,
        "w" => 604_800_000.0,
        _ => return Err(invalid()),
    };

    let millis = value * millis_per_unit;
    if !millis.is_finite() || millis <= 0.0 {
        return Err(Error::Config(
            "Refresh interval must be greater than 0".to_string(),
        ));
    }

    Ok(((millis / 1_000.0).round() as u64).max(1))
}
