//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for a loader.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// HTTP transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Ordered middleware chain. Order here is invocation order.
    pub params: Vec<ParamConfig>,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total request timeout in seconds. Unset means the body may stream
    /// for as long as the server keeps sending.
    pub request_timeout_secs: Option<u64>,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Honour proxy settings from the environment (`HTTP_PROXY`, ...).
    pub system_proxy: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            user_agent: concat!("url-loader/", env!("CARGO_PKG_VERSION")).to_string(),
            system_proxy: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// One middleware entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamConfig {
    /// Add request headers. A name may carry one value or a list.
    Headers {
        values: BTreeMap<String, HeaderValues>,
    },

    /// Enforce body size.
    Size {
        /// Exact size the body must have once the stream ends.
        #[serde(default)]
        expected: Option<u64>,

        /// Upper bound checked while streaming.
        #[serde(default)]
        max: Option<u64>,
    },
}

/// Values configured for one header name, in send order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValues::One(value) => std::slice::from_ref(value),
            HeaderValues::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, HeaderValues::Many(values) if values.is_empty())
    }

    /// Append another value, keeping the existing ones.
    pub fn push(&mut self, value: String) {
        match self {
            HeaderValues::One(first) => {
                let first = std::mem::take(first);
                *self = HeaderValues::Many(vec![first, value]);
            }
            HeaderValues::Many(values) => values.push(value),
        }
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        HeaderValues::One(value)
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        HeaderValues::One(value.to_string())
    }
}

impl ParamConfig {
    /// Short name used in logs and validation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamConfig::Headers { .. } => "headers",
            ParamConfig::Size { .. } => "size",
        }
    }
}
