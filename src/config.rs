//! Client Configuration
//!
//! Service location, headers sent with every request and paging limits.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service root (default: "http://localhost:8080/odata")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Headers added to every request
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Largest accepted `top` (default: 1000)
    #[serde(default = "default_max_top")]
    pub max_top: usize,

    /// Page size of the mock engine when no `top` is given (default: 100)
    #[serde(default = "default_top")]
    pub default_top: usize,
}

fn default_base_url() -> String {
    "http://localhost:8080/odata".to_string()
}

fn default_max_top() -> usize {
    1000
}

fn default_top() -> usize {
    crate::query::DEFAULT_TOP
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_headers: BTreeMap::new(),
            max_top: default_max_top(),
            default_top: default_top(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load a JSON config file; absent fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ClientError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::Configuration(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Absolute URL of a resource path below the service root
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        self.default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Joins `base` and `path` with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => path.to_string(),
        (false, false) => format!("{}/{}", base, path),
    }
}
