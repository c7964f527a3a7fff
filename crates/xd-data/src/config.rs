//! Tree-wide configuration.

use serde::Deserialize;

use crate::error::{ErrorKind, XdError};

/// Settings shared by a tree and every context built for it.
///
/// ```
/// use xd_data::Config;
///
/// let config = Config::from_toml_str("locale = \"de-DE\"").unwrap();
/// assert_eq!(config.locale, "de-DE");
/// assert_eq!(config.max_definition_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale reported when a request does not ask for one.
    pub locale: String,
    /// Bound on nested prototype construction and instantiation.
    pub max_definition_depth: usize,
    pub write_lock_timeout_ms: u64,
    /// Maximum number of segments in a data path.
    pub max_path_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            locale: "en-US".to_string(),
            max_definition_depth: 32,
            write_lock_timeout_ms: 5000,
            max_path_length: xd_path::MAX_PATH_SEGMENTS,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, XdError> {
        toml::from_str(text).map_err(|e| {
            XdError::new(ErrorKind::ParamValueFormat, format!("bad configuration: {e}"))
        })
    }
}
