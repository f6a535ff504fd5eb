//! Process configuration from the environment.

use crate::store::StoreConfig;
use crate::upstream::DigitransitConfig;

/// Environment variable holding the Digitransit subscription key.
pub const API_KEY_VAR: &str = "DIGITRANSIT_API_KEY";

/// Environment variable overriding the GraphQL endpoint.
pub const API_URL_VAR: &str = "DIGITRANSIT_URL";

/// Environment variable holding the sqlx database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Errors from loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Everything the binary needs to build a repository.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream: DigitransitConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let mut upstream = DigitransitConfig::new(api_key);
        if let Some(url) = get(API_URL_VAR) {
            upstream = upstream.with_base_url(url);
        }

        let store = match get(DATABASE_URL_VAR) {
            Some(url) => StoreConfig::new(url),
            None => StoreConfig::default(),
        };

        Ok(Self { upstream, store })
    }
}
