//! Geocoder configuration and its fluent builder.

use crate::query::DEFAULT_LIMIT;

/// Configuration shared by every operation of one [`crate::Geocoder`].
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Backend index (or alias) the requests target.
    pub index: String,
    /// Result count used when a request supplies none.
    pub default_limit: usize,
    /// Preferred display language for localized fields; `None` keeps the
    /// index default.
    pub language: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            index: "bano".to_string(),
            default_limit: DEFAULT_LIMIT,
            language: None,
        }
    }
}

impl GeocoderConfig {
    pub fn builder() -> GeocoderConfigBuilder {
        GeocoderConfigBuilder::default()
    }
}

/// Builder with ergonomic defaults for [`GeocoderConfig`].
#[derive(Debug, Clone, Default)]
pub struct GeocoderConfigBuilder {
    config: GeocoderConfig,
}

impl GeocoderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a different backend index or alias.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.config.index = index.into();
        self
    }

    /// Default number of results when a request supplies no limit.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Preferred display language for localized fields.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = Some(language.into());
        self
    }

    pub fn build(self) -> GeocoderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GeocoderConfig::default();
        assert_eq!(config.index, "bano");
        assert_eq!(config.default_limit, 15);
        assert!(config.language.is_none());
    }

    #[test]
    fn builder_chains_overrides() {
        let config = GeocoderConfig::builder()
            .index("addresses-2026")
            .default_limit(5)
            .language("fr")
            .build();
        assert_eq!(config.index, "addresses-2026");
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.language.as_deref(), Some("fr"));
    }
}
