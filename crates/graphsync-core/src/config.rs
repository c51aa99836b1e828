//! Engine configuration
//!
//! Loaded from TOML. Every field has a default except the two store
//! locations, which [`SyncConfig::validate`] requires.
//!
//! ```toml
//! context_endpoint = "http://localhost:7200/repositories/ws"
//! application_context = "http://example.org/application"
//! interface_language = "cs"
//! link_batch_size = 50
//!
//! [languages.cs]
//! label = "Čeština"
//! vocabularies_plural = "slovníky"
//! vocabularies_more_plural = "slovníků"
//! ```

use crate::error::SyncError;
use graphsync_model::{is_uri_shaped, Iri, WorkspaceSettings};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Vocabulary count at which the "more" plural form is used
pub const MORE_PLURAL_THRESHOLD: usize = 5;

/// A supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Display label
    pub label: String,
    /// Plural of "vocabulary" for counts below the threshold
    pub vocabularies_plural: String,
    /// Plural of "vocabulary" for counts at or above the threshold
    pub vocabularies_more_plural: String,
}

impl LanguageConfig {
    /// Create language entry
    #[must_use]
    pub fn new(label: &str, plural: &str, more_plural: &str) -> Self {
        Self {
            label: label.to_string(),
            vocabularies_plural: plural.to_string(),
            vocabularies_more_plural: more_plural.to_string(),
        }
    }

    /// Plural form for `count` vocabularies
    #[must_use]
    pub fn plural_for(&self, count: usize) -> &str {
        if count >= MORE_PLURAL_THRESHOLD {
            &self.vocabularies_more_plural
        } else {
            &self.vocabularies_plural
        }
    }
}

fn default_languages() -> IndexMap<String, LanguageConfig> {
    let mut languages = IndexMap::new();
    languages.insert(
        "cs".to_string(),
        LanguageConfig::new("Čeština", "slovníky", "slovníků"),
    );
    languages.insert(
        "en".to_string(),
        LanguageConfig::new("English", "vocabularies", "vocabularies"),
    );
    languages
}

/// Synchronisation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Query/update endpoint of the triple store
    pub context_endpoint: String,
    /// Graph holding diagrams, elements and links
    pub application_context: String,
    /// Graph holding the vocabulary cache index
    pub cache_context: Option<String>,
    /// Language used for synthesized labels
    pub interface_language: String,
    /// Supported languages
    pub languages: IndexMap<String, LanguageConfig>,
    /// Links per add transaction
    pub link_batch_size: usize,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            context_endpoint: String::new(),
            application_context: String::new(),
            cache_context: None,
            interface_language: "cs".to_string(),
            languages: default_languages(),
            link_batch_size: 50,
            request_timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Create configuration for a store
    #[must_use]
    pub fn new(context_endpoint: impl Into<String>, application_context: impl Into<String>) -> Self {
        Self {
            context_endpoint: context_endpoint.into(),
            application_context: application_context.into(),
            ..Self::default()
        }
    }

    /// With cache context
    #[inline]
    #[must_use]
    pub fn with_cache_context(mut self, cache_context: impl Into<String>) -> Self {
        self.cache_context = Some(cache_context.into());
        self
    }

    /// With interface language
    #[inline]
    #[must_use]
    pub fn with_interface_language(mut self, language: impl Into<String>) -> Self {
        self.interface_language = language.into();
        self
    }

    /// With link batch size
    #[inline]
    #[must_use]
    pub fn with_link_batch_size(mut self, size: usize) -> Self {
        self.link_batch_size = size;
        self
    }

    /// Parse TOML text and validate
    ///
    /// # Errors
    /// [`SyncError::Configuration`] on malformed TOML or failed validation.
    pub fn from_toml(text: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| SyncError::configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file and validate
    ///
    /// # Errors
    /// [`SyncError::Configuration`] when the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Self::from_toml(&text)
    }

    /// Check the startup preconditions
    ///
    /// # Errors
    /// [`SyncError::Configuration`] naming the first violated precondition.
    pub fn validate(&self) -> Result<(), SyncError> {
        if url::Url::parse(&self.context_endpoint).is_err() {
            return Err(SyncError::configuration(format!(
                "context endpoint {:?} is not a URL",
                self.context_endpoint
            )));
        }
        if !is_uri_shaped(&self.application_context) {
            return Err(SyncError::configuration(format!(
                "application context {:?} is not an IRI",
                self.application_context
            )));
        }
        if let Some(cache) = &self.cache_context {
            if !is_uri_shaped(cache) {
                return Err(SyncError::configuration(format!(
                    "cache context {cache:?} is not an IRI"
                )));
            }
        }
        self.ensure_language(&self.interface_language)?;
        if self.link_batch_size == 0 {
            return Err(SyncError::configuration("link batch size must be positive"));
        }
        Ok(())
    }

    /// Fail unless `language` is a supported language
    ///
    /// # Errors
    /// [`SyncError::Configuration`] for an unsupported language.
    pub fn ensure_language(&self, language: &str) -> Result<(), SyncError> {
        if self.languages.contains_key(language) {
            Ok(())
        } else {
            Err(SyncError::configuration(format!(
                "interface language {language:?} is not listed in the supported languages"
            )))
        }
    }

    /// Initial workspace settings for this store
    #[must_use]
    pub fn workspace_settings(&self) -> WorkspaceSettings {
        let mut settings =
            WorkspaceSettings::new(self.context_endpoint.clone(), self.application_context.as_str());
        settings.cache_context = self.cache_context.as_deref().map(Iri::from);
        settings.interface_language = self.interface_language.clone();
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> SyncConfig {
        SyncConfig::new("http://localhost:7200/repositories/ws", "http://example.org/app")
    }

    #[test]
    fn defaults_validate() {
        assert!(config().validate().is_ok());
        assert_eq!(config().link_batch_size, 50);
    }

    #[test]
    fn unsupported_language_is_fatal() {
        let err = config().with_interface_language("xx").validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn rejects_bad_contexts() {
        let bad_app = SyncConfig::new("http://localhost:7200", "application");
        assert!(bad_app.validate().is_err());
        let bad_cache = config().with_cache_context("cache");
        assert!(bad_cache.validate().is_err());
        assert!(config().with_link_batch_size(0).validate().is_err());
    }

    #[test]
    fn plural_threshold() {
        let cs = &default_languages()["cs"];
        assert_eq!(cs.plural_for(2), "slovníky");
        assert_eq!(cs.plural_for(4), "slovníky");
        assert_eq!(cs.plural_for(5), "slovníků");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
context_endpoint = "http://localhost:7200/repositories/ws"
application_context = "http://example.org/app"
cache_context = "http://example.org/cache"
interface_language = "en"
link_batch_size = 10
"#
        )
        .unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.link_batch_size, 10);
        assert_eq!(config.languages.len(), 2);

        let settings = config.workspace_settings();
        assert_eq!(settings.interface_language, "en");
        assert_eq!(
            settings.cache_context.as_ref().map(Iri::as_str),
            Some("http://example.org/cache")
        );
    }

    #[test]
    fn missing_file() {
        let err = SyncConfig::load("/nonexistent/graphsync.toml").unwrap_err();
        assert!(err.is_fatal());
    }
}
