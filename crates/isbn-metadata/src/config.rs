//! TOML configuration for the metadata resolver
//!
//! Loaded from an explicit path or from `isbntools/config.toml` under the
//! platform config directory. Every key is optional:
//!
//! ```toml
//! [http]
//! user_agent = "isbntools-rs/0.1"
//! timeout_secs = 10
//!
//! [cache]
//! ttl_secs = 86400
//! max_entries = 10000
//!
//! [providers.goob]
//! enabled = true
//! priority = 10
//! timeout_secs = 10
//! ttl_secs = 86400
//!
//! [providers.openl]
//! priority = 20
//! base_url = "https://openlibrary.org/api/books"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::MetadataCache;
use crate::error::ConfigError;
use crate::http::native::DEFAULT_USER_AGENT;
use crate::http::HttpClient;
use crate::provider::{google_books, open_library, GoogleBooksProvider, OpenLibraryProvider, Provider};
use crate::registry::ProviderRegistry;
use crate::resolver::MetadataResolver;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            max_entries: None,
        }
    }
}

/// Per-provider overrides. Unset values fall back to the `[http]` timeout,
/// the `[cache]` TTL and the provider's built-in priority.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub priority: Option<i32>,
    pub timeout_secs: Option<u64>,
    pub ttl_secs: Option<u64>,
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: None,
            timeout_secs: None,
            ttl_secs: None,
            base_url: None,
        }
    }
}

/// Built-in providers and their default priorities
const BUILTIN_PROVIDERS: &[(&str, i32)] = &[(google_books::NAME, 10), (open_library::NAME, 20)];

impl ResolverConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(content)?;
        config.check_providers()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Default config file location, if the platform has a config directory
    pub fn standard_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("isbntools").join("config.toml"))
    }

    /// Load from the standard location. A missing file means defaults.
    pub fn load_standard() -> Result<Self, ConfigError> {
        match Self::standard_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn check_providers(&self) -> Result<(), ConfigError> {
        for name in self.providers.keys() {
            if !BUILTIN_PROVIDERS.iter().any(|(builtin, _)| *builtin == name.as_str()) {
                return Err(ConfigError::UnknownProvider(name.clone()));
            }
        }
        Ok(())
    }

    fn provider_settings(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    /// Registry holding every enabled built-in provider.
    pub fn registry(&self) -> Result<ProviderRegistry, ConfigError> {
        self.check_providers()?;
        let mut registry = ProviderRegistry::new();

        for &(name, default_priority) in BUILTIN_PROVIDERS {
            let settings = self.provider_settings(name);
            if !settings.enabled {
                tracing::debug!(provider = name, "provider disabled");
                continue;
            }

            let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(self.http.timeout_secs));
            let ttl = Duration::from_secs(settings.ttl_secs.unwrap_or(self.cache.ttl_secs));
            let provider: Arc<dyn Provider> = match name {
                google_books::NAME => {
                    let mut p = GoogleBooksProvider::new().with_timeout(timeout).with_cache_ttl(ttl);
                    if let Some(url) = settings.base_url {
                        p = p.with_base_url(url);
                    }
                    Arc::new(p)
                }
                _ => {
                    let mut p = OpenLibraryProvider::new().with_timeout(timeout).with_cache_ttl(ttl);
                    if let Some(url) = settings.base_url {
                        p = p.with_base_url(url);
                    }
                    Arc::new(p)
                }
            };

            let priority = settings.priority.unwrap_or(default_priority);
            registry.register(provider, priority)?;
        }

        Ok(registry)
    }

    pub fn cache(&self) -> MetadataCache {
        match self.cache.max_entries {
            Some(max) => MetadataCache::with_max_entries(max),
            None => MetadataCache::new(),
        }
    }

    /// Wire a resolver with the reqwest client and the enabled providers.
    pub fn build(&self) -> Result<MetadataResolver, ConfigError> {
        let http = HttpClient::new(&self.http.user_agent)?;
        Ok(MetadataResolver::with_cache(
            self.registry()?,
            Arc::new(http),
            self.cache(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["goob", "openl"]);
        let goob = registry.get("goob").unwrap();
        assert_eq!(goob.timeout(), Duration::from_secs(10));
        assert_eq!(goob.cache_ttl(), Duration::from_secs(86400));
    }

    #[test]
    fn test_priority_and_disable() {
        let config = ResolverConfig::from_toml_str(
            r#"
            [http]
            timeout_secs = 3

            [cache]
            ttl_secs = 60

            [providers.goob]
            priority = 30
            ttl_secs = 5

            [providers.openl]
            priority = 1
            "#,
        )
        .unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["openl", "goob"]);
        let openl = registry.get("openl").unwrap();
        assert_eq!(openl.timeout(), Duration::from_secs(3));
        assert_eq!(openl.cache_ttl(), Duration::from_secs(60));
        assert_eq!(registry.get("goob").unwrap().cache_ttl(), Duration::from_secs(5));

        let config = ResolverConfig::from_toml_str("[providers.goob]\nenabled = false\n").unwrap();
        assert_eq!(config.registry().unwrap().names(), vec!["openl"]);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = ResolverConfig::from_toml_str("[providers.worldcat]\npriority = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(name) if name == "worldcat"));
    }

    #[test]
    fn test_parse_error() {
        let err = ResolverConfig::from_toml_str("[cache\nttl_secs = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nuser_agent = \"test-agent/1.0\"\n[cache]\nmax_entries = 5").unwrap();

        let config = ResolverConfig::load(file.path()).unwrap();
        assert_eq!(config.http.user_agent, "test-agent/1.0");
        assert_eq!(config.cache.max_entries, Some(5));
        assert_eq!(config.http.timeout_secs, 10);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResolverConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
