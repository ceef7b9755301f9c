//! Link construction options
//!
//! Both construction forms (an options object, or positional arguments)
//! normalize through [`SyncOptions::normalize`] into one [`SyncConfig`].

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use wm_core::{ConfigError, MutationQueryMap, MutationRegistry};
use wm_data::CacheStore;

/// Behaviour switches for a watched-mutation link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkSettings {
    /// Emit diagnostic logs
    pub debug: bool,
    /// Never write to the cache, otherwise operate as normal
    pub read_only: bool,
}

impl LinkSettings {
    /// Parse settings from JSON, e.g. `{ "debug": true, "readOnly": false }`
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidSettings(e.to_string()))
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Object-form construction input
#[derive(Clone, Default)]
pub struct SyncOptions {
    pub cache: Option<Arc<dyn CacheStore>>,
    pub map: Option<MutationQueryMap>,
    pub settings: LinkSettings,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional-form construction input
    pub fn from_positional(
        cache: Arc<dyn CacheStore>,
        map: MutationQueryMap,
        debug: bool,
        read_only: bool,
    ) -> Self {
        Self {
            cache: Some(cache),
            map: Some(map),
            settings: LinkSettings { debug, read_only },
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_map(mut self, map: MutationQueryMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_settings(mut self, settings: LinkSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.settings.read_only = read_only;
        self
    }

    /// Validate and produce the canonical configuration
    pub fn normalize(self) -> Result<SyncConfig, ConfigError> {
        let cache = self.cache.ok_or(ConfigError::MissingCache)?;
        let map = self.map.ok_or(ConfigError::MissingMutationMap)?;
        let registry = MutationRegistry::new(map)?;

        Ok(SyncConfig {
            cache,
            registry,
            settings: self.settings,
        })
    }
}

/// Validated configuration consumed by the engine
#[derive(Clone)]
pub struct SyncConfig {
    pub cache: Arc<dyn CacheStore>,
    pub registry: MutationRegistry,
    pub settings: LinkSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wm_data::MemoryCache;

    fn map() -> MutationQueryMap {
        MutationQueryMap::new().watch("AddTodo", "GetTodos", |_| Ok(None))
    }

    #[test]
    fn test_default_settings() {
        let settings = LinkSettings::default();
        assert!(!settings.debug);
        assert!(!settings.read_only);
    }

    #[test]
    fn test_settings_from_json() {
        let settings = LinkSettings::from_json_str(r#"{ "readOnly": true }"#).unwrap();
        assert_eq!(settings, LinkSettings::default().with_read_only(true));

        assert!(matches!(
            LinkSettings::from_json_str(r#"{ "debug": "yes" }"#),
            Err(ConfigError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_both_forms_normalize_alike() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());

        let object = SyncOptions::new()
            .with_cache(cache.clone())
            .with_map(map())
            .with_debug(true)
            .normalize()
            .unwrap();
        let positional = SyncOptions::from_positional(cache, map(), true, false)
            .normalize()
            .unwrap();

        assert_eq!(object.settings, positional.settings);
        assert_eq!(object.registry.mutation_names(), positional.registry.mutation_names());
        assert!(std::ptr::addr_eq(Arc::as_ptr(&object.cache), Arc::as_ptr(&positional.cache)));
    }

    #[test]
    fn test_missing_parts_fail() {
        assert_eq!(
            SyncOptions::new().with_map(map()).normalize().err(),
            Some(ConfigError::MissingCache)
        );
        assert_eq!(
            SyncOptions::new()
                .with_cache(Arc::new(MemoryCache::new()))
                .normalize()
                .err(),
            Some(ConfigError::MissingMutationMap)
        );
    }
}
