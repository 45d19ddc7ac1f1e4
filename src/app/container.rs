//! Dependency container wiring a store and a configuration into an assistant.

use std::{path::PathBuf, sync::Arc};

use super::config::AssistantConfig;
use crate::{
    Result,
    adapters::{InMemoryStore, MsgPackStore},
    assistant::Assistant,
    ports::ChallengeStore,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use nudge::app::{App, AssistantConfig};
///
/// let app = App::with_store_file("store.msgpack", AssistantConfig::default());
/// let assistant = app.assistant()?;
/// # Ok::<(), nudge::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use nudge::app::App;
/// use nudge::adapters::InMemoryStore;
///
/// let app = App::for_testing()
///     .with_store(InMemoryStore::new())
///     .with_seed(42)
///     .build();
/// assert_eq!(app.config().seed, 42);
/// ```
pub struct App {
    store: Arc<dyn ChallengeStore + Send + Sync>,
    config: AssistantConfig,
}

impl App {
    pub fn new(store: Arc<dyn ChallengeStore + Send + Sync>, config: AssistantConfig) -> Self {
        Self { store, config }
    }

    /// App backed by a MessagePack store file.
    pub fn with_store_file(path: impl Into<PathBuf>, config: AssistantConfig) -> Self {
        Self::new(Arc::new(MsgPackStore::new(path)), config)
    }

    /// Builder defaulting to an empty in-memory store.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn store(&self) -> Arc<dyn ChallengeStore + Send + Sync> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Assistant sharing this app's store.
    pub fn assistant(&self) -> Result<Assistant> {
        Assistant::new(self.store(), self.config.clone())
    }
}

/// Builder for constructing an app with custom dependencies.
pub struct AppBuilder {
    store: Option<Arc<dyn ChallengeStore + Send + Sync>>,
    config: AssistantConfig,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            config: AssistantConfig::default(),
        }
    }

    pub fn with_store<S: ChallengeStore + Send + Sync + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn with_config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the seed of the configuration.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build the app; without a store an empty `InMemoryStore` is used.
    pub fn build(self) -> App {
        App {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            config: self.config,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_seed_to_config() {
        let app = App::for_testing().with_seed(7).build();
        assert_eq!(app.config().seed, 7);
        assert!(app.assistant().is_ok());
    }

    #[test]
    fn invalid_config_fails_when_building_the_assistant() {
        let app = App::for_testing()
            .with_config(AssistantConfig::default().with_jitter(-1.0))
            .build();
        assert!(app.assistant().is_err());
    }

    #[test]
    fn store_is_shared_with_the_assistant() {
        let store = InMemoryStore::new();
        store.add_user("alice");
        let app = App::for_testing().with_store(store.clone()).build();
        assert!(app.store().challenges("alice").unwrap().is_empty());
    }
}
