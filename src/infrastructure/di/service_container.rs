//! Service container for dependency injection
//!
//! Wires the navigation service to the configured option store and plugins.

use std::sync::Arc;

use crate::application::services::NavigationService;
use crate::application::FilterRegistry;
use crate::config::Settings;
use crate::infrastructure::store::FileOptionStore;
use crate::infrastructure::traits::{FileSystem, OptionStore, RealFileSystem};

/// Container holding the settings and I/O boundaries of one invocation.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Option store holding persisted navigations
    pub store: Arc<dyn OptionStore>,
}

impl ServiceContainer {
    /// Create a container backed by the file store at `settings.store_path`.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(FileOptionStore::new(fs.clone(), settings.store_path.clone()));
        Self::with_deps(settings, fs, store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn OptionStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, store }
    }

    /// Navigation service with one filter handler per enabled plugin.
    pub fn navigation_service(&self) -> NavigationService {
        let registry = FilterRegistry::from_plugins(&self.settings.plugins);
        NavigationService::new(registry, self.store.clone())
            .with_base_url(self.settings.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PUBLIC_NAVIGATION_MAIN;
    use crate::config::PluginConfig;
    use crate::domain::PageDescriptor;
    use crate::infrastructure::traits::MemoryOptionStore;

    #[test]
    fn test_navigation_service_registers_enabled_plugins() {
        let settings = Settings {
            base_url: "/omeka".into(),
            plugins: vec![PluginConfig {
                name: "exhibits".into(),
                pages: vec![PageDescriptor::route("Exhibits", "exhibits", "browse")],
                ..PluginConfig::default()
            }],
            ..Settings::default()
        };
        let container = ServiceContainer::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(MemoryOptionStore::new()),
        );

        let service = container.navigation_service();
        let nav = service
            .create_navigation_from_filter(PUBLIC_NAVIGATION_MAIN)
            .unwrap();

        assert_eq!(service.registry().handler_count(PUBLIC_NAVIGATION_MAIN), 1);
        assert!(nav.get_page_by_uid("/omeka/exhibits/browse").is_some());
    }
}
