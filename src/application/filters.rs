//! Named filters through which plugins contribute navigation pages.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::config::PluginConfig;
use crate::domain::PageDescriptor;

/// Filter (and option) name of the public main navigation.
pub const PUBLIC_NAVIGATION_MAIN: &str = "public_navigation_main";

/// Transforms the list of page descriptors passed through a filter.
pub trait PageFilter: Send + Sync {
    fn apply(&self, pages: Vec<PageDescriptor>) -> Vec<PageDescriptor>;
}

impl<F> PageFilter for F
where
    F: Fn(Vec<PageDescriptor>) -> Vec<PageDescriptor> + Send + Sync,
{
    fn apply(&self, pages: Vec<PageDescriptor>) -> Vec<PageDescriptor> {
        self(pages)
    }
}

/// A plugin's fixed page list, appended to whatever the filter receives.
#[derive(Debug, Clone)]
pub struct ContributedPages {
    pub plugin: String,
    pub pages: Vec<PageDescriptor>,
}

impl PageFilter for ContributedPages {
    fn apply(&self, mut pages: Vec<PageDescriptor>) -> Vec<PageDescriptor> {
        debug!(plugin = %self.plugin, count = self.pages.len(), "contributing pages");
        pages.extend(self.pages.iter().cloned());
        pages
    }
}

/// Registry mapping a filter name to its handlers, run in registration order.
#[derive(Default)]
pub struct FilterRegistry {
    filters: BTreeMap<String, Vec<Box<dyn PageFilter>>>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .filters
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("FilterRegistry").field("filters", &counts).finish()
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one [`ContributedPages`] handler per enabled plugin.
    pub fn from_plugins(plugins: &[PluginConfig]) -> Self {
        let mut registry = Self::new();
        for plugin in plugins.iter().filter(|p| p.enabled) {
            registry.register(
                &plugin.filter,
                ContributedPages {
                    plugin: plugin.name.clone(),
                    pages: plugin.pages.clone(),
                },
            );
        }
        registry
    }

    pub fn register(&mut self, name: &str, filter: impl PageFilter + 'static) -> &mut Self {
        self.filters
            .entry(name.to_string())
            .or_default()
            .push(Box::new(filter));
        self
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.filters.get(name).map_or(0, Vec::len)
    }

    /// Pass `pages` through every handler registered for `name`.
    pub fn apply(&self, name: &str, pages: Vec<PageDescriptor>) -> Vec<PageDescriptor> {
        match self.filters.get(name) {
            Some(handlers) => handlers
                .iter()
                .fold(pages, |pages, handler| handler.apply(pages)),
            None => pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pages: &[PageDescriptor]) -> Vec<&str> {
        pages.iter().map(|p| p.label.as_str()).collect()
    }

    #[test]
    fn test_apply_runs_handlers_in_registration_order() {
        let mut registry = FilterRegistry::new();
        registry
            .register("nav", |mut pages: Vec<PageDescriptor>| {
                pages.push(PageDescriptor::uri("first", "/1"));
                pages
            })
            .register("nav", |mut pages: Vec<PageDescriptor>| {
                pages.retain(|p| p.label != "seed");
                pages.push(PageDescriptor::uri("second", "/2"));
                pages
            });

        let out = registry.apply("nav", vec![PageDescriptor::uri("seed", "/0")]);

        assert_eq!(labels(&out), vec!["first", "second"]);
        assert_eq!(registry.handler_count("nav"), 2);
    }

    #[test]
    fn test_apply_unknown_filter_returns_input() {
        let registry = FilterRegistry::new();
        let out = registry.apply("missing", vec![PageDescriptor::uri("seed", "/0")]);
        assert_eq!(labels(&out), vec!["seed"]);
    }

    #[test]
    fn test_from_plugins_skips_disabled_plugins() {
        let plugins = vec![
            PluginConfig {
                name: "exhibits".into(),
                pages: vec![PageDescriptor::uri("Exhibits", "/exhibits")],
                ..PluginConfig::default()
            },
            PluginConfig {
                name: "old".into(),
                enabled: false,
                pages: vec![PageDescriptor::uri("Old", "/old")],
                ..PluginConfig::default()
            },
        ];

        let registry = FilterRegistry::from_plugins(&plugins);

        assert_eq!(registry.handler_count(PUBLIC_NAVIGATION_MAIN), 1);
        let out = registry.apply(PUBLIC_NAVIGATION_MAIN, Vec::new());
        assert_eq!(labels(&out), vec!["Exhibits"]);
    }
}
