//! Navigation service
//!
//! Builds navigations from filters, reconciles them into a persisted tree and
//! moves that tree in and out of the option store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::error_ext::IoResultExt;
use crate::application::filters::{FilterRegistry, PUBLIC_NAVIGATION_MAIN};
use crate::application::ApplicationResult;
use crate::domain::{Container, Navigation, NodeId, PageDescriptor, PageOptions};
use crate::infrastructure::traits::OptionStore;

/// Outcome of reconciling a navigation with a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Uids of expired pages that were pruned
    pub pruned: Vec<String>,
    /// Uids of pages that were merged in as new, pre-order
    pub added: Vec<String>,
}

impl SyncReport {
    pub fn is_unchanged(&self) -> bool {
        self.pruned.is_empty() && self.added.is_empty()
    }
}

/// Service for filter-driven navigation maintenance.
pub struct NavigationService {
    registry: FilterRegistry,
    store: Arc<dyn OptionStore>,
    base_url: String,
}

impl NavigationService {
    pub fn new(registry: FilterRegistry, store: Arc<dyn OptionStore>) -> Self {
        Self {
            registry,
            store,
            base_url: String::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Empty navigation resolving hrefs against this service's base url.
    pub fn new_navigation(&self) -> Navigation {
        Navigation::with_base_url(self.base_url.clone())
    }

    /// Built-in pages seeded before a filter runs.
    pub fn default_pages(filter_name: &str) -> Vec<PageDescriptor> {
        match filter_name {
            PUBLIC_NAVIGATION_MAIN => vec![
                PageDescriptor::route("Browse Items", "items", "browse"),
                PageDescriptor::route("Browse Collections", "collections", "browse"),
            ],
            _ => Vec::new(),
        }
        .into_iter()
        .map(|mut page| {
            page.visible = Some(true);
            page
        })
        .collect()
    }

    /// Navigation holding what the filter currently contributes.
    ///
    /// Every page is marked non-deletable and added in filter order without
    /// deduplication.
    #[instrument(level = "debug", skip(self))]
    pub fn create_navigation_from_filter(&self, filter_name: &str) -> ApplicationResult<Navigation> {
        let filter_name = resolve_filter_name(filter_name);
        let pages = self
            .registry
            .apply(filter_name, Self::default_pages(filter_name));
        debug!("filter {} returned {} pages", filter_name, pages.len());

        let mut filter_nav = self.new_navigation();
        let options = PageOptions::filter_installed();
        for descriptor in pages {
            let tree = filter_nav.normalize_page(descriptor, &options)?;
            filter_nav.base_add_page(tree, Container::Root)?;
        }
        Ok(filter_nav)
    }

    /// Filter-installed pages of `nav` that the filter no longer contributes.
    pub fn expired_pages(&self, nav: &Navigation, filter_name: &str) -> ApplicationResult<Vec<NodeId>> {
        let filter_nav = self.create_navigation_from_filter(filter_name)?;
        Ok(nav.get_expired_pages_from_nav(&filter_nav))
    }

    /// Prune expired filter pages from `nav`, then merge the filter's pages in.
    #[instrument(level = "debug", skip(self, nav))]
    pub fn add_pages_from_filter(&self, nav: &mut Navigation, filter_name: &str) -> ApplicationResult<SyncReport> {
        let filter_nav = self.create_navigation_from_filter(filter_name)?;

        let expired = nav.get_expired_pages_from_nav(&filter_nav);
        let pruned: Vec<String> = expired
            .iter()
            .filter_map(|&id| nav.page(id).and_then(|page| page.uid.clone()))
            .collect();
        let before: HashSet<String> = nav.uids().into_iter().collect();
        nav.prune_pages(&expired);

        nav.merge_navigation(&filter_nav)?;

        let added = nav
            .uids()
            .into_iter()
            .filter(|uid| !before.contains(uid))
            .collect();
        let report = SyncReport { pruned, added };
        info!(
            pruned = report.pruned.len(),
            added = report.added.len(),
            "navigation synced with filter"
        );
        Ok(report)
    }

    /// Store the navigation as JSON under `option_name`.
    #[instrument(level = "debug", skip(self, nav))]
    pub fn save_as_option(&self, nav: &Navigation, option_name: &str) -> ApplicationResult<()> {
        let json = serde_json::to_string(&nav.to_descriptors())?;
        self.store
            .set(option_name, &json)
            .with_option_context("write option", option_name)
    }

    /// Replace `nav` with the navigation stored under `option_name`.
    ///
    /// A missing, undecodable or empty value leaves `nav` untouched, as does
    /// a stored page that no longer normalizes.
    #[instrument(level = "debug", skip(self, nav))]
    pub fn load_as_option(&self, nav: &mut Navigation, option_name: &str) -> ApplicationResult<()> {
        let Some(raw) = self
            .store
            .get(option_name)
            .with_option_context("read option", option_name)?
        else {
            debug!("option {} not set", option_name);
            return Ok(());
        };

        let pages: Vec<PageDescriptor> = match serde_json::from_str(&raw) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("option {} does not hold a navigation: {}", option_name, e);
                return Ok(());
            }
        };
        if pages.is_empty() {
            return Ok(());
        }
        if let Err(e) = nav.set_pages(pages) {
            warn!("option {} holds an invalid page: {}", option_name, e);
        }
        Ok(())
    }

    /// Load the navigation stored under `option_name` into a fresh navigation.
    pub fn load_navigation(&self, option_name: &str) -> ApplicationResult<Navigation> {
        let mut nav = self.new_navigation();
        self.load_as_option(&mut nav, option_name)?;
        Ok(nav)
    }

    /// Option value to store for `option_name` on a fresh installation.
    ///
    /// Empty for unknown option names and for navigations without pages.
    pub fn navigation_option_value_for_install(&self, option_name: &str) -> ApplicationResult<String> {
        let mut nav = self.new_navigation();
        if option_name == PUBLIC_NAVIGATION_MAIN {
            self.add_pages_from_filter(&mut nav, PUBLIC_NAVIGATION_MAIN)?;
        }
        if nav.is_empty() {
            return Ok(String::new());
        }
        Ok(serde_json::to_string(&nav.to_descriptors())?)
    }
}

fn resolve_filter_name(filter_name: &str) -> &str {
    if filter_name.is_empty() {
        PUBLIC_NAVIGATION_MAIN
    } else {
        filter_name
    }
}
