//! Identity-keyed add, merge, expiry and pruning on [`Navigation`].

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::domain::arena::{Container, Navigation, NodeId};
use crate::domain::entities::{PageDescriptor, PageOptions, PageTree};
use crate::domain::error::{DomainError, DomainResult};

impl Navigation {
    /// Normalize `descriptor` against this navigation's base url.
    pub fn normalize_page(&self, descriptor: PageDescriptor, options: &PageOptions) -> DomainResult<PageTree> {
        self.normalizer().normalize(descriptor, options)
    }

    /// Add a top-level page unless a top-level page with the same uid exists.
    ///
    /// Returns the new node, or `None` when the add was a duplicate. Deeper
    /// descendants are not consulted.
    pub fn add_page(&mut self, descriptor: PageDescriptor) -> DomainResult<Option<NodeId>> {
        let tree = self.normalize_page(descriptor, &PageOptions::default())?;
        Ok(self.add_tree(tree))
    }

    pub fn add_pages(&mut self, descriptors: Vec<PageDescriptor>) -> DomainResult<()> {
        for descriptor in descriptors {
            self.add_page(descriptor)?;
        }
        Ok(())
    }

    fn add_tree(&mut self, tree: PageTree) -> Option<NodeId> {
        if let Some(uid) = &tree.page.uid {
            if self.get_child_by_uid(Container::Root, uid).is_some() {
                debug!(uid = %uid, "top-level page already present, skipping");
                return None;
            }
        }
        Some(self.insert_tree(tree, Container::Root))
    }

    /// Append a page without any deduplication.
    pub fn base_add_page(&mut self, tree: PageTree, container: Container) -> DomainResult<NodeId> {
        self.ensure_container(container)?;
        Ok(self.insert_tree(tree, container))
    }

    /// Add a page below `container` unless its uid already exists.
    ///
    /// For the root this is [`Navigation::add_page`]. For any other container
    /// the whole navigation is searched for the uid.
    pub fn add_page_to_container(
        &mut self,
        descriptor: PageDescriptor,
        container: Container,
    ) -> DomainResult<Option<NodeId>> {
        if container == Container::Root {
            return self.add_page(descriptor);
        }
        self.ensure_container(container)?;
        let tree = self.normalize_page(descriptor, &PageOptions::default())?;
        let exists = tree
            .page
            .uid
            .as_deref()
            .is_some_and(|uid| self.get_page_by_uid(uid).is_some());
        if exists {
            return Ok(None);
        }
        Ok(Some(self.insert_tree(tree, container)))
    }

    /// Immediate child of `container` carrying `uid`.
    pub fn get_child_by_uid(&self, container: Container, uid: &str) -> Option<NodeId> {
        self.ordered_children(container)
            .into_iter()
            .find(|&id| self.page(id).is_some_and(|page| page.uid.as_deref() == Some(uid)))
    }

    /// First page in pre-order carrying `uid`.
    pub fn get_page_by_uid(&self, uid: &str) -> Option<NodeId> {
        self.get_page_by_uid_in(Container::Root, uid)
    }

    /// First descendant of `container` in pre-order carrying `uid`.
    pub fn get_page_by_uid_in(&self, container: Container, uid: &str) -> Option<NodeId> {
        self.descendants(container)
            .find(|(_, page)| page.uid.as_deref() == Some(uid))
            .map(|(id, _)| id)
    }

    /// All uids, pre-order.
    pub fn uids(&self) -> Vec<String> {
        self.iter().filter_map(|(_, page)| page.uid.clone()).collect()
    }

    /// Merge a normalized page and its subtree below `parent`.
    ///
    /// A page whose uid is already present anywhere is left untouched and
    /// only receives the merged children. A new page is appended to `parent`
    /// with the next free order.
    #[instrument(level = "debug", skip(self, tree), fields(label = %tree.page.label))]
    pub fn merge_page(&mut self, tree: PageTree, parent: Container) -> DomainResult<()> {
        let PageTree { mut page, pages } = tree;
        let uid = page
            .uid
            .clone()
            .ok_or_else(|| DomainError::NotNormalized {
                label: page.label.clone(),
            })?;

        let resolved = match self.get_page_by_uid(&uid) {
            Some(existing) => existing,
            None => {
                self.ensure_container(parent)?;
                page.order = Some(self.next_order(parent));
                debug!(uid = %uid, order = ?page.order, "adding merged page");
                self.insert_tree(PageTree::leaf(page), parent)
            }
        };

        for child in pages {
            self.merge_page(child, Container::Page(resolved))?;
        }
        Ok(())
    }

    /// Merge every top-level page of `source` below the root.
    pub fn merge_navigation(&mut self, source: &Navigation) -> DomainResult<()> {
        for id in source.ordered_children(Container::Root) {
            if let Some(tree) = source.subtree(id) {
                self.merge_page(tree, Container::Root)?;
            }
        }
        Ok(())
    }

    /// Pages whose uid is not in `exclude_uids`, pre-order.
    pub fn get_other_pages(&self, exclude_uids: &HashSet<String>) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, page)| {
                page.uid
                    .as_ref()
                    .map_or(true, |uid| !exclude_uids.contains(uid))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Filter-installed pages that `exclude` no longer contains.
    ///
    /// Deletable pages are never expired.
    pub fn get_expired_pages_from_nav(&self, exclude: &Navigation) -> Vec<NodeId> {
        let wanted: HashSet<String> = exclude.uids().into_iter().collect();
        self.get_other_pages(&wanted)
            .into_iter()
            .filter(|&id| self.page(id).is_some_and(|page| !page.can_delete))
            .collect()
    }

    /// Remove `page` from wherever it sits below `container`.
    ///
    /// With `reattach` the removed page's children move up into the container
    /// it was found in, in display order, each taking that container's next
    /// order. A child
    /// whose uid already exists is dropped with its subtree. Returns whether a
    /// page was removed.
    pub fn remove_page_recursive(&mut self, page: NodeId, container: Container, reattach: bool) -> bool {
        if self.children(container).contains(&page) {
            let orphans = self.ordered_children(Container::Page(page));
            for &orphan in &orphans {
                self.detach(orphan);
            }
            self.free_subtree(page);
            debug!(?page, orphans = orphans.len(), reattach, "removed page");

            for orphan in orphans {
                if reattach {
                    self.reattach(orphan, container);
                } else {
                    self.free_subtree(orphan);
                }
            }
            return true;
        }

        let children = self.children(container).to_vec();
        children
            .into_iter()
            .any(|child| self.remove_page_recursive(page, Container::Page(child), reattach))
    }

    fn reattach(&mut self, orphan: NodeId, container: Container) {
        let order = self.next_order(container);
        let uid = match self.page_mut(orphan) {
            Some(page) => {
                page.order = Some(order);
                page.uid.clone()
            }
            None => return,
        };

        let duplicate = uid.as_deref().and_then(|uid| match container {
            Container::Root => self.get_child_by_uid(Container::Root, uid),
            Container::Page(_) => self.get_page_by_uid(uid),
        });
        if duplicate.is_some() {
            debug!(uid = ?uid, "dropping reattached duplicate");
            self.free_subtree(orphan);
        } else {
            self.attach(orphan, container);
        }
    }

    /// Prune a page, lifting its children to the nearest surviving ancestor.
    pub fn prune_page(&mut self, page: NodeId) -> bool {
        self.remove_page_recursive(page, Container::Root, true)
    }

    /// Prune each page in turn, returning how many were removed.
    pub fn prune_pages(&mut self, pages: &[NodeId]) -> usize {
        pages.iter().filter(|&&page| self.prune_page(page)).count()
    }

    /// Structural export, children in display order.
    pub fn to_descriptors(&self) -> Vec<PageDescriptor> {
        self.ordered_children(Container::Root)
            .into_iter()
            .filter_map(|id| self.subtree(id))
            .map(|tree| tree_to_descriptor(&tree))
            .collect()
    }

    /// Replace all pages with `descriptors`, added through [`Navigation::add_page`].
    ///
    /// On error the navigation is left as it was.
    pub fn set_pages(&mut self, descriptors: Vec<PageDescriptor>) -> DomainResult<()> {
        let mut fresh = Navigation::with_base_url(self.base_url());
        fresh.add_pages(descriptors)?;
        *self = fresh;
        Ok(())
    }
}

fn tree_to_descriptor(tree: &PageTree) -> PageDescriptor {
    let mut descriptor = tree.page.to_descriptor();
    descriptor.pages = tree.pages.iter().map(tree_to_descriptor).collect();
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Page, PageTarget};

    fn uri(label: &str, href: &str) -> PageDescriptor {
        PageDescriptor::uri(label, href)
    }

    #[test]
    fn test_add_page_skips_duplicate_top_level_uid() {
        let mut nav = Navigation::new();
        assert!(nav.add_page(uri("A", "/a")).unwrap().is_some());
        assert!(nav.add_page(uri("A again", "/a/")).unwrap().is_none());
        assert_eq!(nav.count(), 1);
    }

    #[test]
    fn test_add_page_only_checks_direct_children() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Parent", "/p").with_pages(vec![uri("Child", "/c")]))
            .unwrap();

        assert!(nav.add_page(uri("Child", "/c")).unwrap().is_some());
        assert_eq!(nav.count(), 2);
        assert_eq!(nav.uids(), vec!["/p", "/c", "/c"]);
    }

    #[test]
    fn test_add_page_to_container_checks_whole_navigation() {
        let mut nav = Navigation::new();
        let p = nav.add_page(uri("Parent", "/p")).unwrap().unwrap();
        nav.add_page(uri("Other", "/o")).unwrap();

        let added = nav
            .add_page_to_container(uri("Other", "/o"), Container::Page(p))
            .unwrap();
        assert!(added.is_none());

        let added = nav
            .add_page_to_container(uri("New", "/n"), Container::Page(p))
            .unwrap();
        assert_eq!(added.and_then(|id| nav.parent_of(id)), Some(Container::Page(p)));
    }

    #[test]
    fn test_get_page_by_uid_searches_descendants_in_pre_order() {
        let mut nav = Navigation::new();
        nav.add_page(uri("A", "/a").with_pages(vec![uri("deep", "/x")]))
            .unwrap();
        let b = nav
            .add_page(uri("B", "/b").with_pages(vec![uri("other deep", "/x")]))
            .unwrap()
            .unwrap();

        let found = nav.get_page_by_uid("/x").unwrap();
        assert_eq!(nav.page(found).map(|p| p.label.as_str()), Some("deep"));
        assert!(nav.get_child_by_uid(Container::Root, "/x").is_none());

        let in_b = nav.get_page_by_uid_in(Container::Page(b), "/x").unwrap();
        assert_eq!(nav.page(in_b).map(|p| p.label.as_str()), Some("other deep"));
        assert!(nav.get_page_by_uid("/missing").is_none());
    }

    #[test]
    fn test_merge_page_requires_uid() {
        let mut nav = Navigation::new();
        let raw = PageTree::leaf(Page::new("raw", PageTarget::Uri("/raw".into())));
        assert_eq!(
            nav.merge_page(raw, Container::Root),
            Err(DomainError::NotNormalized { label: "raw".into() })
        );
    }

    #[test]
    fn test_merge_page_rejects_foreign_container() {
        let mut nav = Navigation::new();
        let mut other = Navigation::new();
        let foreign = other.add_page(uri("F", "/f")).unwrap().unwrap();
        let tree = nav.normalize_page(uri("A", "/a"), &PageOptions::default()).unwrap();

        let result = nav.merge_page(tree, Container::Page(foreign));

        assert_eq!(result, Err(DomainError::ForeignContainer));
    }

    #[test]
    fn test_merge_page_appends_with_next_order_and_keeps_existing() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Existing", "/e").with_order(7)).unwrap();

        let incoming = nav
            .normalize_page(
                uri("Renamed", "/e").with_pages(vec![uri("Child", "/c")]),
                &PageOptions::default(),
            )
            .unwrap();
        nav.merge_page(incoming, Container::Root).unwrap();
        let fresh = nav.normalize_page(uri("Fresh", "/f"), &PageOptions::default()).unwrap();
        nav.merge_page(fresh, Container::Root).unwrap();

        let existing = nav.get_page_by_uid("/e").unwrap();
        assert_eq!(nav.page(existing).map(|p| p.label.as_str()), Some("Existing"));
        assert_eq!(nav.page(existing).and_then(|p| p.order), Some(7));

        let child = nav.get_page_by_uid("/c").unwrap();
        assert_eq!(nav.parent_of(child), Some(Container::Page(existing)));
        assert_eq!(nav.page(child).and_then(|p| p.order), Some(1));

        let fresh = nav.get_page_by_uid("/f").unwrap();
        assert_eq!(nav.page(fresh).and_then(|p| p.order), Some(8));
    }

    #[test]
    fn test_remove_page_recursive_without_reattach_drops_subtree() {
        let mut nav = Navigation::new();
        nav.add_page(uri("A", "/a").with_pages(vec![uri("B", "/b").with_pages(vec![uri("C", "/c")])]))
            .unwrap();
        let b = nav.get_page_by_uid("/b").unwrap();

        assert!(nav.remove_page_recursive(b, Container::Root, false));
        assert_eq!(nav.uids(), vec!["/a"]);
        assert_eq!(nav.len(), 1);
    }

    #[test]
    fn test_remove_page_recursive_reports_missing_page() {
        let mut nav = Navigation::new();
        let a = nav.add_page(uri("A", "/a")).unwrap().unwrap();
        assert!(nav.prune_page(a));
        assert!(!nav.prune_page(a));
    }

    #[test]
    fn test_reattach_drops_child_already_present_elsewhere() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Keep", "/k").with_pages(vec![uri("Dup", "/d")]))
            .unwrap();
        nav.add_page(uri("Gone", "/g").with_pages(vec![uri("Dup", "/d")]))
            .unwrap();
        let gone = nav.get_child_by_uid(Container::Root, "/g").unwrap();

        // top-level dedupe only looks at direct children, so /d survives
        assert!(nav.prune_page(gone));
        assert_eq!(nav.uids(), vec!["/k", "/d", "/d"]);

        let mut nav2 = Navigation::new();
        nav2.add_page(uri("Top", "/t").with_pages(vec![
            uri("Mid", "/m").with_pages(vec![uri("Twin", "/w")]),
            uri("Twin", "/w"),
        ]))
        .unwrap();
        let mid = nav2.get_page_by_uid("/m").unwrap();
        assert!(nav2.prune_page(mid));
        assert_eq!(nav2.uids(), vec!["/t", "/w"]);
    }

    #[test]
    fn test_merge_page_after_max_order_sibling_saturates() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Last", "/last").with_order(i32::MAX)).unwrap();
        let fresh = nav.normalize_page(uri("Fresh", "/f"), &PageOptions::default()).unwrap();

        nav.merge_page(fresh, Container::Root).unwrap();

        let fresh = nav.get_page_by_uid("/f").unwrap();
        assert_eq!(nav.page(fresh).and_then(|p| p.order), Some(i32::MAX));
        assert_eq!(nav.uids(), vec!["/last", "/f"]);
    }

    #[test]
    fn test_reattach_after_max_order_sibling_saturates() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Last", "/last").with_order(i32::MAX)).unwrap();
        nav.add_page(uri("Parent", "/p").with_order(1).with_pages(vec![uri("Child", "/c")]))
            .unwrap();
        let parent = nav.get_page_by_uid("/p").unwrap();

        assert!(nav.prune_page(parent));

        let child = nav.get_page_by_uid("/c").unwrap();
        assert_eq!(nav.page(child).and_then(|p| p.order), Some(i32::MAX));
        assert_eq!(nav.uids(), vec!["/last", "/c"]);
    }

    #[test]
    fn test_reattach_keeps_display_order_of_children() {
        let mut nav = Navigation::new();
        nav.add_page(uri("Parent", "/p").with_pages(vec![
            uri("Late", "/late").with_order(5),
            uri("Early", "/early").with_order(1),
        ]))
        .unwrap();
        let parent = nav.get_page_by_uid("/p").unwrap();

        assert!(nav.prune_page(parent));

        assert_eq!(nav.uids(), vec!["/early", "/late"]);
        let early = nav.get_page_by_uid("/early").unwrap();
        assert_eq!(nav.page(early).and_then(|p| p.order), Some(1));
    }

    #[test]
    fn test_set_pages_is_atomic_on_error() {
        let mut nav = Navigation::new();
        nav.add_page(uri("A", "/a")).unwrap();

        let bad = PageDescriptor {
            label: "bad".into(),
            ..PageDescriptor::default()
        };
        assert!(nav.set_pages(vec![uri("B", "/b"), bad]).is_err());
        assert_eq!(nav.uids(), vec!["/a"]);
    }
}
