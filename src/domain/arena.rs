use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Page, PageTree};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::normalize::Normalizer;

/// Stable handle of a page inside a [`Navigation`].
pub type NodeId = Index;

/// Where a page lives: at the top level or below another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Root,
    Page(NodeId),
}

/// Tree node in the arena-based navigation.
#[derive(Debug)]
pub struct PageNode {
    pub page: Page,
    /// Index of parent node in the arena, None for top-level pages
    pub parent: Option<NodeId>,
    /// Indices of child nodes in insertion order
    pub children: Vec<NodeId>,
}

/// Navigation tree backed by a generational arena.
///
/// Top-level pages are listed in `roots`. Every node has at most one parent;
/// all reparenting goes through [`Navigation::attach`] and
/// [`Navigation::detach`].
#[derive(Debug, Default)]
pub struct Navigation {
    arena: Arena<PageNode>,
    roots: Vec<NodeId>,
    normalizer: Normalizer,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            normalizer: Normalizer::new(base_url),
            ..Self::default()
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn base_url(&self) -> &str {
        self.normalizer.base_url()
    }

    /// Number of pages in the whole tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of top-level pages.
    pub fn count(&self) -> usize {
        self.roots.len()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.roots.clear();
    }

    pub fn get_node(&self, id: NodeId) -> Option<&PageNode> {
        self.arena.get(id)
    }

    pub fn page(&self, id: NodeId) -> Option<&Page> {
        self.arena.get(id).map(|node| &node.page)
    }

    pub fn page_mut(&mut self, id: NodeId) -> Option<&mut Page> {
        self.arena.get_mut(id).map(|node| &mut node.page)
    }

    pub fn href(&self, id: NodeId) -> Option<String> {
        self.page(id).map(|page| self.normalizer.href(page))
    }

    /// Container holding `id`, `None` if the node is unknown or detached.
    pub fn parent_of(&self, id: NodeId) -> Option<Container> {
        let node = self.arena.get(id)?;
        match node.parent {
            Some(parent) => Some(Container::Page(parent)),
            None if self.roots.contains(&id) => Some(Container::Root),
            None => None,
        }
    }

    /// Direct children in insertion order.
    pub fn children(&self, container: Container) -> &[NodeId] {
        match container {
            Container::Root => &self.roots,
            Container::Page(id) => self
                .arena
                .get(id)
                .map(|node| node.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Direct children in display order.
    ///
    /// Sorted by `order`; a page without one takes the next value of a
    /// running counter over its order-less siblings. Ties keep insertion order.
    pub fn ordered_children(&self, container: Container) -> Vec<NodeId> {
        let mut unordered = 0i64;
        let mut keyed: Vec<(i64, usize, NodeId)> = self
            .children(container)
            .iter()
            .enumerate()
            .map(|(pos, &id)| {
                let key = match self.page(id).and_then(|page| page.order) {
                    Some(order) => i64::from(order),
                    None => {
                        unordered += 1;
                        unordered - 1
                    }
                };
                (key, pos, id)
            })
            .collect();
        keyed.sort_by_key(|&(key, pos, _)| (key, pos));
        keyed.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Highest order among the container's children, never below 0.
    pub fn last_order(&self, container: Container) -> i32 {
        self.children(container)
            .iter()
            .filter_map(|&id| self.page(id).and_then(|page| page.order))
            .fold(0, i32::max)
    }

    /// Order for a page appended to `container`, saturating at `i32::MAX`.
    pub fn next_order(&self, container: Container) -> i32 {
        self.last_order(container).saturating_add(1)
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            match self.arena.get(current) {
                Some(node) => match node.parent {
                    Some(parent) => current = parent,
                    None => return self.roots.contains(&current),
                },
                None => return false,
            }
        }
    }

    /// Whether `id` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.arena.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.arena.get(parent).and_then(|node| node.parent);
        }
        false
    }

    pub(crate) fn ensure_container(&self, container: Container) -> DomainResult<()> {
        match container {
            Container::Root => Ok(()),
            Container::Page(id) if self.is_attached(id) => Ok(()),
            Container::Page(_) => Err(DomainError::ForeignContainer),
        }
    }

    /// Append an owned subtree as the last child of `container`.
    #[instrument(level = "trace", skip(self, tree), fields(label = %tree.page.label))]
    pub(crate) fn insert_tree(&mut self, tree: PageTree, container: Container) -> NodeId {
        let PageTree { page, pages } = tree;
        let id = self.arena.insert(PageNode {
            page,
            parent: None,
            children: Vec::new(),
        });
        self.attach(id, container);
        for child in pages {
            self.insert_tree(child, Container::Page(id));
        }
        id
    }

    pub(crate) fn attach(&mut self, id: NodeId, container: Container) {
        match container {
            Container::Root => {
                self.roots.push(id);
                if let Some(node) = self.arena.get_mut(id) {
                    node.parent = None;
                }
            }
            Container::Page(parent) => {
                if let Some(parent_node) = self.arena.get_mut(parent) {
                    parent_node.children.push(id);
                }
                if let Some(node) = self.arena.get_mut(id) {
                    node.parent = Some(parent);
                }
            }
        }
    }

    /// Unlink `id` from its container, returning the container it left.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<Container> {
        let container = self.parent_of(id)?;
        match container {
            Container::Root => self.roots.retain(|&root| root != id),
            Container::Page(parent) => {
                if let Some(parent_node) = self.arena.get_mut(parent) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
        Some(container)
    }

    /// Remove a node and all its descendants from the arena.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Move an existing page below `container`.
    ///
    /// Rejects moving a page below itself or one of its own descendants.
    pub fn adopt(&mut self, id: NodeId, container: Container) -> DomainResult<()> {
        if !self.is_attached(id) {
            return Err(DomainError::UnknownNode);
        }
        self.ensure_container(container)?;
        if let Container::Page(target) = container {
            if target == id || self.is_descendant(target, id) {
                let label = self.page(id).map(|p| p.label.clone()).unwrap_or_default();
                return Err(DomainError::SelfParent { label });
            }
        }
        self.detach(id);
        self.attach(id, container);
        Ok(())
    }

    /// Owned copy of the subtree rooted at `id`, children in display order.
    pub fn subtree(&self, id: NodeId) -> Option<PageTree> {
        let page = self.page(id)?.clone();
        let pages = self
            .ordered_children(Container::Page(id))
            .into_iter()
            .filter_map(|child| self.subtree(child))
            .collect();
        Some(PageTree { page, pages })
    }

    /// Pre-order walk (self before children) over the whole tree.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self, Container::Root)
    }

    /// Pre-order walk over the descendants of `container`.
    pub fn descendants(&self, container: Container) -> PreOrderIter<'_> {
        PreOrderIter::new(self, container)
    }

    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, id: NodeId) -> usize {
        match self.get_node(id) {
            Some(node) => {
                1 + node
                    .children
                    .iter()
                    .map(|&child| self.calculate_depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }
}

pub struct PreOrderIter<'a> {
    nav: &'a Navigation,
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIter<'a> {
    fn new(nav: &'a Navigation, container: Container) -> Self {
        let mut stack = nav.ordered_children(container);
        stack.reverse();
        Self { nav, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (NodeId, &'a Page);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.nav.get_node(current) {
                // Push children in reverse order for left-to-right traversal
                for child in self.nav.ordered_children(Container::Page(current)).into_iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, &node.page));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PageTarget;

    fn tree(label: &str, order: Option<i32>, pages: Vec<PageTree>) -> PageTree {
        let mut page = Page::new(label, PageTarget::Uri(format!("/{label}")));
        page.uid = Some(format!("/{label}"));
        page.order = order;
        PageTree { page, pages }
    }

    fn labels(nav: &Navigation) -> Vec<String> {
        nav.iter().map(|(_, page)| page.label.clone()).collect()
    }

    #[test]
    fn test_insert_tree_links_parent_and_children() {
        let mut nav = Navigation::new();
        let a = nav.insert_tree(tree("a", None, vec![tree("b", None, vec![])]), Container::Root);
        let b = nav.children(Container::Page(a))[0];

        assert_eq!(nav.parent_of(a), Some(Container::Root));
        assert_eq!(nav.parent_of(b), Some(Container::Page(a)));
        assert!(nav.is_descendant(b, a));
        assert_eq!(nav.len(), 2);
        assert_eq!(nav.depth(), 2);
    }

    #[test]
    fn test_ordered_children_sorts_by_order_with_counter_for_unordered() {
        let mut nav = Navigation::new();
        nav.insert_tree(tree("late", Some(5), vec![]), Container::Root);
        nav.insert_tree(tree("first", None, vec![]), Container::Root);
        nav.insert_tree(tree("second", None, vec![]), Container::Root);
        nav.insert_tree(tree("early", Some(1), vec![]), Container::Root);

        assert_eq!(labels(&nav), vec!["first", "second", "early", "late"]);
    }

    #[test]
    fn test_last_order_ignores_negative_and_missing_orders() {
        let mut nav = Navigation::new();
        assert_eq!(nav.last_order(Container::Root), 0);
        nav.insert_tree(tree("a", Some(-3), vec![]), Container::Root);
        nav.insert_tree(tree("b", None, vec![]), Container::Root);
        assert_eq!(nav.last_order(Container::Root), 0);
        nav.insert_tree(tree("c", Some(4), vec![]), Container::Root);
        assert_eq!(nav.last_order(Container::Root), 4);
    }

    #[test]
    fn test_adopt_rejects_moving_page_below_itself() {
        let mut nav = Navigation::new();
        let a = nav.insert_tree(tree("a", None, vec![tree("b", None, vec![])]), Container::Root);
        let b = nav.children(Container::Page(a))[0];

        assert!(matches!(
            nav.adopt(a, Container::Page(a)),
            Err(DomainError::SelfParent { .. })
        ));
        assert!(matches!(
            nav.adopt(a, Container::Page(b)),
            Err(DomainError::SelfParent { .. })
        ));

        nav.adopt(b, Container::Root).unwrap();
        assert_eq!(nav.parent_of(b), Some(Container::Root));
        assert!(nav.children(Container::Page(a)).is_empty());
    }

    #[test]
    fn test_free_subtree_invalidates_descendant_ids() {
        let mut nav = Navigation::new();
        let a = nav.insert_tree(tree("a", None, vec![tree("b", None, vec![])]), Container::Root);
        let b = nav.children(Container::Page(a))[0];

        nav.free_subtree(a);

        assert!(nav.is_empty());
        assert!(nav.page(b).is_none());
        assert!(!nav.is_attached(b));
        assert_eq!(nav.len(), 0);
    }

    #[test]
    fn test_detached_node_is_foreign_container() {
        let mut nav = Navigation::new();
        let a = nav.insert_tree(tree("a", None, vec![]), Container::Root);
        nav.detach(a);
        assert_eq!(
            nav.ensure_container(Container::Page(a)),
            Err(DomainError::ForeignContainer)
        );
    }
}
