//! Render a navigation as a `termtree` for terminal display.

use termtree::Tree;

use crate::domain::arena::{Container, Navigation, NodeId};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for Navigation {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(nav: &Navigation, id: NodeId) -> Tree<String> {
            let leaves: Vec<_> = nav
                .ordered_children(Container::Page(id))
                .into_iter()
                .map(|child| build_tree(nav, child))
                .collect();
            Tree::new(node_line(nav, id)).with_leaves(leaves)
        }

        if self.is_empty() {
            return Tree::new("Empty navigation".to_string());
        }
        let leaves: Vec<_> = self
            .ordered_children(Container::Root)
            .into_iter()
            .map(|id| build_tree(self, id))
            .collect();
        Tree::new("navigation".to_string()).with_leaves(leaves)
    }
}

fn node_line(nav: &Navigation, id: NodeId) -> String {
    let Some(page) = nav.page(id) else {
        return String::new();
    };
    let mut line = format!("{} [{}]", page.label, nav.href(id).unwrap_or_default());
    if !page.can_delete {
        line.push_str(" (locked)");
    }
    if !page.visible {
        line.push_str(" (hidden)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PageDescriptor;

    #[test]
    fn test_to_tree_string_renders_nesting_and_flags() {
        let mut nav = Navigation::new();
        nav.add_page(
            PageDescriptor::route("Items", "items", "browse")
                .with_pages(vec![PageDescriptor::uri("Tags", "/tags").hidden()]),
        )
        .unwrap();

        let rendered = nav.to_tree_string().to_string();

        assert!(rendered.starts_with("navigation"));
        assert!(rendered.contains("Items [/items/browse]"));
        assert!(rendered.contains("Tags [/tags] (hidden)"));
    }

    #[test]
    fn test_to_tree_string_for_empty_navigation() {
        assert_eq!(
            Navigation::new().to_tree_string().to_string().trim_end(),
            "Empty navigation"
        );
    }
}
