//! Normalization: raw descriptors become typed, uid-carrying page trees.

use tracing::trace;

use crate::domain::entities::{
    canonicalize_uri, create_page_uid, Page, PageDescriptor, PageKind, PageOptions, PageTarget,
    PageTree, RouteTarget, DEFAULT_ROUTE, DEFAULT_SEGMENT,
};
use crate::domain::error::{DomainError, DomainResult};

/// Resolves descriptors against a base url.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalizer {
    base_url: String,
}

impl Normalizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn href(&self, page: &Page) -> String {
        page.target.href(&self.base_url)
    }

    /// Normalize a descriptor and all its sub-descriptors.
    ///
    /// `options` is applied to every page of the subtree. Any uid carried by
    /// the descriptor is discarded and recomputed from the canonical href.
    pub fn normalize(&self, descriptor: PageDescriptor, options: &PageOptions) -> DomainResult<PageTree> {
        let PageDescriptor {
            label,
            title,
            kind,
            uri,
            route,
            module,
            controller,
            action,
            params,
            visible,
            can_delete,
            order,
            uid: _,
            pages,
        } = descriptor;

        let has_route_fields =
            route.is_some() || module.is_some() || controller.is_some() || action.is_some();
        let uri = uri.filter(|u| !u.trim().is_empty());

        let kind = match kind {
            Some(kind) => kind,
            None if has_route_fields => PageKind::Mvc,
            None if uri.is_some() => PageKind::Uri,
            None => {
                return Err(DomainError::InvalidPage {
                    label,
                    reason: "page must resolve to a route page or a uri page".into(),
                })
            }
        };

        let target = match kind {
            PageKind::Mvc => PageTarget::Route(RouteTarget {
                route: non_blank(route).unwrap_or_else(|| DEFAULT_ROUTE.into()),
                module: non_blank(module),
                controller: non_blank(controller).unwrap_or_else(|| DEFAULT_SEGMENT.into()),
                action: non_blank(action).unwrap_or_else(|| DEFAULT_SEGMENT.into()),
                params,
            }),
            PageKind::Uri => match uri {
                Some(uri) => PageTarget::Uri(canonicalize_uri(&uri)),
                None => {
                    return Err(DomainError::InvalidPage {
                        label,
                        reason: "uri page without a uri".into(),
                    })
                }
            },
        };

        let mut page = Page {
            label,
            title,
            target,
            visible: visible.unwrap_or(true),
            can_delete: can_delete.unwrap_or(true),
            order,
            uid: None,
        };
        options.apply(&mut page);
        page.uid = Some(create_page_uid(&self.href(&page)));
        trace!(label = %page.label, uid = ?page.uid, "normalized page");

        let pages = pages
            .into_iter()
            .map(|sub| self.normalize(sub, options))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PageTree { page, pages })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
