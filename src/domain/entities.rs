//! Domain entities: pages, their link targets and the raw descriptor shape

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Route used when a route page does not name one.
pub const DEFAULT_ROUTE: &str = "default";

/// Controller and action used when a route page leaves them out.
pub const DEFAULT_SEGMENT: &str = "index";

/// Page kind hint carried in descriptors (`"type"` in JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    #[serde(alias = "Zend_Navigation_Page_Mvc")]
    Mvc,
    #[serde(alias = "Zend_Navigation_Page_Uri", alias = "Omeka_Navigation_Page_Uri")]
    Uri,
}

/// Raw page as contributed by a filter or stored in the settings store.
///
/// Every field is optional on input. Normalization resolves it into a
/// [`Page`] of exactly one [`PageTarget`] kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDescriptor {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PageKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub pages: Vec<PageDescriptor>,
}

impl PageDescriptor {
    /// Route page on the default route.
    pub fn route(label: impl Into<String>, controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            controller: Some(controller.into()),
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// URI page.
    pub fn uri(label: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn with_route_name(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_pages(mut self, pages: Vec<PageDescriptor>) -> Self {
        self.pages = pages;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }
}

/// Internal route reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub route: String,
    pub module: Option<String>,
    pub controller: String,
    pub action: String,
    pub params: BTreeMap<String, String>,
}

impl RouteTarget {
    /// Assemble the href under `base_url`.
    ///
    /// Named routes other than `default` get a `/{route}` prefix. Trailing
    /// `index` segments are elided when no params follow them.
    pub fn href(&self, base_url: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        if self.route != DEFAULT_ROUTE {
            segments.push(&self.route);
        }

        let module = self
            .module
            .as_deref()
            .filter(|m| !m.is_empty() && *m != DEFAULT_ROUTE);
        let mut tail: Vec<&str> = Vec::new();
        if let Some(m) = module {
            tail.push(m);
        }
        tail.push(&self.controller);
        tail.push(&self.action);

        if self.params.is_empty() {
            if self.action == DEFAULT_SEGMENT {
                tail.pop();
                if self.controller == DEFAULT_SEGMENT && module.is_none() {
                    tail.pop();
                }
            }
        } else {
            for (key, value) in &self.params {
                tail.push(key);
                tail.push(value);
            }
        }
        segments.extend(tail);

        format!("{}/{}", base_url.trim_end_matches('/'), segments.join("/"))
    }
}

/// What a page links to. Decided once at normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTarget {
    Route(RouteTarget),
    Uri(String),
}

impl PageTarget {
    pub fn href(&self, base_url: &str) -> String {
        match self {
            PageTarget::Route(route) => route.href(base_url),
            PageTarget::Uri(uri) => uri.clone(),
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            PageTarget::Route(_) => PageKind::Mvc,
            PageTarget::Uri(_) => PageKind::Uri,
        }
    }
}

/// A single navigation entry, without its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub label: String,
    pub title: Option<String>,
    pub target: PageTarget,
    pub visible: bool,
    pub can_delete: bool,
    pub order: Option<i32>,
    /// Identity key, `None` until the page has been normalized.
    pub uid: Option<String>,
}

impl Page {
    pub fn new(label: impl Into<String>, target: PageTarget) -> Self {
        Self {
            label: label.into(),
            title: None,
            target,
            visible: true,
            can_delete: true,
            order: None,
            uid: None,
        }
    }

    /// Export shape of this page, without children.
    pub fn to_descriptor(&self) -> PageDescriptor {
        let mut descriptor = PageDescriptor {
            label: self.label.clone(),
            title: self.title.clone(),
            kind: Some(self.target.kind()),
            visible: Some(self.visible),
            can_delete: Some(self.can_delete),
            order: self.order,
            uid: self.uid.clone(),
            ..PageDescriptor::default()
        };
        match &self.target {
            PageTarget::Route(route) => {
                descriptor.route = Some(route.route.clone());
                descriptor.module = route.module.clone();
                descriptor.controller = Some(route.controller.clone());
                descriptor.action = Some(route.action.clone());
                descriptor.params = route.params.clone();
            }
            PageTarget::Uri(uri) => descriptor.uri = Some(uri.clone()),
        }
        descriptor
    }
}

/// Options applied to a page and all its descendants during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub can_delete: Option<bool>,
    pub visible: Option<bool>,
}

impl PageOptions {
    /// Options for pages installed by a filter.
    pub fn filter_installed() -> Self {
        Self {
            can_delete: Some(false),
            visible: None,
        }
    }

    pub fn apply(&self, page: &mut Page) {
        if let Some(can_delete) = self.can_delete {
            page.can_delete = can_delete;
        }
        if let Some(visible) = self.visible {
            page.visible = visible;
        }
    }
}

/// Owned, normalized page subtree that is not (yet) part of a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTree {
    pub page: Page,
    pub pages: Vec<PageTree>,
}

impl PageTree {
    pub fn leaf(page: Page) -> Self {
        Self {
            page,
            pages: Vec::new(),
        }
    }

    /// Uids of this page and all descendants, self first.
    pub fn uids(&self) -> Vec<String> {
        let mut uids = Vec::new();
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            if let Some(uid) = &tree.page.uid {
                uids.push(uid.clone());
            }
            for child in tree.pages.iter().rev() {
                stack.push(child);
            }
        }
        uids
    }
}

/// Identity key of a page with the given href.
pub fn create_page_uid(href: &str) -> String {
    href.to_string()
}

fn absolute_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?//([^/?#]*)([^?#]*)(.*)$").unwrap()
    })
}

fn repeated_slashes_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/{2,}").unwrap())
}

/// Canonical form of a URI href.
///
/// Absolute and network-path (`//host`) URIs: lower-case scheme and host,
/// default port dropped, empty path becomes `/`. Relative URIs: repeated
/// slashes collapsed, trailing slash dropped. Query and fragment are kept
/// verbatim.
pub fn canonicalize_uri(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(caps) = absolute_uri_regex().captures(trimmed) {
        let scheme = caps.get(1).map(|m| m.as_str().to_ascii_lowercase());
        let authority = &caps[2];
        let path = if caps[3].is_empty() { "/" } else { &caps[3] };
        let rest = &caps[4];

        let (userinfo, hostport) = match authority.rfind('@') {
            Some(at) => (&authority[..=at], &authority[at + 1..]),
            None => ("", authority),
        };
        let mut hostport = hostport.to_ascii_lowercase();
        let default_port = match scheme.as_deref() {
            Some("http") => Some(":80"),
            Some("https") => Some(":443"),
            _ => None,
        };
        if let Some(port) = default_port {
            if hostport.ends_with(port) {
                hostport.truncate(hostport.len() - port.len());
            }
        }
        let prefix = scheme.map(|s| format!("{s}:")).unwrap_or_default();
        return format!("{prefix}//{userinfo}{hostport}{path}{rest}");
    }

    if trimmed.starts_with('#') || trimmed.starts_with('?') {
        return trimmed.to_string();
    }

    let split = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let (path, rest) = trimmed.split_at(split);
    let mut path = repeated_slashes_regex().replace_all(path, "/").into_owned();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    format!("{path}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn route(controller: &str, action: &str) -> RouteTarget {
        RouteTarget {
            route: DEFAULT_ROUTE.into(),
            module: None,
            controller: controller.into(),
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    #[rstest]
    #[case("items", "browse", "/items/browse")]
    #[case("items", "index", "/items")]
    #[case("index", "index", "/")]
    #[case("index", "search", "/index/search")]
    fn test_route_href(#[case] controller: &str, #[case] action: &str, #[case] expected: &str) {
        assert_eq!(route(controller, action).href(""), expected);
    }

    #[test]
    fn test_route_href_with_base_url_module_and_params() {
        let mut target = route("items", "index");
        target.module = Some("exhibits".into());
        target.params.insert("id".into(), "7".into());
        assert_eq!(target.href("/omeka/"), "/omeka/exhibits/items/index/id/7");
    }

    #[test]
    fn test_named_route_href_is_prefixed() {
        let mut target = route("items", "browse");
        target.route = "admin".into();
        assert_eq!(target.href(""), "/admin/items/browse");
    }

    #[rstest]
    #[case("  HTTP://Example.COM:80  ", "http://example.com/")]
    #[case("https://example.com:443/a/b?x=1#top", "https://example.com/a/b?x=1#top")]
    #[case("https://User@Example.com:8443", "https://User@example.com:8443/")]
    #[case("//CDN.example.org//docs/", "//cdn.example.org//docs/")]
    #[case("//cdn.example.org", "//cdn.example.org/")]
    #[case("/exhibits//show/", "/exhibits/show")]
    #[case("/", "/")]
    #[case("/a/?q=1", "/a?q=1")]
    #[case("#top", "#top")]
    #[case("mailto:someone@example.com", "mailto:someone@example.com")]
    fn test_canonicalize_uri(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(canonicalize_uri(raw), expected);
    }

    #[test]
    fn test_descriptor_json_uses_type_key_and_skips_empty_fields() {
        let mut page = Page::new("Home", PageTarget::Uri("/".into()));
        page.uid = Some("/".into());
        let json = serde_json::to_value(page.to_descriptor()).unwrap();
        assert_eq!(json["type"], "uri");
        assert_eq!(json["uid"], "/");
        assert!(json.get("controller").is_none());
        assert!(json.get("order").is_none());
    }

    #[test]
    fn test_descriptor_accepts_legacy_type_names() {
        let descriptor: PageDescriptor =
            serde_json::from_str(r#"{"label":"x","type":"Omeka_Navigation_Page_Uri","uri":"/x"}"#).unwrap();
        assert_eq!(descriptor.kind, Some(PageKind::Uri));
    }
}
