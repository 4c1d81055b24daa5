use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavItem {
    Header {
        title: &'static str,
    },
    Divider,
    Link {
        segment: &'static str,
        title: &'static str,
        icon: &'static str,
    },
    Group {
        segment: &'static str,
        title: &'static str,
        icon: &'static str,
        children: Vec<NavItem>,
    },
}

pub static MENU: Lazy<Vec<NavItem>> = Lazy::new(|| {
    vec![
        NavItem::Header { title: "Explore" },
        NavItem::Link {
            segment: "trending",
            title: "Trending",
            icon: "trending_up",
        },
        NavItem::Link {
            segment: "popular",
            title: "Popular",
            icon: "whatshot",
        },
        NavItem::Link {
            segment: "new-releases",
            title: "New Releases",
            icon: "new_releases",
        },
        NavItem::Link {
            segment: "schedule",
            title: "Schedule",
            icon: "schedule",
        },
        NavItem::Divider,
        NavItem::Header { title: "Browse" },
        NavItem::Link {
            segment: "search",
            title: "Advanced Search",
            icon: "search",
        },
    ]
});

impl NavItem {
    /// A link is selected when `path` is its segment or lies below it; a group
    /// when any child is.
    pub fn is_selected(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        match self {
            NavItem::Header { .. } | NavItem::Divider => false,
            NavItem::Link { segment, .. } => under_segment(path, segment),
            NavItem::Group {
                segment, children, ..
            } => under_segment(path, segment) || children.iter().any(|c| c.is_selected(path)),
        }
    }
}

fn under_segment(path: &str, segment: &str) -> bool {
    match path.strip_prefix(segment) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Every navigable `(segment, title)`, groups flattened depth-first.
pub fn links(items: &[NavItem]) -> Vec<(&'static str, &'static str)> {
    let mut out = Vec::new();
    for item in items {
        match item {
            NavItem::Header { .. } | NavItem::Divider => {}
            NavItem::Link { segment, title, .. } => out.push((*segment, *title)),
            NavItem::Group {
                segment,
                title,
                children,
                ..
            } => {
                out.push((*segment, *title));
                out.extend(links(children));
            }
        }
    }
    out
}
