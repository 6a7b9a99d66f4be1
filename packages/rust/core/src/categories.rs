//! Where each page sits in the outline.
//!
//! Two views of the same tree:
//!
//! - [`resolve_categories`] gives every page a `(context, breadcrumb)` pair
//!   for search metadata.
//! - [`NavIndex`] gives every page a `(context, category)` pair for site
//!   navigation and lists each context's categories in TOC order.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use docsite_shared::{CategoryEntry, PinnedPage, TocConfig, TocNode};

/// Separator between breadcrumb segments.
pub const BREADCRUMB_DELIMITER: &str = " > ";

/// Segments of the parent path kept in a breadcrumb.
const BREADCRUMB_SEGMENTS: usize = 2;

// ---------------------------------------------------------------------------
// Search categories
// ---------------------------------------------------------------------------

/// Map every linked page to its context and breadcrumb, keyed by filename.
///
/// Walks each child of the root at depth 0. A node extends the path with
/// its label unless it is at or past `max_depth` or is a header page; its
/// breadcrumb is the last two segments of the path it was reached by.
#[instrument(skip_all, fields(max_depth = cfg.max_depth))]
pub fn resolve_categories(root: &TocNode, cfg: &TocConfig) -> BTreeMap<String, CategoryEntry> {
    let mut out = BTreeMap::new();
    for child in &root.children {
        walk(child, cfg, "", 0, &mut out);
    }
    debug!(pages = out.len(), "categories resolved");
    out
}

fn walk(
    node: &TocNode,
    cfg: &TocConfig,
    parent_path: &str,
    depth: usize,
    out: &mut BTreeMap<String, CategoryEntry>,
) {
    let path = if depth < cfg.max_depth && !node.label.ends_with(&cfg.header_suffix) {
        if parent_path.is_empty() {
            node.label.clone()
        } else {
            format!("{parent_path}{BREADCRUMB_DELIMITER}{}", node.label)
        }
    } else {
        parent_path.to_string()
    };

    if let Some(filename) = node.page() {
        let segments: Vec<&str> = parent_path.split(BREADCRUMB_DELIMITER).collect();
        let breadcrumb = segments[segments.len().saturating_sub(BREADCRUMB_SEGMENTS)..]
            .join(BREADCRUMB_DELIMITER);
        let context = match segments[0] {
            "" => path.clone(),
            first => first.to_string(),
        };
        out.insert(
            filename.to_string(),
            CategoryEntry {
                filename: filename.to_string(),
                context,
                breadcrumb,
            },
        );
    }

    for child in &node.children {
        walk(child, cfg, &path, depth + 1, out);
    }
}

// ---------------------------------------------------------------------------
// Navigation index
// ---------------------------------------------------------------------------

/// A page's place in the site navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub context: String,
    /// Empty for context landing pages and pinned pages without one.
    pub category: String,
}

impl NavEntry {
    fn new(context: &str, category: &str) -> Self {
        Self {
            context: context.to_string(),
            category: category.to_string(),
        }
    }
}

/// A top-level section of the site.
#[derive(Debug, Clone)]
pub struct NavContext {
    pub label: String,
    pub href: Option<String>,
    pub categories: Vec<NavCategory>,
}

/// A direct child of a context and every href in its subtree.
#[derive(Debug, Clone)]
pub struct NavCategory {
    pub label: String,
    pub hrefs: Vec<String>,
    /// The category subtree, as written to its navigation tree file.
    pub node: TocNode,
}

impl NavCategory {
    /// The link used for the category in the header.
    pub fn first_href(&self) -> &str {
        self.hrefs.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NavIndex {
    contexts: Vec<NavContext>,
    pinned: BTreeMap<String, NavEntry>,
}

impl NavIndex {
    /// Build the index. Without `split_top_level` the root is the only
    /// context; with it, every child of the root is one.
    pub fn build(root: &TocNode, split_top_level: bool, pinned: &[PinnedPage]) -> Self {
        let roots: Vec<&TocNode> = if split_top_level {
            root.children.iter().collect()
        } else {
            vec![root]
        };

        let contexts = roots
            .into_iter()
            .map(|ctx| NavContext {
                label: ctx.label.clone(),
                href: ctx.href.clone(),
                categories: ctx
                    .children
                    .iter()
                    .map(|cat| NavCategory {
                        label: cat.label.clone(),
                        hrefs: cat.hrefs().into_iter().map(String::from).collect(),
                        node: cat.clone(),
                    })
                    .collect(),
            })
            .collect();

        let pinned = pinned
            .iter()
            .map(|p| (p.file.clone(), NavEntry::new(&p.context, &p.category)))
            .collect();

        Self { contexts, pinned }
    }

    pub fn contexts(&self) -> &[NavContext] {
        &self.contexts
    }

    pub fn context(&self, label: &str) -> Option<&NavContext> {
        self.contexts.iter().find(|c| c.label == label)
    }

    /// Where the page named `filename` (a bare basename) belongs, if anywhere.
    pub fn lookup(&self, filename: &str) -> Option<NavEntry> {
        if let Some(entry) = self.pinned.get(filename) {
            return Some(entry.clone());
        }

        if let Some(ctx) = self
            .contexts
            .iter()
            .find(|c| c.href.as_deref() == Some(filename))
        {
            return Some(NavEntry::new(&ctx.label, ""));
        }

        let source_variant = filename.replace("_source.html", ".html");
        self.contexts.iter().find_map(|ctx| {
            ctx.categories
                .iter()
                .find(|cat| {
                    cat.hrefs
                        .iter()
                        .any(|h| h == filename || *h == source_variant)
                })
                .map(|cat| NavEntry::new(&ctx.label, &cat.label))
        })
    }
}
