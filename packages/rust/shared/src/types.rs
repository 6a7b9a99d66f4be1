//! Core domain types shared by the docsite jobs.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Filenames longer than this many bytes are replaced by their digest when
/// used as a search document id.
pub const DEFAULT_ID_HASH_THRESHOLD: usize = 127;

// ---------------------------------------------------------------------------
// TOC tree
// ---------------------------------------------------------------------------

/// Root structure of `toc.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocDocument {
    pub toc: TocNode,
}

/// A single node of the documentation outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocNode {
    /// Display label.
    pub label: String,
    /// Page the node links to, possibly with a `#fragment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Child nodes in outline order.
    ///
    /// Older `toc.json` files store a lone child as a bare object; it is
    /// wrapped into a one-element list here so nothing downstream has to care.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<TocNode>,
    /// Pre-order identifier, unique within the tree.
    #[serde(default)]
    pub id: u32,
}

impl TocNode {
    /// Create a node without children; ids are assigned later.
    pub fn new(label: impl Into<String>, href: Option<&str>) -> Self {
        Self {
            label: label.into(),
            href: href.map(String::from),
            children: Vec::new(),
            id: 0,
        }
    }

    /// Builder-style helper used by tests and tooling.
    pub fn with_children(mut self, children: Vec<TocNode>) -> Self {
        self.children = children;
        self
    }

    /// The linked filename with any `#fragment` stripped, if non-empty.
    pub fn page(&self) -> Option<&str> {
        let href = self.href.as_deref()?;
        let page = href.split('#').next().unwrap_or(href);
        (!page.is_empty()).then_some(page)
    }

    /// Every href in this subtree, pre-order, including this node's.
    pub fn hrefs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_hrefs(self, &mut out);
        out
    }

    /// Labels of the direct children, in order.
    pub fn child_labels(&self) -> Vec<String> {
        self.children.iter().map(|c| c.label.clone()).collect()
    }
}

fn collect_hrefs<'a>(node: &'a TocNode, out: &mut Vec<&'a str>) {
    if let Some(href) = node.href.as_deref() {
        out.push(href);
    }
    for child in &node.children {
        collect_hrefs(child, out);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<TocNode>),
    One(Box<TocNode>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<TocNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(nodes) => nodes,
        OneOrMany::One(node) => vec![*node],
    })
}

// ---------------------------------------------------------------------------
// CategoryEntry
// ---------------------------------------------------------------------------

/// Where a page sits in the outline, as shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Bare filename (href without fragment).
    pub filename: String,
    /// Top-level section, e.g. `Build Apps`.
    pub context: String,
    /// Parent path, at most two segments, e.g. `API Guides > C Prototypes`.
    pub breadcrumb: String,
}

// ---------------------------------------------------------------------------
// DocumentRecord
// ---------------------------------------------------------------------------

/// One page prepared for the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Search document id: the filename, or its digest when too long.
    pub id: String,
    /// Original filename, stored as a field so hits can link back.
    pub filename: String,
    /// Content HTML.
    pub content: String,
    /// Page title.
    pub title: String,
    /// Breadcrumb within the context.
    pub category: String,
    /// Top-level section.
    pub context: String,
}

/// Derive the search document id for `filename`.
///
/// The service limits id length, so anything over `threshold` bytes is
/// replaced with its hex SHA-256 digest.
pub fn document_id(filename: &str, threshold: usize) -> String {
    if filename.len() <= threshold {
        return filename.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    format!("{:x}", hasher.finalize())
}
