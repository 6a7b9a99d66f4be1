//! Concatenate every fragment referenced by the TOC into one HTML document,
//! the input for PDF generation.
//!
//! Each page gets an anchor named after its file, links between pages are
//! turned into links to those anchors, and real headings are demoted to
//! styled spans so only the inserted per-page headings shape the PDF outline.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, instrument, warn};

use docsite_shared::{DocsiteError, Result, TocNode};

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<a[^>]* href=)"([^"]*)"([^>]*>)"#).expect("valid regex"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h(\d)[^>]*>(.+?)</h\d>").expect("valid regex"));

/// One fragment in output order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatPage {
    /// Fragment filename, e.g. `howTo.part.html`.
    pub file: String,
    /// Depth in the (sub)tree it was flattened from.
    pub depth: usize,
}

impl FlatPage {
    /// Anchor name: the filename without `.part.html`.
    pub fn anchor(&self) -> &str {
        self.file.strip_suffix(".part.html").unwrap_or(&self.file)
    }
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Pre-order list of the fragments below `node`, first occurrence kept.
///
/// Nodes whose href carries a `#fragment` point into another page and are
/// left out.
pub fn flatten(node: &TocNode) -> Vec<FlatPage> {
    let mut pages = Vec::new();
    flatten_into(node, 0, &mut pages);
    let mut seen = BTreeSet::new();
    pages.retain(|p| seen.insert(p.clone()));
    pages
}

fn flatten_into(node: &TocNode, depth: usize, out: &mut Vec<FlatPage>) {
    if let Some(href) = node.href.as_deref().filter(|h| !h.contains('#')) {
        out.push(FlatPage {
            file: href.replace(".html", ".part.html"),
            depth,
        });
    }
    for child in &node.children {
        flatten_into(child, depth + 1, out);
    }
}

/// Flatten only the subtrees named by `paths` (`"Build Apps > Concepts"`),
/// in the order given.
pub fn flatten_paths(root: &TocNode, paths: &[String]) -> Result<Vec<FlatPage>> {
    let mut pages = Vec::new();
    for path in paths {
        let mut node = root;
        for label in path.split('>').map(str::trim) {
            node = node
                .children
                .iter()
                .find(|c| c.label == label)
                .ok_or_else(|| {
                    DocsiteError::validation(format!(
                        "node \"{label}\" in query \"{path}\" not found"
                    ))
                })?;
        }
        pages.extend(flatten(node));
    }
    Ok(pages)
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Point links at the in-document anchors.
///
/// Hrefs containing `/` are left alone; `page.html#frag` becomes `#frag`;
/// `page.html` becomes `#page`. Returns the targets not in `present`.
pub fn rewrite_links(content: &str, present: &BTreeSet<&str>) -> (String, Vec<String>) {
    let mut missing = Vec::new();
    let rewritten = HREF_RE.replace_all(content, |caps: &Captures<'_>| {
        let href = &caps[2];
        let target = if href.contains('/') {
            href.to_string()
        } else if let Some((_, fragment)) = href.split_once('#') {
            format!("#{fragment}")
        } else {
            if !present.contains(href.replace(".html", ".part.html").as_str()) {
                missing.push(href.to_string());
            }
            format!("#{}", href.replace(".html", ""))
        };
        format!("{}\"{target}\"{}", &caps[1], &caps[3])
    });
    (rewritten.into_owned(), missing)
}

/// `<hN ...>x</hN>` → `<span class="fake-h fake-hN">x</span>`.
pub fn fake_headings(content: &str) -> String {
    HEADING_RE
        .replace_all(content, r#"<span class="fake-h fake-h$1">$2</span>"#)
        .into_owned()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatSummary {
    pub pages: usize,
    /// Links to pages that are not part of the output.
    pub dangling_links: usize,
}

/// Write every page of `pages` (read from `html_dir`) to `out`.
#[instrument(skip_all, fields(pages = pages.len(), dir = %html_dir.display()))]
pub fn concatenate<W: Write>(
    pages: &[FlatPage],
    html_dir: &Path,
    out: &mut W,
) -> Result<ConcatSummary> {
    let present: BTreeSet<&str> = pages.iter().map(|p| p.file.as_str()).collect();
    let mut summary = ConcatSummary::default();
    let stdout = PathBuf::from("<output>");

    for page in pages {
        debug!(file = %page.file, depth = page.depth, "concatenating");
        let path = html_dir.join(&page.file);
        let raw = std::fs::read(&path).map_err(|e| DocsiteError::io(&path, e))?;
        let content = String::from_utf8_lossy(&raw);

        let (content, missing) = rewrite_links(&content, &present);
        for target in &missing {
            warn!(
                target = %target,
                from = %page.file.replace(".part.html", ".html"),
                "linked page is not part of the output"
            );
        }
        summary.dangling_links += missing.len();

        let content = fake_headings(&content);
        let title = docsite_fragment::meta_title(&content).ok_or_else(|| {
            DocsiteError::validation(format!("{}: no title meta tag", page.file))
        })?;

        write!(
            out,
            "<a name=\"{anchor}\"></a><h{d} class=\"hide-hack\">{title}</h{d}>{content}",
            anchor = page.anchor(),
            d = page.depth,
            title = docsite_fragment::escape_html(&title),
        )
        .map_err(|e| DocsiteError::io(&stdout, e))?;
        summary.pages += 1;
    }

    out.flush().map_err(|e| DocsiteError::io(&stdout, e))?;
    info!(pages = summary.pages, dangling = summary.dangling_links, "concatenation complete");
    Ok(summary)
}
