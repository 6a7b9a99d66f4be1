//! Doxygen HTML → content fragment extraction.
//!
//! Strips a generated page down to its header and `div.contents`, stashing
//! the page title in a `<meta name="title">` tag so later stages (site
//! rendering, PDF concatenation) can recover it. Also hosts the small HTML
//! queries the other jobs need: page title, content HTML, version marker.

mod cleanup;
mod serialize;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use docsite_shared::{DocsiteError, ExtractConfig, Result, SiteConfig};

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

static HEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.header").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.title").expect("valid selector"));
static CONTENTS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.contents").expect("valid selector"));
static META_TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="title"]"#).expect("valid selector"));
static VERSION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".doc-version").expect("valid selector"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for fragment extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Titles replaced verbatim, e.g. `Reference → C Prototypes`.
    pub title_renames: BTreeMap<String, String>,
    /// Paragraphs whose text matches get `class="copyright"`.
    pub copyright: Regex,
    /// Title used when the header carries none.
    pub default_title: String,
}

impl ExtractOptions {
    /// Build options from the `[extract]` and `[site]` config sections.
    pub fn from_config(extract: &ExtractConfig, site: &SiteConfig) -> Result<Self> {
        let copyright = Regex::new(&extract.copyright_pattern).map_err(|e| {
            DocsiteError::config(format!("invalid copyright_pattern: {e}"))
        })?;
        Ok(Self {
            title_renames: extract.title_renames.clone(),
            copyright,
            default_title: site.default_label.clone(),
        })
    }
}

/// Result of extracting a fragment from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Header + title meta tag + `div.contents`.
    pub html: String,
    /// Title stored in the meta tag, if the page had a header.
    pub title: Option<String>,
}

/// A rendered page after its title meta tag was folded into `<title>`.
#[derive(Debug, Clone)]
pub struct TitledPage {
    pub html: String,
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract the content fragment from a Doxygen page.
///
/// Output is a pure function of the input: running it twice on the same
/// page yields byte-identical fragments.
#[instrument(skip_all, fields(len = html.len()))]
pub fn extract(html: &str, opts: &ExtractOptions) -> Fragment {
    let cleaned = cleanup::run_pipeline(html);
    let doc = Html::parse_document(&cleaned);

    let mut out = String::new();
    let mut title = None;

    if let Some(header) = doc.select(&HEADER_SEL).next() {
        let raw_title = header
            .select(&TITLE_SEL)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| opts.default_title.clone());
        let page_title = opts
            .title_renames
            .get(&raw_title)
            .cloned()
            .unwrap_or(raw_title);

        let rules = serialize::Rules {
            copyright: &opts.copyright,
            header_title: Some(&page_title),
        };
        out.push_str(&serialize::outer_html(header, &rules));
        out.push_str(&meta_tag(&page_title));
        title = Some(page_title);
    }

    match doc.select(&CONTENTS_SEL).next() {
        Some(contents) => {
            let rules = serialize::Rules {
                copyright: &opts.copyright,
                header_title: None,
            };
            out.push_str(&serialize::outer_html(contents, &rules));
        }
        None => warn!("page has no div.contents"),
    }

    debug!(title = ?title, out_len = out.len(), "fragment extracted");

    Fragment { html: out, title }
}

fn meta_tag(title: &str) -> String {
    let mut tag = String::from(r#"<meta name="title" content=""#);
    serialize::escape_attr(title, &mut tag);
    tag.push_str("\">");
    tag
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Text of the page's `div.title`.
pub fn page_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Outer HTML of the page's `div.contents`.
pub fn contents_html(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&CONTENTS_SEL).next().map(|el| el.html())
}

/// Title stashed in a fragment's `<meta name="title">` tag.
pub fn meta_title(html: &str) -> Option<String> {
    let doc = Html::parse_fragment(html);
    doc.select(&META_TITLE_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(String::from)
}

/// The documentation version, read from the `title` of `.doc-version`.
pub fn doc_version(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&VERSION_SEL)
        .next()
        .and_then(|el| el.value().attr("title"))
        .map(String::from)
}

/// Escape `text` for use as HTML text content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    serialize::escape_text(text, &mut out);
    out
}

/// Remove the title meta tag from a rendered page and use its content
/// (plus `suffix`) as the document `<title>`.
pub fn apply_title_meta(page: &str, suffix: &str) -> TitledPage {
    static META_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?is)<meta\b[^>]*\bname\s*=\s*"title"[^>]*>"#).expect("valid regex")
    });
    static TITLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title>").expect("valid regex"));
    static HEAD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").expect("valid regex"));

    let Some(tag) = META_RE.find(page) else {
        warn!("no title meta tag");
        return TitledPage {
            html: page.to_string(),
            title: None,
        };
    };

    let title = meta_title(tag.as_str()).unwrap_or_default();
    let mut html = String::with_capacity(page.len());
    html.push_str(&page[..tag.start()]);
    html.push_str(&page[tag.end()..]);

    let title_el = format!("<title>{}</title>", escape_html(&format!("{title}{suffix}")));

    if TITLE_RE.is_match(&html) {
        html = TITLE_RE.replacen(&html, 1, NoExpand(&title_el)).into_owned();
    } else if let Some(head) = HEAD_RE.find(&html) {
        html.insert_str(head.end(), &title_el);
    } else {
        warn!(%title, "page has no <head>; title not set");
    }

    TitledPage {
        html,
        title: Some(title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ExtractOptions {
        ExtractOptions::from_config(&ExtractConfig::default(), &SiteConfig::default())
            .expect("default options")
    }

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Legato: le_args.h File Reference</title></head>
<body>
<div id="nav">navigation</div>
<div class="header"><div class="headertitle"><div class="title">le_args.h File Reference</div></div></div>
<div class="contents">
<p>Run with &ndash;verbose.</p>
<div class="fragment"><div class="line">int x;</div><div class="line"></div></div>
<p>Copyright (C) Sierra Wireless Inc. Use of this work is subject to license.</p>
</div>
<hr class="footer">
</body></html>"#;

    #[test]
    fn extracts_header_meta_and_contents() {
        let fragment = extract(PAGE, &opts());
        assert_eq!(fragment.title.as_deref(), Some("le_args.h File Reference"));

        let html = &fragment.html;
        assert!(html.starts_with(r#"<div class="header">"#));
        assert!(html.contains(r#"<h1 class="title">le_args.h File Reference</h1>"#));
        assert!(html.contains(r#"<meta name="title" content="le_args.h File Reference">"#));
        assert!(html.contains("Run with --verbose."));
        assert!(html.contains(r#"<pre class="fragment">"#));
        assert!(html.contains(r#"<div class="line">&nbsp;</div>"#));
        assert!(html.contains(r#"<p class="copyright">Copyright (C)"#));
        assert!(!html.contains("navigation"));
        assert!(!html.contains("footer"));
    }

    #[test]
    fn extraction_is_byte_identical_across_runs() {
        let first = extract(PAGE, &opts());
        let second = extract(PAGE, &opts());
        assert_eq!(first, second);
    }

    #[test]
    fn reference_title_is_renamed() {
        let page = r#"<div class="header"><div class="title">Reference</div></div><div class="contents">x</div>"#;
        let fragment = extract(page, &opts());
        assert_eq!(fragment.title.as_deref(), Some("C Prototypes"));
        assert!(fragment.html.contains(r#"<h1 class="title">C Prototypes</h1>"#));
    }

    #[test]
    fn page_without_header_has_no_meta() {
        let fragment = extract(r#"<div class="contents">body</div>"#, &opts());
        assert_eq!(fragment.title, None);
        assert_eq!(fragment.html, r#"<div class="contents">body</div>"#);
    }

    #[test]
    fn header_without_title_uses_default() {
        let page = r#"<div class="header"></div><div class="contents">x</div>"#;
        let fragment = extract(page, &opts());
        assert_eq!(fragment.title.as_deref(), Some("Legato Documentation"));
    }

    #[test]
    fn queries_find_title_contents_and_version() {
        assert_eq!(page_title(PAGE).as_deref(), Some("le_args.h File Reference"));
        let contents = contents_html(PAGE).expect("contents");
        assert!(contents.starts_with(r#"<div class="contents">"#));

        let about = r#"<p>Version <a class="doc-version" title="18.06.0" href="x">18.06</a></p>"#;
        assert_eq!(doc_version(about).as_deref(), Some("18.06.0"));
        assert_eq!(doc_version("<p>none</p>"), None);
    }

    #[test]
    fn meta_title_reads_either_attribute_order() {
        assert_eq!(
            meta_title(r#"<meta content="A &amp; B" name="title"/>"#).as_deref(),
            Some("A & B")
        );
        assert_eq!(
            meta_title(r#"<meta name="title" content="Intro">"#).as_deref(),
            Some("Intro")
        );
    }

    #[test]
    fn title_meta_moves_into_head() {
        let page = r#"<html><head><title>%%%TITLE%%%</title></head><body><meta name="title" content="Intro"><p>x</p></body></html>"#;
        let titled = apply_title_meta(page, " - Legato Docs");
        assert_eq!(titled.title.as_deref(), Some("Intro"));
        assert!(titled.html.contains("<title>Intro - Legato Docs</title>"));
        assert!(!titled.html.contains("<meta"));
    }

    #[test]
    fn title_inserted_when_head_lacks_one() {
        let page = r#"<html><head></head><body><meta name="title" content="A"></body></html>"#;
        let titled = apply_title_meta(page, "");
        assert!(titled.html.contains("<head><title>A</title></head>"));
    }
}
