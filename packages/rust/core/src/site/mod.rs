//! Site renderer.
//!
//! Takes the extracted fragments (plus any other HTML in the source
//! directory) and builds the browsable site:
//!
//! - `foo.part.html` is inserted into the `part.html` template as
//!   `foo.html`; more generally `foo.<t>.html` goes into `<t>.html`.
//! - Other `.html` files have their tokens rendered in place.
//! - `tocs/` receives one navigation tree per context and per category.
//! - Static files from the resource sets are copied over last.
//!
//! A context is a top-level section (e.g. Build Apps), a category one level
//! below it (e.g. Concepts).

mod resources;
mod template;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use docsite_shared::{DocsiteError, Result, SiteConfig, TocNode};

use crate::categories::{NavEntry, NavIndex};
use crate::progress::ProgressReporter;
use crate::toc::load_toc;

pub use resources::{DEFAULT_RESOURCE_DIR, ResourceResolver, STATIC_DIR};
pub use template::{Token, format_positional, replace_tokens};

/// Directory (under the output root) holding the navigation trees.
const TOC_DIR: &str = "tocs";

// ---------------------------------------------------------------------------
// Options and summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory with the fragments, other HTML files, and `toc.json`.
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Directory holding the resource sets (`default/`, …).
    pub resources: PathBuf,
    /// Resource set overriding `default/`.
    pub resource_dir: String,
    /// One context per top-level TOC entry instead of one for the root.
    pub split_top_level: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    /// Pages produced from a template.
    pub templated: usize,
    pub toc_files: usize,
    pub static_files: usize,
}

// ---------------------------------------------------------------------------
// Navigation definitions (json/*.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HeaderDef {
    template: String,
}

#[derive(Debug, Deserialize)]
struct SidemenuDef {
    template: String,
    #[serde(rename = "innerHTML")]
    inner_html: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    links: Vec<SidemenuLink>,
}

#[derive(Debug, Clone, Deserialize)]
struct SidemenuLink {
    title: String,
    href: String,
    /// The link target must exist among the fragments.
    #[serde(default)]
    check: bool,
    #[serde(default)]
    children: Vec<SidemenuLink>,
}

/// Context overview tree: the categories without their children.
#[derive(Serialize)]
struct ContextTree {
    id: u32,
    children: Vec<TocNode>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render the whole site from `opts.source_dir` into `opts.out_dir`.
#[instrument(skip_all, fields(src = %opts.source_dir.display(), out = %opts.out_dir.display()))]
pub fn render_site(
    opts: &RenderOptions,
    site: &SiteConfig,
    progress: &dyn ProgressReporter,
) -> Result<RenderSummary> {
    let toc = load_toc(&opts.source_dir.join("toc.json"))?;
    let nav = NavIndex::build(&toc.toc, opts.split_top_level, &site.pinned);
    let resources = ResourceResolver::new(&opts.resources, &opts.resource_dir);
    let renderer = SiteRenderer::load(nav, site, resources, &opts.source_dir)?;

    let mut summary = RenderSummary::default();

    progress.phase("Writing navigation trees");
    summary.toc_files = renderer.write_toc_files(&opts.out_dir.join(TOC_DIR))?;

    let (dirs, pages) = collect_tree(&opts.source_dir)?;
    for dir in &dirs {
        let target = opts.out_dir.join(dir);
        std::fs::create_dir_all(&target).map_err(|e| DocsiteError::io(&target, e))?;
    }

    progress.phase("Rendering pages");
    let mut templates = BTreeMap::new();
    let total = pages.len();
    for (i, rel) in pages.iter().enumerate() {
        let templated = renderer.render_page(opts, rel, &mut templates)?;
        summary.pages += 1;
        summary.templated += usize::from(templated);
        progress.item(&rel.to_string_lossy(), i + 1, total);
    }
    progress.finish();

    progress.phase("Copying static files");
    summary.static_files = renderer.copy_static(&opts.out_dir)?;

    info!(
        pages = summary.pages,
        templated = summary.templated,
        toc_files = summary.toc_files,
        static_files = summary.static_files,
        "site rendered"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

struct SiteRenderer<'a> {
    nav: NavIndex,
    site: &'a SiteConfig,
    resources: ResourceResolver,
    header_template: String,
    sidemenu: SidemenuDef,
    sidemenu_template: String,
}

impl<'a> SiteRenderer<'a> {
    fn load(
        nav: NavIndex,
        site: &'a SiteConfig,
        resources: ResourceResolver,
        source_dir: &Path,
    ) -> Result<Self> {
        let header: HeaderDef = resources.json("header.json")?;
        let header_template = resources.template(&header.template)?;

        let mut sidemenu: SidemenuDef = resources.json("sidemenu.json")?;
        for link in &mut sidemenu.links {
            check_link(link, source_dir)?;
        }
        let sidemenu_template = resources.template(&sidemenu.template)?;

        Ok(Self {
            nav,
            site,
            resources,
            header_template,
            sidemenu,
            sidemenu_template,
        })
    }

    /// Render one source file. Returns whether a template was used.
    fn render_page(
        &self,
        opts: &RenderOptions,
        rel: &Path,
        templates: &mut BTreeMap<String, String>,
    ) -> Result<bool> {
        let src = opts.source_dir.join(rel);
        let name = rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parts: Vec<&str> = name.split('.').collect();

        let raw = std::fs::read(&src).map_err(|e| DocsiteError::io(&src, e))?;
        let contents = String::from_utf8_lossy(&raw);

        if parts.len() > 2 {
            let template_name = format!("{}.html", parts[parts.len() - 2]);
            let out_rel = rel.with_file_name(format!("{}.html", parts[0]));
            let page = page_key(&out_rel);
            debug!(%page, template = %template_name, "rendering into template");

            if !templates.contains_key(&template_name) {
                let text = self.resources.template(&template_name)?;
                templates.insert(template_name.clone(), text);
            }
            let template = &templates[&template_name];

            let rendered = self.render_tokens(template, &page, true)?;
            let combined = rendered.replace("{content}", &contents);
            let titled = docsite_fragment::apply_title_meta(&combined, &self.site.title_suffix);
            if titled.title.is_none() {
                warn!(%page, "no title meta tag");
            }
            write_file(&opts.out_dir.join(&out_rel), &titled.html)?;
            Ok(true)
        } else {
            let page = page_key(rel);
            debug!(%page, "rendering in place");
            let rendered = self.render_tokens(&contents, &page, true)?;
            write_file(&opts.out_dir.join(rel), &rendered)?;
            Ok(false)
        }
    }

    fn render_tokens(&self, input: &str, page: &str, with_sidemenu: bool) -> Result<String> {
        replace_tokens(input, |token| match token {
            Token::TocFile => Ok(Some(self.toc_file(page))),
            Token::Header => self.header(page).map(Some),
            Token::SideMenu if with_sidemenu => self.sidemenu(page).map(Some),
            Token::SideMenu => Ok(None),
            Token::Context => Ok(Some(
                self.nav.lookup(page).map(|e| e.context).unwrap_or_default(),
            )),
        })
    }

    /// `tocs/<context>[_<category>].json`, or empty when not in the TOC.
    fn toc_file(&self, page: &str) -> String {
        match self.nav.lookup(page) {
            Some(entry) => format!("{TOC_DIR}/{}.json", tree_file_stem(&entry)),
            None => {
                warn!(%page, "not in TOC");
                String::new()
            }
        }
    }

    fn header(&self, page: &str) -> Result<String> {
        let entry = self.nav.lookup(page);
        let links = entry
            .as_ref()
            .map(|e| self.secondary_links(e))
            .unwrap_or_default();
        let label = entry
            .map(|e| e.context)
            .unwrap_or_else(|| self.site.default_label.clone());
        format_positional(&self.header_template, &[&links, &label])
    }

    /// One link per category of the page's context.
    fn secondary_links(&self, entry: &NavEntry) -> String {
        let Some(ctx) = self.nav.context(&entry.context) else {
            return String::new();
        };
        ctx.categories
            .iter()
            .map(|cat| {
                let selected = if cat.label == entry.category {
                    r#" class="link-selected""#
                } else {
                    ""
                };
                format!(r#"<a href="{}"{selected}>{}</a>"#, cat.first_href(), cat.label)
            })
            .collect()
    }

    fn sidemenu(&self, page: &str) -> Result<String> {
        let entry = self.nav.lookup(page);
        let mut links = String::new();
        for link in &self.sidemenu.links {
            self.sidemenu_link(&mut links, link, 0, entry.as_ref())?;
        }
        let rendered = self.render_tokens(&self.sidemenu_template, page, false)?;
        format_positional(&rendered, &[&links, &self.sidemenu.title])
    }

    /// A link followed by its children, each formatted with `innerHTML`.
    fn sidemenu_link(
        &self,
        out: &mut String,
        link: &SidemenuLink,
        depth: usize,
        entry: Option<&NavEntry>,
    ) -> Result<()> {
        let mut class = String::from(if depth == 0 { "navlink" } else { "subnavlink" });
        if entry.is_some_and(|e| e.context == link.title) {
            class.push_str(" selected");
        }
        let class_attr = format!(r#"class="{class}""#);
        out.push_str(&format_positional(
            &self.sidemenu.inner_html,
            &[&link.href, &class_attr, &link.title],
        )?);
        for child in &link.children {
            self.sidemenu_link(out, child, depth + 1, entry)?;
        }
        Ok(())
    }

    /// Write `setupTree(...)` files for every context and category.
    fn write_toc_files(&self, dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(dir).map_err(|e| DocsiteError::io(dir, e))?;
        let mut written = 0;

        for ctx in self.nav.contexts() {
            let overview = ContextTree {
                id: 1,
                children: ctx
                    .categories
                    .iter()
                    .map(|cat| TocNode {
                        children: Vec::new(),
                        ..cat.node.clone()
                    })
                    .collect(),
            };
            let path = dir.join(format!("{}.json", ctx.label.replace(' ', "_")));
            write_setup_tree(&path, &overview)?;
            written += 1;

            for cat in &ctx.categories {
                let stem = format!("{}_{}", ctx.label, cat.label).replace(' ', "_");
                write_setup_tree(&dir.join(format!("{stem}.json")), &cat.node)?;
                written += 1;
            }
        }

        debug!(written, "navigation trees written");
        Ok(written)
    }

    /// Copy `default/static/`, then the selected set's `static/` over it.
    fn copy_static(&self, out_dir: &Path) -> Result<usize> {
        let mut sources = vec![self.resources.default_dir().join(STATIC_DIR)];
        if let Ok(selected) = self.resources.resolve(STATIC_DIR) {
            if !sources.contains(&selected) {
                sources.push(selected);
            }
        }

        let mut copied = 0;
        for src in sources.iter().filter(|s| s.is_dir()) {
            copied += copy_tree(src, out_dir)?;
        }
        Ok(copied)
    }
}

fn tree_file_stem(entry: &NavEntry) -> String {
    [entry.context.as_str(), entry.category.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .replace(' ', "_")
}

/// Resolve a `check` link against the fragments in `source_dir`, falling
/// back to the camelCase filename newer Doxygen versions produce.
fn check_link(link: &mut SidemenuLink, source_dir: &Path) -> Result<()> {
    static UNDERSCORE_LOWER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"_([a-z])").expect("valid regex"));

    if !link.check || link.href.starts_with("http") {
        return Ok(());
    }
    let part = |href: &str| source_dir.join(href.replace(".html", ".part.html"));
    if part(&link.href).is_file() {
        return Ok(());
    }

    let camel = UNDERSCORE_LOWER
        .replace_all(&link.href, |c: &Captures<'_>| c[1].to_uppercase())
        .into_owned();
    if part(&camel).is_file() {
        debug!(from = %link.href, to = %camel, "side menu link renamed");
        link.href = camel;
        return Ok(());
    }

    Err(DocsiteError::Template(format!(
        "unable to find {} or {camel}",
        link.href
    )))
}

fn write_setup_tree<T: Serialize>(path: &Path, tree: &T) -> Result<()> {
    let json = serde_json::to_string(tree)
        .map_err(|e| DocsiteError::parse(format!("failed to serialize tree: {e}")))?;
    write_file(path, &format!("setupTree({json})"))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocsiteError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| DocsiteError::io(path, e))
}

/// Lookup key for a page: its filename. TOC hrefs carry no directories, so
/// a page in a subdirectory is placed by its name alone.
fn page_key(rel: &Path) -> String {
    rel.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Relative directories and `.html` files under `root`, sorted by name.
fn collect_tree(root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if entry.file_type().is_dir() {
            dirs.push(rel.to_path_buf());
        } else if rel.extension().is_some_and(|ext| ext == "html") {
            files.push(rel.to_path_buf());
        }
    }
    Ok((dirs, files))
}

/// Copy everything under `src` into `dest`, overwriting. Returns files copied.
fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DocsiteError::io(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| DocsiteError::io(entry.path(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn walk_error(root: &Path, err: walkdir::Error) -> DocsiteError {
    let path = err.path().unwrap_or(root).to_path_buf();
    DocsiteError::io(path, err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use crate::toc::write_toc;
    use docsite_shared::TocDocument;

    struct Fixture {
        root: PathBuf,
        opts: RenderOptions,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn write(path: PathBuf, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn toc() -> TocNode {
        TocNode::new("Legato", Some("index.html")).with_children(vec![
            TocNode::new("Build Apps", Some("buildAppsMain.html")).with_children(vec![
                TocNode::new("Concepts", Some("concepts.html"))
                    .with_children(vec![TocNode::new("How To", Some("howTo.html"))]),
                TocNode::new("API Guides", Some("apiGuides.html")),
            ]),
            TocNode::new("About", Some("aboutLegato.html")),
        ])
    }

    fn fixture(split: bool) -> Fixture {
        let root = std::env::temp_dir().join(format!("docsite-site-{}", uuid::Uuid::now_v7()));
        let src = root.join("parts");
        let res = root.join("resources");

        std::fs::create_dir_all(&src).unwrap();
        write_toc(&src.join("toc.json"), &TocDocument { toc: toc() }).unwrap();
        write(
            src.join("howTo.part.html"),
            r#"<div class="header"><h1 class="title">How To</h1></div><meta name="title" content="How To"><div class="contents">steps</div>"#,
        );
        write(src.join("buildToolsMain.part.html"), "<p>tools</p>");
        write(src.join("plain.html"), "<p>%%%CONTEXT%%%|%%%TOCFILE%%%</p>");
        write(src.join("sub/buildAppsMain.html"), "<i>%%%CONTEXT%%%</i>");

        write(
            res.join("default/templates/part.html"),
            "<html><head><title></title></head><body>%%%HEADER%%%\n%%%SIDEMENU%%%\n<script src=\"%%%TOCFILE%%%\"></script>{content}</body></html>",
        );
        write(
            res.join("default/templates/header.html"),
            "<nav>{0}</nav><span class=\"ctx\">{1}</span>",
        );
        write(
            res.join("default/templates/sidemenu.html"),
            "<div class=\"side\" data-ctx=\"%%%CONTEXT%%%\">%%%SIDEMENU%%%<h3>{1}</h3>{0}</div>",
        );
        write(
            res.join("default/json/header.json"),
            r#"{"template": "header.html"}"#,
        );
        write(
            res.join("default/json/sidemenu.json"),
            r#"{
                "template": "sidemenu.html",
                "innerHTML": "<a href=\"{0}\" {1}>{2}</a>",
                "title": "Menu",
                "links": [
                    {"title": "Build Apps", "href": "buildAppsMain.html", "check": false,
                     "children": [{"title": "Concepts", "href": "concepts.html"}]},
                    {"title": "Tools", "href": "build_tools_main.html", "check": true},
                    {"title": "Site", "href": "https://legato.io/", "check": true}
                ]
            }"#,
        );
        write(res.join("default/static/css/site.css"), "default css");
        write(res.join("default/static/js/app.js"), "default js");
        write(res.join("custom/static/css/site.css"), "custom css");

        let opts = RenderOptions {
            source_dir: src,
            out_dir: root.join("out"),
            resources: res,
            resource_dir: "custom".into(),
            split_top_level: split,
        };
        Fixture { root, opts }
    }

    fn read(path: PathBuf) -> String {
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    #[test]
    fn renders_templated_page_with_split_contexts() {
        let fx = fixture(true);
        let summary = render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");
        assert_eq!(summary.pages, 4);
        assert_eq!(summary.templated, 2);

        let page = read(fx.opts.out_dir.join("howTo.html"));
        assert!(page.contains("<title>How To - Legato Docs</title>"));
        assert!(!page.contains("<meta name=\"title\""));
        assert!(page.contains(
            r#"<nav><a href="concepts.html" class="link-selected">Concepts</a><a href="apiGuides.html">API Guides</a></nav><span class="ctx">Build Apps</span>"#
        ));
        assert!(page.contains(r#"<script src="tocs/Build_Apps_Concepts.json"></script>"#));
        assert!(page.contains(r#"<div class="side" data-ctx="Build Apps">%%%SIDEMENU%%%<h3>Menu</h3>"#));
        assert!(page.contains(r#"<a href="buildAppsMain.html" class="navlink selected">Build Apps</a>"#));
        assert!(page.contains(r#"<a href="concepts.html" class="subnavlink">Concepts</a>"#));
        assert!(page.contains(r#"<a href="buildToolsMain.html" class="navlink">Tools</a>"#));
        assert!(page.contains("steps"));
    }

    #[test]
    fn renders_plain_pages_in_place_and_mirrors_dirs() {
        let fx = fixture(true);
        render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");

        assert_eq!(read(fx.opts.out_dir.join("plain.html")), "<p>|</p>");
        assert_eq!(
            read(fx.opts.out_dir.join("sub/buildAppsMain.html")),
            "<i>Build Apps</i>"
        );
        assert!(!fx.opts.out_dir.join("toc.json").exists());
    }

    #[test]
    fn page_outside_toc_gets_default_label() {
        let fx = fixture(true);
        render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");
        let page = read(fx.opts.out_dir.join("buildToolsMain.html"));
        assert!(page.contains(r#"<nav></nav><span class="ctx">Legato Documentation</span>"#));
        assert!(page.contains(r#"<script src=""></script>"#));
    }

    #[test]
    fn writes_navigation_trees() {
        let fx = fixture(true);
        let summary = render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");
        // Build Apps + 2 categories, About + 0 categories.
        assert_eq!(summary.toc_files, 4);

        let overview = read(fx.opts.out_dir.join("tocs/Build_Apps.json"));
        assert_eq!(
            overview,
            r#"setupTree({"id":1,"children":[{"label":"Concepts","href":"concepts.html","id":0},{"label":"API Guides","href":"apiGuides.html","id":0}]})"#
        );
        let concepts = read(fx.opts.out_dir.join("tocs/Build_Apps_Concepts.json"));
        assert!(concepts.starts_with(r#"setupTree({"label":"Concepts""#));
        assert!(concepts.contains("howTo.html"));
        assert!(fx.opts.out_dir.join("tocs/About.json").exists());
    }

    #[test]
    fn single_context_uses_root() {
        let fx = fixture(false);
        render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");
        assert!(fx.opts.out_dir.join("tocs/Legato.json").exists());
        assert!(fx.opts.out_dir.join("tocs/Legato_Build_Apps.json").exists());
        assert_eq!(
            read(fx.opts.out_dir.join("plain.html")),
            "<p>|</p>"
        );
        let page = read(fx.opts.out_dir.join("howTo.html"));
        assert!(page.contains(r#"<script src="tocs/Legato_Build_Apps.json"></script>"#));
    }

    #[test]
    fn static_overlay_overrides_default() {
        let fx = fixture(true);
        let summary = render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).expect("render");
        assert_eq!(summary.static_files, 3);
        assert_eq!(read(fx.opts.out_dir.join("css/site.css")), "custom css");
        assert_eq!(read(fx.opts.out_dir.join("js/app.js")), "default js");
    }

    #[test]
    fn missing_checked_link_is_an_error() {
        let fx = fixture(true);
        std::fs::remove_file(fx.opts.source_dir.join("buildToolsMain.part.html")).unwrap();
        let err = render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("build_tools_main.html"));
        assert!(msg.contains("buildToolsMain.html"));
    }

    #[test]
    fn bundled_resources_render() {
        let fx = fixture(true);
        for page in [
            "getStarted",
            "buildAppsMain",
            "buildAppsConcepts",
            "apiGuides",
            "buildPlatformMain",
            "toolsMain",
            "aboutLegato",
        ] {
            write(
                fx.opts.source_dir.join(format!("{page}.part.html")),
                &format!(r#"<meta name="title" content="{page}"><div class="contents"></div>"#),
            );
        }
        let opts = RenderOptions {
            resources: PathBuf::from("../../../resources"),
            resource_dir: DEFAULT_RESOURCE_DIR.into(),
            ..fx.opts.clone()
        };

        render_site(&opts, &SiteConfig::default(), &SilentProgress).expect("render");
        let page = read(opts.out_dir.join("apiGuides.html"));
        assert!(page.contains("<title>apiGuides - Legato Docs</title>"));
        assert!(page.contains(r#"<body data-context="Build Apps">"#));
        assert!(page.contains(r#"<a href="toolsMain.html" class="navlink">Tools</a>"#));
        assert!(opts.out_dir.join("css/site.css").is_file());
    }

    #[test]
    fn source_tree_is_collected_in_name_order() {
        let fx = fixture(true);
        let root = fx.root.join("tree");
        for file in ["b.html", "a.html", "notes.txt", "sub/z.html", "sub/deeper/c.html"] {
            write(root.join(file), "x");
        }

        let (dirs, files) = collect_tree(&root).expect("walk");
        assert_eq!(
            dirs,
            vec![PathBuf::new(), PathBuf::from("sub"), PathBuf::from("sub/deeper")]
        );
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.html"),
                PathBuf::from("b.html"),
                PathBuf::from("sub/deeper/c.html"),
                PathBuf::from("sub/z.html"),
            ]
        );

        let dest = fx.root.join("copy");
        assert_eq!(copy_tree(&root, &dest).expect("copy"), 5);
        assert_eq!(read(dest.join("sub/deeper/c.html")), "x");

        let err = collect_tree(&fx.root.join("nope")).unwrap_err();
        assert!(matches!(err, DocsiteError::Io { .. }));
    }

    #[test]
    fn missing_toc_is_fatal() {
        let fx = fixture(true);
        std::fs::remove_file(fx.opts.source_dir.join("toc.json")).unwrap();
        let err = render_site(&fx.opts, &SiteConfig::default(), &SilentProgress).unwrap_err();
        assert!(matches!(err, DocsiteError::Io { .. }));
    }
}
