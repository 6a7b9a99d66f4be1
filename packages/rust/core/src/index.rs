//! Search indexer: turn the rendered site into an upload batch.
//!
//! 1. Report the version already indexed and the one about to replace it.
//! 2. Resolve categories from `toc.json` and build one record per page;
//!    unreadable or untitled pages are duds and are skipped.
//! 3. Mark every indexed id that is not part of this run for deletion.
//! 4. Submit the batch, then search for a few random pages by title.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, instrument, warn};

use docsite_search::{DocumentOp, SearchQuery, SearchService, UploadResponse, deletions};
use docsite_shared::{
    AppConfig, CategoryEntry, DocsiteError, DocumentRecord, Result, document_id,
};

use crate::categories::resolve_categories;
use crate::progress::ProgressReporter;
use crate::toc::load_toc;

/// Title suffixes whose stem is appended to the content to boost it.
const BOOST_SUFFIXES: &[&str] = &[".h File Reference", "_interface.h File Reference"];

/// How many times a boosted stem is repeated.
const BOOST_REPEAT: usize = 3;

/// Finds the page carrying the version marker.
const VERSION_QUERY: &str = r#""a class=\"doc-version\"""#;

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionReport {
    /// Version found in the index, if any.
    pub existing: Option<String>,
    /// Version of the docs about to be uploaded.
    pub local: Option<String>,
}

/// Look up the indexed and the local documentation versions.
#[instrument(skip_all, fields(html_dir = %html_dir.display()))]
pub async fn check_versions<S: SearchService>(
    service: &S,
    html_dir: &Path,
    version_page: &str,
) -> Result<VersionReport> {
    let resp = service
        .search(&SearchQuery::simple(VERSION_QUERY).size(1))
        .await?;
    let existing = resp
        .hits
        .hit
        .first()
        .and_then(|hit| hit.field("content"))
        .and_then(docsite_fragment::doc_version);

    let path = html_dir.join(version_page);
    let local = match std::fs::read_to_string(&path) {
        Ok(html) => docsite_fragment::doc_version(&html),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "couldn't read version page");
            None
        }
    };
    if local.is_none() {
        warn!("couldn't detect the version of the docs to be uploaded");
    }

    Ok(VersionReport { existing, local })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Build the search record for one page.
pub fn process_page(
    html_dir: &Path,
    entry: &CategoryEntry,
    id_hash_threshold: usize,
) -> Result<DocumentRecord> {
    let path = html_dir.join(&entry.filename);
    let raw = std::fs::read(&path).map_err(|e| DocsiteError::io(&path, e))?;
    let html = String::from_utf8_lossy(&raw);

    let title = docsite_fragment::page_title(&html).ok_or_else(|| {
        DocsiteError::validation(format!("{}: no div.title", entry.filename))
    })?;
    let mut content = docsite_fragment::contents_html(&html).unwrap_or_default();
    content.push_str(&search_boost(&title));

    Ok(DocumentRecord {
        id: document_id(&entry.filename, id_hash_threshold),
        filename: entry.filename.clone(),
        content,
        title,
        category: entry.breadcrumb.clone(),
        context: entry.context.clone(),
    })
}

/// Text appended to a header page so searching `le_args` finds
/// `le_args.h File Reference` ahead of pages that merely link to it.
fn search_boost(title: &str) -> String {
    BOOST_SUFFIXES
        .iter()
        .filter_map(|sfx| title.strip_suffix(sfx))
        .map(|stem| format!("\n{stem}").repeat(BOOST_REPEAT))
        .collect()
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Everything that will be sent, plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct UploadPlan {
    pub records: Vec<DocumentRecord>,
    /// Pages that could not be read or had no title.
    pub duds: Vec<String>,
    /// Adds followed by deletes, in upload order.
    pub ops: Vec<DocumentOp>,
}

impl UploadPlan {
    pub fn deletes(&self) -> usize {
        self.ops.iter().filter(|op| op.is_delete()).count()
    }
}

/// Build records for every categorised page and diff against the index.
#[instrument(skip_all, fields(html_dir = %html_dir.display()))]
pub async fn plan_upload<S: SearchService>(
    service: &S,
    html_dir: &Path,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<UploadPlan> {
    progress.phase("Analyzing TOC");
    let toc = load_toc(&toc_path(html_dir))?;
    let categories = resolve_categories(&toc.toc, &config.toc);

    let (records, duds) = build_records(html_dir, &categories, config, progress);

    progress.phase("Finding obsolete documents");
    let existing = service
        .search(&SearchQuery::match_all(config.search.existing_limit))
        .await?;
    let keep: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let deletes = deletions(existing.ids(), &keep);
    for op in &deletes {
        info!(id = %op.id(), "marking for deletion");
    }

    let mut ops: Vec<DocumentOp> = records.iter().map(DocumentOp::from).collect();
    ops.extend(deletes);

    info!(
        records = records.len(),
        duds = duds.len(),
        ops = ops.len(),
        "upload planned"
    );
    Ok(UploadPlan { records, duds, ops })
}

fn build_records(
    html_dir: &Path,
    categories: &BTreeMap<String, CategoryEntry>,
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> (Vec<DocumentRecord>, Vec<String>) {
    progress.phase("Processing HTML");
    let total = categories.len();
    let mut records = Vec::with_capacity(total);
    let mut duds = Vec::new();

    for (i, (filename, entry)) in categories.iter().enumerate() {
        match process_page(html_dir, entry, config.search.id_hash_threshold) {
            Ok(record) => {
                debug!(
                    id = %record.id,
                    title = %record.title,
                    category = %record.category,
                    context = %record.context,
                    "record"
                );
                records.push(record);
            }
            Err(e) => {
                warn!(page = %html_dir.join(filename).display(), error = %e, "couldn't read page; skipping it");
                duds.push(filename.clone());
            }
        }
        progress.item(filename, i + 1, total);
    }
    progress.finish();
    (records, duds)
}

// ---------------------------------------------------------------------------
// Upload and self-test
// ---------------------------------------------------------------------------

/// Submit the plan. Anything but a `success` status is an error.
pub async fn submit<S: SearchService>(service: &S, plan: &UploadPlan) -> Result<UploadResponse> {
    let resp = service.upload(&plan.ops).await?;
    if !resp.is_success() {
        let messages: Vec<&str> = resp.errors.iter().map(|m| m.message.as_str()).collect();
        return Err(DocsiteError::Search(format!(
            "upload status '{}': {}",
            resp.status,
            messages.join("; ")
        )));
    }
    Ok(resp)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestResult {
    pub query: String,
    pub expected: String,
    pub found: bool,
}

/// Search for `count` randomly chosen records by title and check that each
/// comes back. Failures are logged, never returned as errors.
#[instrument(skip(service, records, rng))]
pub async fn self_test<S: SearchService, R: Rng + ?Sized>(
    service: &S,
    records: &[DocumentRecord],
    count: usize,
    rng: &mut R,
) -> Vec<SelfTestResult> {
    let picks: Vec<&DocumentRecord> = (0..count)
        .filter_map(|_| records.choose(rng))
        .collect();

    let mut results = Vec::with_capacity(picks.len());
    for record in picks {
        let found = match service.search(&SearchQuery::simple(&record.title)).await {
            Ok(resp) => resp
                .hits
                .hit
                .iter()
                .any(|hit| hit.field("id") == Some(record.filename.as_str())),
            Err(e) => {
                warn!(query = %record.title, error = %e, "self-test search failed");
                false
            }
        };
        if found {
            info!(query = %record.title, expected = %record.filename, "search test ok");
        } else {
            warn!(query = %record.title, expected = %record.filename, "search test failed");
        }
        results.push(SelfTestResult {
            query: record.title.clone(),
            expected: record.filename.clone(),
            found,
        });
    }
    results
}

/// `toc.json` location for an HTML directory.
pub fn toc_path(html_dir: &Path) -> PathBuf {
    html_dir.join("toc.json")
}
