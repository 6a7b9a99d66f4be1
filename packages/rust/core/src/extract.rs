//! Directory-level fragment extraction: `*.html` → `*.part.html`.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use docsite_fragment::ExtractOptions;
use docsite_shared::{DocsiteError, Result};

use crate::progress::ProgressReporter;

/// What an extraction run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub written: usize,
    /// Pages without a header, written without a title meta tag.
    pub untitled: usize,
}

/// Extract every `*.html` directly inside `src` into `dst`.
///
/// `dst` is created when missing; existing fragments are overwritten.
#[instrument(skip_all, fields(src = %src.display(), dst = %dst.display()))]
pub fn extract_dir(
    src: &Path,
    dst: &Path,
    opts: &ExtractOptions,
    progress: &dyn ProgressReporter,
) -> Result<ExtractSummary> {
    let pages = list_html(src)?;
    std::fs::create_dir_all(dst).map_err(|e| DocsiteError::io(dst, e))?;

    progress.phase("Extracting fragments");
    let mut summary = ExtractSummary::default();
    let total = pages.len();

    for (i, page) in pages.iter().enumerate() {
        let raw = std::fs::read(page).map_err(|e| DocsiteError::io(page, e))?;
        let html = String::from_utf8_lossy(&raw);
        let fragment = docsite_fragment::extract(&html, opts);

        let name = page
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if fragment.title.is_none() {
            warn!(page = %name, "no header; fragment has no title");
            summary.untitled += 1;
        }

        let out = dst.join(part_name(&name));
        std::fs::write(&out, fragment.html).map_err(|e| DocsiteError::io(&out, e))?;
        summary.written += 1;
        progress.item(&name, i + 1, total);
    }

    progress.finish();
    info!(written = summary.written, untitled = summary.untitled, "extraction complete");
    Ok(summary)
}

/// `foo.html` → `foo.part.html`.
pub fn part_name(filename: &str) -> String {
    let stem = filename.strip_suffix(".html").unwrap_or(filename);
    format!("{stem}.part.html")
}

/// `*.html` files directly in `dir`, sorted by name.
fn list_html(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocsiteError::io(dir, e))?;
    let mut pages = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DocsiteError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}
