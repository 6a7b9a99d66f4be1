//! Wire types for the search service: upload batches and search responses.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use docsite_shared::DocumentRecord;

// ---------------------------------------------------------------------------
// Upload batch
// ---------------------------------------------------------------------------

/// One entry of a document batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentOp {
    Add { id: String, fields: DocumentFields },
    Delete { id: String },
}

/// Indexed fields of an added document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub content: String,
    pub title: String,
    pub category: String,
    pub context: String,
    /// The original filename; the document id may be a digest of it.
    pub id: String,
}

impl DocumentOp {
    pub fn id(&self) -> &str {
        match self {
            Self::Add { id, .. } | Self::Delete { id } => id,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

impl From<&DocumentRecord> for DocumentOp {
    fn from(record: &DocumentRecord) -> Self {
        Self::Add {
            id: record.id.clone(),
            fields: DocumentFields {
                content: record.content.clone(),
                title: record.title.clone(),
                category: record.category.clone(),
                context: record.context.clone(),
                id: record.filename.clone(),
            },
        }
    }
}

/// Delete operations for every existing id that is not in `keep`.
///
/// Order follows `existing`; duplicates are dropped.
pub fn deletions<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    keep: &BTreeSet<&str>,
) -> Vec<DocumentOp> {
    let mut seen = BTreeSet::new();
    existing
        .into_iter()
        .filter(|id| !keep.contains(id) && seen.insert(*id))
        .map(|id| DocumentOp::Delete { id: id.to_string() })
        .collect()
}

/// Answer to a batch upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub adds: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub errors: Vec<UploadMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadMessage {
    pub message: String,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ---------------------------------------------------------------------------
// Search response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub hit: Vec<Hit>,
}

/// A single search hit. Every returned field is a list of strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Hit {
    /// First value of a returned field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.first().map(String::as_str)
    }
}

impl SearchResponse {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hits.hit.iter().map(|h| h.id.as_str())
    }
}
