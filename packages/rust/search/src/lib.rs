//! Search service access for docsite.
//!
//! - [`batch`]: upload batch and search response wire types
//! - [`client`]: the [`SearchService`] seam and its HTTP implementation
//! - [`readiness`]: countdown polling for endpoints that are still starting

pub mod batch;
pub mod client;
pub mod readiness;

pub use batch::{
    DocumentFields, DocumentOp, Hit, Hits, SearchResponse, UploadMessage, UploadResponse,
    deletions,
};
pub use client::{HttpSearchClient, SearchCheck, SearchQuery, SearchService};
pub use readiness::{PollSchedule, wait_until_ready};
