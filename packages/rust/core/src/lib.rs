//! Documentation build jobs for docsite.
//!
//! Each module is one stage of the publishing pipeline: normalize the TOC
//! ([`toc`]), extract page fragments ([`extract`]), render the browsable site
//! ([`site`]), index it for search ([`index`]), or stitch it into a single
//! document for PDF output ([`concat`]).

pub mod categories;
pub mod concat;
pub mod extract;
pub mod index;
pub mod progress;
pub mod site;
pub mod toc;
