//! fast-load: bulk-upload a local directory tree to a Box folder.
//!
//! The crate is an orchestration shell around one storage client call per
//! file: enumerate the source tree, feed a bounded worker pool, retry
//! transient failures with exponential backoff, and summarise the
//! outcomes. See [`cli::run`] for the end-to-end flow.

pub mod cli;
pub mod client;
pub mod credentials;
pub mod error;
pub mod report;
pub mod retry;
pub mod upload;
pub mod walk;
