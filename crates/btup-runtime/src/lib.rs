#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Runtime state for seeder statistics: the in-memory store, its persisted
//! text form and reconciliation against the definition catalog.

pub mod catalog;
pub mod error;
pub mod format;
pub mod store;

pub use catalog::{CatalogDelta, reconcile_catalog};
pub use error::{StatsError, StatsResult};
pub use format::{STATS_HEADER, decode_line, encode_records};
pub use store::{STATS_FLUSH_INTERVAL_SECS, StatsStore};
