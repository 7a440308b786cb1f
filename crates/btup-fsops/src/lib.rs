//! Filesystem side of the seeding controller: where definitions, retained
//! payloads and recount scratch data live, and how they are reconciled.
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

pub mod error;
pub mod inventory;
pub mod layout;

pub use error::{FsOpsError, FsOpsResult};
pub use inventory::{DataInventory, RetainedData, reconcile_data_dir, scan_definitions};
pub use layout::CatalogLayout;
