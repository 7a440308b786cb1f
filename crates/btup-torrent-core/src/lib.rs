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

//! Engine-agnostic seeding interfaces and DTOs.
//!
//! Layout: `model/` (sessions, alerts, records), `service/` (the
//! [`SeedEngine`] boundary), `metainfo.rs` (definition file parsing),
//! `error.rs`.

pub mod error;
pub mod metainfo;
pub mod model;
pub mod service;

pub use error::{TorrentError, TorrentResult};
pub use metainfo::TorrentMetainfo;
pub use model::{
    AddTorrent, EngineAlert, EngineSettings, RECOUNT_DOWNLOAD_LIMIT_BPS, Session, SessionRole,
    SessionToken, TorrentRecord, TorrentSnapshot, UNMEASURED_SEEDERS, seeders_from_scrape,
};
pub use service::SeedEngine;
