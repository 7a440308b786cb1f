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

//! Seeding controller wiring: command line, bootstrap and the tick loop.
//!
//! Layout: `bootstrap.rs` (startup and shutdown wiring), `cli.rs` (flags),
//! `controller/` (admission, recounts, alert routing), `orchestrator.rs`
//! (tick scheduling), `error.rs`.

/// Application bootstrap and engine wiring.
pub mod bootstrap;
/// Command-line flags.
pub mod cli;
/// Admission, recount and alert reconciliation.
pub mod controller;
/// Application error type.
pub mod error;
/// Tick loop scheduling the controller.
pub mod orchestrator;

pub use bootstrap::{run_app, run_seeder};
pub use controller::{AdmissionReport, Controller, EvictionPlan, RetainedEntry, plan_eviction};
pub use error::{AppError, AppResult};
pub use orchestrator::{Orchestrator, TickReport, unix_now};
