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

//! Binary entrypoint for the `btup` seeding controller.

use btup_app::{AppResult, run_app};

/// Runs the controller until Ctrl-C.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
