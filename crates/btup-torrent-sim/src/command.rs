//! Record of every command the simulated engine received.

use std::path::PathBuf;

use btup_torrent_core::{EngineSettings, SessionToken};

/// Command as observed by the engine, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Session-wide settings were applied.
    ApplySettings(EngineSettings),
    /// A participant was added.
    Add {
        /// Participant identity.
        token: SessionToken,
        /// Catalog name of the item.
        name: String,
        /// Directory the payload is stored in.
        save_path: PathBuf,
        /// Download cap requested for the participant.
        download_limit_bps: Option<u64>,
    },
    /// A participant was removed.
    Remove {
        /// Participant identity.
        token: SessionToken,
    },
    /// A scrape was requested.
    Scrape {
        /// Participant identity.
        token: SessionToken,
    },
}

impl EngineCommand {
    /// Whether the command added a participant.
    #[must_use]
    pub const fn is_add(&self) -> bool {
        matches!(self, Self::Add { .. })
    }

    /// Whether the command removed a participant.
    #[must_use]
    pub const fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}
