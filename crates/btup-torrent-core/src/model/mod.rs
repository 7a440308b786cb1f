//! Core seeding domain types shared across the workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seeder count recorded for items that have never been measured.
///
/// Sorts after every real count so unmeasured items are considered last.
pub const UNMEASURED_SEEDERS: u32 = u32::MAX;

/// Download cap applied to recount participants (100 KiB/s).
pub const RECOUNT_DOWNLOAD_LIMIT_BPS: u64 = 100 * 1024;

/// Statistics tracked for a single catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Seconds since the Unix epoch of the last recount, `0` when never measured.
    pub last_measured_time: u64,
    /// Last known number of seeders, [`UNMEASURED_SEEDERS`] when unknown.
    pub seeder_count: u32,
}

impl TorrentRecord {
    /// Record assigned to a freshly discovered definition.
    #[must_use]
    pub const fn discovered() -> Self {
        Self {
            last_measured_time: 0,
            seeder_count: UNMEASURED_SEEDERS,
        }
    }

    /// Record produced by a completed measurement.
    #[must_use]
    pub const fn measured(at: u64, seeder_count: u32) -> Self {
        Self {
            last_measured_time: at,
            seeder_count,
        }
    }
}

/// Opaque identity of one engine participant, echoed back on every alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Allocate a fresh random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a participant was added to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// Sharing retained data with the swarm.
    Seeding,
    /// Temporary participation used only to obtain a scrape reply.
    Recounting,
}

impl SessionRole {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Recounting => "recounting",
        }
    }
}

/// Controller-side bookkeeping for one engine participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity shared with the engine.
    pub token: SessionToken,
    /// Catalog name of the item.
    pub name: String,
    /// Purpose of the participation.
    pub role: SessionRole,
    /// Seconds since the Unix epoch when the add was issued.
    pub created_at: u64,
}

impl Session {
    /// Create a session with a freshly allocated token.
    #[must_use]
    pub fn new(name: impl Into<String>, role: SessionRole, created_at: u64) -> Self {
        Self {
            token: SessionToken::new(),
            name: name.into(),
            role,
            created_at,
        }
    }

    /// Seconds elapsed since the add was issued.
    #[must_use]
    pub const fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

/// Request payload for admitting a participant into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTorrent {
    /// Identity the engine must echo back on alerts.
    pub token: SessionToken,
    /// Catalog name of the item.
    pub name: String,
    /// Path of the definition file.
    pub definition: PathBuf,
    /// Directory the engine stores payload data in.
    pub save_path: PathBuf,
    /// Optional download cap in bytes per second.
    pub download_limit_bps: Option<u64>,
}

/// Session-wide settings applied once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Hide client identity from peers and trackers.
    pub anonymous_mode: bool,
    /// Largest metadata blob the engine accepts, in bytes.
    pub max_metadata_size: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            anonymous_mode: true,
            max_metadata_size: 1240 * 1024 * 1024,
        }
    }
}

/// Status fields the controller reads from a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    /// Seeds currently known to the engine through the swarm and DHT.
    pub known_peers: u32,
    /// Whether a complete local copy of the payload is present.
    pub has_complete_copy: bool,
}

/// Alerts drained from the engine, decided once at the boundary.
///
/// `token` is `None` when the participant is no longer valid inside the
/// engine; such alerts carry no actionable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineAlert {
    /// An asynchronous add completed.
    AddConfirmed {
        /// Participant identity.
        token: Option<SessionToken>,
        /// Status at confirmation time.
        status: TorrentSnapshot,
    },
    /// A tracker answered a scrape request.
    ScrapeReply {
        /// Participant identity.
        token: Option<SessionToken>,
        /// Raw `complete` field; negative values mean the tracker did not say.
        complete: i64,
    },
    /// Any other participant alert.
    Unhandled {
        /// Participant identity.
        token: Option<SessionToken>,
        /// Engine-specific alert name.
        kind: String,
    },
}

impl EngineAlert {
    /// Identity of the participant the alert concerns.
    #[must_use]
    pub const fn token(&self) -> Option<SessionToken> {
        match self {
            Self::AddConfirmed { token, .. }
            | Self::ScrapeReply { token, .. }
            | Self::Unhandled { token, .. } => *token,
        }
    }
}

/// Convert a raw scrape `complete` field into a usable seeder count.
///
/// Returns `None` for negative values and for values that would collide with
/// [`UNMEASURED_SEEDERS`].
#[must_use]
pub fn seeders_from_scrape(complete: i64) -> Option<u32> {
    u32::try_from(complete)
        .ok()
        .filter(|count| *count != UNMEASURED_SEEDERS)
}
