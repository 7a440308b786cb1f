//! Text form of the statistics file.
//!
//! One record per line, `name/last_measured_time/seeder_count`, preceded by a
//! fixed header line. Names never contain `/` because they are file names, but
//! lines are split from the right so a stray separator only fails that line.

use std::fmt::Write as _;

use btup_torrent_core::TorrentRecord;

use crate::error::{StatsError, StatsResult};

/// First line of every statistics file.
pub const STATS_HEADER: &str = "torrent-name/last-recounting-time/number-of-seeders";

/// Render records, header first, one per line.
#[must_use]
pub fn encode_records<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a TorrentRecord)>,
{
    let mut out = String::from(STATS_HEADER);
    out.push('\n');
    for (name, record) in records {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{name}/{}/{}",
            record.last_measured_time, record.seeder_count
        );
    }
    out
}

/// Parse one record line. `line_no` is one-based and only used for errors.
///
/// # Errors
///
/// Returns [`StatsError::MalformedLine`] when a field is missing or not a
/// number, or when the name is empty.
pub fn decode_line(line_no: usize, line: &str) -> StatsResult<(String, TorrentRecord)> {
    let malformed = |reason| StatsError::MalformedLine {
        line: line_no,
        reason,
    };

    let mut fields = line.rsplitn(3, '/');
    let seeders = fields.next().ok_or_else(|| malformed("missing_fields"))?;
    let measured = fields.next().ok_or_else(|| malformed("missing_fields"))?;
    let name = fields.next().ok_or_else(|| malformed("missing_fields"))?;

    if name.is_empty() {
        return Err(malformed("empty_name"));
    }
    let last_measured_time = measured
        .trim()
        .parse::<u64>()
        .map_err(|_| malformed("invalid_time"))?;
    let seeder_count = seeders
        .trim()
        .parse::<u32>()
        .map_err(|_| malformed("invalid_seeders"))?;

    Ok((
        name.to_string(),
        TorrentRecord {
            last_measured_time,
            seeder_count,
        },
    ))
}
