use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use derive_new::new;

use crate::{ChainCommunicationError, ChainResult};

/// The parts of a block header the exporter cares about.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct BlockHeader {
    /// Block height
    pub height: u64,
    /// Block time
    pub time: DateTime<Utc>,
    /// Bech32 consensus address of the proposer
    pub proposer: String,
}

/// Heights of the `count` most recent blocks ending at `latest`, never below 1.
pub fn trailing_window(latest: u64, count: u64) -> RangeInclusive<u64> {
    let start = latest.saturating_sub(count.saturating_sub(1)).max(1);
    start..=latest
}

/// Count how many of the given blocks each consensus address proposed.
pub fn tally_proposers<'a>(
    headers: impl IntoIterator<Item = &'a BlockHeader>,
) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for header in headers {
        *counts.entry(header.proposer.clone()).or_insert(0) += 1;
    }
    counts
}

/// Mean seconds per block between two timestamps `block_count` blocks apart.
pub fn average_block_time(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    block_count: u64,
) -> ChainResult<f64> {
    if block_count == 0 {
        return Err(ChainCommunicationError::InvalidBlockCount);
    }
    let elapsed = end.signed_duration_since(start);
    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    Ok(seconds / block_count as f64)
}

/// Average block time between two headers, using their height difference as the count.
pub fn average_block_time_between(start: &BlockHeader, end: &BlockHeader) -> ChainResult<f64> {
    average_block_time(
        start.time,
        end.time,
        end.height.saturating_sub(start.height),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn window_is_clamped_at_genesis() {
        assert_eq!(trailing_window(1000, 200), 801..=1000);
        assert_eq!(trailing_window(50, 200), 1..=50);
        assert_eq!(trailing_window(0, 10), 1..=0);
        assert_eq!(trailing_window(10, 1), 10..=10);
    }

    #[test]
    fn tally_counts_every_occurrence() {
        let proposers = ["a", "b", "a", "c", "a", "b"];
        let headers: Vec<_> = proposers
            .iter()
            .enumerate()
            .map(|(i, p)| BlockHeader::new(i as u64 + 1, at(i as i64 * 6), p.to_string()))
            .collect();

        let counts = tally_proposers(&headers);

        assert_eq!(counts.len(), 3);
        assert_eq!(counts["a"], 3);
        assert_eq!(counts["b"], 2);
        assert_eq!(counts["c"], 1);
        assert_eq!(counts.values().sum::<u64>(), headers.len() as u64);
    }

    #[test]
    fn average_is_elapsed_over_count() {
        assert_eq!(average_block_time(at(0), at(600), 100).unwrap(), 6.0);
        assert_eq!(average_block_time(at(0), at(5), 2).unwrap(), 2.5);
    }

    #[test]
    fn average_over_zero_blocks_is_an_error() {
        let err = average_block_time(at(0), at(10), 0).unwrap_err();
        assert!(matches!(err, ChainCommunicationError::InvalidBlockCount));

        let header = BlockHeader::new(10, at(0), "a".into());
        assert!(average_block_time_between(&header, &header).is_err());
    }

    #[test]
    fn average_between_headers() {
        let start = BlockHeader::new(100, at(0), "a".into());
        let end = BlockHeader::new(200, at(550), "b".into());
        assert_eq!(average_block_time_between(&start, &end).unwrap(), 5.5);
    }
}
