//! One collector per upstream. Each owns its gauges and sets every one of
//! them on every scrape.

use chrono::{DateTime, Datelike, Duration, DurationRound, Utc};

pub use self::actions::ActionsCollector;
pub use self::auth::AuthCollector;
pub use self::coingecko::{CoingeckoCollector, COINGECKO_API_URL, COINGECKO_KEY_HEADER};
pub use self::evm::{EvmBalanceCollector, EvmChain};
pub use self::intents::IntentsCollector;
pub use self::messari::{MessariCollector, MESSARI_API_URL};
pub use self::mint::MintCollector;
pub use self::openai::{OpenAiCollector, OPENAI_API_URL};
pub use self::validators::{GrpcConnector, ValidatorsCollector};
pub use self::venice::{VeniceCollector, VENICE_API_URL};
pub use self::wallet::WalletCollector;
pub use self::warden::WardenCollector;
pub use self::warp::WarpCollector;
pub use self::xai::{XaiCollector, XAI_API_URL};

mod actions;
mod auth;
mod coingecko;
mod evm;
mod intents;
mod messari;
mod mint;
mod openai;
mod validators;
mod venice;
mod wallet;
mod warden;
mod warp;
mod xai;

/// Label value for a flag.
pub(crate) fn bool_label(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Lossy conversion of a count for a gauge.
pub(crate) fn count(value: u64) -> f64 {
    value as f64
}

/// Midnight UTC on the first day of `now`'s month.
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) - Duration::days(i64::from(now.day0()))
}

/// Midnight UTC of `now`'s day.
pub(crate) fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::days(1)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn period_starts() {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 14, 5, 9).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            day_start(now),
            Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap()
        );

        let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(month_start(first), first);
    }
}
