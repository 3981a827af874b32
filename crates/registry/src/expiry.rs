use mandate_core::math::day_bucket;
use mandate_core::types::{Amount, UnixTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Forward-looking schedule of capital limits by expiry day.
///
/// Append-only: buckets accumulate at mint time and are never decremented,
/// even when a record settles early. A capacity-planning hint, not a source
/// of truth for currently-active capital.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyExpiryBucket {
    buckets: BTreeMap<UnixTime, Amount>,
}

impl DailyExpiryBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates a record's capital limit into its expiry day's bucket.
    pub fn accumulate(&mut self, expiry_time: UnixTime, capital_limit: Amount) {
        let bucket = self.buckets.entry(day_bucket(expiry_time)).or_insert(0);
        *bucket = bucket.saturating_add(capital_limit);
    }

    /// Total capital limit scheduled to expire on the day containing `ts`.
    #[must_use]
    pub fn scheduled_for(&self, ts: UnixTime) -> Amount {
        self.buckets.get(&day_bucket(ts)).copied().unwrap_or(0)
    }

    /// Total capital limit scheduled to expire in `[from, to)`.
    #[must_use]
    pub fn scheduled_between(&self, from: UnixTime, to: UnixTime) -> Amount {
        self.buckets
            .range(day_bucket(from)..day_bucket(to))
            .map(|(_, amount)| amount)
            .sum()
    }
}
