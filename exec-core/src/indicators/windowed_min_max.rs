//! Sliding-window price extrema over a fixed time horizon.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::orders::Price;

/// Minimum and maximum price observed within a sliding time window.
///
/// Two monotonic deques (front = oldest) carry the candidate extrema:
/// the min-sequence is non-decreasing front to back, the max-sequence
/// non-increasing. On insert, dominated tail entries are evicted before the
/// append, then expired front entries (older than `now - window`, where `now`
/// is the inserted timestamp) are dropped from both. Amortized O(1) per
/// insert; memory bounded by the number of distinct extrema in the window.
#[derive(Debug, Clone)]
pub struct WindowedMinMaxPrices {
    window: Duration,
    min_prices: VecDeque<(DateTime<Utc>, Price)>,
    max_prices: VecDeque<(DateTime<Utc>, Price)>,
}

impl WindowedMinMaxPrices {
    /// Create a new window of the given duration.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            min_prices: VecDeque::new(),
            max_prices: VecDeque::new(),
        }
    }

    /// The configured window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Minimum price within the window, if any entries remain.
    pub fn min_price(&self) -> Option<Price> {
        self.min_prices.front().map(|(_, price)| *price)
    }

    /// Maximum price within the window, if any entries remain.
    pub fn max_price(&self) -> Option<Price> {
        self.max_prices.front().map(|(_, price)| *price)
    }

    /// Record a price observation.
    ///
    /// `ts` becomes the window's `now`; entries older than `ts - window` are
    /// expired. Timestamps are assumed monotone per stream source.
    pub fn add(&mut self, ts: DateTime<Utc>, price: Price) {
        while self
            .min_prices
            .back()
            .is_some_and(|(_, tail)| *tail >= price)
        {
            self.min_prices.pop_back();
        }
        self.min_prices.push_back((ts, price));

        while self
            .max_prices
            .back()
            .is_some_and(|(_, tail)| *tail <= price)
        {
            self.max_prices.pop_back();
        }
        self.max_prices.push_back((ts, price));

        let cutoff = ts - self.window;
        while self
            .min_prices
            .front()
            .is_some_and(|(entry_ts, _)| *entry_ts < cutoff)
        {
            self.min_prices.pop_front();
        }
        while self
            .max_prices
            .front()
            .is_some_and(|(entry_ts, _)| *entry_ts < cutoff)
        {
            self.max_prices.pop_front();
        }
    }

    /// Clear all entries.
    pub fn reset(&mut self) {
        self.min_prices.clear();
        self.max_prices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_770_000_000 + secs, 0).unwrap()
    }

    fn px(v: rust_decimal::Decimal) -> Price {
        Price::from_decimal(v).unwrap()
    }

    #[test]
    fn test_empty_window_reports_none() {
        let window = WindowedMinMaxPrices::new(Duration::minutes(5));
        assert_eq!(window.min_price(), None);
        assert_eq!(window.max_price(), None);
    }

    #[test]
    fn test_single_price_is_both_extrema() {
        let mut window = WindowedMinMaxPrices::new(Duration::minutes(5));
        window.add(ts(0), px(dec!(1.0)));
        assert_eq!(window.min_price(), Some(px(dec!(1.0))));
        assert_eq!(window.max_price(), Some(px(dec!(1.0))));
    }

    #[test]
    fn test_multiple_prices_in_window() {
        let mut window = WindowedMinMaxPrices::new(Duration::minutes(5));
        window.add(ts(0), px(dec!(1.0)));
        // 5 min later, still inside the window
        window.add(ts(300), px(dec!(0.9)));
        assert_eq!(window.min_price(), Some(px(dec!(0.9))));
        assert_eq!(window.max_price(), Some(px(dec!(1.0))));
    }

    #[test]
    fn test_entries_expire() {
        let mut window = WindowedMinMaxPrices::new(Duration::minutes(5));
        window.add(ts(0), px(dec!(1.0)));
        window.add(ts(300), px(dec!(0.9)));
        // One second past the first entry's lifetime
        window.add(ts(301), px(dec!(0.95)));
        assert_eq!(window.min_price(), Some(px(dec!(0.90))));
        assert_eq!(window.max_price(), Some(px(dec!(0.95))));
    }

    #[test]
    fn test_window_extrema_over_mixed_adds() {
        let mut window = WindowedMinMaxPrices::new(Duration::seconds(60));
        window.add(ts(0), px(dec!(100)));
        window.add(ts(20), px(dec!(98)));
        window.add(ts(40), px(dec!(102)));
        window.add(ts(70), px(dec!(99)));
        // Cutoff is t=10: the t=0 entry has expired
        assert_eq!(window.min_price(), Some(px(dec!(98))));
        assert_eq!(window.max_price(), Some(px(dec!(102))));
    }

    #[test]
    fn test_monotone_sequences_bound_memory() {
        let mut window = WindowedMinMaxPrices::new(Duration::seconds(1000));
        // Strictly rising prices: every entry is a candidate minimum, but the
        // max-sequence collapses to the single newest entry
        for i in 0..100 {
            window.add(ts(i), px(rust_decimal::Decimal::from(100 + i)));
        }
        assert_eq!(window.min_price(), Some(px(dec!(100))));
        assert_eq!(window.max_price(), Some(px(dec!(199))));
        assert_eq!(window.min_prices.len(), 100);
        assert_eq!(window.max_prices.len(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut window = WindowedMinMaxPrices::new(Duration::minutes(5));
        window.add(ts(0), px(dec!(1.0)));
        window.reset();
        assert_eq!(window.min_price(), None);
        assert_eq!(window.max_price(), None);
    }
}
