//! Bid/ask extrema over a sliding time window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::{InstrumentId, Price, Quantity};

use super::windowed_min_max::WindowedMinMaxPrices;

/// Top-of-book quote for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub instrument_id: InstrumentId,
    pub bid: Price,
    pub ask: Price,
    pub bid_size: Quantity,
    pub ask_size: Quantity,
    pub ts_event: DateTime<Utc>,
}

impl QuoteTick {
    pub fn new(
        instrument_id: InstrumentId,
        bid: Price,
        ask: Price,
        bid_size: Quantity,
        ask_size: Quantity,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            instrument_id,
            bid,
            ask,
            bid_size,
            ask_size,
            ts_event,
        }
    }
}

/// Tracks the windowed min/max of bid and ask prices for one instrument.
pub struct BidAskMinMax {
    /// Instrument this indicator observes
    pub instrument_id: InstrumentId,
    /// Windowed bid extrema
    pub bids: WindowedMinMaxPrices,
    /// Windowed ask extrema
    pub asks: WindowedMinMaxPrices,
    initialized: bool,
}

impl BidAskMinMax {
    /// Create the indicator with the given window duration.
    pub fn new(instrument_id: InstrumentId, window: Duration) -> Self {
        Self {
            instrument_id,
            bids: WindowedMinMaxPrices::new(window),
            asks: WindowedMinMaxPrices::new(window),
            initialized: false,
        }
    }

    /// Returns true once at least one quote has been observed.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Update the indicator from a quote tick.
    ///
    /// Quotes for other instruments are ignored.
    pub fn handle_quote_tick(&mut self, tick: &QuoteTick) {
        if tick.instrument_id != self.instrument_id {
            return;
        }
        self.bids.add(tick.ts_event, tick.bid);
        self.asks.add(tick.ts_event, tick.ask);
        self.initialized = true;
    }

    /// Clear all window state.
    pub fn reset(&mut self) {
        self.bids.reset();
        self.asks.reset();
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn instrument() -> InstrumentId {
        InstrumentId::new("SPY", "ARCA").unwrap()
    }

    fn quote(bid: rust_decimal::Decimal, ask: rust_decimal::Decimal, min: u32) -> QuoteTick {
        QuoteTick::new(
            instrument(),
            Price::from_decimal(bid).unwrap(),
            Price::from_decimal(ask).unwrap(),
            Quantity::from_decimal(dec!(1)).unwrap(),
            Quantity::from_decimal(dec!(1)).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, min, 0).unwrap(),
        )
    }

    #[test]
    fn test_starts_uninitialized() {
        let indicator = BidAskMinMax::new(instrument(), Duration::minutes(5));
        assert!(!indicator.initialized());
        assert_eq!(indicator.bids.min_price(), None);
        assert_eq!(indicator.bids.max_price(), None);
        assert_eq!(indicator.asks.min_price(), None);
        assert_eq!(indicator.asks.max_price(), None);
    }

    #[test]
    fn test_handle_quote_ticks() {
        let mut indicator = BidAskMinMax::new(instrument(), Duration::minutes(5));
        indicator.handle_quote_tick(&quote(dec!(1.0), dec!(2.0), 0));
        // 5 min later, still inside the window
        indicator.handle_quote_tick(&quote(dec!(0.9), dec!(2.1), 5));

        assert!(indicator.initialized());
        assert_eq!(indicator.bids.min_price(), Some(Price::from_decimal(dec!(0.9)).unwrap()));
        assert_eq!(indicator.bids.max_price(), Some(Price::from_decimal(dec!(1.0)).unwrap()));
        assert_eq!(indicator.asks.min_price(), Some(Price::from_decimal(dec!(2.0)).unwrap()));
        assert_eq!(indicator.asks.max_price(), Some(Price::from_decimal(dec!(2.1)).unwrap()));
    }

    #[test]
    fn test_ignores_other_instruments() {
        let mut indicator = BidAskMinMax::new(instrument(), Duration::minutes(5));
        let mut other = quote(dec!(1.0), dec!(2.0), 0);
        other.instrument_id = InstrumentId::new("QQQ", "ARCA").unwrap();
        indicator.handle_quote_tick(&other);
        assert!(!indicator.initialized());
    }

    #[test]
    fn test_reset() {
        let mut indicator = BidAskMinMax::new(instrument(), Duration::minutes(5));
        indicator.handle_quote_tick(&quote(dec!(1.0), dec!(2.0), 0));
        indicator.reset();
        assert!(!indicator.initialized());
        assert_eq!(indicator.bids.min_price(), None);
        assert_eq!(indicator.asks.max_price(), None);
    }
}
