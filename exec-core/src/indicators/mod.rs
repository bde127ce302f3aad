//! Price-window indicators.

pub mod bid_ask_min_max;
pub mod windowed_min_max;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::ValidationError;

pub use bid_ask_min_max::{BidAskMinMax, QuoteTick};
pub use windowed_min_max::WindowedMinMaxPrices;

/// Check that a parsed timestamp is UTC-tagged.
///
/// Indicator inputs arrive from wire parsers as offset-carrying timestamps;
/// anything other than a zero offset fails with
/// [`ValidationError::TimestampNotUtc`].
pub fn ensure_utc(ts: DateTime<FixedOffset>) -> Result<DateTime<Utc>, ValidationError> {
    if ts.offset().fix().local_minus_utc() != 0 {
        return Err(ValidationError::TimestampNotUtc(ts.to_rfc3339()));
    }
    Ok(ts.with_timezone(&Utc))
}
