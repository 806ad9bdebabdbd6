//! OHLCV bar and trading signal representation.

use chrono::NaiveDateTime;
use std::fmt;

/// Discrete per-bar trading signal.
///
/// `Hold` doubles as an exit request: a long position is closed on either
/// `Sell` or `Hold`, while `Hold` does nothing when flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Integer encoding: +1 buy, -1 sell, 0 hold.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Signal::Buy),
            -1 => Some(Signal::Sell),
            0 => Some(Signal::Hold),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub signal: Option<Signal>,
}

impl Bar {
    pub fn with_signal(self, signal: Option<Signal>) -> Self {
        Bar { signal, ..self }
    }

    /// Returns the name of the first OHLC field that is not a positive finite number.
    pub fn invalid_price_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
            signal: None,
        }
    }

    #[test]
    fn signal_integer_encoding() {
        assert_eq!(Signal::from_i64(1), Some(Signal::Buy));
        assert_eq!(Signal::from_i64(-1), Some(Signal::Sell));
        assert_eq!(Signal::from_i64(0), Some(Signal::Hold));
        assert_eq!(Signal::from_i64(2), None);
        assert_eq!(Signal::Sell.as_i64(), -1);
    }

    #[test]
    fn with_signal_keeps_prices() {
        let bar = sample_bar().with_signal(Some(Signal::Buy));
        assert_eq!(bar.signal, Some(Signal::Buy));
        assert!((bar.close - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_prices_pass() {
        assert_eq!(sample_bar().invalid_price_field(), None);
    }

    #[test]
    fn non_positive_close_detected() {
        let bar = Bar {
            close: 0.0,
            ..sample_bar()
        };
        assert_eq!(bar.invalid_price_field(), Some("close"));
    }

    #[test]
    fn nan_open_detected() {
        let bar = Bar {
            open: f64::NAN,
            ..sample_bar()
        };
        assert_eq!(bar.invalid_price_field(), Some("open"));
    }
}
