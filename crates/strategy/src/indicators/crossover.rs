use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use common::{CandleField, CandleStorage, DateTimeInterval, Error, Pair, Result, Signal};

/// Moving-average crossover detector.
///
/// Compares the mean close over a long and a short trailing window. A signal
/// fires only on the tick where the short average crosses the long one,
/// measured against the short average of the previous tick:
/// `prev_short < long < short` is BUY, `prev_short > long > short` is SELL.
/// The first evaluation has no previous short average and never signals.
#[derive(Debug, Clone)]
pub struct CrossoverDetector {
    long_window: Duration,
    short_window: Duration,
    last_short_average: Option<Decimal>,
}

impl CrossoverDetector {
    pub fn new(long_window: Duration, short_window: Duration) -> Result<Self> {
        if short_window <= Duration::zero() {
            return Err(Error::Config(format!(
                "short average window must be positive, got {short_window}"
            )));
        }
        if short_window >= long_window {
            return Err(Error::Config(format!(
                "short average window ({short_window}) must be shorter than the long one ({long_window})"
            )));
        }
        Ok(Self {
            long_window,
            short_window,
            last_short_average: None,
        })
    }

    pub fn last_short_average(&self) -> Option<Decimal> {
        self.last_short_average
    }

    /// Feed one pair of averages and return the crossing signal, if any.
    pub fn observe(&mut self, long_average: Decimal, short_average: Decimal) -> Option<Signal> {
        let signal = self.last_short_average.and_then(|previous| {
            if previous < long_average && long_average < short_average {
                Some(Signal::Buy)
            } else if previous > long_average && long_average > short_average {
                Some(Signal::Sell)
            } else {
                None
            }
        });
        self.last_short_average = Some(short_average);
        signal
    }

    /// Compute both averages from storage at `now` and observe them.
    ///
    /// Missing candles in either window fail the whole evaluation and leave
    /// the previous short average untouched.
    pub async fn check(
        &mut self,
        storage: &dyn CandleStorage,
        market_name: &str,
        pair: &Pair,
        now: DateTime<Utc>,
    ) -> Result<Option<Signal>> {
        let long_average = storage
            .mean(market_name, pair, CandleField::Close, trailing(now, self.long_window)?)
            .await?;
        let short_average = storage
            .mean(market_name, pair, CandleField::Close, trailing(now, self.short_window)?)
            .await?;

        debug!(
            pair = %pair,
            at = %now,
            long = %long_average,
            short = %short_average,
            previous_short = ?self.last_short_average,
            "Moving averages"
        );
        Ok(self.observe(long_average, short_average))
    }
}

fn trailing(now: DateTime<Utc>, window: Duration) -> Result<DateTimeInterval> {
    let since = now
        .checked_sub_signed(window)
        .ok_or_else(|| Error::Config(format!("window {window} reaches before the start of time")))?;
    DateTimeInterval::closed(since, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::Candle;
    use paper::MemoryCandleStorage;
    use rust_decimal_macros::dec;

    fn detector() -> CrossoverDetector {
        CrossoverDetector::new(Duration::minutes(30), Duration::minutes(15)).unwrap()
    }

    #[test]
    fn short_window_must_be_shorter_than_long() {
        assert!(CrossoverDetector::new(Duration::minutes(15), Duration::minutes(15)).is_err());
        assert!(CrossoverDetector::new(Duration::minutes(15), Duration::minutes(30)).is_err());
        assert!(CrossoverDetector::new(Duration::minutes(15), Duration::zero()).is_err());
    }

    #[test]
    fn first_observation_never_signals() {
        let mut d = detector();
        assert_eq!(d.observe(dec!(100), dec!(200)), None);
        assert_eq!(d.last_short_average(), Some(dec!(200)));
    }

    #[test]
    fn buy_fires_once_on_upward_crossing() {
        let mut d = detector();
        assert_eq!(d.observe(dec!(100), dec!(90)), None);
        assert_eq!(d.observe(dec!(100), dec!(110)), Some(Signal::Buy));
        assert_eq!(d.observe(dec!(100), dec!(120)), None);
        assert_eq!(d.observe(dec!(100), dec!(115)), None);
    }

    #[test]
    fn sell_fires_once_on_downward_crossing() {
        let mut d = detector();
        assert_eq!(d.observe(dec!(100), dec!(110)), None);
        assert_eq!(d.observe(dec!(100), dec!(90)), Some(Signal::Sell));
        assert_eq!(d.observe(dec!(100), dec!(80)), None);
    }

    #[test]
    fn touching_the_long_average_is_not_a_crossing() {
        let mut d = detector();
        d.observe(dec!(100), dec!(90));
        assert_eq!(d.observe(dec!(100), dec!(100)), None);
        // previous short is now equal to long, so rising above it is not strict
        assert_eq!(d.observe(dec!(100), dec!(110)), None);
    }

    #[test]
    fn previous_short_average_is_updated_when_signalling() {
        let mut d = detector();
        d.observe(dec!(100), dec!(90));
        d.observe(dec!(100), dec!(110));
        assert_eq!(d.last_short_average(), Some(dec!(110)));
    }

    fn candle(minute: u32, close: Decimal) -> Candle {
        Candle {
            market_name: "dummy_market".into(),
            pair: Pair::new("USD", "BTC"),
            time: Utc.with_ymd_and_hms(2017, 7, 2, 0, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    #[tokio::test]
    async fn check_reads_windows_from_storage() {
        let storage = MemoryCandleStorage::new("memory");
        storage
            .write_candles(vec![candle(10, dec!(8000)), candle(20, dec!(8300))])
            .await
            .unwrap();
        let pair = Pair::new("USD", "BTC");
        let mut d = detector();

        // long [0, 30] = 8150, short [15, 30] = 8300
        let at_30 = Utc.with_ymd_and_hms(2017, 7, 2, 0, 30, 0).unwrap();
        let signal = d.check(&storage, "dummy_market", &pair, at_30).await.unwrap();
        assert_eq!(signal, None);
        assert_eq!(d.last_short_average(), Some(dec!(8300)));
    }

    #[tokio::test]
    async fn check_fails_without_candles_and_keeps_state() {
        let storage = MemoryCandleStorage::new("memory");
        let pair = Pair::new("USD", "BTC");
        let mut d = detector();
        d.observe(dec!(1), dec!(2));

        let now = Utc.with_ymd_and_hms(2017, 7, 2, 0, 30, 0).unwrap();
        let err = d.check(&storage, "dummy_market", &pair, now).await.unwrap_err();
        assert!(matches!(err, Error::NoCandles { .. }));
        assert_eq!(d.last_short_average(), Some(dec!(2)));
    }
}
