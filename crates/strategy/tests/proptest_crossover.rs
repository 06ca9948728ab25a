use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;
use strategy::CrossoverDetector;

use common::Signal;

fn detector() -> CrossoverDetector {
    CrossoverDetector::new(Duration::hours(1), Duration::minutes(15)).unwrap()
}

fn price() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    /// Whatever the averages, the first observation of a fresh detector is silent.
    #[test]
    fn warm_up_tick_never_signals(long in price(), short in price()) {
        let mut d = detector();
        prop_assert_eq!(d.observe(long, short), None);
    }

    /// While the ordering between short and long persists, a signal fires
    /// only on the tick where the crossing happened.
    #[test]
    fn buy_fires_exactly_once_per_crossing(
        long in price(),
        below in 1i64..10_000,
        above in prop::collection::vec(1i64..10_000, 1..20),
    ) {
        let mut d = detector();
        d.observe(long, long - Decimal::new(below, 2));

        let mut buys = 0;
        for step in above {
            match d.observe(long, long + Decimal::new(step, 2)) {
                Some(Signal::Buy) => buys += 1,
                Some(Signal::Sell) => prop_assert!(false, "sell while short stays above long"),
                None => {}
            }
        }
        prop_assert_eq!(buys, 1);
    }

    #[test]
    fn sell_fires_exactly_once_per_crossing(
        long in (100_000i64..1_000_000).prop_map(|c| Decimal::new(c, 2)),
        above in 1i64..10_000,
        below in prop::collection::vec(1i64..10_000, 1..20),
    ) {
        let mut d = detector();
        d.observe(long, long + Decimal::new(above, 2));

        let mut sells = 0;
        for step in below {
            match d.observe(long, long - Decimal::new(step, 2)) {
                Some(Signal::Sell) => sells += 1,
                Some(Signal::Buy) => prop_assert!(false, "buy while short stays below long"),
                None => {}
            }
        }
        prop_assert_eq!(sells, 1);
    }

    /// A detector only ever signals when the previous short average lies
    /// strictly on the other side of the long average.
    #[test]
    fn signals_require_a_strict_crossing(
        samples in prop::collection::vec((price(), price()), 1..50),
    ) {
        let mut d = detector();
        for (long, short) in samples {
            let previous = d.last_short_average();
            match d.observe(long, short) {
                Some(Signal::Buy) => {
                    let previous = previous.unwrap();
                    prop_assert!(previous < long && long < short);
                }
                Some(Signal::Sell) => {
                    let previous = previous.unwrap();
                    prop_assert!(previous > long && long > short);
                }
                None => {}
            }
            prop_assert_eq!(d.last_short_average(), Some(short));
        }
    }
}
