//! Property tests for indicator and simulator invariants.
//!
//! Uses proptest to verify:
//! 1. EMA seed and recurrence
//! 2. RSI warm-up gap and [0, 100] bounds
//! 3. RSI zero-loss guard on rising series
//! 4. Trim length and MACD presence after calculation
//! 5. Ledger conservation: never cash and holdings at once, balance >= 0
//! 6. Backtest determinism

use proptest::prelude::*;
use std::num::NonZeroUsize;

use ratelab_core::engine::{Ledger, INITIAL_BALANCE};
use ratelab_core::indicators::{ema_of_series, wilder_rsi, WARMUP_TRIM};
use ratelab_core::{calculate_indicators, rule_signal, run_backtest, RawSample};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_rate() -> impl Strategy<Value = f64> {
    (5.0..25.0_f64).prop_map(|r| (r * 10_000.0).round() / 10_000.0)
}

fn arb_rates(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_rate(), min..max)
}

fn arb_period() -> impl Strategy<Value = NonZeroUsize> {
    (1usize..30).prop_map(|p| NonZeroUsize::new(p).unwrap())
}

fn to_samples(rates: &[f64]) -> Vec<RawSample> {
    rates
        .iter()
        .enumerate()
        .map(|(i, &r)| RawSample::new(i as i64 * 3_600_000, r))
        .collect()
}

// ── 1. EMA ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ema_seed_is_first_value(values in arb_rates(1, 200), span in 1usize..50) {
        let ema = ema_of_series(&values, span);
        prop_assert_eq!(ema.len(), values.len());
        prop_assert_eq!(ema[0], values[0]);
    }

    #[test]
    fn ema_follows_recurrence(values in arb_rates(2, 200), span in 1usize..50) {
        let ema = ema_of_series(&values, span);
        let k = 2.0 / (span as f64 + 1.0);
        for i in 1..values.len() {
            let expected = values[i] * k + ema[i - 1] * (1.0 - k);
            prop_assert!((ema[i] - expected).abs() < 1e-9);
        }
    }
}

// ── 2–3. RSI ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_warmup_then_bounded(rates in arb_rates(0, 200), period in arb_period()) {
        let rsi = wilder_rsi(&rates, period);
        prop_assert_eq!(rsi.len(), rates.len());
        let warmup = (period.get() + 1).min(rates.len());
        prop_assert!(rsi[..warmup].iter().all(Option::is_none));
        for v in rsi[warmup..].iter() {
            let v = v.expect("RSI defined after warm-up");
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn rising_series_hits_zero_loss_guard(
        start in 1.0..50.0_f64,
        steps in prop::collection::vec(0.01..2.0_f64, 20..80),
        period in arb_period(),
    ) {
        let mut rate = start;
        let mut rates = vec![rate];
        for step in steps {
            rate += step;
            rates.push(rate);
        }
        let expected = 100.0 - 100.0 / 101.0;
        for v in wilder_rsi(&rates, period).into_iter().flatten() {
            prop_assert!((v - expected).abs() < 1e-9);
        }
    }
}

// ── 4. Calculator trim ───────────────────────────────────────────────

proptest! {
    #[test]
    fn trim_length_and_macd_presence(rates in arb_rates(0, 150), period in arb_period()) {
        let out = calculate_indicators(&to_samples(&rates), period);
        prop_assert_eq!(out.len(), rates.len().saturating_sub(WARMUP_TRIM));
        for (j, s) in out.iter().enumerate() {
            prop_assert!(s.macd.is_some());
            prop_assert!(s.signal_line.is_some());
            prop_assert_eq!(s.rate, rates[j + WARMUP_TRIM]);
        }
    }
}

// ── 5–6. Simulator ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn ledger_never_holds_cash_and_units(rates in arb_rates(30, 200), period in arb_period()) {
        let series = calculate_indicators(&to_samples(&rates), period);
        prop_assume!(series.len() >= 2);

        let mut ledger = Ledger::new(INITIAL_BALANCE);
        for pair in series.windows(2) {
            ledger.apply(rule_signal(&pair[1], &pair[0]), pair[1].rate);
            prop_assert!(!(ledger.cash != 0.0 && ledger.holdings != 0.0));
            prop_assert!(ledger.cash > 0.0 || ledger.holdings > 0.0);
            prop_assert!(ledger.winning_trades <= ledger.total_trades);
        }

        let result = run_backtest(&series).unwrap();
        prop_assert!(result.final_balance >= 0.0);
        prop_assert!((result.final_balance - ledger.settle(series[series.len() - 1].rate)).abs() < 1e-9);
        prop_assert!((0.0..=100.0).contains(&result.win_rate));
    }

    #[test]
    fn backtest_is_deterministic(rates in arb_rates(30, 150), period in arb_period()) {
        let series = calculate_indicators(&to_samples(&rates), period);
        prop_assume!(series.len() >= 2);
        let a = run_backtest(&series).unwrap();
        let b = run_backtest(&series).unwrap();
        prop_assert_eq!(a.final_balance.to_bits(), b.final_balance.to_bits());
        prop_assert_eq!(a.profit_percentage.to_bits(), b.profit_percentage.to_bits());
        prop_assert_eq!(a.total_trades, b.total_trades);
        prop_assert_eq!(a.winning_trades, b.winning_trades);
    }
}
