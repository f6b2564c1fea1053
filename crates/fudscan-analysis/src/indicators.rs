//! Technical Indicators
//!
//! Pure functions over a daily close series, oldest first. Every function
//! returns `None` when the series is too short for the requested period.

/// Simple moving average of the last `period` closes
pub fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average, seeded with the SMA of the first `period`
pub fn ema(closes: &[f64], period: usize) -> Option<f64> {
    ema_series(closes, period)?.last().copied()
}

/// Full EMA series; index 0 corresponds to `closes[period - 1]`
fn ema_series(closes: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let seed = closes[..period].iter().sum::<f64>() / period as f64;
    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut series = Vec::with_capacity(closes.len() - period + 1);
    series.push(seed);

    let mut current = seed;
    for close in &closes[period..] {
        current = (close - current) * multiplier + current;
        series.push(current);
    }

    Some(series)
}

/// Relative Strength Index with Wilder smoothing
///
/// Needs `period + 1` closes. Saturates at 100 when the series never falls.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = deltas[..period]
        .iter()
        .map(|d| d.max(0.0))
        .sum::<f64>()
        / period as f64;
    let mut avg_loss = deltas[..period]
        .iter()
        .map(|d| (-d).max(0.0))
        .sum::<f64>()
        / period as f64;

    for delta in &deltas[period..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD line, signal line, and histogram
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Standard MACD(12, 26, 9)
///
/// Needs at least 34 closes (26 for the slow EMA + 9 for the signal).
pub fn macd(closes: &[f64]) -> Option<Macd> {
    const FAST: usize = 12;
    const SLOW: usize = 26;
    const SIGNAL: usize = 9;

    let fast = ema_series(closes, FAST)?;
    let slow = ema_series(closes, SLOW)?;

    // Both series end at the last close; align them from the back.
    let len = slow.len().min(fast.len());
    let macd_line: Vec<f64> = fast[fast.len() - len..]
        .iter()
        .zip(&slow[slow.len() - len..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_series = ema_series(&macd_line, SIGNAL)?;

    let macd_value = *macd_line.last()?;
    let signal_value = *signal_series.last()?;

    Some(Macd {
        macd: macd_value,
        signal: signal_value,
        histogram: macd_value - signal_value,
    })
}

/// Annualized realized volatility (percent) from daily returns
pub fn volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < 3 {
        return None;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();

    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (returns.len() - 1) as f64;

    Some(variance.sqrt() * 365.0_f64.sqrt() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_sma() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&closes, 5), Some(3.0));
        assert_eq!(sma(&closes, 2), Some(4.5));
    }

    #[test]
    fn test_short_series_yields_none() {
        let closes = vec![1.0, 2.0];
        assert!(sma(&closes, 5).is_none());
        assert!(ema(&closes, 5).is_none());
        assert!(rsi(&closes, 14).is_none());
        assert!(macd(&closes).is_none());
        assert!(volatility(&closes[..1].to_vec()).is_none());
    }

    #[test]
    fn test_ema_converges_toward_recent_prices() {
        // Flat then jump: EMA should sit between old and new level, above SMA seed
        let mut closes = vec![10.0; 20];
        closes.extend(vec![20.0; 10]);
        let e = ema(&closes, 10).unwrap();
        assert!(e > 15.0 && e <= 20.0, "got {e}");
    }

    #[test]
    fn test_rsi_saturates_on_monotonic_rise() {
        let r = rsi(&rising(30), 14).unwrap();
        assert_eq!(r, 100.0);
    }

    #[test]
    fn test_rsi_midrange_for_alternating_series() {
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let r = rsi(&closes, 14).unwrap();
        assert!(r > 30.0 && r < 70.0, "got {r}");
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let m = macd(&rising(60)).unwrap();
        assert!(m.macd > 0.0);
    }

    #[test]
    fn test_volatility_zero_for_flat_series() {
        let closes = vec![100.0; 30];
        assert_eq!(volatility(&closes), Some(0.0));
    }

    #[test]
    fn test_volatility_positive_for_noisy_series() {
        let closes: Vec<f64> = (0..30)
            .map(|i| 100.0 + if i % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        assert!(volatility(&closes).unwrap() > 0.0);
    }
}
