//! Rate of Change (ROC) as a fraction.
//!
//! ROC[t] = price[t] / price[t - period] - 1
//! The first `period` values are defined as zero, as is any value whose
//! reference price is degenerate.

pub fn rate_of_change(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut result = vec![0.0; n];
    if period == 0 {
        return result;
    }

    for i in period..n {
        let prev = prices[i - period];
        let curr = prices[i];
        if prev.is_finite() && curr.is_finite() && prev > 0.0 {
            result[i] = curr / prev - 1.0;
        }
    }

    result
}
