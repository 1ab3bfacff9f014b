// Closed-form Black-Scholes-Merton pricing used to label training data.
// Degenerate inputs (zero maturity or volatility) are not special-cased: the
// formula is evaluated as-is and non-finite values propagate to the caller.

use ndarray::{Array1, Array2, Axis};

use crate::data::sampling::{DIV, RATE, SIGMA, SPOT, TIME};

/// Standard normal cumulative distribution function.
pub fn norm_cdf(x: f64) -> f64 {
    // 0.5 * [1 + erf(x / sqrt(2))]
    0.5 * (1.0 + libm::erf(x / (2.0_f64).sqrt()))
}

#[allow(non_snake_case)]
fn d1_d2(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> (f64, f64) {
    let vol_sqrt_t = sigma * T.sqrt();
    let d1 = ((S / K).ln() + (r - q + 0.5 * sigma.powi(2)) * T) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Price of a European call option under Black-Scholes-Merton assumptions.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    S * (-q * T).exp() * norm_cdf(d1) - K * (-r * T).exp() * norm_cdf(d2)
}

/// Price of a European put option under Black-Scholes-Merton assumptions.
///
/// `put = K e^{-rT} N(-d2) - S e^{-qT} N(-d1)`
#[allow(non_snake_case)]
pub fn bs_put_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    K * (-r * T).exp() * norm_cdf(-d2) - S * (-q * T).exp() * norm_cdf(-d1)
}

/// Prices every row of a feature matrix laid out as
/// `[spot, time, sigma, rate, dividend]`, with a common strike.
pub fn put_prices(features: &Array2<f64>, strike: f64) -> Array1<f64> {
    features
        .axis_iter(Axis(0))
        .map(|r| bs_put_price(r[SPOT], strike, r[RATE], r[DIV], r[TIME], r[SIGMA]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use statrs::distribution::{ContinuousCDF, Normal};

    #[test]
    fn test_norm_cdf_reference_values() {
        // Tabulated standard normal CDF values
        let cases = [
            (-4.0, 3.167_124_183_311_992e-5),
            (-1.5, 0.066_807_201_268_858_07),
            (-1.0, 0.158_655_253_931_457_05),
            (0.0, 0.5),
            (1.0, 0.841_344_746_068_542_9),
            (1.96, 0.975_002_104_851_779_6),
            (2.2, 0.986_096_552_486_501_4),
        ];
        for (x, expected) in cases {
            let got = norm_cdf(x);
            assert!(
                (got - expected).abs() < 1e-14,
                "x={}: got {} expected {}",
                x,
                got,
                expected
            );
        }
    }

    #[test]
    fn test_norm_cdf_agrees_with_statrs() {
        // statrs evaluates the CDF through its own erfc, accurate to a few 1e-12
        let normal = Normal::new(0.0, 1.0).unwrap();
        for x in [-4.0, -1.5, -0.3, 0.0, 0.7, 2.2, 5.0] {
            assert!((norm_cdf(x) - normal.cdf(x)).abs() < 1e-10, "x={}", x);
        }
    }

    #[test]
    fn test_put_call_parity() {
        let cases = [
            (1.0, 1.0, 0.02, 0.01, 1.0, 0.2),
            (0.5, 1.0, -0.01, 0.0, 0.25, 0.45),
            (2.0, 1.0, 0.03, 0.02, 3.0, 0.1),
            (1.3, 1.0, 0.0, 0.015, 0.01, 0.3),
        ];
        for (s, k, r, q, t, sigma) in cases {
            let call = bs_call_price(s, k, r, q, t, sigma);
            let put = bs_put_price(s, k, r, q, t, sigma);
            let parity = s * (-q * t).exp() - k * (-r * t).exp();
            assert!(
                (call - put - parity).abs() < 1e-12,
                "parity violated for {:?}: call={} put={}",
                (s, k, r, q, t, sigma),
                call,
                put
            );
        }
    }

    #[test]
    fn test_put_bounded_by_discounted_strike() {
        let k = 1.0;
        for &s in &[0.5, 0.8, 1.0, 1.4, 2.0] {
            for &t in &[0.05, 0.5, 1.5, 3.0] {
                for &r in &[-0.01, 0.0, 0.03] {
                    let put = bs_put_price(s, k, r, 0.01, t, 0.3);
                    assert!(put >= -1e-14);
                    assert!(put <= k * (-r * t).exp() + 1e-15);
                }
            }
        }
    }

    #[test]
    fn test_put_non_decreasing_in_volatility() {
        for &s in &[0.5, 1.0, 2.0] {
            let mut prev = bs_put_price(s, 1.0, 0.02, 0.01, 1.0, 0.05);
            for i in 1..=50 {
                let sigma = 0.05 + 0.01 * i as f64;
                let put = bs_put_price(s, 1.0, 0.02, 0.01, 1.0, sigma);
                assert!(
                    put >= prev - 1e-14,
                    "vega negative at s={} sigma={}",
                    s,
                    sigma
                );
                prev = put;
            }
        }
    }

    #[test]
    fn test_put_converges_to_intrinsic_at_short_maturity() {
        for &s in &[0.5, 0.9, 1.1, 2.0] {
            let intrinsic = (1.0_f64 - s).max(0.0);
            let put = bs_put_price(s, 1.0, 0.02, 0.01, 1e-8, 0.3);
            assert!((put - intrinsic).abs() < 1e-6, "s={} put={}", s, put);
        }
    }

    #[test]
    fn test_zero_maturity_at_the_money_is_not_finite() {
        let put = bs_put_price(1.0, 1.0, 0.02, 0.0, 0.0, 0.2);
        assert!(!put.is_finite());
    }

    #[test]
    fn test_put_prices_uses_feature_columns() {
        let features = array![[1.0, 1.0, 0.2, 0.02, 0.01], [0.7, 2.0, 0.4, -0.01, 0.0]];
        let prices = put_prices(&features, 1.0);
        assert_eq!(prices.len(), 2);
        assert!((prices[0] - bs_put_price(1.0, 1.0, 0.02, 0.01, 1.0, 0.2)).abs() < 1e-15);
        assert!((prices[1] - bs_put_price(0.7, 1.0, -0.01, 0.0, 2.0, 0.4)).abs() < 1e-15);
    }
}
