//! Synthetic price series for demo payloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::series::Sample;

/// Parameters for a geometric Brownian motion walk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbmParams {
    /// Number of samples to produce.
    pub steps: usize,
    /// Price at the first sample.
    pub initial_price: f64,
    /// Drift per step (mu).
    pub drift: f64,
    /// Volatility per step (sigma).
    pub volatility: f64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            steps: 7200,
            initial_price: 100.0,
            drift: 0.0,
            volatility: 0.001,
        }
    }
}

/// Generate a seeded GBM price walk. Timestamps run `1..=steps`.
///
/// The same `(params, seed)` always produces the same series.
pub fn geometric_brownian_motion(params: &GbmParams, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dt = 1.0_f64;
    let drift = (params.drift - 0.5 * params.volatility.powi(2)) * dt;
    let scale = params.volatility * dt.sqrt();

    let mut price = params.initial_price;
    let mut samples = Vec::with_capacity(params.steps);
    for i in 0..params.steps {
        if i > 0 {
            price *= (drift + scale * standard_normal(&mut rng)).exp();
        }
        samples.push(Sample::new(i as i64 + 1, price));
    }
    samples
}

/// Box-Muller transform over two uniform draws.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // gen::<f64>() is in [0, 1); flip it so ln never sees zero.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = GbmParams::default();
        assert_eq!(p.steps, 7200);
        assert_eq!(p.initial_price, 100.0);
        assert_eq!(p.drift, 0.0);
        assert_eq!(p.volatility, 0.001);
    }

    #[test]
    fn series_shape() {
        let params = GbmParams {
            steps: 50,
            ..Default::default()
        };
        let series = geometric_brownian_motion(&params, 42);
        assert_eq!(series.len(), 50);
        assert_eq!(series[0], Sample::new(1, 100.0));
        assert_eq!(series[49].timestamp, 50);
        assert!(series.iter().all(|s| s.value > 0.0 && s.value.is_finite()));
    }

    #[test]
    fn same_seed_same_series() {
        let params = GbmParams {
            steps: 100,
            ..Default::default()
        };
        assert_eq!(
            geometric_brownian_motion(&params, 7),
            geometric_brownian_motion(&params, 7)
        );
    }

    #[test]
    fn different_seed_different_series() {
        let params = GbmParams {
            steps: 100,
            ..Default::default()
        };
        assert_ne!(
            geometric_brownian_motion(&params, 1),
            geometric_brownian_motion(&params, 2)
        );
    }

    #[test]
    fn zero_volatility_is_flat() {
        let params = GbmParams {
            steps: 10,
            volatility: 0.0,
            ..Default::default()
        };
        let series = geometric_brownian_motion(&params, 3);
        assert!(series.iter().all(|s| s.value == 100.0));
    }

    #[test]
    fn zero_steps_is_empty() {
        let params = GbmParams {
            steps: 0,
            ..Default::default()
        };
        assert!(geometric_brownian_motion(&params, 0).is_empty());
    }
}
