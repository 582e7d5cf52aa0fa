//! pearson correlation between metric channels

use serde::Serialize;

use super::round_to;
use crate::domain::{Metric, Reading};

/// pearson product-moment correlation, rounded to 3 decimals
///
/// uses the sum-based form
///     r = (n*sxy - sx*sy) / sqrt((n*sxx - sx^2) * (n*syy - sy^2))
/// and returns 0 for mismatched lengths, empty input, or a series with no
/// variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sx += a;
        sy += b;
        sxy += a * b;
        sxx += a * a;
        syy += b * b;
    }

    let numerator = n * sxy - sx * sy;
    let denominator = ((n * sxx - sx * sx) * (n * syy - sy * sy)).sqrt();
    if denominator == 0.0 || denominator.is_nan() {
        return 0.0;
    }

    round_to(numerator / denominator, 3)
}

/// the named channel pairs the dashboard plots
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Correlations {
    pub temp_hcho: f64,
    pub humidity_hcho: f64,
    pub temp_voc: f64,
    pub humidity_voc: f64,
    pub pm25_particle: f64,
}

impl Correlations {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let temperature = Metric::Temperature.series(readings);
        let humidity = Metric::Humidity.series(readings);
        let hcho = Metric::Hcho.series(readings);
        let voc = Metric::Voc.series(readings);

        Self {
            temp_hcho: pearson(&temperature, &hcho),
            humidity_hcho: pearson(&humidity, &hcho),
            temp_voc: pearson(&temperature, &voc),
            humidity_voc: pearson(&humidity, &voc),
            pm25_particle: pearson(
                &Metric::Pm25.series(readings),
                &Metric::Particle.series(readings),
            ),
        }
    }
}
