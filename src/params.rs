//! Scalar metrics derived from a finished run.

use std::fmt;

use ndarray::Array2;
use ndarray_stats::QuantileExt;
use serde::Serialize;

use crate::tally::Tally;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_tally() -> Tally {
        let mut tally = Tally::new();
        tally.emitted = 1_000;
        tally.emitted_energy = 6.0e7;
        tally.detected = 40;
        tally.detected_energy = 1.8e6;
        tally.rayleigh_events = 30;
        tally.compton_events = 270;
        tally.photoelectric_events = 100;
        tally
    }

    #[test]
    fn metrics_follow_the_tally() {
        let image = array![[0.0, 2.0e5], [1.6e6, 0.0]];
        let params = Params::new(&sample_tally(), &image);
        assert!((params.scatter_fraction.unwrap() - 0.03).abs() < 1e-12);
        assert!((params.detected_fraction.unwrap() - 0.04).abs() < 1e-12);
        assert!((params.mean_detected_energy.unwrap() - 45_000.0).abs() < 1e-9);
        assert!((params.single_scatter_albedo.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(params.peak_pixel, Some((1, 0)));
        assert!((params.peak_energy.unwrap() - 1.6e6).abs() < 1e-9);
    }

    #[test]
    fn empty_runs_yield_no_metrics() {
        let image = Array2::zeros((0, 0));
        let params = Params::new(&Tally::new(), &image);
        assert_eq!(params.scatter_fraction, None);
        assert_eq!(params.detected_fraction, None);
        assert_eq!(params.mean_detected_energy, None);
        assert_eq!(params.single_scatter_albedo, None);
        assert_eq!(params.peak_pixel, None);
    }
}

/// Derived run metrics; `None` marks quantities whose denominator never
/// accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    /// Detected scatter energy over emitted energy.
    pub scatter_fraction: Option<f64>,
    /// Detected photons over emitted photons.
    pub detected_fraction: Option<f64>,
    /// Mean energy of a detected photon, eV.
    pub mean_detected_energy: Option<f64>,
    /// Scatter events over all real interaction events.
    pub single_scatter_albedo: Option<f64>,
    /// Hottest detector cell as (row, column).
    pub peak_pixel: Option<(usize, usize)>,
    /// Energy in the hottest cell, eV.
    pub peak_energy: Option<f64>,
}

impl Params {
    pub fn new(tally: &Tally, image: &Array2<f64>) -> Self {
        let ratio = |num: f64, den: f64| if den > 0.0 { Some(num / den) } else { None };

        let scatters = (tally.rayleigh_events + tally.compton_events) as f64;
        let events = scatters + tally.photoelectric_events as f64;
        let peak_pixel = image.argmax().ok();

        Self {
            scatter_fraction: ratio(tally.detected_energy, tally.emitted_energy),
            detected_fraction: ratio(tally.detected as f64, tally.emitted as f64),
            mean_detected_energy: ratio(tally.detected_energy, tally.detected as f64),
            single_scatter_albedo: ratio(scatters, events),
            peak_pixel,
            peak_energy: peak_pixel.map(|p| image[p]),
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scalar = |v: Option<f64>| match v {
            Some(v) => format!("{:.6e}", v),
            None => "n/a".to_string(),
        };
        writeln!(f, "Params:")?;
        writeln!(f, "  Scatter fraction:  {}", scalar(self.scatter_fraction))?;
        writeln!(f, "  Detected fraction: {}", scalar(self.detected_fraction))?;
        writeln!(
            f,
            "  Mean detected eV:  {}",
            scalar(self.mean_detected_energy)
        )?;
        writeln!(
            f,
            "  Scatter albedo:    {}",
            scalar(self.single_scatter_albedo)
        )?;
        match self.peak_pixel {
            Some((row, col)) => writeln!(
                f,
                "  Peak pixel:        ({}, {})  {}",
                row,
                col,
                scalar(self.peak_energy)
            )?,
            None => writeln!(f, "  Peak pixel:        n/a")?,
        }
        Ok(())
    }
}
