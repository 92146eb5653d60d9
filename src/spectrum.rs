//! Polyenergetic source spectrum sampling.
//!
//! The tube spectrum is tabulated as N ordered energies with a CDF of length
//! N+1; initial photon energies come from inverse-transform sampling with
//! linear interpolation inside each bin. Tables load once, are validated
//! once, and are shared read-only by every photon.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Result;

use crate::rng::Ranecu;


/// Discretized source spectrum: energies in eV plus the sampling CDF.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    energies: Vec<f64>,
    cdf: Vec<f64>,
}

impl Spectrum {
    /// Creates a spectrum from an energy grid and a CDF of length N+1,
    /// validating the load-time invariants.
    pub fn new(energies: Vec<f64>, cdf: Vec<f64>) -> Result<Self> {
        let n = energies.len();
        if n == 0 {
            return Err(anyhow::anyhow!("spectrum needs at least one energy bin"));
        }
        if cdf.len() != n + 1 {
            return Err(anyhow::anyhow!(
                "CDF length must be {} for {} energies: {}",
                n + 1,
                n,
                cdf.len()
            ));
        }
        for i in 0..n - 1 {
            if energies[i + 1] <= energies[i] {
                return Err(anyhow::anyhow!(
                    "energies not strictly increasing at index {}: {} after {}",
                    i + 1,
                    energies[i + 1],
                    energies[i]
                ));
            }
        }
        if cdf[0] != 0.0 {
            return Err(anyhow::anyhow!("CDF must start at 0: {}", cdf[0]));
        }
        if (cdf[n] - 1.0).abs() > 1e-6 {
            return Err(anyhow::anyhow!("CDF must end at 1: {}", cdf[n]));
        }
        for i in 0..n {
            if cdf[i + 1] < cdf[i] {
                return Err(anyhow::anyhow!(
                    "CDF decreases at index {}: {} after {}",
                    i + 1,
                    cdf[i + 1],
                    cdf[i]
                ));
            }
        }
        // normalize away the file-precision residue at the top knot
        let top = cdf[n];
        let cdf = cdf.iter().map(|c| c / top).collect();
        Ok(Self { energies, cdf })
    }

    /// Builds the CDF from per-bin relative weights.
    pub fn from_weights(energies: Vec<f64>, weights: &[f64]) -> Result<Self> {
        if weights.len() != energies.len() {
            return Err(anyhow::anyhow!(
                "one weight per energy bin required: {} weights for {} bins",
                weights.len(),
                energies.len()
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(anyhow::anyhow!("weights must be non-negative with a positive sum"));
        }
        let mut cdf = vec![0.0; energies.len() + 1];
        for (i, w) in weights.iter().enumerate() {
            cdf[i + 1] = cdf[i] + w / total;
        }
        cdf[energies.len()] = 1.0;
        Self::new(energies, cdf)
    }

    /// Loads a two-column text spectrum: `energy_eV relative_weight` rows,
    /// `#` comments and blank lines ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("failed to open spectrum {:?}: {}", path, e))?;
        let mut energies = Vec::new();
        let mut weights = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut fields = trimmed.split_whitespace();
            let energy: f64 = fields
                .next()
                .ok_or_else(|| anyhow::anyhow!("missing energy on line {}", lineno + 1))?
                .parse()
                .map_err(|_| anyhow::anyhow!("bad energy on line {}: {}", lineno + 1, trimmed))?;
            let weight: f64 = fields
                .next()
                .ok_or_else(|| anyhow::anyhow!("missing weight on line {}", lineno + 1))?
                .parse()
                .map_err(|_| anyhow::anyhow!("bad weight on line {}: {}", lineno + 1, trimmed))?;
            energies.push(energy);
            weights.push(weight);
        }
        Self::from_weights(energies, &weights)
    }

    /// Built-in filtered-tube stand-in: a parabolic fluence shape vanishing
    /// at the cutoff and peak energies. Demo quality, not a measured
    /// spectrum.
    pub fn filtered_demo(e_min: f64, e_max: f64, n: usize) -> Result<Self> {
        if n < 2 || e_max <= e_min {
            return Err(anyhow::anyhow!(
                "invalid spectrum range: [{}, {}] with {} bins",
                e_min,
                e_max,
                n
            ));
        }
        let span = e_max - e_min;
        let energies: Vec<f64> = (0..n)
            .map(|i| e_min + span * i as f64 / (n - 1) as f64)
            .collect();
        let weights: Vec<f64> = energies
            .iter()
            .map(|e| (e - e_min) * (e_max - e))
            .collect();
        Self::from_weights(energies, &weights)
    }

    pub fn n_bins(&self) -> usize {
        self.energies.len()
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    pub fn max_energy(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    /// Expected sampled energy, for the run summary.
    pub fn mean_energy(&self) -> f64 {
        let n = self.energies.len();
        let mut mean = 0.0;
        for i in 0..n {
            let mass = self.cdf[i + 1] - self.cdf[i];
            let mid = if i + 1 < n {
                0.5 * (self.energies[i] + self.energies[i + 1])
            } else {
                self.energies[i]
            };
            mean += mass * mid;
        }
        mean
    }

    /// Draws one initial photon energy.
    pub fn sample(&self, rng: &mut Ranecu) -> f64 {
        self.energy_at(rng.next_f64())
    }

    /// Deterministic inverse of the CDF at `t`, with linear interpolation
    /// inside the bin. The top bin closes on the last tabulated energy.
    pub fn energy_at(&self, t: f64) -> f64 {
        let n = self.energies.len();
        let t = t.clamp(0.0, 1.0);

        let mut lo = 0usize;
        let mut hi = n;
        while lo < hi - 1 {
            let mid = (lo + hi) / 2;
            if t < self.cdf[mid] {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let i = lo;
        if i >= n - 1 {
            return self.energies[n - 1];
        }
        let width = self.cdf[i + 1] - self.cdf[i];
        if width <= 0.0 {
            // zero-weight bin, reachable only when t lands exactly on a flat run
            return self.energies[i];
        }
        self.energies[i] + (t - self.cdf[i]) / width * (self.energies[i + 1] - self.energies[i])
    }
}
