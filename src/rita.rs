//! Rational inverse-transform ("RITA") tabulated sampling.
//!
//! A RITA table stores a CDF grid together with per-interval rational
//! interpolation coefficients, so that drawing from the tabulated
//! distribution reduces to one uniform variate, a binary search, and one
//! rational evaluation. Tables are immutable and shared read-only across
//! photons; one table exists per tabulated quantity (e.g. the squared
//! momentum transfer of the Rayleigh form factor, per material).

use anyhow::Result;

use crate::rng::Ranecu;


/// Tabulated distribution with rational inverse interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct RitaTable {
    x: Vec<f64>,
    y: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
}

impl RitaTable {
    /// Creates a table from its four grids, validating the load-time
    /// invariants: equal lengths of at least 2, strictly increasing x and y.
    pub fn new(x: Vec<f64>, y: Vec<f64>, a: Vec<f64>, b: Vec<f64>) -> Result<Self> {
        let n = x.len();
        if n < 2 {
            return Err(anyhow::anyhow!("table needs at least 2 gridpoints: {}", n));
        }
        if y.len() != n || a.len() != n || b.len() != n {
            return Err(anyhow::anyhow!(
                "grid length mismatch: x {}, y {}, a {}, b {}",
                n,
                y.len(),
                a.len(),
                b.len()
            ));
        }
        for i in 0..n - 1 {
            if x[i + 1] <= x[i] {
                return Err(anyhow::anyhow!(
                    "abscissa grid not strictly increasing at index {}: {} after {}",
                    i + 1,
                    x[i + 1],
                    x[i]
                ));
            }
            if y[i + 1] <= y[i] {
                return Err(anyhow::anyhow!(
                    "CDF grid not strictly increasing at index {}: {} after {}",
                    i + 1,
                    y[i + 1],
                    y[i]
                ));
            }
        }
        Ok(Self { x, y, a, b })
    }

    /// Builds a table for a positive PDF on [lo, hi] over a uniform grid of
    /// `n` points. The CDF comes from trapezoidal accumulation; the rational
    /// coefficients are fitted so the inverse matches the PDF at the knots.
    pub fn from_pdf(pdf: impl Fn(f64) -> f64, lo: f64, hi: f64, n: usize) -> Result<Self> {
        if n < 2 || hi <= lo {
            return Err(anyhow::anyhow!(
                "invalid build range: [{}, {}] with {} points",
                lo,
                hi,
                n
            ));
        }
        let x: Vec<f64> = (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect();
        let p: Vec<f64> = x.iter().map(|&xi| pdf(xi)).collect();
        if let Some(bad) = p.iter().find(|&&v| v <= 0.0 || !v.is_finite()) {
            return Err(anyhow::anyhow!("PDF must be positive and finite: {}", bad));
        }

        let mut y = vec![0.0; n];
        for i in 0..n - 1 {
            y[i + 1] = y[i] + 0.5 * (p[i] + p[i + 1]) * (x[i + 1] - x[i]);
        }
        let total = y[n - 1];
        let y: Vec<f64> = y.iter().map(|v| v / total).collect();
        let p: Vec<f64> = p.iter().map(|v| v / total).collect();

        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        for i in 0..n - 1 {
            let slope = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
            b[i] = 1.0 - slope * slope / (p[i] * p[i + 1]);
            a[i] = slope / p[i] - b[i] - 1.0;
        }

        Self::new(x, y, a, b)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest tabulated abscissa.
    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Draws one value from the tabulated distribution.
    pub fn sample(&self, rng: &mut Ranecu) -> f64 {
        let y0 = self.y[0];
        let y1 = self.y[self.y.len() - 1];
        self.invert(y0 + rng.next_f64() * (y1 - y0))
    }

    /// Maps a CDF value onto the abscissa by binary search plus the rational
    /// interval mapping. Values outside the grid clamp to the end knots.
    pub fn invert(&self, y: f64) -> f64 {
        let n = self.y.len();
        let y = y.clamp(self.y[0], self.y[n - 1]);

        let mut lo = 0usize;
        let mut hi = n - 1;
        while lo < hi - 1 {
            let mid = (lo + hi) / 2;
            if y < self.y[mid] {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let i = lo;
        let delta = self.y[i + 1] - self.y[i];
        let nu = y - self.y[i];
        let frac =
            (1.0 + self.a[i] + self.b[i]) * delta * nu
                / (delta * delta + self.a[i] * delta * nu + self.b[i] * nu * nu);
        self.x[i] + frac * (self.x[i + 1] - self.x[i])
    }
}
