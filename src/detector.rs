//! Detector plane geometry and the shared energy-deposition grid.
//!
//! The plane is described by its lower corner and two basis vectors whose
//! length is one pixel pitch, so basis coefficients index pixels directly.
//! The grid is the one mutably shared structure of a run; deposits go
//! through an atomic compare-and-swap on the f64 bit pattern so concurrent
//! photons never lose energy.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use ndarray::Array2;

use crate::settings;


/// Bounded planar region with pixel-pitch basis vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneSurface {
    normal: Vector3<f64>,
    offset: f64,
    origin: Point3<f64>,
    basis_u: Vector3<f64>,
    basis_v: Vector3<f64>,
    // Gram matrix entries of the basis, precomputed for the 2x2 solve
    uu: f64,
    vv: f64,
    uv: f64,
    det: f64,
    width: usize,
    height: usize,
}

impl PlaneSurface {
    /// `origin` is the corner of pixel (0, 0); `basis_u` and `basis_v` step
    /// one pixel pitch each. The bases need not be orthogonal, only
    /// linearly independent.
    pub fn new(
        origin: Point3<f64>,
        basis_u: Vector3<f64>,
        basis_v: Vector3<f64>,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!(
                "detector must have pixels: {}x{}",
                width,
                height
            ));
        }
        let uu = basis_u.norm_squared();
        let vv = basis_v.norm_squared();
        let uv = basis_u.dot(&basis_v);
        let det = uu * vv - uv * uv;
        if det <= f64::EPSILON * uu * vv {
            return Err(anyhow::anyhow!(
                "detector basis vectors are degenerate: {} {}",
                basis_u,
                basis_v
            ));
        }
        let cross = basis_u.cross(&basis_v);
        let normal = cross / cross.norm();
        let offset = -normal.dot(&origin.coords);
        Ok(Self {
            normal,
            offset,
            origin,
            basis_u,
            basis_v,
            uu,
            vv,
            uv,
            det,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Ray-plane intersection resolved to a pixel index, or `None` when the
    /// ray is parallel, points away, or lands outside the bounds. The bounds
    /// checks are written in positive form so non-finite coefficients from
    /// degenerate rays also fall out as misses.
    pub fn intersect(
        &self,
        position: &Point3<f64>,
        direction: &Vector3<f64>,
    ) -> Option<(usize, usize)> {
        let along = self.normal.dot(direction);
        if along.abs() <= settings::AXIS_EPSILON {
            return None;
        }
        let t = -(self.normal.dot(&position.coords) + self.offset) / along;
        if !(t > 0.0) {
            return None;
        }
        let local = (position + direction * t) - self.origin;
        let lu = local.dot(&self.basis_u);
        let lv = local.dot(&self.basis_v);
        let cu = (self.vv * lu - self.uv * lv) / self.det;
        let cv = (self.uu * lv - self.uv * lu) / self.det;
        if cu >= 0.0 && cu < self.width as f64 && cv >= 0.0 && cv < self.height as f64 {
            Some((cu as usize, cv as usize))
        } else {
            None
        }
    }
}

/// Shared deposition grid; cells hold f64 energies as atomic bit patterns.
#[derive(Debug)]
pub struct DetectorGrid {
    width: usize,
    height: usize,
    cells: Vec<AtomicU64>,
}

impl DetectorGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let cells = (0..width * height).map(|_| AtomicU64::new(0)).collect();
        Self {
            width,
            height,
            cells,
        }
    }

    /// Atomically adds `energy` to the addressed cell. Out-of-range pixels
    /// are dropped; the accumulator only ever grows by valid contributions.
    pub fn deposit(&self, pixel: (usize, usize), energy: f64) {
        let (u, v) = pixel;
        if u >= self.width || v >= self.height {
            return;
        }
        let cell = &self.cells[v * self.width + u];
        // Relaxed suffices: nothing is ordered against the deposits, only
        // the final sums are observed after the parallel loop joins.
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let updated = (f64::from_bits(current) + energy).to_bits();
            match cell.compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Copies the grid into a `(height, width)` array; rows are detector v.
    pub fn snapshot(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.height, self.width), |(v, u)| {
            f64::from_bits(self.cells[v * self.width + u].load(Ordering::Relaxed))
        })
    }

    /// Total deposited energy in eV.
    pub fn total(&self) -> f64 {
        self.cells
            .iter()
            .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)))
            .sum()
    }
}
