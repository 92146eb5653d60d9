//! Per-trajectory photon record.
//!
//! One photon is owned by exactly one worker for its whole life; the
//! transport loop mutates it in place and drops it at the terminal state.

use nalgebra::{Point3, Vector3};

use crate::direction;
use crate::rng::Ranecu;
use crate::spectrum::Spectrum;


/// Transient photon state: world position (cm), unit direction, energy (eV).
#[derive(Debug, Clone, PartialEq)]
pub struct Photon {
    pub position: Point3<f64>,
    pub direction: Vector3<f64>,
    pub energy: f64,
}

impl Photon {
    /// Creates a photon at the source point with a spectrum-sampled energy
    /// and an isotropic direction.
    pub fn emit(rng: &mut Ranecu, spectrum: &Spectrum, source: Point3<f64>) -> Self {
        let energy = spectrum.sample(rng);
        let direction = direction::isotropic(rng);
        Self {
            position: source,
            direction,
            energy,
        }
    }

    /// Moves `distance` cm along the current direction.
    pub fn advance(&mut self, distance: f64) {
        self.position += self.direction * distance;
    }

    /// Rotates the direction by the sampled polar cosine and azimuth.
    pub fn deflect(&mut self, cos_theta: f64, phi: f64) {
        self.direction = direction::deflect(&self.direction, cos_theta, phi);
    }
}
