//! Per-photon transport state machine.
//!
//! One call to [`Transport::trace`] runs a single photon from emission to a
//! terminal state:
//!
//! - emit at the source with a spectrum energy and isotropic direction
//! - advance to the volume entry face, or escape without deposit
//! - Woodcock delta-tracking through the voxel grid: free flights against
//!   the energy-wide majorant, virtual collisions where the local medium is
//!   thinner, channel selection by cross-section weight at real collisions
//! - Rayleigh and Compton scatters update direction and energy; a
//!   photoelectric event or falling below the absorption threshold ends the
//!   trajectory in place
//! - photons leaving the volume after at least one scatter are projected
//!   onto the detector plane and deposited
//!
//! Every random draw comes from the photon's own generator, so trajectories
//! are independent and bit-reproducible regardless of scheduling.

use std::f64::consts::PI;

use nalgebra::Point3;

use crate::compton;
use crate::detector::{DetectorGrid, PlaneSurface};
use crate::materials::MaterialModel;
use crate::photon::Photon;
use crate::rayleigh;
use crate::rng::Ranecu;
use crate::spectrum::Spectrum;
use crate::tally::Tally;
use crate::volume::Volume;


/// Terminal state of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Escaped the volume after scattering and deposited on the detector.
    Detected { energy: f64, scatters: u32 },
    /// Ended inside the volume (photoelectric event or below the threshold).
    Absorbed { energy: f64 },
    /// Left the scene without touching the detector.
    Escaped { scattered: bool, energy: f64 },
    /// A sampler ran out of retries; contributes nothing.
    Discarded,
}

/// Read-only simulation scene handed to every worker.
pub struct Transport<'a> {
    pub source: Point3<f64>,
    pub spectrum: &'a Spectrum,
    pub volume: &'a Volume,
    pub materials: &'a dyn MaterialModel,
    pub plane: &'a PlaneSurface,
    pub grid: &'a DetectorGrid,
    /// Photons below this energy (eV) are absorbed on the spot.
    pub absorption_energy: f64,
}

impl Transport<'_> {
    /// Runs one photon to its terminal state, folding what happened into
    /// `tally` and depositing any detector hit.
    pub fn trace(&self, rng: &mut Ranecu, tally: &mut Tally) -> Outcome {
        let mut photon = Photon::emit(rng, self.spectrum, self.source);
        tally.emitted += 1;
        tally.emitted_energy += photon.energy;

        let Some(entry) = self.volume.enter(&photon.position, &photon.direction) else {
            tally.escaped_unscattered += 1;
            tally.escaped_energy += photon.energy;
            return Outcome::Escaped {
                scattered: false,
                energy: photon.energy,
            };
        };
        photon.position = entry;

        let mut scatters = 0u32;
        loop {
            // 1. Free flight against the majorant attenuation. The sampled
            // step overshoots thin voxels; virtual collisions below correct
            // for it without tracking voxel boundaries.
            let majorant = self.materials.majorant(photon.energy);
            let anchor = photon.position;
            photon.advance(-rng.next_f64().ln() / majorant);
            if !self.volume.contains(&photon.position) {
                return self.escape(anchor, &photon, scatters, tally);
            }

            // 2. Keep the collision with probability mu_local / mu_majorant.
            let material = self.volume.label_at(&photon.position);
            let mu = self.materials.attenuation(material, photon.energy);
            let local = self.materials.density(material) * mu.total();
            if f64::from(rng.next_f32()) * majorant > local {
                continue;
            }

            // 3. Channel selection by cross-section weight.
            let channel = rng.next_f64() * mu.total();
            if channel < mu.photoelectric {
                tally.photoelectric_events += 1;
                tally.absorbed += 1;
                tally.absorbed_energy += photon.energy;
                return Outcome::Absorbed {
                    energy: photon.energy,
                };
            }
            let cos_theta = if channel < mu.photoelectric + mu.rayleigh {
                match rayleigh::sample(rng, self.materials.rayleigh_table(material), photon.energy)
                {
                    Some(cos_theta) => {
                        tally.rayleigh_events += 1;
                        cos_theta
                    }
                    None => {
                        tally.discarded += 1;
                        return Outcome::Discarded;
                    }
                }
            } else {
                match compton::sample(rng, self.materials.shells(material), photon.energy) {
                    Some((energy, cos_theta)) => {
                        tally.compton_events += 1;
                        // the recoil electron stays in the volume
                        tally.absorbed_energy += photon.energy - energy;
                        photon.energy = energy;
                        cos_theta
                    }
                    None => {
                        tally.discarded += 1;
                        return Outcome::Discarded;
                    }
                }
            };
            let phi = 2.0 * PI * rng.next_f64();
            photon.deflect(cos_theta, phi);
            scatters += 1;

            if photon.energy < self.absorption_energy {
                tally.absorbed += 1;
                tally.absorbed_energy += photon.energy;
                return Outcome::Absorbed {
                    energy: photon.energy,
                };
            }
        }
    }

    // The detector ray is anchored at the last in-volume point: the sampled
    // step can overshoot far past the plane, which would fail the forward
    // intersection test from the stopped position.
    fn escape(
        &self,
        anchor: Point3<f64>,
        photon: &Photon,
        scatters: u32,
        tally: &mut Tally,
    ) -> Outcome {
        if scatters > 0 {
            if let Some(pixel) = self.plane.intersect(&anchor, &photon.direction) {
                self.grid.deposit(pixel, photon.energy);
                tally.detected += 1;
                tally.detected_energy += photon.energy;
                return Outcome::Detected {
                    energy: photon.energy,
                    scatters,
                };
            }
            tally.escaped_scattered += 1;
        } else {
            tally.escaped_unscattered += 1;
        }
        tally.escaped_energy += photon.energy;
        Outcome::Escaped {
            scattered: scatters > 0,
            energy: photon.energy,
        }
    }
}
