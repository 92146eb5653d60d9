//! Monte Carlo estimation of scattered x-ray projections.
//!
//! xscat transports photons from a cone-beam focal spot through a
//! segmented voxel volume and accumulates the energy that scattered
//! photons deposit on a flat-panel detector plane. Unscattered photons
//! never reach the image, so the output is the scatter field alone.
//!
//! A run is configured through [`settings::Settings`], driven by
//! [`simulation::Simulation`], and reproducible for a fixed master seed:
//! each photon history draws from its own leapfrogged generator stream.

pub mod compton;
pub mod detector;
pub mod direction;
pub mod materials;
pub mod output;
pub mod params;
pub mod photon;
pub mod rayleigh;
pub mod result;
pub mod rita;
pub mod rng;
pub mod settings;
pub mod simulation;
pub mod spectrum;
pub mod tally;
pub mod transport;
pub mod volume;
