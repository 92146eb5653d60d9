//! Simulation orchestration and parallel photon transport.
//!
//! This module wires the configured source, spectrum, volume, material
//! tables and detector into a transport scene and drives the photon loop in
//! parallel. Every photon owns a leapfrogged generator stream derived from
//! one master seed, so a run is reproducible regardless of how rayon
//! schedules the work.
//!
//! The simulation driver provides:
//! - Parallel photon processing with rayon
//! - Progress tracking for long-running runs
//! - On-the-fly tally reduction for memory efficiency
//! - Scatter image accumulation on a shared detector grid
//! - Complete output file generation
//!
//! # Key Features
//!
//! - [`Simulation`]: Main orchestrator for scatter estimation runs
//! - Deterministic seeding of per-photon generator streams
//! - Performance timing and summary reporting

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nalgebra::{Point3, Vector3};
use rand::Rng;
use rayon::prelude::*;

use crate::{
    detector::{DetectorGrid, PlaneSurface},
    materials::MaterialLibrary,
    output,
    result::Results,
    rng::Ranecu,
    settings::{Settings, SpectrumConfig, TableConfig, VolumeConfig},
    spectrum::Spectrum,
    tally::Tally,
    transport::Transport,
    volume::Volume,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DetectorConfig;

    fn demo_settings() -> Settings {
        Settings {
            photons: 4_000,
            seed: Some(7),
            absorption_energy: 5_000.0,
            source: [0.0, 0.0, -8.0],
            spectrum: SpectrumConfig::Demo {
                e_min: 20_000.0,
                e_max: 140_000.0,
                bins: 64,
            },
            volume: VolumeConfig::Slab {
                shape: [20, 20, 20],
                voxel_size: [0.5, 0.5, 0.5],
            },
            tables: TableConfig::Analytic,
            detector: DetectorConfig {
                origin: [-10.0, -10.0, 20.0],
                basis_u: [0.1, 0.0, 0.0],
                basis_v: [0.0, 0.1, 0.0],
                width: 200,
                height: 200,
            },
            directory: "out".to_string(),
        }
    }

    #[test]
    fn construction_wires_the_configuration() {
        let mut settings = demo_settings();
        settings.detector.width = 160;
        settings.detector.height = 120;
        let simulation = Simulation::new(settings).unwrap();
        assert!((simulation.spectrum.max_energy() - 140_000.0).abs() < 1e-6);
        assert_eq!(simulation.volume.shape(), [20, 20, 20]);
        assert_eq!(simulation.results.image.dim(), (120, 160));
        assert!(simulation.results.tally.emitted == 0);
    }

    #[test]
    fn absorption_threshold_above_the_spectrum_is_rejected() {
        let mut settings = demo_settings();
        settings.absorption_energy = 200_000.0;
        assert!(Simulation::new(settings).is_err());
    }

    #[test]
    fn runs_tally_every_photon_and_fill_the_image() {
        let mut simulation = Simulation::new(demo_settings()).unwrap();
        simulation.run();
        let tally = &simulation.results.tally;
        assert_eq!(tally.emitted, 4_000);
        assert_eq!(
            tally.emitted,
            tally.detected
                + tally.absorbed
                + tally.escaped_scattered
                + tally.escaped_unscattered
                + tally.discarded
        );
        let image_total = simulation.results.image.sum();
        assert!(
            (image_total - tally.detected_energy).abs() <= 1e-6 * tally.detected_energy.max(1.0),
            "image holds {} eV but the tally detected {} eV",
            image_total,
            tally.detected_energy
        );
    }

    #[test]
    fn seeded_runs_reproduce() {
        let mut a = Simulation::new(demo_settings()).unwrap();
        let mut b = Simulation::new(demo_settings()).unwrap();
        a.run();
        b.run();
        let ta = &a.results.tally;
        let tb = &b.results.tally;
        assert_eq!(ta.emitted, tb.emitted);
        assert_eq!(ta.detected, tb.detected);
        assert_eq!(ta.absorbed, tb.absorbed);
        assert_eq!(ta.escaped_scattered, tb.escaped_scattered);
        assert_eq!(ta.escaped_unscattered, tb.escaped_unscattered);
        assert_eq!(ta.discarded, tb.discarded);
        assert_eq!(ta.rayleigh_events, tb.rayleigh_events);
        assert_eq!(ta.compton_events, tb.compton_events);
        assert_eq!(ta.photoelectric_events, tb.photoelectric_events);
        // the parallel reduction reorders floating sums, so energies agree
        // to rounding rather than bit for bit
        let rel = 1e-9 * ta.emitted_energy;
        assert!((ta.emitted_energy - tb.emitted_energy).abs() <= rel);
        assert!((ta.detected_energy - tb.detected_energy).abs() <= rel);
        assert!((ta.absorbed_energy - tb.absorbed_energy).abs() <= rel);
        assert!((ta.escaped_energy - tb.escaped_energy).abs() <= rel);
    }
}

/// Monte Carlo scatter estimation run over a segmented volume.
///
/// **Context**: Scatter projections require many independent photon
/// histories through the same scene, which benefits from parallel execution
/// with a single shared detector accumulator.
///
/// **How it Works**: Builds the spectrum, volume, material tables and
/// detector plane from the configuration, then traces photons in parallel
/// with per-photon generator streams. Tallies are reduced on the fly and
/// the detector grid is snapshotted into the result image afterwards.
#[derive(Debug)]
pub struct Simulation {
    pub settings: Settings,
    pub spectrum: Spectrum,
    pub volume: Volume,
    pub materials: MaterialLibrary,
    pub plane: PlaneSurface,
    pub results: Results,
}

impl Simulation {
    /// Creates a simulation from configuration settings.
    ///
    /// **Context**: A run needs every scene component resolved up front so
    /// the parallel loop only reads shared state.
    ///
    /// **How it Works**: Resolves each configuration scheme to its concrete
    /// component (file-backed or built-in demo), checks the absorption
    /// threshold against the spectrum, and allocates empty results sized to
    /// the detector.
    pub fn new(settings: Settings) -> Result<Self> {
        let spectrum = match &settings.spectrum {
            SpectrumConfig::File { path } => Spectrum::from_file(Path::new(path))?,
            SpectrumConfig::Demo { e_min, e_max, bins } => {
                Spectrum::filtered_demo(*e_min, *e_max, *bins)?
            }
        };
        if settings.absorption_energy >= spectrum.max_energy() {
            return Err(anyhow::anyhow!(
                "absorption threshold {:.0} eV is not below the hardest spectrum line {:.0} eV",
                settings.absorption_energy,
                spectrum.max_energy()
            ));
        }

        let volume = match &settings.volume {
            VolumeConfig::Raw {
                path,
                origin,
                shape,
                voxel_size,
            } => Volume::from_raw_labels(
                Path::new(path),
                Point3::new(origin[0], origin[1], origin[2]),
                *shape,
                *voxel_size,
            )?,
            VolumeConfig::Slab { shape, voxel_size } => Volume::slab_phantom(*shape, *voxel_size),
        };

        let materials = match &settings.tables {
            TableConfig::Files { path } => MaterialLibrary::from_dir(Path::new(path))?,
            TableConfig::Analytic => MaterialLibrary::analytic_demo(spectrum.max_energy())?,
        };

        let detector = &settings.detector;
        let plane = PlaneSurface::new(
            Point3::new(detector.origin[0], detector.origin[1], detector.origin[2]),
            Vector3::new(detector.basis_u[0], detector.basis_u[1], detector.basis_u[2]),
            Vector3::new(detector.basis_v[0], detector.basis_v[1], detector.basis_v[2]),
            detector.width,
            detector.height,
        )?;

        let results = Results::new_empty(detector.width, detector.height);

        Ok(Self {
            settings,
            spectrum,
            volume,
            materials,
            plane,
            results,
        })
    }

    /// Executes the parallel photon loop with progress tracking.
    ///
    /// **Context**: Photon histories are independent, so the run maps them
    /// across rayon workers. A progress bar gives feedback for long runs.
    ///
    /// **How it Works**: Derives one generator stream per photon from the
    /// master seed (drawn at random when no seed is configured), traces
    /// every history against the shared scene, reduces the per-photon
    /// tallies on the fly, and snapshots the detector grid into the result
    /// image.
    pub fn run(&mut self) {
        let start = Instant::now();
        println!("Tracing photons...");

        let master_seed = self
            .settings
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let master = Ranecu::from_master(master_seed);

        let grid = DetectorGrid::new(self.settings.detector.width, self.settings.detector.height);
        let transport = Transport {
            source: Point3::new(
                self.settings.source[0],
                self.settings.source[1],
                self.settings.source[2],
            ),
            spectrum: &self.spectrum,
            volume: &self.volume,
            materials: &self.materials,
            plane: &self.plane,
            grid: &grid,
            absorption_energy: self.settings.absorption_energy,
        };

        let m = MultiProgress::new();
        let n = self.settings.photons;
        let pb = m.add(ProgressBar::new(n));
        pb.set_style(
            ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
            )
            .unwrap()
            .progress_chars("█▇▆▅▄▃▂▁")
        );
        pb.set_message("photon".to_string());

        // Trace each photon and reduce tallies on the fly
        let tally = (0..n)
            .into_par_iter()
            .map(|index| {
                let mut rng = master.for_photon(index);
                let mut tally = Tally::new();

                transport.trace(&mut rng, &mut tally);

                pb.inc(1);
                tally
            })
            .reduce(Tally::new, |accum, item| accum + item);

        self.results = Results::new(grid.snapshot(), tally);

        let end = Instant::now();
        let duration = end.duration_since(start);
        let rate = n as f64 / duration.as_secs_f64();

        println!("Time taken: {:.2?}, {:.0} photons/s", duration, rate);

        println!("Results:");
        self.results.print();
    }

    /// Writes all simulation results to output files.
    ///
    /// **Context**: A finished run produces the scatter image, the summary
    /// statistics and the exact configuration used, which downstream
    /// analysis reads from the output directory.
    ///
    /// **How it Works**: Prepares the output directory, then writes each
    /// artifact in turn, reporting rather than aborting when one cannot be
    /// written.
    pub fn writeup(&self) {
        if let Err(e) = output::prepare_directory(&self.settings.directory) {
            println!("Failed to prepare output directory: {}", e);
            return;
        }

        let _ = output::write_image(&self.results.image, &self.settings.directory);
        let _ = output::write_summary(&self.results, &self.settings.directory);
        let _ = output::write_settings_snapshot(&self.settings, &self.settings.directory);
    }
}
