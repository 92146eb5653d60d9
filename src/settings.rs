use std::env;
use std::fmt;

use anyhow::Result;
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_toml() -> &'static str {
        r#"
            photons = 100000
            source = [0.0, 0.0, -60.0]

            [spectrum]
            scheme = "demo"
            e_min = 20000.0
            e_max = 140000.0
            bins = 64

            [volume]
            scheme = "slab"
            shape = [40, 40, 40]
            voxel_size = [0.5, 0.5, 0.5]

            [detector]
            origin = [-20.0, -20.0, 45.0]
            basis_u = [0.1, 0.0, 0.0]
            basis_v = [0.0, 0.1, 0.0]
            width = 400
            height = 400
        "#
    }

    #[test]
    fn demo_settings_parse_with_defaults() {
        let settings: Settings = toml::from_str(demo_toml()).unwrap();
        assert_eq!(settings.photons, 100_000);
        assert_eq!(settings.seed, None);
        assert!((settings.absorption_energy - 5_000.0).abs() < 1e-12);
        assert_eq!(settings.tables, TableConfig::Analytic);
        assert_eq!(settings.directory, "out");
        match &settings.spectrum {
            SpectrumConfig::Demo { bins, .. } => assert_eq!(*bins, 64),
            other => panic!("unexpected spectrum config: {:?}", other),
        }
        validate_config(&settings);
    }

    #[test]
    fn settings_roundtrip_through_toml() {
        let settings: Settings = toml::from_str(demo_toml()).unwrap();
        let text = toml::to_string(&settings).unwrap();
        let reparsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(settings, reparsed);
    }

    #[test]
    fn tagged_schemes_parse() {
        let text = r#"
            photons = 10
            source = [0.0, 0.0, 0.0]

            [spectrum]
            scheme = "file"
            path = "spectrum.dat"

            [volume]
            scheme = "raw"
            path = "labels.raw"
            origin = [-10.0, -10.0, -10.0]
            shape = [20, 20, 20]
            voxel_size = [1.0, 1.0, 1.0]

            [tables]
            scheme = "files"
            path = "materials"

            [detector]
            origin = [-20.0, -20.0, 45.0]
            basis_u = [0.1, 0.0, 0.0]
            basis_v = [0.0, 0.1, 0.0]
            width = 100
            height = 100
        "#;
        let settings: Settings = toml::from_str(text).unwrap();
        assert_eq!(
            settings.spectrum,
            SpectrumConfig::File {
                path: "spectrum.dat".to_string()
            }
        );
        assert_eq!(
            settings.tables,
            TableConfig::Files {
                path: "materials".to_string()
            }
        );
    }

    #[test]
    #[should_panic(expected = "Photon count")]
    fn zero_photons_fail_validation() {
        let mut settings: Settings = toml::from_str(demo_toml()).unwrap();
        settings.photons = 0;
        validate_config(&settings);
    }

    #[test]
    #[should_panic(expected = "Spectrum range")]
    fn inverted_spectrum_range_fails_validation() {
        let mut settings: Settings = toml::from_str(demo_toml()).unwrap();
        settings.spectrum = SpectrumConfig::Demo {
            e_min: 90_000.0,
            e_max: 20_000.0,
            bins: 16,
        };
        validate_config(&settings);
    }
}

/// Electron rest energy in eV.
pub const ELECTRON_REST_ENERGY: f64 = 510_998.918;
/// Maximum squared momentum transfer per kappa squared in the Rayleigh
/// sampler (derived from the form-factor tabulation convention).
pub const RAYLEIGH_X2_FACTOR: f64 = 1697.86;
/// Direction components with absolute value below this are treated as
/// parallel to an axis or plane.
pub const AXIS_EPSILON: f64 = 1.5e-5;
/// Margin added when advancing a photon onto the volume so the entry point
/// lies strictly inside the box.
pub const ENTRY_MARGIN: f64 = 1e-5;
/// Squared-magnitude drift above which a deflected direction is
/// renormalized.
pub const NORM_DRIFT_LIMIT: f64 = 1e-14;
/// Below this squared transverse magnitude a direction counts as polar and
/// the deflection uses the simplified frame.
pub const POLAR_EPSILON: f64 = 1e-20;
/// Hard cap on draws inside any rejection loop; exhaustion discards the
/// photon instead of hanging a worker.
pub const REJECTION_RETRY_LIMIT: u32 = 10_000;
/// Generator stride between consecutive photon streams, comfortably above
/// the draws any single trajectory can consume.
pub const SEED_LEAP_DISTANCE: u64 = 1 << 20;
/// Largest number of Compton shells a material may carry.
pub const MAX_SHELLS: usize = 30;

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Photon histories to run.
    pub photons: u64,
    pub seed: Option<u64>,
    /// Absorption threshold in eV; photons below it terminate in place.
    #[serde(default = "default_absorption_energy")]
    pub absorption_energy: f64,
    /// Source focal spot in world cm.
    pub source: [f64; 3],
    pub spectrum: SpectrumConfig,
    pub volume: VolumeConfig,
    #[serde(default)]
    pub tables: TableConfig,
    pub detector: DetectorConfig,
    #[serde(default = "default_directory")]
    pub directory: String,
}

fn default_absorption_energy() -> f64 {
    5_000.0
}

fn default_directory() -> String {
    "out".to_string()
}

/// Where the source spectrum comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum SpectrumConfig {
    /// Two-column text file: energy (eV), relative weight.
    File { path: String },
    /// Built-in filtered-tube shape across `[e_min, e_max]`.
    Demo { e_min: f64, e_max: f64, bins: usize },
}

/// Where the segmented volume comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum VolumeConfig {
    /// Raw byte grid of material labels, x fastest.
    Raw {
        path: String,
        origin: [f64; 3],
        shape: [usize; 3],
        voxel_size: [f64; 3],
    },
    /// Built-in layered phantom: soft-tissue slab with a bone rod, in air.
    Slab {
        shape: [usize; 3],
        voxel_size: [f64; 3],
    },
}

/// Where the material tables come from.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum TableConfig {
    /// Directory holding air.mat, soft.mat and bone.mat.
    Files { path: String },
    /// Built-in analytic demo tables.
    #[default]
    Analytic,
}

/// Detector plane placement; basis vectors step one pixel pitch.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DetectorConfig {
    pub origin: [f64; 3],
    pub basis_u: [f64; 3],
    pub basis_v: [f64; 3],
    pub width: usize,
    pub height: usize,
}

pub fn load_default_config() -> Result<Settings> {
    let root_dir = retrieve_project_root();
    let default_config_file = root_dir.join("config/default.toml");

    let settings: Config = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    validate_config(&config);

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    // Try to find the project directory in different ways
    let root_dir = retrieve_project_root();

    let default_config_file = root_dir.join("config/default.toml");
    let local_config = root_dir.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        println!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        println!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings: Config = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("xscat"))
        .build()
        .unwrap_or_else(|err| {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        });

    let mut config: Settings = settings.try_deserialize().unwrap_or_else(|err| {
        eprintln!("Error deserializing configuration: {}", err);
        std::process::exit(1);
    });

    // Parse command-line arguments and override values
    let args = CliArgs::parse();

    if let Some(photons) = args.n {
        config.photons = photons;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(eabs) = args.eabs {
        config.absorption_energy = eabs;
    }
    if let Some(path) = args.spectrum {
        config.spectrum = SpectrumConfig::File { path };
    }
    if let Some(dir) = args.dir {
        config.directory = dir;
    }

    validate_config(&config);

    println!("{:#?}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the XSCAT_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
/// If none of these methods work, the function will panic.
fn retrieve_project_root() -> std::path::PathBuf {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        std::path::PathBuf::from(manifest_dir)
    } else if let Ok(path) = env::var("XSCAT_ROOT_DIR") {
        // Allow explicit configuration via environment variable
        std::path::PathBuf::from(path)
    } else {
        // Fallback: try to find the nearest directory containing a "config" subdirectory
        // Start from the executable directory and walk upward
        let exe_path = env::current_exe().expect("Failed to get current executable path");
        let mut current_dir = exe_path
            .parent()
            .expect("Failed to get executable directory")
            .to_path_buf();
        let mut found = false;

        while !found && current_dir.parent().is_some() {
            if current_dir.join("config").is_dir() {
                found = true;
            } else {
                current_dir = current_dir.parent().unwrap().to_path_buf();
            }
        }

        if found {
            current_dir
        } else {
            panic!("Could not find project root directory");
        }
    }
}

fn validate_config(config: &Settings) {
    assert!(config.photons > 0, "Photon count must be greater than 0");
    assert!(
        config.absorption_energy > 0.0,
        "Absorption energy must be greater than 0"
    );
    assert!(
        config.detector.width > 0 && config.detector.height > 0,
        "Detector must have at least one pixel per axis"
    );
    if let SpectrumConfig::Demo { e_min, e_max, bins } = &config.spectrum {
        assert!(
            e_min < e_max && *bins >= 2,
            "Spectrum range must satisfy e_min < e_max with at least two bins"
        );
        assert!(
            config.absorption_energy <= *e_min,
            "Absorption energy must not exceed the softest spectrum line"
        );
    }
    if let VolumeConfig::Slab { shape, voxel_size } = &config.volume {
        assert!(
            shape.iter().all(|&n| n > 0) && voxel_size.iter().all(|&v| v > 0.0),
            "Volume must have a non-empty grid of positive voxels"
        );
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "xscat - Monte Carlo scatter estimation for cone-beam projections"
)]
pub struct CliArgs {
    /// Number of photon histories to run.
    #[arg(short, long)]
    n: Option<u64>,

    /// Random seed for the simulation.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Absorption threshold energy in eV. Photons falling below it are
    /// terminated at the interaction site.
    #[arg(long)]
    eabs: Option<f64>,

    /// File path to a two-column spectrum table (energy in eV, relative
    /// weight). Overrides the spectrum section of the config file.
    #[arg(long)]
    spectrum: Option<String>,

    /// Output directory for the run artifacts.
    #[arg(short, long)]
    dir: Option<String>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Photons: {}
  - Seed: {:?}
  - Absorption Energy: {:.1} eV
  - Source: [{:.2}, {:.2}, {:.2}] cm
  - Detector: {}x{} pixels
  - Output Directory: {}
  ",
            self.photons,
            self.seed,
            self.absorption_energy,
            self.source[0],
            self.source[1],
            self.source[2],
            self.detector.width,
            self.detector.height,
            self.directory,
        )
    }
}
