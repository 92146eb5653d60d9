//! Material data behind the transport loop.
//!
//! Everything the samplers need to know about a material lives here: mass
//! density, per-channel mass attenuation coefficients on a uniform energy
//! grid, the Rayleigh form-factor RITA table, and the Compton shell
//! decomposition. The [`MaterialModel`] trait is the seam the transport loop
//! sees; implementations are a file-backed library, a built-in analytic demo
//! library, and a uniform single-medium stand-in for convergence checks.
//!
//! All tables validate once at load. The per-photon path reads them without
//! further checks.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::rita::RitaTable;
use crate::settings;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mu_lookup_interpolates_and_clamps() {
        let table = MuTable::new(
            10_000.0,
            10_000.0,
            vec![0.4, 0.2, 0.1],
            vec![0.2, 0.2, 0.2],
            vec![0.8, 0.1, 0.05],
        )
        .unwrap();
        let mid = table.lookup(15_000.0);
        assert!((mid.rayleigh - 0.3).abs() < 1e-12);
        assert!((mid.compton - 0.2).abs() < 1e-12);
        assert!((mid.photoelectric - 0.45).abs() < 1e-12);
        // clamped on both sides
        assert!((table.lookup(1_000.0).rayleigh - 0.4).abs() < 1e-12);
        assert!((table.lookup(99_000.0).rayleigh - 0.1).abs() < 1e-12);
    }

    #[test]
    fn analytic_library_is_physical() {
        let lib = MaterialLibrary::analytic_demo(150_000.0).unwrap();
        for kind in MaterialKind::ALL {
            let mu = lib.attenuation(kind, 60_000.0);
            assert!(mu.rayleigh > 0.0 && mu.compton > 0.0 && mu.photoelectric > 0.0);
            // photoelectric falls much faster than Compton with energy
            let lo = lib.attenuation(kind, 20_000.0);
            let hi = lib.attenuation(kind, 120_000.0);
            assert!(lo.photoelectric / lo.compton > hi.photoelectric / hi.compton);
        }
        assert!(lib.density(MaterialKind::Air) < 0.01);
        assert!(lib.density(MaterialKind::Bone) > lib.density(MaterialKind::Soft));
    }

    #[test]
    fn majorant_bounds_every_material() {
        let lib = MaterialLibrary::analytic_demo(150_000.0).unwrap();
        for energy in [20_000.0, 60_000.0, 140_000.0] {
            let majorant = lib.majorant(energy);
            for kind in MaterialKind::ALL {
                assert!(lib.macroscopic_total(kind, energy) <= majorant + 1e-12);
            }
        }
    }

    #[test]
    fn shell_table_validates_invariants() {
        let ok = vec![
            ComptonShell::new(6.0, 13.6, 130.0),
            ComptonShell::new(2.0, 543.1, 15.8),
        ];
        assert!(ShellTable::new(ok.clone(), 8.0).is_ok());
        // occupancy sum must match the declared electron count
        assert!(ShellTable::new(ok.clone(), 9.5).is_err());
        // binding energies must be non-decreasing
        let unsorted = vec![
            ComptonShell::new(2.0, 543.1, 15.8),
            ComptonShell::new(6.0, 13.6, 130.0),
        ];
        assert!(ShellTable::new(unsorted, 8.0).is_err());
        // shell count is capped
        let many = vec![ComptonShell::new(1.0, 10.0, 100.0); settings::MAX_SHELLS + 1];
        assert!(ShellTable::new(many, (settings::MAX_SHELLS + 1) as f64).is_err());
    }

    #[test]
    fn material_file_roundtrip() {
        let text = "\
# unit-test material
name demo
density 1.25
electrons 8.0

[mu]
5000 5000
0.30 0.20 0.90
0.20 0.20 0.40
0.10 0.19 0.10

[rayleigh]
0.0 0.0 0.0 0.0
70.0 0.8 0.0 0.0
146.0 1.0 0.0 0.0

[shells]
6.0 13.6 130.0
2.0 543.1 15.8
";
        let path = std::env::temp_dir().join("xscat_material_unit_test.mat");
        std::fs::write(&path, text).unwrap();
        let record = MaterialRecord::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(record.name, "demo");
        assert!((record.density - 1.25).abs() < 1e-12);
        assert_eq!(record.shells.shells().len(), 2);
        assert!((record.mu.lookup(7500.0).photoelectric - 0.65).abs() < 1e-12);
        assert!((record.rayleigh_ff.x_max() - 146.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_material_files() {
        let missing_density = "name demo\nelectrons 8.0\n[mu]\n5000 5000\n0.1 0.1 0.1\n0.1 0.1 0.1\n[rayleigh]\n0 0 0 0\n1 1 0 0\n[shells]\n8.0 13.6 130.0\n";
        let path = std::env::temp_dir().join("xscat_material_bad_unit_test.mat");
        std::fs::write(&path, missing_density).unwrap();
        assert!(MaterialRecord::from_file(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn uniform_medium_ignores_material_and_energy() {
        let medium = UniformMedium::new(
            MuChannels {
                rayleigh: 0.02,
                compton: 0.18,
                photoelectric: 0.01,
            },
            1.0,
        )
        .unwrap();
        let a = medium.attenuation(MaterialKind::Air, 20_000.0);
        let b = medium.attenuation(MaterialKind::Bone, 140_000.0);
        assert_eq!(a, b);
        assert!((medium.majorant(50_000.0) - 0.21).abs() < 1e-12);
    }
}

/// Voxel material classes of the segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Air,
    Soft,
    Bone,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 3] = [MaterialKind::Air, MaterialKind::Soft, MaterialKind::Bone];
    pub const MAX_LABEL: u8 = 2;

    pub fn label(self) -> u8 {
        match self {
            MaterialKind::Air => 0,
            MaterialKind::Soft => 1,
            MaterialKind::Bone => 2,
        }
    }

    /// Inverse of [`label`](Self::label); grids are validated at load so any
    /// stored label is known.
    pub fn from_label(label: u8) -> Self {
        match label {
            0 => MaterialKind::Air,
            1 => MaterialKind::Soft,
            _ => MaterialKind::Bone,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MaterialKind::Air => "air",
            MaterialKind::Soft => "soft",
            MaterialKind::Bone => "bone",
        }
    }
}

/// Mass attenuation coefficients split by interaction channel, cm²/g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MuChannels {
    pub rayleigh: f64,
    pub compton: f64,
    pub photoelectric: f64,
}

impl MuChannels {
    pub fn total(&self) -> f64 {
        self.rayleigh + self.compton + self.photoelectric
    }
}

/// One electron shell of the Compton profile decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComptonShell {
    /// Electrons occupying the shell.
    pub occupancy: f64,
    /// Ionization energy U_i in eV.
    pub binding_energy: f64,
    /// Dimensionless Doppler profile parameter (J_i0 · m_e c).
    pub doppler: f64,
}

impl ComptonShell {
    pub fn new(occupancy: f64, binding_energy: f64, doppler: f64) -> Self {
        Self {
            occupancy,
            binding_energy,
            doppler,
        }
    }
}

/// Per-material shell list, ordered by non-decreasing binding energy. The
/// early-exit shell selection in the Compton sampler relies on the ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellTable {
    shells: Vec<ComptonShell>,
}

impl ShellTable {
    pub fn new(shells: Vec<ComptonShell>, electron_count: f64) -> Result<Self> {
        if shells.is_empty() || shells.len() > settings::MAX_SHELLS {
            return Err(anyhow::anyhow!(
                "shell count must be in [1, {}]: {}",
                settings::MAX_SHELLS,
                shells.len()
            ));
        }
        let mut sum = 0.0;
        for (i, shell) in shells.iter().enumerate() {
            if shell.occupancy <= 0.0 || shell.binding_energy <= 0.0 || shell.doppler <= 0.0 {
                return Err(anyhow::anyhow!(
                    "shell {} has non-positive parameters: {:?}",
                    i,
                    shell
                ));
            }
            if i > 0 && shell.binding_energy < shells[i - 1].binding_energy {
                return Err(anyhow::anyhow!(
                    "shells not ordered by binding energy at index {}: {} after {}",
                    i,
                    shell.binding_energy,
                    shells[i - 1].binding_energy
                ));
            }
            sum += shell.occupancy;
        }
        if (sum - electron_count).abs() > 1e-3 * electron_count.max(1.0) {
            return Err(anyhow::anyhow!(
                "shell occupancies sum to {}, expected {}",
                sum,
                electron_count
            ));
        }
        Ok(Self { shells })
    }

    pub fn shells(&self) -> &[ComptonShell] {
        &self.shells
    }
}

/// Per-channel mass attenuation on a uniform energy grid, linearly
/// interpolated and clamped at the ends.
#[derive(Debug, Clone, PartialEq)]
pub struct MuTable {
    e_min: f64,
    e_step: f64,
    rayleigh: Vec<f64>,
    compton: Vec<f64>,
    photoelectric: Vec<f64>,
}

impl MuTable {
    pub fn new(
        e_min: f64,
        e_step: f64,
        rayleigh: Vec<f64>,
        compton: Vec<f64>,
        photoelectric: Vec<f64>,
    ) -> Result<Self> {
        let n = rayleigh.len();
        if n < 2 {
            return Err(anyhow::anyhow!("attenuation grid needs at least 2 rows: {}", n));
        }
        if compton.len() != n || photoelectric.len() != n {
            return Err(anyhow::anyhow!(
                "attenuation channel lengths differ: {} / {} / {}",
                n,
                compton.len(),
                photoelectric.len()
            ));
        }
        if e_min <= 0.0 || e_step <= 0.0 {
            return Err(anyhow::anyhow!(
                "attenuation grid must have positive origin and step: {} {}",
                e_min,
                e_step
            ));
        }
        let channels = [&rayleigh, &compton, &photoelectric];
        if channels
            .iter()
            .any(|c| c.iter().any(|v| *v < 0.0 || !v.is_finite()))
        {
            return Err(anyhow::anyhow!("attenuation coefficients must be non-negative"));
        }
        Ok(Self {
            e_min,
            e_step,
            rayleigh,
            compton,
            photoelectric,
        })
    }

    pub fn lookup(&self, energy: f64) -> MuChannels {
        let n = self.rayleigh.len();
        let t = (energy - self.e_min) / self.e_step;
        if t <= 0.0 {
            return self.row(0);
        }
        if t >= (n - 1) as f64 {
            return self.row(n - 1);
        }
        let i = t as usize;
        let frac = t - i as f64;
        let a = self.row(i);
        let b = self.row(i + 1);
        MuChannels {
            rayleigh: a.rayleigh + frac * (b.rayleigh - a.rayleigh),
            compton: a.compton + frac * (b.compton - a.compton),
            photoelectric: a.photoelectric + frac * (b.photoelectric - a.photoelectric),
        }
    }

    fn row(&self, i: usize) -> MuChannels {
        MuChannels {
            rayleigh: self.rayleigh[i],
            compton: self.compton[i],
            photoelectric: self.photoelectric[i],
        }
    }
}

/// Everything the transport loop needs for one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub name: String,
    pub density: f64,
    pub mu: MuTable,
    pub rayleigh_ff: RitaTable,
    pub shells: ShellTable,
}

impl MaterialRecord {
    /// Loads the sectioned text format: header keys (`name`, `density`,
    /// `electrons`), a `[mu]` section whose first row is `e_min e_step`
    /// followed by `rayleigh compton photoelectric` rows, a `[rayleigh]`
    /// section of `x y a b` rows, and a `[shells]` section of
    /// `occupancy binding_eV doppler` rows.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("failed to open material {:?}: {}", path, e))?;

        #[derive(PartialEq)]
        enum Section {
            Header,
            Mu,
            Rayleigh,
            Shells,
        }

        let mut section = Section::Header;
        let mut name = None;
        let mut density = None;
        let mut electrons = None;
        let mut mu_grid: Option<(f64, f64)> = None;
        let mut mu_rows: Vec<[f64; 3]> = Vec::new();
        let mut ff_rows: Vec<[f64; 4]> = Vec::new();
        let mut shell_rows: Vec<ComptonShell> = Vec::new();

        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('[') {
                section = match trimmed {
                    "[mu]" => Section::Mu,
                    "[rayleigh]" => Section::Rayleigh,
                    "[shells]" => Section::Shells,
                    other => {
                        return Err(anyhow::anyhow!(
                            "unknown section on line {}: {}",
                            lineno + 1,
                            other
                        ))
                    }
                };
                continue;
            }
            match section {
                Section::Header => {
                    let (key, value) = trimmed.split_once(char::is_whitespace).ok_or_else(|| {
                        anyhow::anyhow!("malformed header on line {}: {}", lineno + 1, trimmed)
                    })?;
                    match key {
                        "name" => name = Some(value.trim().to_string()),
                        "density" => density = Some(parse_field(value, lineno)?),
                        "electrons" => electrons = Some(parse_field(value, lineno)?),
                        other => {
                            return Err(anyhow::anyhow!(
                                "unknown header key on line {}: {}",
                                lineno + 1,
                                other
                            ))
                        }
                    }
                }
                Section::Mu => {
                    let fields = parse_floats(trimmed, lineno)?;
                    if mu_grid.is_none() {
                        if fields.len() != 2 {
                            return Err(anyhow::anyhow!(
                                "[mu] grid row needs `e_min e_step` on line {}",
                                lineno + 1
                            ));
                        }
                        mu_grid = Some((fields[0], fields[1]));
                    } else {
                        if fields.len() != 3 {
                            return Err(anyhow::anyhow!(
                                "[mu] row needs 3 coefficients on line {}",
                                lineno + 1
                            ));
                        }
                        mu_rows.push([fields[0], fields[1], fields[2]]);
                    }
                }
                Section::Rayleigh => {
                    let fields = parse_floats(trimmed, lineno)?;
                    if fields.len() != 4 {
                        return Err(anyhow::anyhow!(
                            "[rayleigh] row needs 4 values on line {}",
                            lineno + 1
                        ));
                    }
                    ff_rows.push([fields[0], fields[1], fields[2], fields[3]]);
                }
                Section::Shells => {
                    let fields = parse_floats(trimmed, lineno)?;
                    if fields.len() != 3 {
                        return Err(anyhow::anyhow!(
                            "[shells] row needs 3 values on line {}",
                            lineno + 1
                        ));
                    }
                    shell_rows.push(ComptonShell::new(fields[0], fields[1], fields[2]));
                }
            }
        }

        let name = name.ok_or_else(|| anyhow::anyhow!("material file missing `name`"))?;
        let density: f64 = density.ok_or_else(|| anyhow::anyhow!("material file missing `density`"))?;
        let electrons: f64 =
            electrons.ok_or_else(|| anyhow::anyhow!("material file missing `electrons`"))?;
        if density <= 0.0 {
            return Err(anyhow::anyhow!("density must be positive: {}", density));
        }
        let (e_min, e_step) =
            mu_grid.ok_or_else(|| anyhow::anyhow!("material file missing [mu] section"))?;

        let mu = MuTable::new(
            e_min,
            e_step,
            mu_rows.iter().map(|r| r[0]).collect(),
            mu_rows.iter().map(|r| r[1]).collect(),
            mu_rows.iter().map(|r| r[2]).collect(),
        )?;
        let rayleigh_ff = RitaTable::new(
            ff_rows.iter().map(|r| r[0]).collect(),
            ff_rows.iter().map(|r| r[1]).collect(),
            ff_rows.iter().map(|r| r[2]).collect(),
            ff_rows.iter().map(|r| r[3]).collect(),
        )?;
        let shells = ShellTable::new(shell_rows, electrons)?;

        Ok(Self {
            name,
            density,
            mu,
            rayleigh_ff,
            shells,
        })
    }
}

fn parse_field(value: &str, lineno: usize) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("bad number on line {}: {}", lineno + 1, value))
}

fn parse_floats(line: &str, lineno: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|f| {
            f.parse()
                .map_err(|_| anyhow::anyhow!("bad number on line {}: {}", lineno + 1, f))
        })
        .collect()
}

/// Seam between the transport loop and the material data. Implementations
/// are shared read-only across photon workers.
pub trait MaterialModel: Send + Sync {
    /// Mass density in g/cm³.
    fn density(&self, material: MaterialKind) -> f64;
    /// Mass attenuation coefficients at `energy` (eV), cm²/g.
    fn attenuation(&self, material: MaterialKind, energy: f64) -> MuChannels;
    /// Rayleigh form-factor table (squared momentum transfer).
    fn rayleigh_table(&self, material: MaterialKind) -> &RitaTable;
    /// Compton shell decomposition.
    fn shells(&self, material: MaterialKind) -> &ShellTable;

    /// Macroscopic total attenuation in 1/cm at `energy`.
    fn macroscopic_total(&self, material: MaterialKind, energy: f64) -> f64 {
        self.density(material) * self.attenuation(material, energy).total()
    }

    /// Upper bound on the macroscopic attenuation over every material,
    /// used as the delta-tracking majorant.
    fn majorant(&self, energy: f64) -> f64 {
        MaterialKind::ALL
            .iter()
            .map(|m| self.macroscopic_total(*m, energy))
            .fold(0.0, f64::max)
    }
}

/// The standard three-material library: air, soft tissue, bone.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialLibrary {
    air: MaterialRecord,
    soft: MaterialRecord,
    bone: MaterialRecord,
}

impl MaterialLibrary {
    /// Loads `air.mat`, `soft.mat` and `bone.mat` from a directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            air: MaterialRecord::from_file(&dir.join("air.mat"))?,
            soft: MaterialRecord::from_file(&dir.join("soft.mat"))?,
            bone: MaterialRecord::from_file(&dir.join("bone.mat"))?,
        })
    }

    /// Built-in demo library with Klein-Nishina Compton coefficients,
    /// power-law Rayleigh and photoelectric channels, screened-hydrogenic
    /// form factors, and compact shell decompositions. The magnitudes track
    /// tabulated values for the diagnostic energy range; this is demo data
    /// for running without external tables, not a cross-section compilation.
    pub fn analytic_demo(max_energy: f64) -> Result<Self> {
        Ok(Self {
            air: analytic_record("air", 0.0012, 3.006e23, 14.4, 24.0, 3100.0, 5.8, air_shells(), max_energy)?,
            soft: analytic_record("soft", 1.0, 3.343e23, 10.0, 26.0, 4000.0, 5.7, soft_shells(), max_energy)?,
            bone: analytic_record("bone", 1.85, 3.10e23, 41.0, 70.0, 33_000.0, 8.6, bone_shells(), max_energy)?,
        })
    }

    fn record(&self, material: MaterialKind) -> &MaterialRecord {
        match material {
            MaterialKind::Air => &self.air,
            MaterialKind::Soft => &self.soft,
            MaterialKind::Bone => &self.bone,
        }
    }
}

impl MaterialModel for MaterialLibrary {
    fn density(&self, material: MaterialKind) -> f64 {
        self.record(material).density
    }

    fn attenuation(&self, material: MaterialKind, energy: f64) -> MuChannels {
        self.record(material).mu.lookup(energy)
    }

    fn rayleigh_table(&self, material: MaterialKind) -> &RitaTable {
        &self.record(material).rayleigh_ff
    }

    fn shells(&self, material: MaterialKind) -> &ShellTable {
        &self.record(material).shells
    }
}

// Klein-Nishina total cross section per electron, cm².
fn klein_nishina_cross_section(energy: f64) -> f64 {
    const TWO_PI_RE2: f64 = 4.9893444e-25;
    let k = energy / settings::ELECTRON_REST_ENERGY;
    let k1 = 1.0 + 2.0 * k;
    let term1 = (1.0 + k) / (k * k) * (2.0 * (1.0 + k) / k1 - k1.ln() / k);
    let term2 = k1.ln() / (2.0 * k);
    let term3 = (1.0 + 3.0 * k) / (k1 * k1);
    TWO_PI_RE2 * (term1 + term2 - term3)
}

#[allow(clippy::too_many_arguments)]
fn analytic_record(
    name: &str,
    density: f64,
    electrons_per_gram: f64,
    electron_count: f64,
    rayleigh_scale: f64,
    photo_scale: f64,
    screening: f64,
    shells: Vec<ComptonShell>,
    max_energy: f64,
) -> Result<MaterialRecord> {
    const GRID_POINTS: usize = 128;
    const E_MIN: f64 = 5_000.0;

    let e_max = max_energy.max(E_MIN * 2.0);
    let step = (e_max - E_MIN) / (GRID_POINTS - 1) as f64;
    let grid = Array1::linspace(E_MIN, e_max, GRID_POINTS);

    let mut rayleigh = Vec::with_capacity(GRID_POINTS);
    let mut compton = Vec::with_capacity(GRID_POINTS);
    let mut photoelectric = Vec::with_capacity(GRID_POINTS);
    for &e in grid.iter() {
        let e_kev = e / 1000.0;
        rayleigh.push(rayleigh_scale / (e_kev * e_kev));
        compton.push(klein_nishina_cross_section(e) * electrons_per_gram);
        photoelectric.push(photo_scale / (e_kev * e_kev * e_kev));
    }
    let mu = MuTable::new(E_MIN, step, rayleigh, compton, photoelectric)?;

    // squared momentum transfer range reachable at the hardest tube energy
    let kappa_max = e_max / settings::ELECTRON_REST_ENERGY;
    let x2_max = settings::RAYLEIGH_X2_FACTOR * kappa_max * kappa_max;
    let c2 = screening;
    let rayleigh_ff =
        RitaTable::from_pdf(|u| (1.0 + u / c2).powi(-4).max(1e-300), 0.0, x2_max, 128)?;

    Ok(MaterialRecord {
        name: name.to_string(),
        density,
        mu,
        rayleigh_ff,
        shells: ShellTable::new(shells, electron_count)?,
    })
}

fn air_shells() -> Vec<ComptonShell> {
    vec![
        ComptonShell::new(11.5, 14.5, 135.0),
        ComptonShell::new(2.9, 410.0, 16.5),
    ]
}

fn soft_shells() -> Vec<ComptonShell> {
    vec![
        ComptonShell::new(6.0, 13.6, 130.0),
        ComptonShell::new(2.0, 41.6, 60.0),
        ComptonShell::new(2.0, 543.1, 15.8),
    ]
}

fn bone_shells() -> Vec<ComptonShell> {
    vec![
        ComptonShell::new(25.8, 16.0, 110.0),
        ComptonShell::new(10.0, 300.0, 30.0),
        ComptonShell::new(4.0, 543.1, 15.8),
        ComptonShell::new(1.2, 4038.1, 6.0),
    ]
}

/// Energy-independent single-medium provider for convergence checks: every
/// material resolves to the same density, coefficients, flat form factor and
/// loosely bound single shell.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMedium {
    channels: MuChannels,
    density: f64,
    rayleigh_ff: RitaTable,
    shells: ShellTable,
}

impl UniformMedium {
    pub fn new(channels: MuChannels, density: f64) -> Result<Self> {
        let grid: Vec<f64> = (0..=16).map(|i| 146.0 * i as f64 / 16.0).collect();
        let cdf: Vec<f64> = (0..=16).map(|i| i as f64 / 16.0).collect();
        let rayleigh_ff = RitaTable::new(grid, cdf, vec![0.0; 17], vec![0.0; 17])?;
        let shells = ShellTable::new(vec![ComptonShell::new(1.0, 10.0, 150.0)], 1.0)?;
        Ok(Self {
            channels,
            density,
            rayleigh_ff,
            shells,
        })
    }
}

impl MaterialModel for UniformMedium {
    fn density(&self, _material: MaterialKind) -> f64 {
        self.density
    }

    fn attenuation(&self, _material: MaterialKind, _energy: f64) -> MuChannels {
        self.channels
    }

    fn rayleigh_table(&self, _material: MaterialKind) -> &RitaTable {
        &self.rayleigh_ff
    }

    fn shells(&self, _material: MaterialKind) -> &ShellTable {
        &self.shells
    }
}
