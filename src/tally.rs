//! Run bookkeeping: photon counts and energy totals per terminal state.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::Serialize;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tally() -> Tally {
        let mut tally = Tally::new();
        tally.emitted = 4;
        tally.emitted_energy = 200_000.0;
        tally.detected = 1;
        tally.detected_energy = 45_000.0;
        tally.absorbed = 1;
        tally.absorbed_energy = 55_000.0;
        tally.escaped_unscattered = 1;
        tally.escaped_energy = 50_000.0;
        tally.discarded = 1;
        tally
    }

    #[test]
    fn conservation_gap_is_the_unaccounted_energy() {
        let tally = sample_tally();
        // the discarded photon's 50 keV went nowhere
        assert!((tally.conservation_gap() - 50_000.0).abs() < 1e-9);
        assert!((Tally::new().conservation_gap()).abs() < 1e-12);
    }

    #[test]
    fn addition_is_fieldwise() {
        let mut total = sample_tally() + sample_tally();
        total += Tally::new();
        assert_eq!(total.emitted, 8);
        assert_eq!(total.detected, 2);
        assert_eq!(total.discarded, 2);
        assert!((total.emitted_energy - 400_000.0).abs() < 1e-9);
        assert!((total.detected_energy - 90_000.0).abs() < 1e-9);
    }

    #[test]
    fn display_reports_every_terminal_state() {
        let text = sample_tally().to_string();
        for label in [
            "Emitted",
            "Detected",
            "Absorbed",
            "Escaped scattered",
            "Escaped direct",
            "Discarded",
            "Conservation gap",
        ] {
            assert!(text.contains(label), "missing {} in\n{}", label, text);
        }
    }
}

/// Counts and energy totals accumulated over a batch of photons. Workers
/// fold into a local tally and the batches are summed at the join; energies
/// are eV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tally {
    pub emitted: u64,
    pub detected: u64,            // scattered and landed on the detector
    pub absorbed: u64,            // photoelectric or below the threshold
    pub escaped_scattered: u64,   // scattered but missed the detector
    pub escaped_unscattered: u64, // primary signal, not deposited
    pub discarded: u64,           // sampler retry budget exhausted
    pub rayleigh_events: u64,
    pub compton_events: u64,
    pub photoelectric_events: u64,
    pub emitted_energy: f64,
    pub detected_energy: f64,
    pub absorbed_energy: f64, // photon ends plus Compton recoil left in the volume
    pub escaped_energy: f64,
}

impl Tally {
    pub fn new() -> Self {
        Self {
            emitted: 0,
            detected: 0,
            absorbed: 0,
            escaped_scattered: 0,
            escaped_unscattered: 0,
            discarded: 0,
            rayleigh_events: 0,
            compton_events: 0,
            photoelectric_events: 0,
            emitted_energy: 0.0,
            detected_energy: 0.0,
            absorbed_energy: 0.0,
            escaped_energy: 0.0,
        }
    }

    /// Emitted energy not accounted for by any terminal state. Discarded
    /// photons contribute their remaining energy here; everything else is
    /// floating-point noise.
    pub fn conservation_gap(&self) -> f64 {
        self.emitted_energy - self.detected_energy - self.absorbed_energy - self.escaped_energy
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

impl Add for Tally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            emitted: self.emitted + other.emitted,
            detected: self.detected + other.detected,
            absorbed: self.absorbed + other.absorbed,
            escaped_scattered: self.escaped_scattered + other.escaped_scattered,
            escaped_unscattered: self.escaped_unscattered + other.escaped_unscattered,
            discarded: self.discarded + other.discarded,
            rayleigh_events: self.rayleigh_events + other.rayleigh_events,
            compton_events: self.compton_events + other.compton_events,
            photoelectric_events: self.photoelectric_events + other.photoelectric_events,
            emitted_energy: self.emitted_energy + other.emitted_energy,
            detected_energy: self.detected_energy + other.detected_energy,
            absorbed_energy: self.absorbed_energy + other.absorbed_energy,
            escaped_energy: self.escaped_energy + other.escaped_energy,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Tally:")?;
        writeln!(
            f,
            "  Emitted:           {:>12}  ({:.6e} eV)",
            self.emitted, self.emitted_energy
        )?;
        writeln!(
            f,
            "  Detected:          {:>12}  ({:.6e} eV)",
            self.detected, self.detected_energy
        )?;
        writeln!(
            f,
            "  Absorbed:          {:>12}  ({:.6e} eV)",
            self.absorbed, self.absorbed_energy
        )?;
        writeln!(f, "  Escaped scattered: {:>12}", self.escaped_scattered)?;
        writeln!(f, "  Escaped direct:    {:>12}", self.escaped_unscattered)?;
        writeln!(f, "  Discarded:         {:>12}", self.discarded)?;
        writeln!(f, "  Rayleigh events:   {:>12}", self.rayleigh_events)?;
        writeln!(f, "  Compton events:    {:>12}", self.compton_events)?;
        writeln!(f, "  Photoelectric:     {:>12}", self.photoelectric_events)?;
        writeln!(f, "  Conservation gap:  {:.6e} eV", self.conservation_gap())?;
        Ok(())
    }
}
