//! Coherent (Rayleigh) scattering angle sampler.
//!
//! Samples the squared momentum transfer from the material's tabulated
//! form-factor distribution, restricted to the range reachable at the photon
//! energy, then applies the Thomson angular rejection. The photon keeps its
//! energy; only the direction changes.

use crate::rita::RitaTable;
use crate::rng::Ranecu;
use crate::settings;


/// Samples the polar deflection cosine for a coherent scatter at `energy`
/// (eV). Returns `None` when the retry budget runs out, which happens when
/// the table support and the reachable momentum-transfer range barely
/// overlap; callers discard the photon.
pub fn sample(rng: &mut Ranecu, table: &RitaTable, energy: f64) -> Option<f64> {
    let kappa = energy / settings::ELECTRON_REST_ENERGY;
    let x2_max = settings::RAYLEIGH_X2_FACTOR * kappa * kappa;
    let mut budget = settings::REJECTION_RETRY_LIMIT;

    loop {
        // 1. Squared momentum transfer from the form-factor distribution,
        // redrawn until it falls in the reachable range.
        let x2 = loop {
            if budget == 0 {
                return None;
            }
            budget -= 1;
            let x2 = table.sample(rng);
            if x2 <= x2_max {
                break x2;
            }
        };

        // 2. Map to the deflection cosine.
        let cos_theta = 1.0 - 2.0 * x2 / x2_max;

        // 3. Thomson angular rejection; a failure restarts from step 1.
        let g = 0.5 * (1.0 + cos_theta * cos_theta);
        if f64::from(rng.next_f32()) <= g {
            return Some(cos_theta);
        }
    }
}
