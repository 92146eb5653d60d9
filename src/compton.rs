//! Incoherent (Compton) scattering sampler with Doppler broadening.
//!
//! Follows the impulse-approximation scheme: the energy-ratio variable `tau`
//! is drawn from the two-branch Klein-Nishina decomposition, corrected by
//! the shell profile integrals, then a target shell and the projected
//! electron momentum `pz` are drawn to broaden the scattered energy around
//! the Compton line. Binding is honored twice over: shells with ionization
//! energies above the photon energy never participate, and `pz` values that
//! would leave the electron with negative energy are redrawn.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use crate::materials::{ComptonShell, ShellTable};
use crate::rng::Ranecu;
use crate::settings;

#[cfg(test)]
mod tests {
    use super::*;

    fn water_shells() -> ShellTable {
        ShellTable::new(
            vec![
                ComptonShell::new(6.0, 13.6, 130.0),
                ComptonShell::new(2.0, 41.6, 60.0),
                ComptonShell::new(2.0, 543.1, 15.8),
            ],
            10.0,
        )
        .unwrap()
    }

    #[test]
    fn scattered_photons_stay_kinematic() {
        let shells = water_shells();
        let mut rng = Ranecu::new(12345, 67890).unwrap();
        for _ in 0..20_000 {
            let (e_out, cos_theta) = sample(&mut rng, &shells, 60_000.0).unwrap();
            assert!((-1.0..=1.0).contains(&cos_theta));
            assert!(e_out > 0.0 && e_out <= 60_000.0, "scattered energy {}", e_out);
        }
    }

    #[test]
    fn sharp_profile_recovers_the_compton_line() {
        // a near-delta momentum profile collapses the broadening
        let shells = ShellTable::new(vec![ComptonShell::new(1.0, 10.0, 10_000.0)], 1.0).unwrap();
        let mut rng = Ranecu::new(12345, 67890).unwrap();
        let kappa = 60_000.0 / settings::ELECTRON_REST_ENERGY;
        for _ in 0..5000 {
            let (e_out, cos_theta) = sample(&mut rng, &shells, 60_000.0).unwrap();
            let line = 60_000.0 / (1.0 + kappa * (1.0 - cos_theta));
            assert!(
                (e_out - line).abs() < 0.01 * line,
                "scattered energy {} strays from the Compton line {}",
                e_out,
                line
            );
        }
    }

    #[test]
    fn energy_loss_grows_with_energy() {
        let shells = water_shells();
        let mut rng = Ranecu::new(12345, 67890).unwrap();
        let mean_loss = |rng: &mut Ranecu, energy: f64| {
            let n = 20_000;
            let sum: f64 = (0..n)
                .map(|_| {
                    let (e_out, _) = sample(rng, &shells, energy).unwrap();
                    1.0 - e_out / energy
                })
                .sum();
            sum / n as f64
        };
        let soft = mean_loss(&mut rng, 30_000.0);
        let hard = mean_loss(&mut rng, 140_000.0);
        assert!(
            hard > soft + 0.05,
            "fractional losses {} (30 keV) vs {} (140 keV)",
            soft,
            hard
        );
    }

    #[test]
    fn photons_below_every_binding_energy_are_rejected() {
        let shells = ShellTable::new(vec![ComptonShell::new(2.0, 543.1, 15.8)], 2.0).unwrap();
        let mut rng = Ranecu::new(12345, 67890).unwrap();
        assert!(sample(&mut rng, &shells, 500.0).is_none());
    }

    #[test]
    fn sampling_is_reproducible() {
        let shells = water_shells();
        let mut a = Ranecu::new(999, 2024).unwrap();
        let mut b = Ranecu::new(999, 2024).unwrap();
        for _ in 0..100 {
            assert_eq!(
                sample(&mut a, &shells, 80_000.0),
                sample(&mut b, &shells, 80_000.0)
            );
        }
    }

    #[test]
    fn profile_integral_is_continuous_and_monotone() {
        assert!((profile_integral(0.0) - 0.5).abs() < 1e-12);
        let mut last = 0.0;
        for i in -40..=40 {
            let value = profile_integral(i as f64 * 0.25);
            assert!(value >= last && (0.0..=1.0).contains(&value));
            last = value;
        }
    }
}

/// Samples one incoherent scatter at `energy` (eV). Returns the scattered
/// photon energy and the polar deflection cosine, or `None` when the
/// kinematics are closed (every shell bound above the photon energy) or the
/// retry budget runs out; callers discard the photon.
pub fn sample(rng: &mut Ranecu, shells: &ShellTable, energy: f64) -> Option<(f64, f64)> {
    let kappa = energy / settings::ELECTRON_REST_ENERGY;
    let tau_min = 1.0 / (1.0 + 2.0 * kappa);
    let a1 = (1.0 + 2.0 * kappa).ln();
    let a2 = 2.0 * kappa * (1.0 + kappa) / ((1.0 + 2.0 * kappa) * (1.0 + 2.0 * kappa));

    let active: Vec<&ComptonShell> = shells
        .shells()
        .iter()
        .filter(|shell| shell.binding_energy < energy)
        .collect();
    if active.is_empty() {
        return None;
    }

    // 1. Shell profile integrals at full backscatter. This is the hard cap
    // used by the angular rejection; non-positive means no shell can recoil.
    let s_max: f64 = active
        .iter()
        .map(|shell| shell.occupancy * profile_integral(pz_over_mc(energy, shell, 2.0)))
        .sum();
    if s_max <= 0.0 {
        return None;
    }

    let mut budget = settings::REJECTION_RETRY_LIMIT;
    let mut n_at_theta = vec![0.0; active.len()];

    // 2. Draw tau from the two-branch Klein-Nishina decomposition and accept
    // against the binding-corrected angular factor.
    let (tau, cos_theta, s_theta) = loop {
        if budget == 0 {
            return None;
        }
        budget -= 1;

        let tau = if rng.next_f64() * (a1 + a2) < a1 {
            tau_min.powf(rng.next_f64())
        } else {
            (1.0 + rng.next_f64() * (tau_min * tau_min - 1.0)).sqrt()
        };
        let one_minus_cos = (1.0 - tau) / (kappa * tau);

        // 3. Shell profile integrals at this deflection; kept for the shell
        // walk below so an accepted angle pays for them once.
        let mut s_theta = 0.0;
        for (n, shell) in n_at_theta.iter_mut().zip(&active) {
            *n = profile_integral(pz_over_mc(energy, shell, one_minus_cos));
            s_theta += shell.occupancy * *n;
        }

        let kn = 1.0
            - (1.0 - tau) * ((2.0 * kappa + 1.0) * tau - 1.0)
                / (kappa * kappa * tau * (1.0 + tau * tau));
        if f64::from(rng.next_f32()) * s_max <= kn * s_theta {
            break (tau, 1.0 - one_minus_cos, s_theta);
        }
    };

    // 4. Pick the recoil shell by its share of the profile sum, then draw pz
    // from the inverse profile. A pz below -mc reselects the shell; a failed
    // F(pz) test redraws pz for the same shell.
    let pz = 'shell: loop {
        if budget == 0 {
            return None;
        }
        budget -= 1;

        let r = rng.next_f64() * s_theta;
        let mut cum = 0.0;
        let mut pick = active.len() - 1;
        for (i, shell) in active.iter().enumerate() {
            cum += shell.occupancy * n_at_theta[i];
            if cum > r {
                pick = i;
                break;
            }
        }
        let doppler = active[pick].doppler;
        let n_pick = n_at_theta[pick];

        loop {
            if budget == 0 {
                return None;
            }
            budget -= 1;

            // 5. Inverse of the analytical profile integral.
            let a = rng.next_f64() * n_pick;
            let pz = if a < 0.5 {
                (FRAC_1_SQRT_2 - (0.5 - (2.0 * a).ln()).sqrt()) / (SQRT_2 * doppler)
            } else {
                ((0.5 - (2.0 * (1.0 - a)).ln()).sqrt() - FRAC_1_SQRT_2) / (SQRT_2 * doppler)
            };
            if pz < -1.0 {
                continue 'shell;
            }

            // 6. First-order F(pz) correction to the scattered intensity.
            let xqc = 1.0 + tau * (tau - 2.0 * cos_theta);
            let af = xqc.sqrt() * (1.0 + tau * (tau - cos_theta) / xqc);
            let f_max = 1.0 + 0.2 * af.abs();
            let f = 1.0 + af * pz.clamp(-0.2, 0.2);
            if f64::from(rng.next_f32()) * f_max <= f {
                break 'shell pz;
            }
        }
    };

    // 7. Scattered energy from the Doppler-shifted Compton relation. The
    // ratio is capped at one so the photon energy stays non-increasing; the
    // tail of the momentum profile would otherwise allow a slight upshift.
    let t = pz * pz;
    let b1 = 1.0 - t * tau * tau;
    let b2 = 1.0 - t * tau * cos_theta;
    let root = (b2 * b2 - b1 * (1.0 - t)).abs().sqrt();
    let ratio = if pz > 0.0 {
        (tau / b1) * (b2 + root)
    } else {
        (tau / b1) * (b2 - root)
    };
    Some((energy * ratio.min(1.0), cos_theta))
}

/// Maximum projected electron momentum (units of m_e c) transferable to a
/// shell electron at the given deflection.
fn pz_over_mc(energy: f64, shell: &ComptonShell, one_minus_cos: f64) -> f64 {
    let mec2 = settings::ELECTRON_REST_ENERGY;
    let aux = energy * (energy - shell.binding_energy) * one_minus_cos;
    shell.doppler * (aux - mec2 * shell.binding_energy)
        / (mec2 * (2.0 * aux + shell.binding_energy * shell.binding_energy).sqrt())
}

/// Analytical integral of the exponential momentum profile up to `pz`
/// (units of m_e c, already scaled by the shell's Doppler parameter).
fn profile_integral(pz: f64) -> f64 {
    if pz > 0.0 {
        let d = FRAC_1_SQRT_2 + SQRT_2 * pz;
        1.0 - 0.5 * (0.5 - d * d).exp()
    } else {
        let d = FRAC_1_SQRT_2 - SQRT_2 * pz;
        0.5 * (0.5 - d * d).exp()
    }
}
