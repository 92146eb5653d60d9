//! Photon direction emission and scattering deflection.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::rng::Ranecu;
use crate::settings;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_directions_are_unit() {
        let mut rng = Ranecu::new(12345, 67890).unwrap();
        for _ in 0..5000 {
            let dir = isotropic(&mut rng);
            assert!((dir.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn isotropic_covers_both_hemispheres() {
        let mut rng = Ranecu::new(42, 43).unwrap();
        let mut up = 0;
        let n = 10_000;
        for _ in 0..n {
            if isotropic(&mut rng).z > 0.0 {
                up += 1;
            }
        }
        let frac = up as f64 / n as f64;
        assert!((frac - 0.5).abs() < 0.02, "upper-hemisphere fraction: {}", frac);
    }

    #[test]
    fn zero_deflection_preserves_direction() {
        let dir = Vector3::new(1.0, 2.0, 3.0).normalize();
        let out = deflect(&dir, 1.0, 2.1);
        assert!((out - dir).norm() < 1e-6);
        let polar = Vector3::new(0.0, 0.0, 1.0);
        let out = deflect(&polar, 1.0, 0.7);
        assert!((out - polar).norm() < 1e-6);
    }

    #[test]
    fn deflection_angle_matches_request() {
        let dir = Vector3::new(1.0, 2.0, 3.0).normalize();
        for (cos_theta, phi) in [(0.3, 1.2), (-0.8, 4.0), (0.999, 0.0), (0.0, 2.5)] {
            let out = deflect(&dir, cos_theta, phi);
            assert!((out.norm() - 1.0).abs() < 1e-12);
            assert!(
                (out.dot(&dir) - cos_theta).abs() < 1e-12,
                "cos: {} requested: {}",
                out.dot(&dir),
                cos_theta
            );
        }
    }

    #[test]
    fn polar_frame_handles_both_poles() {
        let up = Vector3::new(0.0, 0.0, 1.0);
        let out = deflect(&up, 0.0, 0.0);
        assert!((out - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);

        let down = Vector3::new(0.0, 0.0, -1.0);
        let out = deflect(&down, 0.25, 1.0);
        assert!((out.dot(&down) - 0.25).abs() < 1e-12);
        assert!((out.norm() - 1.0).abs() < 1e-12);
    }
}

/// Samples a direction uniformly over the unit sphere. Unit by construction.
pub fn isotropic(rng: &mut Ranecu) -> Vector3<f64> {
    let phi = 2.0 * PI * rng.next_f64();
    let cos_theta = 1.0 - 2.0 * rng.next_f64();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Rotates a unit direction by polar angle θ (given as cosθ) and azimuth φ
/// about its own frame. Renormalizes only once rounding drift in the squared
/// norm exceeds the configured limit, and then restores unit length exactly.
pub fn deflect(direction: &Vector3<f64>, cos_theta: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();

    let uv = direction.x * direction.x + direction.y * direction.y;
    let mut out = if uv > settings::POLAR_EPSILON {
        let suv = uv.sqrt();
        let un = direction.x / suv;
        let vn = direction.y / suv;
        Vector3::new(
            direction.x * cos_theta + sin_theta * (un * direction.z * cos_phi - vn * sin_phi),
            direction.y * cos_theta + sin_theta * (vn * direction.z * cos_phi + un * sin_phi),
            direction.z * cos_theta - suv * sin_theta * cos_phi,
        )
    } else {
        // at the ±z pole the azimuth lies in the x-y plane directly
        Vector3::new(
            sin_theta * cos_phi,
            sin_theta * sin_phi,
            direction.z * cos_theta,
        )
    };

    let norm2 = out.norm_squared();
    if (norm2 - 1.0).abs() > settings::NORM_DRIFT_LIMIT {
        out /= norm2.sqrt();
    }
    out
}
