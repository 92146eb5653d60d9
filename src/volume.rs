//! Segmented voxel volume and its bounding-box geometry.
//!
//! The volume is an axis-aligned box of labelled voxels (air, soft tissue,
//! bone). Transport only ever asks two questions of it: where does a ray
//! first enter the box, and which material fills the voxel at a point.
//! Construction is either a built-in layered phantom or a raw label file;
//! both validate once at load so the per-photon path never re-checks.

use std::fs;
use std::path::Path;

use anyhow::Result;
use nalgebra::{Point3, Vector3};

use crate::materials::MaterialKind;
use crate::settings;


/// Axis-aligned labelled voxel grid. Coordinates are centimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    bounds_min: Point3<f64>,
    bounds_max: Point3<f64>,
    shape: [usize; 3],
    voxel_size: Vector3<f64>,
    labels: Vec<u8>,
}

impl Volume {
    /// Creates a volume from its origin (minimum corner), voxel counts,
    /// voxel size and flattened label grid (x fastest).
    pub fn new(
        origin: Point3<f64>,
        shape: [usize; 3],
        voxel_size: [f64; 3],
        labels: Vec<u8>,
    ) -> Result<Self> {
        if shape.iter().any(|&n| n == 0) {
            return Err(anyhow::anyhow!("empty voxel grid: {:?}", shape));
        }
        if voxel_size.iter().any(|&s| s <= 0.0) {
            return Err(anyhow::anyhow!("voxel size must be positive: {:?}", voxel_size));
        }
        let expected = shape[0] * shape[1] * shape[2];
        if labels.len() != expected {
            return Err(anyhow::anyhow!(
                "label grid has {} entries, expected {}",
                labels.len(),
                expected
            ));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > MaterialKind::MAX_LABEL) {
            return Err(anyhow::anyhow!("unknown material label: {}", bad));
        }
        let voxel_size = Vector3::new(voxel_size[0], voxel_size[1], voxel_size[2]);
        let extent = Vector3::new(
            voxel_size.x * shape[0] as f64,
            voxel_size.y * shape[1] as f64,
            voxel_size.z * shape[2] as f64,
        );
        Ok(Self {
            bounds_min: origin,
            bounds_max: origin + extent,
            shape,
            voxel_size,
            labels,
        })
    }

    /// Built-in layered phantom centred on the world origin: an air margin,
    /// a soft-tissue block, and a bone rod through the middle.
    pub fn slab_phantom(shape: [usize; 3], voxel_size: [f64; 3]) -> Self {
        let extent = [
            voxel_size[0] * shape[0] as f64,
            voxel_size[1] * shape[1] as f64,
            voxel_size[2] * shape[2] as f64,
        ];
        let origin = Point3::new(-0.5 * extent[0], -0.5 * extent[1], -0.5 * extent[2]);

        let mut labels = Vec::with_capacity(shape[0] * shape[1] * shape[2]);
        for k in 0..shape[2] {
            let fz = (k as f64 + 0.5) / shape[2] as f64;
            for j in 0..shape[1] {
                let fy = (j as f64 + 0.5) / shape[1] as f64;
                for i in 0..shape[0] {
                    let fx = (i as f64 + 0.5) / shape[0] as f64;
                    let in_soft = (0.15..0.85).contains(&fx)
                        && (0.15..0.85).contains(&fy)
                        && (0.1..0.9).contains(&fz);
                    let in_bone = (0.4..0.6).contains(&fx)
                        && (0.4..0.6).contains(&fy)
                        && (0.25..0.75).contains(&fz);
                    let kind = if in_bone {
                        MaterialKind::Bone
                    } else if in_soft {
                        MaterialKind::Soft
                    } else {
                        MaterialKind::Air
                    };
                    labels.push(kind.label());
                }
            }
        }
        // the phantom dimensions are valid by construction
        Self::new(origin, shape, voxel_size, labels).unwrap()
    }

    /// Loads a flattened u8 label grid from disk (x fastest, then y, then z).
    pub fn from_raw_labels(
        path: &Path,
        origin: Point3<f64>,
        shape: [usize; 3],
        voxel_size: [f64; 3],
    ) -> Result<Self> {
        let labels = fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read label grid {:?}: {}", path, e))?;
        Self::new(origin, shape, voxel_size, labels)
    }

    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        (self.bounds_min, self.bounds_max)
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x > self.bounds_min.x
            && p.x < self.bounds_max.x
            && p.y > self.bounds_min.y
            && p.y < self.bounds_max.y
            && p.z > self.bounds_min.z
            && p.z < self.bounds_max.z
    }

    /// Advances a ray to just inside the box, or reports a miss.
    ///
    /// Per axis the signed distance to the bounding face still ahead is
    /// computed, with near-parallel components excluded by sentinel; the
    /// binding constraint is the furthest such face, so the advance is the
    /// maximum of the three. A margin pushes the result strictly inside and
    /// a containment post-check catches rays that graze or miss the box
    /// despite passing every per-axis sign test.
    pub fn enter(&self, position: &Point3<f64>, direction: &Vector3<f64>) -> Option<Point3<f64>> {
        let dx = face_distance(
            position.x,
            direction.x,
            self.bounds_min.x,
            self.bounds_max.x,
        );
        let dy = face_distance(
            position.y,
            direction.y,
            self.bounds_min.y,
            self.bounds_max.y,
        );
        let dz = face_distance(
            position.z,
            direction.z,
            self.bounds_min.z,
            self.bounds_max.z,
        );

        let advance = dx.max(dy).max(dz);
        if !advance.is_finite() {
            return None;
        }
        let candidate = position + direction * (advance + settings::ENTRY_MARGIN);
        if self.contains(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Material label of the voxel containing `p`. Callers guarantee `p` is
    /// inside the box; indices clamp so boundary rounding cannot escape the
    /// grid.
    pub fn label_at(&self, p: &Point3<f64>) -> MaterialKind {
        let i = self.axis_index(p.x - self.bounds_min.x, self.voxel_size.x, self.shape[0]);
        let j = self.axis_index(p.y - self.bounds_min.y, self.voxel_size.y, self.shape[1]);
        let k = self.axis_index(p.z - self.bounds_min.z, self.voxel_size.z, self.shape[2]);
        let idx = i + self.shape[0] * (j + self.shape[1] * k);
        MaterialKind::from_label(self.labels[idx])
    }

    fn axis_index(&self, offset: f64, step: f64, count: usize) -> usize {
        ((offset / step) as usize).min(count - 1)
    }
}

// Signed distance along the ray to the bounding face still ahead on one
// axis; 0 when the axis constraint is already satisfied, -inf when the
// direction is too parallel to ever cross it.
fn face_distance(p: f64, d: f64, lo: f64, hi: f64) -> f64 {
    if d > settings::AXIS_EPSILON {
        if p < lo {
            (lo - p) / d
        } else {
            0.0
        }
    } else if d < -settings::AXIS_EPSILON {
        if p > hi {
            (hi - p) / d
        } else {
            0.0
        }
    } else {
        f64::NEG_INFINITY
    }
}
