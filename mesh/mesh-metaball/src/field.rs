//! Smooth-union distance field sampling.
//!
//! Each anchor contributes a sphere signed distance function. The spheres are
//! folded together with a polynomial smooth minimum, left to right in anchor
//! insertion order, and the result is sampled on a regular grid that encloses
//! every sphere with a margin of one diameter.

// Grid counts are small and positive; casts are checked by the voxel budget.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::grid::VoxelField;
use crate::params::{MetaballParams, SurfaceAttributes};

/// Signed distance from `point` to a sphere.
///
/// Negative inside, zero on the surface, positive outside.
#[inline]
#[must_use]
pub fn sphere_sdf(point: &Point3<f64>, center: &Point3<f64>, radius: f64) -> f64 {
    (point - center).norm() - radius
}

/// Polynomial smooth minimum of two distances.
///
/// `smooth_min(a, b, k) = min(a, b) - (max(k - |a - b|, 0) / k)^2 * k / 4`
///
/// `k` is the blend width: values further apart than `k` are combined with a
/// plain `min`. A non-positive `k` disables blending entirely.
///
/// # Example
///
/// ```
/// use mesh_metaball::smooth_min;
///
/// // Far apart: plain minimum.
/// assert_eq!(smooth_min(1.0, 10.0, 2.0), 1.0);
/// // Equal values are pulled down by k / 4.
/// assert!((smooth_min(1.0, 1.0, 2.0) - 0.5).abs() < 1e-12);
/// ```
#[inline]
#[must_use]
pub fn smooth_min(a: f64, b: f64, k: f64) -> f64 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.min(b) - h * h * k * 0.25
}

/// Axis-aligned box enclosing every anchor sphere with a one-diameter margin.
///
/// Returns `None` when there are no anchors.
#[must_use]
pub fn compute_bounds(anchors: &[Point3<f64>], radius: f64) -> Option<(Point3<f64>, Point3<f64>)> {
    let (first, rest) = anchors.split_first()?;

    let (min, max) = rest.iter().fold((*first, *first), |(min, max), p| {
        (min.inf(p), max.sup(p))
    });

    let margin = Vector3::repeat(2.0 * radius);
    Some((min - margin, max + margin))
}

/// Voxel counts and spacing chosen for a sampling box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Voxel counts along x, y and z.
    pub dimensions: (usize, usize, usize),
    /// World units between neighbouring voxels.
    pub step: f64,
    /// Whether the step was doubled to stay within the voxel budget.
    pub downgraded: bool,
}

impl GridLayout {
    /// Total voxel count, saturating at `usize::MAX`.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        let (nx, ny, nz) = self.dimensions;
        nx.saturating_mul(ny).saturating_mul(nz)
    }
}

/// Pick the voxel spacing and counts for a box.
///
/// The step is `2 * radius / cells_per_diameter`. If the resulting voxel
/// count exceeds `voxel_budget`, the step is doubled once; the budget may
/// still be exceeded afterwards.
#[must_use]
pub fn choose_resolution(
    box_size: &Vector3<f64>,
    radius: f64,
    cells_per_diameter: usize,
    voxel_budget: usize,
) -> GridLayout {
    let counts = |step: f64| {
        (
            (box_size.x / step).ceil() as usize,
            (box_size.y / step).ceil() as usize,
            (box_size.z / step).ceil() as usize,
        )
    };

    let step = 2.0 * radius / cells_per_diameter as f64;
    let layout = GridLayout {
        dimensions: counts(step),
        step,
        downgraded: false,
    };

    if layout.voxel_count() <= voxel_budget {
        return layout;
    }

    let coarse_step = step * 2.0;
    let coarse = GridLayout {
        dimensions: counts(coarse_step),
        step: coarse_step,
        downgraded: true,
    };
    warn!(
        requested = layout.voxel_count(),
        budget = voxel_budget,
        granted = coarse.voxel_count(),
        "Voxel budget exceeded, doubling grid step"
    );
    coarse
}

/// Sample the smooth union of anchor spheres on a grid.
///
/// For every voxel, the sphere distances of all anchors are folded left to
/// right with [`smooth_min`] using `smoothness` as the blend width. Color and
/// material are the constant `attributes`.
///
/// Returns an empty field when `anchors` is empty.
#[must_use]
pub fn sample_field(
    anchors: &[Point3<f64>],
    radius: f64,
    smoothness: f64,
    origin: Point3<f64>,
    layout: &GridLayout,
    attributes: SurfaceAttributes,
) -> VoxelField {
    let Some((first, rest)) = anchors.split_first() else {
        return VoxelField::empty();
    };

    let mut field = VoxelField::new(layout.dimensions, origin, layout.step, 0.0, attributes);
    let (nx, ny, nz) = layout.dimensions;

    let mut idx = 0;
    for iz in 0..nz {
        for iy in 0..ny {
            for ix in 0..nx {
                let p = field.position(ix, iy, iz);
                field.distances[idx] = rest.iter().fold(sphere_sdf(&p, first, radius), |d, c| {
                    smooth_min(d, sphere_sdf(&p, c, radius), smoothness)
                });
                idx += 1;
            }
        }
    }

    field
}

/// Build the sampled field for a stroke.
///
/// Combines [`compute_bounds`], [`choose_resolution`] and [`sample_field`]
/// using the settings in `params`.
#[must_use]
pub fn build_field(anchors: &[Point3<f64>], params: &MetaballParams) -> VoxelField {
    let Some((min, max)) = compute_bounds(anchors, params.radius) else {
        return VoxelField::empty();
    };

    let layout = choose_resolution(
        &(max - min),
        params.radius,
        params.cells_per_diameter,
        params.voxel_budget,
    );

    debug!(
        anchors = anchors.len(),
        nx = layout.dimensions.0,
        ny = layout.dimensions.1,
        nz = layout.dimensions.2,
        step = layout.step,
        "Sampling metaball field"
    );

    sample_field(
        anchors,
        params.radius,
        params.smoothness,
        min,
        &layout,
        params.attributes,
    )
}
