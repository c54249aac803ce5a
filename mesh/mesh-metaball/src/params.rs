//! Metaball generation parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MetaballError, MetaballResult};

/// Constant per-voxel attributes written into every sampled field.
///
/// Colors and materials are not blended per anchor; every voxel, and so every
/// extracted vertex, receives these values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceAttributes {
    /// RGB color in `[0, 1]`.
    pub color: [f32; 3],
    /// Material channels: roughness, metalness, mask.
    pub material: [f32; 3],
}

impl Default for SurfaceAttributes {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            material: [0.18, 0.08, 1.0],
        }
    }
}

/// Configuration for metaball strokes.
///
/// Changes take effect on the next stroke sample; geometry that was already
/// appended is never regenerated.
///
/// # Examples
///
/// ```
/// use mesh_metaball::MetaballParams;
///
/// let params = MetaballParams::default()
///     .with_radius(20.0)
///     .with_smoothness(10.0);
/// assert!(params.validate().is_ok());
/// assert!((params.step() - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetaballParams {
    /// Influence radius of every anchor sphere, in world units.
    pub radius: f64,

    /// Grid quality setting exposed by the tool panel.
    ///
    /// Validated against [`MetaballParams::RESOLUTION_RANGE`]. The sampling
    /// step itself is derived from [`cells_per_diameter`](Self::cells_per_diameter).
    pub resolution: u32,

    /// Smooth-minimum blend width `k`.
    ///
    /// Larger values merge anchors that are farther apart.
    pub smoothness: f64,

    /// Grid cells per influence diameter (`step = 2 * radius / cells_per_diameter`).
    pub cells_per_diameter: usize,

    /// Maximum voxel count before the step is doubled once.
    pub voxel_budget: usize,

    /// Minimum distance between consecutive anchors, as a fraction of the radius.
    pub min_spacing_ratio: f64,

    /// Per-voxel color and material.
    pub attributes: SurfaceAttributes,
}

impl Default for MetaballParams {
    fn default() -> Self {
        Self {
            radius: 50.0,
            resolution: 30,
            smoothness: 40.0,
            cells_per_diameter: 10,
            voxel_budget: 1_000_000,
            min_spacing_ratio: 0.2,
            attributes: SurfaceAttributes::default(),
        }
    }
}

impl MetaballParams {
    /// Slider range for the radius.
    pub const RADIUS_RANGE: (f64, f64) = (5.0, 200.0);
    /// Accepted range for the grid quality setting.
    pub const RESOLUTION_RANGE: (u32, u32) = (10, 60);
    /// Slider range for the smoothness.
    pub const SMOOTHNESS_RANGE: (f64, f64) = (1.0, 100.0);

    /// Creates parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse grid for interactive feedback on slow machines.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            cells_per_diameter: 6,
            ..Self::default()
        }
    }

    /// Finer grid for smoother surfaces.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            resolution: 60,
            cells_per_diameter: 16,
            voxel_budget: 4_000_000,
            ..Self::default()
        }
    }

    /// Set the influence radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the grid quality setting.
    #[must_use]
    pub const fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the smooth-minimum blend width.
    #[must_use]
    pub const fn with_smoothness(mut self, smoothness: f64) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Set the number of grid cells per influence diameter.
    #[must_use]
    pub const fn with_cells_per_diameter(mut self, cells: usize) -> Self {
        self.cells_per_diameter = cells;
        self
    }

    /// Set the voxel budget.
    #[must_use]
    pub const fn with_voxel_budget(mut self, budget: usize) -> Self {
        self.voxel_budget = budget;
        self
    }

    /// Set the per-voxel color and material.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: SurfaceAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Grid step before any budget downgrade.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&self) -> f64 {
        2.0 * self.radius / self.cells_per_diameter as f64
    }

    /// Minimum distance between consecutive anchors, in world units.
    #[must_use]
    pub fn min_anchor_spacing(&self) -> f64 {
        self.radius * self.min_spacing_ratio
    }

    /// Clamp radius, resolution and smoothness to the tool panel ranges.
    ///
    /// Non-finite values fall back to the defaults.
    #[must_use]
    pub fn clamped_to_panel(mut self) -> Self {
        let defaults = Self::default();
        self.radius = if self.radius.is_finite() {
            self.radius.clamp(Self::RADIUS_RANGE.0, Self::RADIUS_RANGE.1)
        } else {
            defaults.radius
        };
        self.smoothness = if self.smoothness.is_finite() {
            self.smoothness
                .clamp(Self::SMOOTHNESS_RANGE.0, Self::SMOOTHNESS_RANGE.1)
        } else {
            defaults.smoothness
        };
        self.resolution = self
            .resolution
            .clamp(Self::RESOLUTION_RANGE.0, Self::RESOLUTION_RANGE.1);
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the radius or smoothness is not positive and finite
    /// - the resolution is outside [`Self::RESOLUTION_RANGE`]
    /// - fewer than two cells per diameter are requested
    /// - the voxel budget is zero
    /// - the spacing ratio is negative or not finite
    pub fn validate(&self) -> MetaballResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MetaballError::InvalidRadius(self.radius));
        }
        if !(self.smoothness.is_finite() && self.smoothness > 0.0) {
            return Err(MetaballError::InvalidSmoothness(self.smoothness));
        }
        let (min, max) = Self::RESOLUTION_RANGE;
        if !(min..=max).contains(&self.resolution) {
            return Err(MetaballError::InvalidResolution {
                value: self.resolution,
                min,
                max,
            });
        }
        if self.cells_per_diameter < 2 {
            return Err(MetaballError::InvalidCellsPerDiameter(
                self.cells_per_diameter,
            ));
        }
        if self.voxel_budget == 0 {
            return Err(MetaballError::InvalidVoxelBudget(self.voxel_budget));
        }
        if !(self.min_spacing_ratio.is_finite() && self.min_spacing_ratio >= 0.0) {
            return Err(MetaballError::InvalidSpacingRatio(self.min_spacing_ratio));
        }
        Ok(())
    }
}
