//! Dense voxel field holding distance, color and material samples.

use nalgebra::Point3;

use crate::error::{MetaballError, MetaballResult};
use crate::params::SurfaceAttributes;

/// A dense 3D grid of signed distances with per-voxel color and material.
///
/// Voxel `(x, y, z)` samples the world position `origin + (x, y, z) * step`.
/// Values are stored with x varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelField {
    /// Signed distance per voxel (negative = inside).
    pub(crate) distances: Vec<f64>,
    /// RGB color per voxel.
    pub(crate) colors: Vec<[f32; 3]>,
    /// Roughness, metalness and mask per voxel.
    pub(crate) materials: Vec<[f32; 3]>,
    /// Grid dimensions (nx, ny, nz).
    dimensions: (usize, usize, usize),
    /// World position of voxel (0, 0, 0).
    origin: Point3<f64>,
    /// World units between neighbouring voxels.
    step: f64,
}

impl VoxelField {
    /// Create a field filled with `fill_distance` and the given attributes.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_metaball::{SurfaceAttributes, VoxelField};
    /// use nalgebra::Point3;
    ///
    /// let field = VoxelField::new(
    ///     (4, 5, 6),
    ///     Point3::new(-1.0, -1.0, -1.0),
    ///     0.5,
    ///     1.0,
    ///     SurfaceAttributes::default(),
    /// );
    /// assert_eq!(field.len(), 120);
    /// ```
    #[must_use]
    pub fn new(
        dimensions: (usize, usize, usize),
        origin: Point3<f64>,
        step: f64,
        fill_distance: f64,
        attributes: SurfaceAttributes,
    ) -> Self {
        let (nx, ny, nz) = dimensions;
        let count = nx * ny * nz;

        Self {
            distances: vec![fill_distance; count],
            colors: vec![attributes.color; count],
            materials: vec![attributes.material; count],
            dimensions,
            origin,
            step,
        }
    }

    /// A field with no voxels.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            distances: Vec::new(),
            colors: Vec::new(),
            materials: Vec::new(),
            dimensions: (0, 0, 0),
            origin: Point3::origin(),
            step: 1.0,
        }
    }

    /// Assemble a field from raw buffers.
    ///
    /// # Errors
    ///
    /// Returns [`MetaballError::FieldShapeMismatch`] if any buffer length
    /// differs from `nx * ny * nz`.
    pub fn from_parts(
        dimensions: (usize, usize, usize),
        origin: Point3<f64>,
        step: f64,
        distances: Vec<f64>,
        colors: Vec<[f32; 3]>,
        materials: Vec<[f32; 3]>,
    ) -> MetaballResult<Self> {
        let field = Self {
            distances,
            colors,
            materials,
            dimensions,
            origin,
            step,
        };
        field.validate()?;
        Ok(field)
    }

    /// Check that every buffer holds exactly `nx * ny * nz` samples.
    ///
    /// # Errors
    ///
    /// Returns [`MetaballError::FieldShapeMismatch`] naming the first buffer
    /// whose length is wrong.
    pub fn validate(&self) -> MetaballResult<()> {
        let (nx, ny, nz) = self.dimensions;
        let expected = nx * ny * nz;
        for actual in [self.distances.len(), self.colors.len(), self.materials.len()] {
            if actual != expected {
                return Err(MetaballError::FieldShapeMismatch { expected, actual });
            }
        }
        Ok(())
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    /// World position of voxel (0, 0, 0).
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// World distance between neighbouring voxels.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Total number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if the field has no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Signed distance samples, x fastest.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Color samples, x fastest.
    #[must_use]
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Material samples, x fastest.
    #[must_use]
    pub fn materials(&self) -> &[[f32; 3]] {
        &self.materials
    }

    /// Distance at voxel coordinates, or `None` outside the grid.
    #[must_use]
    pub fn distance(&self, ix: usize, iy: usize, iz: usize) -> Option<f64> {
        self.checked_index(ix, iy, iz)
            .and_then(|idx| self.distances.get(idx).copied())
    }

    /// Set the distance at voxel coordinates.
    ///
    /// Does nothing if the coordinates are outside the grid.
    pub fn set_distance(&mut self, ix: usize, iy: usize, iz: usize, value: f64) {
        if let Some(slot) = self
            .checked_index(ix, iy, iz)
            .and_then(|idx| self.distances.get_mut(idx))
        {
            *slot = value;
        }
    }

    /// World position of a voxel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + ix as f64 * self.step,
            self.origin.y + iy as f64 * self.step,
            self.origin.z + iz as f64 * self.step,
        )
    }

    /// Linear index of voxel coordinates; callers keep coordinates in range.
    #[inline]
    pub(crate) const fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + iy * self.dimensions.0 + iz * self.dimensions.0 * self.dimensions.1
    }

    fn checked_index(&self, ix: usize, iy: usize, iz: usize) -> Option<usize> {
        let (nx, ny, nz) = self.dimensions;
        (ix < nx && iy < ny && iz < nz).then(|| self.index(ix, iy, iz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field(dimensions: (usize, usize, usize)) -> VoxelField {
        VoxelField::new(
            dimensions,
            Point3::new(-5.0, -5.0, -5.0),
            1.0,
            0.0,
            SurfaceAttributes::default(),
        )
    }

    #[test]
    fn new_field() {
        let field = field((3, 4, 5));
        assert_eq!(field.dimensions(), (3, 4, 5));
        assert_eq!(field.len(), 60);
        assert_eq!(field.colors().len(), 60);
        assert_eq!(field.materials().len(), 60);
        assert!(field.validate().is_ok());
    }

    #[test]
    fn empty_field() {
        let field = VoxelField::empty();
        assert!(field.is_empty());
        assert!(field.validate().is_ok());
    }

    #[test]
    fn get_set() {
        let mut field = field((5, 5, 5));
        field.set_distance(2, 3, 4, -1.5);
        assert_relative_eq!(field.distance(2, 3, 4).expect("in bounds"), -1.5);
    }

    #[test]
    fn out_of_bounds() {
        let mut field = field((5, 5, 5));
        assert!(field.distance(5, 0, 0).is_none());
        field.set_distance(100, 0, 0, 3.0);
        assert!(field.distances().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn x_varies_fastest() {
        let field = field((4, 3, 2));
        assert_eq!(field.index(1, 0, 0), 1);
        assert_eq!(field.index(0, 1, 0), 4);
        assert_eq!(field.index(0, 0, 1), 12);
    }

    #[test]
    fn position() {
        let field = field((10, 10, 10));
        let pos = field.position(5, 5, 5);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(pos.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn from_parts_rejects_short_buffer() {
        let result = VoxelField::from_parts(
            (2, 2, 2),
            Point3::origin(),
            1.0,
            vec![0.0; 8],
            vec![[1.0; 3]; 7],
            vec![[0.0; 3]; 8],
        );
        assert_eq!(
            result,
            Err(MetaballError::FieldShapeMismatch {
                expected: 8,
                actual: 7
            })
        );
    }
}
