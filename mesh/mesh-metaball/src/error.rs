//! Error types for metaball generation.

use thiserror::Error;

/// Result type for metaball operations.
pub type MetaballResult<T> = Result<T, MetaballError>;

/// Errors that can occur while sampling, extracting or merging metaballs.
///
/// Missing intersections, rejected samples and empty surfaces are not errors;
/// they are reported through [`StrokeOutcome`](crate::StrokeOutcome).
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MetaballError {
    /// The influence radius is not positive or not finite.
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// The smooth-minimum blend width is not positive or not finite.
    #[error("smoothness must be positive and finite, got {0}")]
    InvalidSmoothness(f64),

    /// The grid quality setting is outside the supported range.
    #[error("resolution must be in range [{min}, {max}], got {value}")]
    InvalidResolution {
        /// The provided resolution.
        value: u32,
        /// Smallest accepted resolution.
        min: u32,
        /// Largest accepted resolution.
        max: u32,
    },

    /// Too few cells per influence diameter to resolve a sphere.
    #[error("cells per diameter must be at least 2, got {0}")]
    InvalidCellsPerDiameter(usize),

    /// The voxel budget is zero.
    #[error("voxel budget must be positive, got {0}")]
    InvalidVoxelBudget(usize),

    /// The anchor spacing ratio is negative or not finite.
    #[error("anchor spacing ratio must be finite and non-negative, got {0}")]
    InvalidSpacingRatio(f64),

    /// A voxel field's buffers disagree with its dimensions.
    #[error("voxel field has {actual} samples but its dimensions require {expected}")]
    FieldShapeMismatch {
        /// Sample count implied by `nx * ny * nz`.
        expected: usize,
        /// Length of the offending buffer.
        actual: usize,
    },

    /// A geometry buffer has a length that breaks the buffer-shape invariants.
    #[error("{buffer} buffer has length {len}, expected {expected}")]
    BufferLengthMismatch {
        /// Name of the buffer (`"vertices"`, `"faces"`, `"colors"`, `"materials"`).
        buffer: &'static str,
        /// Actual length.
        len: usize,
        /// Length required by the other buffers.
        expected: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face index {index} out of range for {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices available.
        vertex_count: usize,
    },

    /// The merged mesh would hold more vertices than a `u32` face index can address.
    #[error("merged vertex count {vertex_count} exceeds u32 index range")]
    IndexOverflow {
        /// Vertex count after the merge.
        vertex_count: usize,
    },
}
