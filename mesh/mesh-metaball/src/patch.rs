//! Extracted triangle soup awaiting a merge.

// Patch sizes stay well inside f32/u32 precision.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point3, Vector3};

use crate::error::{MetaballError, MetaballResult};

/// Fourth entry of a face record that holds a triangle rather than a quad.
pub const TRIANGLE_TAG: u32 = u32::MAX;

/// Flat geometry buffers produced by one extraction pass.
///
/// Buffers use the host mesh's record shapes: three floats per vertex for
/// positions, colors and materials, and four `u32` per face (three vertex
/// indices followed by [`TRIANGLE_TAG`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfacePatch {
    /// Vertex positions, `[x, y, z]` per vertex.
    pub vertices: Vec<f32>,
    /// Face records, `[a, b, c, tag]` per face.
    pub faces: Vec<u32>,
    /// Vertex colors, `[r, g, b]` per vertex.
    pub colors: Vec<f32>,
    /// Vertex materials, `[roughness, metalness, mask]` per vertex.
    pub materials: Vec<f32>,
}

impl SurfacePatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty patch with room for the given counts.
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count * 3),
            faces: Vec::with_capacity(face_count * 4),
            colors: Vec::with_capacity(vertex_count * 3),
            materials: Vec::with_capacity(vertex_count * 3),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len() / 4
    }

    /// Check if the patch has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: [f32; 3], color: [f32; 3], material: [f32; 3]) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position);
        self.colors.extend_from_slice(&color);
        self.materials.extend_from_slice(&material);
        index
    }

    /// Append a triangle record.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.faces.extend_from_slice(&[a, b, c, TRIANGLE_TAG]);
    }

    /// Position of a vertex, or `None` if the index is out of range.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<Point3<f64>> {
        self.vertices
            .get(index * 3..index * 3 + 3)
            .map(|p| Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
    }

    /// Iterate over vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|p| Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
    }

    /// Iterate over the vertex index triples of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.chunks_exact(4).map(|f| [f[0], f[1], f[2]])
    }

    /// Map grid-local positions to world space: `world = origin + local * step`.
    pub fn to_world(&mut self, origin: &Point3<f64>, step: f64) {
        for p in self.vertices.chunks_exact_mut(3) {
            p[0] = (origin.x + f64::from(p[0]) * step) as f32;
            p[1] = (origin.y + f64::from(p[1]) * step) as f32;
            p[2] = (origin.z + f64::from(p[2]) * step) as f32;
        }
    }

    /// Signed enclosed volume.
    ///
    /// Uses the divergence theorem: the sum of signed tetrahedra formed by
    /// each face and the origin. Positive for a closed patch wound
    /// counter-clockwise seen from outside.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for [a, b, c] in self.triangles() {
            let (Some(v0), Some(v1), Some(v2)) = (
                self.position(a as usize),
                self.position(b as usize),
                self.position(c as usize),
            ) else {
                continue;
            };
            let cross: Vector3<f64> = v1.coords.cross(&v2.coords);
            volume += v0.coords.dot(&cross);
        }
        volume / 6.0
    }

    /// Check the buffer-shape invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if a buffer length is not a multiple of its record
    /// size, the per-vertex buffers disagree, or a face references a missing
    /// vertex.
    pub fn validate(&self) -> MetaballResult<()> {
        check_geometry(&self.vertices, &self.faces, &self.colors, &self.materials)
    }
}

/// Shared shape check for patch and mesh buffers.
pub(crate) fn check_geometry(
    vertices: &[f32],
    faces: &[u32],
    colors: &[f32],
    materials: &[f32],
) -> MetaballResult<()> {
    if vertices.len() % 3 != 0 {
        return Err(MetaballError::BufferLengthMismatch {
            buffer: "vertices",
            len: vertices.len(),
            expected: vertices.len() - vertices.len() % 3,
        });
    }
    if faces.len() % 4 != 0 {
        return Err(MetaballError::BufferLengthMismatch {
            buffer: "faces",
            len: faces.len(),
            expected: faces.len() - faces.len() % 4,
        });
    }
    for (buffer, len) in [("colors", colors.len()), ("materials", materials.len())] {
        if len != vertices.len() {
            return Err(MetaballError::BufferLengthMismatch {
                buffer,
                len,
                expected: vertices.len(),
            });
        }
    }

    let vertex_count = vertices.len() / 3;
    for face in faces.chunks_exact(4) {
        if let Some(&index) = face[..3].iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MetaballError::FaceIndexOutOfRange {
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}
