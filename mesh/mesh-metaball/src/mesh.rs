//! Host mesh buffers and the rebuild hooks a merge drives.

use crate::error::MetaballResult;
use crate::patch::check_geometry;

/// Flat geometry buffers of an editable mesh.
///
/// Same record shapes as [`SurfacePatch`](crate::SurfacePatch): three floats
/// per vertex in `vertices`, `colors` and `materials`, four `u32` per face.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshBuffers {
    /// Vertex positions, `[x, y, z]` per vertex.
    pub vertices: Vec<f32>,
    /// Face records, `[a, b, c, tag]` per face.
    pub faces: Vec<u32>,
    /// Vertex colors, `[r, g, b]` per vertex.
    pub colors: Vec<f32>,
    /// Vertex materials, `[roughness, metalness, mask]` per vertex.
    pub materials: Vec<f32>,
}

impl MeshBuffers {
    /// Create empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Check if the buffers hold no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
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

/// A mesh whose geometry buffers can be replaced wholesale.
///
/// After [`set_buffers`](Self::set_buffers) the merger calls
/// [`init`](Self::init) and then [`init_render`](Self::init_render) so the
/// host can rebuild topology and GPU state.
pub trait EditableMesh {
    /// Current geometry.
    fn buffers(&self) -> &MeshBuffers;

    /// Replace the geometry.
    fn set_buffers(&mut self, buffers: MeshBuffers);

    /// Rebuild derived topology.
    fn init(&mut self);

    /// Rebuild render state.
    fn init_render(&mut self);
}

impl EditableMesh for MeshBuffers {
    fn buffers(&self) -> &MeshBuffers {
        self
    }

    fn set_buffers(&mut self, buffers: MeshBuffers) {
        *self = buffers;
    }

    fn init(&mut self) {}

    fn init_render(&mut self) {}
}
