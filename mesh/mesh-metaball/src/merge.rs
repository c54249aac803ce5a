//! Appending an extracted patch to an editable mesh.

use tracing::debug;

use crate::error::{MetaballError, MetaballResult};
use crate::mesh::{EditableMesh, MeshBuffers};
use crate::patch::SurfacePatch;

/// Counts reported by [`append_patch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Vertices contributed by the patch.
    pub vertices_added: usize,
    /// Faces contributed by the patch.
    pub faces_added: usize,
    /// Vertex count of the mesh after the merge.
    pub total_vertices: usize,
    /// Face count of the mesh after the merge.
    pub total_faces: usize,
}

impl MergeSummary {
    /// Check if the merge changed nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.vertices_added == 0 && self.faces_added == 0
    }
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Merge: +{} vertices, +{} faces ({} vertices, {} faces total)",
            self.vertices_added, self.faces_added, self.total_vertices, self.total_faces
        )
    }
}

/// Append a patch to a mesh.
///
/// Patch face indices are shifted by the mesh's current vertex count; the
/// fourth field of each face record is copied unchanged. The mesh receives
/// freshly allocated buffers, then its `init` and `init_render` hooks run in
/// that order.
///
/// An empty patch is a no-op: the mesh is not touched and its hooks are not
/// called.
///
/// # Errors
///
/// Returns an error if the mesh or patch violates the buffer-shape
/// invariants, or if the merged vertex count does not fit in a `u32` index.
/// The mesh is left unmodified on error.
///
/// # Example
///
/// ```
/// use mesh_metaball::{append_patch, MeshBuffers, SurfacePatch};
///
/// let mut patch = SurfacePatch::new();
/// let a = patch.push_vertex([0.0, 0.0, 0.0], [1.0; 3], [0.0; 3]);
/// let b = patch.push_vertex([1.0, 0.0, 0.0], [1.0; 3], [0.0; 3]);
/// let c = patch.push_vertex([0.0, 1.0, 0.0], [1.0; 3], [0.0; 3]);
/// patch.push_triangle(a, b, c);
///
/// let mut mesh = MeshBuffers::new();
/// append_patch(&mut mesh, &patch).unwrap();
/// let summary = append_patch(&mut mesh, &patch).unwrap();
///
/// assert_eq!(summary.total_vertices, 6);
/// assert_eq!(&mesh.faces[4..7], &[3, 4, 5]);
/// ```
pub fn append_patch<M: EditableMesh + ?Sized>(
    mesh: &mut M,
    patch: &SurfacePatch,
) -> MetaballResult<MergeSummary> {
    let existing = mesh.buffers();

    if patch.is_empty() {
        return Ok(MergeSummary {
            total_vertices: existing.vertex_count(),
            total_faces: existing.face_count(),
            ..MergeSummary::default()
        });
    }

    existing.validate()?;
    patch.validate()?;

    let total_vertices = existing.vertex_count() + patch.vertex_count();
    if u32::try_from(total_vertices).is_err() {
        return Err(MetaballError::IndexOverflow {
            vertex_count: total_vertices,
        });
    }
    let offset = u32::try_from(existing.vertex_count()).map_err(|_| {
        MetaballError::IndexOverflow {
            vertex_count: total_vertices,
        }
    })?;

    let merged = MeshBuffers {
        vertices: concat(&existing.vertices, &patch.vertices),
        faces: offset_faces(&existing.faces, &patch.faces, offset),
        colors: concat(&existing.colors, &patch.colors),
        materials: concat(&existing.materials, &patch.materials),
    };

    let summary = MergeSummary {
        vertices_added: patch.vertex_count(),
        faces_added: patch.face_count(),
        total_vertices,
        total_faces: merged.face_count(),
    };

    mesh.set_buffers(merged);
    mesh.init();
    mesh.init_render();

    debug!(
        offset,
        added_vertices = summary.vertices_added,
        added_faces = summary.faces_added,
        "Appended patch to mesh"
    );

    Ok(summary)
}

fn concat<T: Copy>(old: &[T], new: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(old.len() + new.len());
    out.extend_from_slice(old);
    out.extend_from_slice(new);
    out
}

fn offset_faces(old: &[u32], new: &[u32], offset: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(old.len() + new.len());
    out.extend_from_slice(old);
    for face in new.chunks_exact(4) {
        out.extend_from_slice(&[
            face[0] + offset,
            face[1] + offset,
            face[2] + offset,
            face[3],
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::TRIANGLE_TAG;

    fn triangle_patch() -> SurfacePatch {
        let mut patch = SurfacePatch::new();
        patch.push_vertex([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.1, 0.2, 0.3]);
        patch.push_vertex([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.1, 0.2, 0.3]);
        patch.push_vertex([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.1, 0.2, 0.3]);
        patch.push_triangle(0, 1, 2);
        patch
    }

    /// Records the order of host callbacks.
    #[derive(Default)]
    struct RecordingMesh {
        buffers: MeshBuffers,
        calls: Vec<&'static str>,
    }

    impl EditableMesh for RecordingMesh {
        fn buffers(&self) -> &MeshBuffers {
            &self.buffers
        }

        fn set_buffers(&mut self, buffers: MeshBuffers) {
            self.calls.push("set_buffers");
            self.buffers = buffers;
        }

        fn init(&mut self) {
            self.calls.push("init");
        }

        fn init_render(&mut self) {
            self.calls.push("init_render");
        }
    }

    #[test]
    fn append_to_empty() {
        let mut mesh = MeshBuffers::new();
        let summary = append_patch(&mut mesh, &triangle_patch()).expect("valid merge");

        assert_eq!(summary.vertices_added, 3);
        assert_eq!(summary.faces_added, 1);
        assert_eq!(mesh.faces, vec![0, 1, 2, TRIANGLE_TAG]);
        assert_eq!(mesh.vertices, triangle_patch().vertices);
    }

    #[test]
    fn append_offsets_indices_not_tag() {
        let mut mesh = MeshBuffers::new();
        append_patch(&mut mesh, &triangle_patch()).expect("valid merge");
        let summary = append_patch(&mut mesh, &triangle_patch()).expect("valid merge");

        assert_eq!(summary.total_vertices, 6);
        assert_eq!(summary.total_faces, 2);
        assert_eq!(mesh.faces, vec![0, 1, 2, TRIANGLE_TAG, 3, 4, 5, TRIANGLE_TAG]);
        assert_eq!(mesh.colors.len(), 18);
        assert_eq!(mesh.materials.len(), 18);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut mesh = RecordingMesh::default();
        append_patch(&mut mesh, &triangle_patch()).expect("valid merge");
        let before = mesh.buffers.clone();
        mesh.calls.clear();

        let summary = append_patch(&mut mesh, &SurfacePatch::new()).expect("no-op");

        assert!(summary.is_noop());
        assert_eq!(summary.total_vertices, 3);
        assert_eq!(mesh.buffers, before);
        assert!(mesh.calls.is_empty());
    }

    #[test]
    fn host_hooks_run_in_order() {
        let mut mesh = RecordingMesh::default();
        append_patch(&mut mesh, &triangle_patch()).expect("valid merge");
        assert_eq!(mesh.calls, vec!["set_buffers", "init", "init_render"]);
    }

    #[test]
    fn invalid_patch_leaves_mesh_untouched() {
        let mut mesh = RecordingMesh::default();
        append_patch(&mut mesh, &triangle_patch()).expect("valid merge");
        let before = mesh.buffers.clone();
        mesh.calls.clear();

        let mut bad = triangle_patch();
        bad.push_triangle(0, 1, 7);
        let result = append_patch(&mut mesh, &bad);

        assert_eq!(
            result,
            Err(MetaballError::FaceIndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
        assert_eq!(mesh.buffers, before);
        assert!(mesh.calls.is_empty());
    }

    #[test]
    fn invalid_mesh_is_rejected() {
        let mut mesh = MeshBuffers::new();
        mesh.colors.push(1.0);
        assert!(matches!(
            append_patch(&mut mesh, &triangle_patch()),
            Err(MetaballError::BufferLengthMismatch {
                buffer: "colors",
                ..
            })
        ));
    }

    #[test]
    fn summary_display() {
        let summary = MergeSummary {
            vertices_added: 3,
            faces_added: 1,
            total_vertices: 6,
            total_faces: 2,
        };
        assert_eq!(
            summary.to_string(),
            "Merge: +3 vertices, +1 faces (6 vertices, 2 faces total)"
        );
    }
}
