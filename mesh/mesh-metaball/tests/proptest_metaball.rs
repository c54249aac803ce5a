//! Property-based tests for merging and anchor thinning.
//!
//! Run with: cargo test -p mesh-metaball -- proptest

#![allow(clippy::cast_possible_truncation)]

use mesh_metaball::{AnchorTracker, MeshBuffers, SurfacePatch, TRIANGLE_TAG, append_patch};
use nalgebra::Point3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-100.0..100.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_rgb() -> impl Strategy<Value = [f32; 3]> {
    prop::array::uniform3(0.0..1.0f32)
}

/// A well-formed patch: every face index is below the vertex count.
fn arb_patch(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = SurfacePatch> {
    (0..=max_vertices).prop_flat_map(move |n| {
        let vertices = prop::collection::vec((prop::array::uniform3(-10.0..10.0f32), arb_rgb()), n);
        let faces = if n == 0 {
            Just(Vec::new()).boxed()
        } else {
            prop::collection::vec(prop::array::uniform3(0..n as u32), 0..=max_faces).boxed()
        };

        (vertices, faces).prop_map(|(vertices, faces)| {
            let mut patch = SurfacePatch::new();
            for (position, color) in vertices {
                patch.push_vertex(position, color, [0.18, 0.08, 1.0]);
            }
            for [a, b, c] in faces {
                patch.push_triangle(a, b, c);
            }
            patch
        })
    })
}

// =============================================================================
// Merge properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_merge_keeps_invariants(patches in prop::collection::vec(arb_patch(12, 16), 1..6)) {
        let mut mesh = MeshBuffers::new();

        for patch in &patches {
            let before = mesh.clone();
            let summary = append_patch(&mut mesh, patch).expect("valid patch");

            prop_assert!(mesh.validate().is_ok());
            prop_assert_eq!(mesh.colors.len(), mesh.vertices.len());
            prop_assert_eq!(mesh.materials.len(), mesh.vertices.len());
            prop_assert_eq!(summary.total_vertices, before.vertex_count() + patch.vertex_count());

            if patch.is_empty() {
                prop_assert_eq!(&mesh, &before);
                continue;
            }

            // Old data is a prefix, new faces are shifted by the old vertex count.
            prop_assert_eq!(&mesh.vertices[..before.vertices.len()], before.vertices.as_slice());
            prop_assert_eq!(&mesh.faces[..before.faces.len()], before.faces.as_slice());

            let offset = before.vertex_count() as u32;
            let appended = &mesh.faces[before.faces.len()..];
            prop_assert_eq!(appended.len(), patch.faces.len());
            for (merged, original) in appended.chunks_exact(4).zip(patch.faces.chunks_exact(4)) {
                prop_assert_eq!(merged[0], original[0] + offset);
                prop_assert_eq!(merged[1], original[1] + offset);
                prop_assert_eq!(merged[2], original[2] + offset);
                prop_assert_eq!(merged[3], TRIANGLE_TAG);
            }
        }
    }

    #[test]
    fn proptest_merge_rejects_dangling_index(patch in arb_patch(8, 4), extra in 0u32..64) {
        let mut mesh = MeshBuffers::new();
        let mut bad = patch;
        let dangling = bad.vertex_count() as u32 + extra;
        bad.push_vertex([0.0; 3], [1.0; 3], [0.0; 3]);
        bad.push_triangle(0, 0, dangling + 1);

        prop_assert!(append_patch(&mut mesh, &bad).is_err());
        prop_assert!(mesh.is_empty());
    }
}

// =============================================================================
// Thinning properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn proptest_accepted_anchors_are_spaced(
        points in prop::collection::vec(arb_point(), 1..40),
        radius in 5.0..200.0f64,
    ) {
        let mut tracker = AnchorTracker::new();
        let min_spacing = radius * AnchorTracker::DEFAULT_SPACING_RATIO;

        for point in points {
            let before = tracker.anchors().to_vec();
            let accepted = tracker.add_sample(point, radius);

            match before.last() {
                None => prop_assert!(accepted),
                Some(last) => {
                    let far_enough = nalgebra::distance(last, &point) >= min_spacing;
                    prop_assert_eq!(accepted, far_enough);
                }
            }
            if !accepted {
                prop_assert_eq!(tracker.anchors(), before.as_slice());
            }
        }

        for pair in tracker.anchors().windows(2) {
            prop_assert!(nalgebra::distance(&pair[0], &pair[1]) >= min_spacing);
        }
    }
}
