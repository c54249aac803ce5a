//! Marching cubes extraction of the zero level set.
//!
//! Uses the classic 256-configuration tables without an asymptotic decider,
//! so saddle cells may resolve either way. Crossing vertices are welded by
//! lattice edge: neighbouring cells that share an edge share its vertex, which
//! keeps the patch watertight for a field that closes inside the grid.

// Grid coordinates and vertex counts fit comfortably in f32/u32.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use hashbrown::HashMap;
use tracing::debug;

use crate::error::MetaballResult;
use crate::grid::VoxelField;
use crate::patch::SurfacePatch;
use crate::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// Distance differences below this are treated as a flat edge.
const FLAT_EDGE_EPSILON: f64 = 1e-12;

/// Triangulate the surface where the field's distance crosses zero.
///
/// Vertex positions are in grid-local (voxel index) space; map them to world
/// space with [`SurfacePatch::to_world`] using the field's origin and step.
/// Colors and materials are interpolated along each crossed edge with the
/// same parameter as the position. Triangles are wound counter-clockwise
/// seen from outside.
///
/// A field with fewer than two samples along any axis, or without a sign
/// change, produces an empty patch.
///
/// # Errors
///
/// Returns [`MetaballError::FieldShapeMismatch`](crate::MetaballError::FieldShapeMismatch)
/// if the field's buffers disagree with its dimensions.
///
/// # Example
///
/// ```
/// use mesh_metaball::{build_field, compute_surface, MetaballParams};
/// use nalgebra::Point3;
///
/// let field = build_field(&[Point3::origin()], &MetaballParams::default());
/// let patch = compute_surface(&field).unwrap();
/// assert!(patch.face_count() > 0);
/// ```
pub fn compute_surface(field: &VoxelField) -> MetaballResult<SurfacePatch> {
    field.validate()?;

    let (nx, ny, nz) = field.dimensions();
    if nx < 2 || ny < 2 || nz < 2 {
        return Ok(SurfacePatch::new());
    }

    let mut patch = SurfacePatch::new();
    let mut edge_vertices: HashMap<usize, u32> = HashMap::new();

    for iz in 0..nz - 1 {
        for iy in 0..ny - 1 {
            for ix in 0..nx - 1 {
                let corners: [[usize; 3]; 8] = CORNER_OFFSETS.map(|[dx, dy, dz]| {
                    [ix + dx, iy + dy, iz + dz]
                });
                let indices = corners.map(|[x, y, z]| field.index(x, y, z));
                let distances = indices.map(|i| field.distances[i]);

                let config = distances
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| **d < 0.0)
                    .fold(0usize, |acc, (i, _)| acc | (1 << i));

                let crossed = EDGE_TABLE[config];
                if crossed == 0 {
                    continue;
                }

                let mut cell_vertices = [0u32; 12];
                for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
                    if crossed & (1 << edge) == 0 {
                        continue;
                    }

                    // Always interpolate from the lower corner so both cells
                    // sharing the edge compute the same vertex.
                    let (lo, hi) = if indices[a] < indices[b] { (a, b) } else { (b, a) };
                    let axis = (0..3)
                        .find(|&k| corners[lo][k] != corners[hi][k])
                        .unwrap_or(0);
                    let key = indices[lo] * 3 + axis;

                    cell_vertices[edge] = *edge_vertices.entry(key).or_insert_with(|| {
                        let t = crossing_parameter(distances[lo], distances[hi]);
                        let position = lerp3(to_f32(corners[lo]), to_f32(corners[hi]), t);
                        let color = lerp3(
                            field.colors[indices[lo]],
                            field.colors[indices[hi]],
                            t,
                        );
                        let material = lerp3(
                            field.materials[indices[lo]],
                            field.materials[indices[hi]],
                            t,
                        );
                        patch.push_vertex(position, color, material)
                    });
                }

                for tri in TRI_TABLE[config]
                    .chunks_exact(3)
                    .take_while(|tri| tri[0] >= 0)
                {
                    // Table triples face inward; swap the last two to face out.
                    patch.push_triangle(
                        cell_vertices[tri[0] as usize],
                        cell_vertices[tri[2] as usize],
                        cell_vertices[tri[1] as usize],
                    );
                }
            }
        }
    }

    debug!(
        vertices = patch.vertex_count(),
        faces = patch.face_count(),
        "Extracted metaball surface"
    );

    Ok(patch)
}

/// Zero crossing between two samples of opposite sign: `t = d0 / (d0 - d1)`.
fn crossing_parameter(d0: f64, d1: f64) -> f32 {
    let denom = d0 - d1;
    if denom.abs() < FLAT_EDGE_EPSILON {
        return 0.5;
    }
    (d0 / denom).clamp(0.0, 1.0) as f32
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn to_f32([x, y, z]: [usize; 3]) -> [f32; 3] {
    [x as f32, y as f32, z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetaballError;
    use crate::field::{build_field, sphere_sdf};
    use crate::params::{MetaballParams, SurfaceAttributes};
    use crate::patch::TRIANGLE_TAG;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::collections::HashMap as StdHashMap;

    /// A single 2x2x2 cell with the given corner distances (corner order of
    /// `CORNER_OFFSETS`).
    fn single_cell(corner_distances: [f64; 8]) -> VoxelField {
        let mut field = VoxelField::new(
            (2, 2, 2),
            Point3::origin(),
            1.0,
            1.0,
            SurfaceAttributes::default(),
        );
        for (c, [x, y, z]) in CORNER_OFFSETS.iter().enumerate() {
            field.set_distance(*x, *y, *z, corner_distances[c]);
        }
        field
    }

    fn sphere_field(radius: f64) -> VoxelField {
        build_field(
            &[Point3::new(0.3, -0.2, 0.1)],
            &MetaballParams::default().with_radius(radius),
        )
    }

    #[test]
    fn empty_field_gives_empty_patch() {
        let patch = compute_surface(&VoxelField::empty()).expect("valid field");
        assert!(patch.is_empty());
        assert_eq!(patch.face_count(), 0);
    }

    #[test]
    fn flat_field_gives_empty_patch() {
        let field = VoxelField::new(
            (1, 5, 5),
            Point3::origin(),
            1.0,
            -1.0,
            SurfaceAttributes::default(),
        );
        assert!(compute_surface(&field).expect("valid field").is_empty());
    }

    #[test]
    fn no_sign_change_gives_empty_patch() {
        let outside = single_cell([1.0; 8]);
        assert!(compute_surface(&outside).expect("valid field").is_empty());

        let inside = single_cell([-1.0; 8]);
        assert!(compute_surface(&inside).expect("valid field").is_empty());
    }

    #[test]
    fn malformed_field_is_rejected() {
        let mut field = single_cell([1.0; 8]);
        field.colors.pop();
        assert!(matches!(
            compute_surface(&field),
            Err(MetaballError::FieldShapeMismatch { .. })
        ));
    }

    #[test]
    fn single_corner_inside() {
        let patch =
            compute_surface(&single_cell([-1.0, 3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]))
                .expect("valid field");

        assert_eq!(patch.vertex_count(), 3);
        assert_eq!(patch.face_count(), 1);
        assert_eq!(patch.faces[3], TRIANGLE_TAG);

        // Crossing on the x edge: t = -1 / (-1 - 3) = 0.25
        let has_x_crossing = patch
            .positions()
            .any(|p| (p - Point3::new(0.25, 0.0, 0.0)).norm() < 1e-6);
        assert!(has_x_crossing);

        // Normal points away from the inside corner.
        let [a, b, c] = patch.triangles().next().expect("one triangle");
        let pa = patch.position(a as usize).expect("vertex");
        let pb = patch.position(b as usize).expect("vertex");
        let pc = patch.position(c as usize).expect("vertex");
        let normal = (pb - pa).cross(&(pc - pa));
        assert!(normal.x > 0.0 && normal.y > 0.0 && normal.z > 0.0);
    }

    #[test]
    fn attributes_interpolated_along_edge() {
        let mut field = single_cell([-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        field.colors[0] = [0.0, 0.0, 0.0];
        field.materials[0] = [0.0, 0.0, 0.0];

        let patch = compute_surface(&field).expect("valid field");
        assert_eq!(patch.vertex_count(), 3);
        for v in 0..3 {
            for channel in 0..3 {
                assert_relative_eq!(patch.colors[v * 3 + channel], 0.5, epsilon = 1e-6);
            }
            assert_relative_eq!(patch.materials[v * 3], 0.09, epsilon = 1e-6);
            assert_relative_eq!(patch.materials[v * 3 + 1], 0.04, epsilon = 1e-6);
            assert_relative_eq!(patch.materials[v * 3 + 2], 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn sphere_is_closed_and_consistently_wound() {
        let patch = compute_surface(&sphere_field(3.0)).expect("valid field");
        assert!(patch.face_count() > 0);

        let mut directed: StdHashMap<(u32, u32), usize> = StdHashMap::new();
        for [a, b, c] in patch.triangles() {
            for edge in [(a, b), (b, c), (c, a)] {
                *directed.entry(edge).or_default() += 1;
            }
        }
        for (&(a, b), &count) in &directed {
            assert_eq!(count, 1, "edge ({a}, {b}) used twice in one direction");
            assert_eq!(directed.get(&(b, a)), Some(&1), "edge ({a}, {b}) is open");
        }
    }

    #[test]
    fn sphere_volume_positive_and_close() {
        let radius = 3.0;
        let field = sphere_field(radius);
        let mut patch = compute_surface(&field).expect("valid field");
        patch.to_world(&field.origin(), field.step());

        let expected = 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3);
        let volume = patch.signed_volume();
        assert!(volume > 0.0);
        assert!((volume - expected).abs() / expected < 0.08, "volume {volume}");
    }

    #[test]
    fn sphere_vertices_near_surface() {
        let center = Point3::new(0.3, -0.2, 0.1);
        let radius = 3.0;
        let field = sphere_field(radius);
        let mut patch = compute_surface(&field).expect("valid field");
        patch.to_world(&field.origin(), field.step());

        for p in patch.positions() {
            assert!(sphere_sdf(&p, &center, radius).abs() < field.step());
        }
    }

    #[test]
    fn vertices_are_welded() {
        let patch = compute_surface(&sphere_field(3.0)).expect("valid field");
        // A closed genus-0 surface: V - E + F = 2 with E = 3F / 2.
        let v = patch.vertex_count() as i64;
        let f = patch.face_count() as i64;
        assert_eq!(v - 3 * f / 2 + f, 2);
    }
}
