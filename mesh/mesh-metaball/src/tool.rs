//! Stroke lifecycle tying tracking, sampling, extraction and merging together.

use nalgebra::Point3;
use tracing::{info, warn};

use crate::anchor::AnchorTracker;
use crate::error::MetaballResult;
use crate::field::build_field;
use crate::marching_cubes::compute_surface;
use crate::merge::{MergeSummary, append_patch};
use crate::mesh::EditableMesh;
use crate::params::MetaballParams;

/// Supplies the surface point under the pointer.
pub trait IntersectionSource {
    /// The current intersection, or `None` when the pointer misses the mesh.
    fn intersection_point(&self) -> Option<Point3<f64>>;
}

/// Receives redraw requests after geometry changes.
pub trait RenderHost {
    /// Schedule a redraw.
    fn render(&mut self);
}

/// What a single stroke sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// The pointer did not hit the mesh; nothing changed.
    NoIntersection,
    /// The sample was too close to the previous anchor; nothing changed.
    Rejected,
    /// The anchors produced no surface; the anchor was kept, the mesh unchanged.
    EmptySurface,
    /// A patch was appended to the mesh.
    Appended(MergeSummary),
}

impl StrokeOutcome {
    /// Check if the mesh received new geometry.
    #[must_use]
    pub const fn is_appended(&self) -> bool {
        matches!(self, Self::Appended(_))
    }
}

/// Interactive metaball brush.
///
/// Every accepted sample rebuilds the surface over all anchors of the current
/// stroke and appends it to the mesh, so long strokes accumulate overlapping
/// shells.
///
/// # Example
///
/// ```
/// use mesh_metaball::{IntersectionSource, MeshBuffers, MetaballParams, MetaballTool, RenderHost};
/// use nalgebra::Point3;
///
/// struct Hit(Point3<f64>);
/// impl IntersectionSource for Hit {
///     fn intersection_point(&self) -> Option<Point3<f64>> {
///         Some(self.0)
///     }
/// }
///
/// struct Viewport;
/// impl RenderHost for Viewport {
///     fn render(&mut self) {}
/// }
///
/// let mut tool = MetaballTool::new(MetaballParams::preview());
/// let mut mesh = MeshBuffers::new();
/// let outcome = tool.start(&Hit(Point3::origin()), &mut mesh, &mut Viewport).unwrap();
///
/// assert!(outcome.is_appended());
/// assert!(mesh.face_count() > 0);
/// tool.end();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetaballTool {
    params: MetaballParams,
    tracker: AnchorTracker,
}

impl MetaballTool {
    /// Create a tool with the given parameters.
    #[must_use]
    pub fn new(params: MetaballParams) -> Self {
        let tracker = AnchorTracker::with_spacing_ratio(params.min_spacing_ratio);
        Self { params, tracker }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &MetaballParams {
        &self.params
    }

    /// Mutable access to the parameters.
    ///
    /// Values are validated at the next sample.
    pub fn params_mut(&mut self) -> &mut MetaballParams {
        &mut self.params
    }

    /// Replace the parameters.
    ///
    /// # Errors
    ///
    /// Returns the validation error and keeps the old parameters if `params`
    /// is invalid.
    pub fn set_params(&mut self, params: MetaballParams) -> MetaballResult<()> {
        params.validate()?;
        self.tracker.set_spacing_ratio(params.min_spacing_ratio);
        self.params = params;
        Ok(())
    }

    /// Anchors of the current stroke.
    #[must_use]
    pub const fn tracker(&self) -> &AnchorTracker {
        &self.tracker
    }

    /// Begin a new stroke and sample it once.
    ///
    /// # Errors
    ///
    /// See [`stroke`](Self::stroke).
    pub fn start<P, M, H>(
        &mut self,
        picking: &P,
        mesh: &mut M,
        host: &mut H,
    ) -> MetaballResult<StrokeOutcome>
    where
        P: IntersectionSource + ?Sized,
        M: EditableMesh + ?Sized,
        H: RenderHost + ?Sized,
    {
        self.tracker.reset();
        self.stroke(picking, mesh, host)
    }

    /// Sample the stroke at the current pointer position.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the mesh buffers
    /// cannot be merged with the new patch. The mesh is unmodified on error.
    pub fn stroke<P, M, H>(
        &mut self,
        picking: &P,
        mesh: &mut M,
        host: &mut H,
    ) -> MetaballResult<StrokeOutcome>
    where
        P: IntersectionSource + ?Sized,
        M: EditableMesh + ?Sized,
        H: RenderHost + ?Sized,
    {
        let result = self.sample(picking, mesh, host);
        if let Err(ref err) = result {
            warn!(error = %err, anchors = self.tracker.len(), "Metaball sample failed");
        }
        result
    }

    /// Finish the stroke; the next sample starts a new path.
    pub fn end(&mut self) {
        self.tracker.reset();
    }

    fn sample<P, M, H>(
        &mut self,
        picking: &P,
        mesh: &mut M,
        host: &mut H,
    ) -> MetaballResult<StrokeOutcome>
    where
        P: IntersectionSource + ?Sized,
        M: EditableMesh + ?Sized,
        H: RenderHost + ?Sized,
    {
        self.params.validate()?;

        let Some(point) = picking.intersection_point() else {
            return Ok(StrokeOutcome::NoIntersection);
        };

        self.tracker.set_spacing_ratio(self.params.min_spacing_ratio);
        if !self.tracker.add_sample(point, self.params.radius) {
            return Ok(StrokeOutcome::Rejected);
        }

        let field = build_field(self.tracker.anchors(), &self.params);
        let mut patch = compute_surface(&field)?;
        if patch.is_empty() {
            return Ok(StrokeOutcome::EmptySurface);
        }
        patch.to_world(&field.origin(), field.step());

        let summary = append_patch(mesh, &patch)?;
        host.render();

        info!(
            anchors = self.tracker.len(),
            vertices = summary.vertices_added,
            faces = summary.faces_added,
            total_vertices = summary.total_vertices,
            "Appended metaball patch"
        );

        Ok(StrokeOutcome::Appended(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetaballError;
    use crate::mesh::MeshBuffers;
    use std::cell::Cell;

    /// Replays a fixed sequence of pointer hits.
    struct ScriptedPicking {
        points: Vec<Option<Point3<f64>>>,
        next: Cell<usize>,
    }

    impl ScriptedPicking {
        fn new(points: Vec<Option<Point3<f64>>>) -> Self {
            Self {
                points,
                next: Cell::new(0),
            }
        }
    }

    impl IntersectionSource for ScriptedPicking {
        fn intersection_point(&self) -> Option<Point3<f64>> {
            let i = self.next.get();
            self.next.set(i + 1);
            self.points.get(i).copied().flatten()
        }
    }

    #[derive(Default)]
    struct CountingHost {
        renders: usize,
    }

    impl RenderHost for CountingHost {
        fn render(&mut self) {
            self.renders += 1;
        }
    }

    fn tool() -> MetaballTool {
        MetaballTool::new(
            MetaballParams::preview()
                .with_radius(10.0)
                .with_smoothness(2.0),
        )
    }

    #[test]
    fn start_appends_patch() {
        let mut tool = tool();
        let picking = ScriptedPicking::new(vec![Some(Point3::origin())]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        let outcome = tool
            .start(&picking, &mut mesh, &mut host)
            .expect("valid sample");

        let StrokeOutcome::Appended(summary) = outcome else {
            panic!("expected appended patch, got {outcome:?}");
        };
        assert_eq!(summary.total_vertices, mesh.vertex_count());
        assert_eq!(host.renders, 1);
        assert_eq!(tool.tracker().len(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn miss_changes_nothing() {
        let mut tool = tool();
        let picking = ScriptedPicking::new(vec![None]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        let outcome = tool
            .start(&picking, &mut mesh, &mut host)
            .expect("valid sample");

        assert_eq!(outcome, StrokeOutcome::NoIntersection);
        assert!(mesh.is_empty());
        assert_eq!(host.renders, 0);
        assert!(tool.tracker().is_empty());
    }

    #[test]
    fn close_sample_rejected() {
        let mut tool = tool();
        // Spacing is 0.2 * 10 = 2.
        let picking = ScriptedPicking::new(vec![
            Some(Point3::origin()),
            Some(Point3::new(1.0, 0.0, 0.0)),
        ]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        tool.start(&picking, &mut mesh, &mut host)
            .expect("valid sample");
        let before = mesh.clone();
        let outcome = tool
            .stroke(&picking, &mut mesh, &mut host)
            .expect("valid sample");

        assert_eq!(outcome, StrokeOutcome::Rejected);
        assert_eq!(mesh, before);
        assert_eq!(host.renders, 1);
    }

    #[test]
    fn stroke_accumulates_patches() {
        let mut tool = tool();
        let picking = ScriptedPicking::new(vec![
            Some(Point3::origin()),
            Some(Point3::new(5.0, 0.0, 0.0)),
        ]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        let first = tool
            .start(&picking, &mut mesh, &mut host)
            .expect("valid sample");
        let first_vertices = mesh.vertex_count();
        let second = tool
            .stroke(&picking, &mut mesh, &mut host)
            .expect("valid sample");

        assert!(first.is_appended());
        assert!(second.is_appended());
        assert_eq!(tool.tracker().len(), 2);
        // The second patch covers both anchors and is appended, not replacing.
        assert!(mesh.vertex_count() > 2 * first_vertices);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn end_starts_new_path() {
        let mut tool = tool();
        let picking = ScriptedPicking::new(vec![
            Some(Point3::origin()),
            Some(Point3::new(0.5, 0.0, 0.0)),
        ]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        tool.start(&picking, &mut mesh, &mut host)
            .expect("valid sample");
        tool.end();
        assert!(tool.tracker().is_empty());

        let outcome = tool
            .start(&picking, &mut mesh, &mut host)
            .expect("valid sample");
        assert!(outcome.is_appended());
        assert_eq!(tool.tracker().len(), 1);
    }

    #[test]
    fn set_params_validates() {
        let mut tool = tool();
        let result = tool.set_params(MetaballParams::default().with_radius(-1.0));
        assert_eq!(result, Err(MetaballError::InvalidRadius(-1.0)));
        assert!((tool.params().radius - 10.0).abs() < f64::EPSILON);

        tool.set_params(MetaballParams::default().with_radius(20.0))
            .expect("valid params");
        assert!((tool.params().radius - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_params_fail_sample() {
        let mut tool = tool();
        tool.params_mut().smoothness = 0.0;
        let picking = ScriptedPicking::new(vec![Some(Point3::origin())]);
        let mut mesh = MeshBuffers::new();
        let mut host = CountingHost::default();

        let result = tool.start(&picking, &mut mesh, &mut host);

        assert_eq!(result, Err(MetaballError::InvalidSmoothness(0.0)));
        assert!(mesh.is_empty());
        assert_eq!(host.renders, 0);
    }

    #[test]
    fn malformed_mesh_fails_sample() {
        let mut tool = tool();
        let picking = ScriptedPicking::new(vec![Some(Point3::origin())]);
        let mut mesh = MeshBuffers::new();
        mesh.faces.push(0);
        let before = mesh.clone();
        let mut host = CountingHost::default();

        let result = tool.start(&picking, &mut mesh, &mut host);

        assert!(matches!(
            result,
            Err(MetaballError::BufferLengthMismatch { buffer: "faces", .. })
        ));
        assert_eq!(mesh, before);
        assert_eq!(host.renders, 0);
    }
}
