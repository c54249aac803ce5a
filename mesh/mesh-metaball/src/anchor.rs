//! Stroke anchor tracking.

use nalgebra::Point3;
use tracing::debug;

/// Accumulates the anchor points of the current stroke.
///
/// A sample closer than `spacing_ratio * radius` to the previously accepted
/// anchor is dropped, so a slow drag does not stack spheres on one spot.
///
/// # Example
///
/// ```
/// use mesh_metaball::AnchorTracker;
/// use nalgebra::Point3;
///
/// let mut tracker = AnchorTracker::new();
/// assert!(tracker.add_sample(Point3::new(0.0, 0.0, 0.0), 10.0));
/// assert!(!tracker.add_sample(Point3::new(1.0, 0.0, 0.0), 10.0));
/// assert!(tracker.add_sample(Point3::new(5.0, 0.0, 0.0), 10.0));
/// assert_eq!(tracker.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    anchors: Vec<Point3<f64>>,
    spacing_ratio: f64,
}

impl Default for AnchorTracker {
    fn default() -> Self {
        Self::with_spacing_ratio(Self::DEFAULT_SPACING_RATIO)
    }
}

impl AnchorTracker {
    /// Default minimum spacing between anchors, as a fraction of the radius.
    pub const DEFAULT_SPACING_RATIO: f64 = 0.2;

    /// Create an empty tracker with the default spacing ratio.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tracker with a custom spacing ratio.
    #[must_use]
    pub const fn with_spacing_ratio(spacing_ratio: f64) -> Self {
        Self {
            anchors: Vec::new(),
            spacing_ratio,
        }
    }

    /// Current spacing ratio.
    #[must_use]
    pub const fn spacing_ratio(&self) -> f64 {
        self.spacing_ratio
    }

    /// Change the spacing ratio for subsequent samples.
    pub fn set_spacing_ratio(&mut self, spacing_ratio: f64) {
        self.spacing_ratio = spacing_ratio;
    }

    /// Forget all anchors.
    pub fn reset(&mut self) {
        self.anchors.clear();
    }

    /// Offer a new sample for the stroke.
    ///
    /// Returns `true` if the point was appended, `false` if it was within
    /// `spacing_ratio * radius` of the last anchor. A rejected sample leaves
    /// the anchor list unchanged.
    pub fn add_sample(&mut self, point: Point3<f64>, radius: f64) -> bool {
        if let Some(last) = self.anchors.last() {
            let distance = nalgebra::distance(&point, last);
            let min_spacing = radius * self.spacing_ratio;
            if distance < min_spacing {
                debug!(distance, min_spacing, "Rejected anchor sample");
                return false;
            }
        }
        self.anchors.push(point);
        true
    }

    /// Anchors of the current stroke, in insertion order.
    #[must_use]
    pub fn anchors(&self) -> &[Point3<f64>] {
        &self.anchors
    }

    /// Most recently accepted anchor.
    #[must_use]
    pub fn last(&self) -> Option<&Point3<f64>> {
        self.anchors.last()
    }

    /// Number of anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Check if the stroke has no anchors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
