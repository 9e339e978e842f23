use super::{GestureEvent, RecognizerSpec, is_valid_line_marker};
use crate::config::{GeometryConfig, GestureConfig};
use crate::geometry::{FeatureHit, FeaturePriority, closest_cell_feature};
use crate::grid::Grid;
use kurbo::{Point, Rect};

#[derive(Debug, Clone, Copy)]
struct TapRecord {
    time_ms: u64,
    position: Point,
    hit: FeatureHit,
}

/// Stateful recognizer for one tool's pointer interaction.
///
/// The press resolves without a margin so the first click always lands on
/// the nearest feature; while the pointer is down, moves only count once they
/// come within the drag margin of a new feature. A release that never left
/// the pressed feature is reported as a tap, and consecutive taps on the same
/// feature within the multi-tap window and distance raise the tap count.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    spec: RecognizerSpec,
    surface: Rect,
    priority: FeaturePriority,
    drag_margin: f64,
    multi_tap_ms: u64,
    multi_tap_distance: f64,
    previous: Option<FeatureHit>,
    down: bool,
    is_tap: bool,
    last_tap: Option<TapRecord>,
    tap_count: u32,
}

impl GestureRecognizer {
    pub fn new(
        spec: RecognizerSpec,
        gesture: &GestureConfig,
        geometry: &GeometryConfig,
        grid: Grid,
    ) -> Self {
        Self {
            spec,
            surface: grid.surface(geometry.outside_ring),
            priority: geometry.priority,
            drag_margin: gesture.margin_for(spec.kind),
            multi_tap_ms: gesture.multi_tap_ms,
            multi_tap_distance: gesture.multi_tap_distance,
            previous: None,
            down: false,
            is_tap: false,
            last_tap: None,
            tap_count: 0,
        }
    }

    pub fn spec(&self) -> RecognizerSpec {
        self.spec
    }

    /// True between a press and its release.
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// The last accepted feature.
    pub fn current(&self) -> Option<FeatureHit> {
        self.previous
    }

    fn resolve(&self, point: Point, margin: Option<f64>) -> Option<FeatureHit> {
        if !self.surface.contains(point) {
            return None;
        }
        closest_cell_feature(point, self.spec.kind, margin, &self.priority)
    }

    /// Accept `hit` as the next drag step, or `None` if it changes nothing.
    fn step(&self, hit: FeatureHit) -> Option<FeatureHit> {
        let Some(previous) = self.previous else {
            return Some(hit);
        };
        if self.spec.same_target(&previous, &hit) {
            return None;
        }
        if self.down && self.spec.pen && !is_valid_line_marker(&previous.feature, &hit.feature) {
            return None;
        }
        Some(hit)
    }

    pub fn pointer_down(&mut self, point: Point, _time_ms: u64) -> Vec<GestureEvent> {
        let Some(hit) = self.resolve(point, None) else {
            return Vec::new();
        };
        self.previous = Some(hit);
        self.down = true;
        self.is_tap = true;
        vec![GestureEvent::DragStart(hit)]
    }

    pub fn pointer_move(&mut self, point: Point, _time_ms: u64) -> Vec<GestureEvent> {
        let margin = self.down.then_some(self.drag_margin);
        let Some(hit) = self.resolve(point, margin).and_then(|hit| self.step(hit)) else {
            return Vec::new();
        };
        self.previous = Some(hit);
        let mut events = vec![GestureEvent::Move(hit)];
        if self.down {
            self.is_tap = false;
            events.push(GestureEvent::Drag(hit));
        }
        events
    }

    pub fn pointer_up(&mut self, point: Point, time_ms: u64) -> Vec<GestureEvent> {
        if !self.down {
            return Vec::new();
        }
        self.down = false;

        let mut events = Vec::new();
        // Catch up when the last move before the release was dropped.
        if let Some(hit) = self
            .resolve(point, Some(self.drag_margin))
            .and_then(|hit| self.step(hit))
        {
            self.previous = Some(hit);
            self.is_tap = false;
            events.push(GestureEvent::Drag(hit));
        }
        if let Some(previous) = self.previous {
            events.push(GestureEvent::DragEnd(previous));
        }

        if !self.is_tap {
            self.last_tap = None;
            self.tap_count = 0;
            return events;
        }
        self.is_tap = false;

        let Some(hit) = self.resolve(point, None) else {
            return events;
        };
        let count = match self.last_tap {
            Some(last)
                if time_ms.saturating_sub(last.time_ms) <= self.multi_tap_ms
                    && last.position.distance(point) <= self.multi_tap_distance
                    && self.spec.same_target(&last.hit, &hit) =>
            {
                self.tap_count + 1
            }
            _ => 1,
        };
        self.tap_count = count;
        self.last_tap = Some(TapRecord {
            time_ms,
            position: point,
            hit,
        });
        events.push(GestureEvent::Tap { hit, count });
        events
    }

    /// Forget the gesture in progress and the tap history.
    pub fn reset(&mut self) {
        self.previous = None;
        self.down = false;
        self.is_tap = false;
        self.last_tap = None;
        self.tap_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Feature, FeatureKind};
    use crate::grid::GridCoord;

    fn recognizer(spec: RecognizerSpec) -> GestureRecognizer {
        GestureRecognizer::new(
            spec,
            &GestureConfig::default(),
            &GeometryConfig::default(),
            Grid::new(9, 9),
        )
    }

    fn cells() -> GestureRecognizer {
        recognizer(RecognizerSpec::new(FeatureKind::Cell))
    }

    fn tap(r: &mut GestureRecognizer, point: Point, time_ms: u64) -> Option<u32> {
        r.pointer_down(point, time_ms);
        r.pointer_up(point, time_ms + 10)
            .into_iter()
            .find_map(|e| match e {
                GestureEvent::Tap { count, .. } => Some(count),
                _ => None,
            })
    }

    #[test]
    fn test_tap_without_move() {
        let mut r = cells();
        let down = r.pointer_down(Point::new(0.5, 0.5), 0);
        assert!(matches!(down[..], [GestureEvent::DragStart(_)]));
        let up = r.pointer_up(Point::new(0.5, 0.5), 50);
        assert!(matches!(
            up[..],
            [GestureEvent::DragEnd(_), GestureEvent::Tap { count: 1, .. }]
        ));
    }

    #[test]
    fn test_drag_is_not_tap() {
        let mut r = cells();
        r.pointer_down(Point::new(0.5, 0.5), 0);
        let moved = r.pointer_move(Point::new(1.5, 0.5), 10);
        let next = Feature::Cell(GridCoord::new(0, 1));
        assert!(matches!(
            moved[..],
            [GestureEvent::Move(_), GestureEvent::Drag(hit)] if hit.feature == next
        ));
        let up = r.pointer_up(Point::new(1.5, 0.5), 20);
        assert!(matches!(up[..], [GestureEvent::DragEnd(_)]));
    }

    #[test]
    fn test_drag_respects_margin() {
        let mut r = cells();
        r.pointer_down(Point::new(0.5, 0.5), 0);
        // In cell (0, 1) but 0.45 from its center.
        assert!(r.pointer_move(Point::new(1.05, 0.5), 10).is_empty());
        assert_eq!(r.current().map(|h| h.cell), Some(GridCoord::new(0, 0)));
    }

    #[test]
    fn test_hover_ignores_margin() {
        let mut r = cells();
        let events = r.pointer_move(Point::new(1.05, 0.5), 0);
        assert!(matches!(events[..], [GestureEvent::Move(_)]));
    }

    #[test]
    fn test_multi_tap_counts() {
        let mut r = cells();
        let p = Point::new(2.5, 2.5);
        assert_eq!(tap(&mut r, p, 0), Some(1));
        assert_eq!(tap(&mut r, p, 200), Some(2));
        assert_eq!(tap(&mut r, p, 400), Some(3));
        // Too late.
        assert_eq!(tap(&mut r, p, 2000), Some(1));
    }

    #[test]
    fn test_multi_tap_requires_same_feature() {
        let mut r = cells();
        assert_eq!(tap(&mut r, Point::new(2.5, 2.5), 0), Some(1));
        assert_eq!(tap(&mut r, Point::new(3.5, 2.5), 100), Some(1));
    }

    #[test]
    fn test_multi_tap_distance() {
        let mut r = cells();
        assert_eq!(tap(&mut r, Point::new(2.2, 2.5), 0), Some(1));
        assert_eq!(tap(&mut r, Point::new(2.8, 2.5), 100), Some(1));
    }

    #[test]
    fn test_drag_resets_tap_count() {
        let mut r = cells();
        let p = Point::new(2.5, 2.5);
        assert_eq!(tap(&mut r, p, 0), Some(1));
        r.pointer_down(p, 50);
        r.pointer_move(Point::new(3.5, 2.5), 60);
        r.pointer_up(Point::new(3.5, 2.5), 70);
        assert_eq!(tap(&mut r, p, 100), Some(1));
    }

    #[test]
    fn test_up_without_down_is_ignored() {
        let mut r = cells();
        assert!(r.pointer_up(Point::new(0.5, 0.5), 0).is_empty());
    }

    #[test]
    fn test_outside_surface_is_ignored() {
        let mut r = cells();
        assert!(r.pointer_down(Point::new(-1.5, 0.5), 0).is_empty());
        assert!(!r.is_down());
        // The ring of one outside cell is still part of the surface.
        assert_eq!(r.pointer_down(Point::new(-0.5, 0.5), 0).len(), 1);
    }

    #[test]
    fn test_dropped_move_catches_up_on_release() {
        let mut r = cells();
        r.pointer_down(Point::new(0.5, 0.5), 0);
        let up = r.pointer_up(Point::new(1.5, 0.5), 10);
        assert!(matches!(
            up[..],
            [GestureEvent::Drag(_), GestureEvent::DragEnd(hit)] if hit.cell == GridCoord::new(0, 1)
        ));
    }

    #[test]
    fn test_pen_rejects_jumps() {
        let mut r = recognizer(RecognizerSpec::new(FeatureKind::Corner).pen());
        r.pointer_down(Point::new(1.0, 1.0), 0);
        assert!(r.pointer_move(Point::new(3.0, 1.0), 10).is_empty());
        assert_eq!(
            r.current().map(|h| h.feature),
            Some(Feature::Corner(GridCoord::new(1, 1)))
        );
        let events = r.pointer_move(Point::new(2.0, 1.0), 20);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_corner_seen_from_two_cells() {
        let plain = RecognizerSpec::new(FeatureKind::Corner);
        let mut r = recognizer(plain);
        r.pointer_down(Point::new(0.9, 0.9), 0);
        assert!(r.pointer_move(Point::new(1.1, 0.9), 10).is_empty());

        let mut r = recognizer(plain.directional());
        r.pointer_down(Point::new(0.9, 0.9), 0);
        assert_eq!(r.pointer_move(Point::new(1.1, 0.9), 10).len(), 2);
    }
}
