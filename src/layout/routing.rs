//! Connector routing between two rectangles.
//!
//! Pure geometry: no model or scene access, inputs are never mutated.

use crate::geometry::{Point, Rect, Side, polyline_path};
use crate::model::ConnectorKind;

/// A routed connector: the sides it leaves and enters, and its polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub source_side: Side,
    pub target_side: Side,
    pub points: Vec<Point>,
}

impl Route {
    /// SVG path data for this route.
    pub fn to_path(&self) -> String {
        polyline_path(&self.points)
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Router configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Router {
    /// Dogleg length before turning on perpendicular side pairs
    pub elbow_extension: f64,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            elbow_extension: 30.0,
        }
    }
}

impl Router {
    pub fn new(elbow_extension: f64) -> Self {
        Self { elbow_extension }
    }

    /// Pick the facing sides of `source` and `target` and route between them.
    pub fn route(&self, source: &Rect, target: &Rect, kind: ConnectorKind) -> Route {
        let (source_side, target_side) = facing_sides(source, target);
        self.route_between(source, source_side, target, target_side, kind)
    }

    /// Route between fixed sides.
    ///
    /// Parallel side pairs bend once at the midpoint between the anchors;
    /// perpendicular pairs extend out of the source side, then turn toward
    /// the target anchor.
    pub fn route_between(
        &self,
        source: &Rect,
        source_side: Side,
        target: &Rect,
        target_side: Side,
        kind: ConnectorKind,
    ) -> Route {
        let p1 = source.anchor(source_side);
        let p2 = target.anchor(target_side);

        let points = match kind {
            ConnectorKind::Straight => vec![p1, p2],
            ConnectorKind::Elbow => {
                match (source_side.is_horizontal(), target_side.is_horizontal()) {
                    (true, true) => {
                        let mid_x = (p1.x + p2.x) / 2.0;
                        vec![p1, Point::new(mid_x, p1.y), Point::new(mid_x, p2.y), p2]
                    }
                    (false, false) => {
                        let mid_y = (p1.y + p2.y) / 2.0;
                        vec![p1, Point::new(p1.x, mid_y), Point::new(p2.x, mid_y), p2]
                    }
                    (true, false) => {
                        let ext_x = if source_side == Side::Right {
                            p1.x + self.elbow_extension
                        } else {
                            p1.x - self.elbow_extension
                        };
                        vec![p1, Point::new(ext_x, p1.y), Point::new(ext_x, p2.y), p2]
                    }
                    (false, true) => {
                        let ext_y = if source_side == Side::Bottom {
                            p1.y + self.elbow_extension
                        } else {
                            p1.y - self.elbow_extension
                        };
                        vec![p1, Point::new(p1.x, ext_y), Point::new(p2.x, ext_y), p2]
                    }
                }
            }
        };

        Route {
            source_side,
            target_side,
            points,
        }
    }
}

/// Sides facing each other along the dominant axis between the two centers.
///
/// `|dx| == |dy|` takes the horizontal branch; `dx == 0` within it takes the
/// source-is-right-of-target mirror.
pub fn facing_sides(source: &Rect, target: &Rect) -> (Side, Side) {
    let c1 = source.center();
    let c2 = target.center();
    let dx = c2.x - c1.x;
    let dy = c2.y - c1.y;

    if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy > 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_horizontal_route() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(300.0, 100.0, 100.0, 100.0);
        let route = Router::default().route(&a, &b, ConnectorKind::Elbow);
        assert_eq!(route.source_side, Side::Right);
        assert_eq!(route.target_side, Side::Left);
        assert_eq!(route.to_path(), "M 100 50 L 200 50 L 200 150 L 300 150");
    }

    #[test]
    fn test_vertical_route() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(20.0, 300.0, 100.0, 100.0);
        let route = Router::default().route(&a, &b, ConnectorKind::Elbow);
        assert_eq!((route.source_side, route.target_side), (Side::Bottom, Side::Top));
        assert_eq!(route.to_path(), "M 50 100 L 50 200 L 70 200 L 70 300");
    }

    #[test]
    fn test_upward_route() {
        let a = Rect::new(0.0, 300.0, 100.0, 100.0);
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let route = Router::default().route(&a, &b, ConnectorKind::Elbow);
        assert_eq!((route.source_side, route.target_side), (Side::Top, Side::Bottom));
    }

    #[test]
    fn test_tie_prefers_horizontal() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(200.0, 200.0, 100.0, 100.0);
        assert_eq!(facing_sides(&a, &b), (Side::Right, Side::Left));
        // coincident centers fall through to the mirror branch
        assert_eq!(facing_sides(&a, &a), (Side::Left, Side::Right));
    }

    #[test]
    fn test_perpendicular_dogleg() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(300.0, 300.0, 100.0, 100.0);
        let route = Router::default().route_between(&a, Side::Right, &b, Side::Top, ConnectorKind::Elbow);
        assert_eq!(route.to_path(), "M 100 50 L 130 50 L 130 300 L 350 300");

        let route = Router::default().route_between(&a, Side::Top, &b, Side::Left, ConnectorKind::Elbow);
        assert_eq!(route.to_path(), "M 50 0 L 50 -30 L 300 -30 L 300 350");
    }

    #[test]
    fn test_straight_route() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(300.0, 0.0, 100.0, 100.0);
        let route = Router::default().route(&a, &b, ConnectorKind::Straight);
        assert_eq!(route.to_path(), "M 100 50 L 300 50");
    }

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (-2000i32..2000, -2000i32..2000, 100i32..400, 60i32..400)
            .prop_map(|(x, y, w, h)| Rect::new(x as f64, y as f64, w as f64, h as f64))
    }

    proptest! {
        #[test]
        fn prop_route_is_deterministic(a in rect_strategy(), b in rect_strategy()) {
            let router = Router::default();
            let first = router.route(&a, &b, ConnectorKind::Elbow);
            let second = router.route(&a, &b, ConnectorKind::Elbow);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_swapped_route_mirrors(a in rect_strategy(), b in rect_strategy()) {
            prop_assume!(a.center() != b.center());
            let router = Router::default();
            let forward = router.route(&a, &b, ConnectorKind::Elbow);
            let backward = router.route(&b, &a, ConnectorKind::Elbow);
            prop_assert_eq!(forward.source_side, backward.target_side);
            prop_assert_eq!(forward.target_side, backward.source_side);
            prop_assert_eq!(forward.source_side.opposite(), forward.target_side);
            prop_assert_eq!(forward.start(), backward.end());
            prop_assert_eq!(forward.end(), backward.start());
        }

        #[test]
        fn prop_elbow_segments_are_orthogonal(a in rect_strategy(), b in rect_strategy()) {
            let route = Router::default().route(&a, &b, ConnectorKind::Elbow);
            for pair in route.points.windows(2) {
                prop_assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
            }
        }
    }
}
