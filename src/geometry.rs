//! Rectangle and path geometry shared by the router, scene and renderer.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, moved to a new origin.
    pub fn at(&self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// Midpoint of the given side.
    pub fn anchor(&self, side: Side) -> Point {
        let c = self.center();
        match side {
            Side::Top => Point::new(c.x, self.y),
            Side::Right => Point::new(self.right(), c.y),
            Side::Bottom => Point::new(c.x, self.bottom()),
            Side::Left => Point::new(self.x, c.y),
        }
    }

    /// Side whose edge line lies closest to `point`. Ties keep the earlier
    /// side in Top, Right, Bottom, Left order.
    pub fn closest_side(&self, point: Point) -> Side {
        let distances = [
            (Side::Top, (point.y - self.y).abs()),
            (Side::Right, (point.x - self.right()).abs()),
            (Side::Bottom, (point.y - self.bottom()).abs()),
            (Side::Left, (point.x - self.x).abs()),
        ];

        let mut best = distances[0];
        for candidate in &distances[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        best.0
    }

    /// Smallest rectangle holding every point, grown by `padding` on all sides.
    pub fn bounding(points: &[Point], padding: f64) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x - padding,
            min_y - padding,
            max_x - min_x + padding * 2.0,
            max_y - min_y + padding * 2.0,
        ))
    }
}

/// Side of a rectangle a connector attaches to.
///
/// The numeric value is the `Index` stored in a ConnectInfo record; this is the
/// only numbering used anywhere in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

impl Side {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::Right),
            2 => Some(Self::Bottom),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    pub fn index(self) -> i64 {
        self as i64
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }
}

/// Axis an elbow connector leaves its first vertex on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Vertical" => Self::Vertical,
            _ => Self::Horizontal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
        }
    }

    fn flip(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// SVG path data (`M x y L x y ...`) through the given points.
pub fn polyline_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        let _ = write!(d, "{} {} {}", cmd, p.x, p.y);
    }
    d
}

/// Orthogonal path through stored vertices, offset by `origin`.
///
/// Each step first travels along the current axis to the next vertex's
/// coordinate, then turns to reach it; the axis alternates per step.
pub fn elbow_path(vertices: &[Point], origin: Point, start_axis: Axis) -> String {
    if vertices.len() < 2 {
        return String::new();
    }

    let points: Vec<Point> = vertices
        .iter()
        .map(|v| Point::new(origin.x + v.x, origin.y + v.y))
        .collect();

    let mut d = format!("M {} {}", points[0].x, points[0].y);
    let mut axis = start_axis;

    for pair in points.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        match axis {
            Axis::Horizontal => {
                let _ = write!(d, " L {} {}", curr.x, prev.y);
                if prev.y != curr.y {
                    let _ = write!(d, " L {} {}", curr.x, curr.y);
                }
            }
            Axis::Vertical => {
                let _ = write!(d, " L {} {}", prev.x, curr.y);
                if prev.x != curr.x {
                    let _ = write!(d, " L {} {}", curr.x, curr.y);
                }
            }
        }
        axis = axis.flip();
    }

    d
}

/// Straight segments through stored vertices, offset by `origin`.
pub fn straight_path(vertices: &[Point], origin: Point) -> String {
    if vertices.len() < 2 {
        return String::new();
    }
    let points: Vec<Point> = vertices
        .iter()
        .map(|v| Point::new(origin.x + v.x, origin.y + v.y))
        .collect();
    polyline_path(&points)
}
