use crate::geometry::Point;

/// An in-flight table move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGesture {
    pub uuid: String,
    /// Pointer position relative to the box origin when the drag started
    offset: Point,
}

impl MoveGesture {
    pub fn start(uuid: &str, pointer: Point, origin: Point) -> Self {
        Self {
            uuid: uuid.to_string(),
            offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
        }
    }

    /// Box origin for a pointer position in canvas coordinates.
    pub fn origin_at(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.offset.x, pointer.y - self.offset.y)
    }
}
