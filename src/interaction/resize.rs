use crate::geometry::{Point, Rect};
use crate::scene::ResizeHandle;

/// An in-flight table resize, anchored at the rectangle and pointer
/// position captured when it started.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGesture {
    pub uuid: String,
    pub handle: ResizeHandle,
    start_pointer: Point,
    start_rect: Rect,
}

impl ResizeGesture {
    pub fn start(uuid: &str, handle: ResizeHandle, pointer: Point, rect: Rect) -> Self {
        Self {
            uuid: uuid.to_string(),
            handle,
            start_pointer: pointer,
            start_rect: rect,
        }
    }

    pub fn rect_at(&self, pointer: Point, min_width: f64, min_height: f64) -> Rect {
        resize_rect(
            self.start_rect,
            self.handle,
            pointer.x - self.start_pointer.x,
            pointer.y - self.start_pointer.y,
            min_width,
            min_height,
        )
    }
}

fn moves_west(handle: ResizeHandle) -> bool {
    matches!(handle, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
}

fn moves_east(handle: ResizeHandle) -> bool {
    matches!(handle, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
}

fn moves_north(handle: ResizeHandle) -> bool {
    matches!(handle, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
}

fn moves_south(handle: ResizeHandle) -> bool {
    matches!(handle, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
}

/// Apply a pointer delta to `rect` through `handle`.
///
/// The edge opposite the handle stays put, including when the result is
/// clamped to the minimum size.
pub fn resize_rect(
    rect: Rect,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
    min_width: f64,
    min_height: f64,
) -> Rect {
    let mut out = rect;

    if moves_west(handle) {
        out.x = rect.x + dx;
        out.width = rect.width - dx;
    } else if moves_east(handle) {
        out.width = rect.width + dx;
    }
    if moves_north(handle) {
        out.y = rect.y + dy;
        out.height = rect.height - dy;
    } else if moves_south(handle) {
        out.height = rect.height + dy;
    }

    if out.width < min_width {
        out.width = min_width;
        if moves_west(handle) {
            out.x = rect.right() - min_width;
        }
    }
    if out.height < min_height {
        out.height = min_height;
        if moves_north(handle) {
            out.y = rect.bottom() - min_height;
        }
    }
    out
}
