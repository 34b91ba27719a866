//! Placement of newly created tables.

use crate::geometry::Rect;

/// Parameters for placing a new table next to the existing ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: (f64, f64),
    pub margin: f64,
    pub viewport_width: f64,
    pub width: f64,
}

impl Placement {
    /// Top-left corner for a new table.
    ///
    /// With no existing tables this is `origin`. Otherwise the table goes
    /// `margin` to the right of the rightmost table, level with it; if that
    /// would run past the viewport it starts a new row below the lowest table.
    pub fn next_origin<'a>(&self, existing: impl IntoIterator<Item = &'a Rect>) -> (f64, f64) {
        let mut any = false;
        let mut max_right = f64::MIN;
        let mut rightmost_y = 0.0;
        let mut max_bottom = f64::MIN;

        for rect in existing {
            any = true;
            if rect.right() > max_right {
                max_right = rect.right();
                rightmost_y = rect.y;
            }
            max_bottom = max_bottom.max(rect.bottom());
        }

        if !any {
            return self.origin;
        }

        let x = max_right + self.margin;
        if x + self.width > self.viewport_width {
            (self.origin.0, max_bottom + self.margin)
        } else {
            (x, rightmost_y)
        }
    }
}
