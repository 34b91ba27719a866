use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::geometry::Point;

/// Metrics of a rendered table box.
#[derive(Debug, Clone)]
pub struct TextMetrics {
    pub char_width: f64,
    pub header_height: f64,
    /// Header plus the gap above the first field row
    pub body_top: f64,
    pub field_row_height: f64,
    pub bottom_margin: f64,
    pub padding_x: f64,
    pub handle_size: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 6.0,
            header_height: 30.0,
            body_top: 35.0,
            field_row_height: 16.0,
            bottom_margin: 10.0,
            padding_x: 8.0,
            handle_size: 8.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        UnicodeWidthStr::width(text) as f64 * self.char_width
    }

    /// Number of field rows that fit in a box of the given height.
    pub fn visible_fields(&self, height: f64) -> usize {
        let available = height - self.body_top - self.bottom_margin;
        if available <= 0.0 {
            0
        } else {
            (available / self.field_row_height).floor() as usize
        }
    }

    /// Baseline of the `index`-th field row, relative to the box origin.
    pub fn field_baseline(&self, index: usize) -> f64 {
        self.body_top + self.bottom_margin + index as f64 * self.field_row_height
    }

    /// Center of a field row in canvas coordinates.
    pub fn field_center(&self, origin: Point, width: f64, index: usize) -> Point {
        let top = origin.y + self.field_baseline(index) - 12.0;
        Point::new(origin.x + width / 2.0, top + self.field_row_height / 2.0)
    }

    /// Width available to field text inside the clip region.
    pub fn clip_width(&self, width: f64) -> f64 {
        (width - self.padding_x * 2.0).max(0.0)
    }

    /// Fit `text` into `width`, replacing the tail with `...` when it overflows.
    pub fn truncate(&self, text: &str, width: f64) -> String {
        let available = width - 20.0;
        if self.text_width(text) <= available {
            return text.to_string();
        }

        let max_cols = (available / self.char_width).floor().max(0.0) as usize;
        let budget = max_cols.saturating_sub(3);
        let mut out = String::new();
        let mut used = 0;
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if used + w > budget {
                break;
            }
            used += w;
            out.push(ch);
        }
        out.push_str("...");
        out
    }
}
