//! Editor behavior settings.

use serde::Deserialize;

use crate::raw::Size;

/// Behavioral constants for parsing, placement, routing and authoring.
///
/// Deserializable from a camelCase JSON object; omitted keys keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_table_width: f64,
    pub min_table_height: f64,
    pub paper_size: Size,
    pub pages_size: Size,
    /// Upper bound on either page count
    pub max_pages: f64,
    /// Origin of the first table created on an empty canvas
    pub placement_origin: (f64, f64),
    /// Gap between an existing table and a newly placed one
    pub placement_margin: f64,
    pub viewport_width: f64,
    pub new_table_width: f64,
    pub new_table_base_height: f64,
    pub new_table_row_height: f64,
    /// Dogleg length before turning on perpendicular side pairs
    pub elbow_extension: f64,
    /// Padding around a connector's anchor points for its layout rectangle
    pub connector_padding: f64,
    /// Layout array key to try before structural discovery
    pub layout_key: Option<String>,
    /// Key used when a diagram has no layout array yet
    pub default_layout_key: String,
    pub default_reference_schema: String,
    pub default_referential_action: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_table_width: 100.0,
            min_table_height: 60.0,
            paper_size: Size::new(850.0, 1100.0),
            pages_size: Size::new(4.0, 3.0),
            max_pages: 100.0,
            placement_origin: (50.0, 50.0),
            placement_margin: 50.0,
            viewport_width: 1200.0,
            new_table_width: 200.0,
            new_table_base_height: 100.0,
            new_table_row_height: 20.0,
            elbow_extension: 30.0,
            connector_padding: 50.0,
            layout_key: None,
            default_layout_key: "DiagramObjectLayouts".to_string(),
            default_reference_schema: "public".to_string(),
            default_referential_action: "NO ACTION".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whole page counts in `1..=max_pages`. Counts that are not positive
    /// numbers fall back to the default on that axis.
    pub fn clamp_pages(&self, pages: Size) -> Size {
        let axis = |count: f64, default: f64| {
            if count.is_finite() && count >= 1.0 {
                count.floor().min(self.max_pages.max(1.0))
            } else {
                default
            }
        };
        Size::new(
            axis(pages.width, self.pages_size.width),
            axis(pages.height, self.pages_size.height),
        )
    }
}
