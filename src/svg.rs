use crate::measure::TextMetrics;
use crate::scene::{ConnectorNode, DragLine, Scene, TableNode};
use std::fmt::Write;

pub struct SvgRenderer {
    pub header_color: &'static str,
    pub page_boundaries: bool,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            header_color: "#3788d8",
            page_boundaries: true,
        }
    }
}

impl SvgRenderer {
    pub fn render(&self, scene: &Scene) -> String {
        let mut svg = String::new();
        let size = scene.canvas_size();
        let (width, height) = if size.width > 0.0 && size.height > 0.0 {
            (size.width, size.height)
        } else {
            (2000.0, 2000.0)
        };

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        );

        // Style
        let _ = writeln!(
            svg,
            r#"<style>
  .table-header {{ font-family: sans-serif; font-size: 13px; font-weight: bold; }}
  .table-field {{ font-family: monospace; font-size: 11px; }}
  .relationship-line {{ stroke: #666; stroke-width: 1.5; fill: none; }}
  .page-boundary {{ stroke: #ccc; stroke-dasharray: 4,4; }}
  .fk-drag-line {{ stroke: #ff6b00; stroke-dasharray: 5,5; }}
</style>"#
        );

        let _ = writeln!(
            svg,
            r##"<defs>
  <marker id="arrowhead" markerWidth="10" markerHeight="7" refX="10" refY="3.5" orient="auto"><polygon points="0 0, 10 3.5, 0 7" fill="#666" /></marker>
  <marker id="arrowhead-start" markerWidth="10" markerHeight="7" refX="0" refY="3.5" orient="auto"><polygon points="10 0, 0 3.5, 10 7" fill="#666" /></marker>
</defs>"##
        );

        if self.page_boundaries {
            self.render_page_boundaries(&mut svg, scene);
        }

        // Connectors first (behind tables)
        let _ = writeln!(svg, r#"<g id="relationships">"#);
        for connector in scene.connectors.values() {
            svg.push_str(&self.connector_fragment(connector));
        }
        let _ = writeln!(svg, "</g>");

        let _ = writeln!(svg, r#"<g id="tables">"#);
        for table in scene.tables.values() {
            svg.push_str(&self.table_fragment(table, scene.metrics()));
        }
        let _ = writeln!(svg, "</g>");

        if let Some(line) = &scene.drag_line {
            svg.push_str(&self.drag_line_fragment(line));
        }

        let _ = writeln!(svg, "</svg>");
        svg
    }

    fn render_page_boundaries(&self, svg: &mut String, scene: &Scene) {
        let page_w = scene.paper_size.width;
        let page_h = scene.paper_size.height;
        let pages_x = scene.pages_size.width as i64;
        let pages_y = scene.pages_size.height as i64;

        let _ = writeln!(svg, r#"<g id="page-boundaries">"#);
        for i in 1..pages_x {
            let x = i as f64 * page_w;
            let _ = writeln!(
                svg,
                r#"<line class="page-boundary" x1="{}" y1="0" x2="{}" y2="{}" />"#,
                x,
                x,
                pages_y as f64 * page_h
            );
        }
        for i in 1..pages_y {
            let y = i as f64 * page_h;
            let _ = writeln!(
                svg,
                r#"<line class="page-boundary" x1="0" y1="{}" x2="{}" y2="{}" />"#,
                y,
                pages_x as f64 * page_w,
                y
            );
        }
        let _ = writeln!(svg, "</g>");
    }

    /// One table box as a `<g>` element, for redrawing a single node.
    pub fn table_fragment(&self, node: &TableNode, metrics: &TextMetrics) -> String {
        let mut svg = String::new();
        let w = node.width;
        let h = node.height;
        let header = metrics.header_height;
        let handle = metrics.handle_size;

        let _ = writeln!(
            svg,
            r#"<g class="table-node" data-uuid="{}" transform="translate({}, {})">"#,
            escape_xml(&node.uuid),
            node.transform.x,
            node.transform.y
        );

        // 1. Background and border
        let _ = writeln!(
            svg,
            r##"<rect width="{}" height="{}" fill="#ffffff" stroke="{}" stroke-width="2" rx="4" />"##,
            w, h, self.header_color
        );

        // 2. Header with square bottom corners
        let _ = writeln!(
            svg,
            r#"<rect width="{}" height="{}" fill="{}" rx="4" />"#,
            node.header_width, header, self.header_color
        );
        let _ = writeln!(
            svg,
            r#"<rect y="{}" width="{}" height="10" fill="{}" />"#,
            header - 10.0,
            node.header_width,
            self.header_color
        );
        let _ = writeln!(
            svg,
            r#"<text class="table-header" x="{}" y="{}" text-anchor="middle" fill="white">{}</text>"#,
            node.header_width / 2.0,
            header - 10.0,
            escape_xml(&node.name)
        );

        // 3. Field rows, clipped to the body
        let clip_id = format!("fields-clip-{}", node.uuid);
        let _ = writeln!(
            svg,
            r#"<defs><clipPath id="{}"><rect x="{}" y="0" width="{}" height="{}" /></clipPath></defs>"#,
            escape_xml(&clip_id),
            metrics.padding_x,
            node.clip.width,
            node.clip.height
        );
        let _ = writeln!(svg, r#"<g clip-path="url(#{})">"#, escape_xml(&clip_id));
        for row in &node.rows {
            let _ = writeln!(
                svg,
                r#"<g class="field-group" data-field-name="{}" data-field-type="{}"><text class="table-field" x="10" y="{}">{}</text></g>"#,
                escape_xml(&row.name),
                escape_xml(&row.typ),
                row.baseline,
                escape_xml(&row.label)
            );
        }
        let _ = writeln!(svg, "</g>");

        if node.hidden_fields > 0 {
            let baseline = node
                .rows
                .last()
                .map_or(metrics.field_baseline(0), |r| r.baseline + metrics.field_row_height);
            let plural = if node.hidden_fields == 1 { "" } else { "s" };
            let _ = writeln!(
                svg,
                r##"<text class="table-field" x="10" y="{}" fill="#666" font-style="italic">... {} more field{}</text>"##,
                baseline, node.hidden_fields, plural
            );
        }

        // 4. Resize handles
        for (kind, pos) in &node.handles {
            let _ = writeln!(
                svg,
                r#"<rect class="resize-handle resize-{}" x="{}" y="{}" width="{}" height="{}" data-resize-type="{}" />"#,
                kind.as_str(),
                pos.x,
                pos.y,
                handle,
                handle,
                kind.as_str()
            );
        }

        let _ = writeln!(svg, "</g>");
        svg
    }

    /// One connector as a `<g>` element.
    pub fn connector_fragment(&self, node: &ConnectorNode) -> String {
        let mut markers = String::new();
        if node.marker_start {
            markers.push_str(r#" marker-start="url(#arrowhead-start)""#);
        }
        if node.marker_end {
            markers.push_str(r#" marker-end="url(#arrowhead)""#);
        }

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<g class="relationship-group" data-uuid="{}" data-name="{}"><path class="relationship-line" d="{}"{} /></g>"#,
            escape_xml(&node.uuid),
            escape_xml(&node.name),
            node.path,
            markers
        );
        svg
    }

    pub fn drag_line_fragment(&self, line: &DragLine) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<line class="fk-drag-line" x1="{}" y1="{}" x2="{}" y2="{}" />"#,
            line.from.x, line.from.y, line.to.x, line.to.y
        );
        svg
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
