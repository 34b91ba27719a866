//! Retained-mode scene: one node per visible table box and connector.
//!
//! The scene is a projection of the model's layout rectangles. Gestures may
//! patch individual nodes for responsiveness, but a full render always
//! starts from the model. Mutations are recorded as [`SceneChange`]s so a
//! host can apply them to a real drawing surface.

use indexmap::IndexMap;

use crate::geometry::{Point, Rect};
use crate::layout::{Router, relationship_path};
use crate::measure::TextMetrics;
use crate::model::{Model, Relationship};
use crate::raw::Size;

/// The eight resize zones around a table box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
        Self::Nw,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::Ne => "ne",
            Self::E => "e",
            Self::Se => "se",
            Self::S => "s",
            Self::Sw => "sw",
            Self::W => "w",
            Self::Nw => "nw",
        }
    }

    /// Top-left of the handle square, relative to the box origin.
    pub fn position(self, width: f64, height: f64, size: f64) -> Point {
        let half = size / 2.0;
        let (fx, fy) = match self {
            Self::N => (0.5, 0.0),
            Self::Ne => (1.0, 0.0),
            Self::E => (1.0, 0.5),
            Self::Se => (1.0, 1.0),
            Self::S => (0.5, 1.0),
            Self::Sw => (0.0, 1.0),
            Self::W => (0.0, 0.5),
            Self::Nw => (0.0, 0.0),
        };
        Point::new(width * fx - half, height * fy - half)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub name: String,
    pub typ: String,
    pub label: String,
    pub baseline: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableNode {
    pub uuid: String,
    pub name: String,
    /// Translation of the whole box
    pub transform: Point,
    pub width: f64,
    pub height: f64,
    pub header_width: f64,
    pub clip: Size,
    pub handles: Vec<(ResizeHandle, Point)>,
    pub rows: Vec<FieldRow>,
    /// Fields that did not fit
    pub hidden_fields: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorNode {
    pub uuid: String,
    pub name: String,
    pub path: String,
    pub marker_start: bool,
    pub marker_end: bool,
}

/// Transient line drawn while authoring a foreign key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragLine {
    pub from: Point,
    pub to: Point,
}

/// A node the host should redraw. Each pending change is recorded once, so
/// the log stays bounded by the number of nodes however long a gesture runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneChange {
    /// Every node was dropped; earlier pending changes are discarded
    Cleared,
    TableRendered(String),
    TableMoved(String),
    TableReshaped(String),
    ConnectorRendered(String),
    ConnectorPath(String),
    DragLine,
}

impl SceneChange {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cleared => "cleared",
            Self::TableRendered(_) => "table-rendered",
            Self::TableMoved(_) => "table-moved",
            Self::TableReshaped(_) => "table-reshaped",
            Self::ConnectorRendered(_) => "connector-rendered",
            Self::ConnectorPath(_) => "connector-path",
            Self::DragLine => "drag-line",
        }
    }

    /// The node the change applies to.
    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::Cleared | Self::DragLine => None,
            Self::TableRendered(uuid)
            | Self::TableMoved(uuid)
            | Self::TableReshaped(uuid)
            | Self::ConnectorRendered(uuid)
            | Self::ConnectorPath(uuid) => Some(uuid),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub tables: IndexMap<String, TableNode>,
    pub connectors: IndexMap<String, ConnectorNode>,
    pub drag_line: Option<DragLine>,
    pub paper_size: Size,
    pub pages_size: Size,
    metrics: TextMetrics,
    changes: Vec<SceneChange>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(TextMetrics::default())
    }
}

impl Scene {
    pub fn new(metrics: TextMetrics) -> Self {
        Self {
            tables: IndexMap::new(),
            connectors: IndexMap::new(),
            drag_line: None,
            paper_size: Size::default(),
            pages_size: Size::default(),
            metrics,
            changes: Vec::new(),
        }
    }

    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(
            self.paper_size.width * self.pages_size.width,
            self.paper_size.height * self.pages_size.height,
        )
    }

    /// Discard every node and rebuild from the model: tables first, then
    /// connectors, each in diagram order. Objects without layout are skipped.
    pub fn rebuild(&mut self, model: &Model, router: &Router) {
        self.tables.clear();
        self.connectors.clear();
        self.drag_line = None;
        self.paper_size = model.diagram.paper_size;
        self.pages_size = model.diagram.pages_size;
        self.record(SceneChange::Cleared);

        for uuid in model.tables.keys() {
            self.render_table(model, uuid);
        }
        for rel in model.relationships.values() {
            self.render_connector(model, rel, router);
        }
    }

    /// Fully (re)build one table node from its layout rectangle.
    pub fn render_table(&mut self, model: &Model, uuid: &str) -> bool {
        let (Some(table), Some(rect)) = (model.tables.get(uuid), model.rect(uuid)) else {
            return false;
        };

        let m = &self.metrics;
        let visible = m.visible_fields(rect.height).min(table.fields.len());
        let rows = table.fields[..visible]
            .iter()
            .enumerate()
            .map(|(i, f)| FieldRow {
                name: f.name.clone(),
                typ: f.typ.clone(),
                label: m.truncate(&format!("{}: {}", f.name, f.typ), rect.width),
                baseline: m.field_baseline(i),
            })
            .collect();

        let node = TableNode {
            uuid: uuid.to_string(),
            name: table.name.clone(),
            transform: Point::new(rect.x, rect.y),
            width: rect.width,
            height: rect.height,
            header_width: rect.width,
            clip: Size::new(m.clip_width(rect.width), rect.height),
            handles: handle_positions(rect.width, rect.height, m.handle_size),
            rows,
            hidden_fields: table.fields.len() - visible,
        };

        self.tables.insert(uuid.to_string(), node);
        self.record(SceneChange::TableRendered(uuid.to_string()));
        true
    }

    pub fn set_transform(&mut self, uuid: &str, origin: Point) {
        if let Some(node) = self.tables.get_mut(uuid) {
            node.transform = origin;
            self.record(SceneChange::TableMoved(uuid.to_string()));
        }
    }

    /// Patch an existing node to a new rectangle without re-laying out its
    /// field rows: header, clip region, handles and (if moved) transform.
    pub fn reshape(&mut self, uuid: &str, rect: Rect) {
        let handle_size = self.metrics.handle_size;
        let clip_width = self.metrics.clip_width(rect.width);
        if let Some(node) = self.tables.get_mut(uuid) {
            node.width = rect.width;
            node.height = rect.height;
            node.header_width = rect.width;
            node.clip = Size::new(clip_width, rect.height);
            node.handles = handle_positions(rect.width, rect.height, handle_size);
            node.transform = Point::new(rect.x, rect.y);
            self.record(SceneChange::TableReshaped(uuid.to_string()));
        }
    }

    /// Draw a relationship; skipped when it has no drawable geometry.
    pub fn render_connector(&mut self, model: &Model, rel: &Relationship, router: &Router) -> bool {
        let Some(path) = relationship_path(model, rel, router) else {
            return false;
        };
        self.insert_connector(rel, path);
        true
    }

    /// Draw a relationship whose path is already known.
    pub fn insert_connector(&mut self, rel: &Relationship, path: String) {
        self.connectors.insert(
            rel.uuid.clone(),
            ConnectorNode {
                uuid: rel.uuid.clone(),
                name: rel.name.clone(),
                path,
                marker_start: rel.arrows.has_begin_marker(),
                marker_end: rel.arrows.has_end_marker(),
            },
        );
        self.record(SceneChange::ConnectorRendered(rel.uuid.clone()));
    }

    pub fn set_connector_path(&mut self, uuid: &str, path: String) {
        if let Some(node) = self.connectors.get_mut(uuid) {
            node.path = path;
            self.record(SceneChange::ConnectorPath(uuid.to_string()));
        }
    }

    /// Current on-canvas origin of a table box, if it is drawn.
    pub fn live_position(&self, uuid: &str) -> Option<Point> {
        self.tables.get(uuid).map(|n| n.transform)
    }

    pub fn set_drag_line(&mut self, line: Option<DragLine>) {
        if self.drag_line != line {
            self.drag_line = line;
            self.record(SceneChange::DragLine);
        }
    }

    fn record(&mut self, change: SceneChange) {
        if change == SceneChange::Cleared {
            self.changes.clear();
        }
        if !self.changes.contains(&change) {
            self.changes.push(change);
        }
    }

    /// Drain the changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}

fn handle_positions(width: f64, height: f64, size: f64) -> Vec<(ResizeHandle, Point)> {
    ResizeHandle::ALL
        .iter()
        .map(|h| (*h, h.position(width, height, size)))
        .collect()
}
