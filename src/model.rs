//! Normalized in-memory model built by the parser and edited by the session.

use indexmap::IndexMap;

use crate::geometry::{Axis, Point, Rect, Side};
use crate::raw::Size;
use crate::schema::Table;

/// What an on-canvas object depicts.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayKind {
    /// `ref_uuid` is the table's schema UUID
    Table { ref_uuid: String },
    Relationship,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayObject {
    pub uuid: String,
    pub name: String,
    pub kind: DisplayKind,
}

impl DisplayObject {
    pub fn table(uuid: &str, name: &str, ref_uuid: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: name.to_string(),
            kind: DisplayKind::Table {
                ref_uuid: ref_uuid.to_string(),
            },
        }
    }

    pub fn relationship(uuid: &str, name: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            name: name.to_string(),
            kind: DisplayKind::Relationship,
        }
    }
}

/// Where an object is drawn. The scene is derived from this, never the reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRect {
    pub name: String,
    pub rect: Rect,
}

impl LayoutRect {
    pub fn new(name: &str, rect: Rect) -> Self {
        Self {
            name: name.to_string(),
            rect,
        }
    }
}

/// One end of a connector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectInfo {
    pub ref_uuid: String,
    /// `None` when the stored index is outside 0..=3
    pub side: Option<Side>,
}

impl ConnectInfo {
    pub fn new(ref_uuid: &str, side: Side) -> Self {
        Self {
            ref_uuid: ref_uuid.to_string(),
            side: Some(side),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorKind {
    #[default]
    Elbow,
    Straight,
}

impl ConnectorKind {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Elbow" => Self::Elbow,
            _ => Self::Straight,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elbow => "Elbow",
            Self::Straight => "Straight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectorStyle {
    pub kind: ConnectorKind,
    pub start_axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowStyle {
    pub begin: String,
    pub end: String,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            begin: "None".to_string(),
            end: "None".to_string(),
        }
    }
}

impl ArrowStyle {
    pub fn has_begin_marker(&self) -> bool {
        !self.begin.is_empty() && self.begin != "None"
    }

    pub fn has_end_marker(&self) -> bool {
        !self.end.is_empty() && self.end != "None"
    }
}

/// A connector between two display objects.
///
/// Keyed by its display UUID; `ref_uuid` is the relationship's schema
/// identity when one is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub uuid: String,
    pub ref_uuid: Option<String>,
    pub name: String,
    pub connect_infos: Vec<ConnectInfo>,
    pub style: ConnectorStyle,
    pub arrows: ArrowStyle,
    /// Relative to the relationship's own LayoutRect
    pub vertices: Vec<Point>,
    /// Set when the router has recomputed this connector's geometry
    pub geometry_changed: bool,
}

impl Relationship {
    pub fn source(&self) -> Option<&ConnectInfo> {
        self.connect_infos.first()
    }

    pub fn target(&self) -> Option<&ConnectInfo> {
        self.connect_infos.get(1)
    }
}

/// Diagram-level settings and where the layout array lives in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramInfo {
    pub uuid: String,
    pub name: String,
    pub paper_size: Size,
    pub pages_size: Size,
    pub layout_source: LayoutSource,
    /// Children the editor does not model, written back as-is
    pub passthrough_children: Vec<String>,
}

impl DiagramInfo {
    /// Full canvas size: one paper per page.
    pub fn canvas_size(&self) -> Size {
        Size::new(
            self.paper_size.width * self.pages_size.width,
            self.paper_size.height * self.pages_size.height,
        )
    }
}

/// How the layout array was located. The format does not name the array's key,
/// so it is either pinned by configuration or found by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    /// Key given by configuration, found in fragment `fragment`
    Pinned { fragment: usize, key: String },
    /// First array whose leading element has `RefUUID` and `Rect`
    Discovered { fragment: usize, key: String },
    /// No layout array in the file yet
    Absent,
}

/// Display UUID -> relationships touching it. A cache over the relationship
/// set, rebuilt or appended whenever relationships change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipIndex {
    by_table: IndexMap<String, Vec<String>>,
}

impl RelationshipIndex {
    pub fn rebuild(relationships: &IndexMap<String, Relationship>) -> Self {
        let mut index = Self::default();
        for rel in relationships.values() {
            index.add(rel);
        }
        index
    }

    pub fn add(&mut self, rel: &Relationship) {
        for info in &rel.connect_infos {
            let list = self.by_table.entry(info.ref_uuid.clone()).or_default();
            if !list.contains(&rel.uuid) {
                list.push(rel.uuid.clone());
            }
        }
    }

    pub fn get(&self, display_uuid: &str) -> &[String] {
        self.by_table
            .get(display_uuid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Every entity map for one editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub diagram: DiagramInfo,
    /// Keyed by display UUID
    pub tables: IndexMap<String, Table>,
    pub display_objects: IndexMap<String, DisplayObject>,
    pub layout: IndexMap<String, LayoutRect>,
    pub relationships: IndexMap<String, Relationship>,
    pub table_relationships: RelationshipIndex,
}

impl Model {
    /// A model with no objects and a fresh, not yet persisted diagram root.
    pub fn empty(diagram_uuid: &str, paper_size: Size, pages_size: Size) -> Self {
        Self {
            diagram: DiagramInfo {
                uuid: diagram_uuid.to_string(),
                name: "Diagram".to_string(),
                paper_size,
                pages_size,
                layout_source: LayoutSource::Absent,
                passthrough_children: vec![],
            },
            tables: IndexMap::new(),
            display_objects: IndexMap::new(),
            layout: IndexMap::new(),
            relationships: IndexMap::new(),
            table_relationships: RelationshipIndex::default(),
        }
    }

    pub fn rect(&self, uuid: &str) -> Option<Rect> {
        self.layout.get(uuid).map(|l| l.rect)
    }

    /// Register a relationship and its display object, keeping the index in step.
    pub fn insert_relationship(&mut self, rel: Relationship) {
        self.display_objects.insert(
            rel.uuid.clone(),
            DisplayObject::relationship(&rel.uuid, &rel.name),
        );
        self.table_relationships.add(&rel);
        self.relationships.insert(rel.uuid.clone(), rel);
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.values().map(|t| t.foreign_keys.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(uuid: &str, a: &str, b: &str) -> Relationship {
        Relationship {
            uuid: uuid.to_string(),
            ref_uuid: None,
            name: format!("fk_{}", uuid),
            connect_infos: vec![ConnectInfo::new(a, Side::Right), ConnectInfo::new(b, Side::Left)],
            style: ConnectorStyle::default(),
            arrows: ArrowStyle::default(),
            vertices: vec![],
            geometry_changed: false,
        }
    }

    #[test]
    fn test_index_rebuild() {
        let mut rels = IndexMap::new();
        rels.insert("R1".to_string(), rel("R1", "A", "B"));
        rels.insert("R2".to_string(), rel("R2", "B", "C"));
        let index = RelationshipIndex::rebuild(&rels);
        assert_eq!(index.get("A"), ["R1".to_string()]);
        assert_eq!(index.get("B"), ["R1".to_string(), "R2".to_string()]);
        assert!(index.get("Z").is_empty());
    }

    #[test]
    fn test_index_add_is_idempotent() {
        let r = rel("R1", "A", "A");
        let mut index = RelationshipIndex::default();
        index.add(&r);
        index.add(&r);
        assert_eq!(index.get("A").len(), 1);
    }

    #[test]
    fn test_insert_relationship_registers_display_object() {
        let mut model = Model::empty("D", Size::new(850.0, 1100.0), Size::new(4.0, 3.0));
        model.insert_relationship(rel("R1", "A", "B"));
        assert!(matches!(
            model.display_objects["R1"].kind,
            DisplayKind::Relationship
        ));
        assert_eq!(model.table_relationships.get("B"), ["R1".to_string()]);
    }

    #[test]
    fn test_arrow_markers() {
        let arrows = ArrowStyle {
            begin: "None".into(),
            end: "Arrow".into(),
        };
        assert!(!arrows.has_begin_marker());
        assert!(arrows.has_end_marker());
    }

    #[test]
    fn test_canvas_size() {
        let model = Model::empty("D", Size::new(850.0, 1100.0), Size::new(4.0, 3.0));
        assert_eq!(model.diagram.canvas_size(), Size::new(3400.0, 3300.0));
    }
}
