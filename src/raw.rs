//! The persisted `.nmodel` object graph.
//!
//! A document is a JSON object whose `ObjectJsons` member maps object UUIDs to
//! arrays of fragments. Fragments carry no explicit kind; they are recognized by
//! the keys they contain. Everything here is a thin, loss-free view over
//! `serde_json::Value` so that unknown keys survive a load/save cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OBJECT_JSONS: &str = "ObjectJsons";
pub const META: &str = "_META_";
pub const OBJECT_TYPE_ID: &str = "ObjectTypeID";
pub const OBJECT_NAME: &str = "ObjectName";
pub const CHILD_OBJECT_UUIDS: &str = "ChildObjectUUIDs";
pub const REF_UUID: &str = "RefUUID";
pub const TABLE_COMMON: &str = "TableCommon";
pub const LINE_COMMON: &str = "LineCommon";
pub const CONNECTOR_COMMON: &str = "ConnectorCommon";
pub const ARROW_COMMON: &str = "ArrowCommon";
pub const PAPER_SIZE: &str = "PaperSize";
pub const PAGES_SIZE: &str = "PagesSize";

/// Sub-collections of `TableCommon` the editor never interprets.
pub const TABLE_PASSTHROUGH_KEYS: [&str; 6] =
    ["Indexes", "Triggers", "Checks", "Uniques", "Excludes", "Rules"];

/// Object kinds named by a meta fragment's `ObjectTypeID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectType {
    Diagram,
    TableSchema,
    TableDisplay,
    TableShape,
    RelationShape,
    RelationDisplay,
    Other(String),
}

impl ObjectType {
    pub fn from_str(s: &str) -> Self {
        match s {
            "MVDiagram" => Self::Diagram,
            "TableNormal_PGSQL" => Self::TableSchema,
            "MVDiagramModelObject_Table" => Self::TableDisplay,
            "MVDiagramShape_Table" => Self::TableShape,
            "MVDiagramShape_Relation" => Self::RelationShape,
            "MVDiagramModelObject_Relation" => Self::RelationDisplay,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Diagram => "MVDiagram",
            Self::TableSchema => "TableNormal_PGSQL",
            Self::TableDisplay => "MVDiagramModelObject_Table",
            Self::TableShape => "MVDiagramShape_Table",
            Self::RelationShape => "MVDiagramShape_Relation",
            Self::RelationDisplay => "MVDiagramModelObject_Relation",
            Self::Other(s) => s,
        }
    }

    pub fn is_table_display(&self) -> bool {
        matches!(self, Self::TableDisplay | Self::TableShape)
    }

    pub fn is_relation_display(&self) -> bool {
        matches!(self, Self::RelationDisplay | Self::RelationShape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRect {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawVertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawConnectInfo {
    pub index: i64,
    #[serde(rename = "RefUUID")]
    pub ref_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLine {
    #[serde(default)]
    pub vertices: Vec<RawVertex>,
    #[serde(default)]
    pub connect_infos: Vec<RawConnectInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawConnector {
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub start_axis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawArrow {
    #[serde(default)]
    pub begin_style: Option<String>,
    #[serde(default)]
    pub end_style: Option<String>,
}

/// One element of a diagram's layout array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLayoutEntry {
    #[serde(rename = "RefUUID")]
    pub ref_uuid: String,
    #[serde(default)]
    pub name: String,
    pub rect: RawRect,
}

/// The whole document. The root object is kept verbatim so top-level keys
/// other than `ObjectJsons` are written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawModel {
    root: Map<String, Value>,
}

impl Default for RawModel {
    fn default() -> Self {
        let mut root = Map::new();
        root.insert(OBJECT_JSONS.to_string(), Value::Object(Map::new()));
        Self { root }
    }
}

impl RawModel {
    /// Wrap a parsed document. Returns `None` unless it is an object with an
    /// `ObjectJsons` object member.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => {
                if root.get(OBJECT_JSONS).is_some_and(Value::is_object) {
                    Some(Self { root })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn to_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }

    fn objects(&self) -> Option<&Map<String, Value>> {
        self.root.get(OBJECT_JSONS).and_then(Value::as_object)
    }

    fn objects_mut(&mut self) -> &mut Map<String, Value> {
        let entry = self
            .root
            .entry(OBJECT_JSONS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("ObjectJsons was just made an object"),
        }
    }

    pub fn len(&self) -> usize {
        self.objects().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.objects().is_some_and(|o| o.contains_key(uuid))
    }

    /// Every `(uuid, fragments)` pair whose value is an array, in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.objects()
            .into_iter()
            .flat_map(|o| o.iter())
            .filter_map(|(k, v)| v.as_array().map(|a| (k.as_str(), a.as_slice())))
    }

    pub fn fragments(&self, uuid: &str) -> Option<&[Value]> {
        self.objects()?.get(uuid)?.as_array().map(Vec::as_slice)
    }

    pub fn fragments_mut(&mut self, uuid: &str) -> Option<&mut Vec<Value>> {
        self.objects_mut().get_mut(uuid)?.as_array_mut()
    }

    pub fn insert(&mut self, uuid: &str, fragments: Vec<Value>) {
        self.objects_mut()
            .insert(uuid.to_string(), Value::Array(fragments));
    }
}

/// The meta fragment of an object: truthy `_META_` marker.
pub fn meta_fragment(fragments: &[Value]) -> Option<&Map<String, Value>> {
    fragments
        .iter()
        .filter_map(Value::as_object)
        .find(|o| o.get(META).is_some_and(is_truthy))
}

pub fn meta_fragment_mut(fragments: &mut [Value]) -> Option<&mut Map<String, Value>> {
    fragments
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|o| o.get(META).is_some_and(is_truthy))
}

pub fn object_type(fragments: &[Value]) -> Option<ObjectType> {
    meta_fragment(fragments)?
        .get(OBJECT_TYPE_ID)
        .and_then(Value::as_str)
        .map(ObjectType::from_str)
}

pub fn object_name(fragments: &[Value]) -> Option<&str> {
    meta_fragment(fragments)?.get(OBJECT_NAME).and_then(Value::as_str)
}

/// First fragment carrying `key`, returning that key's value.
pub fn find_member<'a>(fragments: &'a [Value], key: &str) -> Option<&'a Value> {
    fragments
        .iter()
        .filter_map(Value::as_object)
        .find_map(|o| o.get(key))
}

pub fn find_member_mut<'a>(fragments: &'a mut [Value], key: &str) -> Option<&'a mut Value> {
    fragments
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find_map(|o| o.get_mut(key))
}

/// `RefUUID` from the first fragment that carries a non-empty string one.
pub fn ref_uuid(fragments: &[Value]) -> Option<&str> {
    fragments
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|o| o.get(REF_UUID).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// JavaScript-style truthiness for marker fields.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whole numbers are written without a fractional part, matching what the
/// files contain.
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

pub fn size_value(size: Size) -> Value {
    let mut map = Map::new();
    map.insert("Width".to_string(), number(size.width));
    map.insert("Height".to_string(), number(size.height));
    Value::Object(map)
}

pub fn rect_value(rect: RawRect) -> Value {
    let mut map = Map::new();
    map.insert("X".to_string(), number(rect.x));
    map.insert("Y".to_string(), number(rect.y));
    map.insert("Width".to_string(), number(rect.width));
    map.insert("Height".to_string(), number(rect.height));
    Value::Object(map)
}

pub fn vertex_value(vertex: RawVertex) -> Value {
    let mut map = Map::new();
    map.insert("X".to_string(), number(vertex.x));
    map.insert("Y".to_string(), number(vertex.y));
    Value::Object(map)
}

/// Meta fragment for a newly synthesized object.
pub fn new_meta(object_type: &ObjectType, name: &str) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert(META.to_string(), Value::Bool(true));
    meta.insert(
        OBJECT_TYPE_ID.to_string(),
        Value::String(object_type.as_str().to_string()),
    );
    meta.insert(OBJECT_NAME.to_string(), Value::String(name.to_string()));
    meta
}
