//! Builds the normalized [`Model`] from a [`RawModel`].

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::geometry::{Axis, Point, Rect, Side};
use crate::model::{
    ArrowStyle, ConnectInfo, ConnectorKind, ConnectorStyle, DiagramInfo, DisplayObject,
    LayoutRect, LayoutSource, Model, Relationship, RelationshipIndex,
};
use crate::raw::{
    self, ARROW_COMMON, CHILD_OBJECT_UUIDS, CONNECTOR_COMMON, LINE_COMMON, ObjectType,
    PAGES_SIZE, PAPER_SIZE, REF_UUID, RawArrow, RawConnector, RawLayoutEntry, RawLine, RawModel,
    Size, TABLE_COMMON,
};
use crate::schema::Table;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No MVDiagram found in the model")]
    NoDiagram,
}

pub struct ModelParser<'a> {
    config: &'a EditorConfig,
}

impl<'a> ModelParser<'a> {
    pub fn new(config: &'a EditorConfig) -> Self {
        Self { config }
    }

    /// Parse the first diagram root in document order.
    pub fn parse(&self, doc: &RawModel) -> Result<Model, ParseError> {
        let (diagram_uuid, diagram) = doc
            .entries()
            .find(|(_, fragments)| raw::object_type(fragments) == Some(ObjectType::Diagram))
            .ok_or(ParseError::NoDiagram)?;

        let paper_size = member_as::<Size>(diagram, PAPER_SIZE).unwrap_or(self.config.paper_size);
        let pages_size = member_as::<Size>(diagram, PAGES_SIZE)
            .map(|pages| self.config.clamp_pages(pages))
            .unwrap_or(self.config.pages_size);
        let children = child_uuids(diagram);
        debug!(diagram = diagram_uuid, children = children.len(), "found diagram root");

        let layout_source = locate_layout(diagram, self.config.layout_key.as_deref());
        let layout = read_layout(diagram, &layout_source);

        let mut model = Model {
            diagram: DiagramInfo {
                uuid: diagram_uuid.to_string(),
                name: raw::object_name(diagram).unwrap_or_default().to_string(),
                paper_size,
                pages_size,
                layout_source,
                passthrough_children: vec![],
            },
            tables: IndexMap::new(),
            display_objects: IndexMap::new(),
            layout,
            relationships: IndexMap::new(),
            table_relationships: RelationshipIndex::default(),
        };

        for child in &children {
            let Some(fragments) = doc.fragments(child) else {
                warn!(uuid = %child, "child object not found, keeping reference");
                model.diagram.passthrough_children.push(child.clone());
                continue;
            };

            match raw::object_type(fragments) {
                Some(t) if t.is_table_display() => {
                    self.read_table(doc, &mut model, child, fragments)
                }
                Some(t) if t.is_relation_display() => {
                    let rel = read_relationship(child, fragments);
                    model.insert_relationship(rel);
                }
                _ => model.diagram.passthrough_children.push(child.clone()),
            }
        }

        model.table_relationships = RelationshipIndex::rebuild(&model.relationships);

        for uuid in model.display_objects.keys() {
            if !model.layout.contains_key(uuid) {
                warn!(uuid = %uuid, "display object has no layout and will not be drawn");
            }
        }

        info!(
            tables = model.tables.len(),
            relationships = model.relationships.len(),
            layouts = model.layout.len(),
            "parsed diagram"
        );
        Ok(model)
    }

    fn read_table(
        &self,
        doc: &RawModel,
        model: &mut Model,
        display_uuid: &str,
        fragments: &[Value],
    ) {
        let display_name = raw::object_name(fragments).unwrap_or_default();
        let Some(schema_uuid) = raw::ref_uuid(fragments) else {
            warn!(uuid = display_uuid, "table display has no RefUUID, skipping");
            model.diagram.passthrough_children.push(display_uuid.to_string());
            return;
        };

        model.display_objects.insert(
            display_uuid.to_string(),
            DisplayObject::table(display_uuid, display_name, schema_uuid),
        );

        let schema = doc.fragments(schema_uuid);
        let common = schema
            .and_then(|f| raw::find_member(f, TABLE_COMMON))
            .and_then(Value::as_object);
        let Some(common) = common else {
            warn!(
                uuid = display_uuid,
                schema = schema_uuid,
                "table schema not found, skipping"
            );
            return;
        };

        let name = schema
            .and_then(raw::object_name)
            .filter(|n| !n.is_empty())
            .unwrap_or(display_name);

        model.tables.insert(
            display_uuid.to_string(),
            Table::from_common(name, schema_uuid, display_uuid, common),
        );
    }
}

fn member_as<T: DeserializeOwned>(fragments: &[Value], key: &str) -> Option<T> {
    raw::find_member(fragments, key).and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn child_uuids(diagram: &[Value]) -> Vec<String> {
    raw::meta_fragment(diagram)
        .and_then(|meta| meta.get(CHILD_OBJECT_UUIDS))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn looks_like_layout(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .is_some_and(|first| {
            first.get(REF_UUID).is_some_and(raw::is_truthy)
                && first.get("Rect").is_some_and(raw::is_truthy)
        })
}

/// Find the layout array among the diagram's fragments.
///
/// The format does not fix the array's key. A configured key wins when present;
/// otherwise the first array whose leading element has `RefUUID` and `Rect`.
pub fn locate_layout(diagram: &[Value], pinned: Option<&str>) -> LayoutSource {
    if let Some(key) = pinned {
        for (i, fragment) in diagram.iter().enumerate() {
            if fragment.get(key).is_some_and(Value::is_array) {
                return LayoutSource::Pinned {
                    fragment: i,
                    key: key.to_string(),
                };
            }
        }
        debug!(key, "pinned layout key not present, falling back to discovery");
    }

    for (i, fragment) in diagram.iter().enumerate() {
        let Some(obj) = fragment.as_object() else {
            continue;
        };
        if let Some((key, _)) = obj.iter().find(|(_, v)| looks_like_layout(v)) {
            return LayoutSource::Discovered {
                fragment: i,
                key: key.clone(),
            };
        }
    }

    LayoutSource::Absent
}

fn read_layout(diagram: &[Value], source: &LayoutSource) -> IndexMap<String, LayoutRect> {
    let (fragment, key) = match source {
        LayoutSource::Pinned { fragment, key } | LayoutSource::Discovered { fragment, key } => {
            (*fragment, key)
        }
        LayoutSource::Absent => return IndexMap::new(),
    };

    let Some(items) = diagram
        .get(fragment)
        .and_then(|f| f.get(key))
        .and_then(Value::as_array)
    else {
        return IndexMap::new();
    };

    let mut layout = IndexMap::new();
    for item in items {
        match serde_json::from_value::<RawLayoutEntry>(item.clone()) {
            Ok(entry) if !entry.ref_uuid.is_empty() => {
                let r = entry.rect;
                layout.insert(
                    entry.ref_uuid,
                    LayoutRect::new(&entry.name, Rect::new(r.x, r.y, r.width, r.height)),
                );
            }
            _ => debug!("skipping malformed layout entry"),
        }
    }
    layout
}

fn read_relationship(uuid: &str, fragments: &[Value]) -> Relationship {
    let line: RawLine = member_as(fragments, LINE_COMMON).unwrap_or_default();
    let connector: RawConnector = member_as(fragments, CONNECTOR_COMMON).unwrap_or_default();
    let arrow: RawArrow = member_as(fragments, ARROW_COMMON).unwrap_or_default();

    let defaults = ArrowStyle::default();
    Relationship {
        uuid: uuid.to_string(),
        ref_uuid: raw::ref_uuid(fragments).map(str::to_string),
        name: raw::object_name(fragments).unwrap_or_default().to_string(),
        connect_infos: line
            .connect_infos
            .iter()
            .map(|c| ConnectInfo {
                ref_uuid: c.ref_uuid.clone(),
                side: Side::from_index(c.index),
            })
            .collect(),
        style: ConnectorStyle {
            kind: connector
                .kind
                .as_deref()
                .map_or(ConnectorKind::default(), ConnectorKind::from_str),
            start_axis: connector
                .start_axis
                .as_deref()
                .map_or(Axis::default(), Axis::from_str),
        },
        arrows: ArrowStyle {
            begin: arrow.begin_style.unwrap_or(defaults.begin),
            end: arrow.end_style.unwrap_or(defaults.end),
        },
        vertices: line.vertices.iter().map(|v| Point::new(v.x, v.y)).collect(),
        geometry_changed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    fn parse(value: Value) -> Result<Model, ParseError> {
        let raw = RawModel::from_value(value).unwrap();
        ModelParser::new(&EditorConfig::default()).parse(&raw)
    }

    #[test]
    fn test_parse_users_orders() {
        let model = parse(fixtures::users_orders()).unwrap();
        assert_eq!(model.diagram.uuid, fixtures::DIAGRAM);
        assert_eq!(model.diagram.pages_size, Size::new(2.0, 2.0));
        assert_eq!(model.tables.len(), 2);

        let orders = &model.tables[fixtures::ORDERS_DISPLAY];
        assert_eq!(orders.name, "Orders");
        assert_eq!(orders.uuid, fixtures::ORDERS_SCHEMA);
        assert_eq!(orders.fields.len(), 2);
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].reference_table, "Users");

        let rel = &model.relationships[fixtures::RELATION_DISPLAY];
        assert_eq!(rel.ref_uuid.as_deref(), Some(fixtures::RELATION_SCHEMA));
        assert_eq!(rel.source().unwrap().side, Some(Side::Left));
        assert!(rel.arrows.has_end_marker());
        assert_eq!(
            model.table_relationships.get(fixtures::USERS_DISPLAY),
            [fixtures::RELATION_DISPLAY.to_string()]
        );
        assert_eq!(model.diagram.passthrough_children, vec![fixtures::NOTE.to_string()]);
    }

    #[test]
    fn test_layout_key_is_discovered() {
        let model = parse(fixtures::users_orders()).unwrap();
        assert_eq!(
            model.diagram.layout_source,
            LayoutSource::Discovered {
                fragment: 3,
                key: "ObjectLayouts".into()
            }
        );
        assert_eq!(model.layout.len(), 4);
        assert_eq!(
            model.rect(fixtures::USERS_DISPLAY),
            Some(Rect::new(50.0, 50.0, 200.0, 100.0))
        );
    }

    #[test]
    fn test_pinned_layout_key_wins() {
        let diagram = vec![
            json!({"_META_": true, "ObjectTypeID": "MVDiagram"}),
            json!({"Decoy": [{"RefUUID": "A", "Rect": {"X": 1}}]}),
            json!({"Real": [{"RefUUID": "A", "Rect": {"X": 2}}]}),
        ];
        assert_eq!(
            locate_layout(&diagram, Some("Real")),
            LayoutSource::Pinned {
                fragment: 2,
                key: "Real".into()
            }
        );
        assert_eq!(
            locate_layout(&diagram, Some("Missing")),
            LayoutSource::Discovered {
                fragment: 1,
                key: "Decoy".into()
            }
        );
        assert_eq!(locate_layout(&diagram[..1], None), LayoutSource::Absent);
    }

    #[test]
    fn test_missing_diagram_fails() {
        let err = parse(json!({"ObjectJsons": {"A": [{"_META_": true, "ObjectTypeID": "TableNormal_PGSQL"}]}}));
        assert!(matches!(err, Err(ParseError::NoDiagram)));
    }

    #[test]
    fn test_missing_schema_skips_table_only() {
        let mut doc = fixtures::users_orders();
        doc["ObjectJsons"]
            .as_object_mut()
            .unwrap()
            .remove(fixtures::USERS_SCHEMA);
        let model = parse(doc).unwrap();
        assert_eq!(model.tables.len(), 1);
        assert!(model.display_objects.contains_key(fixtures::USERS_DISPLAY));
        assert!(model.tables.contains_key(fixtures::ORDERS_DISPLAY));
    }

    #[test]
    fn test_first_diagram_wins() {
        let model = parse(json!({"ObjectJsons": {
            "D1": [{"_META_": true, "ObjectTypeID": "MVDiagram", "ObjectName": "first"}],
            "D2": [{"_META_": true, "ObjectTypeID": "MVDiagram", "ObjectName": "second"}]
        }}))
        .unwrap();
        assert_eq!(model.diagram.name, "first");
        assert_eq!(model.diagram.paper_size, Size::new(850.0, 1100.0));
        assert_eq!(model.diagram.pages_size, Size::new(4.0, 3.0));
    }

    #[test]
    fn test_huge_pages_size_is_clamped() {
        let model = parse(json!({"ObjectJsons": {
            "D": [
                {"_META_": true, "ObjectTypeID": "MVDiagram"},
                {"PagesSize": {"Width": 1e9, "Height": -2}}
            ]
        }}))
        .unwrap();
        assert_eq!(model.diagram.pages_size, Size::new(100.0, 3.0));
    }

    #[test]
    fn test_out_of_range_side_is_kept_as_unknown() {
        let model = parse(json!({"ObjectJsons": {
            "D": [{"_META_": true, "ObjectTypeID": "MVDiagram", "ChildObjectUUIDs": ["R"]}],
            "R": [
                {"_META_": true, "ObjectTypeID": "MVDiagramShape_Relation", "ObjectName": "r"},
                {"LineCommon": {"ConnectInfos": [{"Index": 7, "RefUUID": "A"}]}}
            ]
        }}))
        .unwrap();
        let rel = &model.relationships["R"];
        assert_eq!(rel.connect_infos[0].side, None);
        assert_eq!(rel.style.kind, ConnectorKind::Elbow);
    }
}
