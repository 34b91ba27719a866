//! Projects the normalized [`Model`] back into a [`RawModel`].
//!
//! Existing objects are updated in place so every member the editor does not
//! interpret survives; objects the session created are synthesized.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::EditorConfig;
use crate::model::{LayoutSource, Model, Relationship};
use crate::raw::{
    self, ARROW_COMMON, CHILD_OBJECT_UUIDS, CONNECTOR_COMMON, LINE_COMMON, ObjectType,
    PAGES_SIZE, PAPER_SIZE, REF_UUID, RawModel, RawRect, RawVertex, TABLE_COMMON,
    TABLE_PASSTHROUGH_KEYS,
};
use crate::scene::Scene;
use crate::schema::Table;

pub struct ModelSerializer<'a> {
    config: &'a EditorConfig,
}

impl<'a> ModelSerializer<'a> {
    pub fn new(config: &'a EditorConfig) -> Self {
        Self { config }
    }

    /// Merge `model` into `doc`. Positions are read from `scene` when the
    /// table is drawn there, falling back to the stored layout.
    ///
    /// Returns where the layout array now lives.
    pub fn write(
        &self,
        model: &Model,
        scene: Option<&Scene>,
        doc: &mut RawModel,
    ) -> LayoutSource {
        let diagram_uuid = model.diagram.uuid.as_str();
        if !doc.contains(diagram_uuid) {
            debug!(uuid = diagram_uuid, "creating diagram root");
            let mut meta = raw::new_meta(&ObjectType::Diagram, &model.diagram.name);
            meta.insert(CHILD_OBJECT_UUIDS.to_string(), Value::Array(vec![]));
            doc.insert(diagram_uuid, vec![Value::Object(meta)]);
        }

        let mut layout_source = LayoutSource::Absent;
        if let Some(diagram) = doc.fragments_mut(diagram_uuid) {
            stamp_member(diagram, PAPER_SIZE, raw::size_value(model.diagram.paper_size));
            stamp_member(diagram, PAGES_SIZE, raw::size_value(model.diagram.pages_size));
            layout_source = self.write_layout(model, scene, diagram);
            write_children(model, diagram);
        }

        for table in model.tables.values() {
            write_table(table, doc);
        }
        for rel in model.relationships.values() {
            write_relationship(rel, doc);
        }

        info!(
            objects = doc.len(),
            tables = model.tables.len(),
            foreign_keys = model.foreign_key_count(),
            "serialized model"
        );
        layout_source
    }

    fn write_layout(
        &self,
        model: &Model,
        scene: Option<&Scene>,
        diagram: &mut Vec<Value>,
    ) -> LayoutSource {
        let source = match &model.diagram.layout_source {
            LayoutSource::Pinned { fragment, key } | LayoutSource::Discovered { fragment, key }
                if diagram
                    .get(*fragment)
                    .and_then(|f| f.get(key))
                    .is_some_and(Value::is_array) =>
            {
                model.diagram.layout_source.clone()
            }
            _ => {
                let key = self
                    .config
                    .layout_key
                    .clone()
                    .unwrap_or_else(|| self.config.default_layout_key.clone());
                let mut fragment = Map::new();
                fragment.insert(key.clone(), Value::Array(vec![]));
                diagram.push(Value::Object(fragment));
                debug!(key = %key, "creating layout array");
                LayoutSource::Pinned {
                    fragment: diagram.len() - 1,
                    key,
                }
            }
        };

        let (index, key) = match &source {
            LayoutSource::Pinned { fragment, key } | LayoutSource::Discovered { fragment, key } => {
                (*fragment, key.as_str())
            }
            LayoutSource::Absent => return source,
        };
        let Some(slot) = diagram.get_mut(index).and_then(|f| f.get_mut(key)) else {
            return source;
        };

        // Entries are rebuilt wholesale; members other than Name and Rect
        // are carried over from the previous entry for the same object.
        let mut previous: IndexMap<String, Map<String, Value>> = IndexMap::new();
        if let Value::Array(items) = slot.take() {
            for item in items {
                if let Value::Object(obj) = item {
                    if let Some(uuid) = obj.get(REF_UUID).and_then(Value::as_str) {
                        previous.insert(uuid.to_string(), obj);
                    }
                }
            }
        }

        let entries = model
            .layout
            .iter()
            .map(|(uuid, layout)| {
                let mut rect = layout.rect;
                if let Some(live) = scene.and_then(|s| s.live_position(uuid)) {
                    rect.x = live.x;
                    rect.y = live.y;
                }
                let mut entry = previous.shift_remove(uuid).unwrap_or_default();
                entry.insert(REF_UUID.to_string(), Value::String(uuid.clone()));
                entry.insert("Name".to_string(), Value::String(layout.name.clone()));
                entry.insert(
                    "Rect".to_string(),
                    raw::rect_value(RawRect {
                        x: rect.x,
                        y: rect.y,
                        width: rect.width,
                        height: rect.height,
                    }),
                );
                Value::Object(entry)
            })
            .collect();
        *slot = Value::Array(entries);

        source
    }
}

/// Overwrite every fragment carrying `key`, or append one if none does.
fn stamp_member(fragments: &mut Vec<Value>, key: &str, value: Value) {
    let mut found = false;
    for obj in fragments.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(slot) = obj.get_mut(key) {
            *slot = value.clone();
            found = true;
        }
    }
    if !found {
        let mut fragment = Map::new();
        fragment.insert(key.to_string(), value);
        fragments.push(Value::Object(fragment));
    }
}

/// Child list: the previous order first, then any object the session added.
fn write_children(model: &Model, diagram: &mut [Value]) {
    let Some(meta) = raw::meta_fragment_mut(diagram) else {
        return;
    };

    let known: IndexSet<&str> = model
        .display_objects
        .keys()
        .chain(model.relationships.keys())
        .chain(model.diagram.passthrough_children.iter())
        .map(String::as_str)
        .collect();

    let mut children: IndexSet<String> = meta
        .get(CHILD_OBJECT_UUIDS)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|uuid| known.contains(uuid))
        .map(str::to_string)
        .collect();
    children.extend(known.iter().map(|s| s.to_string()));

    meta.insert(
        CHILD_OBJECT_UUIDS.to_string(),
        Value::Array(children.into_iter().map(Value::String).collect()),
    );
}

fn write_table(table: &Table, doc: &mut RawModel) {
    if !doc.contains(&table.display_uuid) {
        let meta = raw::new_meta(&ObjectType::TableDisplay, &table.name);
        doc.insert(
            &table.display_uuid,
            vec![Value::Object(meta), single(REF_UUID, Value::String(table.uuid.clone()))],
        );
    }

    let fields = table.fields_json();
    let foreign_keys = table.foreign_keys_json();

    match doc.fragments_mut(&table.uuid) {
        Some(fragments) => match raw::find_member_mut(fragments, TABLE_COMMON) {
            Some(Value::Object(common)) => {
                common.insert("Fields".to_string(), fields);
                common.insert("ForeignKeys".to_string(), foreign_keys);
                for key in TABLE_PASSTHROUGH_KEYS {
                    common
                        .entry(key)
                        .or_insert_with(|| Value::Array(vec![]));
                }
            }
            _ => fragments.push(single(TABLE_COMMON, table_common(fields, foreign_keys))),
        },
        None => {
            debug!(uuid = %table.uuid, name = %table.name, "creating table schema");
            let meta = raw::new_meta(&ObjectType::TableSchema, &table.name);
            doc.insert(
                &table.uuid,
                vec![
                    Value::Object(meta),
                    single(TABLE_COMMON, table_common(fields, foreign_keys)),
                ],
            );
        }
    }
}

fn table_common(fields: Value, foreign_keys: Value) -> Value {
    let mut common = Map::new();
    common.insert("Fields".to_string(), fields);
    common.insert("ForeignKeys".to_string(), foreign_keys);
    for key in TABLE_PASSTHROUGH_KEYS {
        common.insert(key.to_string(), Value::Array(vec![]));
    }
    Value::Object(common)
}

fn write_relationship(rel: &Relationship, doc: &mut RawModel) {
    if let Some(fragments) = doc.fragments_mut(&rel.uuid) {
        if !rel.geometry_changed {
            return;
        }
        match raw::find_member_mut(fragments, LINE_COMMON) {
            Some(Value::Object(line)) => {
                let previous = line.get("ConnectInfos").cloned();
                line.insert("Vertices".to_string(), vertices_value(rel));
                line.insert(
                    "ConnectInfos".to_string(),
                    connect_infos_value(rel, previous.as_ref()),
                );
            }
            _ => fragments.push(single(LINE_COMMON, line_value(rel))),
        }
        return;
    }

    debug!(uuid = %rel.uuid, name = %rel.name, "creating relationship");
    let mut fragments = vec![Value::Object(raw::new_meta(
        &ObjectType::RelationDisplay,
        &rel.name,
    ))];
    if let Some(ref_uuid) = &rel.ref_uuid {
        fragments.push(single(REF_UUID, Value::String(ref_uuid.clone())));
    }
    fragments.push(single(LINE_COMMON, line_value(rel)));

    let mut connector = Map::new();
    connector.insert("Type".to_string(), Value::String(rel.style.kind.as_str().to_string()));
    connector.insert(
        "StartAxis".to_string(),
        Value::String(rel.style.start_axis.as_str().to_string()),
    );
    fragments.push(single(CONNECTOR_COMMON, Value::Object(connector)));

    let mut arrow = Map::new();
    arrow.insert("BeginStyle".to_string(), Value::String(rel.arrows.begin.clone()));
    arrow.insert("EndStyle".to_string(), Value::String(rel.arrows.end.clone()));
    fragments.push(single(ARROW_COMMON, Value::Object(arrow)));

    doc.insert(&rel.uuid, fragments);
}

fn line_value(rel: &Relationship) -> Value {
    let mut line = Map::new();
    line.insert("Vertices".to_string(), vertices_value(rel));
    line.insert("ConnectInfos".to_string(), connect_infos_value(rel, None));
    Value::Object(line)
}

fn vertices_value(rel: &Relationship) -> Value {
    Value::Array(
        rel.vertices
            .iter()
            .map(|p| raw::vertex_value(RawVertex { x: p.x, y: p.y }))
            .collect(),
    )
}

/// An end whose side is unknown keeps the index it was read with.
fn connect_infos_value(rel: &Relationship, previous: Option<&Value>) -> Value {
    let infos = rel
        .connect_infos
        .iter()
        .enumerate()
        .map(|(i, info)| {
            let index = info.side.map(|s| s.index()).unwrap_or_else(|| {
                previous
                    .and_then(|p| p.get(i))
                    .and_then(|p| p.get("Index"))
                    .and_then(Value::as_i64)
                    .unwrap_or(0)
            });
            let mut obj = Map::new();
            obj.insert("Index".to_string(), Value::from(index));
            obj.insert(REF_UUID.to_string(), Value::String(info.ref_uuid.clone()));
            Value::Object(obj)
        })
        .collect();
    Value::Array(infos)
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
