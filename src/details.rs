//! Read-only views of one table or relationship for the object details panel.

use serde::Serialize;

use crate::model::Model;
use crate::schema::{Field, ForeignKeyDef};

/// Referential action shown when a definition does not name one.
const NO_ACTION: &str = "NO ACTION";

/// A field row in the same shape the create/edit form submits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub nullable: bool,
    pub is_primary: bool,
}

impl From<&Field> for FieldDetails {
    fn from(f: &Field) -> Self {
        Self {
            name: f.name.clone(),
            typ: f.typ.clone(),
            nullable: f.nullable,
            is_primary: f.is_primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDetails {
    pub name: String,
    pub fields: Vec<String>,
    pub reference_table: String,
    pub reference_fields: Vec<String>,
    pub on_delete: String,
    pub on_update: String,
    /// `user_id → Users.id`
    pub summary: String,
}

impl From<&ForeignKeyDef> for ForeignKeyDetails {
    fn from(fk: &ForeignKeyDef) -> Self {
        let action = |a: &str| {
            if a.is_empty() {
                NO_ACTION.to_string()
            } else {
                a.to_string()
            }
        };
        Self {
            name: fk.name.clone(),
            fields: fk.fields.clone(),
            reference_table: fk.reference_table.clone(),
            reference_fields: fk.reference_fields.clone(),
            on_delete: action(&fk.on_delete),
            on_update: action(&fk.on_update),
            summary: format!(
                "{} → {}.{}",
                fk.fields.join(", "),
                fk.reference_table,
                fk.reference_fields.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetails {
    pub uuid: String,
    pub name: String,
    pub fields: Vec<FieldDetails>,
    pub foreign_keys: Vec<ForeignKeyDetails>,
}

/// One end of a connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub table_uuid: String,
    pub table_name: String,
    /// Stored side index; `None` when it was out of range
    pub index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDetails {
    pub uuid: String,
    pub name: String,
    pub connections: Vec<Connection>,
    pub connector_type: String,
    pub start_axis: String,
    pub begin_style: String,
    pub end_style: String,
    /// The source table's definition with the relationship's name
    pub foreign_key: Option<ForeignKeyDetails>,
}

pub fn table_details(model: &Model, uuid: &str) -> Option<TableDetails> {
    let table = model.tables.get(uuid)?;
    Some(TableDetails {
        uuid: uuid.to_string(),
        name: table.name.clone(),
        fields: table.fields.iter().map(FieldDetails::from).collect(),
        foreign_keys: table.foreign_keys.iter().map(ForeignKeyDetails::from).collect(),
    })
}

pub fn relationship_details(model: &Model, uuid: &str) -> Option<RelationshipDetails> {
    let rel = model.relationships.get(uuid)?;
    let connections = rel
        .connect_infos
        .iter()
        .map(|info| Connection {
            table_uuid: info.ref_uuid.clone(),
            table_name: model
                .display_objects
                .get(&info.ref_uuid)
                .map_or_else(|| "Unknown".to_string(), |d| d.name.clone()),
            index: info.side.map(|s| s.index()),
        })
        .collect();

    let foreign_key = rel
        .source()
        .and_then(|source| model.tables.get(&source.ref_uuid))
        .and_then(|table| table.foreign_keys.iter().find(|fk| fk.name == rel.name))
        .map(ForeignKeyDetails::from);

    Some(RelationshipDetails {
        uuid: uuid.to_string(),
        name: rel.name.clone(),
        connections,
        connector_type: rel.style.kind.as_str().to_string(),
        start_axis: rel.style.start_axis.as_str().to_string(),
        begin_style: rel.arrows.begin.clone(),
        end_style: rel.arrows.end.clone(),
        foreign_key,
    })
}
