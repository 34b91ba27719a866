//! Foreign-key authoring: pick a source field, drop on a target field in
//! another table, confirm a name.

use crate::schema::ForeignKeyDef;

/// A field on a drawn table, as picked by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Display UUID of the table box
    pub table_uuid: String,
    pub table_name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FkState {
    AwaitingSource,
    SourceSelected {
        source: FieldRef,
    },
    DialogOpen {
        source: FieldRef,
        target: FieldRef,
        suggested_name: String,
    },
}

/// Result of releasing the pointer during a foreign-key drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// The dialog opened with this suggested name
    Dialog(String),
    /// Not a field, or a field of the source table
    Cancelled,
}

impl FkState {
    /// Pick the source field. Picking again before dropping replaces it.
    pub fn select_source(&mut self, field: FieldRef) -> bool {
        match self {
            Self::AwaitingSource | Self::SourceSelected { .. } => {
                *self = Self::SourceSelected { source: field };
                true
            }
            Self::DialogOpen { .. } => false,
        }
    }

    /// Release over `target`. A drop that is not on a field of a different
    /// table cancels; the caller returns to idle.
    pub fn drop_on(&mut self, target: Option<FieldRef>) -> DropOutcome {
        let Self::SourceSelected { source } = self else {
            return DropOutcome::Cancelled;
        };
        match target {
            Some(target) if target.table_uuid != source.table_uuid => {
                let suggested_name = default_name(&source.table_name, &target.table_name);
                *self = Self::DialogOpen {
                    source: source.clone(),
                    target,
                    suggested_name: suggested_name.clone(),
                };
                DropOutcome::Dialog(suggested_name)
            }
            _ => DropOutcome::Cancelled,
        }
    }
}

pub fn default_name(source_table: &str, target_table: &str) -> String {
    format!("fk_{}_{}", source_table, target_table)
}

/// Definition appended to the source table on commit.
pub fn foreign_key_for(
    name: &str,
    source: &FieldRef,
    target: &FieldRef,
    reference_schema: &str,
    action: &str,
) -> ForeignKeyDef {
    ForeignKeyDef::new(
        name,
        vec![source.field_name.clone()],
        reference_schema,
        &target.table_name,
        vec![target.field_name.clone()],
        action,
    )
}
