//! Table schema entities and the normalizers that produce them.
//!
//! Field records arrive in several spellings (`Name`/`name`,
//! `IsNull`/`isNull`/`nullable`, ...) depending on whether they came from a
//! file or from the create-table form. Everything past the normalizers sees
//! one shape. The source object is kept alongside so keys the editor does not
//! understand (`Length`, `Comment`, ...) are written back untouched.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: String,
    pub nullable: bool,
    pub is_primary: bool,
    pub order: i64,
    extra: Map<String, Value>,
}

impl Field {
    pub fn new(name: &str, typ: &str, nullable: bool, is_primary: bool, order: i64) -> Self {
        Self {
            name: name.to_string(),
            typ: typ.to_string(),
            nullable,
            is_primary,
            order,
            extra: Map::new(),
        }
    }

    /// Normalize a field record from a file. `position` is used when no order
    /// key is present. Records without a name are rejected.
    pub fn from_json(value: &Value, position: usize) -> Option<Self> {
        let obj = value.as_object()?;
        let name = str_member(obj, &["Name", "name"])?.to_string();
        let typ = str_member(obj, &["Type", "type"]).unwrap_or_default().to_string();

        let nullable = obj
            .get("IsNull")
            .or_else(|| obj.get("isNull"))
            .map(nullability)
            .or_else(|| obj.get("nullable").and_then(Value::as_bool))
            .or_else(|| obj.get("IsNullable").and_then(Value::as_bool))
            .unwrap_or(true);

        let is_primary = ["IsPrimary", "isPrimary", "primary"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_bool))
            .unwrap_or(false);

        let order = ["OrderNum", "order", "orderNum"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_i64))
            .unwrap_or(position as i64);

        Some(Self {
            name,
            typ,
            nullable,
            is_primary,
            order,
            extra: obj.clone(),
        })
    }

    /// File representation. Canonical keys overwrite their source values in
    /// place, alias spellings are dropped and every other source key is kept.
    pub fn to_json(&self) -> Value {
        let mut obj = self.extra.clone();
        for alias in FIELD_ALIASES {
            obj.remove(alias);
        }
        obj.insert("Name".to_string(), Value::String(self.name.clone()));
        obj.insert("Type".to_string(), Value::String(self.typ.clone()));
        obj.insert(
            "IsNull".to_string(),
            Value::String(if self.nullable { "YES" } else { "NO" }.to_string()),
        );
        obj.insert("IsPrimary".to_string(), Value::Bool(self.is_primary));
        obj.insert("OrderNum".to_string(), Value::from(self.order));
        Value::Object(obj)
    }
}

const FIELD_ALIASES: [&str; 9] = [
    "name", "type", "isNull", "nullable", "isPrimary", "primary", "order", "orderNum", "uuid",
];

const FOREIGN_KEY_ALIASES: [&str; 7] = [
    "name",
    "fields",
    "referenceSchema",
    "referenceTable",
    "referenceFields",
    "onDelete",
    "onUpdate",
];

/// `IsNull` is `"YES"`/`"NO"` in files but a boolean in some producers.
fn nullability(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.eq_ignore_ascii_case("NO"),
        _ => true,
    }
}

fn str_member<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn str_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => vec![],
    }
}

/// One field row as submitted by the create-table form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default = "default_field_type", alias = "type", alias = "Type")]
    pub typ: String,
    #[serde(default = "default_true", alias = "isNull", alias = "IsNullable")]
    pub nullable: bool,
    #[serde(default, alias = "isPrimary", alias = "IsPrimary")]
    pub primary: bool,
}

fn default_field_type() -> String {
    "VARCHAR".to_string()
}

fn default_true() -> bool {
    true
}

impl FieldInput {
    pub fn new(name: &str, typ: &str, nullable: bool, primary: bool) -> Self {
        Self {
            name: name.to_string(),
            typ: typ.to_string(),
            nullable,
            primary,
        }
    }

    /// Rows with a blank name are dropped; the rest are numbered in form order.
    pub fn normalize(inputs: &[FieldInput]) -> Vec<Field> {
        inputs
            .iter()
            .filter(|f| !f.name.trim().is_empty())
            .enumerate()
            .map(|(i, f)| Field::new(f.name.trim(), &f.typ, f.nullable, f.primary, i as i64))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub name: String,
    pub fields: Vec<String>,
    pub reference_schema: String,
    pub reference_table: String,
    pub reference_fields: Vec<String>,
    pub on_delete: String,
    pub on_update: String,
    extra: Map<String, Value>,
}

impl ForeignKeyDef {
    pub fn new(
        name: &str,
        fields: Vec<String>,
        reference_schema: &str,
        reference_table: &str,
        reference_fields: Vec<String>,
        action: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            fields,
            reference_schema: reference_schema.to_string(),
            reference_table: reference_table.to_string(),
            reference_fields,
            on_delete: action.to_string(),
            on_update: action.to_string(),
            extra: Map::new(),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: str_member(obj, &["Name", "name"]).unwrap_or_default().to_string(),
            fields: str_list(obj.get("Fields").or_else(|| obj.get("fields"))),
            reference_schema: str_member(obj, &["ReferenceSchema", "referenceSchema"])
                .unwrap_or_default()
                .to_string(),
            reference_table: str_member(obj, &["ReferenceTable", "referenceTable"])
                .unwrap_or_default()
                .to_string(),
            reference_fields: str_list(
                obj.get("ReferenceFields").or_else(|| obj.get("referenceFields")),
            ),
            on_delete: str_member(obj, &["OnDelete", "onDelete"]).unwrap_or_default().to_string(),
            on_update: str_member(obj, &["OnUpdate", "onUpdate"]).unwrap_or_default().to_string(),
            extra: obj.clone(),
        })
    }

    /// A definition read from a file writes back exactly as it was read
    /// unless one of its canonical members was edited. Edited definitions
    /// use the file spelling and only carry the optional members that were
    /// read or are set.
    pub fn to_json(&self) -> Value {
        if !self.extra.is_empty() {
            let read = ForeignKeyDef::from_json(&Value::Object(self.extra.clone()));
            if read.as_ref() == Some(self) {
                return Value::Object(self.extra.clone());
            }
        }

        let had = |key: &str, alias: &str| {
            self.extra.contains_key(key) || self.extra.contains_key(alias)
        };
        let optional = [
            ("ReferenceSchema", had("ReferenceSchema", "referenceSchema"), &self.reference_schema),
            ("OnDelete", had("OnDelete", "onDelete"), &self.on_delete),
            ("OnUpdate", had("OnUpdate", "onUpdate"), &self.on_update),
        ];

        let mut obj = self.extra.clone();
        for alias in FOREIGN_KEY_ALIASES {
            obj.remove(alias);
        }
        let strings = |v: &[String]| Value::Array(v.iter().cloned().map(Value::String).collect());
        obj.insert("Name".to_string(), Value::String(self.name.clone()));
        obj.insert("Fields".to_string(), strings(&self.fields));
        obj.insert(
            "ReferenceTable".to_string(),
            Value::String(self.reference_table.clone()),
        );
        obj.insert("ReferenceFields".to_string(), strings(&self.reference_fields));
        for (key, read, value) in optional {
            if read || !value.is_empty() {
                obj.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(obj)
    }
}

/// One database table.
///
/// `uuid` is the schema object's identity; `display_uuid` is the on-canvas box
/// that depicts it. The editor keys tables by `display_uuid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub fields: Vec<Field>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    pub uuid: String,
    pub display_uuid: String,
    /// Source entries that did not normalize, with their array positions
    unread_fields: Vec<(usize, Value)>,
    unread_foreign_keys: Vec<(usize, Value)>,
}

impl Table {
    pub fn new(
        name: &str,
        uuid: &str,
        display_uuid: &str,
        fields: Vec<Field>,
        foreign_keys: Vec<ForeignKeyDef>,
    ) -> Self {
        Self {
            name: name.to_string(),
            fields,
            foreign_keys,
            uuid: uuid.to_string(),
            display_uuid: display_uuid.to_string(),
            unread_fields: vec![],
            unread_foreign_keys: vec![],
        }
    }

    /// Build from a `TableCommon` object. Entries that do not normalize are
    /// kept so they are written back in place.
    pub fn from_common(
        name: &str,
        uuid: &str,
        display_uuid: &str,
        common: &Map<String, Value>,
    ) -> Self {
        let (fields, unread_fields) = read_items(common.get("Fields"), Field::from_json);
        let (foreign_keys, unread_foreign_keys) =
            read_items(common.get("ForeignKeys"), |v, _| ForeignKeyDef::from_json(v));
        Self {
            unread_fields,
            unread_foreign_keys,
            ..Self::new(name, uuid, display_uuid, fields, foreign_keys)
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Replace the field list wholesale.
    pub fn set_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        self.unread_fields.clear();
    }

    pub fn fields_json(&self) -> Value {
        merge_unread(self.fields.iter().map(Field::to_json).collect(), &self.unread_fields)
    }

    pub fn foreign_keys_json(&self) -> Value {
        merge_unread(
            self.foreign_keys.iter().map(ForeignKeyDef::to_json).collect(),
            &self.unread_foreign_keys,
        )
    }
}

fn read_items<T>(
    items: Option<&Value>,
    read: impl Fn(&Value, usize) -> Option<T>,
) -> (Vec<T>, Vec<(usize, Value)>) {
    let mut parsed = vec![];
    let mut unread = vec![];
    for (i, item) in items.and_then(Value::as_array).into_iter().flatten().enumerate() {
        match read(item, i) {
            Some(value) => parsed.push(value),
            None => unread.push((i, item.clone())),
        }
    }
    (parsed, unread)
}

/// Positions are ascending, so inserting in order restores each entry to
/// the slot it was read from.
fn merge_unread(mut items: Vec<Value>, unread: &[(usize, Value)]) -> Value {
    for (position, value) in unread {
        let at = (*position).min(items.len());
        items.insert(at, value.clone());
    }
    Value::Array(items)
}
