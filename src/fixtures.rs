//! Sample documents shared by the unit tests.

use serde_json::{Value, json};

pub const DIAGRAM: &str = "D-MAIN";
pub const USERS_SCHEMA: &str = "TS-USERS";
pub const USERS_DISPLAY: &str = "TD-USERS";
pub const ORDERS_SCHEMA: &str = "TS-ORDERS";
pub const ORDERS_DISPLAY: &str = "TD-ORDERS";
pub const RELATION_SCHEMA: &str = "RS-1";
pub const RELATION_DISPLAY: &str = "RD-1";
pub const NOTE: &str = "NOTE-1";

/// Users{id,name} and Orders{id,user_id} with Orders.user_id -> Users.id,
/// a connector between them and a note the editor does not model.
pub fn users_orders() -> Value {
    json!({
        "Version": "1.0",
        "ObjectJsons": {
            DIAGRAM: [
                {
                    "_META_": true,
                    "ObjectTypeID": "MVDiagram",
                    "ObjectName": "Main",
                    "ChildObjectUUIDs": [USERS_DISPLAY, ORDERS_DISPLAY, RELATION_DISPLAY, NOTE]
                },
                {"PaperSize": {"Width": 850, "Height": 1100}},
                {"PagesSize": {"Width": 2, "Height": 2}},
                {"ObjectLayouts": [
                    {"RefUUID": USERS_DISPLAY, "Name": "Users", "Rect": {"X": 50, "Y": 50, "Width": 200, "Height": 100}},
                    {"RefUUID": ORDERS_DISPLAY, "Name": "Orders", "Rect": {"X": 400, "Y": 50, "Width": 200, "Height": 100}},
                    {"RefUUID": RELATION_DISPLAY, "Name": "fk_orders_users", "Rect": {"X": 200, "Y": 50, "Width": 250, "Height": 100}},
                    {"RefUUID": NOTE, "Name": "memo", "Rect": {"X": 50, "Y": 400, "Width": 120, "Height": 60}}
                ]}
            ],
            USERS_SCHEMA: [
                {"_META_": true, "ObjectTypeID": "TableNormal_PGSQL", "ObjectName": "Users"},
                {"TableCommon": {
                    "Fields": [
                        {"Name": "id", "Type": "int4", "IsNull": "NO", "IsPrimary": true, "OrderNum": 0},
                        {"Name": "name", "Type": "varchar", "IsNull": "YES", "IsPrimary": false, "OrderNum": 1, "Length": 64}
                    ],
                    "ForeignKeys": [],
                    "Indexes": [{"Name": "users_pkey", "Fields": ["id"]}],
                    "Triggers": [],
                    "Checks": [],
                    "Uniques": [],
                    "Excludes": [],
                    "Rules": []
                }}
            ],
            USERS_DISPLAY: [
                {"_META_": true, "ObjectTypeID": "MVDiagramModelObject_Table", "ObjectName": "Users"},
                {"RefUUID": USERS_SCHEMA}
            ],
            ORDERS_SCHEMA: [
                {"_META_": true, "ObjectTypeID": "TableNormal_PGSQL", "ObjectName": "Orders"},
                {"TableCommon": {
                    "Fields": [
                        {"Name": "id", "Type": "int4", "IsNull": "NO", "IsPrimary": true, "OrderNum": 0},
                        {"Name": "user_id", "Type": "int4", "IsNull": "NO", "IsPrimary": false, "OrderNum": 1}
                    ],
                    "ForeignKeys": [
                        {
                            "Name": "fk_orders_users",
                            "Fields": ["user_id"],
                            "ReferenceSchema": "public",
                            "ReferenceTable": "Users",
                            "ReferenceFields": ["id"],
                            "OnDelete": "CASCADE",
                            "OnUpdate": "NO ACTION"
                        }
                    ],
                    "Indexes": [],
                    "Triggers": [{"Name": "audit"}]
                }}
            ],
            ORDERS_DISPLAY: [
                {"_META_": true, "ObjectTypeID": "MVDiagramModelObject_Table", "ObjectName": "Orders"},
                {"RefUUID": ORDERS_SCHEMA}
            ],
            RELATION_SCHEMA: [
                {"_META_": true, "ObjectTypeID": "Relation_PGSQL", "ObjectName": "fk_orders_users"}
            ],
            RELATION_DISPLAY: [
                {"_META_": true, "ObjectTypeID": "MVDiagramModelObject_Relation", "ObjectName": "fk_orders_users"},
                {"RefUUID": RELATION_SCHEMA},
                {"LineCommon": {
                    "Vertices": [{"X": 50, "Y": 50}, {"X": 200, "Y": 50}],
                    "ConnectInfos": [
                        {"Index": 3, "RefUUID": ORDERS_DISPLAY},
                        {"Index": 1, "RefUUID": USERS_DISPLAY}
                    ]
                }},
                {"ConnectorCommon": {"Type": "Elbow", "StartAxis": "Horizontal"}},
                {"ArrowCommon": {"BeginStyle": "None", "EndStyle": "Arrow"}},
                {"RelationCommon": {"Cardinality": "OneToMany"}}
            ],
            NOTE: [
                {"_META_": true, "ObjectTypeID": "MVDiagramShape_Note", "ObjectName": "memo"}
            ]
        }
    })
}

/// `users_orders` with the Orders table's `ForeignKeys` replaced.
pub fn with_orders_foreign_keys(foreign_keys: Value) -> Value {
    let mut doc = users_orders();
    doc["ObjectJsons"][ORDERS_SCHEMA][1]["TableCommon"]["ForeignKeys"] = foreign_keys;
    doc
}
