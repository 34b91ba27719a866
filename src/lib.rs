pub mod config;
pub mod details;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod interaction;
pub mod layout;
pub mod measure;
pub mod model;
pub mod parser;
pub mod raw;
pub mod scene;
pub mod schema;
pub mod serializer;
pub mod session;
pub mod svg;

#[cfg(test)]
mod fixtures;

use wasm_bindgen::prelude::*;

use config::EditorConfig;
use geometry::Point;
use interaction::{DropOutcome, HitTarget};
use scene::ResizeHandle;
use schema::FieldInput;
use session::Session;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render an `.nmodel` document to SVG
#[wasm_bindgen(js_name = "nmodelToSvg")]
pub fn render_nmodel(source: &str) -> Result<String, String> {
    let mut session = Session::default();
    session.load_str(source).map_err(|e| e.to_string())?;
    Ok(session.export_svg())
}

/// Editing session handle for the browser host.
///
/// Pointer coordinates are in screen units; the session divides them by the
/// current zoom.
#[wasm_bindgen]
pub struct Editor {
    session: Session,
}

#[wasm_bindgen]
impl Editor {
    /// `config` is an optional JSON object of settings overrides.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<Editor, String> {
        let config = match config {
            Some(text) => EditorConfig::from_json(&text).map_err(|e| e.to_string())?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            session: Session::new(config),
        })
    }

    #[wasm_bindgen(js_name = "loadModel")]
    pub fn load_model(&mut self, text: &str) -> Result<(), String> {
        self.session.load_str(text).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "saveModel")]
    pub fn save_model(&mut self) -> Result<String, String> {
        self.session.save_string().map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "exportSvg")]
    pub fn export_svg(&self) -> String {
        self.session.export_svg()
    }

    /// `fields` is a JSON array of `{name, type, nullable, isPrimary}` rows.
    #[wasm_bindgen(js_name = "createTable")]
    pub fn create_table(&mut self, name: &str, fields: &str) -> Result<String, String> {
        let inputs: Vec<FieldInput> = serde_json::from_str(fields).map_err(|e| e.to_string())?;
        self.session
            .create_table(name, &inputs)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "setTableFields")]
    pub fn set_table_fields(&mut self, uuid: &str, fields: &str) -> Result<(), String> {
        let inputs: Vec<FieldInput> = serde_json::from_str(fields).map_err(|e| e.to_string())?;
        self.session
            .set_table_fields(uuid, &inputs)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "beginMove")]
    pub fn begin_move(&mut self, uuid: &str, x: f64, y: f64, target: &str) -> Result<bool, String> {
        let hit = HitTarget::from_str(target).ok_or_else(|| format!("Unknown target: {}", target))?;
        self.session
            .begin_move(uuid, Point::new(x, y), hit)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "beginResize")]
    pub fn begin_resize(&mut self, uuid: &str, handle: &str, x: f64, y: f64) -> Result<(), String> {
        let handle =
            ResizeHandle::from_str(handle).ok_or_else(|| format!("Unknown handle: {}", handle))?;
        self.session
            .begin_resize(uuid, handle, Point::new(x, y))
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session.pointer_move(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    #[wasm_bindgen(js_name = "startForeignKey")]
    pub fn start_foreign_key(&mut self) -> Result<(), String> {
        self.session.start_foreign_key().map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "selectForeignKeySource")]
    pub fn select_foreign_key_source(
        &mut self,
        table_uuid: &str,
        field: &str,
        x: f64,
        y: f64,
    ) -> Result<(), String> {
        self.session
            .select_foreign_key_source(table_uuid, field, Point::new(x, y))
            .map_err(|e| e.to_string())
    }

    /// Returns the suggested name when the dialog opens, `undefined` when the
    /// drop cancelled the flow.
    #[wasm_bindgen(js_name = "dropForeignKey")]
    pub fn drop_foreign_key(
        &mut self,
        table_uuid: Option<String>,
        field: Option<String>,
    ) -> Result<Option<String>, String> {
        let target = match (&table_uuid, &field) {
            (Some(table), Some(field)) => Some((table.as_str(), field.as_str())),
            _ => None,
        };
        match self.session.drop_foreign_key(target) {
            Ok(DropOutcome::Dialog(name)) => Ok(Some(name)),
            Ok(DropOutcome::Cancelled) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    #[wasm_bindgen(js_name = "commitForeignKey")]
    pub fn commit_foreign_key(&mut self, name: &str) -> Result<String, String> {
        self.session
            .commit_foreign_key(name)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "cancelForeignKey")]
    pub fn cancel_foreign_key(&mut self) -> bool {
        self.session.cancel_foreign_key()
    }

    #[wasm_bindgen(js_name = "setZoom")]
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), String> {
        self.session.set_zoom(zoom).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "zoomBy")]
    pub fn zoom_by(&mut self, factor: f64) -> Result<(), String> {
        self.session.zoom_by(factor).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "resetZoom")]
    pub fn reset_zoom(&mut self) {
        self.session.reset_zoom();
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.session.zoom()
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.session.mode().name().to_string()
    }

    #[wasm_bindgen(js_name = "setPagesSize")]
    pub fn set_pages_size(&mut self, width: i32, height: i32) {
        self.session.set_pages_size(width.into(), height.into());
    }

    /// `[uuid, name, kind]` triples for the object list.
    pub fn objects(&self) -> js_sys::Array {
        self.session
            .objects()
            .into_iter()
            .map(|o| {
                let row = js_sys::Array::new();
                row.push(&JsValue::from_str(&o.uuid));
                row.push(&JsValue::from_str(&o.name));
                row.push(&JsValue::from_str(o.kind.as_str()));
                JsValue::from(row)
            })
            .collect()
    }

    /// Drains pending scene changes as `[kind, uuid | null]` pairs. The host
    /// re-fetches each named node with `nodeSvg`, or everything on `cleared`.
    #[wasm_bindgen(js_name = "takeChanges")]
    pub fn take_changes(&mut self) -> js_sys::Array {
        self.session
            .take_changes()
            .iter()
            .map(|change| {
                let row = js_sys::Array::new();
                row.push(&JsValue::from_str(change.kind()));
                row.push(&change.uuid().map_or(JsValue::NULL, JsValue::from_str));
                JsValue::from(row)
            })
            .collect()
    }

    #[wasm_bindgen(js_name = "nodeSvg")]
    pub fn node_svg(&self, uuid: &str) -> Option<String> {
        self.session.node_svg(uuid)
    }

    #[wasm_bindgen(js_name = "dragLineSvg")]
    pub fn drag_line_svg(&self) -> Option<String> {
        self.session.drag_line_svg()
    }

    /// JSON for the details panel, `undefined` for an unknown table.
    #[wasm_bindgen(js_name = "tableDetails")]
    pub fn table_details(&self, uuid: &str) -> Result<Option<String>, String> {
        self.session
            .table_details(uuid)
            .map(|d| serde_json::to_string(&d))
            .transpose()
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "relationshipDetails")]
    pub fn relationship_details(&self, uuid: &str) -> Result<Option<String>, String> {
        self.session
            .relationship_details(uuid)
            .map(|d| serde_json::to_string(&d))
            .transpose()
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "debugInfo")]
    pub fn debug_info(&self) -> String {
        self.session.summary().to_string()
    }
}
