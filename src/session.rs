//! One editing session: the loaded document, its normalized model, the scene
//! drawn from it and the gesture currently in progress.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::details::{self, RelationshipDetails, TableDetails};
use crate::error::EditorError;
use crate::geometry::{Point, Rect};
use crate::ids::new_uuid;
use crate::interaction::{
    DropOutcome, FieldRef, FkState, HitTarget, InteractionMode, MoveGesture, ResizeGesture,
    foreign_key_for,
};
use crate::layout::{Placement, Router, apply_route, reroute_table};
use crate::measure::TextMetrics;
use crate::model::{
    ArrowStyle, ConnectInfo, ConnectorKind, ConnectorStyle, DisplayKind, DisplayObject,
    LayoutRect, Model, Relationship,
};
use crate::parser::ModelParser;
use crate::raw::{RawModel, Size};
use crate::scene::{DragLine, ResizeHandle, Scene, SceneChange};
use crate::schema::{FieldInput, Table};
use crate::serializer::ModelSerializer;
use crate::svg::SvgRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectKind {
    Table,
    Relationship,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Relationship => "relationship",
        }
    }
}

/// A row of the object list.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub uuid: String,
    pub name: String,
    pub kind: ObjectKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub objects: usize,
    pub tables: usize,
    pub display_objects: usize,
    pub relationships: usize,
    pub paper_size: Size,
    pub pages_size: Size,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Objects: {}", self.objects)?;
        writeln!(f, "Tables Found: {}", self.tables)?;
        writeln!(f, "Display Objects: {}", self.display_objects)?;
        writeln!(f, "Relationships: {}", self.relationships)?;
        writeln!(
            f,
            "Paper Size: {} x {}",
            self.paper_size.width, self.paper_size.height
        )?;
        writeln!(
            f,
            "Pages: {} x {}",
            self.pages_size.width, self.pages_size.height
        )?;
        write!(
            f,
            "Total Size: {} x {}",
            self.paper_size.width * self.pages_size.width,
            self.paper_size.height * self.pages_size.height
        )
    }
}

pub struct Session {
    config: EditorConfig,
    doc: RawModel,
    model: Model,
    scene: Scene,
    router: Router,
    zoom: f64,
    mode: InteractionMode,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Session {
    /// An empty session. Tables created before any load go into a fresh
    /// diagram that is written out on save.
    pub fn new(config: EditorConfig) -> Self {
        let model = Model::empty(&new_uuid(), config.paper_size, config.pages_size);
        let router = Router::new(config.elbow_extension);
        let mut scene = Scene::new(TextMetrics::default());
        scene.rebuild(&model, &router);
        Self {
            config,
            doc: RawModel::default(),
            model,
            scene,
            router,
            zoom: 1.0,
            mode: InteractionMode::Idle,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Drain pending scene changes for the host's drawing surface.
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        self.scene.take_changes()
    }

    /// Replace the session with a document. Nothing changes on failure.
    pub fn load_str(&mut self, text: &str) -> Result<(), EditorError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let doc = RawModel::from_value(value).ok_or(EditorError::NotAModel)?;
        let model = ModelParser::new(&self.config).parse(&doc)?;

        self.doc = doc;
        self.model = model;
        self.mode = InteractionMode::Idle;
        self.scene.rebuild(&self.model, &self.router);
        info!(
            tables = self.scene.tables.len(),
            connectors = self.scene.connectors.len(),
            "loaded model"
        );
        Ok(())
    }

    /// Serialize the session as indented `.nmodel` JSON.
    pub fn save_string(&mut self) -> Result<String, EditorError> {
        let source =
            ModelSerializer::new(&self.config).write(&self.model, Some(&self.scene), &mut self.doc);
        self.model.diagram.layout_source = source;
        Ok(self.doc.to_string_pretty()?)
    }

    pub fn export_svg(&self) -> String {
        SvgRenderer::default().render(&self.scene)
    }

    /// Current markup of one table box or connector, for applying a
    /// [`SceneChange`]. `None` once the node is gone.
    pub fn node_svg(&self, uuid: &str) -> Option<String> {
        let renderer = SvgRenderer::default();
        if let Some(node) = self.scene.tables.get(uuid) {
            return Some(renderer.table_fragment(node, self.scene.metrics()));
        }
        self.scene
            .connectors
            .get(uuid)
            .map(|node| renderer.connector_fragment(node))
    }

    pub fn drag_line_svg(&self) -> Option<String> {
        self.scene
            .drag_line
            .as_ref()
            .map(|line| SvgRenderer::default().drag_line_fragment(line))
    }

    pub fn table_details(&self, uuid: &str) -> Option<TableDetails> {
        details::table_details(&self.model, uuid)
    }

    pub fn relationship_details(&self, uuid: &str) -> Option<RelationshipDetails> {
        details::relationship_details(&self.model, uuid)
    }

    /// Tables, then relationships, each alphabetically by name.
    pub fn objects(&self) -> Vec<ObjectEntry> {
        let mut entries: Vec<ObjectEntry> = self
            .model
            .display_objects
            .values()
            .filter(|d| match d.kind {
                DisplayKind::Table { .. } => self.model.tables.contains_key(&d.uuid),
                DisplayKind::Relationship => true,
            })
            .map(|d| ObjectEntry {
                uuid: d.uuid.clone(),
                name: d.name.clone(),
                kind: match d.kind {
                    DisplayKind::Table { .. } => ObjectKind::Table,
                    DisplayKind::Relationship => ObjectKind::Relationship,
                },
            })
            .collect();
        entries.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        entries
    }

    pub fn summary(&self) -> Summary {
        Summary {
            objects: self.doc.len(),
            tables: self.model.tables.len(),
            display_objects: self.model.display_objects.len(),
            relationships: self.model.relationships.len(),
            paper_size: self.model.diagram.paper_size,
            pages_size: self.model.diagram.pages_size,
        }
    }

    // Tables

    /// Create a table beside the existing objects. Returns its display UUID.
    pub fn create_table(&mut self, name: &str, inputs: &[FieldInput]) -> Result<String, EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::validation("Please enter a table name"));
        }
        let fields = FieldInput::normalize(inputs);
        if fields.is_empty() {
            return Err(EditorError::validation("Please add at least one field"));
        }

        let placement = Placement {
            origin: self.config.placement_origin,
            margin: self.config.placement_margin,
            viewport_width: self.config.viewport_width,
            width: self.config.new_table_width,
        };
        let (x, y) = placement.next_origin(self.model.layout.values().map(|l| &l.rect));
        let rect = Rect::new(
            x,
            y,
            self.config.new_table_width,
            self.config.new_table_base_height + self.config.new_table_row_height * fields.len() as f64,
        );

        let schema_uuid = new_uuid();
        let display_uuid = new_uuid();
        self.model.tables.insert(
            display_uuid.clone(),
            Table::new(name, &schema_uuid, &display_uuid, fields, vec![]),
        );
        self.model.display_objects.insert(
            display_uuid.clone(),
            DisplayObject::table(&display_uuid, name, &schema_uuid),
        );
        self.model
            .layout
            .insert(display_uuid.clone(), LayoutRect::new(name, rect));
        self.scene.render_table(&self.model, &display_uuid);

        info!(uuid = %display_uuid, name, x, y, "created table");
        Ok(display_uuid)
    }

    /// Replace a table's fields wholesale.
    pub fn set_table_fields(&mut self, uuid: &str, inputs: &[FieldInput]) -> Result<(), EditorError> {
        let fields = FieldInput::normalize(inputs);
        if fields.is_empty() {
            return Err(EditorError::validation("Please add at least one field"));
        }
        let table = self
            .model
            .tables
            .get_mut(uuid)
            .ok_or_else(|| EditorError::MissingTable(uuid.to_string()))?;
        table.set_fields(fields);
        self.scene.render_table(&self.model, uuid);
        Ok(())
    }

    // View

    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), EditorError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(EditorError::validation("Zoom must be a positive number"));
        }
        self.zoom = zoom;
        Ok(())
    }

    pub fn zoom_by(&mut self, factor: f64) -> Result<(), EditorError> {
        self.set_zoom(self.zoom * factor)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    /// Resize the canvas in whole pages. Non-positive counts fall back to
    /// the configured defaults.
    pub fn set_pages_size(&mut self, width: i64, height: i64) {
        self.model.diagram.pages_size = self
            .config
            .clamp_pages(Size::new(width as f64, height as f64));
        self.scene.pages_size = self.model.diagram.pages_size;
    }

    fn canvas_point(&self, pointer: Point) -> Point {
        Point::new(pointer.x / self.zoom, pointer.y / self.zoom)
    }

    fn ensure_idle(&self) -> Result<(), EditorError> {
        if self.mode.is_idle() {
            Ok(())
        } else {
            debug!(mode = self.mode.name(), "rejecting second gesture");
            Err(EditorError::GestureInProgress)
        }
    }

    // Move and resize

    /// Pointer down on a table. Only a hit on the body starts a move.
    pub fn begin_move(&mut self, uuid: &str, pointer: Point, hit: HitTarget) -> Result<bool, EditorError> {
        self.ensure_idle()?;
        if hit != HitTarget::Body {
            return Ok(false);
        }
        let origin = self
            .scene
            .live_position(uuid)
            .or_else(|| self.model.rect(uuid).map(|r| Point::new(r.x, r.y)))
            .ok_or_else(|| EditorError::MissingLayout(uuid.to_string()))?;

        let pointer = self.canvas_point(pointer);
        self.mode = InteractionMode::Moving(MoveGesture::start(uuid, pointer, origin));
        Ok(true)
    }

    pub fn begin_resize(
        &mut self,
        uuid: &str,
        handle: ResizeHandle,
        pointer: Point,
    ) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let rect = self
            .model
            .rect(uuid)
            .ok_or_else(|| EditorError::MissingLayout(uuid.to_string()))?;
        let pointer = self.canvas_point(pointer);
        self.mode = InteractionMode::Resizing(ResizeGesture::start(uuid, handle, pointer, rect));
        Ok(())
    }

    /// Pointer moved. Drives whichever gesture is in progress.
    pub fn pointer_move(&mut self, pointer: Point) {
        let pointer = self.canvas_point(pointer);
        match &self.mode {
            InteractionMode::Moving(gesture) => {
                let uuid = gesture.uuid.clone();
                let origin = gesture.origin_at(pointer);
                if let Some(layout) = self.model.layout.get_mut(&uuid) {
                    layout.rect.x = origin.x;
                    layout.rect.y = origin.y;
                    self.scene.set_transform(&uuid, origin);
                    self.refresh_connectors(&uuid);
                }
            }
            InteractionMode::Resizing(gesture) => {
                let uuid = gesture.uuid.clone();
                let rect = gesture.rect_at(
                    pointer,
                    self.config.min_table_width,
                    self.config.min_table_height,
                );
                if let Some(layout) = self.model.layout.get_mut(&uuid) {
                    layout.rect = rect;
                    self.scene.reshape(&uuid, rect);
                    self.refresh_connectors(&uuid);
                }
            }
            InteractionMode::ForeignKey(FkState::SourceSelected { .. }) => {
                if let Some(line) = self.scene.drag_line {
                    self.scene.set_drag_line(Some(DragLine {
                        from: line.from,
                        to: pointer,
                    }));
                }
            }
            _ => {}
        }
    }

    /// Pointer released. Ends a move or resize; during a foreign-key drag it
    /// is a drop on nothing.
    pub fn pointer_up(&mut self) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Moving(gesture) => {
                debug!(uuid = %gesture.uuid, rect = ?self.model.rect(&gesture.uuid), "move finished");
            }
            InteractionMode::Resizing(gesture) => {
                self.scene.render_table(&self.model, &gesture.uuid);
                self.refresh_connectors(&gesture.uuid);
                debug!(uuid = %gesture.uuid, rect = ?self.model.rect(&gesture.uuid), "resize finished");
            }
            InteractionMode::ForeignKey(FkState::SourceSelected { .. }) => {
                self.scene.set_drag_line(None);
                debug!("foreign key drop on empty canvas");
            }
            mode => self.mode = mode,
        }
    }

    fn refresh_connectors(&mut self, table_uuid: &str) {
        let routes = reroute_table(
            &mut self.model,
            table_uuid,
            &self.router,
            self.config.connector_padding,
        );
        for (rel_uuid, route) in routes {
            if self.scene.connectors.contains_key(&rel_uuid) {
                self.scene.set_connector_path(&rel_uuid, route.to_path());
            } else if let Some(rel) = self.model.relationships.get(&rel_uuid) {
                self.scene.insert_connector(rel, route.to_path());
            }
        }
    }

    // Foreign keys

    pub fn start_foreign_key(&mut self) -> Result<(), EditorError> {
        self.ensure_idle()?;
        self.mode = InteractionMode::ForeignKey(FkState::AwaitingSource);
        Ok(())
    }

    /// Escape: abandon foreign-key authoring at any step before commit.
    pub fn cancel_foreign_key(&mut self) -> bool {
        if matches!(self.mode, InteractionMode::ForeignKey(_)) {
            self.mode = InteractionMode::Idle;
            self.scene.set_drag_line(None);
            debug!("foreign key creation cancelled");
            true
        } else {
            false
        }
    }

    fn field_ref(&self, table_uuid: &str, field_name: &str) -> Result<FieldRef, EditorError> {
        let table = self
            .model
            .tables
            .get(table_uuid)
            .ok_or_else(|| EditorError::MissingTable(table_uuid.to_string()))?;
        let field = table.field(field_name).ok_or_else(|| EditorError::UnknownField {
            table: table.name.clone(),
            field: field_name.to_string(),
        })?;
        Ok(FieldRef {
            table_uuid: table_uuid.to_string(),
            table_name: table.name.clone(),
            field_name: field.name.clone(),
        })
    }

    /// Click on a field while awaiting a source.
    pub fn select_foreign_key_source(
        &mut self,
        table_uuid: &str,
        field_name: &str,
        pointer: Point,
    ) -> Result<(), EditorError> {
        let source = self.field_ref(table_uuid, field_name)?;
        let InteractionMode::ForeignKey(state) = &mut self.mode else {
            return Err(EditorError::InvalidState("foreign key mode is not active"));
        };
        if !state.select_source(source) {
            return Err(EditorError::InvalidState("foreign key dialog is open"));
        }

        let at = self.canvas_point(pointer);
        let from = self.field_anchor(table_uuid, field_name).unwrap_or(at);
        self.scene.set_drag_line(Some(DragLine { from, to: at }));
        Ok(())
    }

    /// Center of a field's row on the table box, when it has a layout.
    fn field_anchor(&self, table_uuid: &str, field_name: &str) -> Option<Point> {
        let rect = self.model.rect(table_uuid)?;
        let index = self
            .model
            .tables
            .get(table_uuid)?
            .fields
            .iter()
            .position(|f| f.name == field_name)?;
        let origin = Point::new(rect.x, rect.y);
        Some(self.scene.metrics().field_center(origin, rect.width, index))
    }

    /// Release during a foreign-key drag, over `target` (table display UUID
    /// and field name) or over nothing.
    pub fn drop_foreign_key(
        &mut self,
        target: Option<(&str, &str)>,
    ) -> Result<DropOutcome, EditorError> {
        let target = target.and_then(|(table, field)| self.field_ref(table, field).ok());
        let InteractionMode::ForeignKey(state @ FkState::SourceSelected { .. }) = &mut self.mode
        else {
            return Err(EditorError::InvalidState("no foreign key source selected"));
        };

        let outcome = state.drop_on(target);
        self.scene.set_drag_line(None);
        if outcome == DropOutcome::Cancelled {
            debug!("invalid foreign key drop");
            self.mode = InteractionMode::Idle;
        }
        Ok(outcome)
    }

    /// Confirm the dialog. Returns the new relationship's display UUID.
    ///
    /// On error the dialog stays open and nothing is modified.
    pub fn commit_foreign_key(&mut self, name: &str) -> Result<String, EditorError> {
        let InteractionMode::ForeignKey(FkState::DialogOpen { source, target, .. }) = &self.mode
        else {
            return Err(EditorError::InvalidState("no foreign key dialog open"));
        };
        let (source, target) = (source.clone(), target.clone());

        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::validation("Please enter a foreign key name"));
        }

        let (Some(source_rect), Some(target_rect)) = (
            self.model.rect(&source.table_uuid),
            self.model.rect(&target.table_uuid),
        ) else {
            error!(
                source = %source.table_uuid,
                target = %target.table_uuid,
                "cannot find table layouts"
            );
            return Err(EditorError::MissingLayout(format!(
                "{} -> {}",
                source.table_name, target.table_name
            )));
        };
        if !self.model.tables.contains_key(&source.table_uuid) {
            return Err(EditorError::MissingTable(source.table_name));
        }

        let fk = foreign_key_for(
            name,
            &source,
            &target,
            &self.config.default_reference_schema,
            &self.config.default_referential_action,
        );
        let route = self
            .router
            .route(&source_rect, &target_rect, ConnectorKind::Elbow);

        let display_uuid = new_uuid();
        let rel = Relationship {
            uuid: display_uuid.clone(),
            ref_uuid: Some(new_uuid()),
            name: name.to_string(),
            connect_infos: vec![
                ConnectInfo::new(&source.table_uuid, route.source_side),
                ConnectInfo::new(&target.table_uuid, route.target_side),
            ],
            style: ConnectorStyle::default(),
            arrows: ArrowStyle::default(),
            vertices: vec![],
            geometry_changed: true,
        };

        if let Some(table) = self.model.tables.get_mut(&source.table_uuid) {
            table.foreign_keys.push(fk);
        }
        self.model.insert_relationship(rel);
        apply_route(
            &mut self.model,
            &display_uuid,
            &route,
            self.config.connector_padding,
        );
        if let Some(rel) = self.model.relationships.get(&display_uuid) {
            self.scene.insert_connector(rel, route.to_path());
        } else {
            warn!(uuid = %display_uuid, "relationship vanished before render");
        }

        self.mode = InteractionMode::Idle;
        info!(
            uuid = %display_uuid,
            name,
            source = %source.table_name,
            target = %target.table_name,
            "created foreign key"
        );
        Ok(display_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::geometry::Side;

    fn loaded() -> Session {
        let mut session = Session::default();
        session
            .load_str(&fixtures::users_orders().to_string())
            .unwrap();
        session
    }

    fn id_field() -> Vec<FieldInput> {
        vec![FieldInput::new("id", "INTEGER", false, true)]
    }

    fn open_dialog(session: &mut Session) {
        session.start_foreign_key().unwrap();
        session
            .select_foreign_key_source(fixtures::ORDERS_DISPLAY, "user_id", Point::new(420.0, 75.0))
            .unwrap();
        session.pointer_move(Point::new(100.0, 75.0));
        let outcome = session
            .drop_foreign_key(Some((fixtures::USERS_DISPLAY, "id")))
            .unwrap();
        assert_eq!(outcome, DropOutcome::Dialog("fk_Orders_Users".into()));
    }

    #[test]
    fn test_load_then_save_keeps_foreign_key() {
        let mut session = loaded();
        let saved = session.save_string().unwrap();

        let mut reloaded = Session::default();
        reloaded.load_str(&saved).unwrap();
        let orders = &reloaded.model().tables[fixtures::ORDERS_DISPLAY];
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].name, "fk_orders_users");
        assert_eq!(orders.foreign_keys[0].reference_table, "Users");
        assert_eq!(orders.foreign_keys[0].reference_fields, vec!["id"]);
    }

    #[test]
    fn test_foreign_key_happy_path() {
        let mut session = loaded();
        open_dialog(&mut session);
        let uuid = session.commit_foreign_key("fk_orders_users").unwrap();

        assert!(session.mode().is_idle());
        assert!(session.scene().drag_line.is_none());
        let rel = &session.model().relationships[&uuid];
        assert_eq!(rel.source().unwrap().ref_uuid, fixtures::ORDERS_DISPLAY);
        assert_eq!(rel.target().unwrap().ref_uuid, fixtures::USERS_DISPLAY);
        // Orders sits to the right of Users
        assert_eq!(rel.source().unwrap().side, Some(Side::Left));
        assert!(session.model().rect(&uuid).is_some());
        assert!(session.scene().connectors.contains_key(&uuid));
        assert!(
            session
                .model()
                .table_relationships
                .get(fixtures::USERS_DISPLAY)
                .contains(&uuid)
        );

        let orders = &session.model().tables[fixtures::ORDERS_DISPLAY];
        assert_eq!(orders.foreign_keys.len(), 2);
        let fk = &orders.foreign_keys[1];
        assert_eq!(fk.fields, vec!["user_id"]);
        assert_eq!(fk.reference_table, "Users");
        assert_eq!(fk.reference_fields, vec!["id"]);
        assert_eq!(fk.on_delete, "NO ACTION");

        let saved = session.save_string().unwrap();
        let mut reloaded = Session::default();
        reloaded.load_str(&saved).unwrap();
        assert_eq!(reloaded.model().relationships.len(), 2);
        assert_eq!(reloaded.model().foreign_key_count(), 2);
    }

    #[test]
    fn test_invalid_drop_returns_to_idle() {
        let mut session = loaded();
        session.start_foreign_key().unwrap();
        session
            .select_foreign_key_source(fixtures::ORDERS_DISPLAY, "user_id", Point::new(420.0, 75.0))
            .unwrap();
        assert!(session.scene().drag_line.is_some());

        session.pointer_up();
        assert!(session.mode().is_idle());
        assert!(session.scene().drag_line.is_none());
        assert_eq!(session.model().relationships.len(), 1);
        assert_eq!(session.model().foreign_key_count(), 1);
    }

    #[test]
    fn test_drop_on_same_table_cancels() {
        let mut session = loaded();
        session.start_foreign_key().unwrap();
        session
            .select_foreign_key_source(fixtures::ORDERS_DISPLAY, "user_id", Point::new(0.0, 0.0))
            .unwrap();
        let outcome = session
            .drop_foreign_key(Some((fixtures::ORDERS_DISPLAY, "id")))
            .unwrap();
        assert_eq!(outcome, DropOutcome::Cancelled);
        assert!(session.mode().is_idle());
    }

    #[test]
    fn test_commit_validation_keeps_dialog_open() {
        let mut session = loaded();
        open_dialog(&mut session);

        assert!(matches!(
            session.commit_foreign_key("  "),
            Err(EditorError::Validation(_))
        ));
        assert_eq!(session.mode().name(), "fk-dialog");

        session.model.layout.shift_remove(fixtures::USERS_DISPLAY);
        assert!(matches!(
            session.commit_foreign_key("fk_orders_users"),
            Err(EditorError::MissingLayout(_))
        ));
        assert_eq!(session.mode().name(), "fk-dialog");
        assert_eq!(session.model().foreign_key_count(), 1);
        assert_eq!(session.model().relationships.len(), 1);

        assert!(session.cancel_foreign_key());
        assert!(session.mode().is_idle());
    }

    #[test]
    fn test_new_table_placement() {
        let mut session = Session::default();
        let first = session.create_table("Users", &id_field()).unwrap();
        assert_eq!(
            session.model().rect(&first),
            Some(Rect::new(50.0, 50.0, 200.0, 120.0))
        );

        let second = session.create_table("Orders", &id_field()).unwrap();
        let rect = session.model().rect(&second).unwrap();
        assert_eq!((rect.x, rect.y), (300.0, 50.0));
        assert!(session.scene().tables.contains_key(&second));
    }

    #[test]
    fn test_create_table_validation() {
        let mut session = Session::default();
        assert!(matches!(
            session.create_table(" ", &id_field()),
            Err(EditorError::Validation(_))
        ));
        assert!(matches!(
            session.create_table("Empty", &[FieldInput::new("", "INTEGER", true, false)]),
            Err(EditorError::Validation(_))
        ));
        assert!(session.model().tables.is_empty());
    }

    #[test]
    fn test_empty_session_saves_a_loadable_model() {
        let mut session = Session::default();
        session.create_table("Users", &id_field()).unwrap();
        let saved = session.save_string().unwrap();

        let mut reloaded = Session::default();
        reloaded.load_str(&saved).unwrap();
        assert_eq!(reloaded.model().tables.len(), 1);
        assert_eq!(reloaded.objects()[0].name, "Users");
    }

    #[test]
    fn test_move_updates_layout_and_connector() {
        let mut session = loaded();
        session.take_changes();
        let before = session.scene().connectors[fixtures::RELATION_DISPLAY].path.clone();

        assert!(
            session
                .begin_move(fixtures::USERS_DISPLAY, Point::new(60.0, 60.0), HitTarget::Body)
                .unwrap()
        );
        session.pointer_move(Point::new(60.0, 460.0));
        assert_eq!(
            session.model().rect(fixtures::USERS_DISPLAY),
            Some(Rect::new(50.0, 450.0, 200.0, 100.0))
        );
        assert_eq!(
            session.scene().live_position(fixtures::USERS_DISPLAY),
            Some(Point::new(50.0, 450.0))
        );
        let after = &session.scene().connectors[fixtures::RELATION_DISPLAY].path;
        assert_ne!(&before, after);
        assert!(session.model().relationships[fixtures::RELATION_DISPLAY].geometry_changed);

        let changes = session.take_changes();
        assert!(changes.contains(&SceneChange::TableMoved(fixtures::USERS_DISPLAY.into())));
        assert!(changes.contains(&SceneChange::ConnectorPath(fixtures::RELATION_DISPLAY.into())));

        session.pointer_up();
        assert!(session.mode().is_idle());
    }

    #[test]
    fn test_long_move_leaves_one_entry_per_node() {
        let mut session = loaded();
        session.take_changes();
        session
            .begin_move(fixtures::USERS_DISPLAY, Point::new(60.0, 60.0), HitTarget::Body)
            .unwrap();
        for i in 0..10_000 {
            session.pointer_move(Point::new(60.0, 60.0 + (i % 400) as f64));
        }
        session.pointer_up();

        let changes = session.take_changes();
        assert!(changes.len() <= 4, "{:?}", changes);
        for change in &changes {
            let uuid = change.uuid().unwrap();
            let markup = session.node_svg(uuid).unwrap();
            assert!(markup.contains(&format!(r#"data-uuid="{}""#, uuid)));
        }
        assert!(session.take_changes().is_empty());
        assert!(session.node_svg("MISSING").is_none());
    }

    #[test]
    fn test_drag_line_markup_follows_the_flow() {
        let mut session = loaded();
        assert!(session.drag_line_svg().is_none());
        session.start_foreign_key().unwrap();
        session
            .select_foreign_key_source(fixtures::ORDERS_DISPLAY, "user_id", Point::new(420.0, 75.0))
            .unwrap();
        session.pointer_move(Point::new(100.0, 80.0));
        let markup = session.drag_line_svg().unwrap();
        assert!(markup.contains(r#"class="fk-drag-line""#));
        assert!(markup.contains(r#"x2="100" y2="80""#));

        assert!(session.cancel_foreign_key());
        assert!(session.drag_line_svg().is_none());
    }

    #[test]
    fn test_details_after_commit() {
        let mut session = loaded();
        open_dialog(&mut session);
        let uuid = session.commit_foreign_key("fk_orders_owner").unwrap();

        let table = session.table_details(fixtures::ORDERS_DISPLAY).unwrap();
        assert_eq!(table.foreign_keys.len(), 2);
        assert_eq!(table.foreign_keys[1].name, "fk_orders_owner");
        assert_eq!(table.foreign_keys[1].summary, "user_id → Users.id");

        let rel = session.relationship_details(&uuid).unwrap();
        assert_eq!(rel.name, "fk_orders_owner");
        assert_eq!(rel.connections[0].table_name, "Orders");
        assert_eq!(rel.connections[1].table_name, "Users");
        assert_eq!(rel.foreign_key.unwrap().on_delete, "NO ACTION");

        assert!(session.table_details(&uuid).is_none());
        assert!(session.relationship_details(fixtures::USERS_DISPLAY).is_none());
    }

    #[test]
    fn test_move_respects_zoom() {
        let mut session = loaded();
        session.set_zoom(2.0).unwrap();
        session
            .begin_move(fixtures::USERS_DISPLAY, Point::new(120.0, 120.0), HitTarget::Body)
            .unwrap();
        session.pointer_move(Point::new(220.0, 120.0));
        assert_eq!(
            session.model().rect(fixtures::USERS_DISPLAY).map(|r| (r.x, r.y)),
            Some((100.0, 50.0))
        );
    }

    #[test]
    fn test_text_and_handle_hits_do_not_move() {
        let mut session = loaded();
        let moved = session
            .begin_move(fixtures::USERS_DISPLAY, Point::new(60.0, 60.0), HitTarget::Text)
            .unwrap();
        assert!(!moved);
        let moved = session
            .begin_move(
                fixtures::USERS_DISPLAY,
                Point::new(60.0, 60.0),
                HitTarget::Handle(ResizeHandle::Nw),
            )
            .unwrap();
        assert!(!moved);
        assert!(session.mode().is_idle());
    }

    #[test]
    fn test_one_gesture_at_a_time() {
        let mut session = loaded();
        session
            .begin_move(fixtures::USERS_DISPLAY, Point::new(60.0, 60.0), HitTarget::Body)
            .unwrap();
        assert!(matches!(
            session.begin_resize(fixtures::ORDERS_DISPLAY, ResizeHandle::Se, Point::new(0.0, 0.0)),
            Err(EditorError::GestureInProgress)
        ));
        assert!(matches!(
            session.start_foreign_key(),
            Err(EditorError::GestureInProgress)
        ));
        session.pointer_up();
        assert!(session.start_foreign_key().is_ok());
    }

    #[test]
    fn test_resize_clamps_and_rerenders() {
        let mut session = loaded();
        session
            .begin_resize(fixtures::USERS_DISPLAY, ResizeHandle::Se, Point::new(250.0, 150.0))
            .unwrap();
        session.pointer_move(Point::new(-500.0, -500.0));
        assert_eq!(
            session.model().rect(fixtures::USERS_DISPLAY),
            Some(Rect::new(50.0, 50.0, 100.0, 60.0))
        );
        assert_eq!(session.scene().tables[fixtures::USERS_DISPLAY].header_width, 100.0);

        session.take_changes();
        session.pointer_up();
        assert!(session.mode().is_idle());
        let changes = session.take_changes();
        assert!(changes.contains(&SceneChange::TableRendered(fixtures::USERS_DISPLAY.into())));
        let node = &session.scene().tables[fixtures::USERS_DISPLAY];
        assert!(node.rows.is_empty());
        assert_eq!(node.hidden_fields, 2);
    }

    #[test]
    fn test_failed_load_keeps_session() {
        let mut session = loaded();
        assert!(matches!(session.load_str("{nope"), Err(EditorError::Malformed(_))));
        assert!(matches!(session.load_str(r#"{"a": 1}"#), Err(EditorError::NotAModel)));
        assert!(matches!(
            session.load_str(r#"{"ObjectJsons": {}}"#),
            Err(EditorError::Parse(_))
        ));
        assert_eq!(session.model().tables.len(), 2);
    }

    #[test]
    fn test_objects_sorted_by_name() {
        let session = loaded();
        let names: Vec<(String, ObjectKind)> = session
            .objects()
            .into_iter()
            .map(|o| (o.name, o.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Orders".to_string(), ObjectKind::Table),
                ("Users".to_string(), ObjectKind::Table),
                ("fk_orders_users".to_string(), ObjectKind::Relationship),
            ]
        );
    }

    #[test]
    fn test_pages_and_summary() {
        let mut session = loaded();
        session.set_pages_size(3, 0);
        let summary = session.summary();
        assert_eq!(summary.pages_size, Size::new(3.0, 3.0));
        assert_eq!(summary.tables, 2);
        assert_eq!(session.scene().canvas_size(), Size::new(2550.0, 3300.0));
        assert!(summary.to_string().contains("Total Size: 2550 x 3300"));

        session.set_pages_size(i64::MAX, 2);
        assert_eq!(session.summary().pages_size, Size::new(100.0, 2.0));
    }

    #[test]
    fn test_set_table_fields_survives_save() {
        let mut session = loaded();
        let fields = vec![
            FieldInput::new("id", "int4", false, true),
            FieldInput::new("email", "text", true, false),
            FieldInput::new("", "text", true, false),
        ];
        session
            .set_table_fields(fixtures::USERS_DISPLAY, &fields)
            .unwrap();
        assert!(session.set_table_fields("TD-NOPE", &fields).is_err());
        assert!(matches!(
            session.set_table_fields(fixtures::USERS_DISPLAY, &[]),
            Err(EditorError::Validation(_))
        ));

        let saved = session.save_string().unwrap();
        let mut reloaded = Session::default();
        reloaded.load_str(&saved).unwrap();
        let users = &reloaded.model().tables[fixtures::USERS_DISPLAY];
        let names: Vec<_> = users.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email"]);
    }

    #[test]
    fn test_zoom_controls() {
        let mut session = Session::default();
        session.zoom_by(1.25).unwrap();
        session.zoom_by(2.0).unwrap();
        assert_eq!(session.zoom(), 2.5);
        assert!(session.set_zoom(0.0).is_err());
        session.reset_zoom();
        assert_eq!(session.zoom(), 1.0);
    }

    #[test]
    fn test_export_svg_draws_tables() {
        let session = loaded();
        let svg = session.export_svg();
        assert!(svg.contains("Users"));
        assert!(svg.contains("Orders"));
        assert!(svg.contains("marker-end"));
    }
}
