//! Connector geometry and table placement over the normalized model.

mod placement;
mod routing;

pub use placement::Placement;
pub use routing::{Route, Router, facing_sides};

use crate::geometry::{Point, Rect, elbow_path, straight_path};
use crate::model::{ConnectorKind, LayoutRect, Model, Relationship};

/// Route a relationship from its endpoints' current rectangles.
///
/// `None` when it has fewer than two connect infos or either endpoint has no
/// layout.
pub fn route_relationship(model: &Model, rel: &Relationship, router: &Router) -> Option<Route> {
    let source = model.rect(&rel.source()?.ref_uuid)?;
    let target = model.rect(&rel.target()?.ref_uuid)?;
    Some(router.route(&source, &target, rel.style.kind))
}

/// Path data for drawing a relationship.
///
/// Routed from the endpoints when both resolve; otherwise drawn through the
/// stored vertices, offset by the relationship's own layout rectangle.
pub fn relationship_path(model: &Model, rel: &Relationship, router: &Router) -> Option<String> {
    if let Some(route) = route_relationship(model, rel, router) {
        return Some(route.to_path());
    }

    if rel.vertices.len() < 2 {
        return None;
    }
    let origin = model
        .rect(&rel.uuid)
        .map_or(Point::default(), |r| Point::new(r.x, r.y));
    let d = match rel.style.kind {
        ConnectorKind::Elbow => elbow_path(&rel.vertices, origin, rel.style.start_axis),
        ConnectorKind::Straight => straight_path(&rel.vertices, origin),
    };
    Some(d)
}

/// Store a freshly computed route on a relationship: its layout rectangle
/// becomes the padded bounding box of the anchors, vertices are kept
/// relative to that box, and connect-info sides are re-stamped.
pub fn apply_route(model: &mut Model, rel_uuid: &str, route: &Route, padding: f64) {
    let (Some(start), Some(end)) = (route.start(), route.end()) else {
        return;
    };
    let Some(bounds) = Rect::bounding(&[start, end], padding) else {
        return;
    };
    let Some(rel) = model.relationships.get_mut(rel_uuid) else {
        return;
    };

    rel.vertices = route
        .points
        .iter()
        .map(|p| Point::new(p.x - bounds.x, p.y - bounds.y))
        .collect();
    if let Some(info) = rel.connect_infos.get_mut(0) {
        info.side = Some(route.source_side);
    }
    if let Some(info) = rel.connect_infos.get_mut(1) {
        info.side = Some(route.target_side);
    }
    rel.geometry_changed = true;

    let name = rel.name.clone();
    model
        .layout
        .entry(rel_uuid.to_string())
        .and_modify(|l| l.rect = bounds)
        .or_insert_with(|| LayoutRect::new(&name, bounds));
}

/// Re-route every connector touching `table_uuid`. Returns the new routes.
pub fn reroute_table(
    model: &mut Model,
    table_uuid: &str,
    router: &Router,
    padding: f64,
) -> Vec<(String, Route)> {
    let rel_uuids = model.table_relationships.get(table_uuid).to_vec();
    let mut routes = Vec::with_capacity(rel_uuids.len());

    for rel_uuid in rel_uuids {
        let route = match model.relationships.get(&rel_uuid) {
            Some(rel) => route_relationship(model, rel, router),
            None => None,
        };
        if let Some(route) = route {
            apply_route(model, &rel_uuid, &route, padding);
            routes.push((rel_uuid, route));
        }
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Axis, Side};
    use crate::model::{ArrowStyle, ConnectInfo, ConnectorStyle};
    use crate::raw::Size;

    fn model_with_pair() -> Model {
        let mut model = Model::empty("D", Size::new(850.0, 1100.0), Size::new(4.0, 3.0));
        model
            .layout
            .insert("A".into(), LayoutRect::new("a", Rect::new(0.0, 0.0, 100.0, 100.0)));
        model
            .layout
            .insert("B".into(), LayoutRect::new("b", Rect::new(300.0, 0.0, 100.0, 100.0)));
        model.insert_relationship(Relationship {
            uuid: "R".into(),
            ref_uuid: None,
            name: "fk_a_b".into(),
            connect_infos: vec![ConnectInfo::new("A", Side::Top), ConnectInfo::new("B", Side::Top)],
            style: ConnectorStyle::default(),
            arrows: ArrowStyle::default(),
            vertices: vec![],
            geometry_changed: false,
        });
        model
    }

    #[test]
    fn test_reroute_updates_geometry() {
        let mut model = model_with_pair();
        let routes = reroute_table(&mut model, "A", &Router::default(), 50.0);
        assert_eq!(routes.len(), 1);

        let rel = &model.relationships["R"];
        assert!(rel.geometry_changed);
        assert_eq!(rel.connect_infos[0].side, Some(Side::Right));
        assert_eq!(rel.connect_infos[1].side, Some(Side::Left));
        // anchors (100,50) and (300,50) padded by 50
        assert_eq!(model.rect("R"), Some(Rect::new(50.0, 0.0, 300.0, 100.0)));
        assert_eq!(rel.vertices.first(), Some(&Point::new(50.0, 50.0)));
        assert_eq!(rel.vertices.last(), Some(&Point::new(250.0, 50.0)));
    }

    #[test]
    fn test_unrelated_table_routes_nothing() {
        let mut model = model_with_pair();
        assert!(reroute_table(&mut model, "C", &Router::default(), 50.0).is_empty());
        assert!(!model.relationships["R"].geometry_changed);
    }

    #[test]
    fn test_path_falls_back_to_vertices() {
        let mut model = model_with_pair();
        model.layout.shift_remove("B");
        model
            .layout
            .insert("R".into(), LayoutRect::new("fk_a_b", Rect::new(10.0, 20.0, 200.0, 100.0)));
        let rel = model.relationships.get_mut("R").unwrap();
        rel.vertices = vec![Point::new(0.0, 0.0), Point::new(40.0, 30.0)];
        rel.style.start_axis = Axis::Horizontal;

        let rel = model.relationships["R"].clone();
        let d = relationship_path(&model, &rel, &Router::default()).unwrap();
        assert_eq!(d, "M 10 20 L 50 20 L 50 50");
    }

    #[test]
    fn test_path_needs_geometry() {
        let mut model = model_with_pair();
        model.layout.shift_remove("B");
        let rel = model.relationships["R"].clone();
        assert!(relationship_path(&model, &rel, &Router::default()).is_none());
    }
}
