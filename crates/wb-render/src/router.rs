//! Connection routing: anchor selection, bezier geometry, arrowheads.
//!
//! The router only reads entity geometry. It never mutates the board; the
//! store caches its anchor choice in `Connection::routed` after bulk moves
//! and drops that cache whenever geometry changes.
//!
//! All geometry is produced in world space. Renderers map it to the screen
//! with the camera transform.

use kurbo::{CubicBez, ParamCurve, ParamCurveNearest, Point as KPoint};
use wb_core::{
    Anchor, AnchorPair, BoardState, Bounds, Camera, Connection, ConnectionKey, EntityId, Point,
};

/// Base control-point offset for the standard path.
pub const CONTROL_BASE_OFFSET: f64 = 50.0;
/// Cap on the control-point offset of the smooth path.
pub const SMOOTH_MAX_OFFSET: f64 = 100.0;
/// Arrowhead length along the anchor normal.
pub const ARROW_SIZE: f64 = 10.0;

/// Which control-point rule to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathVariant {
    /// `min(|dx|, |dy|) * 0.5 + 50`, used by the interactive canvas.
    #[default]
    Standard,
    /// `min(distance * 0.3, 100)`, used for frame screenshots.
    Smooth,
}

/// Everything a renderer or hit tester needs for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedConnection {
    pub key: ConnectionKey,
    /// Index into `BoardState::connections`; duplicates share a key.
    pub index: usize,
    pub anchors: AnchorPair,
    pub curve: CubicBez,
    pub arrow: [KPoint; 3],
    pub label_pos: KPoint,
}

/// Pick the anchor pair from the relative position of the two centers.
///
/// Horizontal wins only when `|dx| > |dy|`; ties go vertical. With
/// coincident centers the result is `(top, bottom)` from either side.
pub fn optimal_anchors(from: &Bounds, to: &Bounds) -> AnchorPair {
    let a = from.center();
    let b = to.center();
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() > dy.abs() {
        if dx > 0.0 {
            AnchorPair {
                from: Anchor::Right,
                to: Anchor::Left,
            }
        } else {
            AnchorPair {
                from: Anchor::Left,
                to: Anchor::Right,
            }
        }
    } else if dy > 0.0 {
        AnchorPair {
            from: Anchor::Bottom,
            to: Anchor::Top,
        }
    } else {
        AnchorPair {
            from: Anchor::Top,
            to: Anchor::Bottom,
        }
    }
}

/// Anchors used for a self-loop so the curve arcs outside the card.
pub const SELF_LOOP_ANCHORS: AnchorPair = AnchorPair {
    from: Anchor::Right,
    to: Anchor::Top,
};

/// Anchors a connection is drawn with: user-locked anchors first, then the
/// cached router choice, then a fresh computation.
pub fn effective_anchors(conn: &Connection, from: &Bounds, to: &Bounds) -> AnchorPair {
    let auto = conn.routed.unwrap_or_else(|| {
        if conn.is_self_loop() {
            SELF_LOOP_ANCHORS
        } else {
            optimal_anchors(from, to)
        }
    });
    AnchorPair {
        from: conn.from_anchor.unwrap_or(auto.from),
        to: conn.to_anchor.unwrap_or(auto.to),
    }
}

/// World-space box a connection endpoint attaches to. Members of a
/// collapsed frame attach to that frame's pill. `None` if the id is gone.
pub fn endpoint_bounds(state: &BoardState, id: EntityId, camera: &Camera) -> Option<Bounds> {
    if let Some(node) = state.node(id) {
        if let Some(frame) = node
            .container_id
            .and_then(|fid| state.frame(fid))
            .filter(|f| f.collapsed)
        {
            return Some(frame.pill_bounds());
        }
        return Some(node.world_bounds(camera));
    }
    state.frame(id).map(|f| f.visible_bounds())
}

/// Cubic bezier from `from` to `to`, leaving and entering perpendicular to
/// the anchored edges.
pub fn bezier_path(
    from: Point,
    to: Point,
    from_anchor: Anchor,
    to_anchor: Anchor,
    variant: PathVariant,
) -> CubicBez {
    let p0 = kp(from);
    let p3 = kp(to);
    let dx = (p3.x - p0.x).abs();
    let dy = (p3.y - p0.y).abs();
    let offset = match variant {
        PathVariant::Standard => dx.min(dy) * 0.5 + CONTROL_BASE_OFFSET,
        PathVariant::Smooth => (p0.distance(p3) * 0.3).min(SMOOTH_MAX_OFFSET),
    };
    CubicBez::new(
        p0,
        push_out(p0, from_anchor, offset),
        push_out(p3, to_anchor, offset),
        p3,
    )
}

/// Isoceles arrowhead whose tip sits on `tip`, pointing into the card
/// through the `to_anchor` edge. Returns `[tip, left, right]`.
pub fn arrowhead(tip: Point, to_anchor: Anchor, size: f64) -> [KPoint; 3] {
    let tip = kp(tip);
    let (nx, ny) = to_anchor.normal();
    let (nx, ny) = (nx as f64, ny as f64);
    let base = KPoint::new(tip.x + nx * size, tip.y + ny * size);
    let half = size * 0.6;
    // Perpendicular to the normal.
    let (px, py) = (-ny, nx);
    [
        tip,
        KPoint::new(base.x + px * half, base.y + py * half),
        KPoint::new(base.x - px * half, base.y - py * half),
    ]
}

/// Route one connection. `None` when an endpoint cannot be resolved, or
/// when both endpoints are hidden inside the same collapsed frame.
pub fn route_connection(
    state: &BoardState,
    index: usize,
    camera: &Camera,
    variant: PathVariant,
) -> Option<RoutedConnection> {
    let conn = state.connections.get(index)?;
    let from_b = endpoint_bounds(state, conn.from, camera)?;
    let to_b = endpoint_bounds(state, conn.to, camera)?;
    if !conn.is_self_loop() && from_b == to_b && collapsed_together(state, conn) {
        return None;
    }

    let anchors = effective_anchors(conn, &from_b, &to_b);
    let from = anchors.from.position_on(&from_b);
    let to = anchors.to.position_on(&to_b);
    let curve = bezier_path(from, to, anchors.from, anchors.to, variant);
    Some(RoutedConnection {
        key: conn.key(),
        index,
        anchors,
        label_pos: curve.eval(0.5),
        arrow: arrowhead(to, anchors.to, ARROW_SIZE),
        curve,
    })
}

/// Route every resolvable connection, skipping the rest.
pub fn route_all(
    state: &BoardState,
    camera: &Camera,
    variant: PathVariant,
) -> Vec<RoutedConnection> {
    (0..state.connections.len())
        .filter_map(|i| {
            let routed = route_connection(state, i, camera, variant);
            if routed.is_none() {
                log::trace!("skipping unroutable connection #{i}");
            }
            routed
        })
        .collect()
}

/// Closest of the four anchors of `bounds` to `pointer`, with its distance.
pub fn nearest_anchor(bounds: &Bounds, pointer: Point) -> (Anchor, f32) {
    Anchor::ALL
        .iter()
        .map(|&a| (a, a.position_on(bounds).distance(pointer)))
        .fold((Anchor::Top, f32::INFINITY), |best, cand| {
            if cand.1 < best.1 { cand } else { best }
        })
}

/// Anchor a dragged endpoint should lock to: the nearest one when within
/// `threshold`, otherwise the previously locked anchor.
pub fn snap_anchor(bounds: &Bounds, pointer: Point, threshold: f32, locked: Anchor) -> Anchor {
    let (nearest, dist) = nearest_anchor(bounds, pointer);
    if dist <= threshold { nearest } else { locked }
}

/// Topmost connection within `tolerance` world units of `point`.
pub fn hit_test_connection(
    routes: &[RoutedConnection],
    point: Point,
    tolerance: f32,
) -> Option<&RoutedConnection> {
    let p = kp(point);
    let tol_sq = (tolerance as f64).powi(2);
    routes
        .iter()
        .rev()
        .find(|r| r.curve.nearest(p, 0.1).distance_sq <= tol_sq)
}

fn collapsed_together(state: &BoardState, conn: &Connection) -> bool {
    let container = |id| state.node(id).and_then(|n| n.container_id);
    match (container(conn.from), container(conn.to)) {
        (Some(a), Some(b)) if a == b => state.frame(a).is_some_and(|f| f.collapsed),
        _ => false,
    }
}

fn push_out(p: KPoint, anchor: Anchor, offset: f64) -> KPoint {
    let (nx, ny) = anchor.normal();
    KPoint::new(p.x + nx as f64 * offset, p.y + ny as f64 * offset)
}

/// Convert a board point to kurbo.
pub fn kp(p: Point) -> KPoint {
    KPoint::new(p.x as f64, p.y as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::{BackgroundFrame, Node};

    fn two_nodes() -> (BoardState, EntityId, EntityId) {
        let a = EntityId::intern("r_a");
        let b = EntityId::intern("r_b");
        let mut state = BoardState::default();
        state.nodes.push(Node::new(a, 0.0, 0.0, 100.0, 50.0));
        state.nodes.push(Node::new(b, 300.0, 0.0, 100.0, 50.0));
        state.connections.push(Connection::new(a, b));
        (state, a, b)
    }

    #[test]
    fn side_by_side_nodes_use_right_left() {
        let (state, _, _) = two_nodes();
        let r = route_connection(&state, 0, &Camera::default(), PathVariant::Standard).unwrap();
        assert_eq!(r.anchors.from, Anchor::Right);
        assert_eq!(r.anchors.to, Anchor::Left);
        assert_eq!(r.curve.p0, KPoint::new(100.0, 25.0));
        assert_eq!(r.curve.p3, KPoint::new(300.0, 25.0));
        // min(|dx|, |dy|) = 0, so the offset is the base 50.
        assert_eq!(r.curve.p1, KPoint::new(150.0, 25.0));
        assert_eq!(r.curve.p2, KPoint::new(250.0, 25.0));
    }

    #[test]
    fn ties_resolve_vertically() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(100.0, 100.0, 10.0, 10.0);
        let pair = optimal_anchors(&a, &b);
        assert_eq!((pair.from, pair.to), (Anchor::Bottom, Anchor::Top));
    }

    #[test]
    fn user_anchor_survives_cached_route() {
        let (mut state, _, _) = two_nodes();
        state.connections[0].to_anchor = Some(Anchor::Bottom);
        state.connections[0].routed = Some(AnchorPair {
            from: Anchor::Top,
            to: Anchor::Top,
        });
        let r = route_connection(&state, 0, &Camera::default(), PathVariant::Standard).unwrap();
        assert_eq!(r.anchors.from, Anchor::Top);
        assert_eq!(r.anchors.to, Anchor::Bottom);
    }

    #[test]
    fn smooth_offset_is_capped() {
        let c = bezier_path(
            Point::new(0.0, 0.0),
            Point::new(1000.0, 0.0),
            Anchor::Right,
            Anchor::Left,
            PathVariant::Smooth,
        );
        assert_eq!(c.p1, KPoint::new(100.0, 0.0));
        let short = bezier_path(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Anchor::Right,
            Anchor::Left,
            PathVariant::Smooth,
        );
        assert!((short.p1.x - 30.0).abs() < 1e-9);
    }

    #[test]
    fn arrowhead_points_into_card() {
        let [tip, l, r] = arrowhead(Point::new(300.0, 25.0), Anchor::Left, ARROW_SIZE);
        assert_eq!(tip, KPoint::new(300.0, 25.0));
        // Base lies outside the left edge.
        assert_eq!(l.x, 290.0);
        assert_eq!(r.x, 290.0);
        assert!((l.y - r.y).abs() > 1.0);
    }

    #[test]
    fn dangling_connection_is_skipped() {
        let (mut state, a, _) = two_nodes();
        state
            .connections
            .push(Connection::new(a, EntityId::intern("r_missing")));
        let routes = route_all(&state, &Camera::default(), PathVariant::Standard);
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn collapsed_frame_attaches_to_pill() {
        let (mut state, a, _) = two_nodes();
        let f = EntityId::intern("r_frame");
        let mut frame = BackgroundFrame::new(f, 0.0, 400.0, 400.0, 200.0);
        frame.title = "Group".into();
        frame.collapsed = true;
        let pill = frame.pill_bounds();
        state.frames.push(frame);
        state.connections.push(Connection::new(a, f));

        let r = route_connection(&state, 1, &Camera::default(), PathVariant::Standard).unwrap();
        assert_eq!(r.anchors.to, Anchor::Top);
        assert_eq!(r.curve.p3, kp(Anchor::Top.position_on(&pill)));
    }

    #[test]
    fn anchor_snapping_threshold() {
        let b = Bounds::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            snap_anchor(&b, Point::new(95.0, 30.0), 30.0, Anchor::Top),
            Anchor::Right
        );
        assert_eq!(
            snap_anchor(&b, Point::new(500.0, 500.0), 30.0, Anchor::Top),
            Anchor::Top
        );
    }

    #[test]
    fn connection_hit_testing() {
        let (state, _, _) = two_nodes();
        let routes = route_all(&state, &Camera::default(), PathVariant::Standard);
        assert!(hit_test_connection(&routes, Point::new(200.0, 27.0), 5.0).is_some());
        assert!(hit_test_connection(&routes, Point::new(200.0, 80.0), 5.0).is_none());
    }
}
