//! Board → Vello drawing commands.
//!
//! Frames paint first, then connections, then free nodes, then pinned
//! nodes. World-space geometry goes through the camera affine; pinned nodes
//! are painted in screen space with the identity transform.

use crate::router::{PathVariant, RoutedConnection, route_all};
use kurbo::{Affine, BezPath, Cap, Join, Rect, RoundedRect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use vello::Scene;
use wb_core::{
    BackgroundFrame, BoardState, Bounds, Camera, ConnectionKey, EntityId, LineStyle, Node,
};

const NODE_RADIUS: f64 = 8.0;
const NODE_BORDER: f64 = 1.0;
const SELECTED_BORDER: f64 = 2.5;
const CONNECTION_WIDTH: f64 = 2.0;
const DASH_PATTERN: [f64; 2] = [8.0, 6.0];

/// Per-frame UI state the painter needs besides the board itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaintContext<'a> {
    pub selected_nodes: &'a [EntityId],
    pub selected_frames: &'a [EntityId],
    /// Connections to draw in the flow-highlight color.
    pub flow: &'a [ConnectionKey],
}

/// Paint the whole board. Call once per frame with a freshly-cleared
/// `Scene`; the host presents it.
pub fn paint_board(scene: &mut Scene, state: &BoardState, ctx: &PaintContext<'_>) {
    let camera = state.view.camera();
    let view = camera_affine(&camera);

    for frame in &state.frames {
        paint_frame(scene, view, frame, ctx.selected_frames.contains(&frame.id));
    }

    for routed in route_all(state, &camera, PathVariant::Standard) {
        paint_connection(scene, view, state, &routed, ctx);
    }

    let visible = state.nodes.iter().filter(|n| !state.is_hidden(n));
    for node in visible.clone().filter(|n| !n.pinned) {
        paint_node(scene, view, node.bounds(), node, ctx);
    }
    for node in visible.filter(|n| n.pinned) {
        paint_node(scene, Affine::IDENTITY, node.screen_bounds(&camera), node, ctx);
    }
}

/// World → screen as a Vello transform.
pub fn camera_affine(camera: &Camera) -> Affine {
    Affine::translate((camera.pan_x as f64, camera.pan_y as f64))
        * Affine::scale(camera.scale as f64)
}

// ─── Entity painters ─────────────────────────────────────────────────────────

fn paint_frame(scene: &mut Scene, view: Affine, frame: &BackgroundFrame, selected: bool) {
    let style = &frame.style;
    let border = to_peniko(style.border_color);
    let (shape, radius) = if frame.collapsed {
        let pill = frame.pill_bounds();
        (pill, pill.height as f64 / 2.0)
    } else {
        (frame.bounds(), style.border_radius as f64)
    };
    let shape = rounded(&shape, radius);

    let fill = if frame.collapsed {
        Color::from_rgba8(255, 255, 255, 255)
    } else {
        to_peniko(style.background_color)
    };
    scene.fill(Fill::NonZero, view, fill, None, &shape);

    let width = if selected {
        style.border_width as f64 + 1.0
    } else {
        style.border_width as f64
    };
    scene.stroke(&KurboStroke::new(width), view, border, None, &shape);

    if !frame.title.is_empty() {
        // Text shaping needs a font context the host owns.
        log::trace!("frame title {:?} at ({}, {})", frame.title, frame.x, frame.y);
    }
}

fn paint_node(
    scene: &mut Scene,
    transform: Affine,
    b: Bounds,
    node: &Node,
    ctx: &PaintContext<'_>,
) {
    let shape = rounded(&b, NODE_RADIUS);
    let fill = node.color.map(to_peniko).unwrap_or(Color::from_rgba8(255, 255, 255, 255));
    scene.fill(Fill::NonZero, transform, fill, None, &shape);

    let (width, color) = if ctx.selected_nodes.contains(&node.id) {
        (SELECTED_BORDER, Color::from_rgba8(59, 130, 246, 255))
    } else {
        (NODE_BORDER, Color::from_rgba8(203, 213, 225, 255))
    };
    scene.stroke(&KurboStroke::new(width), transform, color, None, &shape);
}

fn paint_connection(
    scene: &mut Scene,
    view: Affine,
    state: &BoardState,
    routed: &RoutedConnection,
    ctx: &PaintContext<'_>,
) {
    let Some(conn) = state.connections.get(routed.index) else {
        return;
    };
    let color = if conn.selected {
        Color::from_rgba8(59, 130, 246, 255)
    } else if ctx.flow.contains(&routed.key) {
        Color::from_rgba8(245, 158, 11, 255)
    } else {
        conn.color
            .map(to_peniko)
            .unwrap_or(Color::from_rgba8(100, 116, 139, 255))
    };

    let mut stroke = KurboStroke {
        width: CONNECTION_WIDTH,
        join: Join::Round,
        start_cap: Cap::Round,
        end_cap: Cap::Round,
        ..Default::default()
    };
    if conn.style == LineStyle::Dashed {
        stroke = stroke.with_dashes(0.0, DASH_PATTERN);
    }

    let mut path = BezPath::new();
    path.move_to(routed.curve.p0);
    path.curve_to(routed.curve.p1, routed.curve.p2, routed.curve.p3);
    scene.stroke(&stroke, view, color, None, &path);

    let [tip, left, right] = routed.arrow;
    let mut arrow = BezPath::new();
    arrow.move_to(tip);
    arrow.line_to(left);
    arrow.line_to(right);
    arrow.close_path();
    scene.fill(Fill::NonZero, view, color, None, &arrow);

    if let Some(label) = &conn.label {
        log::trace!("connection label {label:?} at {:?}", routed.label_pos);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn rounded(b: &Bounds, radius: f64) -> RoundedRect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        b.right() as f64,
        b.bottom() as f64,
    )
    .to_rounded_rect(radius)
}

fn to_peniko(c: wb_core::Color) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point as KPoint;
    use wb_core::{Connection, Point};

    #[test]
    fn camera_affine_matches_world_to_screen() {
        let camera = Camera::new(2.0, 30.0, -10.0);
        let p = camera_affine(&camera) * KPoint::new(5.0, 7.0);
        let expected = camera.world_to_screen(Point::new(5.0, 7.0));
        assert!((p.x - expected.x as f64).abs() < 1e-6);
        assert!((p.y - expected.y as f64).abs() < 1e-6);
    }

    #[test]
    fn paints_every_entity_kind() {
        let a = EntityId::intern("p_a");
        let b = EntityId::intern("p_b");
        let f = EntityId::intern("p_frame");
        let mut state = BoardState::default();
        state.frames.push(BackgroundFrame::new(f, -50.0, -50.0, 600.0, 300.0));
        state.nodes.push(Node::new(a, 0.0, 0.0, 100.0, 50.0));
        let mut pinned = Node::new(b, 0.0, 0.0, 100.0, 50.0);
        pinned.pinned = true;
        pinned.pinned_x = Some(10.0);
        pinned.pinned_y = Some(10.0);
        state.nodes.push(pinned);
        let mut dashed = Connection::new(a, b);
        dashed.style = LineStyle::Dashed;
        state.connections.push(dashed);

        let mut scene = Scene::new();
        let selected = [a];
        paint_board(
            &mut scene,
            &state,
            &PaintContext {
                selected_nodes: &selected,
                ..Default::default()
            },
        );
        assert!(!scene.encoding().is_empty());
    }
}
