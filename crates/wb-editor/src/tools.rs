//! Tool system for canvas interactions.
//!
//! Each tool is a small pointer state machine: `PointerDown` captures the
//! gesture's starting state, every `PointerMove` applies a store mutation,
//! and `PointerUp` finalizes. Drags that mutate the board run inside one
//! undo batch, so a whole gesture undoes in one step.
//!
//! Pointer coordinates arrive in screen space and are mapped to world space
//! through the board camera before any hit test.
//!
//! | Gesture | Owner |
//! |---------|-------|
//! | Press near a selected connection's endpoint | `AnchorDragTool` |
//! | Press on a frame corner | `FrameResizeTool` |
//! | Press anywhere else | active tool (`Select`, `Connect`, `Pan`) |

use crate::input::{InputEvent, Modifiers};
use crate::store::Board;
use wb_core::{Anchor, ConnectionKey, EntityId, Point};
use wb_render::router::endpoint_bounds;
use wb_render::{
    Corner, Hit, PathVariant, frame_corner_at, hit_test_connection, nearest_anchor, snap_anchor,
};

/// Grab radius for handles, in screen pixels.
pub const HANDLE_RADIUS: f32 = 8.0;

/// Which tool interprets a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    Connect,
    AnchorDrag,
    FrameResize,
    Pan,
}

/// Trait for tools that turn input into store mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle a pointer event. Returns true when the board needs a redraw.
    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool;
}

fn world_of(board: &Board, event: &InputEvent) -> Option<Point> {
    event.position().map(|p| board.camera().screen_to_world(p))
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum SelectGesture {
    Idle,
    /// Dragging the selection; `last` is the previous world point.
    Moving { last: Point, moved: bool },
    Marquee,
}

/// Click to select, drag to move, drag on empty space to marquee.
#[derive(Debug, Clone)]
pub struct SelectTool {
    gesture: SelectGesture,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            gesture: SelectGesture::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, SelectGesture::Moving { .. })
    }

    fn press(&mut self, board: &mut Board, world: Point, modifiers: Modifiers) -> bool {
        match board.hit_test(world) {
            Some(Hit::Node(id)) => {
                if modifiers.shift {
                    board.toggle_node_selection(id);
                } else if !board.selection().has_node(id) {
                    board.select_node(id);
                }
                self.begin_move(board, world);
            }
            Some(Hit::Frame(id)) => {
                if modifiers.shift {
                    board.toggle_frame_selection(id);
                } else if !board.selection().has_frame(id) {
                    board.select_background_frame(id);
                }
                self.begin_move(board, world);
            }
            None => {
                let tolerance = HANDLE_RADIUS / board.camera().scale;
                let routes = board.routes(PathVariant::Standard);
                if let Some(route) = hit_test_connection(&routes, world, tolerance) {
                    board.select_connection(route.key);
                    return true;
                }
                board.start_marquee(world, modifiers.shift);
                self.gesture = SelectGesture::Marquee;
            }
        }
        true
    }

    fn begin_move(&mut self, board: &mut Board, world: Point) {
        board.begin_batch("drag");
        self.gesture = SelectGesture::Moving {
            last: world,
            moved: false,
        };
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        let Some(world) = world_of(board, event) else {
            return false;
        };
        match event {
            InputEvent::PointerDown { modifiers, .. } => self.press(board, world, *modifiers),
            InputEvent::PointerMove { .. } => match self.gesture {
                SelectGesture::Moving { last, .. } => {
                    let (dx, dy) = (world.x - last.x, world.y - last.y);
                    if dx == 0.0 && dy == 0.0 {
                        return false;
                    }
                    board.move_selection(dx, dy);
                    self.gesture = SelectGesture::Moving {
                        last: world,
                        moved: true,
                    };
                    true
                }
                SelectGesture::Marquee => board.update_marquee(world).is_some(),
                SelectGesture::Idle => false,
            },
            InputEvent::PointerUp { .. } => {
                let gesture = std::mem::replace(&mut self.gesture, SelectGesture::Idle);
                match gesture {
                    SelectGesture::Moving { moved, .. } => {
                        if moved {
                            board.optimize_connections();
                        }
                        board.end_batch();
                        moved
                    }
                    SelectGesture::Marquee => {
                        board.end_marquee();
                        true
                    }
                    SelectGesture::Idle => false,
                }
            }
            _ => false,
        }
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct ConnectDraft {
    from: EntityId,
    from_anchor: Anchor,
    /// Where the rubber line currently ends, in world space.
    current: Point,
}

/// Drag from one entity to another to draw a connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectTool {
    draft: Option<ConnectDraft>,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rubber line being drawn: source anchor position and pointer.
    pub fn draft_line(&self, board: &Board) -> Option<(Point, Point)> {
        let draft = self.draft?;
        let b = endpoint_bounds(board.state(), draft.from, &board.camera())?;
        Some((draft.from_anchor.position_on(&b), draft.current))
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        let Some(world) = world_of(board, event) else {
            return false;
        };
        let camera = board.camera();
        match event {
            InputEvent::PointerDown { .. } => {
                let Some(hit) = board.hit_test(world) else {
                    return false;
                };
                let Some(b) = endpoint_bounds(board.state(), hit.id(), &camera) else {
                    return false;
                };
                self.draft = Some(ConnectDraft {
                    from: hit.id(),
                    from_anchor: nearest_anchor(&b, world).0,
                    current: world,
                });
                true
            }
            InputEvent::PointerMove { .. } => match self.draft.as_mut() {
                Some(draft) => {
                    draft.current = world;
                    true
                }
                None => false,
            },
            InputEvent::PointerUp { .. } => {
                let Some(draft) = self.draft.take() else {
                    return false;
                };
                let target = board.hit_test(world).and_then(|hit| {
                    let bounds = endpoint_bounds(board.state(), hit.id(), &camera)?;
                    Some((hit.id(), bounds))
                });
                match target {
                    Some((to, b)) => {
                        let to_anchor = nearest_anchor(&b, world).0;
                        board.add_connection(
                            draft.from,
                            to,
                            Some(draft.from_anchor),
                            Some(to_anchor),
                        );
                    }
                    None => log::trace!("connection from {} cancelled", draft.from),
                }
                true
            }
            _ => false,
        }
    }
}

// ─── Anchor Drag Tool ────────────────────────────────────────────────────

/// Which end of a connection is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnchorGrab {
    key: ConnectionKey,
    end: End,
    /// Locked anchor of the other end, kept as the user had it.
    other: Option<Anchor>,
    locked: Anchor,
}

/// Drag an endpoint of a selected connection around its entity; the anchor
/// snaps to the nearest edge midpoint within the snap threshold.
#[derive(Debug, Clone, Default)]
pub struct AnchorDragTool {
    grab: Option<AnchorGrab>,
}

impl AnchorDragTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint of a selected connection within the handle radius.
    pub fn endpoint_at(board: &Board, world: Point) -> Option<(ConnectionKey, End, Anchor)> {
        let radius = HANDLE_RADIUS / board.camera().scale;
        board
            .routes(PathVariant::Standard)
            .into_iter()
            .filter(|r| board.state().connections.get(r.index).is_some_and(|c| c.selected))
            .find_map(|r| {
                let near = |p: kurbo::Point| {
                    Point::new(p.x as f32, p.y as f32).distance(world) <= radius
                };
                if near(r.curve.p3) {
                    Some((r.key, End::To, r.anchors.to))
                } else if near(r.curve.p0) {
                    Some((r.key, End::From, r.anchors.from))
                } else {
                    None
                }
            })
    }
}

impl Tool for AnchorDragTool {
    fn kind(&self) -> ToolKind {
        ToolKind::AnchorDrag
    }

    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        let Some(world) = world_of(board, event) else {
            return false;
        };
        match event {
            InputEvent::PointerDown { .. } => {
                let Some((key, end, locked)) = Self::endpoint_at(board, world) else {
                    return false;
                };
                let Some(conn) = board.state().connections.iter().find(|c| c.matches(key)) else {
                    return false;
                };
                let other = match end {
                    End::From => conn.to_anchor,
                    End::To => conn.from_anchor,
                };
                board.begin_batch("drag anchor");
                self.grab = Some(AnchorGrab {
                    key,
                    end,
                    other,
                    locked,
                });
                true
            }
            InputEvent::PointerMove { .. } => {
                let Some(grab) = self.grab.as_mut() else {
                    return false;
                };
                let entity = match grab.end {
                    End::From => grab.key.from,
                    End::To => grab.key.to,
                };
                let Some(b) = endpoint_bounds(board.state(), entity, &board.camera()) else {
                    return false;
                };
                let threshold = board.config().anchor_snap_threshold;
                let snapped = snap_anchor(&b, world, threshold, grab.locked);
                let current = board
                    .state()
                    .connections
                    .iter()
                    .find(|c| c.matches(grab.key))
                    .and_then(|c| match grab.end {
                        End::From => c.from_anchor,
                        End::To => c.to_anchor,
                    });
                if current == Some(snapped) {
                    return false;
                }
                grab.locked = snapped;
                let (from, to) = match grab.end {
                    End::From => (Some(snapped), grab.other),
                    End::To => (grab.other, Some(snapped)),
                };
                board.set_connection_anchors(grab.key, from, to);
                true
            }
            InputEvent::PointerUp { .. } => {
                if self.grab.take().is_some() {
                    board.end_batch();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

// ─── Frame Resize Tool ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeGrab {
    frame: EntityId,
    corner: Corner,
    original: wb_core::Bounds,
}

/// Drag a frame corner; the store clamps the result around the members.
#[derive(Debug, Clone, Default)]
pub struct FrameResizeTool {
    grab: Option<ResizeGrab>,
}

impl FrameResizeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corner_at(board: &Board, world: Point) -> Option<(EntityId, Corner)> {
        frame_corner_at(board.state(), world, HANDLE_RADIUS / board.camera().scale)
    }
}

impl Tool for FrameResizeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FrameResize
    }

    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        let Some(world) = world_of(board, event) else {
            return false;
        };
        match event {
            InputEvent::PointerDown { .. } => {
                let Some((frame, corner)) = Self::corner_at(board, world) else {
                    return false;
                };
                let Some(original) = board.state().frame(frame).map(|f| f.bounds()) else {
                    return false;
                };
                board.begin_batch("resize frame");
                board.select_background_frame(frame);
                self.grab = Some(ResizeGrab {
                    frame,
                    corner,
                    original,
                });
                true
            }
            InputEvent::PointerMove { .. } => match self.grab {
                Some(grab) => {
                    let requested = grab.corner.drag(&grab.original, world);
                    board.resize_background_frame(grab.frame, requested)
                }
                None => false,
            },
            InputEvent::PointerUp { .. } => {
                if self.grab.take().is_some() {
                    board.end_batch();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

// ─── Pan Tool ────────────────────────────────────────────────────────────

/// Drag to move the camera.
#[derive(Debug, Clone, Default)]
pub struct PanTool {
    last: Option<Point>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        let Some(screen) = event.position() else {
            return false;
        };
        match event {
            InputEvent::PointerDown { .. } => {
                self.last = Some(screen);
                false
            }
            InputEvent::PointerMove { .. } => match self.last.replace(screen) {
                Some(last) => {
                    board.pan_by(screen.x - last.x, screen.y - last.y);
                    true
                }
                None => {
                    self.last = None;
                    false
                }
            },
            InputEvent::PointerUp { .. } => self.last.take().is_some(),
            _ => false,
        }
    }
}

// ─── Controller ──────────────────────────────────────────────────────────

/// Owns every tool and routes each pointer gesture to one of them.
#[derive(Debug, Clone)]
pub struct ToolController {
    active: ToolKind,
    /// Tool that owns the gesture in progress, if any.
    gesture: Option<ToolKind>,
    pub select: SelectTool,
    pub connect: ConnectTool,
    pub anchor_drag: AnchorDragTool,
    pub frame_resize: FrameResizeTool,
    pub pan: PanTool,
}

impl Default for ToolController {
    fn default() -> Self {
        Self {
            active: ToolKind::Select,
            gesture: None,
            select: SelectTool::new(),
            connect: ConnectTool::new(),
            anchor_drag: AnchorDragTool::new(),
            frame_resize: FrameResizeTool::new(),
            pan: PanTool::new(),
        }
    }
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    /// Switch the active tool. Only `Select`, `Connect` and `Pan` can be
    /// active; the handle tools are picked per gesture.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if matches!(kind, ToolKind::Select | ToolKind::Connect | ToolKind::Pan) {
            self.active = kind;
        }
    }

    /// Rubber line of an in-progress connection, for the renderer.
    pub fn draft_line(&self, board: &Board) -> Option<(Point, Point)> {
        self.connect.draft_line(board)
    }

    /// Route an event. Returns true when the board needs a redraw.
    pub fn handle(&mut self, board: &mut Board, event: &InputEvent) -> bool {
        match event {
            InputEvent::Wheel { x, y, dx, dy, zoom } => {
                if *zoom != 1.0 {
                    board.zoom_at(Point::new(*x, *y), *zoom);
                } else {
                    board.pan_by(-dx, -dy);
                }
                true
            }
            InputEvent::Key { .. } => false,
            InputEvent::PointerDown { .. } => {
                let owner = self.pick_owner(board, event);
                self.gesture = Some(owner);
                self.tool_mut(owner).handle(board, event)
            }
            InputEvent::PointerMove { .. } => {
                let owner = self.gesture.unwrap_or(self.active);
                self.tool_mut(owner).handle(board, event)
            }
            InputEvent::PointerUp { .. } => {
                let owner = self.gesture.take().unwrap_or(self.active);
                self.tool_mut(owner).handle(board, event)
            }
        }
    }

    fn pick_owner(&self, board: &Board, event: &InputEvent) -> ToolKind {
        if self.active != ToolKind::Select {
            return self.active;
        }
        let Some(world) = world_of(board, event) else {
            return self.active;
        };
        if AnchorDragTool::endpoint_at(board, world).is_some() {
            ToolKind::AnchorDrag
        } else if FrameResizeTool::corner_at(board, world).is_some() {
            ToolKind::FrameResize
        } else {
            ToolKind::Select
        }
    }

    fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Select => &mut self.select,
            ToolKind::Connect => &mut self.connect,
            ToolKind::AnchorDrag => &mut self.anchor_drag,
            ToolKind::FrameResize => &mut self.frame_resize,
            ToolKind::Pan => &mut self.pan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::Bounds;

    fn drag(ctl: &mut ToolController, board: &mut Board, from: (f32, f32), to: (f32, f32)) {
        ctl.handle(board, &InputEvent::down(from.0, from.1));
        ctl.handle(board, &InputEvent::moved((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        ctl.handle(board, &InputEvent::moved(to.0, to.1));
        ctl.handle(board, &InputEvent::up(to.0, to.1));
    }

    #[test]
    fn drag_moves_node_in_one_undo_step() {
        let mut board = Board::default();
        let id = board.add_node(0.0, 0.0);
        board.clear_selection();
        let mut ctl = ToolController::new();
        drag(&mut ctl, &mut board, (10.0, 10.0), (110.0, 60.0));

        let n = board.state().node(id).unwrap();
        assert_eq!((n.x, n.y), (100.0, 50.0));
        assert_eq!(board.selection().nodes, vec![id]);
        board.undo();
        let n = board.state().node(id).unwrap();
        assert_eq!((n.x, n.y), (0.0, 0.0));
    }

    #[test]
    fn drag_on_empty_space_marquees() {
        let mut board = Board::default();
        let id = board.add_node(100.0, 100.0);
        board.clear_selection();
        let mut ctl = ToolController::new();
        drag(&mut ctl, &mut board, (50.0, 50.0), (400.0, 300.0));
        assert_eq!(board.selection().nodes, vec![id]);
        assert!(board.marquee().is_none());
    }

    #[test]
    fn click_on_connection_selects_it() {
        let mut board = Board::default();
        let a = board.add_node(0.0, 0.0);
        let b = board.add_node(400.0, 0.0);
        board.add_connection(a, b, None, None);
        let mut ctl = ToolController::new();
        // Both anchors sit at y = 75, so the curve runs flat between them.
        ctl.handle(&mut board, &InputEvent::down(325.0, 75.0));
        ctl.handle(&mut board, &InputEvent::up(325.0, 75.0));
        assert_eq!(board.selected_connections(), vec![ConnectionKey::new(a, b)]);
        assert!(board.marquee().is_none());
    }

    #[test]
    fn connect_tool_adds_connection_with_nearest_anchors() {
        let mut board = Board::default();
        let a = board.add_node(0.0, 0.0);
        let b = board.add_node(400.0, 0.0);
        let mut ctl = ToolController::new();
        ctl.set_tool(ToolKind::Connect);
        drag(&mut ctl, &mut board, (245.0, 75.0), (405.0, 75.0));

        let conn = &board.state().connections[0];
        assert_eq!(conn.key(), ConnectionKey::new(a, b));
        assert_eq!(conn.from_anchor, Some(Anchor::Right));
        assert_eq!(conn.to_anchor, Some(Anchor::Left));
    }

    #[test]
    fn connect_released_on_empty_space_cancels() {
        let mut board = Board::default();
        board.add_node(0.0, 0.0);
        let mut ctl = ToolController::new();
        ctl.set_tool(ToolKind::Connect);
        drag(&mut ctl, &mut board, (100.0, 75.0), (900.0, 900.0));
        assert!(board.state().connections.is_empty());
        assert!(ctl.draft_line(&board).is_none());
    }

    #[test]
    fn anchor_drag_snaps_within_threshold() {
        let mut board = Board::default();
        let a = board.add_node(0.0, 0.0);
        let b = board.add_node(400.0, 0.0);
        board.add_connection(a, b, None, None);
        let key = ConnectionKey::new(a, b);
        board.select_connection(key);
        let mut ctl = ToolController::new();

        // Grab the `to` end on b's left edge and drag it to b's top edge.
        ctl.handle(&mut board, &InputEvent::down(400.0, 75.0));
        ctl.handle(&mut board, &InputEvent::moved(520.0, 10.0));
        ctl.handle(&mut board, &InputEvent::up(520.0, 10.0));
        assert_eq!(board.state().connections[0].to_anchor, Some(Anchor::Top));
        assert_eq!(board.state().connections[0].from_anchor, None);
        assert!(board.undo().is_some());
        assert_eq!(board.state().connections[0].to_anchor, None);
    }

    #[test]
    fn frame_corner_drag_is_clamped() {
        let mut board = Board::default();
        let frame = board.create_background_frame(0.0, 0.0, 400.0, 300.0);
        let node = board.add_node(20.0, 20.0);
        board.assign_node_to_frame(node, frame);
        let mut ctl = ToolController::new();
        drag(&mut ctl, &mut board, (400.0, 300.0), (50.0, 50.0));
        // Node 250x150 at (20, 20) plus padding.
        assert_eq!(
            board.state().frame(frame).unwrap().bounds(),
            Bounds::new(0.0, 0.0, 290.0, 190.0)
        );
    }

    #[test]
    fn wheel_zooms_and_pans() {
        let mut board = Board::default();
        let mut ctl = ToolController::new();
        ctl.handle(
            &mut board,
            &InputEvent::Wheel {
                x: 0.0,
                y: 0.0,
                dx: 0.0,
                dy: 0.0,
                zoom: 2.0,
            },
        );
        assert_eq!(board.camera().scale, 2.0);
        ctl.handle(
            &mut board,
            &InputEvent::Wheel {
                x: 0.0,
                y: 0.0,
                dx: 10.0,
                dy: 5.0,
                zoom: 1.0,
            },
        );
        assert_eq!((board.camera().pan_x, board.camera().pan_y), (-10.0, -5.0));
    }

    #[test]
    fn pan_tool_moves_camera() {
        let mut board = Board::default();
        let mut ctl = ToolController::new();
        ctl.set_tool(ToolKind::Pan);
        drag(&mut ctl, &mut board, (0.0, 0.0), (30.0, 40.0));
        assert_eq!((board.camera().pan_x, board.camera().pan_y), (30.0, 40.0));
        ctl.set_tool(ToolKind::AnchorDrag);
        assert_eq!(ctl.active(), ToolKind::Pan);
    }
}
