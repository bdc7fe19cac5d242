//! The Entity Store.
//!
//! `Board` owns the canonical node, connection and frame collections plus
//! the per-session UI state around them (selection, editing target,
//! marquee, viewport size, id counter and undo history). It is an explicit
//! value: construct one per canvas and hand references to renderers.
//!
//! Every mutating operation follows the same shape:
//!
//! 1. resolve its ids; unknown ids make the call a silent no-op,
//! 2. push an undo snapshot,
//! 3. mutate,
//! 4. run containment for exactly the frames whose members were touched.
//!
//! Selection, marquee and camera changes are not undo steps.

use crate::commands::History;
use smallvec::SmallVec;
use std::collections::HashSet;
use wb_core::containment::{
    self, clamp_frame_resize, expanded_to_contain, padded_member_bounds, refresh_member_cache,
};
use wb_core::lint::RepairReport;
use wb_core::snapshot;
use wb_core::{
    Anchor, BackgroundFrame, BackgroundMode, BoardConfig, BoardState, Bounds, Camera, Color,
    Connection, ConnectionKey, EntityId, FramePatch, IdGenerator, LineStyle, LintDiagnostic, Node,
    NodePatch, Point, SnapshotError, lint_board, repair_board,
};
use wb_render::router::{SELF_LOOP_ANCHORS, endpoint_bounds};
use wb_render::{
    Hit, MarqueeHits, PathVariant, RoutedConnection, downstream_connections, hit_test,
    marquee_select, optimal_anchors, route_all,
};

type FrameSet = SmallVec<[EntityId; 4]>;

// ─── Session state ───────────────────────────────────────────────────────

/// Selected nodes and frames. Connection selection is the `selected` flag
/// on each connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub nodes: Vec<EntityId>,
    pub frames: Vec<EntityId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.frames.is_empty()
    }

    pub fn has_node(&self, id: EntityId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn has_frame(&self, id: EntityId) -> bool {
        self.frames.contains(&id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.frames.clear();
    }

    fn add_node(&mut self, id: EntityId) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
    }

    fn add_frame(&mut self, id: EntityId) {
        if !self.frames.contains(&id) {
            self.frames.push(id);
        }
    }
}

/// An in-progress rubber-band drag, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    pub start: Point,
    pub end: Point,
    /// Selection to extend (shift-marquee) or empty.
    base: Selection,
}

impl Marquee {
    /// Normalized rectangle between the two corners.
    pub fn rect(&self) -> Bounds {
        Bounds::from_corners(self.start, self.end)
    }
}

/// Size of the screen area the board is shown in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

// ─── Board ───────────────────────────────────────────────────────────────

/// The single source of truth for one whiteboard.
#[derive(Debug, Clone)]
pub struct Board {
    state: BoardState,
    config: BoardConfig,
    selection: Selection,
    editing: Option<EntityId>,
    marquee: Option<Marquee>,
    viewport: Viewport,
    ids: IdGenerator,
    history: History,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            state: BoardState::default(),
            history: History::new(config.undo_depth),
            config,
            selection: Selection::default(),
            editing: None,
            marquee: None,
            viewport: Viewport::default(),
            ids: IdGenerator::new(),
        }
    }

    /// Build a board around existing state, repairing it first.
    pub fn from_state(state: BoardState, config: BoardConfig) -> Self {
        let mut board = Self::new(config);
        board.load_state(state);
        board
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The node whose content is being edited, if any.
    pub fn editing(&self) -> Option<EntityId> {
        self.editing
    }

    pub fn marquee(&self) -> Option<&Marquee> {
        self.marquee.as_ref()
    }

    pub fn camera(&self) -> Camera {
        self.state.view.camera()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Viewport {
            width: width.max(1.0),
            height: height.max(1.0),
        };
    }

    pub fn selected_connections(&self) -> Vec<ConnectionKey> {
        let mut keys: Vec<ConnectionKey> = self
            .state
            .connections
            .iter()
            .filter(|c| c.selected)
            .map(Connection::key)
            .collect();
        keys.dedup();
        keys
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Create a default-sized node with its top-left at a world point. The
    /// new node becomes the only selected entity and enters editing.
    pub fn add_node(&mut self, x: f32, y: f32) -> EntityId {
        self.push_undo("add node");
        let id = self.next_id("node");
        self.state.nodes.push(Node::new(
            id,
            x,
            y,
            self.config.default_node_width,
            self.config.default_node_height,
        ));
        self.select_only_node(id);
        self.editing = Some(id);
        log::debug!("added node {id} at ({x}, {y})");
        id
    }

    /// Add a node at the center of the visible area.
    pub fn add_node_at_view_center(&mut self) -> EntityId {
        let c = self.camera().screen_to_world(self.viewport.center());
        self.add_node(
            c.x - self.config.default_node_width / 2.0,
            c.y - self.config.default_node_height / 2.0,
        )
    }

    /// Merge `patch` into a node. A geometry change on a frame member runs
    /// containment for that frame.
    pub fn update_node(&mut self, id: EntityId, patch: NodePatch) -> bool {
        let Some(idx) = self.node_index(id) else {
            return false;
        };
        self.push_undo("update node");
        let node = &mut self.state.nodes[idx];
        let moved = patch.apply(node);
        let container = node.container_id;
        if moved {
            self.forget_routes();
            if let Some(fid) = container {
                self.settle([fid]);
            }
        }
        true
    }

    /// Resize a node, clamped to the configured minimum size.
    pub fn resize_node(&mut self, id: EntityId, width: f32, height: f32) -> bool {
        let w = clamp_min(width, self.config.min_node_width);
        let h = clamp_min(height, self.config.min_node_height);
        self.update_node(id, NodePatch::size(w, h))
    }

    /// Pin a node to the screen, or release it back to world space. The
    /// visible position is preserved either way; pinning leaves the frame.
    pub fn toggle_pin(&mut self, id: EntityId) -> bool {
        let Some(idx) = self.node_index(id) else {
            return false;
        };
        self.push_undo("toggle pin");
        let camera = self.camera();
        let node = &mut self.state.nodes[idx];
        let mut left_frame = None;
        if node.pinned {
            if let (Some(px), Some(py)) = (node.pinned_x, node.pinned_y) {
                let world = camera.screen_to_world(Point::new(px, py));
                node.x = world.x;
                node.y = world.y;
            }
            node.pinned = false;
            node.pinned_x = None;
            node.pinned_y = None;
        } else {
            let screen = camera.world_to_screen(Point::new(node.x, node.y));
            node.pinned = true;
            node.pinned_x = Some(screen.x);
            node.pinned_y = Some(screen.y);
            left_frame = node.container_id.take();
        }
        if let Some(fid) = left_frame {
            refresh_member_cache(&mut self.state, fid);
        }
        self.forget_routes();
        true
    }

    /// Delete a node together with every connection touching it.
    pub fn delete_node(&mut self, id: EntityId) -> bool {
        if self.node_index(id).is_none() {
            return false;
        }
        self.push_undo("delete node");
        self.remove_nodes(&[id]);
        true
    }

    /// Delete every selected node. Returns how many were removed.
    pub fn delete_selected_nodes(&mut self) -> usize {
        let ids = self.selection.nodes.clone();
        if ids.is_empty() {
            return 0;
        }
        self.push_undo("delete nodes");
        self.remove_nodes(&ids)
    }

    /// Delete selected nodes, frames and connections as one undo step.
    pub fn delete_selection(&mut self) -> bool {
        let nodes = self.selection.nodes.clone();
        let frames = self.selection.frames.clone();
        let any_conn = self.state.connections.iter().any(|c| c.selected);
        if nodes.is_empty() && frames.is_empty() && !any_conn {
            return false;
        }
        self.push_undo("delete selection");
        self.state.connections.retain(|c| !c.selected);
        self.remove_nodes(&nodes);
        for fid in frames {
            self.remove_frame(fid);
        }
        true
    }

    /// Translate every selected node by a world delta, then enforce
    /// containment once per frame that had a selected member. Pinned nodes
    /// move by the matching screen delta.
    pub fn move_selected_nodes(&mut self, dx: f32, dy: f32) -> bool {
        if self.selection.nodes.is_empty() {
            return false;
        }
        self.push_undo("move nodes");
        let scale = self.camera().scale;
        let selected = &self.selection.nodes;
        let mut frames = FrameSet::new();
        for node in self
            .state
            .nodes
            .iter_mut()
            .filter(|n| selected.contains(&n.id))
        {
            node.translate(dx, dy);
            node.translate_screen(dx * scale, dy * scale);
            if let Some(fid) = node.container_id {
                frames.push(fid);
            }
        }
        log::trace!("moved {} nodes by ({dx}, {dy})", self.selection.nodes.len());
        self.forget_routes();
        self.settle(frames);
        true
    }

    /// Move selected frames (with their members) and selected nodes that
    /// did not already travel with a selected frame.
    pub fn move_selection(&mut self, dx: f32, dy: f32) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.push_undo("move selection");
        let mut carried: HashSet<EntityId> = HashSet::new();
        for fid in self.selection.frames.clone() {
            carried.extend(self.translate_frame(fid, dx, dy));
        }
        let scale = self.camera().scale;
        let selected = &self.selection.nodes;
        let mut frames = FrameSet::new();
        for node in self
            .state
            .nodes
            .iter_mut()
            .filter(|n| selected.contains(&n.id) && !carried.contains(&n.id))
        {
            node.translate(dx, dy);
            node.translate_screen(dx * scale, dy * scale);
            if let Some(fid) = node.container_id {
                frames.push(fid);
            }
        }
        self.forget_routes();
        self.settle(frames);
        true
    }

    /// Clone the selected nodes, offset them, and select the clones.
    /// Connections running between two duplicated nodes are cloned too.
    pub fn duplicate_selected_nodes(&mut self) -> Vec<EntityId> {
        let originals: Vec<Node> = self
            .state
            .nodes
            .iter()
            .filter(|n| self.selection.has_node(n.id))
            .cloned()
            .collect();
        if originals.is_empty() {
            return Vec::new();
        }
        self.push_undo("duplicate nodes");

        let off = self.config.duplicate_offset;
        let mut mapping: Vec<(EntityId, EntityId)> = Vec::with_capacity(originals.len());
        for mut node in originals {
            let new_id = self.next_id("node");
            mapping.push((node.id, new_id));
            node.id = new_id;
            node.container_id = None;
            if node.pinned {
                node.pinned_x = node.pinned_x.map(|x| x + off);
                node.pinned_y = node.pinned_y.map(|y| y + off);
            } else {
                node.x += off;
                node.y += off;
            }
            self.state.nodes.push(node);
        }

        let remap = |id: EntityId| mapping.iter().find(|(old, _)| *old == id).map(|(_, new)| *new);
        let cloned: Vec<Connection> = self
            .state
            .connections
            .iter()
            .filter_map(|c| {
                let (from, to) = (remap(c.from)?, remap(c.to)?);
                Some(Connection {
                    from,
                    to,
                    selected: false,
                    routed: None,
                    ..c.clone()
                })
            })
            .collect();
        self.state.connections.extend(cloned);

        let new_ids: Vec<EntityId> = mapping.iter().map(|(_, new)| *new).collect();
        self.clear_selection();
        self.selection.nodes = new_ids.clone();
        log::debug!("duplicated {} nodes", new_ids.len());
        new_ids
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Append a connection. Both endpoints must exist; duplicates of an
    /// existing `(from, to)` pair are kept.
    pub fn add_connection(
        &mut self,
        from: EntityId,
        to: EntityId,
        from_anchor: Option<Anchor>,
        to_anchor: Option<Anchor>,
    ) -> bool {
        if !self.state.contains_entity(from) || !self.state.contains_entity(to) {
            log::debug!("ignoring connection {from} -> {to}: unknown endpoint");
            return false;
        }
        self.push_undo("add connection");
        let mut conn = Connection::new(from, to);
        conn.from_anchor = from_anchor;
        conn.to_anchor = to_anchor;
        self.state.connections.push(conn);
        true
    }

    /// Remove every connection matching the pair. Returns how many.
    pub fn remove_connection(&mut self, from: EntityId, to: EntityId) -> usize {
        let key = ConnectionKey::new(from, to);
        let count = self.count_connections(key);
        if count == 0 {
            return 0;
        }
        self.push_undo("remove connection");
        self.state.connections.retain(|c| !c.matches(key));
        count
    }

    /// Lock (or with `None`, release) the anchors of matching connections.
    pub fn set_connection_anchors(
        &mut self,
        key: ConnectionKey,
        from_anchor: Option<Anchor>,
        to_anchor: Option<Anchor>,
    ) -> usize {
        self.update_connections(key, "set anchors", |c| {
            c.from_anchor = from_anchor;
            c.to_anchor = to_anchor;
        })
    }

    pub fn set_connection_label(&mut self, key: ConnectionKey, label: Option<String>) -> usize {
        let label = label.filter(|l| !l.is_empty());
        self.update_connections(key, "set label", |c| c.label = label.clone())
    }

    pub fn set_connection_style(&mut self, key: ConnectionKey, style: LineStyle) -> usize {
        self.update_connections(key, "set style", |c| c.style = style)
    }

    pub fn set_connection_color(&mut self, key: ConnectionKey, color: Option<Color>) -> usize {
        self.update_connections(key, "set color", |c| c.color = color)
    }

    /// Make the matching connections the only selected entities.
    pub fn select_connection(&mut self, key: ConnectionKey) -> bool {
        if self.count_connections(key) == 0 {
            return false;
        }
        self.clear_selection();
        for conn in self.state.connections.iter_mut().filter(|c| c.matches(key)) {
            conn.selected = true;
        }
        true
    }

    /// Recompute the cached router anchors of every connection. User-locked
    /// anchors are untouched; they keep precedence when drawing. Call once
    /// after a bulk move, not on every pointer move. Any later geometry
    /// change drops the cache again.
    pub fn optimize_connections(&mut self) -> usize {
        let camera = self.camera();
        let mut changed = 0;
        for i in 0..self.state.connections.len() {
            let conn = &self.state.connections[i];
            let routed = if conn.is_self_loop() {
                self.state
                    .contains_entity(conn.from)
                    .then_some(SELF_LOOP_ANCHORS)
            } else {
                endpoint_bounds(&self.state, conn.from, &camera)
                    .zip(endpoint_bounds(&self.state, conn.to, &camera))
                    .map(|(a, b)| optimal_anchors(&a, &b))
            };
            let conn = &mut self.state.connections[i];
            if conn.routed != routed {
                conn.routed = routed;
                changed += 1;
            }
        }
        log::debug!("optimized connections: {changed} re-routed");
        changed
    }

    // ─── Background frames ───────────────────────────────────────────────

    /// Create an empty frame and select it exclusively.
    pub fn create_background_frame(&mut self, x: f32, y: f32, width: f32, height: f32) -> EntityId {
        self.push_undo("create frame");
        let id = self.next_id("frame");
        let w = clamp_min(width, self.config.min_frame_width);
        let h = clamp_min(height, self.config.min_frame_height);
        self.state
            .frames
            .push(BackgroundFrame::new(id, x, y, w, h));
        self.clear_selection();
        self.selection.frames.push(id);
        log::debug!("created frame {id} at ({x}, {y}, {w}, {h})");
        id
    }

    /// Wrap the selected free nodes in a new frame fitted to their padded
    /// bounding box.
    pub fn create_frame_around_selection(&mut self, title: &str) -> Option<EntityId> {
        let members: Vec<EntityId> = self
            .state
            .nodes
            .iter()
            .filter(|n| self.selection.has_node(n.id) && n.container_id.is_none() && !n.pinned)
            .map(|n| n.id)
            .collect();
        let padded = padded_member_bounds(
            self.state.nodes.iter().filter(|n| members.contains(&n.id)),
            self.config.frame_padding,
        )?;
        self.push_undo("frame selection");
        let id = self.next_id("frame");
        let b = clamp_frame_resize(
            padded,
            Some(padded),
            self.config.min_frame_width,
            self.config.min_frame_height,
        );
        let mut frame = BackgroundFrame::new(id, b.x, b.y, b.width, b.height);
        frame.title = title.to_string();
        self.state.frames.push(frame);
        for node in self
            .state
            .nodes
            .iter_mut()
            .filter(|n| members.contains(&n.id))
        {
            node.container_id = Some(id);
        }
        refresh_member_cache(&mut self.state, id);
        self.forget_routes();
        self.clear_selection();
        self.selection.frames.push(id);
        Some(id)
    }

    /// Translate a frame and all of its members by the same delta.
    pub fn move_background_frame(&mut self, id: EntityId, dx: f32, dy: f32) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        self.push_undo("move frame");
        self.translate_frame(id, dx, dy);
        true
    }

    /// Manual resize. The request is clamped so the frame keeps its
    /// members' padded box and the minimum frame size.
    pub fn resize_background_frame(&mut self, id: EntityId, requested: Bounds) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        self.push_undo("resize frame");
        self.resize_frame_clamped(id, requested);
        self.forget_routes();
        true
    }

    /// Apply a partial frame update. Geometry goes through the clamped
    /// resize.
    pub fn update_background_frame(&mut self, id: EntityId, patch: FramePatch) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        self.push_undo("update frame");
        if let Some(frame) = self.state.frame_mut(id) {
            if let Some(title) = patch.title {
                frame.title = title;
            }
            if let Some(style) = patch.style {
                frame.style = style;
            }
            if let Some(collapsed) = patch.collapsed {
                frame.collapsed = collapsed;
            }
        }
        if let Some(bounds) = patch.bounds {
            self.resize_frame_clamped(id, bounds);
        }
        self.forget_routes();
        self.prune_selection();
        true
    }

    pub fn toggle_frame_collapsed(&mut self, id: EntityId) -> bool {
        let Some(collapsed) = self.state.frame(id).map(|f| f.collapsed) else {
            return false;
        };
        self.update_background_frame(
            id,
            FramePatch {
                collapsed: Some(!collapsed),
                ..Default::default()
            },
        )
    }

    /// Delete a frame. Members become free nodes; connections attached to
    /// the frame itself are removed.
    pub fn delete_background_frame(&mut self, id: EntityId) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        self.push_undo("delete frame");
        self.remove_frame(id);
        true
    }

    /// Make `node_id` a member of `frame_id`. A node outside the frame
    /// grows the frame to capture it. Pinned nodes cannot join a frame.
    pub fn assign_node_to_frame(&mut self, node_id: EntityId, frame_id: EntityId) -> bool {
        let Some(idx) = self.node_index(node_id) else {
            return false;
        };
        if self.state.frame(frame_id).is_none() || self.state.nodes[idx].pinned {
            return false;
        }
        self.push_undo("assign to frame");
        let previous = self.state.nodes[idx].container_id.replace(frame_id);
        if let Some(old) = previous.filter(|old| *old != frame_id) {
            refresh_member_cache(&mut self.state, old);
        }

        let padding = self.config.frame_padding;
        if let Some(padded) = padded_member_bounds(self.state.members_of(frame_id), padding)
            && let Some(frame) = self.state.frame_mut(frame_id)
        {
            let grown = expanded_to_contain(&frame.bounds(), &padded);
            frame.set_bounds(grown);
        }
        self.forget_routes();
        self.settle([frame_id]);
        true
    }

    /// Detach a node from its frame. The frame keeps its size.
    pub fn remove_node_from_frame(&mut self, node_id: EntityId) -> bool {
        let Some(fid) = self.state.node(node_id).and_then(|n| n.container_id) else {
            return false;
        };
        self.push_undo("remove from frame");
        if let Some(node) = self.state.node_mut(node_id) {
            node.container_id = None;
        }
        refresh_member_cache(&mut self.state, fid);
        self.forget_routes();
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_node(&mut self, id: EntityId) -> bool {
        if self.node_index(id).is_none() {
            return false;
        }
        self.select_only_node(id);
        true
    }

    /// Shift-click: add or remove one node without touching the rest.
    pub fn toggle_node_selection(&mut self, id: EntityId) -> bool {
        if self.node_index(id).is_none() {
            return false;
        }
        if let Some(pos) = self.selection.nodes.iter().position(|n| *n == id) {
            self.selection.nodes.remove(pos);
        } else {
            self.selection.nodes.push(id);
        }
        true
    }

    pub fn select_background_frame(&mut self, id: EntityId) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        self.clear_selection();
        self.selection.frames.push(id);
        true
    }

    /// Shift-click on a frame.
    pub fn toggle_frame_selection(&mut self, id: EntityId) -> bool {
        if self.state.frame(id).is_none() {
            return false;
        }
        if let Some(pos) = self.selection.frames.iter().position(|f| *f == id) {
            self.selection.frames.remove(pos);
        } else {
            self.selection.frames.push(id);
        }
        true
    }

    /// Select every visible node and every frame.
    pub fn select_all(&mut self) {
        self.clear_selection();
        self.selection.nodes = self
            .state
            .nodes
            .iter()
            .filter(|n| !self.state.is_hidden(n))
            .map(|n| n.id)
            .collect();
        self.selection.frames = self.state.frames.iter().map(|f| f.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.editing = None;
        for conn in &mut self.state.connections {
            conn.selected = false;
        }
    }

    pub fn start_editing(&mut self, id: EntityId) -> bool {
        if self.node_index(id).is_none() {
            return false;
        }
        self.select_only_node(id);
        self.editing = Some(id);
        true
    }

    pub fn stop_editing(&mut self) {
        self.editing = None;
    }

    // ─── Marquee ─────────────────────────────────────────────────────────

    /// Begin a rubber-band drag at a world point. `additive` keeps the
    /// current selection and extends it.
    pub fn start_marquee(&mut self, world: Point, additive: bool) {
        if !additive {
            self.clear_selection();
        }
        self.marquee = Some(Marquee {
            start: world,
            end: world,
            base: self.selection.clone(),
        });
    }

    /// Move the free corner; the selection previews live.
    pub fn update_marquee(&mut self, world: Point) -> Option<Bounds> {
        let marquee = self.marquee.as_mut()?;
        marquee.end = world;
        let rect = marquee.rect();
        self.apply_marquee();
        Some(rect)
    }

    /// Finish the drag and return what it selected.
    pub fn end_marquee(&mut self) -> MarqueeHits {
        let hits = self.apply_marquee();
        self.marquee = None;
        hits
    }

    fn apply_marquee(&mut self) -> MarqueeHits {
        let Some(marquee) = &self.marquee else {
            return MarqueeHits::default();
        };
        let hits = marquee_select(&self.state, &self.camera(), marquee.start, marquee.end);
        let mut selection = marquee.base.clone();
        for &id in &hits.nodes {
            selection.add_node(id);
        }
        for &id in &hits.frames {
            selection.add_frame(id);
        }
        self.selection = selection;
        hits
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_scale(&mut self, scale: f32) {
        self.state.view.scale = self.config.clamp_scale(scale);
        self.forget_pinned_routes();
    }

    pub fn set_pan(&mut self, pan_x: f32, pan_y: f32) {
        self.state.view.pan_x = pan_x;
        self.state.view.pan_y = pan_y;
        self.forget_pinned_routes();
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let cam = self.camera().panned(dx, dy);
        self.state.view.set_camera(cam);
        self.forget_pinned_routes();
    }

    /// Multiply the zoom by `factor`, keeping the world point under the
    /// screen point `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        let cam = self.camera();
        let scale = self.config.clamp_scale(cam.scale * factor);
        self.state.view.set_camera(cam.zoom_at(scale, anchor));
        self.forget_pinned_routes();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.viewport.center(), self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.viewport.center(), 1.0 / self.config.zoom_step);
    }

    /// Fit every visible world-space entity into the viewport. Returns
    /// false on an empty board.
    pub fn zoom_to_fit(&mut self) -> bool {
        let boxes = self
            .state
            .nodes
            .iter()
            .filter(|n| !n.pinned && !self.state.is_hidden(n))
            .map(Node::bounds)
            .chain(self.state.frames.iter().map(BackgroundFrame::visible_bounds));
        let Some(content) = Bounds::union_all(boxes) else {
            return false;
        };
        let mut cam = Camera::fit(
            &content,
            self.viewport.width,
            self.viewport.height,
            self.config.fit_margin,
        );
        let clamped = self.config.clamp_scale(cam.scale);
        if clamped != cam.scale {
            cam = cam.zoom_at(clamped, self.viewport.center());
        }
        self.state.view.set_camera(cam);
        self.forget_pinned_routes();
        true
    }

    pub fn set_show_grid(&mut self, show: bool) {
        if self.state.view.show_grid == show {
            return;
        }
        self.push_undo("toggle grid");
        self.state.view.show_grid = show;
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) {
        if self.state.view.background_mode == mode {
            return;
        }
        self.push_undo("background mode");
        self.state.view.background_mode = mode;
    }

    // ─── Undo ────────────────────────────────────────────────────────────

    /// Capture the board before a mutation. Store operations call this
    /// themselves; hosts only need it around edits made outside the store.
    pub fn push_undo(&mut self, description: &str) {
        self.history.push(&self.state, description);
    }

    /// Restore the newest snapshot wholesale. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        let snapshot = self.history.undo()?;
        self.state = snapshot.state;
        self.marquee = None;
        self.prune_selection();
        log::debug!("undo: {}", snapshot.description);
        Some(snapshot.description)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Group the following operations into one undo step (a drag).
    pub fn begin_batch(&mut self, description: &str) {
        self.history.begin_batch(&self.state, description);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch(&self.state);
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Replace the board with a decoded snapshot. History and selection
    /// are reset.
    pub fn load_json(&mut self, text: &str) -> Result<RepairReport, SnapshotError> {
        let state = snapshot::from_json(text)?;
        Ok(self.load_state(state))
    }

    pub fn load_msgpack(&mut self, bytes: &[u8]) -> Result<RepairReport, SnapshotError> {
        let state = snapshot::from_msgpack(bytes)?;
        Ok(self.load_state(state))
    }

    /// Repair and install a board state.
    pub fn load_state(&mut self, mut state: BoardState) -> RepairReport {
        let report = repair_board(&mut state, &self.config);
        self.state = state;
        self.forget_routes();
        self.history.clear();
        self.marquee = None;
        self.clear_selection();
        log::debug!(
            "loaded board: {} nodes, {} connections, {} frames",
            self.state.nodes.len(),
            self.state.connections.len(),
            self.state.frames.len()
        );
        report
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        snapshot::to_json(&self.state)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, SnapshotError> {
        snapshot::to_msgpack(&self.state)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Topmost entity under a world point.
    pub fn hit_test(&self, world: Point) -> Option<Hit> {
        hit_test(&self.state, &self.camera(), world)
    }

    /// Route every drawable connection with the current camera.
    pub fn routes(&self, variant: PathVariant) -> Vec<RoutedConnection> {
        route_all(&self.state, &self.camera(), variant)
    }

    /// Connections downstream of the current selection.
    pub fn flow_highlight(&self) -> Vec<ConnectionKey> {
        let roots: Vec<EntityId> = self
            .selection
            .nodes
            .iter()
            .chain(&self.selection.frames)
            .copied()
            .collect();
        if roots.is_empty() {
            return Vec::new();
        }
        downstream_connections(&self.state, &roots)
    }

    pub fn lint(&self) -> Vec<LintDiagnostic> {
        lint_board(&self.state, self.config.frame_padding)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn next_id(&mut self, prefix: &str) -> EntityId {
        let state = &self.state;
        self.ids.next(prefix, |id| state.contains_entity(id))
    }

    fn node_index(&self, id: EntityId) -> Option<usize> {
        self.state.nodes.iter().position(|n| n.id == id)
    }

    fn count_connections(&self, key: ConnectionKey) -> usize {
        self.state
            .connections
            .iter()
            .filter(|c| c.matches(key))
            .count()
    }

    fn update_connections(
        &mut self,
        key: ConnectionKey,
        description: &str,
        apply: impl Fn(&mut Connection),
    ) -> usize {
        let count = self.count_connections(key);
        if count == 0 {
            return 0;
        }
        self.push_undo(description);
        for conn in self.state.connections.iter_mut().filter(|c| c.matches(key)) {
            apply(conn);
        }
        count
    }

    fn select_only_node(&mut self, id: EntityId) {
        self.clear_selection();
        self.selection.nodes.push(id);
    }

    /// Drop every cached router choice; routing computes fresh anchors until
    /// the next `optimize_connections`.
    fn forget_routes(&mut self) {
        for conn in &mut self.state.connections {
            conn.routed = None;
        }
    }

    /// Pinned nodes move in world space whenever the camera does.
    fn forget_pinned_routes(&mut self) {
        let pinned: SmallVec<[EntityId; 8]> = self
            .state
            .nodes
            .iter()
            .filter(|n| n.pinned)
            .map(|n| n.id)
            .collect();
        if pinned.is_empty() {
            return;
        }
        for conn in self
            .state
            .connections
            .iter_mut()
            .filter(|c| pinned.iter().any(|id| c.touches(*id)))
        {
            conn.routed = None;
        }
    }

    /// Run containment once for each listed frame.
    fn settle(&mut self, frames: impl IntoIterator<Item = EntityId>) {
        let reports = containment::enforce_many(&mut self.state, frames, self.config.frame_padding);
        for (fid, report) in reports {
            if !report.evicted.is_empty() {
                log::debug!("frame {fid} released {:?}", report.evicted);
            }
        }
    }

    /// Move a frame and its members. Returns the members moved.
    fn translate_frame(&mut self, id: EntityId, dx: f32, dy: f32) -> Vec<EntityId> {
        let Some(frame) = self.state.frame_mut(id) else {
            return Vec::new();
        };
        frame.x += dx;
        frame.y += dy;
        let mut moved = Vec::new();
        for node in self
            .state
            .nodes
            .iter_mut()
            .filter(|n| n.container_id == Some(id))
        {
            node.translate(dx, dy);
            moved.push(node.id);
        }
        log::trace!("moved frame {id} and {} members by ({dx}, {dy})", moved.len());
        self.forget_routes();
        moved
    }

    fn resize_frame_clamped(&mut self, id: EntityId, requested: Bounds) {
        let padded = padded_member_bounds(self.state.members_of(id), self.config.frame_padding);
        let clamped = clamp_frame_resize(
            requested,
            padded,
            self.config.min_frame_width,
            self.config.min_frame_height,
        );
        if clamped != requested {
            log::debug!("clamped frame {id} resize {requested:?} to {clamped:?}");
        }
        if let Some(frame) = self.state.frame_mut(id) {
            frame.set_bounds(clamped);
        }
    }

    /// Remove nodes with their connections and membership. No undo push.
    fn remove_nodes(&mut self, ids: &[EntityId]) -> usize {
        let frames: FrameSet = self
            .state
            .nodes
            .iter()
            .filter(|n| ids.contains(&n.id))
            .filter_map(|n| n.container_id)
            .collect();
        let before = self.state.nodes.len();
        self.state.nodes.retain(|n| !ids.contains(&n.id));
        self.state
            .connections
            .retain(|c| !ids.iter().any(|id| c.touches(*id)));
        for fid in frames {
            refresh_member_cache(&mut self.state, fid);
        }
        let removed = before - self.state.nodes.len();
        log::debug!("deleted {removed} nodes");
        self.prune_selection();
        removed
    }

    /// Remove a frame, freeing its members. No undo push.
    fn remove_frame(&mut self, id: EntityId) {
        self.state.frames.retain(|f| f.id != id);
        for node in self
            .state
            .nodes
            .iter_mut()
            .filter(|n| n.container_id == Some(id))
        {
            node.container_id = None;
        }
        self.state.connections.retain(|c| !c.touches(id));
        self.forget_routes();
        log::debug!("deleted frame {id}");
        self.prune_selection();
    }

    /// Drop selected ids that no longer exist or are hidden.
    fn prune_selection(&mut self) {
        let state = &self.state;
        self.selection
            .nodes
            .retain(|id| state.node(*id).is_some_and(|n| !state.is_hidden(n)));
        self.selection.frames.retain(|id| state.frame(*id).is_some());
        if self
            .editing
            .is_some_and(|id| !self.selection.has_node(id))
        {
            self.editing = None;
        }
    }
}

fn clamp_min(value: f32, min: f32) -> f32 {
    if value.is_nan() { min } else { value.max(min) }
}
