//! WASM bridge for the whiteboard: exposes the board engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Entity ids cross the
//! boundary as strings; structured results come back as JSON strings.

mod render2d;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wb_core::{
    Anchor, BackgroundMode, BoardConfig, Bounds, Color, ConnectionKey, EntityId, FramePatch,
    LineStyle, LintSeverity, NodePatch, Point,
};
use wb_editor::shortcuts::{ShortcutAction, ShortcutMap};
use wb_editor::{Board, InputEvent, Modifiers, ToolController, ToolKind};
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Holds the board store and the tool controller. All interaction from
/// the page goes through this struct.
#[wasm_bindgen]
pub struct WhiteboardCanvas {
    board: Board,
    tools: ToolController,
    width: f64,
    height: f64,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
}

#[wasm_bindgen]
impl WhiteboardCanvas {
    /// Create a new canvas controller with the given dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_board(Board::default(), width, height)
    }

    /// Create a controller with tuned constants (a partial `BoardConfig`
    /// as JSON; missing keys keep their defaults).
    pub fn with_config(
        width: f64,
        height: f64,
        config_json: &str,
    ) -> Result<WhiteboardCanvas, JsValue> {
        let config: BoardConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {e}")))?;
        Ok(Self::with_board(Board::new(config), width, height))
    }

    /// Render the board to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let overlays = render2d::Overlays {
            draft: self.tools.draft_line(&self.board),
        };
        render2d::render_board(ctx, &self.board, self.width, self.height, &theme, overlays);
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Resize the canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.board.set_viewport(width as f32, height as f32);
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Handle pointer down. Returns true if a redraw is needed.
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.tools
            .handle(&mut self.board, &InputEvent::PointerDown { x, y, modifiers })
    }

    /// Handle pointer move. Returns true if a redraw is needed.
    pub fn handle_pointer_move(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.tools
            .handle(&mut self.board, &InputEvent::PointerMove { x, y, modifiers })
    }

    /// Handle pointer up. Returns a JSON string:
    /// `{"changed":bool, "tool":"<name>"}`
    pub fn handle_pointer_up(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let changed = self
            .tools
            .handle(&mut self.board, &InputEvent::PointerUp { x, y, modifiers });
        let tool = tool_kind_to_name(self.tools.active());
        format!(r#"{{"changed":{changed},"tool":"{tool}"}}"#)
    }

    /// Handle a wheel or pinch. `ctrl` (set by browsers for pinch) zooms at
    /// the pointer; otherwise the canvas pans.
    pub fn handle_wheel(&mut self, x: f32, y: f32, dx: f32, dy: f32, ctrl: bool) -> bool {
        let zoom = if ctrl { (-dy * 0.01).exp() } else { 1.0 };
        let (dx, dy) = if ctrl { (0.0, 0.0) } else { (dx, dy) };
        self.tools
            .handle(&mut self.board, &InputEvent::Wheel { x, y, dx, dy, zoom })
    }

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>", "tool":"<tool_name>"}`
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        // Typing into a node owns the keyboard.
        if self.board.editing().is_some() && key != "Escape" {
            return r#"{"changed":false,"action":"none","tool":""}"#.to_string();
        }
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return r#"{"changed":false,"action":"none","tool":""}"#.to_string();
        };
        let changed = action.apply(&mut self.board, &mut self.tools);
        let action_name = action_to_name(action);
        let tool_name = tool_kind_to_name(self.tools.active());
        format!(r#"{{"changed":{changed},"action":"{action_name}","tool":"{tool_name}"}}"#)
    }

    /// Switch the active tool.
    pub fn set_tool(&mut self, name: &str) {
        let kind = match name {
            "connect" => ToolKind::Connect,
            "pan" => ToolKind::Pan,
            _ => ToolKind::Select,
        };
        self.tools.set_tool(kind);
    }

    /// Get the current tool name.
    pub fn get_tool_name(&self) -> String {
        tool_kind_to_name(self.tools.active()).to_string()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Add a node with its top-left at a world point. Returns its id.
    pub fn add_node(&mut self, x: f32, y: f32) -> String {
        self.board.add_node(x, y).as_str().to_string()
    }

    /// Add a node centered in the visible area. Returns its id.
    pub fn add_node_at_view_center(&mut self) -> String {
        self.board.add_node_at_view_center().as_str().to_string()
    }

    /// Set one node property. Keys: `x`, `y`, `width`, `height`,
    /// `content`, `color` (hex, or empty to clear).
    pub fn set_node_prop(&mut self, node_id: &str, key: &str, value: &str) -> bool {
        let Some(id) = EntityId::get(node_id) else {
            return false;
        };
        let number = || value.trim().parse::<f32>().ok();
        match key {
            "x" | "y" => {
                let Some(v) = number() else {
                    return false;
                };
                let patch = NodePatch {
                    x: (key == "x").then_some(v),
                    y: (key == "y").then_some(v),
                    ..Default::default()
                };
                self.board.update_node(id, patch)
            }
            "width" | "height" => {
                let Some(node) = self.board.state().node(id) else {
                    return false;
                };
                let Some(v) = number() else {
                    return false;
                };
                let (w, h) = if key == "width" {
                    (v, node.height)
                } else {
                    (node.width, v)
                };
                self.board.resize_node(id, w, h)
            }
            "content" => self.board.update_node(
                id,
                NodePatch {
                    content: Some(value.to_string()),
                    ..Default::default()
                },
            ),
            "color" => {
                let color = if value.is_empty() {
                    None
                } else {
                    match Color::from_hex(value) {
                        Some(c) => Some(c),
                        None => return false,
                    }
                };
                self.board.update_node(
                    id,
                    NodePatch {
                        color: Some(color),
                        ..Default::default()
                    },
                )
            }
            _ => false,
        }
    }

    pub fn toggle_pin(&mut self, node_id: &str) -> bool {
        EntityId::get(node_id).is_some_and(|id| self.board.toggle_pin(id))
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        EntityId::get(node_id).is_some_and(|id| self.board.delete_node(id))
    }

    /// Delete every selected node, frame and connection.
    pub fn delete_selected(&mut self) -> bool {
        self.board.delete_selection()
    }

    /// Delete only the selected nodes. Returns how many were removed.
    pub fn delete_selected_nodes(&mut self) -> usize {
        self.board.delete_selected_nodes()
    }

    /// Move the selected nodes by a world-space delta.
    pub fn move_selected_nodes(&mut self, dx: f32, dy: f32) -> bool {
        self.board.move_selected_nodes(dx, dy)
    }

    /// Duplicate the selected nodes. Returns the new ids as a JSON array.
    pub fn duplicate_selected(&mut self) -> String {
        let ids = self.board.duplicate_selected_nodes();
        ids_to_json(&ids)
    }

    pub fn start_editing(&mut self, node_id: &str) -> bool {
        EntityId::get(node_id).is_some_and(|id| self.board.start_editing(id))
    }

    pub fn stop_editing(&mut self) {
        self.board.stop_editing();
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Add a connection. Anchors are `top|right|bottom|left`, or empty to
    /// let the router choose.
    pub fn add_connection(
        &mut self,
        from: &str,
        to: &str,
        from_anchor: &str,
        to_anchor: &str,
    ) -> bool {
        let (Some(from), Some(to)) = (EntityId::get(from), EntityId::get(to)) else {
            return false;
        };
        self.board
            .add_connection(from, to, parse_anchor(from_anchor), parse_anchor(to_anchor))
    }

    /// Remove every connection between the pair. Returns how many.
    pub fn remove_connection(&mut self, from: &str, to: &str) -> usize {
        match (EntityId::get(from), EntityId::get(to)) {
            (Some(from), Some(to)) => self.board.remove_connection(from, to),
            _ => 0,
        }
    }

    /// Set one connection property on every connection between the pair.
    /// Keys: `fromAnchor`, `toAnchor`, `label`, `style`, `color`.
    pub fn set_connection_prop(&mut self, from: &str, to: &str, key: &str, value: &str) -> usize {
        let Some(conn_key) = connection_key(from, to) else {
            return 0;
        };
        match key {
            "fromAnchor" | "toAnchor" => {
                let Some(conn) = self
                    .board
                    .state()
                    .connections
                    .iter()
                    .find(|c| c.matches(conn_key))
                else {
                    return 0;
                };
                let anchor = parse_anchor(value);
                let (fa, ta) = if key == "fromAnchor" {
                    (anchor, conn.to_anchor)
                } else {
                    (conn.from_anchor, anchor)
                };
                self.board.set_connection_anchors(conn_key, fa, ta)
            }
            "label" => {
                let label = (!value.is_empty()).then(|| value.to_string());
                self.board.set_connection_label(conn_key, label)
            }
            "style" => match value {
                "solid" => self.board.set_connection_style(conn_key, LineStyle::Solid),
                "dashed" => self.board.set_connection_style(conn_key, LineStyle::Dashed),
                _ => 0,
            },
            "color" => {
                let color = if value.is_empty() {
                    None
                } else {
                    match Color::from_hex(value) {
                        Some(c) => Some(c),
                        None => return 0,
                    }
                };
                self.board.set_connection_color(conn_key, color)
            }
            _ => 0,
        }
    }

    pub fn select_connection(&mut self, from: &str, to: &str) -> bool {
        connection_key(from, to).is_some_and(|key| self.board.select_connection(key))
    }

    /// Re-pick anchors for every connection. Returns how many changed.
    pub fn optimize_connections(&mut self) -> usize {
        self.board.optimize_connections()
    }

    // ─── Frames ──────────────────────────────────────────────────────────

    pub fn create_background_frame(&mut self, x: f32, y: f32, width: f32, height: f32) -> String {
        self.board
            .create_background_frame(x, y, width, height)
            .as_str()
            .to_string()
    }

    /// Wrap the selected nodes in a frame. Returns the id, or empty.
    pub fn create_frame_around_selection(&mut self, title: &str) -> String {
        self.board
            .create_frame_around_selection(title)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn move_background_frame(&mut self, frame_id: &str, dx: f32, dy: f32) -> bool {
        EntityId::get(frame_id).is_some_and(|id| self.board.move_background_frame(id, dx, dy))
    }

    pub fn resize_background_frame(
        &mut self,
        frame_id: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> bool {
        let bounds = Bounds::new(x, y, width, height);
        EntityId::get(frame_id).is_some_and(|id| self.board.resize_background_frame(id, bounds))
    }

    /// Set one frame property. Keys: `title`, `borderColor`,
    /// `backgroundColor`.
    pub fn set_frame_prop(&mut self, frame_id: &str, key: &str, value: &str) -> bool {
        let Some(id) = EntityId::get(frame_id) else {
            return false;
        };
        let patch = match key {
            "title" => FramePatch {
                title: Some(value.to_string()),
                ..Default::default()
            },
            "borderColor" | "backgroundColor" => {
                let frame = self.board.state().frame(id);
                let (Some(frame), Some(color)) = (frame, Color::from_hex(value)) else {
                    return false;
                };
                let mut style = frame.style.clone();
                if key == "borderColor" {
                    style.border_color = color;
                } else {
                    style.background_color = color;
                }
                FramePatch {
                    style: Some(style),
                    ..Default::default()
                }
            }
            _ => return false,
        };
        self.board.update_background_frame(id, patch)
    }

    pub fn toggle_frame_collapsed(&mut self, frame_id: &str) -> bool {
        EntityId::get(frame_id).is_some_and(|id| self.board.toggle_frame_collapsed(id))
    }

    pub fn delete_background_frame(&mut self, frame_id: &str) -> bool {
        EntityId::get(frame_id).is_some_and(|id| self.board.delete_background_frame(id))
    }

    pub fn assign_node_to_frame(&mut self, node_id: &str, frame_id: &str) -> bool {
        match (EntityId::get(node_id), EntityId::get(frame_id)) {
            (Some(node), Some(frame)) => self.board.assign_node_to_frame(node, frame),
            _ => false,
        }
    }

    pub fn remove_node_from_frame(&mut self, node_id: &str) -> bool {
        EntityId::get(node_id).is_some_and(|id| self.board.remove_node_from_frame(id))
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node or frame by id; an empty id clears the selection.
    pub fn select_by_id(&mut self, entity_id: &str) -> bool {
        if entity_id.is_empty() {
            self.board.clear_selection();
            return true;
        }
        let Some(id) = EntityId::get(entity_id) else {
            return false;
        };
        self.board.select_node(id) || self.board.select_background_frame(id)
    }

    pub fn select_all(&mut self) {
        self.board.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.board.clear_selection();
    }

    /// Current selection as JSON:
    /// `{"nodes":[..],"frames":[..],"connections":[{"from":..,"to":..}]}`
    pub fn get_selection_json(&self) -> String {
        #[derive(Serialize)]
        struct Pair<'a> {
            from: &'a str,
            to: &'a str,
        }
        #[derive(Serialize)]
        struct SelectionJson<'a> {
            nodes: Vec<&'a str>,
            frames: Vec<&'a str>,
            connections: Vec<Pair<'a>>,
        }
        let selection = self.board.selection();
        let keys = self.board.selected_connections();
        let json = SelectionJson {
            nodes: selection.nodes.iter().map(|id| id.as_str()).collect(),
            frames: selection.frames.iter().map(|id| id.as_str()).collect(),
            connections: keys
                .iter()
                .map(|k| Pair {
                    from: k.from.as_str(),
                    to: k.to.as_str(),
                })
                .collect(),
        };
        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }

    /// Begin a marquee at a screen point.
    pub fn start_marquee(&mut self, x: f32, y: f32, additive: bool) {
        let world = self.board.camera().screen_to_world(Point::new(x, y));
        self.board.start_marquee(world, additive);
    }

    /// Drag the marquee's free corner. False when no marquee is active.
    pub fn update_marquee(&mut self, x: f32, y: f32) -> bool {
        let world = self.board.camera().screen_to_world(Point::new(x, y));
        self.board.update_marquee(world).is_some()
    }

    /// Finish the marquee. Returns `{"nodes":[..],"frames":[..]}`.
    pub fn end_marquee(&mut self) -> String {
        let hits = self.board.end_marquee();
        serde_json::json!({
            "nodes": hits.nodes.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "frames": hits.frames.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        })
        .to_string()
    }

    /// Topmost entity at a screen point, or empty.
    pub fn hit_test(&self, x: f32, y: f32) -> String {
        let world = self.board.camera().screen_to_world(Point::new(x, y));
        self.board
            .hit_test(world)
            .map(|hit| hit.id().as_str().to_string())
            .unwrap_or_default()
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.board.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.board.zoom_out();
    }

    pub fn zoom_to_fit(&mut self) -> bool {
        self.board.zoom_to_fit()
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.board.set_scale(scale);
    }

    pub fn set_pan(&mut self, pan_x: f32, pan_y: f32) {
        self.board.set_pan(pan_x, pan_y);
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.board.set_show_grid(show);
    }

    /// `dots`, `grid`, `plain` or `image`.
    pub fn set_background_mode(&mut self, mode: &str) -> bool {
        let mode = match mode {
            "dots" => BackgroundMode::Dots,
            "grid" => BackgroundMode::Grid,
            "plain" => BackgroundMode::Plain,
            "image" => BackgroundMode::Image,
            _ => return false,
        };
        self.board.set_background_mode(mode);
        true
    }

    /// Camera as JSON: `{"scale":..,"panX":..,"panY":..}`
    pub fn get_camera_json(&self) -> String {
        let cam = self.board.camera();
        serde_json::json!({ "scale": cam.scale, "panX": cam.pan_x, "panY": cam.pan_y }).to_string()
    }

    // ─── Undo & persistence ──────────────────────────────────────────────

    /// Undo the last action.
    pub fn undo(&mut self) -> bool {
        self.board.undo().is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.board.can_undo()
    }

    /// Serialize the board. Returns JSON, or empty on failure.
    pub fn to_json(&self) -> String {
        self.board.to_json().unwrap_or_else(|e| {
            log::error!("board serialization failed: {e}");
            String::new()
        })
    }

    /// Replace the board with a saved snapshot. Returns JSON:
    /// `{"ok":true,"repaired":{..}}` or `{"ok":false,"error":"..."}`.
    pub fn load_json(&mut self, text: &str) -> String {
        match self.board.load_json(text) {
            Ok(report) => serde_json::json!({
                "ok": true,
                "repaired": {
                    "droppedNodes": report.dropped_nodes,
                    "droppedFrames": report.dropped_frames,
                    "droppedConnections": report.dropped_connections,
                    "clearedContainers": report.cleared_containers,
                }
            })
            .to_string(),
            Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// Consistency diagnostics as a JSON array.
    pub fn lint_json(&self) -> String {
        let diags: Vec<serde_json::Value> = self
            .board
            .lint()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "entity": d.entity_id.as_str(),
                    "rule": d.rule,
                    "message": d.message,
                    "severity": match d.severity {
                        LintSeverity::Warning => "warning",
                        LintSeverity::Info => "info",
                    },
                })
            })
            .collect();
        serde_json::Value::Array(diags).to_string()
    }
}

impl WhiteboardCanvas {
    fn with_board(mut board: Board, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        board.set_viewport(width as f32, height as f32);
        Self {
            board,
            tools: ToolController::new(),
            width,
            height,
            dark_mode: false,
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn parse_anchor(s: &str) -> Option<Anchor> {
    Anchor::ALL.into_iter().find(|a| a.name() == s)
}

fn connection_key(from: &str, to: &str) -> Option<ConnectionKey> {
    Some(ConnectionKey::new(EntityId::get(from)?, EntityId::get(to)?))
}

fn ids_to_json(ids: &[EntityId]) -> String {
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
}

fn tool_kind_to_name(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::Select => "select",
        ToolKind::Connect => "connect",
        ToolKind::AnchorDrag => "anchorDrag",
        ToolKind::FrameResize => "frameResize",
        ToolKind::Pan => "pan",
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::ToolSelect => "toolSelect",
        ShortcutAction::ToolConnect => "toolConnect",
        ShortcutAction::ToolPan => "toolPan",
        ShortcutAction::Undo => "undo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::SelectAll => "selectAll",
        ShortcutAction::Duplicate => "duplicate",
        ShortcutAction::AddNode => "addNode",
        ShortcutAction::FrameSelection => "frameSelection",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ZoomToFit => "zoomToFit",
        ShortcutAction::ToggleGrid => "toggleGrid",
        ShortcutAction::Deselect => "deselect",
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("whiteboard WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Check a saved board. Returns JSON: `{"ok":true,"diagnostics":N}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match wb_core::snapshot::from_json(json) {
        Ok(state) => {
            let diagnostics = wb_core::lint_board(&state, wb_core::FRAME_PADDING).len();
            serde_json::json!({ "ok": true, "diagnostics": diagnostics }).to_string()
        }
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchors_parse_by_name() {
        assert_eq!(parse_anchor("right"), Some(Anchor::Right));
        assert_eq!(parse_anchor(""), None);
        assert_eq!(parse_anchor("middle"), None);
    }

    #[test]
    fn add_and_connect_through_string_ids() {
        let mut canvas = WhiteboardCanvas::new(1280.0, 800.0);
        let a = canvas.add_node(0.0, 0.0);
        let b = canvas.add_node(400.0, 0.0);
        assert!(canvas.add_connection(&a, &b, "", "top"));
        assert!(!canvas.add_connection(&a, "wasm_missing_entity", "", ""));
        assert_eq!(canvas.set_connection_prop(&a, &b, "style", "dashed"), 1);
        assert_eq!(canvas.set_connection_prop(&a, &b, "style", "wavy"), 0);
        assert_eq!(canvas.remove_connection(&a, &b), 1);
    }

    #[test]
    fn node_props_update_the_board() {
        let mut canvas = WhiteboardCanvas::new(1280.0, 800.0);
        let a = canvas.add_node(0.0, 0.0);
        assert!(canvas.set_node_prop(&a, "x", "42"));
        assert!(canvas.set_node_prop(&a, "color", "#FF0000"));
        assert!(!canvas.set_node_prop(&a, "color", "red"));
        assert!(!canvas.set_node_prop(&a, "x", "left"));
        let node = canvas.board.state().node(EntityId::intern(&a)).unwrap();
        assert_eq!(node.x, 42.0);
        assert_eq!(node.color, Color::from_hex("#FF0000"));
    }

    #[test]
    fn key_while_editing_is_ignored() {
        let mut canvas = WhiteboardCanvas::new(1280.0, 800.0);
        canvas.add_node(0.0, 0.0);
        // A new node opens in edit mode.
        let out = canvas.handle_key("Delete", false, false, false, false);
        assert_eq!(out, r#"{"changed":false,"action":"none","tool":""}"#);
        canvas.stop_editing();
        let out = canvas.handle_key("Delete", false, false, false, false);
        assert_eq!(out, r#"{"changed":true,"action":"delete","tool":"select"}"#);
    }

    #[test]
    fn json_round_trip_through_canvas() {
        let mut canvas = WhiteboardCanvas::new(1280.0, 800.0);
        let frame = canvas.create_background_frame(0.0, 0.0, 600.0, 400.0);
        let a = canvas.add_node(20.0, 20.0);
        assert!(canvas.assign_node_to_frame(&a, &frame));
        let saved = canvas.to_json();

        let mut restored = WhiteboardCanvas::new(1280.0, 800.0);
        let out: serde_json::Value = serde_json::from_str(&restored.load_json(&saved)).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["repaired"]["droppedNodes"], 0);
        assert_eq!(restored.to_json(), saved);
        assert_eq!(restored.lint_json(), "[]");

        let bad: serde_json::Value = serde_json::from_str(&restored.load_json("{")).unwrap();
        assert_eq!(bad["ok"], false);
    }

    #[test]
    fn selection_edits_through_the_bridge() {
        let mut canvas = WhiteboardCanvas::new(1280.0, 800.0);
        let a = canvas.add_node(0.0, 0.0);
        let b = canvas.add_node(400.0, 0.0);
        canvas.set_scale(2.0);
        canvas.set_pan(10.0, 20.0);
        let cam: serde_json::Value = serde_json::from_str(&canvas.get_camera_json()).unwrap();
        assert_eq!(cam["scale"], 2.0);
        assert_eq!(cam["panX"], 10.0);

        // World box (0,0)-(700,200) covers both nodes.
        canvas.start_marquee(10.0, 20.0, false);
        assert!(canvas.update_marquee(1410.0, 420.0));
        let hits: serde_json::Value = serde_json::from_str(&canvas.end_marquee()).unwrap();
        assert_eq!(hits["nodes"], serde_json::json!([a, b]));
        assert!(!canvas.update_marquee(0.0, 0.0));

        assert!(canvas.move_selected_nodes(5.0, 0.0));
        let node = canvas.board.state().node(EntityId::intern(&b)).unwrap();
        assert_eq!(node.x, 405.0);
        assert_eq!(canvas.delete_selected_nodes(), 2);
        assert!(canvas.board.state().nodes.is_empty());
    }

    #[test]
    fn validate_reports_diagnostics() {
        let out: serde_json::Value = serde_json::from_str(&validate(r#"{"nodes":[]}"#)).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["diagnostics"], 0);
    }
}
