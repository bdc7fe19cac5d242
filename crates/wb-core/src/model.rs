//! Core entity model for whiteboard documents.
//!
//! A board is three flat collections (nodes, connections, background
//! frames) that reference each other by [`EntityId`] only. Nodes name their
//! owning frame through `container_id`; frames cache the reverse relation in
//! `node_ids`; connections name their endpoints with a `(from, to)` pair.
//! Geometry lives in world space except for pinned nodes, whose position is
//! stored in screen space.

use crate::id::EntityId;
use crate::transform::Camera;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; persisted as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels. Values built this way survive a hex round trip.
    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a hex color string: `#RGB`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi * 16 + lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u8;
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// The 8-bit channels, for renderers that want bytes.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// A point in either world or screen space; the caller knows which.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Slack for edge comparisons, in world units.
pub const GEOMETRY_EPSILON: f32 = 1e-3;

/// Axis-aligned bounding box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalize two arbitrary corners into a box.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True if `inner` lies within `self`, edges inclusive. Edges are
    /// compared with [`GEOMETRY_EPSILON`] slack so a box grown to fit
    /// another still contains it after `x + width` rounding.
    pub fn contains_bounds(&self, inner: &Bounds) -> bool {
        inner.x >= self.x - GEOMETRY_EPSILON
            && inner.y >= self.y - GEOMETRY_EPSILON
            && inner.right() <= self.right() + GEOMETRY_EPSILON
            && inner.bottom() <= self.bottom() + GEOMETRY_EPSILON
    }

    /// Check if this box overlaps another (AABB overlap, touching edges
    /// do not count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(x, y, right - x, bottom - y)
    }

    /// Grow by `pad` on every side.
    pub fn inflate(&self, pad: f32) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Union of an iterator of boxes, `None` when empty.
    pub fn union_all(boxes: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
        boxes.into_iter().reduce(|acc, b| acc.union(&b))
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Cardinal attachment point on an entity's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left];

    pub fn opposite(self) -> Anchor {
        match self {
            Anchor::Top => Anchor::Bottom,
            Anchor::Right => Anchor::Left,
            Anchor::Bottom => Anchor::Top,
            Anchor::Left => Anchor::Right,
        }
    }

    /// Outward unit normal of the edge this anchor sits on.
    pub fn normal(self) -> (f32, f32) {
        match self {
            Anchor::Top => (0.0, -1.0),
            Anchor::Right => (1.0, 0.0),
            Anchor::Bottom => (0.0, 1.0),
            Anchor::Left => (-1.0, 0.0),
        }
    }

    /// Midpoint of the matching edge of `b`.
    pub fn position_on(self, b: &Bounds) -> Point {
        let c = b.center();
        match self {
            Anchor::Top => Point::new(c.x, b.y),
            Anchor::Right => Point::new(b.right(), c.y),
            Anchor::Bottom => Point::new(c.x, b.bottom()),
            Anchor::Left => Point::new(b.x, c.y),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Right => "right",
            Anchor::Bottom => "bottom",
            Anchor::Left => "left",
        }
    }
}

/// A `(from, to)` anchor assignment for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorPair {
    pub from: Anchor,
    pub to: Anchor,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

pub const DEFAULT_NODE_WIDTH: f32 = 250.0;
pub const DEFAULT_NODE_HEIGHT: f32 = 150.0;

fn default_node_width() -> f32 {
    DEFAULT_NODE_WIDTH
}

fn default_node_height() -> f32 {
    DEFAULT_NODE_HEIGHT
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A positioned card on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: EntityId,
    /// World-space top-left.
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_node_width")]
    pub width: f32,
    #[serde(default = "default_node_height")]
    pub height: f32,
    /// When set, `pinned_x/pinned_y` (screen space) replace `x/y`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_y: Option<f32>,
    /// Owning frame, at most one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<EntityId>,
    /// Opaque rich content; stored and returned untouched.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Node {
    pub fn new(id: EntityId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            pinned: false,
            pinned_x: None,
            pinned_y: None,
            container_id: None,
            content: String::new(),
            color: None,
        }
    }

    /// World-space box, ignoring pinning. This is the box containment
    /// reasons about.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// World-space box as currently displayed. Pinned nodes are mapped
    /// back from screen space through `camera`, so they shrink and grow
    /// in world units as the camera zooms.
    pub fn world_bounds(&self, camera: &Camera) -> Bounds {
        match self.screen_origin() {
            Some(origin) if self.pinned => {
                let p = camera.screen_to_world(origin);
                Bounds::new(
                    p.x,
                    p.y,
                    self.width / camera.scale,
                    self.height / camera.scale,
                )
            }
            _ => self.bounds(),
        }
    }

    /// Screen-space box: pinned nodes use their stored coordinates
    /// directly and never pass through the camera.
    pub fn screen_bounds(&self, camera: &Camera) -> Bounds {
        match self.screen_origin() {
            Some(origin) if self.pinned => {
                Bounds::new(origin.x, origin.y, self.width, self.height)
            }
            _ => camera.world_bounds_to_screen(&self.bounds()),
        }
    }

    fn screen_origin(&self) -> Option<Point> {
        Some(Point::new(self.pinned_x?, self.pinned_y?))
    }

    /// Shift the world position. Pinned nodes ignore world deltas.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        if !self.pinned {
            self.x += dx;
            self.y += dy;
        }
    }

    /// Shift a pinned node's screen position. World nodes ignore it.
    pub fn translate_screen(&mut self, dx: f32, dy: f32) {
        if self.pinned {
            self.pinned_x = self.pinned_x.map(|x| x + dx);
            self.pinned_y = self.pinned_y.map(|y| y + dy);
        }
    }
}

/// Partial update for [`Node`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub color: Option<Option<Color>>,
}

impl NodePatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }

    /// Merge into `node`. Returns true when geometry actually changed.
    pub fn apply(&self, node: &mut Node) -> bool {
        let before = node.bounds();
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(w) = self.width {
            node.width = w;
        }
        if let Some(h) = self.height {
            node.height = h;
        }
        if let Some(content) = &self.content {
            node.content = content.clone();
        }
        if let Some(color) = self.color {
            node.color = color;
        }
        before != node.bounds()
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// Line style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// The identity of a connection. Duplicates may share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub from: EntityId,
    pub to: EntityId,
}

impl ConnectionKey {
    pub const fn new(from: EntityId, to: EntityId) -> Self {
        Self { from, to }
    }
}

/// A directed edge between two entities (nodes or frames).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from: EntityId,
    pub to: EntityId,
    /// User-locked anchors. `None` means "let the router decide".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    /// Anchors computed by the last `optimize_connections` pass. Cleared by
    /// the store on any geometry change, so it never outlives the layout it
    /// was computed for.
    #[serde(skip)]
    pub routed: Option<AnchorPair>,
}

impl Connection {
    pub fn new(from: EntityId, to: EntityId) -> Self {
        Self {
            from,
            to,
            from_anchor: None,
            to_anchor: None,
            label: None,
            style: LineStyle::Solid,
            color: None,
            selected: false,
            routed: None,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(self.from, self.to)
    }

    pub fn matches(&self, key: ConnectionKey) -> bool {
        self.from == key.from && self.to == key.to
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.from == id || self.to == id
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

// ─── Background frames ───────────────────────────────────────────────────

/// Height of the title pill a collapsed frame renders as.
pub const PILL_HEIGHT: f32 = 32.0;
/// Estimated advance per title character in the pill.
pub const PILL_CHAR_WIDTH: f32 = 8.0;
/// Horizontal padding inside the pill.
pub const PILL_PADDING: f32 = 24.0;
pub const PILL_MIN_WIDTH: f32 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameStyle {
    pub border_color: Color,
    pub background_color: Color,
    pub border_width: f32,
    pub border_radius: f32,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            border_color: Color::rgba8(0x94, 0xA3, 0xB8, 0xFF),
            background_color: Color::rgba8(0x94, 0xA3, 0xB8, 0x14),
            border_width: 2.0,
            border_radius: 12.0,
        }
    }
}

/// A resizable background rectangle grouping nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundFrame {
    pub id: EntityId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub title: String,
    /// Cache of `{n.id : n.container_id == self.id}` in node order.
    #[serde(default)]
    pub node_ids: SmallVec<[EntityId; 8]>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(default)]
    pub style: FrameStyle,
}

impl BackgroundFrame {
    pub fn new(id: EntityId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            title: String::new(),
            node_ids: SmallVec::new(),
            collapsed: false,
            style: FrameStyle::default(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_bounds(&mut self, b: Bounds) {
        self.x = b.x;
        self.y = b.y;
        self.width = b.width;
        self.height = b.height;
    }

    /// The title capsule a collapsed frame is drawn as: fixed height,
    /// width estimated from the title length, horizontally centered on the
    /// frame and sitting directly above its top edge.
    pub fn pill_bounds(&self) -> Bounds {
        let chars = self.title.chars().count().max(1) as f32;
        let width = (chars * PILL_CHAR_WIDTH + PILL_PADDING * 2.0).max(PILL_MIN_WIDTH);
        let cx = self.x + self.width / 2.0;
        Bounds::new(cx - width / 2.0, self.y - PILL_HEIGHT, width, PILL_HEIGHT)
    }

    /// The box connections attach to and hit testing uses.
    pub fn visible_bounds(&self) -> Bounds {
        if self.collapsed {
            self.pill_bounds()
        } else {
            self.bounds()
        }
    }

    pub fn has_member(&self, id: EntityId) -> bool {
        self.node_ids.contains(&id)
    }
}

/// Partial update for [`BackgroundFrame`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePatch {
    pub title: Option<String>,
    pub collapsed: Option<bool>,
    pub style: Option<FrameStyle>,
    pub bounds: Option<Bounds>,
}

// ─── Polymorphic endpoints ───────────────────────────────────────────────

/// Anything a connection can attach to.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Node(&'a Node),
    Frame(&'a BackgroundFrame),
}

impl Entity<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Node(n) => n.id,
            Entity::Frame(f) => f.id,
        }
    }

    /// World-space box connections attach to.
    pub fn anchor_bounds(&self, camera: &Camera) -> Bounds {
        match self {
            Entity::Node(n) => n.world_bounds(camera),
            Entity::Frame(f) => f.visible_bounds(),
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, Entity::Frame(_))
    }
}

// ─── View settings ───────────────────────────────────────────────────────

/// How the board background is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    #[default]
    Dots,
    Grid,
    Plain,
    Image,
}

/// Pan/zoom plus background settings. Persisted alongside the entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub show_grid: bool,
    pub background_mode: BackgroundMode,
    pub background_color: Option<Color>,
    /// Reference to an uploaded background image; the upload itself lives
    /// outside the engine.
    pub background_image: Option<String>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            show_grid: true,
            background_mode: BackgroundMode::Dots,
            background_color: None,
            background_image: None,
        }
    }
}

impl ViewSettings {
    pub fn camera(&self) -> Camera {
        Camera::new(self.scale, self.pan_x, self.pan_y)
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.scale = camera.scale;
        self.pan_x = camera.pan_x;
        self.pan_y = camera.pan_y;
    }
}

// ─── Board state ─────────────────────────────────────────────────────────

/// Every mutable, persisted piece of a board. Cloning it is the undo
/// snapshot; comparing two is the undo round-trip check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardState {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub frames: Vec<BackgroundFrame>,
    pub view: ViewSettings,
}

impl BoardState {
    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: EntityId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn frame(&self, id: EntityId) -> Option<&BackgroundFrame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_mut(&mut self, id: EntityId) -> Option<&mut BackgroundFrame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    /// Resolve a connection endpoint. Nodes win over frames on an id clash.
    pub fn entity(&self, id: EntityId) -> Option<Entity<'_>> {
        self.node(id)
            .map(Entity::Node)
            .or_else(|| self.frame(id).map(Entity::Frame))
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    /// Members of `frame_id` as node references, in node order.
    pub fn members_of(&self, frame_id: EntityId) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(move |n| n.container_id == Some(frame_id))
    }

    /// Nodes hidden because their frame is collapsed.
    pub fn is_hidden(&self, node: &Node) -> bool {
        node.container_id
            .and_then(|fid| self.frame(fid))
            .is_some_and(|f| f.collapsed)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty() && self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#3B82F6").unwrap();
        assert_eq!(c.to_hex(), "#3B82F6");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        let short = Color::from_hex("fff").unwrap();
        assert_eq!(short.to_hex(), "#FFFFFF");
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn default_frame_style_survives_json() {
        let style = FrameStyle::default();
        assert_eq!(style.border_color.to_hex(), "#94A3B8");
        assert_eq!(style.background_color.to_hex(), "#94A3B814");
        let text = serde_json::to_string(&style).unwrap();
        let back: FrameStyle = serde_json::from_str(&text).unwrap();
        assert_eq!(back, style);
    }

    #[test]
    fn bounds_containment_is_inclusive() {
        let outer = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_bounds(&outer));
        assert!(outer.contains_bounds(&Bounds::new(10.0, 10.0, 90.0, 90.0)));
        assert!(!outer.contains_bounds(&Bounds::new(10.0, 10.0, 91.0, 90.0)));
        assert!(!outer.contains_bounds(&Bounds::new(-0.5, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn bounds_from_corners_normalizes() {
        let b = Bounds::from_corners(Point::new(50.0, 10.0), Point::new(10.0, 40.0));
        assert_eq!(b, Bounds::new(10.0, 10.0, 40.0, 30.0));
    }

    #[test]
    fn anchor_positions_are_edge_midpoints() {
        let b = Bounds::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(Anchor::Top.position_on(&b), Point::new(50.0, 0.0));
        assert_eq!(Anchor::Right.position_on(&b), Point::new(100.0, 25.0));
        assert_eq!(Anchor::Bottom.position_on(&b), Point::new(50.0, 50.0));
        assert_eq!(Anchor::Left.position_on(&b), Point::new(0.0, 25.0));
    }

    #[test]
    fn collapsed_frame_uses_pill() {
        let mut f = BackgroundFrame::new(EntityId::intern("f_pill"), 0.0, 100.0, 400.0, 300.0);
        f.title = "Ideas".into();
        assert_eq!(f.visible_bounds(), f.bounds());

        f.collapsed = true;
        let pill = f.visible_bounds();
        assert_eq!(pill.height, PILL_HEIGHT);
        assert_eq!(pill.bottom(), 100.0);
        assert!((pill.center().x - 200.0).abs() < 1e-4);
        assert!(pill.width >= PILL_MIN_WIDTH);
    }

    #[test]
    fn pinned_node_ignores_camera_in_screen_space() {
        let mut n = Node::new(EntityId::intern("pinned"), 10.0, 10.0, 100.0, 50.0);
        n.pinned = true;
        n.pinned_x = Some(30.0);
        n.pinned_y = Some(40.0);
        let cam = Camera::new(2.0, 100.0, 0.0);
        assert_eq!(n.screen_bounds(&cam), Bounds::new(30.0, 40.0, 100.0, 50.0));
        assert_eq!(n.world_bounds(&cam), Bounds::new(-35.0, 20.0, 50.0, 25.0));
    }

    #[test]
    fn node_patch_reports_geometry_change() {
        let mut n = Node::new(EntityId::intern("patch_me"), 0.0, 0.0, 100.0, 100.0);
        assert!(!NodePatch::default().apply(&mut n));
        let content = NodePatch {
            content: Some("hello".into()),
            ..Default::default()
        };
        assert!(!content.apply(&mut n));
        assert_eq!(n.content, "hello");
        assert!(NodePatch::position(5.0, 0.0).apply(&mut n));
    }
}
