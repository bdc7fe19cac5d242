//! Hit testing and marquee selection over world coordinates.

use smallvec::SmallVec;
use wb_core::{BoardState, Bounds, Camera, EntityId, Point};

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Node(EntityId),
    Frame(EntityId),
}

impl Hit {
    pub fn id(&self) -> EntityId {
        match self {
            Hit::Node(id) | Hit::Frame(id) => *id,
        }
    }
}

/// Frame corner grabbed by a resize drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn position_on(self, b: &Bounds) -> Point {
        match self {
            Corner::TopLeft => Point::new(b.x, b.y),
            Corner::TopRight => Point::new(b.right(), b.y),
            Corner::BottomLeft => Point::new(b.x, b.bottom()),
            Corner::BottomRight => Point::new(b.right(), b.bottom()),
        }
    }

    /// Box produced by dragging this corner to `to` while the opposite
    /// corner stays put. May be inverted; the store clamps it.
    pub fn drag(self, b: &Bounds, to: Point) -> Bounds {
        let (left, top, right, bottom) = match self {
            Corner::TopLeft => (to.x, to.y, b.right(), b.bottom()),
            Corner::TopRight => (b.x, to.y, to.x, b.bottom()),
            Corner::BottomLeft => (to.x, b.y, b.right(), to.y),
            Corner::BottomRight => (b.x, b.y, to.x, to.y),
        };
        Bounds::new(left, top, right - left, bottom - top)
    }
}

/// Topmost entity under a world point.
///
/// Pinned nodes paint above everything, then nodes in reverse insertion
/// order, then frames (last frame first). Nodes inside a collapsed frame are
/// hidden and never hit; a collapsed frame is hit on its pill.
pub fn hit_test(state: &BoardState, camera: &Camera, p: Point) -> Option<Hit> {
    let visible = move || state.nodes.iter().rev().filter(move |n| !state.is_hidden(n));

    visible()
        .filter(|n| n.pinned)
        .chain(visible().filter(|n| !n.pinned))
        .find(|n| n.world_bounds(camera).contains(p.x, p.y))
        .map(|n| Hit::Node(n.id))
        .or_else(|| {
            state
                .frames
                .iter()
                .rev()
                .find(|f| f.visible_bounds().contains(p.x, p.y))
                .map(|f| Hit::Frame(f.id))
        })
}

/// Resize handle of an expanded frame within `radius` of `p`.
pub fn frame_corner_at(state: &BoardState, p: Point, radius: f32) -> Option<(EntityId, Corner)> {
    state
        .frames
        .iter()
        .rev()
        .filter(|f| !f.collapsed)
        .find_map(|f| {
            let b = f.bounds();
            Corner::ALL
                .into_iter()
                .find(|c| c.position_on(&b).distance(p) <= radius)
                .map(|c| (f.id, c))
        })
}

/// Result of a marquee query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarqueeHits {
    pub nodes: SmallVec<[EntityId; 16]>,
    pub frames: SmallVec<[EntityId; 4]>,
}

impl MarqueeHits {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.frames.is_empty()
    }
}

/// Entities selected by a marquee between two world corners given in any
/// order. Nodes must lie entirely inside the rectangle; frames only need to
/// intersect it. Collapsed frames and the nodes they hide are skipped.
pub fn marquee_select(
    state: &BoardState,
    camera: &Camera,
    start: Point,
    end: Point,
) -> MarqueeHits {
    let rect = Bounds::from_corners(start, end);
    MarqueeHits {
        nodes: state
            .nodes
            .iter()
            .filter(|n| !state.is_hidden(n))
            .filter(|n| rect.contains_bounds(&n.world_bounds(camera)))
            .map(|n| n.id)
            .collect(),
        frames: state
            .frames
            .iter()
            .filter(|f| !f.collapsed && f.bounds().intersects(&rect))
            .map(|f| f.id)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::{BackgroundFrame, Node};

    fn board() -> BoardState {
        let mut state = BoardState::default();
        let f = EntityId::intern("h_frame");
        state
            .frames
            .push(BackgroundFrame::new(f, 0.0, 0.0, 400.0, 300.0));
        let mut inner = Node::new(EntityId::intern("h_inner"), 20.0, 20.0, 100.0, 60.0);
        inner.container_id = Some(f);
        state.nodes.push(inner);
        state
            .nodes
            .push(Node::new(EntityId::intern("h_over"), 50.0, 40.0, 100.0, 60.0));
        state
    }

    #[test]
    fn later_nodes_are_on_top() {
        let state = board();
        let hit = hit_test(&state, &Camera::default(), Point::new(60.0, 50.0));
        assert_eq!(hit, Some(Hit::Node(EntityId::intern("h_over"))));
    }

    #[test]
    fn frame_is_hit_below_nodes() {
        let state = board();
        let hit = hit_test(&state, &Camera::default(), Point::new(300.0, 250.0));
        assert_eq!(hit, Some(Hit::Frame(EntityId::intern("h_frame"))));
        assert_eq!(hit_test(&state, &Camera::default(), Point::new(900.0, 0.0)), None);
    }

    #[test]
    fn pinned_nodes_win() {
        let mut state = board();
        let mut pinned = Node::new(EntityId::intern("h_pinned"), 0.0, 0.0, 50.0, 50.0);
        pinned.pinned = true;
        pinned.pinned_x = Some(40.0);
        pinned.pinned_y = Some(30.0);
        state.nodes.insert(0, pinned);
        let hit = hit_test(&state, &Camera::default(), Point::new(60.0, 50.0));
        assert_eq!(hit, Some(Hit::Node(EntityId::intern("h_pinned"))));
    }

    #[test]
    fn collapsed_frame_hides_members() {
        let mut state = board();
        state.frames[0].collapsed = true;
        let cam = Camera::default();
        assert_eq!(hit_test(&state, &cam, Point::new(25.0, 25.0)), None);
        let pill = state.frames[0].pill_bounds().center();
        assert_eq!(
            hit_test(&state, &cam, pill),
            Some(Hit::Frame(EntityId::intern("h_frame")))
        );
    }

    #[test]
    fn marquee_exact_box_selects_node() {
        let state = board();
        let hits = marquee_select(
            &state,
            &Camera::default(),
            Point::new(150.0, 100.0),
            Point::new(50.0, 40.0),
        );
        assert_eq!(hits.nodes.to_vec(), vec![EntityId::intern("h_over")]);
        assert_eq!(hits.frames.to_vec(), vec![EntityId::intern("h_frame")]);
    }

    #[test]
    fn marquee_partial_overlap_does_not_select_node() {
        let state = board();
        let hits = marquee_select(
            &state,
            &Camera::default(),
            Point::new(51.0, 40.0),
            Point::new(150.0, 100.0),
        );
        assert!(hits.nodes.is_empty());
    }

    #[test]
    fn marquee_skips_collapsed_frames() {
        let mut state = board();
        state.frames[0].collapsed = true;
        let hits = marquee_select(
            &state,
            &Camera::default(),
            Point::new(-10.0, -10.0),
            Point::new(500.0, 500.0),
        );
        assert_eq!(hits.nodes.to_vec(), vec![EntityId::intern("h_over")]);
        assert!(hits.frames.is_empty());
    }

    #[test]
    fn corner_drag_keeps_opposite_corner() {
        let b = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            Corner::TopLeft.drag(&b, Point::new(-20.0, 10.0)),
            Bounds::new(-20.0, 10.0, 120.0, 90.0)
        );
        let state = board();
        assert_eq!(
            frame_corner_at(&state, Point::new(398.0, 302.0), 8.0),
            Some((EntityId::intern("h_frame"), Corner::BottomRight))
        );
    }
}
