//! Node ⇄ frame containment.
//!
//! Two rules keep a frame and its members consistent after any geometry or
//! membership change:
//!
//! 1. **Eviction**: a member whose box is no longer fully inside the frame
//!    loses its `container_id`. The frame is not resized to recapture it.
//! 2. **Auto-expand**: the frame grows until it contains the padded
//!    bounding box of its remaining members. Growth is one-directional;
//!    only an explicit resize shrinks a frame, and that resize is clamped
//!    by [`clamp_frame_resize`].

use crate::id::EntityId;
use crate::model::{BackgroundFrame, BoardState, Bounds, Node};
use smallvec::SmallVec;

/// What an enforcement pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainmentReport {
    pub evicted: SmallVec<[EntityId; 4]>,
    /// The frame box before growth, if it grew.
    pub expanded_from: Option<Bounds>,
}

impl ContainmentReport {
    pub fn is_noop(&self) -> bool {
        self.evicted.is_empty() && self.expanded_from.is_none()
    }
}

/// True if every edge of the node lies within the frame, edges inclusive.
/// Pinned nodes live in screen space and are never inside a frame.
pub fn is_node_inside_frame(node: &Node, frame: &BackgroundFrame) -> bool {
    !node.pinned && frame.bounds().contains_bounds(&node.bounds())
}

/// Bounding box of the given nodes, `None` when there are none.
pub fn member_bounds<'a>(members: impl IntoIterator<Item = &'a Node>) -> Option<Bounds> {
    Bounds::union_all(members.into_iter().map(Node::bounds))
}

/// Members' bounding box grown by `padding` on every side.
pub fn padded_member_bounds<'a>(
    members: impl IntoIterator<Item = &'a Node>,
    padding: f32,
) -> Option<Bounds> {
    member_bounds(members).map(|b| b.inflate(padding))
}

/// True if the padded box of the frame's members pokes out of the frame on
/// any side. `nodes` is the whole node collection; members are picked by
/// `container_id`.
pub fn is_frame_overflowed(nodes: &[Node], frame: &BackgroundFrame, padding: f32) -> bool {
    let members = nodes.iter().filter(|n| n.container_id == Some(frame.id));
    match padded_member_bounds(members, padding) {
        Some(padded) => !frame.bounds().contains_bounds(&padded),
        None => false,
    }
}

/// Smallest growth of `frame` that contains `padded`. Sides that already
/// contain it stay where they are.
pub fn expanded_to_contain(frame: &Bounds, padded: &Bounds) -> Bounds {
    frame.union(padded)
}

/// Clamp a manual frame resize so it never cuts into the members' padded
/// box and never drops below the minimum size.
///
/// Undersized requests grow right/down from the requested origin; an origin
/// past the members' padded edge is pulled back to that edge.
pub fn clamp_frame_resize(
    requested: Bounds,
    padded_members: Option<Bounds>,
    min_width: f32,
    min_height: f32,
) -> Bounds {
    let width = if requested.width.is_nan() {
        min_width
    } else {
        requested.width.max(min_width)
    };
    let height = if requested.height.is_nan() {
        min_height
    } else {
        requested.height.max(min_height)
    };
    let sized = Bounds::new(requested.x, requested.y, width, height);

    let Some(p) = padded_members else {
        return sized;
    };
    let x = sized.x.min(p.x);
    let y = sized.y.min(p.y);
    let right = sized.right().max(p.right());
    let bottom = sized.bottom().max(p.bottom());
    Bounds::new(x, y, right - x, bottom - y)
}

/// Rebuild `frame.node_ids` from the nodes' `container_id`s.
pub fn refresh_member_cache(state: &mut BoardState, frame_id: EntityId) {
    let members: SmallVec<[EntityId; 8]> = state.members_of(frame_id).map(|n| n.id).collect();
    if let Some(frame) = state.frame_mut(frame_id) {
        frame.node_ids = members;
    }
}

/// Rebuild every frame's member cache.
pub fn refresh_all_member_caches(state: &mut BoardState) {
    let ids: Vec<EntityId> = state.frames.iter().map(|f| f.id).collect();
    for id in ids {
        refresh_member_cache(state, id);
    }
}

/// Run eviction, then auto-expand, for one frame. Unknown frames are a
/// no-op.
pub fn enforce(state: &mut BoardState, frame_id: EntityId, padding: f32) -> ContainmentReport {
    let mut report = ContainmentReport::default();
    let Some(frame) = state.frame(frame_id).cloned() else {
        return report;
    };

    for node in state
        .nodes
        .iter_mut()
        .filter(|n| n.container_id == Some(frame_id))
    {
        if !is_node_inside_frame(node, &frame) {
            log::debug!("evicting {} from frame {}", node.id, frame_id);
            node.container_id = None;
            report.evicted.push(node.id);
        }
    }
    refresh_member_cache(state, frame_id);

    if let Some(padded) = padded_member_bounds(state.members_of(frame_id), padding) {
        let current = frame.bounds();
        if !current.contains_bounds(&padded) {
            let grown = expanded_to_contain(&current, &padded);
            log::debug!("expanding frame {frame_id} from {current:?} to {grown:?}");
            if let Some(f) = state.frame_mut(frame_id) {
                f.set_bounds(grown);
            }
            report.expanded_from = Some(current);
        }
    }
    report
}

/// Enforce containment for several frames, each exactly once.
pub fn enforce_many(
    state: &mut BoardState,
    frame_ids: impl IntoIterator<Item = EntityId>,
    padding: f32,
) -> Vec<(EntityId, ContainmentReport)> {
    let mut seen: SmallVec<[EntityId; 8]> = SmallVec::new();
    let mut out = Vec::new();
    for id in frame_ids {
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        out.push((id, enforce(state, id, padding)));
    }
    out
}

/// Enforce containment for every frame on the board.
pub fn enforce_all(state: &mut BoardState, padding: f32) {
    let ids: Vec<EntityId> = state.frames.iter().map(|f| f.id).collect();
    enforce_many(state, ids, padding);
}
