//! Property tests for anchor selection and marquee semantics.
//!
//! 1. `optimal_anchors(A, B)` and `optimal_anchors(B, A)` pick opposite pairs.
//! 2. Each end of the pair faces the other entity.
//! 3. A node whose box equals the marquee is selected; shrinking the marquee
//!    by one unit on any side deselects it.

use proptest::prelude::*;
use wb_core::{Anchor, BoardState, Bounds, Camera, Connection, EntityId, Node, Point};
use wb_render::{marquee_select, optimal_anchors, route_connection, PathVariant};

// ── Helpers ─────────────────────────────────────────────────────────────

fn bounds_strategy() -> impl Strategy<Value = Bounds> {
    (-2000.0f32..2000.0, -2000.0f32..2000.0, 10.0f32..500.0, 10.0f32..500.0)
        .prop_map(|(x, y, w, h)| Bounds::new(x, y, w, h))
}

#[test]
fn side_by_side_nodes_connect_right_to_left() {
    let a = EntityId::intern("prop_ex8_a");
    let b = EntityId::intern("prop_ex8_b");
    let mut state = BoardState::default();
    state.nodes.push(Node::new(a, 0.0, 0.0, 100.0, 50.0));
    state.nodes.push(Node::new(b, 300.0, 0.0, 100.0, 50.0));
    state.connections.push(Connection::new(a, b));

    let routed = route_connection(&state, 0, &Camera::default(), PathVariant::Standard).unwrap();
    assert_eq!(routed.anchors.from, Anchor::Right);
    assert_eq!(routed.anchors.to, Anchor::Left);
}

proptest! {
    #[test]
    fn anchor_choice_is_symmetric(a in bounds_strategy(), b in bounds_strategy()) {
        prop_assume!(a.center() != b.center());
        let ab = optimal_anchors(&a, &b);
        let ba = optimal_anchors(&b, &a);
        prop_assert_eq!(ab.from, ba.to);
        prop_assert_eq!(ab.to, ba.from);
        prop_assert_eq!(ab.from.opposite(), ab.to);
    }

    #[test]
    fn anchors_face_each_other(a in bounds_strategy(), b in bounds_strategy()) {
        let pair = optimal_anchors(&a, &b);
        let (ca, cb) = (a.center(), b.center());
        let (nx, ny) = pair.from.normal();
        prop_assert!((cb.x - ca.x) * nx + (cb.y - ca.y) * ny >= 0.0);
    }

    #[test]
    fn marquee_requires_full_containment(b in bounds_strategy(), side in 0usize..4) {
        let id = EntityId::intern("prop_marquee_node");
        let mut state = BoardState::default();
        state.nodes.push(Node::new(id, b.x, b.y, b.width, b.height));
        let cam = Camera::default();

        let (top_left, bottom_right) = (Point::new(b.x, b.y), Point::new(b.right(), b.bottom()));
        let exact = marquee_select(&state, &cam, top_left, bottom_right);
        prop_assert_eq!(exact.nodes.to_vec(), vec![id]);

        let (mut x0, mut y0, mut x1, mut y1) = (b.x, b.y, b.right(), b.bottom());
        match side {
            0 => x0 += 1.0,
            1 => y0 += 1.0,
            2 => x1 -= 1.0,
            _ => y1 -= 1.0,
        }
        let short = marquee_select(&state, &cam, Point::new(x0, y0), Point::new(x1, y1));
        prop_assert!(short.nodes.is_empty());
    }
}
