//! Property-based invariant tests for the containment engine.
//!
//! 1. After enforcement every member lies inside its frame.
//! 2. Enforcement never shrinks a frame.
//! 3. A second enforcement pass is a no-op.
//! 4. The member cache equals the set of nodes naming the frame.

use proptest::prelude::*;
use wb_core::containment::{enforce, refresh_member_cache};
use wb_core::{BackgroundFrame, BoardState, EntityId, FRAME_PADDING, Node, lint_board};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Move { idx: usize, dx: f32, dy: f32 },
    Resize { idx: usize, w: f32, h: f32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, -120.0f32..120.0, -120.0f32..120.0)
            .prop_map(|(idx, dx, dy)| Op::Move { idx, dx, dy }),
        (0usize..4, 20.0f32..400.0, 20.0f32..400.0)
            .prop_map(|(idx, w, h)| Op::Resize { idx, w, h }),
    ]
}

fn seeded_board() -> (BoardState, EntityId) {
    let frame_id = EntityId::intern("prop_frame");
    let mut state = BoardState::default();
    state
        .frames
        .push(BackgroundFrame::new(frame_id, 0.0, 0.0, 1000.0, 800.0));
    for i in 0..4 {
        let mut node = Node::new(
            EntityId::intern(&format!("prop_node_{i}")),
            40.0 + i as f32 * 220.0,
            60.0,
            200.0,
            120.0,
        );
        node.container_id = Some(frame_id);
        state.nodes.push(node);
    }
    refresh_member_cache(&mut state, frame_id);
    (state, frame_id)
}

proptest! {
    #[test]
    fn members_always_inside_after_enforce(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let (mut state, frame_id) = seeded_board();
        for op in ops {
            match op {
                Op::Move { idx, dx, dy } => {
                    let node = &mut state.nodes[idx];
                    node.x += dx;
                    node.y += dy;
                }
                Op::Resize { idx, w, h } => {
                    let node = &mut state.nodes[idx];
                    node.width = w;
                    node.height = h;
                }
            }
            let before = state.frame(frame_id).unwrap().bounds();
            enforce(&mut state, frame_id, FRAME_PADDING);
            let frame = state.frame(frame_id).unwrap().clone();

            prop_assert!(frame.bounds().contains_bounds(&before), "frame shrank");
            for node in state.members_of(frame_id) {
                prop_assert!(
                    frame.bounds().contains_bounds(&node.bounds()),
                    "{:?} outside {:?}", node.bounds(), frame.bounds()
                );
            }
            let expected: Vec<EntityId> = state.members_of(frame_id).map(|n| n.id).collect();
            prop_assert_eq!(frame.node_ids.to_vec(), expected);

            let again = enforce(&mut state, frame_id, FRAME_PADDING);
            prop_assert!(again.is_noop());
            prop_assert!(lint_board(&state, FRAME_PADDING).is_empty());
        }
    }
}
