//! Property tests for the `Board` store.
//!
//! 1. Random edit sequences never leave a member outside its frame.
//! 2. `push_undo`, any single edit, `undo` restores the board exactly.

use proptest::prelude::*;
use wb_core::{Bounds, EntityId, NodePatch};
use wb_editor::Board;

#[derive(Debug, Clone)]
enum Edit {
    MoveNode { idx: usize, dx: f32, dy: f32 },
    ResizeNode { idx: usize, w: f32, h: f32 },
    MoveFrame { dx: f32, dy: f32 },
    ResizeFrame { w: f32, h: f32 },
    Assign { idx: usize },
    Collapse,
    Delete { idx: usize },
    Connect { a: usize, b: usize },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0usize..4, -150.0f32..150.0, -150.0f32..150.0)
            .prop_map(|(idx, dx, dy)| Edit::MoveNode { idx, dx, dy }),
        2 => (0usize..4, 50.0f32..400.0, 30.0f32..300.0)
            .prop_map(|(idx, w, h)| Edit::ResizeNode { idx, w, h }),
        1 => (-100.0f32..100.0, -100.0f32..100.0).prop_map(|(dx, dy)| Edit::MoveFrame { dx, dy }),
        1 => (50.0f32..900.0, 50.0f32..900.0).prop_map(|(w, h)| Edit::ResizeFrame { w, h }),
        2 => (0usize..4).prop_map(|idx| Edit::Assign { idx }),
        1 => Just(Edit::Collapse),
        1 => (0usize..4).prop_map(|idx| Edit::Delete { idx }),
        1 => (0usize..4, 0usize..4).prop_map(|(a, b)| Edit::Connect { a, b }),
    ]
}

fn seeded_board() -> (Board, EntityId) {
    let mut board = Board::default();
    let frame = board.create_background_frame(0.0, 0.0, 700.0, 500.0);
    for i in 0..4 {
        let id = board.add_node(30.0 + i as f32 * 60.0, 30.0 + i as f32 * 40.0);
        board.resize_node(id, 120.0, 80.0);
        if i % 2 == 0 {
            board.assign_node_to_frame(id, frame);
        }
    }
    (board, frame)
}

fn node_at(board: &Board, idx: usize) -> Option<EntityId> {
    let nodes = &board.state().nodes;
    (!nodes.is_empty()).then(|| nodes[idx % nodes.len()].id)
}

fn apply(board: &mut Board, frame: EntityId, edit: &Edit) {
    match *edit {
        Edit::MoveNode { idx, dx, dy } => {
            if let Some(id) = node_at(board, idx) {
                let n = board.state().node(id).unwrap();
                let (x, y) = (n.x + dx, n.y + dy);
                board.update_node(id, NodePatch::position(x, y));
            }
        }
        Edit::ResizeNode { idx, w, h } => {
            if let Some(id) = node_at(board, idx) {
                board.resize_node(id, w, h);
            }
        }
        Edit::MoveFrame { dx, dy } => {
            board.move_background_frame(frame, dx, dy);
        }
        Edit::ResizeFrame { w, h } => {
            if let Some(f) = board.state().frame(frame) {
                let requested = Bounds::new(f.x, f.y, w, h);
                board.resize_background_frame(frame, requested);
            }
        }
        Edit::Assign { idx } => {
            if let Some(id) = node_at(board, idx) {
                board.assign_node_to_frame(id, frame);
            }
        }
        Edit::Collapse => {
            board.toggle_frame_collapsed(frame);
        }
        Edit::Delete { idx } => {
            if let Some(id) = node_at(board, idx) {
                board.delete_node(id);
            }
        }
        Edit::Connect { a, b } => {
            if let (Some(a), Some(b)) = (node_at(board, a), node_at(board, b)) {
                board.add_connection(a, b, None, None);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn members_stay_inside_their_frame(edits in prop::collection::vec(edit_strategy(), 1..24)) {
        let (mut board, frame) = seeded_board();
        for edit in &edits {
            apply(&mut board, frame, edit);
            let f = board.state().frame(frame).unwrap().bounds();
            for node in board.state().nodes.iter().filter(|n| n.container_id == Some(frame)) {
                prop_assert!(
                    f.contains_bounds(&node.bounds()),
                    "{} at {:?} escaped frame {:?} after {:?}",
                    node.id, node.bounds(), f, edit
                );
            }
            let broken: Vec<_> = board
                .lint()
                .into_iter()
                .filter(|d| d.rule != "duplicate-connection")
                .collect();
            prop_assert!(broken.is_empty(), "lint after {:?}: {:?}", edit, broken);
        }
    }

    #[test]
    fn single_edit_undoes_exactly(
        setup in prop::collection::vec(edit_strategy(), 0..8),
        edit in edit_strategy(),
    ) {
        let (mut board, frame) = seeded_board();
        for e in &setup {
            apply(&mut board, frame, e);
        }
        let before = board.state().clone();
        board.push_undo("checkpoint");
        apply(&mut board, frame, &edit);
        prop_assert!(board.undo().is_some());
        prop_assert_eq!(board.state(), &before);
    }
}
