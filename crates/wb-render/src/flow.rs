//! Flow highlighting: the connections downstream of a selection.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::HashSet;
use wb_core::{BoardState, ConnectionKey, EntityId};

/// Directed graph of the board's connections. Self-loops are left out so a
/// loop never counts as "flow".
pub fn connection_graph(state: &BoardState) -> DiGraphMap<EntityId, ()> {
    let mut graph = DiGraphMap::new();
    for conn in state.connections.iter().filter(|c| !c.is_self_loop()) {
        graph.add_edge(conn.from, conn.to, ());
    }
    graph
}

/// Connections reachable by following edges forward from any of `roots`.
/// Returned in board order, one key per distinct edge.
pub fn downstream_connections(state: &BoardState, roots: &[EntityId]) -> Vec<ConnectionKey> {
    let graph = connection_graph(state);
    let mut reached: HashSet<EntityId> = HashSet::new();
    for &root in roots {
        if !graph.contains_node(root) || reached.contains(&root) {
            continue;
        }
        let mut dfs = Dfs::new(&graph, root);
        while let Some(id) = dfs.next(&graph) {
            reached.insert(id);
        }
    }

    let mut seen = HashSet::new();
    state
        .connections
        .iter()
        .filter(|c| !c.is_self_loop() && reached.contains(&c.from))
        .map(|c| c.key())
        .filter(|k| seen.insert(*k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wb_core::{Connection, Node};

    fn chain() -> (BoardState, Vec<EntityId>) {
        let ids: Vec<EntityId> = ["fl_a", "fl_b", "fl_c", "fl_d"]
            .iter()
            .map(|s| EntityId::intern(s))
            .collect();
        let mut state = BoardState::default();
        for (i, &id) in ids.iter().enumerate() {
            state
                .nodes
                .push(Node::new(id, i as f32 * 300.0, 0.0, 100.0, 100.0));
        }
        // a -> b -> c, d -> b, c -> c
        state.connections.push(Connection::new(ids[0], ids[1]));
        state.connections.push(Connection::new(ids[1], ids[2]));
        state.connections.push(Connection::new(ids[3], ids[1]));
        state.connections.push(Connection::new(ids[2], ids[2]));
        (state, ids)
    }

    #[test]
    fn follows_edges_forward_only() {
        let (state, ids) = chain();
        let flow = downstream_connections(&state, &[ids[1]]);
        assert_eq!(flow, vec![ConnectionKey::new(ids[1], ids[2])]);
    }

    #[test]
    fn multiple_roots_union() {
        let (state, ids) = chain();
        let flow = downstream_connections(&state, &[ids[0], ids[3]]);
        assert_eq!(
            flow,
            vec![
                ConnectionKey::new(ids[0], ids[1]),
                ConnectionKey::new(ids[1], ids[2]),
                ConnectionKey::new(ids[3], ids[1]),
            ]
        );
    }

    #[test]
    fn cycles_terminate() {
        let (mut state, ids) = chain();
        state.connections.push(Connection::new(ids[2], ids[0]));
        let flow = downstream_connections(&state, &[ids[2]]);
        assert_eq!(flow.len(), 3);
    }

    #[test]
    fn unconnected_root_has_no_flow() {
        let (state, _) = chain();
        assert!(downstream_connections(&state, &[EntityId::intern("fl_lonely")]).is_empty());
    }
}
