//! Consistency diagnostics and repair for boards.
//!
//! `lint_board` reports referential and spatial problems without touching
//! the board. `repair_board` fixes the ones that can be fixed mechanically;
//! it runs on every snapshot load.

use crate::config::BoardConfig;
use crate::containment::{
    enforce_all, is_node_inside_frame, padded_member_bounds, refresh_all_member_caches,
};
use crate::id::EntityId;
use crate::model::{BoardState, ConnectionKey};
use smallvec::SmallVec;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Breaks an invariant the engine relies on.
    Warning,
    /// Legal but probably unintended.
    Info,
}

/// A single lint diagnostic.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The entity (or connection source) this refers to.
    pub entity_id: EntityId,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-connection").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all lint rules and return diagnostics.
#[must_use]
pub fn lint_board(state: &BoardState, padding: f32) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_duplicate_ids(state, &mut diags);
    lint_dangling_connections(state, &mut diags);
    lint_duplicate_connections(state, &mut diags);
    lint_missing_containers(state, &mut diags);
    lint_member_cache(state, &mut diags);
    lint_containment(state, padding, &mut diags);
    diags
}

/// What `repair_board` changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    pub dropped_nodes: usize,
    pub dropped_frames: usize,
    pub dropped_connections: usize,
    pub cleared_containers: usize,
}

/// Bring a freshly loaded board back to a consistent state. The zoom is
/// clamped into the config's range.
pub fn repair_board(state: &mut BoardState, config: &BoardConfig) -> RepairReport {
    let mut report = RepairReport::default();

    let mut seen = HashSet::new();
    let before = state.nodes.len();
    state.nodes.retain(|n| seen.insert(n.id));
    report.dropped_nodes = before - state.nodes.len();

    let before = state.frames.len();
    state.frames.retain(|f| seen.insert(f.id));
    report.dropped_frames = before - state.frames.len();

    let before = state.connections.len();
    let live: HashSet<EntityId> = seen;
    state
        .connections
        .retain(|c| live.contains(&c.from) && live.contains(&c.to));
    report.dropped_connections = before - state.connections.len();

    let frame_ids: HashSet<EntityId> = state.frames.iter().map(|f| f.id).collect();
    for node in &mut state.nodes {
        if let Some(fid) = node.container_id
            && (!frame_ids.contains(&fid) || node.pinned)
        {
            node.container_id = None;
            report.cleared_containers += 1;
        }
    }

    refresh_all_member_caches(state);
    enforce_all(state, config.frame_padding);
    state.view.scale = config.clamp_scale(state.view.scale);

    if report != RepairReport::default() {
        log::warn!("repaired board: {report:?}");
    }
    report
}

// ─── Rules ───────────────────────────────────────────────────────────────

fn lint_duplicate_ids(state: &BoardState, diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    let ids = state
        .nodes
        .iter()
        .map(|n| n.id)
        .chain(state.frames.iter().map(|f| f.id));
    for id in ids {
        if !seen.insert(id) {
            diags.push(LintDiagnostic {
                entity_id: id,
                message: format!("Id `{id}` is used by more than one entity."),
                severity: LintSeverity::Warning,
                rule: "duplicate-id",
            });
        }
    }
}

fn lint_dangling_connections(state: &BoardState, diags: &mut Vec<LintDiagnostic>) {
    for conn in &state.connections {
        for end in [conn.from, conn.to] {
            if !state.contains_entity(end) {
                diags.push(LintDiagnostic {
                    entity_id: conn.from,
                    message: format!(
                        "Connection `{}` → `{}` points at missing entity `{end}`.",
                        conn.from, conn.to
                    ),
                    severity: LintSeverity::Warning,
                    rule: "dangling-connection",
                });
            }
        }
    }
}

fn lint_duplicate_connections(state: &BoardState, diags: &mut Vec<LintDiagnostic>) {
    let mut seen: HashSet<ConnectionKey> = HashSet::new();
    let mut reported: HashSet<ConnectionKey> = HashSet::new();
    for conn in &state.connections {
        let key = conn.key();
        if !seen.insert(key) && reported.insert(key) {
            diags.push(LintDiagnostic {
                entity_id: conn.from,
                message: format!(
                    "More than one connection `{}` → `{}`; they are addressed together.",
                    conn.from, conn.to
                ),
                severity: LintSeverity::Info,
                rule: "duplicate-connection",
            });
        }
    }
}

fn lint_missing_containers(state: &BoardState, diags: &mut Vec<LintDiagnostic>) {
    for node in &state.nodes {
        if let Some(fid) = node.container_id
            && state.frame(fid).is_none()
        {
            diags.push(LintDiagnostic {
                entity_id: node.id,
                message: format!("Node `{}` names missing frame `{fid}`.", node.id),
                severity: LintSeverity::Warning,
                rule: "missing-container",
            });
        }
    }
}

fn lint_member_cache(state: &BoardState, diags: &mut Vec<LintDiagnostic>) {
    for frame in &state.frames {
        let expected: SmallVec<[EntityId; 8]> = state.members_of(frame.id).map(|n| n.id).collect();
        let mut cached = frame.node_ids.clone();
        let mut wanted = expected.clone();
        cached.sort();
        wanted.sort();
        if cached != wanted {
            diags.push(LintDiagnostic {
                entity_id: frame.id,
                message: format!(
                    "Frame `{}` caches {} member(s) but {} node(s) name it.",
                    frame.id,
                    frame.node_ids.len(),
                    expected.len()
                ),
                severity: LintSeverity::Warning,
                rule: "stale-member-cache",
            });
        }
    }
}

fn lint_containment(state: &BoardState, padding: f32, diags: &mut Vec<LintDiagnostic>) {
    for frame in &state.frames {
        for node in state.members_of(frame.id) {
            if !is_node_inside_frame(node, frame) {
                diags.push(LintDiagnostic {
                    entity_id: node.id,
                    message: format!("Node `{}` sticks out of frame `{}`.", node.id, frame.id),
                    severity: LintSeverity::Warning,
                    rule: "member-outside-frame",
                });
            }
        }
        if let Some(padded) = padded_member_bounds(state.members_of(frame.id), padding)
            && !frame.bounds().contains_bounds(&padded)
        {
            diags.push(LintDiagnostic {
                entity_id: frame.id,
                message: format!("Frame `{}` is smaller than its padded members.", frame.id),
                severity: LintSeverity::Warning,
                rule: "frame-overflow",
            });
        }
    }
}
