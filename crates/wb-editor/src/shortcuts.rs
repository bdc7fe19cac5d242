//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s and applies
//! them to a board. The map lives in Rust so every host shares it.

use crate::store::Board;
use crate::tools::{ToolController, ToolKind};

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolConnect,
    ToolPan,

    // ── Edit ──
    Undo,
    Delete,
    SelectAll,
    Duplicate,
    AddNode,
    /// Wrap the selected nodes in a new background frame.
    FrameSelection,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ToggleGrid,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            // Shift+= arrives as "+" on most layouts.
            return match key {
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "c" | "C" => Some(ShortcutAction::ToolConnect),
            "h" | "H" => Some(ShortcutAction::ToolPan),
            "g" | "G" => Some(ShortcutAction::ToggleGrid),
            "n" | "N" => Some(ShortcutAction::AddNode),
            "f" | "F" => Some(ShortcutAction::FrameSelection),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

impl ShortcutAction {
    /// Run the action. Returns true when the board needs a redraw.
    pub fn apply(self, board: &mut Board, tools: &mut ToolController) -> bool {
        match self {
            Self::ToolSelect => tools.set_tool(ToolKind::Select),
            Self::ToolConnect => tools.set_tool(ToolKind::Connect),
            Self::ToolPan => tools.set_tool(ToolKind::Pan),
            Self::Undo => return board.undo().is_some(),
            Self::Delete => return board.delete_selection(),
            Self::SelectAll => board.select_all(),
            Self::Duplicate => return !board.duplicate_selected_nodes().is_empty(),
            Self::AddNode => {
                board.add_node_at_view_center();
            }
            Self::FrameSelection => return board.create_frame_around_selection("").is_some(),
            Self::ZoomIn => board.zoom_in(),
            Self::ZoomOut => board.zoom_out(),
            Self::ZoomToFit => return board.zoom_to_fit(),
            Self::ToggleGrid => {
                let show = !board.state().view.show_grid;
                board.set_show_grid(show);
            }
            Self::Deselect => board.clear_selection(),
        }
        log::debug!("shortcut {self:?}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", false, false, false, false),
            Some(ShortcutAction::ToolSelect)
        );
        assert_eq!(
            ShortcutMap::resolve("c", false, false, false, false),
            Some(ShortcutAction::ToolConnect)
        );
        assert_eq!(
            ShortcutMap::resolve("h", false, false, false, false),
            Some(ShortcutAction::ToolPan)
        );
    }

    #[test]
    fn resolve_edit_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // ⌘ works the same as Ctrl.
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            ShortcutMap::resolve("a", true, false, false, false),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(
            ShortcutMap::resolve("d", true, false, false, false),
            Some(ShortcutAction::Duplicate)
        );
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn resolve_view_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("=", true, false, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("+", true, true, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", true, false, false, false),
            Some(ShortcutAction::ZoomOut)
        );
        assert_eq!(
            ShortcutMap::resolve("0", true, false, false, false),
            Some(ShortcutAction::ZoomToFit)
        );
        assert_eq!(
            ShortcutMap::resolve("g", false, false, false, false),
            Some(ShortcutAction::ToggleGrid)
        );
    }

    #[test]
    fn resolve_board_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("n", false, false, false, false),
            Some(ShortcutAction::AddNode)
        );
        assert_eq!(
            ShortcutMap::resolve("f", false, false, false, false),
            Some(ShortcutAction::FrameSelection)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn unbound_keys_return_none() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("n", false, true, false, false), None);
        assert_eq!(ShortcutMap::resolve("g", true, false, false, false), None);
    }

    #[test]
    fn apply_add_then_undo() {
        let mut board = Board::default();
        let mut tools = ToolController::new();
        assert!(ShortcutAction::AddNode.apply(&mut board, &mut tools));
        assert_eq!(board.state().nodes.len(), 1);
        assert!(ShortcutAction::Undo.apply(&mut board, &mut tools));
        assert!(board.state().nodes.is_empty());
        assert!(!ShortcutAction::Undo.apply(&mut board, &mut tools));
    }

    #[test]
    fn apply_toggle_grid_and_tool() {
        let mut board = Board::default();
        let mut tools = ToolController::new();
        let before = board.state().view.show_grid;
        ShortcutAction::ToggleGrid.apply(&mut board, &mut tools);
        assert_eq!(board.state().view.show_grid, !before);
        ShortcutAction::ToolPan.apply(&mut board, &mut tools);
        assert_eq!(tools.active(), ToolKind::Pan);
    }
}
