//! Whiteboard editor: the `Board` entity store and everything that drives it.
//!
//! - `store`: every mutation of the board, with containment enforced
//! - `commands`: bounded undo history with gesture batching
//! - `tools`: pointer state machines (select, connect, anchor drag, resize, pan)
//! - `shortcuts`: key combos to actions

pub mod commands;
pub mod input;
pub mod shortcuts;
pub mod store;
pub mod tools;

pub use commands::{History, Snapshot};
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{Board, Marquee, Selection, Viewport};
pub use tools::{Tool, ToolController, ToolKind};
