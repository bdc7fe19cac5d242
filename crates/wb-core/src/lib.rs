pub mod config;
pub mod containment;
pub mod error;
pub mod id;
pub mod lint;
pub mod model;
pub mod snapshot;
pub mod transform;

pub use config::{BoardConfig, FRAME_PADDING};
pub use error::SnapshotError;
pub use id::{EntityId, IdGenerator};
pub use lint::{LintDiagnostic, LintSeverity, lint_board, repair_board};
pub use model::*;
pub use transform::Camera;
