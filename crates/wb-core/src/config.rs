//! Tunable board constants.

use crate::model::{DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};
use crate::transform::{MAX_SCALE, MIN_SCALE, clamp_scale_to};
use serde::{Deserialize, Serialize};

/// Padding kept between a frame's edge and its members' bounding box.
pub const FRAME_PADDING: f32 = 20.0;

/// Knobs a host may override. `Default` carries the stock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    pub default_node_width: f32,
    pub default_node_height: f32,
    pub min_node_width: f32,
    pub min_node_height: f32,
    pub min_frame_width: f32,
    pub min_frame_height: f32,
    pub frame_padding: f32,
    /// Offset applied to duplicated nodes.
    pub duplicate_offset: f32,
    /// Maximum undo snapshots kept; the oldest is dropped past this.
    pub undo_depth: usize,
    /// World distance within which a dragged endpoint snaps to an anchor.
    pub anchor_snap_threshold: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplicative zoom step for keyboard zoom.
    pub zoom_step: f32,
    /// Screen margin used by zoom-to-fit.
    pub fit_margin: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_node_width: DEFAULT_NODE_WIDTH,
            default_node_height: DEFAULT_NODE_HEIGHT,
            min_node_width: 100.0,
            min_node_height: 60.0,
            min_frame_width: 100.0,
            min_frame_height: 80.0,
            frame_padding: FRAME_PADDING,
            duplicate_offset: 20.0,
            undo_depth: 100,
            anchor_snap_threshold: 30.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            zoom_step: 1.1,
            fit_margin: 40.0,
        }
    }
}

impl BoardConfig {
    /// Clamp a zoom level into this config's bounds.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        clamp_scale_to(scale, self.min_scale, self.max_scale)
    }
}
