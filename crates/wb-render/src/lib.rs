pub mod flow;
pub mod hit;
pub mod paint;
pub mod router;

pub use flow::downstream_connections;
pub use hit::{Corner, Hit, MarqueeHits, frame_corner_at, hit_test, marquee_select};
pub use paint::{PaintContext, paint_board};
pub use router::{
    PathVariant, RoutedConnection, effective_anchors, hit_test_connection, nearest_anchor,
    optimal_anchors, route_all, route_connection, snap_anchor,
};
