use chartographer_core::Segment;
use serde::Deserialize;

/// Query parameters for canvas creation
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CreateChartaQuery {
    pub width: i32,
    pub height: i32,
}

/// Query parameters addressing a segment
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SegmentQuery {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<SegmentQuery> for Segment {
    fn from(query: SegmentQuery) -> Self {
        Segment::new(query.x, query.y, query.width, query.height)
    }
}
