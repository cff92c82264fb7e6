//! Rectangle clipping between a canvas and a requested segment.
//!
//! Rectangles are half-open: a segment at `x` with width `w` covers columns
//! `[x, x + w)`. Two rectangles that only touch along an edge do not
//! intersect. All arithmetic is done in `i64` so extreme coordinates can
//! not overflow.

/// A requested region in canvas coordinates. The origin may lie outside
/// the canvas; the extents must be positive to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Segment {
    /// Create a segment request
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A clipped, non-negative rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// The zero-area rectangle returned when nothing overlaps
    pub const EMPTY: Rect = Rect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Create a rectangle
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the rectangle covers no pixels
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Overlap of the canvas `[0, W) x [0, H)` with the segment, in canvas
/// coordinates.
#[must_use]
pub fn intersect_in_canvas_frame(canvas_width: u32, canvas_height: u32, segment: Segment) -> Rect {
    intersect(
        (0, 0, i64::from(canvas_width), i64::from(canvas_height)),
        (
            i64::from(segment.x),
            i64::from(segment.y),
            i64::from(segment.width),
            i64::from(segment.height),
        ),
    )
}

/// The same overlap as [`intersect_in_canvas_frame`], expressed relative to
/// the segment's own top-left corner. This is the frame an uploaded segment
/// buffer is indexed in.
#[must_use]
pub fn intersect_in_segment_frame(canvas_width: u32, canvas_height: u32, segment: Segment) -> Rect {
    intersect(
        (
            -i64::from(segment.x),
            -i64::from(segment.y),
            i64::from(canvas_width),
            i64::from(canvas_height),
        ),
        (0, 0, i64::from(segment.width), i64::from(segment.height)),
    )
}

fn intersect(a: (i64, i64, i64, i64), b: (i64, i64, i64, i64)) -> Rect {
    let left = a.0.max(b.0);
    let top = a.1.max(b.1);
    let right = (a.0 + a.2).min(b.0 + b.2);
    let bottom = (a.1 + a.3).min(b.1 + b.3);

    if right <= left || bottom <= top {
        return Rect::EMPTY;
    }

    // Both inputs keep their origin at 0 in one of the frames, so the clipped
    // values are non-negative and bounded by a u32 extent.
    match (
        u32::try_from(left),
        u32::try_from(top),
        u32::try_from(right - left),
        u32::try_from(bottom - top),
    ) {
        (Ok(x), Ok(y), Ok(width), Ok(height)) => Rect::new(x, y, width, height),
        _ => Rect::EMPTY,
    }
}
