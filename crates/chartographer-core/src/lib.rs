//! Chartographer Core - canvas storage and segment access
//!
//! This crate provides the engine behind the Chartographer service:
//! - Id: canvas identifiers and the candidate id counter
//! - Store: one raster file per canvas in a single directory
//! - Boundary: clipping a requested rectangle against a canvas
//! - Codec: raster encode/decode contract and the BMP adapter
//! - Locks: per-canvas reader/writer exclusion
//! - Service: create, read segment, write segment, delete
//! - Error: error taxonomy shared by all of the above
//!
//! ## Usage
//!
//! ```no_run
//! use chartographer_core::{CanvasService, Segment};
//!
//! # fn main() -> chartographer_core::Result<()> {
//! let service = CanvasService::open("/var/lib/chartographer")?;
//! let id = service.create(12_000, 16_000)?;
//! let bmp = service.read_segment(id, Segment::new(-10, -10, 300, 300))?;
//! # let _ = bmp;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod boundary;
pub mod codec;
pub mod error;
pub mod id;
pub mod locks;
pub mod service;
pub mod store;

// Re-export main types
pub use boundary::{intersect_in_canvas_frame, intersect_in_segment_frame, Rect, Segment};
pub use codec::{BmpCodec, Raster, RasterCodec, RasterLimits, BACKGROUND, DEFAULT_MAX_PIXELS};
pub use error::{Error, Result};
pub use id::{CanvasId, IdAllocator};
pub use locks::CanvasLocks;
pub use service::CanvasService;
pub use store::CanvasStore;
