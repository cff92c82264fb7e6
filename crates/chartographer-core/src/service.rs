//! Canvas Service
//!
//! The four public operations (create, read segment, write segment,
//! delete). Validation and error classification happen here; the store,
//! codec and clipping helpers below never decide what the caller sees.
//!
//! All calls block. Work on one canvas is serialized through
//! [`CanvasLocks`]: reads share access, writes and deletes are exclusive.
//! Writes re-encode the whole canvas, so their cost grows with the canvas
//! size rather than the segment size.

use image::imageops;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::boundary::{intersect_in_canvas_frame, intersect_in_segment_frame, Segment};
use crate::codec::{crop, filled, BmpCodec, RasterCodec, BACKGROUND};
use crate::error::{Error, Result};
use crate::id::CanvasId;
use crate::locks::CanvasLocks;
use crate::store::CanvasStore;

/// Entry point for canvas operations
pub struct CanvasService {
    store: CanvasStore,
    codec: Arc<dyn RasterCodec>,
    locks: CanvasLocks,
}

impl CanvasService {
    /// Create a BMP-backed service storing canvases under `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_codec(root, Arc::new(BmpCodec::new()))
    }

    /// Create a service with a specific codec
    pub fn with_codec(root: impl Into<PathBuf>, codec: Arc<dyn RasterCodec>) -> Result<Self> {
        let store = CanvasStore::new(root, codec.extension())?;
        Ok(Self {
            store,
            codec,
            locks: CanvasLocks::new(),
        })
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    /// MIME type of segments returned by [`CanvasService::read_segment`]
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.codec.content_type()
    }

    /// Create a blank canvas and return its id
    pub fn create(&self, width: i32, height: i32) -> Result<CanvasId> {
        let (width, height) = validate_extent(width, height)?;
        self.codec.limits().check(width, height)?;

        let placeholder = Placeholder::new(&self.store, self.store.create()?);
        let id = placeholder.id;

        self.locks.with_write(id, || {
            let bytes = self.codec.encode(&filled(width, height, BACKGROUND))?;
            self.store.replace(id, &bytes)
        })?;
        placeholder.keep();

        info!(%id, width, height, "Canvas created");
        Ok(id)
    }

    /// Read the part of `segment` that overlaps the canvas.
    ///
    /// The returned raster is clipped: its size is the overlap, not the
    /// requested extent.
    pub fn read_segment(&self, id: CanvasId, segment: Segment) -> Result<Vec<u8>> {
        validate_extent(segment.width, segment.height)?;
        self.ensure_exists(id)?;

        self.locks.with_read(id, || {
            let bytes = self.store.read(id)?;
            let (width, height) = self.codec.dimensions(&bytes)?;

            let rect = intersect_in_canvas_frame(width, height, segment);
            if rect.is_empty() {
                return Err(no_intersection(segment));
            }

            debug!(%id, ?segment, ?rect, "Reading canvas segment");
            let region = self.codec.decode_region(&bytes, rect)?;
            self.codec.encode(&region)
        })
    }

    /// Paint `data`, an encoded raster of exactly `segment.width` x
    /// `segment.height`, onto the canvas at `(segment.x, segment.y)`.
    /// Pixels falling outside the canvas are discarded. When nothing
    /// overlaps the canvas is left untouched.
    pub fn write_segment(&self, id: CanvasId, segment: Segment, data: &[u8]) -> Result<()> {
        let (seg_width, seg_height) = validate_extent(segment.width, segment.height)?;
        self.codec.limits().check(seg_width, seg_height)?;
        self.ensure_exists(id)?;

        let patch = self.codec.decode(data)?;
        if patch.dimensions() != (seg_width, seg_height) {
            return Err(Error::validation(format!(
                "segment declared as {}x{} but payload is {}x{}",
                seg_width,
                seg_height,
                patch.width(),
                patch.height()
            )));
        }

        self.locks.with_write(id, || {
            let bytes = self.store.read(id)?;
            let (width, height) = self.codec.dimensions(&bytes)?;

            let seg_rect = intersect_in_segment_frame(width, height, segment);
            let canvas_rect = intersect_in_canvas_frame(width, height, segment);
            if seg_rect.is_empty() || canvas_rect.is_empty() {
                return Err(no_intersection(segment));
            }

            debug!(%id, ?segment, ?canvas_rect, "Writing canvas segment");
            let patch = crop(&patch, seg_rect)?;
            let mut canvas = self.codec.decode(&bytes)?;
            imageops::replace(
                &mut canvas,
                &patch,
                i64::from(canvas_rect.x),
                i64::from(canvas_rect.y),
            );

            let encoded = self.codec.encode(&canvas)?;
            self.store.replace(id, &encoded)
        })
    }

    /// Delete a canvas. Deleting an unknown or already deleted id fails.
    pub fn delete(&self, id: CanvasId) -> Result<()> {
        self.ensure_exists(id)?;

        self.locks.with_write(id, || {
            if self.store.delete(id) {
                info!(%id, "Canvas deleted");
                Ok(())
            } else if self.store.exists(id) {
                Err(Error::storage(format!("cannot remove canvas {}", id)))
            } else {
                Err(Error::NotFound(id))
            }
        })
    }

    fn ensure_exists(&self, id: CanvasId) -> Result<()> {
        if self.store.exists(id) {
            Ok(())
        } else {
            Err(Error::NotFound(id))
        }
    }
}

/// Freshly allocated canvas file that is removed again unless kept
struct Placeholder<'a> {
    store: &'a CanvasStore,
    id: CanvasId,
    armed: bool,
}

impl<'a> Placeholder<'a> {
    fn new(store: &'a CanvasStore, id: CanvasId) -> Self {
        Self {
            store,
            id,
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for Placeholder<'_> {
    fn drop(&mut self) {
        if self.armed && !self.store.delete(self.id) {
            warn!(id = %self.id, "Failed to remove placeholder of unfinished canvas");
        }
    }
}

fn validate_extent(width: i32, height: i32) -> Result<(u32, u32)> {
    if width <= 0 {
        return Err(Error::validation(format!("width = {} <= 0", width)));
    }
    if height <= 0 {
        return Err(Error::validation(format!("height = {} <= 0", height)));
    }
    // Both are positive i32 values here.
    Ok((width.unsigned_abs(), height.unsigned_abs()))
}

fn no_intersection(segment: Segment) -> Error {
    Error::NoIntersection {
        x: segment.x,
        y: segment.y,
        width: segment.width,
        height: segment.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

    fn setup_service() -> (TempDir, CanvasService) {
        let dir = TempDir::new().unwrap();
        let service = CanvasService::open(dir.path()).unwrap();
        (dir, service)
    }

    fn block(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
        BmpCodec::new().encode(&filled(width, height, color)).unwrap()
    }

    fn decode(bytes: &[u8]) -> crate::codec::Raster {
        BmpCodec::new().decode(bytes).unwrap()
    }

    fn read_all(service: &CanvasService, id: CanvasId, width: i32, height: i32) -> crate::codec::Raster {
        decode(&service.read_segment(id, Segment::new(0, 0, width, height)).unwrap())
    }

    /// 100x100 canvas, green everywhere
    fn green_canvas(service: &CanvasService) -> CanvasId {
        let id = service.create(100, 100).unwrap();
        service
            .write_segment(id, Segment::new(0, 0, 100, 100), &block(100, 100, GREEN))
            .unwrap();
        id
    }

    #[test]
    fn test_create_blank_canvas() {
        let (_dir, service) = setup_service();
        let id = service.create(30, 20).unwrap();
        let raster = read_all(&service, id, 30, 20);
        assert_eq!(raster.dimensions(), (30, 20));
        assert!(raster.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_create_rejects_non_positive_extent() {
        let (dir, service) = setup_service();
        for (w, h) in [(-3, 4), (3, -4), (-3, -4), (0, 5), (5, 0)] {
            let err = service.create(w, h).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{}x{}", w, h);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_rejects_oversized_canvas() {
        let (dir, service) = setup_service();
        for (w, h) in [(i32::MAX, i32::MAX), (100_000, 100_000), (65_536, 1), (16_385, 16_384)] {
            let err = service.create(w, h).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{}x{}", w, h);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_honours_configured_limit() {
        let dir = TempDir::new().unwrap();
        let service =
            CanvasService::with_codec(dir.path(), Arc::new(BmpCodec::with_max_pixels(100))).unwrap();

        let id = service.create(10, 10).unwrap();
        let raster = read_all(&service, id, 10, 10);
        assert_eq!(raster.dimensions(), (10, 10));

        let err = service.create(11, 10).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(service.store().ids().unwrap(), vec![id]);
    }

    /// BMP codec whose encoder blows up
    struct PanickingCodec(BmpCodec);

    impl RasterCodec for PanickingCodec {
        fn extension(&self) -> &'static str {
            self.0.extension()
        }
        fn content_type(&self) -> &'static str {
            self.0.content_type()
        }
        fn limits(&self) -> crate::codec::RasterLimits {
            self.0.limits()
        }
        fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32)> {
            self.0.dimensions(bytes)
        }
        fn encode(&self, _raster: &crate::codec::Raster) -> Result<Vec<u8>> {
            panic!("encoder failure")
        }
        fn decode(&self, bytes: &[u8]) -> Result<crate::codec::Raster> {
            self.0.decode(bytes)
        }
    }

    #[test]
    fn test_create_removes_placeholder_on_panic() {
        let dir = TempDir::new().unwrap();
        let service =
            CanvasService::with_codec(dir.path(), Arc::new(PanickingCodec(BmpCodec::new()))).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = service.create(10, 10);
        }));
        assert!(outcome.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(service.locks.is_empty());
    }

    #[test]
    fn test_write_rejects_oversized_segment() {
        let (_dir, service) = setup_service();
        let id = service.create(10, 10).unwrap();
        let err = service
            .write_segment(id, Segment::new(0, 0, 70_000, 1), b"irrelevant")
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_created_ids_are_distinct() {
        let (_dir, service) = setup_service();
        let mut ids: Vec<_> = (0..5).map(|_| service.create(2, 2).unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_read_segment_inside() {
        let (_dir, service) = setup_service();
        let id = green_canvas(&service);
        let raster = decode(&service.read_segment(id, Segment::new(1, 1, 5, 5)).unwrap());
        assert_eq!(raster.dimensions(), (5, 5));
        assert!(raster.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn test_read_segment_is_clipped() {
        let (_dir, service) = setup_service();
        let id = green_canvas(&service);

        let raster = decode(&service.read_segment(id, Segment::new(-1, -1, 5, 5)).unwrap());
        assert_eq!(raster.dimensions(), (4, 4));

        let raster = decode(
            &service
                .read_segment(id, Segment::new(-10, -10, 200, 200))
                .unwrap(),
        );
        assert_eq!(raster.dimensions(), (100, 100));
        assert!(raster.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn test_read_segment_without_overlap() {
        let (_dir, service) = setup_service();
        let id = green_canvas(&service);
        for segment in [
            Segment::new(1000, 1000, 10, 10),
            Segment::new(-1000, -1000, 10, 10),
            Segment::new(-10, 0, 10, 10),
        ] {
            let err = service.read_segment(id, segment).unwrap_err();
            assert!(matches!(err, Error::NoIntersection { .. }), "{:?}", segment);
        }
    }

    #[test]
    fn test_read_segment_validation_and_missing() {
        let (_dir, service) = setup_service();
        let err = service
            .read_segment(CanvasId::new(1), Segment::new(1, 2, -3, 4))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = service
            .read_segment(CanvasId::new(1), Segment::new(1, 2, 3, 4))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let (_dir, service) = setup_service();
        let id = service.create(100, 100).unwrap();
        service
            .write_segment(id, Segment::new(1, 1, 5, 5), &block(5, 5, RED))
            .unwrap();

        let patch = decode(&service.read_segment(id, Segment::new(1, 1, 5, 5)).unwrap());
        assert!(patch.pixels().all(|p| *p == RED));

        let canvas = read_all(&service, id, 100, 100);
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let inside = (1..6).contains(&x) && (1..6).contains(&y);
            let expected = if inside { RED } else { BACKGROUND };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_write_at_negative_origin_is_clipped() {
        let (_dir, service) = setup_service();
        let id = service.create(100, 100).unwrap();
        service
            .write_segment(id, Segment::new(-1, -1, 5, 5), &block(5, 5, RED))
            .unwrap();

        let canvas = read_all(&service, id, 100, 100);
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let expected = if x < 4 && y < 4 { RED } else { BACKGROUND };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_write_covering_whole_canvas() {
        let (_dir, service) = setup_service();
        let id = green_canvas(&service);
        service
            .write_segment(id, Segment::new(-10, -10, 200, 200), &block(200, 200, RED))
            .unwrap();
        let canvas = read_all(&service, id, 100, 100);
        assert!(canvas.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_write_without_overlap_leaves_file_untouched() {
        let (dir, service) = setup_service();
        let id = green_canvas(&service);
        let path = dir.path().join(format!("{}.bmp", id));
        let before = fs::read(&path).unwrap();

        let err = service
            .write_segment(id, Segment::new(-10, -10, 5, 5), &block(5, 5, RED))
            .unwrap_err();
        assert!(matches!(err, Error::NoIntersection { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_write_rejects_size_mismatch() {
        let (_dir, service) = setup_service();
        let id = service.create(10, 10).unwrap();
        let err = service
            .write_segment(id, Segment::new(0, 0, 5, 5), &block(4, 5, RED))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_write_rejects_malformed_payload() {
        let (_dir, service) = setup_service();
        let id = service.create(10, 10).unwrap();
        let err = service
            .write_segment(id, Segment::new(0, 0, 5, 5), b"garbage")
            .unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_write_validation_and_missing() {
        let (_dir, service) = setup_service();
        for (w, h) in [(-3, 4), (3, -4), (-3, -4)] {
            let err = service
                .write_segment(CanvasId::new(1), Segment::new(1, 2, w, h), &[])
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        let err = service
            .write_segment(CanvasId::new(1), Segment::new(0, 0, 5, 5), &block(5, 5, RED))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete() {
        let (_dir, service) = setup_service();
        let id = service.create(10, 10).unwrap();
        service.delete(id).unwrap();

        let err = service
            .read_segment(id, Segment::new(0, 0, 10, 10))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = service
            .write_segment(id, Segment::new(0, 0, 5, 5), &block(5, 5, RED))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = service.delete(id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_corrupt_canvas_file_is_codec_error() {
        let (dir, service) = setup_service();
        fs::write(dir.path().join("7.bmp"), b"not a bitmap").unwrap();
        let err = service
            .read_segment(CanvasId::new(7), Segment::new(0, 0, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_concurrent_writes_to_distinct_canvases() {
        let (_dir, service) = setup_service();
        let service = Arc::new(service);
        let ids: Vec<_> = (0..4).map(|_| service.create(20, 20).unwrap()).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let service = service.clone();
                thread::spawn(move || {
                    for row in 0..20 {
                        service
                            .write_segment(id, Segment::new(0, row, 20, 1), &block(20, 1, RED))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for id in ids {
            assert!(read_all(&service, id, 20, 20).pixels().all(|p| *p == RED));
        }
    }

    #[test]
    fn test_concurrent_writes_to_same_canvas_are_not_lost() {
        let (_dir, service) = setup_service();
        let service = Arc::new(service);
        let id = service.create(8, 8).unwrap();

        // Each thread paints its own row; with lost updates some rows would
        // come back as background.
        let handles: Vec<_> = (0..8)
            .map(|row| {
                let service = service.clone();
                thread::spawn(move || {
                    service
                        .write_segment(id, Segment::new(0, row, 8, 1), &block(8, 1, GREEN))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(read_all(&service, id, 8, 8).pixels().all(|p| *p == GREEN));
    }
}
