//! Canvas Store
//!
//! Maps canvas ids to raster files named `<id>.<ext>` inside a single
//! directory. There is no index or cache: every call looks at the
//! filesystem, so the directory listing is the only source of truth.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::id::{CanvasId, IdAllocator};

/// Upper bound on candidate ids tried by a single [`CanvasStore::create`]
pub const MAX_ALLOCATION_ATTEMPTS: usize = 65_536;

/// File-backed canvas store
#[derive(Debug)]
pub struct CanvasStore {
    root: PathBuf,
    extension: &'static str,
    ids: IdAllocator,
}

impl CanvasStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>, extension: &'static str) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::storage(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self {
            root,
            extension,
            ids: IdAllocator::new(),
        })
    }

    /// Directory holding the canvas files
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The id source used by [`CanvasStore::create`]
    #[must_use]
    pub fn allocator(&self) -> &IdAllocator {
        &self.ids
    }

    /// Claim a fresh id and create an empty placeholder file for it
    pub fn create(&self) -> Result<CanvasId> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let id = self
                .ids
                .next()
                .ok_or_else(|| Error::storage("canvas id space exhausted"))?;

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path(id))
            {
                Ok(_) => {
                    debug!(%id, "Allocated canvas file");
                    return Ok(id);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::storage(format!(
                        "cannot create file for canvas {}: {}",
                        id, e
                    )))
                }
            }
        }

        Err(Error::storage(format!(
            "no free canvas id after {} attempts",
            MAX_ALLOCATION_ATTEMPTS
        )))
    }

    /// True if a backing file for `id` is present
    #[must_use]
    pub fn exists(&self, id: CanvasId) -> bool {
        self.path(id).is_file()
    }

    /// Open the backing file for reading
    pub fn open(&self, id: CanvasId) -> Result<File> {
        File::open(self.path(id)).map_err(|e| not_found_or(id, e))
    }

    /// Read the whole backing file
    pub fn read(&self, id: CanvasId) -> Result<Vec<u8>> {
        fs::read(self.path(id)).map_err(|e| not_found_or(id, e))
    }

    /// Replace the contents of an existing canvas.
    ///
    /// The bytes go to a temporary file in the same directory which is
    /// renamed over the target only after it has been fully written, so a
    /// failure at any point leaves the previous contents in place.
    pub fn replace(&self, id: CanvasId, bytes: &[u8]) -> Result<()> {
        if !self.exists(id) {
            return Err(Error::NotFound(id));
        }

        let mut tmp = tempfile::Builder::new()
            .prefix(".charta-")
            .suffix(".tmp")
            .tempfile_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path(id))?;

        debug!(%id, bytes = bytes.len(), "Canvas file replaced");
        Ok(())
    }

    /// Remove the backing file. Returns whether a file was removed.
    pub fn delete(&self, id: CanvasId) -> bool {
        match fs::remove_file(self.path(id)) {
            Ok(()) => true,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(%id, error = %e, "Failed to remove canvas file");
                }
                false
            }
        }
    }

    /// Ids of all canvases currently on disk, ascending
    pub fn ids(&self) -> Result<Vec<CanvasId>> {
        let mut ids: Vec<CanvasId> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.id_from_path(&entry.path()))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn path(&self, id: CanvasId) -> PathBuf {
        self.root.join(format!("{}.{}", id, self.extension))
    }

    fn id_from_path(&self, path: &Path) -> Option<CanvasId> {
        if path.extension()? != self.extension {
            return None;
        }
        let raw: u32 = path.file_stem()?.to_str()?.parse().ok()?;
        (raw > 0 && path.is_file()).then(|| CanvasId::new(raw))
    }
}

fn not_found_or(id: CanvasId, err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(id)
    } else {
        err.into()
    }
}
