//! On-disk persistence for snapshot caches.
//!
//! One zlib-compressed JSON file per box under a cache directory. A box
//! dump runs to hundreds of megabytes uncompressed; zlib brings it down an
//! order of magnitude and the format stays debuggable with `pigz -d`.

use super::{CacheError, SnapshotCache};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Reads and writes cache files under one directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file a box's cache lives in.
    #[must_use]
    pub fn path_for(&self, box_name: &str) -> PathBuf {
        self.dir.join(format!("{box_name}_performers.json.zlib"))
    }

    /// Load a box's cache, or return a fresh empty one if no file exists
    /// yet.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or corrupt files; a missing file is not an
    /// error.
    pub fn load(&self, box_name: &str) -> Result<SnapshotCache, CacheError> {
        let path = self.path_for(box_name);
        if !path.exists() {
            tracing::debug!(box_name, "no cache file yet, starting empty");
            return Ok(SnapshotCache::new(box_name));
        }
        let file = File::open(&path)?;
        let decoder = ZlibDecoder::new(BufReader::new(file));
        let cache: SnapshotCache = serde_json::from_reader(decoder)?;
        tracing::info!(
            box_name,
            entries = cache.len(),
            as_of = %cache.as_of,
            "loaded cache"
        );
        Ok(cache)
    }

    /// Persist a cache, replacing any previous file for the same box. The
    /// write goes through a temporary file so a crash never leaves a
    /// truncated cache behind.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or unserializable data.
    pub fn save(&self, cache: &SnapshotCache) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&cache.box_name);
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut encoder = ZlibEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, cache)?;
            encoder.finish()?.flush()?;
        }
        fs::rename(&tmp, &path)?;
        tracing::info!(
            box_name = %cache.box_name,
            entries = cache.len(),
            path = %path.display(),
            "persisted cache"
        );
        Ok(())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
