//! Blob cache of raw records.
//!
//! Layout: `<root>/<collection>/<id>.json`, one JSON object per file.
//! Writing the same id again overwrites the blob.

use super::{FetchError, FetchOutcome, RecordStore};
use crate::models::RawRecord;
use async_trait::async_trait;
use fnv::FnvHasher;
use serde_json::Value;
use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory-backed key/value store of raw records.
#[derive(Debug, Clone)]
pub struct BlobCache {
    root: PathBuf,
}

impl BlobCache {
    /// Create a cache rooted at `root`. Nothing is created until a write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the blobs of one collection.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(file_stem(collection))
    }

    /// Write one record under `id`, replacing any previous blob.
    pub fn put(&self, collection: &str, id: &str, record: &RawRecord) -> Result<PathBuf, FetchError> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", file_stem(id)));
        let body = serde_json::to_vec_pretty(record).map_err(|e| FetchError::Parse {
            what: format!("record {}", id),
            reason: e.to_string(),
        })?;
        fs::write(&path, body)?;

        debug!("Cached {} into {}", id, path.display());
        Ok(path)
    }

    /// Read every blob of a collection in file-name order.
    ///
    /// Unreadable or malformed blobs are skipped. A collection that was
    /// never written yields no records.
    pub fn load(&self, collection: &str) -> Result<Vec<RawRecord>, FetchError> {
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            debug!("No cache for {} at {}", collection, dir.display());
            return Ok(Vec::new());
        }

        let mut records = Vec::new();

        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Cannot read cache entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match read_blob(path) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} cached records for {}", records.len(), collection);
        Ok(records)
    }
}

fn read_blob(path: &Path) -> Result<RawRecord, FetchError> {
    let bytes = fs::read(path)?;
    let parse_error = |reason: String| FetchError::Parse {
        what: path.display().to_string(),
        reason,
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(parse_error("not a JSON object".to_string())),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

/// Longest encoded stem kept verbatim; longer ones are cut and hashed.
const MAX_STEM_BYTES: usize = 180;

/// Encode a key as a single path component, one distinct name per key.
///
/// Alphanumerics (any script), `-` and `_` are kept. Every other byte is
/// written as `%XX`, so `%` never appears unescaped.
fn file_stem(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }

    let mut stem = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("%{:02X}", byte));
            }
        }
    }

    if stem.len() <= MAX_STEM_BYTES {
        return stem;
    }

    let mut cut = MAX_STEM_BYTES;
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut hasher = FnvHasher::default();
    hasher.write(key.as_bytes());
    format!("{}~{:016x}", &stem[..cut], hasher.finish())
}

#[async_trait]
impl RecordStore for BlobCache {
    async fn fetch(&self, collection: &str) -> Result<FetchOutcome, FetchError> {
        let records = self.load(collection)?;
        Ok(FetchOutcome::complete(records, 0))
    }
}
