use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::fingerprint::Fingerprint;

/// Durable key-value store with one `<hex-fingerprint>.json` file per
/// entry. Entries are written once and live forever; there is no eviction.
/// File-content fingerprints and text fingerprints are distinct key
/// domains, so callers keep one `JsonCache` per namespace directory.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Looks a fingerprint up without any side effects. Absence is not an
    /// error; it just means the expensive call has not happened yet.
    pub fn get<T: DeserializeOwned>(&self, key: &Fingerprint) -> Result<Option<T>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(value))
    }

    /// Persists the full value under the fingerprint. Called only after the
    /// expensive collaborator call succeeded; a failure here loses the cache
    /// entry, never the in-memory result.
    pub fn put<T: Serialize>(&self, key: &Fingerprint, value: &T) -> Result<()> {
        let path = self.entry_path(key);
        let file = File::create(&path)?;
        serde_json::to_writer(BufWriter::new(file), value)?;
        Ok(())
    }

    fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrResult;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn roundtrips_an_ocr_result() {
        let dir = tempdir().unwrap();
        let cache = JsonCache::open(dir.path().join("ocr")).unwrap();
        let key = Fingerprint::of_text("document bytes stand-in");
        let result: OcrResult = serde_json::from_value(json!({
            "pages": [ { "text": "hello", "page": 1 } ]
        }))
        .unwrap();
        cache.put(&key, &result).unwrap();
        let loaded: OcrResult = cache.get(&key).unwrap().unwrap();
        assert_eq!(loaded.joined_text(), "hello");
        assert_eq!(loaded.pages[0].extra["page"], 1);
    }

    #[test]
    fn lookup_of_unknown_key_is_absent() {
        let dir = tempdir().unwrap();
        let cache = JsonCache::open(dir.path().join("ocr")).unwrap();
        let missing: Option<OcrResult> = cache.get(&Fingerprint::of_text("never stored")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn namespaces_do_not_collide() {
        let dir = tempdir().unwrap();
        let ocr = JsonCache::open(dir.path().join("ocr")).unwrap();
        let columns = JsonCache::open(dir.path().join("columns")).unwrap();
        let key = Fingerprint::of_text("same key material");
        ocr.put(&key, &json!({"kind": "ocr"})).unwrap();
        let other: Option<serde_json::Value> = columns.get(&key).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn open_creates_the_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = JsonCache::open(&nested).unwrap();
        assert!(cache.dir().is_dir());
    }
}
