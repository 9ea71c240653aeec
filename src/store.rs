//! Object storage gateway: byte blobs addressed by `(bucket, key)`.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::RwLock,
};

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared handle used concurrently by all workers.
pub trait ObjectStore: Send + Sync {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-process store keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) {
        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys present in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.insert(bucket, key, body, content_type);
        Ok(())
    }
}

/// Directory-backed store: `<root>/<bucket>/<key>`.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let bucket = normalize_key(bucket)?;
        if bucket.contains('/') {
            return Err(StorageError::InvalidKey(format!(
                "bucket name must be a single path segment: {bucket}"
            )));
        }
        let key = normalize_key(key)?;
        let mut path = self.root.join(bucket);
        path.extend(key.split('/'));
        Ok(path)
    }
}

impl ObjectStore for FsStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        std::fs::read(&path).map_err(|e| map_io(e, bucket, key))
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| map_io(e, bucket, key))?;
        }
        std::fs::write(&path, &body).map_err(|e| map_io(e, bucket, key))?;
        tracing::debug!(
            path = %path.display(),
            bytes = body.len(),
            content_type,
            "wrote object"
        );
        Ok(())
    }
}

fn map_io(e: std::io::Error, bucket: &str, key: &str) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        std::io::ErrorKind::PermissionDenied => {
            StorageError::AccessDenied(format!("{bucket}/{key}"))
        }
        _ => StorageError::Io(e),
    }
}

/// Normalize an object key into a relative `/`-separated path.
///
/// Rejects absolute keys, `..` segments and keys without a file name.
pub fn normalize_key(key: &str) -> Result<String, StorageError> {
    let s = key.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "keys must be relative: {key}"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StorageError::InvalidKey(format!(
                "keys must not contain '..': {key}"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "key must contain a file name: {key:?}"
        )));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "imglabel_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn memory_store_roundtrip_and_not_found() {
        let store = MemoryStore::new();
        store.put("b", "k.png", vec![1, 2, 3], "image/png").unwrap();
        assert_eq!(store.get("b", "k.png").unwrap(), vec![1, 2, 3]);
        assert_eq!(store.object("b", "k.png").unwrap().content_type, "image/png");
        assert!(matches!(
            store.get("other", "k.png"),
            Err(StorageError::NotFound { .. })
        ));
        assert_eq!(store.keys("b"), vec!["k.png".to_string()]);
    }

    #[test]
    fn normalize_key_cases() {
        assert_eq!(normalize_key("a/b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_key("a\\b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_key("a//./b.png").unwrap(), "a/b.png");
        assert!(normalize_key("../x.png").is_err());
        assert!(normalize_key("/x.png").is_err());
        assert!(normalize_key("").is_err());
    }

    #[test]
    fn fs_store_put_then_get() {
        let tmp = temp_dir("fs_store");
        let store = FsStore::new(&tmp);
        store
            .put("bkt", "labeled-images/a.png", vec![9, 8, 7], "image/png")
            .unwrap();
        assert!(tmp.join("bkt").join("labeled-images").join("a.png").is_file());
        assert_eq!(store.get("bkt", "labeled-images/a.png").unwrap(), vec![9, 8, 7]);
        assert!(matches!(
            store.get("bkt", "missing.png"),
            Err(StorageError::NotFound { .. })
        ));
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn fs_store_rejects_escaping_paths() {
        let store = FsStore::new(temp_dir("fs_store_escape"));
        assert!(matches!(
            store.get("bkt", "../../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.object_path("a/b", "k.png"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
