use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Directory under the static root where uploads are written; also the
/// prefix of every stored relative path.
pub const UPLOAD_SUBDIR: &str = "uploads";

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an uploaded image under its (already sanitized) filename and
    /// return the store-relative path recorded in the database.
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<String>;

    /// Rewrite a stored relative path into one the asset-serving layer
    /// resolves.
    fn public_url(&self, stored_path: &str) -> String {
        format!("/static/{}", stored_path.replace('\\', "/"))
    }
}

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(static_root: impl Into<PathBuf>) -> Self {
        Self {
            root: static_root.into(),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.join(UPLOAD_SUBDIR)
    }
}

#[async_trait]
impl ImageStore for DiskStore {
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<String> {
        let path = self.upload_dir().join(filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(format!("{}/{}", UPLOAD_SUBDIR, filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStore;

    #[async_trait]
    impl ImageStore for NullStore {
        async fn save(&self, filename: &str, _body: Bytes) -> anyhow::Result<String> {
            Ok(format!("{}/{}", UPLOAD_SUBDIR, filename))
        }
    }

    #[test]
    fn public_url_prefixes_static() {
        assert_eq!(NullStore.public_url("uploads/chair.png"), "/static/uploads/chair.png");
    }

    #[test]
    fn public_url_normalizes_backslashes() {
        assert_eq!(NullStore.public_url("uploads\\chair.png"), "/static/uploads/chair.png");
    }

    #[tokio::test]
    async fn disk_store_writes_under_upload_dir() {
        let root = std::env::temp_dir().join(format!("tradepost-storage-{}", std::process::id()));
        let store = DiskStore::new(&root);
        std::fs::create_dir_all(store.upload_dir()).expect("create upload dir");

        let path = store
            .save("chair.png", Bytes::from_static(b"not really a png"))
            .await
            .expect("save");
        assert_eq!(path, "uploads/chair.png");

        let written = std::fs::read(root.join("uploads").join("chair.png")).expect("read back");
        assert_eq!(written, b"not really a png");

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn disk_store_overwrites_colliding_names() {
        let root = std::env::temp_dir().join(format!("tradepost-collide-{}", std::process::id()));
        let store = DiskStore::new(&root);
        std::fs::create_dir_all(store.upload_dir()).expect("create upload dir");

        store
            .save("same.png", Bytes::from_static(b"first"))
            .await
            .expect("first save");
        store
            .save("same.png", Bytes::from_static(b"second"))
            .await
            .expect("second save");

        let written = std::fs::read(root.join("uploads").join("same.png")).expect("read back");
        assert_eq!(written, b"second");

        std::fs::remove_dir_all(&root).ok();
    }
}
