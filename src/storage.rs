use std::io;
use std::path::PathBuf;

use tokio::fs;
use tracing::info;

/// On-disk home for finished card PNGs, one file per card id. Metadata
/// lives in the database; only the binary goes here.
#[derive(Clone)]
pub struct CardImageStore {
    root: PathBuf,
}

impl CardImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CardImageStore { root: root.into() }
    }

    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!("Card image storage at {}", self.root.display());
        Ok(())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.png"))
    }

    pub async fn save(&self, id: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.path_for(id), bytes).await
    }

    pub async fn load(&self, id: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CardImageStore::new(dir.path());
        store.init().await.unwrap();

        store.save("card-1", b"png-bytes").await.unwrap();
        let loaded = store.load("card-1").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"png-bytes".as_ref()));
    }

    #[tokio::test]
    async fn missing_image_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CardImageStore::new(dir.path());
        store.init().await.unwrap();

        assert!(store.load("card-1").await.unwrap().is_none());
    }
}
