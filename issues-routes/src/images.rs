use std::path::PathBuf;

use error_stack::{Report, ResultExt};
use tracing::debug;
use uuid::Uuid;

use issues_core::result::ImageStoreError;
use issues_core::{ImagePayload, ImageStore, StoredImage};

/// Path the stored files are served from, and the prefix of every
/// `image_ref` handed back to callers.
pub const UPLOADS_PUBLIC_BASE: &str = "/uploads";

/// Disk-backed blob store. One flat directory, uuid-named files, locators
/// resolvable by concatenating the service's public base URL.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the backing directory up front; a misconfigured path fails
    /// at startup, not on the first report.
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self, Report<ImageStoreError>> {
        let store = Self::new(dir);

        tokio::fs::create_dir_all(&store.dir)
            .await
            .change_context(ImageStoreError)
            .attach_with(|| format!("creating {}", store.dir.display()))?;

        Ok(store)
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

impl ImageStore for DiskImageStore {
    async fn store(&self, image: ImagePayload) -> Result<StoredImage, Report<ImageStoreError>> {
        let filename = format!(
            "{}.{}",
            Uuid::now_v7().simple(),
            extension_for(&image.content_type)
        );
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, &image.bytes)
            .await
            .change_context(ImageStoreError)
            .attach_with(|| format!("writing {}", path.display()))?;

        debug!("stored image {}", path.display());

        Ok(StoredImage {
            image_ref: format!("{UPLOADS_PUBLIC_BASE}/{filename}"),
        })
    }
}
