use serde::{Deserialize, Serialize};

/// Kind of payload handed to the object store, mirroring the resource types
/// the upstream storage provider distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Opaque documents: resumes, cover letters, certificates.
    Document,
    /// Raster images: logos, gallery shots.
    Image,
}

/// Result of a completed upload, embedded as a snapshot in domain records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
    pub bytes: u64,
}

/// Upload transport failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload transport unavailable: {0}")]
    Transport(String),
}

/// Pass-through boundary to the object store. Files are uploaded before
/// their metadata is embedded in an application; the store never sees
/// domain types.
pub trait ObjectStore: Send + Sync {
    fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        kind: UploadKind,
    ) -> Result<StoredObject, StorageError>;
}
