//! Media storage
//!
//! Stores uploaded avatars, cover images, videos and thumbnails in
//! Cloudflare R2 or a local directory and hands back public URLs.

use std::path::{Path, PathBuf};

use aws_sdk_s3::Client as S3Client;
use mime_guess::MimeGuess;

use super::probe::mp4_duration_seconds;
use crate::config::{AppConfig, CloudflareConfig, MediaStorageConfig, StorageBackend};
use crate::data::EntityId;
use crate::error::AppError;
use crate::metrics::{MEDIA_BYTES_UPLOADED, MEDIA_UPLOADS_TOTAL};

const MIB: usize = 1024 * 1024;

/// Largest accepted image upload
pub const MAX_IMAGE_BYTES: usize = 10 * MIB;
/// Largest accepted video upload
pub const MAX_VIDEO_BYTES: usize = 200 * MIB;

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

const VIDEO_TYPES: &[(&str, &str)] = &[
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/quicktime", "mov"),
];

/// Kind of uploaded media; decides key prefix, limits and accepted types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Avatar,
    CoverImage,
    Video,
    Thumbnail,
}

impl MediaKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::CoverImage => "covers",
            Self::Video => "videos",
            Self::Thumbnail => "thumbnails",
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            Self::Video => MAX_VIDEO_BYTES,
            _ => MAX_IMAGE_BYTES,
        }
    }

    fn accepted_types(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Video => VIDEO_TYPES,
            _ => IMAGE_TYPES,
        }
    }

    /// File extension for an accepted content type
    pub fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        self.accepted_types()
            .iter()
            .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type))
            .map(|(_, ext)| *ext)
    }

    /// Content type for a file name's extension, when the client sent none
    pub fn content_type_for_file_name(&self, file_name: &str) -> Option<&'static str> {
        let guessed = MimeGuess::from_path(file_name).first()?;
        self.accepted_types()
            .iter()
            .find(|(mime, _)| mime.eq_ignore_ascii_case(guessed.essence_str()))
            .map(|(mime, _)| *mime)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::CoverImage => "cover_image",
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// A file received in a multipart upload, not yet stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    /// Content type sent by the client, if any
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Content type to store this file as.
    ///
    /// Uses the client's type when the kind accepts it, else infers
    /// from the file name, else falls back to whatever the client sent
    /// (which `store` then rejects).
    pub fn content_type_for(&self, kind: MediaKind) -> String {
        if let Some(sent) = self.content_type.as_deref() {
            if kind.extension_for(sent).is_some() {
                return sent.to_string();
            }
        }

        self.file_name
            .as_deref()
            .and_then(|name| kind.content_type_for_file_name(name))
            .map(str::to_string)
            .or_else(|| self.content_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Reference to a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Storage key, e.g. "avatars/01H....png"
    pub key: String,
    /// Public URL
    pub url: String,
}

enum Backend {
    R2 { client: S3Client, bucket: String },
    Local { root: PathBuf },
}

/// Media storage service
pub struct MediaStorage {
    backend: Backend,
    /// Public URL base, e.g. "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create media storage for the configured backend
    ///
    /// # Errors
    /// Returns error if the local directory cannot be created or R2
    /// credentials are missing
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        let media = &config.storage.media;
        match media.backend {
            StorageBackend::R2 => {
                let cloudflare = config.cloudflare.as_ref().ok_or_else(|| {
                    AppError::Config("cloudflare credentials are required for R2".to_string())
                })?;
                Ok(Self::r2(media, cloudflare))
            }
            StorageBackend::Local => Self::local(&media.local_dir, &media.public_url).await,
        }
    }

    fn r2(config: &MediaStorageConfig, cloudflare: &CloudflareConfig) -> Self {
        use aws_sdk_s3::config::BehaviorVersion;
        use aws_sdk_s3::config::{Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "vidtube-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(super::build_r2_http_client())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .build();

        tracing::info!(bucket = %config.bucket, "Using R2 media storage");

        Self {
            backend: Backend::R2 {
                client: S3Client::from_conf(s3_config),
                bucket: config.bucket.clone(),
            },
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Storage rooted at a local directory
    pub async fn local(root: &Path, public_url: &str) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            AppError::Storage(format!(
                "failed to create media directory {}: {}",
                root.display(),
                e
            ))
        })?;

        tracing::info!(root = %root.display(), "Using local media storage");

        Ok(Self {
            backend: Backend::Local {
                root: root.to_path_buf(),
            },
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Directory served for the local backend
    pub fn local_root(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Local { root } => Some(root),
            Backend::R2 { .. } => None,
        }
    }

    /// Validate and store a media file
    ///
    /// # Errors
    /// - `BadRequest` for an unsupported content type or empty file
    /// - `PayloadTooLarge` above the kind's size limit
    /// - `Storage` if the backend write fails
    pub async fn store(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredMedia, AppError> {
        let ext = kind.extension_for(content_type).ok_or_else(|| {
            AppError::bad_request(format!(
                "Unsupported {} content type: {}",
                kind.as_str(),
                content_type
            ))
        })?;
        if data.is_empty() {
            return Err(AppError::bad_request(format!("{} file is empty", kind.as_str())));
        }
        if data.len() > kind.max_bytes() {
            return Err(AppError::PayloadTooLarge(format!(
                "{} exceeds {} bytes",
                kind.as_str(),
                kind.max_bytes()
            )));
        }

        let key = format!("{}/{}.{}", kind.prefix(), EntityId::new().0, ext);
        let size = data.len();
        self.put(&key, data, content_type).await?;

        MEDIA_UPLOADS_TOTAL.with_label_values(&[kind.as_str()]).inc();
        MEDIA_BYTES_UPLOADED.inc_by(size as f64);
        tracing::debug!(key = %key, size, "Stored media");

        Ok(StoredMedia {
            url: self.get_public_url(&key),
            key,
        })
    }

    /// Store an uploaded file as `kind`
    pub async fn store_file(
        &self,
        kind: MediaKind,
        file: UploadedFile,
    ) -> Result<StoredMedia, AppError> {
        let content_type = file.content_type_for(kind);
        self.store(kind, file.data, &content_type).await
    }

    /// Store a video file and report its duration in seconds (0 if unknown)
    pub async fn store_video(
        &self,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(StoredMedia, f64), AppError> {
        let duration = mp4_duration_seconds(&data).unwrap_or(0.0);
        let stored = self.store(MediaKind::Video, data, content_type).await?;
        Ok((stored, duration))
    }

    /// Store an uploaded video file and report its duration
    pub async fn store_video_file(
        &self,
        file: UploadedFile,
    ) -> Result<(StoredMedia, f64), AppError> {
        let content_type = file.content_type_for(MediaKind::Video);
        self.store_video(file.data, &content_type).await
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::R2 { client, bucket } => {
                use aws_sdk_s3::primitives::ByteStream;

                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(data))
                    .content_type(content_type)
                    .cache_control("public, max-age=31536000")
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("R2 upload failed: {}", e)))?;
            }
            Backend::Local { root } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| AppError::Storage(format!("local upload failed: {}", e)))?;
                }
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| AppError::Storage(format!("local upload failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Delete a stored object by key
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(AppError::Storage(format!("refusing to delete key {key}")));
        }

        match &self.backend {
            Backend::R2 { client, bucket } => {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("R2 delete failed: {}", e)))?;
            }
            Backend::Local { root } => match tokio::fs::remove_file(root.join(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::Storage(format!("local delete failed: {}", e))),
            },
        }

        Ok(())
    }

    /// Best-effort removal of an object previously returned by [`store`](Self::store).
    ///
    /// URLs that do not belong to this storage are ignored. Failures are
    /// logged and swallowed.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(key) = self.key_from_url(url) else {
            return;
        };

        if let Err(e) = self.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove stored media");
        }
    }

    /// Storage key for one of our public URLs
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_url.as_str())?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
    }

    /// Get public URL for a storage key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn local_storage() -> (MediaStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::local(dir.path(), "http://localhost:8000/media/")
            .await
            .unwrap();
        (storage, dir)
    }

    #[test]
    fn kinds_map_content_types() {
        assert_eq!(MediaKind::Avatar.extension_for("image/PNG"), Some("png"));
        assert_eq!(MediaKind::Avatar.extension_for("video/mp4"), None);
        assert_eq!(MediaKind::Video.extension_for("video/mp4"), Some("mp4"));
        assert_eq!(
            MediaKind::Thumbnail.content_type_for_file_name("thumb.JPEG"),
            Some("image/jpeg")
        );
        assert_eq!(MediaKind::Video.content_type_for_file_name("clip"), None);
        assert_eq!(
            MediaKind::Video.content_type_for_file_name("holiday.MOV"),
            Some("video/quicktime")
        );
        assert_eq!(
            MediaKind::Avatar.content_type_for_file_name("face.jpg"),
            Some("image/jpeg")
        );
        // Guessed but not accepted for the kind
        assert_eq!(MediaKind::Avatar.content_type_for_file_name("clip.mp4"), None);
    }

    #[test]
    fn uploaded_file_content_type_inference() {
        let file = UploadedFile {
            file_name: Some("clip.mp4".to_string()),
            content_type: Some("application/octet-stream".to_string()),
            data: vec![],
        };
        assert_eq!(file.content_type_for(MediaKind::Video), "video/mp4");
        assert_eq!(
            file.content_type_for(MediaKind::Avatar),
            "application/octet-stream"
        );

        let file = UploadedFile {
            file_name: None,
            content_type: Some("image/webp".to_string()),
            data: vec![],
        };
        assert_eq!(file.content_type_for(MediaKind::Thumbnail), "image/webp");
    }

    #[tokio::test]
    async fn store_and_remove_locally() {
        let (storage, dir) = local_storage().await;

        let stored = storage
            .store(MediaKind::Avatar, vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert!(stored.key.starts_with("avatars/"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("http://localhost:8000/media/{}", stored.key)
        );
        assert!(dir.path().join(&stored.key).exists());

        assert_eq!(storage.key_from_url(&stored.url), Some(stored.key.as_str()));
        storage.remove_by_url(&stored.url).await;
        assert!(!dir.path().join(&stored.key).exists());
    }

    #[tokio::test]
    async fn rejects_wrong_type_and_empty_files() {
        let (storage, _dir) = local_storage().await;

        assert!(matches!(
            storage.store(MediaKind::Video, vec![1], "image/png").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            storage.store(MediaKind::Avatar, vec![], "image/png").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_images() {
        let (storage, _dir) = local_storage().await;

        let result = storage
            .store(MediaKind::Thumbnail, vec![0; MAX_IMAGE_BYTES + 1], "image/png")
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn video_duration_is_probed() {
        let (storage, _dir) = local_storage().await;

        let (_, duration) = storage
            .store_video(crate::storage::probe::tests::sample_mp4(1000, 4000), "video/mp4")
            .await
            .unwrap();
        assert_eq!(duration, 4.0);

        let (_, unknown) = storage
            .store_video(vec![0; 32], "video/webm")
            .await
            .unwrap();
        assert_eq!(unknown, 0.0);
    }

    #[tokio::test]
    async fn foreign_urls_and_traversal_are_ignored() {
        let (storage, _dir) = local_storage().await;

        assert_eq!(storage.key_from_url("https://elsewhere.example/avatars/a.png"), None);
        assert!(storage.delete("../outside.txt").await.is_err());
        storage.remove_by_url("http://localhost:8000/media/../etc/passwd").await;
    }
}
