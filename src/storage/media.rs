//! Media storage over an S3-compatible endpoint
//!
//! Handles upload, delete, and URL generation for media files.
//! Files are served via a public custom domain in front of the bucket.

use aws_sdk_s3::Client as S3Client;

use crate::error::AppError;
use crate::metrics::MEDIA_UPLOADS_TOTAL;

/// What a media object is, which decides its key prefix
#[derive(Debug, Clone, Copy)]
pub enum MediaKind {
    Video,
    Thumbnail,
    Avatar,
    CoverImage,
}

impl MediaKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Thumbnail => "thumbnails",
            Self::Avatar => "avatars",
            Self::CoverImage => "covers",
        }
    }
}

/// Media storage service
///
/// Uploads media to the configured bucket and returns public URLs.
pub struct MediaStorage {
    client: S3Client,
    bucket: String,
    /// Public URL base, e.g. "https://media.example.com"
    public_url: String,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub fn new(config: &crate::config::StorageConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "clipstream-media",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .http_client(super::build_s3_http_client())
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Upload a media object under its kind's prefix.
    ///
    /// # Returns
    /// (storage key, public URL); the key is kept on the owning record so
    /// the object can be deleted later.
    pub async fn upload(
        &self,
        kind: MediaKind,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let key = format!("{}/{}.{}", kind.prefix(), id, extension_for(content_type));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {e}")))?;

        MEDIA_UPLOADS_TOTAL
            .with_label_values(&[kind.prefix()])
            .inc();

        let url = self.get_public_url(&key);
        Ok((key, url))
    }

    /// Delete a media object by its storage key
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {e}")))?;

        Ok(())
    }

    /// Public URL for a storage key, via the custom domain
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}
