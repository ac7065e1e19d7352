//! Magazine cover images kept in an S3-compatible bucket (MinIO in dev).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, presigning::PresigningConfig, Client};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Image formats accepted for covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFormat {
    Jpeg,
    Png,
    Webp,
}

impl CoverFormat {
    /// Reads the declared part content type, ignoring any parameters.
    pub fn from_content_type(ct: &str) -> Option<Self> {
        let mime = ct.split(';').next().unwrap_or_default().trim();
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// True when the leading bytes carry this format's signature.
    pub fn matches(self, data: &[u8]) -> bool {
        match self {
            Self::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Png => data.starts_with(b"\x89PNG\r\n\x1a\n"),
            Self::Webp => data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP",
        }
    }
}

/// A cover whose bytes agree with its declared type.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub format: CoverFormat,
    pub data: Bytes,
}

impl CoverImage {
    pub fn parse(content_type: &str, data: Bytes) -> Option<Self> {
        let format = CoverFormat::from_content_type(content_type)?;
        format.matches(&data).then_some(Self { format, data })
    }

    /// One object per magazine; a new format gets a new key.
    pub fn key_for(&self, magazine_id: Uuid) -> String {
        format!("magazines/{magazine_id}/cover.{}", self.format.extension())
    }
}

#[async_trait]
pub trait CoverStore: Send + Sync {
    async fn save(&self, key: &str, image: CoverImage) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
    /// Time-limited GET link for the browser redirect.
    async fn signed_url(&self, key: &str, ttl: Duration) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct S3Covers {
    client: Client,
    bucket: String,
}

impl S3Covers {
    pub async fn connect(cfg: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            cfg.access_key.as_str(),
            cfg.secret_key.as_str(),
            None,
            None,
            "prepbank-env",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        // MinIO serves buckets by path, not by subdomain.
        let s3 = aws_sdk_s3::config::Builder::from(&shared)
            .endpoint_url(cfg.endpoint.as_str())
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3),
            bucket: cfg.bucket.clone(),
        }
    }
}

#[async_trait]
impl CoverStore for S3Covers {
    async fn save(&self, key: &str, image: CoverImage) -> anyhow::Result<()> {
        let size = image.data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(image.format.content_type())
            .content_length(size as i64)
            .body(ByteStream::from(image.data))
            .send()
            .await
            .with_context(|| format!("upload cover {key} ({size} bytes)"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("remove cover {key}"))?;
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> anyhow::Result<String> {
        let presign = PresigningConfig::expires_in(ttl).context("cover link ttl")?;
        let req = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .with_context(|| format!("sign cover link {key}"))?;
        Ok(req.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn content_types_map_to_formats() {
        assert_eq!(CoverFormat::from_content_type("image/jpg"), Some(CoverFormat::Jpeg));
        assert_eq!(CoverFormat::from_content_type("IMAGE/PNG"), Some(CoverFormat::Png));
        assert_eq!(
            CoverFormat::from_content_type("image/webp; q=0.9"),
            Some(CoverFormat::Webp)
        );
        assert_eq!(CoverFormat::from_content_type("application/pdf"), None);
        assert_eq!(CoverFormat::from_content_type(""), None);
    }

    #[test]
    fn cover_must_match_its_declared_type() {
        assert!(CoverImage::parse("image/png", Bytes::from_static(PNG)).is_some());
        assert!(CoverImage::parse("image/jpeg", Bytes::from_static(JPEG)).is_some());
        assert!(CoverImage::parse("image/webp", Bytes::from_static(WEBP)).is_some());
        assert!(CoverImage::parse("image/png", Bytes::from_static(JPEG)).is_none());
        assert!(CoverImage::parse("image/webp", Bytes::from_static(b"RIFF")).is_none());
        assert!(CoverImage::parse("image/png", Bytes::from_static(b"%PDF-1.7")).is_none());
    }

    #[test]
    fn key_uses_magazine_and_extension() {
        let id = Uuid::nil();
        let cover = CoverImage::parse("image/jpeg", Bytes::from_static(JPEG)).unwrap();
        assert_eq!(
            cover.key_for(id),
            "magazines/00000000-0000-0000-0000-000000000000/cover.jpg"
        );
    }
}
