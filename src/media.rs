//! Attachments stored with an external media host.

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::common::MediaItem,
};

pub mod cloudinary;

/// A file accepted by the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub file_type: String,
}

impl From<UploadedMedia> for MediaItem {
    fn from(media: UploadedMedia) -> Self {
        Self {
            url: media.url,
            public_id: Some(media.public_id),
            file_type: media.file_type,
            uploaded_at: Utc::now(),
        }
    }
}

/// The operations we need from a media host.
#[rocket::async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, folder: &str, filename: &str) -> Result<UploadedMedia>;

    /// Returns whether the host reported the file as deleted. `file_type` is
    /// the kind the host reported on upload.
    async fn delete(&self, public_id: &str, file_type: &str) -> Result<bool>;
}

/// Managed state wrapping the optional media host.
pub struct Media {
    host: Option<Box<dyn MediaHost>>,
}

impl Media {
    pub fn new(host: Box<dyn MediaHost>) -> Self {
        Self { host: Some(host) }
    }

    pub fn unconfigured() -> Self {
        Self { host: None }
    }

    pub async fn upload(&self, bytes: Vec<u8>, folder: &str, filename: &str) -> Result<UploadedMedia> {
        let host = self
            .host
            .as_ref()
            .ok_or_else(|| Error::upstream("Media uploads are not configured"))?;
        host.upload(bytes, folder, filename).await.map_err(|e| {
            warn!("Upload to {folder} failed: {e}");
            match e {
                Error::Status(..) => e,
                _ => Error::upstream("Failed to upload file"),
            }
        })
    }

    /// Delete attached files, logging and ignoring any failure.
    pub async fn delete_all<'a>(&self, items: impl IntoIterator<Item = &'a MediaItem>) {
        let Some(host) = &self.host else {
            return;
        };
        for item in items {
            let Some(public_id) = item.public_id.as_deref() else {
                continue;
            };
            match host.delete(public_id, &item.file_type).await {
                Ok(true) => {}
                Ok(false) => warn!("Media host did not delete {public_id}"),
                Err(e) => warn!("Failed to delete {public_id}: {e}"),
            }
        }
    }
}
