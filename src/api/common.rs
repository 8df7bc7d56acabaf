use log::warn;
use mongodb::{
    bson::{doc, Document, Regex},
    options::FindOptions,
};
use rocket::{fs::TempFile, futures::TryStreamExt, tokio::fs};
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    media::{Media, UploadedMedia},
    model::{
        db::notification::Notification,
        mongodb::{Coll, Id, MongoCollection},
    },
};

/// Fetch the record with the given ID, or a 404 naming `what`.
pub async fn find_by_id<T>(coll: &Coll<T>, id: &Id, what: &str) -> Result<T>
where
    T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
{
    coll.find_one(id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(what))
}

/// Find options returning the newest `limit` records, sorted by `field`.
pub fn newest_by(field: &str, limit: i64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { field: -1 })
        .limit(limit)
        .build()
}

/// Find options returning the newest `limit` records.
pub fn newest(limit: i64) -> FindOptions {
    newest_by("created_at", limit)
}

/// Run a find and collect every result.
pub async fn find_all<T>(
    coll: &Coll<T>,
    filter: impl Into<Option<Document>>,
    options: impl Into<Option<FindOptions>>,
) -> Result<Vec<T>>
where
    T: MongoCollection + DeserializeOwned + Unpin + Send + Sync,
{
    Ok(coll.find(filter, options).await?.try_collect().await?)
}

/// Store a notification. Failures are logged and otherwise ignored.
pub async fn notify(notifications: &Coll<Notification>, notification: Notification) {
    let recipient = notification.recipient.clone();
    if let Err(e) = notifications.insert_one(notification, None).await {
        warn!("Failed to notify {recipient}: {e}");
    }
}

/// A multipart upload with a single `file` field.
#[derive(FromForm)]
pub struct Upload<'r> {
    pub file: TempFile<'r>,
}

impl Upload<'_> {
    /// Read the file and send it to the media host under `folder`.
    pub async fn send(&self, media: &Media, folder: &str) -> Result<UploadedMedia> {
        // Plain form values are buffered in memory and never reach disk.
        let path = self
            .file
            .path()
            .ok_or_else(|| Error::bad_request("The `file` field must be a file upload"))?;
        let bytes = fs::read(path)
            .await
            .map_err(|_| Error::bad_request("Could not read the uploaded file"))?;
        if bytes.is_empty() {
            return Err(Error::invalid("Uploaded file is empty"));
        }
        media.upload(bytes, folder, &self.filename()).await
    }

    fn filename(&self) -> String {
        let stem = self.file.name().unwrap_or("upload");
        match self.file.content_type().and_then(|ct| ct.extension()) {
            Some(extension) => format!("{stem}.{extension}"),
            None => stem.to_string(),
        }
    }
}

/// A case-insensitive filter value matching `text` literally anywhere in a field.
pub fn contains_text(text: &str) -> Regex {
    let mut pattern = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    Regex {
        pattern,
        options: "i".to_string(),
    }
}
