//! Signed uploads to Cloudinary.

use std::time::Duration;

use chrono::Utc;
use data_encoding::HEXLOWER;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::{MediaHost, UploadedMedia};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

pub struct Cloudinary {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl Cloudinary {
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            cloud_name,
            api_key,
            api_secret,
        })
    }

    /// Destroy endpoint for a stored `file_type`. Anything unrecognised is an image.
    fn destroy_url(&self, file_type: &str) -> String {
        let resource_type = match file_type {
            "video" | "raw" => file_type,
            _ => "image",
        };
        format!("{API_BASE}/{}/{resource_type}/destroy", self.cloud_name)
    }

    /// Sign request parameters: sorted `key=value` pairs joined by `&`, followed
    /// by the API secret, hashed with SHA-256.
    fn sign(&self, params: &mut [(&str, String)]) -> String {
        params.sort_by(|a, b| a.0.cmp(b.0));
        let joined = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let digest = Sha256::digest(format!("{joined}{}", self.api_secret).as_bytes());
        HEXLOWER.encode(&digest)
    }
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
    #[serde(default = "default_resource_type")]
    resource_type: String,
}

fn default_resource_type() -> String {
    "image".to_string()
}

#[derive(Deserialize)]
struct DestroyResult {
    result: String,
}

#[rocket::async_trait]
impl MediaHost for Cloudinary {
    async fn upload(&self, bytes: Vec<u8>, folder: &str, filename: &str) -> Result<UploadedMedia> {
        let timestamp = Utc::now().timestamp().to_string();
        let mut params = [("folder", folder.to_string()), ("timestamp", timestamp.clone())];
        let signature = self.sign(&mut params);

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(filename.to_string()))
            .text("folder", folder.to_string())
            .text("timestamp", timestamp)
            .text("api_key", self.api_key.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);
        let response = self
            .http
            .post(format!("{API_BASE}/{}/auto/upload", self.cloud_name))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!("Cloudinary upload returned {status}")));
        }
        let result: UploadResult = response.json().await?;
        Ok(UploadedMedia {
            url: result.secure_url,
            public_id: result.public_id,
            file_type: result.resource_type,
        })
    }

    async fn delete(&self, public_id: &str, file_type: &str) -> Result<bool> {
        let timestamp = Utc::now().timestamp().to_string();
        let mut params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = self.sign(&mut params);
        let form = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature_algorithm", "sha256".to_string()),
            ("signature", signature),
        ];
        let response = self
            .http
            .post(self.destroy_url(file_type))
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let result: DestroyResult = response.json().await?;
        Ok(result.result == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> Cloudinary {
        Cloudinary::new(
            "demo".to_string(),
            "key".to_string(),
            "secret".to_string(),
            5,
        )
        .unwrap()
    }

    #[test]
    fn destroy_follows_resource_type() {
        let cloudinary = demo();
        assert_eq!(
            cloudinary.destroy_url("video"),
            "https://api.cloudinary.com/v1_1/demo/video/destroy"
        );
        assert_eq!(
            cloudinary.destroy_url("raw"),
            "https://api.cloudinary.com/v1_1/demo/raw/destroy"
        );
        assert_eq!(
            cloudinary.destroy_url("image"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
        assert_eq!(
            cloudinary.destroy_url("pdf"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn signature_sorts_parameters() {
        let cloudinary = demo();
        let mut forward = [("folder", "issues".to_string()), ("timestamp", "1700000000".to_string())];
        let mut backward = [("timestamp", "1700000000".to_string()), ("folder", "issues".to_string())];
        let signature = cloudinary.sign(&mut forward);
        assert_eq!(signature, cloudinary.sign(&mut backward));

        let expected = HEXLOWER.encode(&Sha256::digest(b"folder=issues&timestamp=1700000000secret"));
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }
}
