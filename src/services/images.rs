use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use url::Url;

use super::ImageHost;
use crate::data_formats::Upload;

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary client configured from `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResult {
    result: String,
}

impl CloudinaryClient {
    pub fn from_url(cloudinary_url: &str) -> Result<Self> {
        let url = Url::parse(cloudinary_url).context("CLOUDINARY_URL is not a valid URL")?;
        if url.scheme() != "cloudinary" {
            bail!("CLOUDINARY_URL must use the cloudinary:// scheme");
        }
        let api_key = url.username().to_string();
        let api_secret = url
            .password()
            .ok_or_else(|| anyhow!("CLOUDINARY_URL is missing the api secret"))?
            .to_string();
        let cloud_name = url
            .host_str()
            .ok_or_else(|| anyhow!("CLOUDINARY_URL is missing the cloud name"))?
            .to_string();
        if api_key.is_empty() {
            bail!("CLOUDINARY_URL is missing the api key");
        }
        Ok(Self {
            http: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
            api_base: CLOUDINARY_API.to_string(),
        })
    }

    /// Signature over the alphabetically sorted parameters followed by the secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_base, self.cloud_name, action)
    }
}

#[async_trait::async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, image: Upload) -> Result<String> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("timestamp", timestamp.as_str())]);
        let mut part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach image host")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Image upload rejected ({status}): {body}");
        }
        let result: UploadResult = response.json().await.context("Unexpected upload response")?;
        Ok(result.secure_url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let public_id = match extract_public_id(url) {
            Some(public_id) => public_id,
            None => {
                tracing::debug!("no hosted image identifier in {}", url);
                return Ok(());
            }
        };
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);
        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach image host")?;
        if !response.status().is_success() {
            bail!("Image deletion rejected ({})", response.status());
        }
        let result: DestroyResult = response.json().await.context("Unexpected destroy response")?;
        match result.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(anyhow!("Image deletion failed: {other}")),
        }
    }
}

/// Used when no image host is configured.
pub struct DisabledImageHost;

#[async_trait::async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _image: Upload) -> Result<String> {
        Err(anyhow!("Image hosting is not configured"))
    }

    async fn delete(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}

pub fn image_host_from_config(cloudinary_url: Option<&str>) -> Result<Arc<dyn ImageHost>> {
    Ok(match cloudinary_url {
        Some(url) => Arc::new(CloudinaryClient::from_url(url)?),
        None => {
            tracing::warn!("CLOUDINARY_URL not set, image uploads are disabled");
            Arc::new(DisabledImageHost)
        }
    })
}

/// Storage identifier of a hosted image:
/// `.../upload/[v<version>/]<identifier>.<ext>` yields `<identifier>`.
pub fn extract_public_id(image_url: &str) -> Option<String> {
    const MARKER: &str = "/upload/";
    let mut start = image_url.find(MARKER)? + MARKER.len();
    let rest = &image_url[start..];
    if let Some((segment, _)) = rest.split_once('/') {
        let is_version = segment.len() > 1
            && segment.starts_with('v')
            && segment[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            start += segment.len() + 1;
        }
    }
    let end = image_url.rfind('.')?;
    if end <= start {
        return None;
    }
    Some(image_url[start..end].to_string())
}
