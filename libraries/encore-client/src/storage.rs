//! Object storage calls (`/storage/v1`).

use crate::error::{ClientError, Result};
use crate::rest::check;
use encore_core::FetchedObject;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info};

/// Characters escaped inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Encode an object path, keeping `/` between segments
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Public URL of an object in a public bucket
pub(crate) fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url,
        bucket,
        encode_path(path)
    )
}

/// Storage client for one request scope.
pub struct StorageClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    api_key: &'a str,
    bearer: &'a str,
}

impl<'a> StorageClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, api_key: &'a str, bearer: &'a str) -> Self {
        Self {
            http,
            base_url,
            api_key,
            bearer,
        }
    }

    /// Upload bytes to `bucket/path`.
    ///
    /// Existing objects are not overwritten.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            encode_path(path)
        );
        let size = bytes.len();
        debug!(url = %url, size, "Uploading object");

        let response = self
            .http
            .post(&url)
            .header("apikey", self.api_key)
            .bearer_auth(self.bearer)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(ClientError::transport)?;

        check(response).await?;
        info!(bucket, path, size, "Object uploaded");
        Ok(path.to_string())
    }

    /// Plain GET of an arbitrary URL.
    pub async fn fetch(&self, url: &str) -> Result<FetchedObject> {
        debug!(url = %url, "Fetching remote object");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ServerError {
                status: status.as_u16(),
                message: format!("GET {} returned {}", url, status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(ClientError::transport)?;

        Ok(FetchedObject {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
