//! Hosted backend: Supabase REST, storage and realtime endpoints.
//!
//! Every request carries the anonymous key both as `apikey` and as a bearer
//! token. Access rules live on the server; the client assumes a table that
//! anyone may read, insert into and delete from.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

use super::{realtime, BlobStore, ChatBackend, FeedHandler, MessageStore, RealtimeFeed};
use super::Subscription;
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, NewMessage};

const TABLE_PATH: &str = "rest/v1/messages";
const REALTIME_PATH: &str = "realtime/v1/websocket";
const PROTOCOL_VERSION: &str = "1.0.0";

/// Client for a hosted project
pub struct SupabaseBackend {
    client: Client,
    base: Url,
    anon_key: String,
    bucket: String,
}

impl SupabaseBackend {
    /// Create a client for the project at `base_url`.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> ChatResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ChatError::Config(format!(
                "backend URL must be http or https, got {}",
                base.scheme()
            )));
        }

        Ok(Self {
            client: Client::new(),
            base,
            anon_key: anon_key.into(),
            bucket: bucket.into(),
        })
    }

    fn table_url(&self) -> ChatResult<Url> {
        Ok(self.base.join(TABLE_PATH)?)
    }

    fn upload_url(&self, name: &str) -> ChatResult<Url> {
        Ok(self
            .base
            .join(&format!("storage/v1/object/{}/{}", self.bucket, name))?)
    }

    /// Public URL of an object in the attachment bucket
    pub fn public_url(&self, name: &str) -> ChatResult<Url> {
        Ok(self
            .base
            .join(&format!("storage/v1/object/public/{}/{}", self.bucket, name))?)
    }

    /// Websocket URL of the realtime service
    pub fn realtime_url(&self) -> ChatResult<Url> {
        let mut url = self.base.join(REALTIME_PATH)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ChatError::Config(format!("cannot derive websocket URL from {}", self.base)))?;
        url.query_pairs_mut()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", PROTOCOL_VERSION);
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

/// Turn a non-success response into [`ChatError::Backend`].
async fn check(response: Response) -> ChatResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ChatError::Backend {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl MessageStore for SupabaseBackend {
    async fn fetch_all(&self) -> ChatResult<Vec<Message>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.asc");

        let response = check(self.authed(self.client.get(url)).send().await?).await?;
        let messages: Vec<Message> = response.json().await?;
        debug!(count = messages.len(), "Fetched message history");
        Ok(messages)
    }

    async fn insert(&self, message: NewMessage) -> ChatResult<()> {
        let request = self
            .client
            .post(self.table_url()?)
            .header("Prefer", "return=minimal")
            .json(&message);
        check(self.authed(request).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> ChatResult<()> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        let request = self
            .client
            .delete(url)
            .header("Prefer", "return=representation");
        let response = check(self.authed(request).send().await?).await?;
        let removed: Vec<Message> = response.json().await?;
        if removed.is_empty() {
            return Err(ChatError::MessageNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeFeed for SupabaseBackend {
    async fn subscribe(&self, handler: FeedHandler) -> ChatResult<Box<dyn Subscription>> {
        let url = self.realtime_url()?;
        let sub = realtime::connect(url, &self.anon_key, handler).await?;
        Ok(Box::new(sub))
    }
}

#[async_trait]
impl BlobStore for SupabaseBackend {
    async fn put(&self, name: &str, data: Bytes, mime: &str) -> ChatResult<String> {
        let size = data.len();
        let request = self
            .client
            .post(self.upload_url(name)?)
            .header("Content-Type", mime)
            .header("x-upsert", "false")
            .body(data);
        check(self.authed(request).send().await?).await?;

        let url = self.public_url(name)?;
        info!(name, mime, size, "Uploaded blob");
        Ok(url.to_string())
    }

    async fn fetch(&self, url: &str) -> ChatResult<Bytes> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ChatError::BlobNotFound(url.to_string()));
        }
        Ok(check(response).await?.bytes().await?)
    }
}

impl ChatBackend for SupabaseBackend {
    fn kind(&self) -> &'static str {
        "supabase"
    }
}
