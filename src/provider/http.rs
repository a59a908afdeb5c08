//! HTTP implementation of the provider contract.

use std::pin::Pin;

use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use futures_lite::{Stream, StreamExt as _};
use reqwest::{Client, Response, StatusCode};

use super::types::{Artist, EventLine, PlaybackStateResponse};
use super::{PlaybackProvider, PlaybackSnapshot, PushConnection, PushEvent};

/// Where the provider's surface lives.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// REST base, e.g. `https://api.spotify.com/v1`
    pub api_url: String,
    /// NDJSON event stream URL --- only used with the push strategy
    pub events_url: Option<String>,
    /// Token revocation endpoint called on logout
    pub revoke_url: Option<String>,
}

pub struct HttpProvider {
    config: ProviderConfig,
    token: String,
    client: Client,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig, token: String) -> Self {
        Self {
            config,
            token,
            client: Client::new(),
        }
    }

    async fn send_ok(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to reach provider for {what}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Provider request failed");
            return Err(anyhow!("{what} request failed: {status}"));
        }
        Ok(response)
    }
}

#[async_trait]
impl PlaybackProvider for HttpProvider {
    type Push = NdjsonPush;

    async fn query_current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
        let url = format!("{}/me/player", self.config.api_url);
        let params = [("additional_types", "track,episode")];
        let response = self
            .send_ok(self.client.get(&url).query(&params), "playback state")
            .await?;

        // An account with nothing playing answers with an empty body
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let state: PlaybackStateResponse = response
            .json()
            .await
            .context("Failed to parse playback state")?;
        Ok(Some(state.into()))
    }

    async fn artist_image(&self, artist_id: &str) -> Result<Option<String>> {
        let url = format!("{}/artists/{artist_id}", self.config.api_url);
        let artist: Artist = self
            .send_ok(self.client.get(&url), "artist metadata")
            .await?
            .json()
            .await
            .context("Failed to parse artist metadata")?;
        Ok(artist.images.first().map(|image| image.url.clone()))
    }

    async fn connect_push(&self) -> Result<NdjsonPush> {
        let url = self
            .config
            .events_url
            .as_deref()
            .ok_or_else(|| anyhow!("No event stream URL configured"))?;
        let response = self
            .send_ok(
                self.client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/x-ndjson"),
                "event stream",
            )
            .await?;
        tracing::info!(%url, "Push connection established");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()));
        Ok(NdjsonPush {
            stream: Box::pin(stream),
            buffer: Vec::new(),
        })
    }

    async fn toggle_play(&self) -> Result<()> {
        // The REST transport surface has no toggle of its own
        let playing = self
            .query_current_playback()
            .await?
            .is_some_and(|snapshot| !snapshot.paused);
        let endpoint = if playing { "pause" } else { "play" };
        let url = format!("{}/me/player/{endpoint}", self.config.api_url);
        self.send_ok(self.client.put(&url), "transport control")
            .await?;
        Ok(())
    }

    async fn next_track(&self) -> Result<()> {
        let url = format!("{}/me/player/next", self.config.api_url);
        self.send_ok(self.client.post(&url), "transport control")
            .await?;
        Ok(())
    }

    async fn previous_track(&self) -> Result<()> {
        let url = format!("{}/me/player/previous", self.config.api_url);
        self.send_ok(self.client.post(&url), "transport control")
            .await?;
        Ok(())
    }

    async fn log_out(&self) -> Result<()> {
        let Some(url) = self.config.revoke_url.as_deref() else {
            tracing::debug!("No revocation endpoint configured, dropping token locally");
            return Ok(());
        };
        let params = [("token", self.token.as_str())];
        self.send_ok(self.client.post(url).form(&params), "token revocation")
            .await?;
        tracing::info!("Session token revoked");
        Ok(())
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

/// Push subscription delivered as newline-delimited JSON over a long-lived
/// HTTP response.
pub struct NdjsonPush {
    stream: ByteStream,
    buffer: Vec<u8>,
}

impl NdjsonPush {
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let newline = self.buffer.iter().position(|&byte| byte == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
        line.pop();
        Some(line)
    }
}

#[async_trait]
impl PushConnection for NdjsonPush {
    async fn next_event(&mut self) -> Result<Option<PushEvent>> {
        loop {
            while let Some(line) = self.take_line() {
                // Blank lines are keep-alives
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                let event: EventLine =
                    serde_json::from_slice(&line).context("Failed to parse push event")?;
                return Ok(Some(event.into()));
            }
            match self.stream.next().await {
                Some(chunk) => self
                    .buffer
                    .extend_from_slice(&chunk.context("Push connection failed")?),
                None => return Ok(None),
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Dropping the response body is what actually closes the socket
        self.buffer.clear();
        Ok(())
    }
}
