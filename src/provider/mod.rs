//! The contract consumed from the streaming provider's playback SDK.
//!
//! The adapter never talks to the network directly; it drives one of these
//! trait objects. [`http::HttpProvider`] is the real thing,
//! [`demo::DemoProvider`] is the offline stand-in.

pub mod demo;
pub mod http;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// One track as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackItem {
    pub id: String,
    pub title: String,
    pub artists: Vec<ArtistRef>,
    pub album_image: Option<String>,
    pub duration: Duration,
}

/// A track's artist as embedded in playback payloads. The full artist
/// object (with images) has to be fetched separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// One podcast episode as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeItem {
    pub id: String,
    pub title: String,
    pub publisher: String,
    pub image: Option<String>,
    pub show_image: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayingItem {
    Track(TrackItem),
    Episode(EpisodeItem),
}

impl PlayingItem {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Track(track) => &track.id,
            Self::Episode(episode) => &episode.id,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Track(track) => track.duration,
            Self::Episode(episode) => episode.duration,
        }
    }
}

/// Authoritative playback state, from a poll result or a pushed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// `None` when the account has no playable item active
    pub item: Option<PlayingItem>,
    pub paused: bool,
    pub position: Duration,
}

impl PlaybackSnapshot {
    /// Snapshot meaning "nothing is playing".
    #[must_use]
    pub fn empty() -> Self {
        Self {
            item: None,
            paused: true,
            position: Duration::ZERO,
        }
    }
}

/// Device-registration and state events delivered over the push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Ready { device_id: String },
    NotReady,
    StateChanged(PlaybackSnapshot),
}

/// Playback operations consumed from the provider.
#[async_trait]
pub trait PlaybackProvider {
    type Push: PushConnection + Send;

    /// Query the current playback state. `None` means nothing is playing.
    async fn query_current_playback(&self) -> Result<Option<PlaybackSnapshot>>;

    /// Supplementary artist metadata: the artist's primary image, if any.
    async fn artist_image(&self, artist_id: &str) -> Result<Option<String>>;

    /// Open the long-lived connection the provider pushes state over.
    async fn connect_push(&self) -> Result<Self::Push>;

    async fn toggle_play(&self) -> Result<()>;
    async fn next_track(&self) -> Result<()>;
    async fn previous_track(&self) -> Result<()>;

    /// Revoke the session token with the provider.
    async fn log_out(&self) -> Result<()>;
}

/// A live push subscription.
#[async_trait]
pub trait PushConnection {
    /// Wait for the next event. `None` means the provider closed the stream.
    async fn next_event(&mut self) -> Result<Option<PushEvent>>;

    /// Tear the connection down.
    async fn disconnect(&mut self) -> Result<()>;
}
