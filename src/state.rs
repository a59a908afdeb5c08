//! Reactive playback state shared with the UI layer.

use std::time::Duration;

use crate::provider::PlayingItem;

/// The normalized "currently playing" record.
///
/// Replaced wholesale on every authoritative provider update; never patched
/// field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayingNow {
    /// Stable identifier of the track or episode
    pub item_id: String,
    /// Display title
    pub title: String,
    /// Artist names joined for display, or the show publisher for episodes
    pub artist: String,
    /// Cover art URL
    pub image: Option<String>,
    /// Artist or show image URL
    pub artist_image: Option<String>,
    /// Total length of the item
    pub duration: Duration,
}

/// Everything the UI can observe about the playback session.
///
/// `Idle` means the provider answered but nothing is playing; `Error` means
/// the provider could not be reached or returned garbage. The two are
/// deliberately distinct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    NotStarted,
    Connecting,
    Idle,
    Playing {
        item: PlayingNow,
        position: Duration,
        paused: bool,
    },
    Error(String),
}

impl PlayingNow {
    /// Normalize a provider item into the display record.
    ///
    /// `artist_image` is the supplementary image fetched separately for
    /// tracks; episodes carry their show image inline and ignore it.
    pub fn from_item(item: &PlayingItem, artist_image: Option<String>) -> Self {
        match item {
            PlayingItem::Track(track) => Self {
                item_id: track.id.clone(),
                title: track.title.clone(),
                artist: track
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                image: track.album_image.clone(),
                artist_image,
                duration: track.duration,
            },
            PlayingItem::Episode(episode) => Self {
                item_id: episode.id.clone(),
                title: episode.title.clone(),
                artist: episode.publisher.clone(),
                image: episode.image.clone(),
                artist_image: episode.show_image.clone(),
                duration: episode.duration,
            },
        }
    }
}

impl PlayerState {
    /// Identifier of the held item, if one is playing.
    #[must_use]
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Playing { item, .. } => Some(&item.item_id),
            _ => None,
        }
    }
}
