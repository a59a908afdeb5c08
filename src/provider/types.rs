//! Wire types for the provider's REST and event payloads.

use std::time::Duration;

use serde::Deserialize;

use super::{ArtistRef, EpisodeItem, PlaybackSnapshot, PlayingItem, PushEvent, TrackItem};

/// Response of the current-playback endpoint.
#[derive(Debug, Deserialize)]
pub struct PlaybackStateResponse {
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    pub item: Option<Item>,
}

/// A playable item, tagged `track` or `episode` by the provider.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Track(Track),
    Episode(Episode),
}

#[derive(Debug, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    pub artists: Vec<ArtistSummary>,
    pub album: Album,
}

#[derive(Debug, Deserialize)]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Episode {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub images: Vec<Image>,
    pub show: Show,
}

#[derive(Debug, Deserialize)]
pub struct Show {
    pub publisher: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Full artist object returned by the artist endpoint.
#[derive(Debug, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub images: Vec<Image>,
}

/// One line of the NDJSON event stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventLine {
    Ready {
        device_id: String,
    },
    NotReady {},
    StateChanged {
        paused: bool,
        position_ms: u64,
        item: Option<Item>,
    },
}

fn first_image(images: &[Image]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

impl From<Item> for PlayingItem {
    fn from(item: Item) -> Self {
        match item {
            Item::Track(track) => Self::Track(TrackItem {
                id: track.id,
                title: track.name,
                artists: track
                    .artists
                    .into_iter()
                    .map(|artist| ArtistRef {
                        id: artist.id,
                        name: artist.name,
                    })
                    .collect(),
                album_image: first_image(&track.album.images),
                duration: Duration::from_millis(track.duration_ms),
            }),
            Item::Episode(episode) => Self::Episode(EpisodeItem {
                id: episode.id,
                title: episode.name,
                publisher: episode.show.publisher,
                image: first_image(&episode.images),
                show_image: first_image(&episode.show.images),
                duration: Duration::from_millis(episode.duration_ms),
            }),
        }
    }
}

impl From<PlaybackStateResponse> for PlaybackSnapshot {
    fn from(response: PlaybackStateResponse) -> Self {
        Self {
            item: response.item.map(Into::into),
            paused: !response.is_playing,
            position: Duration::from_millis(response.progress_ms.unwrap_or(0)),
        }
    }
}

impl From<EventLine> for PushEvent {
    fn from(line: EventLine) -> Self {
        match line {
            EventLine::Ready { device_id } => Self::Ready { device_id },
            EventLine::NotReady {} => Self::NotReady,
            EventLine::StateChanged {
                paused,
                position_ms,
                item,
            } => Self::StateChanged(PlaybackSnapshot {
                item: item.map(Into::into),
                paused,
                position: Duration::from_millis(position_ms),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_payload() {
        let payload = r#"{
            "is_playing": true,
            "progress_ms": 10000,
            "item": {
                "type": "track",
                "id": "4uLU6hMCjMI75M1A2tKUQC",
                "name": "Business",
                "duration_ms": 222640,
                "artists": [
                    {"id": "7dGJo4pcD2V6oG8kP0tJRR", "name": "Eminem"}
                ],
                "album": {"images": [{"url": "https://img.example/cover.jpg"}]}
            }
        }"#;

        let response: PlaybackStateResponse = serde_json::from_str(payload).unwrap();
        let snapshot = PlaybackSnapshot::from(response);

        assert!(!snapshot.paused);
        assert_eq!(snapshot.position, Duration::from_secs(10));
        let Some(PlayingItem::Track(track)) = snapshot.item else {
            panic!("expected a track");
        };
        assert_eq!(track.id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(track.artists.len(), 1);
        assert_eq!(
            track.album_image.as_deref(),
            Some("https://img.example/cover.jpg")
        );
        assert_eq!(track.duration, Duration::from_millis(222_640));
    }

    #[test]
    fn episode_payload() {
        let payload = r#"{
            "is_playing": false,
            "progress_ms": 90000,
            "item": {
                "type": "episode",
                "id": "512ojhOuo1ktJprKbVcKyQ",
                "name": "Episode 42",
                "duration_ms": 3600000,
                "images": [{"url": "https://img.example/episode.jpg"}],
                "show": {
                    "publisher": "Some Network",
                    "images": [{"url": "https://img.example/show.jpg"}]
                }
            }
        }"#;

        let response: PlaybackStateResponse = serde_json::from_str(payload).unwrap();
        let snapshot = PlaybackSnapshot::from(response);

        assert!(snapshot.paused);
        let Some(PlayingItem::Episode(episode)) = snapshot.item else {
            panic!("expected an episode");
        };
        assert_eq!(episode.publisher, "Some Network");
        assert_eq!(
            episode.image.as_deref(),
            Some("https://img.example/episode.jpg")
        );
        assert_eq!(
            episode.show_image.as_deref(),
            Some("https://img.example/show.jpg")
        );
    }

    #[test]
    fn missing_progress_and_images_normalize() {
        let payload = r#"{
            "is_playing": true,
            "item": {
                "type": "track",
                "id": "x",
                "name": "Untitled",
                "duration_ms": 1000,
                "artists": [{"id": "a", "name": "Anon"}],
                "album": {"images": []}
            }
        }"#;

        let snapshot: PlaybackSnapshot = serde_json::from_str::<PlaybackStateResponse>(payload)
            .unwrap()
            .into();

        assert_eq!(snapshot.position, Duration::ZERO);
        let Some(PlayingItem::Track(track)) = snapshot.item else {
            panic!("expected a track");
        };
        assert_eq!(track.album_image, None);
    }

    #[test]
    fn event_lines() {
        let ready: EventLine =
            serde_json::from_str(r#"{"event":"ready","device_id":"dev-1"}"#).unwrap();
        assert_eq!(
            PushEvent::from(ready),
            PushEvent::Ready {
                device_id: "dev-1".to_owned()
            }
        );

        let not_ready: EventLine = serde_json::from_str(r#"{"event":"not_ready"}"#).unwrap();
        assert_eq!(PushEvent::from(not_ready), PushEvent::NotReady);

        let changed: EventLine = serde_json::from_str(
            r#"{"event":"state_changed","paused":false,"position_ms":10000,"item":null}"#,
        )
        .unwrap();
        let PushEvent::StateChanged(snapshot) = PushEvent::from(changed) else {
            panic!("expected a state change");
        };
        assert!(!snapshot.paused);
        assert_eq!(snapshot.position, Duration::from_secs(10));
        assert_eq!(snapshot.item, None);
    }
}
