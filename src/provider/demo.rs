//! Canned provider for exercising the whole pipeline offline.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use super::{
    ArtistRef, PlaybackProvider, PlaybackSnapshot, PlayingItem, PushConnection, PushEvent,
    TrackItem,
};

/// Serves one looping track without contacting any network service.
pub struct DemoProvider {
    started: Instant,
}

impl DemoProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn demo_item() -> PlayingItem {
    PlayingItem::Track(TrackItem {
        id: "demo-track".to_owned(),
        title: "Freddie Freeloader".to_owned(),
        artists: vec![ArtistRef {
            id: "demo-artist".to_owned(),
            name: "Miles Davis".to_owned(),
        }],
        album_image: Some("https://picsum.photos/seed/cover/640".to_owned()),
        duration: Duration::from_secs(586),
    })
}

#[async_trait]
impl PlaybackProvider for DemoProvider {
    type Push = DemoPush;

    async fn query_current_playback(&self) -> Result<Option<PlaybackSnapshot>> {
        let item = demo_item();
        let duration = item.duration();
        let elapsed = self.started.elapsed();
        let position =
            Duration::from_millis((elapsed.as_millis() % duration.as_millis()) as u64);
        Ok(Some(PlaybackSnapshot {
            item: Some(item),
            paused: false,
            position,
        }))
    }

    async fn artist_image(&self, _artist_id: &str) -> Result<Option<String>> {
        Ok(Some("https://picsum.photos/seed/artist/640".to_owned()))
    }

    async fn connect_push(&self) -> Result<DemoPush> {
        Ok(DemoPush {
            queue: [
                PushEvent::Ready {
                    device_id: "demo-device".to_owned(),
                },
                PushEvent::StateChanged(PlaybackSnapshot {
                    item: Some(demo_item()),
                    paused: false,
                    position: Duration::ZERO,
                }),
            ]
            .into(),
        })
    }

    async fn toggle_play(&self) -> Result<()> {
        tracing::info!("Demo provider, ignoring transport command");
        Ok(())
    }

    async fn next_track(&self) -> Result<()> {
        tracing::info!("Demo provider, ignoring transport command");
        Ok(())
    }

    async fn previous_track(&self) -> Result<()> {
        tracing::info!("Demo provider, ignoring transport command");
        Ok(())
    }

    async fn log_out(&self) -> Result<()> {
        Ok(())
    }
}

/// Replays the scripted handshake, then stays silent forever.
pub struct DemoPush {
    queue: VecDeque<PushEvent>,
}

#[async_trait]
impl PushConnection for DemoPush {
    async fn next_event(&mut self) -> Result<Option<PushEvent>> {
        match self.queue.pop_front() {
            Some(event) => Ok(Some(event)),
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}
