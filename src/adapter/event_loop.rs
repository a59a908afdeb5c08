//! The session loop: multiplexes provider updates, the two timers and
//! control commands on a single task.

use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use tokio::{
    select,
    sync::{mpsc, watch},
    time::{interval, MissedTickBehavior},
};

use crate::{
    provider::{PlaybackProvider, PlaybackSnapshot, PlayingItem, PushConnection, PushEvent},
    state::{PlayerState, PlayingNow},
};

use super::progress::{ProgressTicker, STEP};
use super::{Command, Strategy};

enum LoopControl {
    Continue,
    Shutdown,
}

struct Session {
    state: PlayerState,
    state_tx: watch::Sender<PlayerState>,
    ready_tx: watch::Sender<bool>,
    progress: ProgressTicker,
    /// Whether the provider relationship is far enough along for transport
    /// commands to be meaningful
    established: bool,
}

impl Session {
    fn new(state_tx: watch::Sender<PlayerState>, ready_tx: watch::Sender<bool>) -> Self {
        let session = Self {
            state: PlayerState::Connecting,
            state_tx,
            ready_tx,
            progress: ProgressTicker::default(),
            established: false,
        };
        session.publish();
        session
    }

    fn publish(&self) {
        let state = self.state.clone();
        self.state_tx.send_if_modified(move |current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn set_ready(&mut self, ready: bool) {
        self.ready_tx.send_if_modified(|current| {
            if *current == ready {
                false
            } else {
                *current = ready;
                true
            }
        });
    }

    fn replace(&mut self, state: PlayerState) {
        self.state = state;
        self.sync_progress();
        self.publish();
    }

    /// Keep the progress ticker armed exactly while playback is running.
    fn sync_progress(&mut self) {
        match &self.state {
            PlayerState::Playing { paused: false, .. } => self.progress.arm(),
            _ => self.progress.disarm(),
        }
    }

    /// Fold an authoritative snapshot into the held state.
    ///
    /// When the item identifier matches what is already held, the record is
    /// kept and only position and paused are taken from the snapshot.
    fn apply_snapshot(&mut self, snapshot: PlaybackSnapshot, artist_image: Option<String>) {
        let Some(item) = snapshot.item else {
            self.replace(PlayerState::Idle);
            return;
        };
        let position = snapshot.position.min(item.duration());

        if let PlayerState::Playing {
            item: held,
            position: held_position,
            paused,
        } = &mut self.state
        {
            if held.item_id == item.id() {
                *held_position = position;
                *paused = snapshot.paused;
                self.sync_progress();
                self.publish();
                return;
            }
        }

        self.replace(PlayerState::Playing {
            item: PlayingNow::from_item(&item, artist_image),
            position,
            paused: snapshot.paused,
        });
    }

    /// One simulation tick: advance the held position by the fixed step,
    /// never past the item duration.
    fn advance_position(&mut self) {
        if let PlayerState::Playing {
            item,
            position,
            paused: false,
        } = &mut self.state
        {
            *position = (*position + STEP).min(item.duration);
            self.publish();
        }
    }
}

pub(super) async fn run<P>(
    provider: P,
    strategy: Strategy,
    state_tx: watch::Sender<PlayerState>,
    ready_tx: watch::Sender<bool>,
    commands: mpsc::Receiver<Command>,
) -> Result<()>
where
    P: PlaybackProvider + Send + Sync + 'static,
{
    let mut session = Session::new(state_tx, ready_tx);
    let result = match strategy {
        Strategy::Poll { every } => poll_loop(&mut session, &provider, every, commands).await,
        Strategy::Push => push_loop(&mut session, &provider, commands).await,
    };

    match &result {
        Ok(()) => session.replace(PlayerState::NotStarted),
        Err(e) => session.replace(PlayerState::Error(format!("{e:#}"))),
    }
    session.set_ready(false);
    result
}

async fn poll_loop<P: PlaybackProvider>(
    session: &mut Session,
    provider: &P,
    every: Duration,
    mut commands: mpsc::Receiver<Command>,
) -> Result<()> {
    let mut poll = interval(every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            _ = poll.tick() => handle_poll(session, provider).await,
            () = session.progress.tick() => session.advance_position(),
            command = commands.recv() => {
                if let LoopControl::Shutdown = handle_command(session, provider, command).await {
                    return Ok(());
                }
            }
        }
    }
}

async fn push_loop<P: PlaybackProvider>(
    session: &mut Session,
    provider: &P,
    mut commands: mpsc::Receiver<Command>,
) -> Result<()> {
    let mut connection = provider
        .connect_push()
        .await
        .context("Failed to open push connection")?;

    let result = loop {
        select! {
            event = connection.next_event() => match event {
                Ok(Some(event)) => handle_push_event(session, event),
                Ok(None) => break Err(anyhow!("Provider closed the push connection")),
                Err(e) => break Err(e.context("Push connection failed")),
            },
            () = session.progress.tick() => session.advance_position(),
            command = commands.recv() => {
                if let LoopControl::Shutdown = handle_command(session, provider, command).await {
                    break Ok(());
                }
            }
        }
    };

    if let Err(e) = connection.disconnect().await {
        tracing::warn!(?e, "Failed to close push connection");
    }
    result
}

async fn handle_poll<P: PlaybackProvider>(session: &mut Session, provider: &P) {
    let snapshot = match provider.query_current_playback().await {
        Ok(snapshot) => snapshot.unwrap_or_else(PlaybackSnapshot::empty),
        Err(e) => {
            tracing::warn!(?e, "Playback query failed");
            session.replace(PlayerState::Error(format!("{e:#}")));
            return;
        }
    };

    if !session.established {
        tracing::debug!("Provider relationship established");
        session.established = true;
        session.set_ready(true);
    }

    let artist_image = supplementary_image(session, provider, &snapshot).await;
    session.apply_snapshot(snapshot, artist_image);
}

/// Fetch the artist image when the snapshot switches to a track not held
/// yet. Consecutive snapshots of the same item never refetch.
async fn supplementary_image<P: PlaybackProvider>(
    session: &Session,
    provider: &P,
    snapshot: &PlaybackSnapshot,
) -> Option<String> {
    let item = snapshot.item.as_ref()?;
    if session.state.item_id() == Some(item.id()) {
        return None;
    }
    let PlayingItem::Track(track) = item else {
        return None;
    };
    let artist = track.artists.first()?;
    match provider.artist_image(&artist.id).await {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(?e, artist = %artist.name, "Failed to fetch artist image");
            None
        }
    }
}

fn handle_push_event(session: &mut Session, event: PushEvent) {
    match event {
        PushEvent::Ready { device_id } => {
            tracing::info!(%device_id, "Playback device registered");
            session.established = true;
            session.set_ready(true);
            if matches!(session.state, PlayerState::Connecting) {
                session.replace(PlayerState::Idle);
            }
        }
        PushEvent::NotReady => {
            tracing::info!("Playback device went away");
            session.established = false;
            session.set_ready(false);
        }
        PushEvent::StateChanged(snapshot) => {
            // Pushed payloads are complete; no supplementary fetch
            session.apply_snapshot(snapshot, None);
        }
    }
}

async fn handle_command<P: PlaybackProvider>(
    session: &Session,
    provider: &P,
    command: Option<Command>,
) -> LoopControl {
    // A closed channel means every adapter handle is gone
    let Some(command) = command else {
        return LoopControl::Shutdown;
    };

    match command {
        Command::Stop => return LoopControl::Shutdown,
        Command::LogOut => {
            if let Err(e) = provider.log_out().await {
                tracing::warn!(?e, "Token revocation failed");
            }
            tracing::info!("Signed out, ending session");
            return LoopControl::Shutdown;
        }
        Command::TogglePlay | Command::NextTrack | Command::PreviousTrack
            if !session.established =>
        {
            tracing::debug!(?command, "Provider connection not established, ignoring");
        }
        Command::TogglePlay => log_transport(provider.toggle_play().await, command),
        Command::NextTrack => log_transport(provider.next_track().await, command),
        Command::PreviousTrack => log_transport(provider.previous_track().await, command),
    }
    LoopControl::Continue
}

fn log_transport(result: Result<()>, command: Command) {
    if let Err(e) = result {
        tracing::warn!(?e, ?command, "Transport command failed");
    }
}
