//! The playback state adapter: owns the provider relationship and
//! republishes normalized state to whoever is watching.

mod event_loop;
mod progress;

use std::time::Duration;

use anyhow::Result;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{provider::PlaybackProvider, state::PlayerState};

/// How the adapter learns about playback changes. The two strategies are
/// mutually exclusive; one is picked per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Query the provider on a fixed interval
    Poll { every: Duration },
    /// Subscribe to provider-pushed state events
    Push,
}

/// Control actions forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    NextTrack,
    PreviousTrack,
    LogOut,
    Stop,
}

/// Handle to a running playback session.
///
/// Dropping the handle without calling [`Self::stop`] aborts the session
/// task outright.
pub struct PlaybackAdapter {
    state_rx: watch::Receiver<PlayerState>,
    ready_rx: watch::Receiver<bool>,
    commands: mpsc::Sender<Command>,
    task: Option<JoinHandle<Result<()>>>,
}

impl PlaybackAdapter {
    /// Spawn the session event loop over an owned provider handle.
    pub fn start<P>(provider: P, strategy: Strategy) -> Self
    where
        P: PlaybackProvider + Send + Sync + 'static,
    {
        let (state_tx, state_rx) = watch::channel(PlayerState::NotStarted);
        let (ready_tx, ready_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::channel(8);
        let task = tokio::spawn(event_loop::run(
            provider, strategy, state_tx, ready_tx, command_rx,
        ));
        Self {
            state_rx,
            ready_rx,
            commands: command_tx,
            task: Some(task),
        }
    }

    /// Observable playback state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<PlayerState> {
        self.state_rx.clone()
    }

    /// Observable device readiness.
    #[must_use]
    pub fn ready(&self) -> watch::Receiver<bool> {
        self.ready_rx.clone()
    }

    pub async fn toggle_play(&self) {
        self.send(Command::TogglePlay).await;
    }

    pub async fn next(&self) {
        self.send(Command::NextTrack).await;
    }

    pub async fn previous(&self) {
        self.send(Command::PreviousTrack).await;
    }

    /// Revoke the provider session and end the loop.
    pub async fn log_out(&self) {
        self.send(Command::LogOut).await;
    }

    /// Tear the session down. Safe to call any number of times.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        self.send(Command::Stop).await;
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn send(&self, command: Command) {
        // A closed channel means the loop is already gone; every control
        // action on a stopped session is a no-op
        if self.commands.send(command).await.is_err() {
            tracing::debug!(?command, "Session is not running, ignoring command");
        }
    }
}

impl Drop for PlaybackAdapter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
