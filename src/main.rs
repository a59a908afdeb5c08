use std::time::Duration;

use anyhow::Result;
use clap::Parser as _;
use tokio::io::{stdin, AsyncBufReadExt as _, BufReader};

mod adapter;
mod args;
mod control;
mod out;
mod provider;
mod state;

use adapter::{Command, PlaybackAdapter, Strategy};
use args::SyncStrategy;
use out::StatusLine;
use provider::{
    demo::DemoProvider,
    http::{HttpProvider, ProviderConfig},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber();

    let strategy = match args.strategy {
        SyncStrategy::Poll => Strategy::Poll {
            every: Duration::from_secs_f64(args.refresh_every),
        },
        SyncStrategy::Push => Strategy::Push,
    };

    let mut adapter = if args.demo {
        PlaybackAdapter::start(DemoProvider::new(), strategy)
    } else {
        let token = args.access_token()?;
        let config = ProviderConfig {
            api_url: args.api_url.clone(),
            events_url: args.events_url.clone(),
            revoke_url: args.revoke_url.clone(),
        };
        PlaybackAdapter::start(HttpProvider::new(config, token), strategy)
    };

    run_ui(&adapter).await?;
    adapter.stop().await
}

/// Republish every state change as a JSON line on stdout and feed stdin
/// commands back into the session.
async fn run_ui(adapter: &PlaybackAdapter) -> Result<()> {
    let mut state_rx = adapter.state();
    let mut ready_rx = adapter.ready();
    let mut input = BufReader::new(stdin()).lines();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = ready_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    // The UI closed our stdin
                    break;
                };
                match control::parse_command(&line) {
                    Some(Command::TogglePlay) => adapter.toggle_play().await,
                    Some(Command::NextTrack) => adapter.next().await,
                    Some(Command::PreviousTrack) => adapter.previous().await,
                    Some(Command::LogOut) => adapter.log_out().await,
                    Some(Command::Stop) => break,
                    None => {}
                }
                continue;
            }
        }
        let state = state_rx.borrow_and_update().clone();
        let ready = *ready_rx.borrow_and_update();
        StatusLine::new(&state, ready).print()?;
    }
    Ok(())
}
