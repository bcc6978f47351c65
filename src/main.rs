//! unison - realtime word-matching party game server
//!
//! Players gather in code-addressed rooms and each round secretly submit
//! one word; the round is won when everyone's word matches.

mod game;
mod network;
mod room;
mod session;

use network::{Server, ServerEvent, DEFAULT_PORT};
use session::Coordinator;
use std::io;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let mut server = Server::start_on_port(port)?;
    info!(port = server.port(), "unison server up");

    let mut coordinator = Coordinator::new();

    // Single-threaded dispatch: every event is fully handled, including
    // its broadcasts, before the next one is looked at.
    loop {
        let events = server.poll();
        if events.is_empty() {
            thread::sleep(Duration::from_millis(10));
            continue;
        }
        for event in events {
            match event {
                ServerEvent::ChannelOpened { addr } => {
                    coordinator.handle_open(addr, &mut server);
                }
                ServerEvent::ChannelClosed { addr } => {
                    coordinator.handle_close(addr, &mut server);
                }
                ServerEvent::MessageReceived { from, message } => {
                    coordinator.handle_message(from, message, &mut server);
                }
            }
        }
    }
}
