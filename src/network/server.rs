#![allow(dead_code)]
//! TCP server owning all client channels

use super::channel::Channel;
use super::protocol::{ClientMessage, ServerMessage};
use crate::session::MessageSink;
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Default listen port
pub const DEFAULT_PORT: u16 = 56733;

/// Maximum port to try when auto-incrementing
const MAX_PORT: u16 = 56833;

/// Accepts connections and multiplexes their channels for the dispatch loop
pub struct Server {
    /// Local address the server is bound to
    addr: SocketAddr,
    /// Channel to receive newly accepted connections
    new_channels_rx: Receiver<Channel>,
    /// Open channels keyed by their handle
    channels: HashMap<SocketAddr, Channel>,
    /// Running flag
    running: bool,
}

impl Server {
    /// Start a new server on the default port with auto-increment
    pub fn start() -> io::Result<Self> {
        Self::start_on_port(DEFAULT_PORT)
    }

    /// Start a new server on a specific port with auto-increment fallback
    pub fn start_on_port(start_port: u16) -> io::Result<Self> {
        let mut port = start_port;
        let listener = loop {
            match TcpListener::bind(format!("0.0.0.0:{}", port)) {
                Ok(l) => break l,
                Err(e) if e.kind() == io::ErrorKind::AddrInUse && port < MAX_PORT => {
                    port += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let (new_channels_tx, new_channels_rx) = channel();

        // Acceptor thread
        thread::spawn(move || {
            accept_loop(listener, new_channels_tx);
        });

        info!(%addr, "server listening");

        Ok(Server {
            addr,
            new_channels_rx,
            channels: HashMap::new(),
            running: true,
        })
    }

    /// Get the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port the server is listening on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Poll for new connections, inbound messages, and closed channels.
    /// Events come out in a stable order: opens, then messages, then closes,
    /// so a close is never reported before that channel's final messages.
    pub fn poll(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();

        // Accept new channels
        loop {
            match self.new_channels_rx.try_recv() {
                Ok(chan) => {
                    debug!(addr = %chan.addr, "channel opened");
                    events.push(ServerEvent::ChannelOpened { addr: chan.addr });
                    self.channels.insert(chan.addr, chan);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running = false;
                    break;
                }
            }
        }

        // Collect messages and track closed channels
        let mut closed = Vec::new();
        for (addr, chan) in self.channels.iter_mut() {
            for message in chan.recv_all() {
                events.push(ServerEvent::MessageReceived { from: *addr, message });
            }
            if !chan.is_alive() {
                closed.push(*addr);
            }
        }

        for addr in closed {
            self.channels.remove(&addr);
            debug!(%addr, "channel closed");
            events.push(ServerEvent::ChannelClosed { addr });
        }

        events
    }

    /// Get the number of open channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Check if the server is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the server
    pub fn stop(&mut self) {
        self.running = false;
        self.channels.clear();
    }
}

impl MessageSink for Server {
    /// Best-effort send: unknown or closed handles drop the message silently
    fn send(&mut self, to: SocketAddr, msg: &ServerMessage) {
        if let Some(chan) = self.channels.get(&to) {
            chan.send(msg);
        } else {
            debug!(addr = %to, "dropping send to unknown channel");
        }
    }

    /// Serializes once and reuses the frame for every recipient
    fn broadcast(&mut self, to: &[SocketAddr], msg: &ServerMessage) {
        let bytes = msg.to_bytes();
        for addr in to {
            if let Some(chan) = self.channels.get(addr) {
                chan.send_raw(bytes.clone());
            }
        }
    }
}

/// Events from the server, consumed by the dispatch loop
#[derive(Debug)]
pub enum ServerEvent {
    /// A new channel opened
    ChannelOpened { addr: SocketAddr },
    /// A channel closed (disconnect or protocol violation)
    ChannelClosed { addr: SocketAddr },
    /// A decoded message arrived on a channel
    MessageReceived {
        from: SocketAddr,
        message: ClientMessage,
    },
}

fn accept_loop(listener: TcpListener, tx: Sender<Channel>) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                if let Ok(chan) = Channel::new(stream) {
                    if tx.send(chan).is_err() {
                        break;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(_) => break,
        }
    }
}
