//! One connected client channel
//!
//! Bridges a TCP stream to the single-threaded dispatch loop: a reader
//! thread decodes inbound frames into [`ClientMessage`]s, a writer thread
//! drains pre-framed outbound bytes. Game state never lives here.

use super::protocol::{self, ClientMessage, ServerMessage};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// A connected client channel
pub struct Channel {
    /// Peer address, used as the opaque channel handle everywhere else
    pub addr: SocketAddr,
    /// Framed outbound bytes for the writer thread
    tx: Sender<Vec<u8>>,
    /// Decoded inbound messages from the reader thread
    rx: Receiver<ClientMessage>,
    /// Whether the connection is still alive
    alive: bool,
}

impl Channel {
    /// Wrap an accepted TCP stream, spawning its reader and writer threads
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let addr = stream.peer_addr()?;

        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_millis(100)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;

        let (outgoing_tx, outgoing_rx) = channel::<Vec<u8>>();
        let (incoming_tx, incoming_rx) = channel::<ClientMessage>();

        let mut read_stream = stream.try_clone()?;
        let mut write_stream = stream;

        // Writer thread
        thread::spawn(move || {
            while let Ok(bytes) = outgoing_rx.recv() {
                if protocol::write_frame(&mut write_stream, &bytes).is_err() {
                    break;
                }
            }
        });

        // Reader thread
        thread::spawn(move || loop {
            match protocol::read_frame(&mut read_stream) {
                Ok(payload) => match ClientMessage::decode(&payload) {
                    Ok(msg) => {
                        if incoming_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    // Malformed or unrecognized messages are dropped
                    // without a reply; the channel stays open.
                    Err(e) => debug!(%addr, error = %e, "discarding undecodable frame"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    continue;
                }
                Err(_) => break,
            }
        });

        Ok(Channel {
            addr,
            tx: outgoing_tx,
            rx: incoming_rx,
            alive: true,
        })
    }

    /// Send a message on this channel. Best-effort: a closed channel drops
    /// the message silently.
    pub fn send(&self, msg: &ServerMessage) {
        self.send_raw(msg.to_bytes());
    }

    /// Send pre-framed bytes, avoiding re-serialization during broadcasts
    pub fn send_raw(&self, bytes: Vec<u8>) {
        if self.tx.send(bytes).is_err() {
            debug!(addr = %self.addr, "dropping send to closed channel");
        }
    }

    /// Try to receive one decoded message (non-blocking)
    pub fn try_recv(&mut self) -> Option<ClientMessage> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// Receive all pending messages
    pub fn recv_all(&mut self) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = self.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Check if the channel is still alive
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn test_channel_receives_decoded_messages() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let bytes = ClientMessage::StartGame.to_bytes();
            protocol::write_frame(&mut stream, &bytes).unwrap();
            thread::sleep(Duration::from_millis(200));
        });

        let (stream, _) = listener.accept().unwrap();
        let mut channel = Channel::new(stream).unwrap();

        thread::sleep(Duration::from_millis(200));
        let messages = channel.recv_all();
        assert!(messages.contains(&ClientMessage::StartGame));

        handle.join().unwrap();
    }

    #[test]
    fn test_channel_skips_undecodable_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            // A well-framed payload that is not a known message
            let junk = br#"{"type":"warp_drive"}"#;
            let mut framed = (junk.len() as u32).to_be_bytes().to_vec();
            framed.extend_from_slice(junk);
            stream.write_all(&framed).unwrap();
            // Followed by a valid one
            protocol::write_frame(&mut stream, &ClientMessage::LeaveRoom.to_bytes()).unwrap();
            thread::sleep(Duration::from_millis(200));
        });

        let (stream, _) = listener.accept().unwrap();
        let mut channel = Channel::new(stream).unwrap();

        thread::sleep(Duration::from_millis(200));
        let messages = channel.recv_all();
        assert_eq!(messages, vec![ClientMessage::LeaveRoom]);
        assert!(channel.is_alive());

        handle.join().unwrap();
    }

    #[test]
    fn test_send_to_dead_channel_is_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let channel = Channel::new(stream).unwrap();

        drop(client);
        thread::sleep(Duration::from_millis(300));

        // Must not panic or error even though the peer is gone
        channel.send(&ServerMessage::LeftRoom);
        channel.send(&ServerMessage::LeftRoom);
    }
}
