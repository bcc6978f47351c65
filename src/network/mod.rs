//! Networking: TCP server, per-connection channels, wire protocol
//!
//! This module provides:
//! - TCP server for hosting games (default port 56733 with auto-increment)
//! - One reader/writer thread pair per connection, bridged over mpsc so all
//!   game state stays on the single dispatch thread
//! - Length-prefixed JSON protocol with a `type`-tagged message set

pub mod channel;
pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage};
pub use server::{Server, ServerEvent, DEFAULT_PORT};
