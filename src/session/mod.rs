//! Session coordination: message dispatch, preconditions, broadcasts
//!
//! The [`Coordinator`] owns the connection registry and the room
//! directory and is the only place game state changes. It is driven one
//! event at a time by the dispatch loop, so no handler ever observes a
//! half-applied mutation. Outbound traffic goes through a [`MessageSink`]
//! so the whole core runs in tests without a live channel layer.
//!
//! Error replies follow a deliberate asymmetry: validation and
//! authorization failures answer the requester with an `error` event,
//! while wrong-status requests and malformed frames are dropped silently.

pub mod registry;

use crate::game::resolver::{resolve_round, RoundOutcome};
use crate::game::sanitize_word;
use crate::network::protocol::{ClientMessage, RoomStatus, ServerMessage};
use crate::room::{Departure, GameError, RoomDirectory, MIN_PLAYERS_TO_START};
use registry::ConnectionRegistry;
use std::net::SocketAddr;
use tracing::{debug, info};

/// Outbound send target. Implemented by the network server and by an
/// in-memory recorder in tests. Sends are best-effort everywhere.
pub trait MessageSink {
    fn send(&mut self, to: SocketAddr, msg: &ServerMessage);

    fn broadcast(&mut self, to: &[SocketAddr], msg: &ServerMessage) {
        for addr in to {
            self.send(*addr, msg);
        }
    }
}

/// Routes inbound messages to the registry, directory, and resolver
#[derive(Debug, Default)]
pub struct Coordinator {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel opened: register the client and greet it with its id
    pub fn handle_open<S: MessageSink>(&mut self, addr: SocketAddr, sink: &mut S) {
        let client_id = self.registry.register(addr).id;
        info!(client_id, %addr, "client connected");
        sink.send(addr, &ServerMessage::Welcome { client_id });
    }

    /// A channel closed: cascade exactly one room-membership removal
    pub fn handle_close<S: MessageSink>(&mut self, addr: SocketAddr, sink: &mut S) {
        let Some(mut client) = self.registry.unregister(addr) else {
            return;
        };
        info!(client_id = client.id, %addr, "client disconnected");
        if let Departure::Left { code, .. } = self.rooms.remove_client(&mut client) {
            self.broadcast_update(&code, sink);
        }
    }

    /// Dispatch one inbound message. Handler errors become an `error`
    /// reply to the sender; nothing here is fatal.
    pub fn handle_message<S: MessageSink>(
        &mut self,
        addr: SocketAddr,
        message: ClientMessage,
        sink: &mut S,
    ) {
        debug!(%addr, ?message, "dispatching");
        let result = match message {
            ClientMessage::SetName { name } => {
                self.set_name(addr, &name, sink);
                Ok(())
            }
            ClientMessage::CreateRoom { player_count } => {
                self.create_room(addr, player_count, sink)
            }
            ClientMessage::JoinRoom { room_code } => self.join_room(addr, &room_code, sink),
            ClientMessage::StartGame => self.start_game(addr, sink),
            ClientMessage::LockWord { word } => {
                self.lock_word(addr, &word, sink);
                Ok(())
            }
            ClientMessage::PlayAgain => self.play_again(addr, sink),
            ClientMessage::LeaveRoom => {
                self.leave_room(addr, sink);
                Ok(())
            }
        };

        if let Err(err) = result {
            sink.send(addr, &ServerMessage::Error { message: err.to_string() });
        }
    }

    fn set_name<S: MessageSink>(&mut self, addr: SocketAddr, requested: &str, sink: &mut S) {
        let Some(new_name) = self.registry.rename(addr, requested) else {
            return;
        };
        let Some(client) = self.registry.lookup(addr) else {
            return;
        };
        let id = client.id;
        let Some(code) = client.room_code.clone() else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return;
        };
        if let Some(player) = room.player_mut(id) {
            player.name = new_name;
        }
        let msg = ServerMessage::RoomUpdate { room: room.snapshot() };
        sink.broadcast(&room.addrs(), &msg);
    }

    fn create_room<S: MessageSink>(
        &mut self,
        addr: SocketAddr,
        player_count: u8,
        sink: &mut S,
    ) -> Result<(), GameError> {
        let Some(client) = self.registry.lookup_mut(addr) else {
            return Ok(());
        };
        let code = self.rooms.create_room(client, player_count)?;
        let you_id = client.id;

        let Some(room) = self.rooms.get(&code) else {
            return Ok(());
        };
        sink.send(
            addr,
            &ServerMessage::RoomCreated {
                room: room.snapshot(),
                room_code: code,
                you_id,
            },
        );
        Ok(())
    }

    fn join_room<S: MessageSink>(
        &mut self,
        addr: SocketAddr,
        code: &str,
        sink: &mut S,
    ) -> Result<(), GameError> {
        let Some(client) = self.registry.lookup_mut(addr) else {
            return Ok(());
        };
        let added = self.rooms.join_room(client, code)?;
        let you_id = client.id;
        let Some(code) = client.room_code.clone() else {
            return Ok(());
        };

        let Some(room) = self.rooms.get(&code) else {
            return Ok(());
        };
        let snapshot = room.snapshot();
        sink.send(
            addr,
            &ServerMessage::JoinedRoom {
                room: snapshot.clone(),
                room_code: code,
                you_id,
            },
        );
        // A repeated join of the same room changes nothing, so nothing is
        // broadcast for it.
        if added {
            sink.broadcast(&room.addrs(), &ServerMessage::RoomUpdate { room: snapshot });
        }
        Ok(())
    }

    fn start_game<S: MessageSink>(
        &mut self,
        addr: SocketAddr,
        sink: &mut S,
    ) -> Result<(), GameError> {
        let Some(client) = self.registry.lookup(addr) else {
            return Ok(());
        };
        let id = client.id;
        let Some(code) = client.room_code.clone() else {
            return Ok(());
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Ok(());
        };

        if room.host_id != id {
            return Err(GameError::NotHost);
        }
        if room.status != RoomStatus::Lobby {
            return Ok(());
        }
        if room.players.len() < MIN_PLAYERS_TO_START {
            return Err(GameError::NotEnoughPlayers);
        }

        room.reset_round();
        info!(%code, players = room.players.len(), "game started");
        let msg = ServerMessage::StartNextRound { room: room.snapshot() };
        sink.broadcast(&room.addrs(), &msg);
        Ok(())
    }

    fn lock_word<S: MessageSink>(&mut self, addr: SocketAddr, raw: &str, sink: &mut S) {
        let Some(client) = self.registry.lookup(addr) else {
            return;
        };
        let id = client.id;
        let Some(code) = client.room_code.clone() else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return;
        };
        if room.status != RoomStatus::Playing {
            return;
        }
        let Some(word) = sanitize_word(raw) else {
            return;
        };
        let Some(player) = room.player_mut(id) else {
            return;
        };
        player.locked_word = Some(word);

        if room.all_locked() {
            let round = room.round;
            let outcome = resolve_round(room);
            let msg = match outcome {
                RoundOutcome::Match { word } => {
                    info!(%code, round, %word, "round matched");
                    ServerMessage::RoundResult {
                        matched: true,
                        word: Some(word),
                        words: None,
                        room: room.snapshot(),
                    }
                }
                RoundOutcome::Mismatch { words } => {
                    debug!(%code, round, "round mismatched");
                    ServerMessage::RoundResult {
                        matched: false,
                        word: None,
                        words: Some(words),
                        room: room.snapshot(),
                    }
                }
            };
            sink.broadcast(&room.addrs(), &msg);
        } else {
            let msg = ServerMessage::RoomUpdate { room: room.snapshot() };
            sink.broadcast(&room.addrs(), &msg);
        }
    }

    fn play_again<S: MessageSink>(
        &mut self,
        addr: SocketAddr,
        sink: &mut S,
    ) -> Result<(), GameError> {
        let Some(client) = self.registry.lookup(addr) else {
            return Ok(());
        };
        let id = client.id;
        let Some(code) = client.room_code.clone() else {
            return Ok(());
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Ok(());
        };

        if room.host_id != id {
            return Err(GameError::NotHost);
        }
        // Only a finished game can be restarted; anywhere else this is a
        // silent no-op, like start_game outside the lobby.
        if room.status != RoomStatus::Finished {
            return Ok(());
        }

        room.reset_round();
        info!(%code, "game restarted");
        let msg = ServerMessage::StartNextRound { room: room.snapshot() };
        sink.broadcast(&room.addrs(), &msg);
        Ok(())
    }

    fn leave_room<S: MessageSink>(&mut self, addr: SocketAddr, sink: &mut S) {
        let departure = match self.registry.lookup_mut(addr) {
            Some(client) => self.rooms.remove_client(client),
            None => Departure::NotInRoom,
        };
        // Always acknowledged, even without a room to leave
        sink.send(addr, &ServerMessage::LeftRoom);
        if let Departure::Left { code, .. } = departure {
            self.broadcast_update(&code, sink);
        }
    }

    fn broadcast_update<S: MessageSink>(&mut self, code: &str, sink: &mut S) {
        if let Some(room) = self.rooms.get(code) {
            let msg = ServerMessage::RoomUpdate { room: room.snapshot() };
            sink.broadcast(&room.addrs(), &msg);
        }
    }

    #[cfg(test)]
    pub(crate) fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }
}
