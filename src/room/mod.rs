#![allow(dead_code)]
//! Room lifecycle: creation, membership, host succession
//!
//! The [`RoomDirectory`] owns every active room, keyed by a 5-character
//! code. A room lives exactly as long as it has players: it is created
//! with its first player already inside and deleted the instant the last
//! one leaves. Clients reference rooms by code only, never by pointer, so
//! deletion never leaves anything dangling.

use crate::network::protocol::{PlayerSnapshot, RoomSnapshot, RoomStatus};
use crate::session::registry::Client;
use rand::prelude::*;
use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{debug, info};

/// Room code alphabet. 31 symbols; visually ambiguous characters
/// (I, L, O, 0, 1) are excluded.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Room codes are always exactly this long
pub const CODE_LEN: usize = 5;

/// Smallest and largest allowed target player counts
pub const MIN_TARGET_PLAYERS: u8 = 2;
pub const MAX_TARGET_PLAYERS: u8 = 4;

/// Minimum players present for the host to start, regardless of target
pub const MIN_PLAYERS_TO_START: usize = 2;

/// A request the room layer refuses. Every variant's message is sent back
/// to the requester verbatim; none of these are fatal or broadcast.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("player count must be 2, 3, or 4")]
    InvalidPlayerCount,
    #[error("you are already in a room")]
    AlreadyInRoom,
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("only the host can do that")]
    NotHost,
    #[error("need at least 2 players to start")]
    NotEnoughPlayers,
}

/// A member of a room. `addr` is a copy of the owning client's channel
/// handle, held only for sending; the full client record stays in the
/// registry.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// This round's pending secret submission
    pub locked_word: Option<String>,
    /// Previous round's revealed submission
    pub last_word: Option<String>,
    pub addr: SocketAddr,
}

/// One active game session
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub host_id: u64,
    pub target_player_count: u8,
    /// Insertion order is join order; host succession walks it FIFO
    pub players: Vec<Player>,
    pub round: u32,
    pub status: RoomStatus,
}

impl Room {
    pub fn new(code: String, target_player_count: u8) -> Self {
        Self {
            code,
            host_id: 0,
            target_player_count,
            players: Vec::new(),
            round: 1,
            status: RoomStatus::Lobby,
        }
    }

    /// Add a player. Idempotent: adding an id already present is a no-op
    /// and returns false.
    pub fn add_player(&mut self, id: u64, name: String, addr: SocketAddr) -> bool {
        if self.contains(id) {
            return false;
        }
        self.players.push(Player {
            id,
            name,
            locked_word: None,
            last_word: None,
            addr,
        });
        true
    }

    /// Remove a player. When the departing player was host and others
    /// remain, the earliest-joined survivor is promoted.
    pub fn remove_player(&mut self, id: u64) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(idx);
        if self.host_id == removed.id {
            if let Some(next) = self.players.first() {
                self.host_id = next.id;
            }
        }
        Some(removed)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: u64) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.target_player_count as usize
    }

    /// True once every current player has a pending submission
    pub fn all_locked(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.locked_word.is_some())
    }

    /// Shared reset for `start_game` and `play_again`: back to round 1 in
    /// `Playing`, all word fields cleared.
    pub fn reset_round(&mut self) {
        self.status = RoomStatus::Playing;
        self.round = 1;
        for player in &mut self.players {
            player.locked_word = None;
            player.last_word = None;
        }
    }

    /// Channel handles of every member, for broadcasting
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.players.iter().map(|p| p.addr).collect()
    }

    /// The public view sent to members. Pending words appear only as a
    /// boolean `locked` flag.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host_id: self.host_id,
            status: self.status,
            round: self.round,
            target_player_count: self.target_player_count,
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    locked: p.locked_word.is_some(),
                    last_word: p.last_word.clone(),
                })
                .collect(),
        }
    }
}

/// How a departure left the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The client had no current room
    NotInRoom,
    /// The client was the last member; the room is gone
    RoomDeleted { code: String },
    /// Other members remain; `host_changed` is true when the departing
    /// player was host
    Left { code: String, host_changed: bool },
}

/// Owns all active rooms
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, Room>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Create a room with the requester as first player and host, and point
    /// the requester's client record at its code.
    pub fn create_room(
        &mut self,
        client: &mut Client,
        player_count: u8,
    ) -> Result<String, GameError> {
        if !(MIN_TARGET_PLAYERS..=MAX_TARGET_PLAYERS).contains(&player_count) {
            return Err(GameError::InvalidPlayerCount);
        }
        if client.room_code.is_some() {
            return Err(GameError::AlreadyInRoom);
        }

        let code = self.generate_code();
        let mut room = Room::new(code.clone(), player_count);
        room.add_player(client.id, client.name.clone(), client.addr);
        room.host_id = client.id;
        self.rooms.insert(code.clone(), room);
        client.room_code = Some(code.clone());

        info!(%code, player_count, host = client.id, "room created");
        Ok(code)
    }

    /// Join an existing room by code (case-insensitive). Returns true when
    /// the client was actually added; re-joining the same room is an
    /// idempotent no-op success.
    pub fn join_room(&mut self, client: &mut Client, code: &str) -> Result<bool, GameError> {
        let code = code.trim().to_uppercase();

        if let Some(current) = &client.room_code {
            if *current == code {
                return Ok(false);
            }
            return Err(GameError::AlreadyInRoom);
        }

        let room = self.rooms.get_mut(&code).ok_or(GameError::RoomNotFound)?;
        if room.is_full() {
            return Err(GameError::RoomFull);
        }

        let added = room.add_player(client.id, client.name.clone(), client.addr);
        client.room_code = Some(code.clone());
        debug!(%code, player = client.id, "player joined room");
        Ok(added)
    }

    /// Remove a client from its current room, if any, deleting the room
    /// when it empties and promoting a new host otherwise.
    pub fn remove_client(&mut self, client: &mut Client) -> Departure {
        let Some(code) = client.room_code.take() else {
            return Departure::NotInRoom;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Departure::NotInRoom;
        };

        let was_host = room.host_id == client.id;
        if room.remove_player(client.id).is_none() {
            return Departure::NotInRoom;
        }

        if room.players.is_empty() {
            self.rooms.remove(&code);
            info!(%code, "room deleted");
            return Departure::RoomDeleted { code };
        }

        debug!(%code, player = client.id, host_changed = was_host, "player left room");
        Departure::Left { code, host_changed: was_host }
    }

    /// Rejection-sample a code until it collides with no active room
    fn generate_code(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
