#![allow(dead_code)]
//! Wire protocol message types
//!
//! Length-prefixed JSON messages over TCP: a 4-byte big-endian length
//! followed by one self-describing JSON object with a `type` tag.

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Hard cap on a single frame's payload. Anything larger is a protocol
/// violation and closes the connection.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Messages sent by a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Set or change the display name
    SetName { name: String },
    /// Create a new room with the given target player count
    CreateRoom { player_count: u8 },
    /// Join an existing room by code (case-insensitive)
    JoinRoom { room_code: String },
    /// Host starts the game from the lobby
    StartGame,
    /// Submit this round's secret word
    LockWord { word: String },
    /// Host restarts after a finished game
    PlayAgain,
    /// Leave the current room
    LeaveRoom,
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection, carrying the assigned client id
    Welcome { client_id: u64 },
    /// Reply to a successful `create_room`
    RoomCreated {
        room: RoomSnapshot,
        room_code: String,
        you_id: u64,
    },
    /// Reply to a successful `join_room` (requester only)
    JoinedRoom {
        room: RoomSnapshot,
        room_code: String,
        you_id: u64,
    },
    /// Snapshot broadcast after any membership or name change
    RoomUpdate { room: RoomSnapshot },
    /// A round is beginning (game start or restart)
    StartNextRound { room: RoomSnapshot },
    /// Every player locked a word and the round resolved
    RoundResult {
        #[serde(rename = "match")]
        matched: bool,
        /// The winning word, present on a match
        #[serde(skip_serializing_if = "Option::is_none")]
        word: Option<String>,
        /// Every player's raw submission, present on a mismatch
        #[serde(skip_serializing_if = "Option::is_none")]
        words: Option<Vec<PlayerWord>>,
        room: RoomSnapshot,
    },
    /// Acknowledgement of `leave_room` (requester only)
    LeftRoom,
    /// A validation or authorization failure, sent to the requester only
    Error { message: String },
}

/// Public view of a room, sent to every member after any state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: String,
    pub host_id: u64,
    pub status: RoomStatus,
    pub round: u32,
    pub target_player_count: u8,
    pub players: Vec<PlayerSnapshot>,
}

/// Public view of a player inside a snapshot. The pending word itself is
/// never exposed, only whether one is locked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: u64,
    pub name: String,
    pub locked: bool,
    pub last_word: Option<String>,
}

/// Lifecycle status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Lobby,
    Playing,
    Finished,
}

/// A player's revealed submission in a mismatched round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWord {
    pub id: u64,
    pub name: String,
    pub word: String,
}

impl ClientMessage {
    /// Serialize to a length-prefixed frame
    pub fn to_bytes(&self) -> Vec<u8> {
        frame(&serde_json::to_vec(self).unwrap_or_default())
    }

    /// Deserialize from a length-prefixed frame, returning the message and
    /// the number of bytes consumed
    pub fn from_bytes(bytes: &[u8]) -> io::Result<(Self, usize)> {
        let (payload, consumed) = unframe(bytes)?;
        let msg = Self::decode(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok((msg, consumed))
    }

    /// Parse a frame payload. Unknown `type` tags and malformed bodies fail
    /// here; callers discard such frames silently.
    pub fn decode(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}

impl ServerMessage {
    /// Serialize to a length-prefixed frame. Broadcasts serialize once and
    /// reuse the bytes for every recipient.
    pub fn to_bytes(&self) -> Vec<u8> {
        frame(&serde_json::to_vec(self).unwrap_or_default())
    }

    /// Deserialize from a length-prefixed frame
    pub fn from_bytes(bytes: &[u8]) -> io::Result<(Self, usize)> {
        let (payload, consumed) = unframe(bytes)?;
        let msg = serde_json::from_slice(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok((msg, consumed))
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut bytes = Vec::with_capacity(4 + payload.len());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn unframe(bytes: &[u8]) -> io::Result<(&[u8], usize)> {
    if bytes.len() < 4 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "need 4 bytes for length"));
    }
    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
    }
    if bytes.len() < 4 + len {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "incomplete frame"));
    }
    Ok((&bytes[4..4 + len], 4 + len))
}

/// Write one framed payload to a TCP stream
pub fn write_frame(stream: &mut TcpStream, bytes: &[u8]) -> io::Result<()> {
    stream.write_all(bytes)?;
    stream.flush()
}

/// Read one frame payload from a TCP stream
pub fn read_frame(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;
    Ok(body)
}
