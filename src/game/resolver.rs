//! Round resolution for word-matching rounds
//!
//! Runs only once every player in a room has locked a word. Comparison uses
//! the normalized form; everything revealed to players is the raw
//! submission. Resolution always clears every pending word and promotes it
//! to the player's `last_word` in the same step.

use super::normalize;
use crate::network::protocol::{PlayerWord, RoomStatus};
use crate::room::Room;

/// Outcome of resolving a fully-locked round
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// Every normalized word was identical; the room is finished.
    /// Carries the raw submission of one of the players.
    Match { word: String },
    /// At least one word differed; the room stays in play on the next
    /// round. Carries every player's raw submission for the reveal.
    Mismatch { words: Vec<PlayerWord> },
}

/// Resolve the current round. Callers must ensure every player has a
/// locked word; a missing one resolves as a mismatch with an empty reveal
/// entry rather than panicking.
pub fn resolve_round(room: &mut Room) -> RoundOutcome {
    let revealed: Vec<PlayerWord> = room
        .players
        .iter()
        .map(|p| PlayerWord {
            id: p.id,
            name: p.name.clone(),
            word: p.locked_word.clone().unwrap_or_default(),
        })
        .collect();

    let matched = revealed
        .windows(2)
        .all(|pair| normalize(&pair[0].word) == normalize(&pair[1].word))
        && revealed.iter().all(|p| !p.word.is_empty());

    // Promote pending words to revealed words atomically with the
    // status/round transition.
    for player in &mut room.players {
        player.last_word = player.locked_word.take();
    }

    if matched {
        room.status = RoomStatus::Finished;
        let word = revealed
            .first()
            .map(|p| p.word.clone())
            .unwrap_or_default();
        RoundOutcome::Match { word }
    } else {
        room.round += 1;
        RoundOutcome::Mismatch { words: revealed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Room;
    use std::net::SocketAddr;

    fn test_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    fn playing_room(words: &[(&str, &str)]) -> Room {
        let mut room = Room::new("AB3DE".to_string(), 4);
        for (i, (name, word)) in words.iter().enumerate() {
            let id = i as u64 + 1;
            room.add_player(id, name.to_string(), test_addr(5000 + i as u16));
            room.player_mut(id).unwrap().locked_word = Some(word.to_string());
        }
        room.host_id = 1;
        room.status = RoomStatus::Playing;
        room
    }

    #[test]
    fn test_identical_words_match() {
        let mut room = playing_room(&[("Alice", "apple"), ("Bob", "apple")]);
        let outcome = resolve_round(&mut room);
        assert_eq!(outcome, RoundOutcome::Match { word: "apple".to_string() });
        assert_eq!(room.status, RoomStatus::Finished);
        assert_eq!(room.round, 1);
    }

    #[test]
    fn test_match_is_case_and_whitespace_insensitive() {
        let mut room = playing_room(&[("Alice", "Apple"), ("Bob", " apple ")]);
        let outcome = resolve_round(&mut room);
        // The announced word is one player's raw submission
        match outcome {
            RoundOutcome::Match { word } => {
                assert!(word == "Apple" || word == " apple ");
            }
            other => panic!("expected a match, got {:?}", other),
        }
        assert_eq!(room.status, RoomStatus::Finished);
    }

    #[test]
    fn test_mismatch_increments_round_and_stays_playing() {
        let mut room = playing_room(&[("Alice", "Cat"), ("Bob", "Dog")]);
        let outcome = resolve_round(&mut room);
        match outcome {
            RoundOutcome::Mismatch { words } => {
                assert_eq!(words.len(), 2);
                assert_eq!(words[0].word, "Cat");
                assert_eq!(words[1].word, "Dog");
            }
            other => panic!("expected a mismatch, got {:?}", other),
        }
        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.round, 2);
    }

    #[test]
    fn test_three_way_mismatch_with_partial_agreement() {
        let mut room = playing_room(&[("A", "sun"), ("B", "sun"), ("C", "moon")]);
        let outcome = resolve_round(&mut room);
        assert!(matches!(outcome, RoundOutcome::Mismatch { .. }));
        assert_eq!(room.round, 2);
    }

    #[test]
    fn test_resolution_promotes_and_clears_words() {
        let mut room = playing_room(&[("Alice", "Cat"), ("Bob", "Dog")]);
        resolve_round(&mut room);
        for player in &room.players {
            assert!(player.locked_word.is_none());
        }
        assert_eq!(room.players[0].last_word.as_deref(), Some("Cat"));
        assert_eq!(room.players[1].last_word.as_deref(), Some("Dog"));
    }

    #[test]
    fn test_match_promotes_raw_words_verbatim() {
        let mut room = playing_room(&[("Alice", "Apple"), ("Bob", " apple ")]);
        resolve_round(&mut room);
        assert_eq!(room.players[0].last_word.as_deref(), Some("Apple"));
        assert_eq!(room.players[1].last_word.as_deref(), Some(" apple "));
    }

    #[test]
    fn test_single_player_room_matches_trivially() {
        let mut room = playing_room(&[("Solo", "echo")]);
        let outcome = resolve_round(&mut room);
        assert_eq!(outcome, RoundOutcome::Match { word: "echo".to_string() });
    }
}
