#![allow(dead_code)]
//! Connection registry: one client record per open channel
//!
//! Ids are handed out from a monotonic counter and never reused, even
//! after a disconnect.

use crate::game::sanitize_name;
use rand::prelude::*;
use std::collections::HashMap;
use std::net::SocketAddr;

/// One connected client. The room, if any, is referenced by code only.
#[derive(Debug, Clone)]
pub struct Client {
    /// Process-unique, monotonically assigned
    pub id: u64,
    /// Display name, ≤ 24 chars, generated when the client never set one
    pub name: String,
    /// Code of the current room, if any
    pub room_code: Option<String>,
    /// Opaque handle of this client's channel
    pub addr: SocketAddr,
}

/// Owns every connected client, keyed by channel handle
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<SocketAddr, Client>,
    next_id: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened channel, assigning the next unused id
    pub fn register(&mut self, addr: SocketAddr) -> &Client {
        self.next_id += 1;
        let client = Client {
            id: self.next_id,
            name: generate_player_name(),
            room_code: None,
            addr,
        };
        self.clients.entry(addr).or_insert(client)
    }

    /// Remove and return the client for a closed channel
    pub fn unregister(&mut self, addr: SocketAddr) -> Option<Client> {
        self.clients.remove(&addr)
    }

    pub fn lookup(&self, addr: SocketAddr) -> Option<&Client> {
        self.clients.get(&addr)
    }

    pub fn lookup_mut(&mut self, addr: SocketAddr) -> Option<&mut Client> {
        self.clients.get_mut(&addr)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Apply a requested display name, falling back to a fresh generated
    /// label when it sanitizes to nothing. Returns the name now in effect.
    pub fn rename(&mut self, addr: SocketAddr, requested: &str) -> Option<String> {
        let client = self.clients.get_mut(&addr)?;
        client.name = sanitize_name(requested).unwrap_or_else(generate_player_name);
        Some(client.name.clone())
    }
}

/// Generate a default display name
fn generate_player_name() -> String {
    const ADJECTIVES: &[&str] = &[
        "Swift", "Bold", "Wild", "Calm", "Keen", "Warm", "Quick", "Merry",
    ];
    const ANIMALS: &[&str] = &[
        "Otter", "Fox", "Crane", "Lynx", "Mole", "Wren", "Hare", "Newt",
    ];

    let mut rng = rand::rng();
    let adj = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let animal = ANIMALS[rng.random_range(0..ANIMALS.len())];
    format!("{}{}", adj, animal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MAX_NAME_LEN;

    fn test_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut registry = ConnectionRegistry::new();
        let a = registry.register(test_addr(7001)).id;
        let b = registry.register(test_addr(7002)).id;
        assert!(b > a);

        registry.unregister(test_addr(7001));
        let c = registry.register(test_addr(7003)).id;
        assert!(c > b);
    }

    #[test]
    fn test_register_assigns_generated_name() {
        let mut registry = ConnectionRegistry::new();
        let client = registry.register(test_addr(7001));
        assert!(!client.name.is_empty());
        assert!(client.name.len() <= MAX_NAME_LEN);
        assert!(client.room_code.is_none());
    }

    #[test]
    fn test_lookup_and_unregister() {
        let mut registry = ConnectionRegistry::new();
        let addr = test_addr(7001);
        let id = registry.register(addr).id;

        assert_eq!(registry.lookup(addr).unwrap().id, id);
        let removed = registry.unregister(addr).unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.lookup(addr).is_none());
        assert_eq!(registry.client_count(), 0);
    }

    #[test]
    fn test_rename_trims_and_caps() {
        let mut registry = ConnectionRegistry::new();
        let addr = test_addr(7001);
        registry.register(addr);

        let name = registry.rename(addr, "  Alice  ").unwrap();
        assert_eq!(name, "Alice");

        let long = "x".repeat(60);
        let name = registry.rename(addr, &long).unwrap();
        assert_eq!(name.len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_rename_empty_falls_back_to_generated() {
        let mut registry = ConnectionRegistry::new();
        let addr = test_addr(7001);
        registry.register(addr);

        let name = registry.rename(addr, "   ").unwrap();
        assert!(!name.is_empty());
    }

    #[test]
    fn test_generated_names_fit_limit() {
        for _ in 0..50 {
            let name = generate_player_name();
            assert!(name.len() <= MAX_NAME_LEN);
        }
    }
}
