//! The live peer registry.
//!
//! One `parking_lot::Mutex<HashMap<..>>` guards the whole map; every public
//! method takes and releases the lock within itself, so no caller can hold
//! it across an `.await` or a socket write. `snapshot` is the only way to
//! iterate — it copies out from under the lock, which is what keeps
//! broadcast's "snapshot then send" split correct (a send outside the lock
//! can never race a concurrent insert/remove because it isn't looking at
//! the map anymore, it's looking at its own copy).

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::RegistryError;
use crate::id::PeerId;
use crate::protocol::{OutboundMessage, PeerInfo};

/// The registry's view of a peer: exactly what routing needs, never the
/// full session-owned record. The session keeps everything else (socket
/// ownership, decode buffers, per-session timers) to itself.
struct Entry {
    name: String,
    outbound: mpsc::Sender<OutboundMessage>,
}

#[derive(Default)]
pub struct Registry {
    peers: Mutex<HashMap<PeerId, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly-handshaked peer. Fails if `id` is already live —
    /// the caller (the id generator's retry loop) is expected never to hit
    /// this in practice, but the registry enforces I2 itself rather than
    /// trusting the caller.
    pub fn insert(
        &self,
        id: PeerId,
        name: String,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> Result<(), RegistryError> {
        let mut peers = self.peers.lock();
        if peers.contains_key(&id) {
            return Err(RegistryError::IdCollision);
        }
        peers.insert(id, Entry { name, outbound });
        Ok(())
    }

    /// Remove a peer. Returns whether it was actually present — this is
    /// the idempotency guard teardown depends on (§4.4): only the caller
    /// that gets `true` back may proceed to broadcast `peer-disconnected`.
    pub fn remove(&self, id: &str) -> bool {
        self.peers.lock().remove(id).is_some()
    }

    /// Whether `id` currently names a live peer.
    pub fn contains(&self, id: &str) -> bool {
        self.peers.lock().contains_key(id)
    }

    /// Update a peer's display name. Fails if the peer is no longer live
    /// (§7: "rename on absent id — shouldn't happen from a live session;
    /// ignored" — the caller treats `NotFound` as a no-op, not an error
    /// worth surfacing to anyone).
    pub fn rename(&self, id: &str, new_name: String) -> Result<(), RegistryError> {
        let mut peers = self.peers.lock();
        match peers.get_mut(id) {
            Some(entry) => {
                entry.name = new_name;
                Ok(())
            }
            None => Err(RegistryError::NotFound),
        }
    }

    /// An independent snapshot of every live peer's `{id, name}`, optionally
    /// excluding one id. Safe to iterate with no further locking (I3).
    pub fn snapshot(&self, except: Option<&str>) -> Vec<PeerInfo> {
        self.peers
            .lock()
            .iter()
            .filter(|(id, _)| except != Some(id.as_str()))
            .map(|(id, entry)| PeerInfo { id: id.clone(), name: entry.name.clone() })
            .collect()
    }

    /// Number of live peers (used by `/healthz`, not part of the peer
    /// protocol).
    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the current name and outbound sender for a peer, if live.
    /// Used by the router; never exposes the map itself.
    pub(crate) fn sender_for(&self, id: &str) -> Option<(String, mpsc::Sender<OutboundMessage>)> {
        self.peers
            .lock()
            .get(id)
            .map(|e| (e.name.clone(), e.outbound.clone()))
    }

    /// Outbound senders for every live peer except `except`, paired with
    /// id — used only by broadcast, which must send outside the lock.
    pub(crate) fn senders_except(
        &self,
        except: Option<&str>,
    ) -> Vec<(PeerId, mpsc::Sender<OutboundMessage>)> {
        self.peers
            .lock()
            .iter()
            .filter(|(id, _)| except != Some(id.as_str()))
            .map(|(id, entry)| (id.clone(), entry.outbound.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> mpsc::Sender<OutboundMessage> {
        mpsc::channel(8).0
    }

    #[test]
    fn insert_then_contains() {
        let reg = Registry::new();
        reg.insert("p1".into(), "Alice".into(), channel()).unwrap();
        assert!(reg.contains("p1"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn insert_rejects_id_collision() {
        let reg = Registry::new();
        reg.insert("p1".into(), "Alice".into(), channel()).unwrap();
        let err = reg.insert("p1".into(), "Eve".into(), channel()).unwrap_err();
        assert_eq!(err, RegistryError::IdCollision);
    }

    #[test]
    fn remove_is_idempotent_signal() {
        let reg = Registry::new();
        reg.insert("p1".into(), "Alice".into(), channel()).unwrap();
        assert!(reg.remove("p1"));
        assert!(!reg.remove("p1"));
    }

    #[test]
    fn rename_updates_snapshot() {
        let reg = Registry::new();
        reg.insert("p1".into(), "Alice".into(), channel()).unwrap();
        reg.rename("p1", "Alicia".into()).unwrap();
        let snap = reg.snapshot(None);
        assert_eq!(snap[0].name, "Alicia");
    }

    #[test]
    fn rename_absent_id_is_not_found() {
        let reg = Registry::new();
        let err = reg.rename("nope", "X".into()).unwrap_err();
        assert_eq!(err, RegistryError::NotFound);
    }

    #[test]
    fn snapshot_excludes_requested_id() {
        let reg = Registry::new();
        reg.insert("p1".into(), "Alice".into(), channel()).unwrap();
        reg.insert("p2".into(), "Bob".into(), channel()).unwrap();
        let snap = reg.snapshot(Some("p1"));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, "p2");
    }

    #[test]
    fn snapshot_has_no_duplicates_and_no_partial_entries() {
        let reg = Registry::new();
        for i in 0..50 {
            reg.insert(format!("p{i}"), format!("n{i}"), channel()).unwrap();
        }
        let snap = reg.snapshot(None);
        let ids: std::collections::HashSet<_> = snap.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn concurrent_join_leave_keeps_registry_consistent() {
        use std::sync::Arc;
        let reg = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let reg = reg.clone();
            handles.push(std::thread::spawn(move || {
                let id = format!("p{i}");
                reg.insert(id.clone(), format!("n{i}"), channel()).unwrap();
                let snap = reg.snapshot(None);
                assert!(snap.iter().filter(|p| p.id == id).count() <= 1);
                reg.remove(&id);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 0);
    }
}
