// Session-scoped registry: slot and connection maps, session metadata and
// the deep-copy snapshot handed to exporters. Rebuilt in full at every
// session start; never shared with exporters while live.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::ChatLine;
use crate::participant::ParticipantRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    NoSession,
    Practice,
    Qualifying,
    Race,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::NoSession => "no session",
            SessionPhase::Practice => "practice",
            SessionPhase::Qualifying => "qualifying",
            SessionPhase::Race => "race",
        }
    }

    /// Practice sessions are never exported.
    pub fn exportable(&self) -> bool {
        matches!(self, SessionPhase::Qualifying | SessionPhase::Race)
    }
}

/// Session-level fields, copy-constructed into every snapshot so that
/// exporters never observe the next session's mutations.
#[derive(Clone, Debug, Serialize)]
pub struct SessionMetadata {
    pub phase: SessionPhase,
    pub track: String,
    pub weather: u8,
    pub wind: u8,
    pub race_laps: u32,
    pub qualify_minutes: u32,
    pub max_sectors: usize,
    /// Highest split index observed on the wire, for report columns.
    pub splits_seen: usize,
    pub lap_counter: u32,
    pub relay_session: bool,
    pub chat: Vec<ChatLine>,
}

impl SessionMetadata {
    fn empty(max_sectors: usize) -> Self {
        Self {
            phase: SessionPhase::NoSession,
            track: String::new(),
            weather: 0,
            wind: 0,
            race_laps: 0,
            qualify_minutes: 0,
            max_sectors,
            splits_seen: 0,
            lap_counter: 0,
            relay_session: false,
            chat: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionInfo {
    pub account_name: String,
    pub display_name: String,
}

/// Immutable copy of a finished session, safe to hand to a concurrent
/// export task. Participants are in arrival order, which is what makes
/// exact ranking ties stable.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub meta: SessionMetadata,
    pub participants: Vec<ParticipantRecord>,
}

pub struct SessionRegistry {
    participants: HashMap<u8, ParticipantRecord>,
    arrival: Vec<u8>,
    slot_connections: HashMap<u8, u8>,
    connections: HashMap<u8, ConnectionInfo>,
    pub meta: SessionMetadata,
}

impl SessionRegistry {
    pub fn new(max_sectors: usize) -> Self {
        Self {
            participants: HashMap::new(),
            arrival: Vec::new(),
            slot_connections: HashMap::new(),
            connections: HashMap::new(),
            meta: SessionMetadata::empty(max_sectors),
        }
    }

    /// Clears everything session-scoped. Connection identities survive:
    /// clients stay connected across session changes.
    pub fn reset(&mut self, phase: SessionPhase) {
        let max_sectors = self.meta.max_sectors;
        self.participants.clear();
        self.arrival.clear();
        self.slot_connections.clear();
        self.meta = SessionMetadata::empty(max_sectors);
        self.meta.phase = phase;
    }

    pub fn max_sectors(&self) -> usize {
        self.meta.max_sectors
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn contains_slot(&self, slot: u8) -> bool {
        self.participants.contains_key(&slot)
    }

    pub fn get(&self, slot: u8) -> Option<&ParticipantRecord> {
        self.participants.get(&slot)
    }

    pub fn get_mut(&mut self, slot: u8) -> Option<&mut ParticipantRecord> {
        self.participants.get_mut(&slot)
    }

    pub fn insert(&mut self, record: ParticipantRecord) {
        let slot = record.slot_id;
        if self.participants.insert(slot, record).is_none() {
            self.arrival.push(slot);
        }
    }

    /// Moves an existing record to a new slot id, preserving its arrival
    /// position and lap history. This is the reconnect rule: the car
    /// reappears under a fresh slot but is the same participant.
    pub fn relocate(&mut self, old_slot: u8, new_slot: u8) -> Option<&mut ParticipantRecord> {
        let mut record = self.participants.remove(&old_slot)?;
        record.slot_id = new_slot;
        if let Some(position) = self.arrival.iter().position(|&slot| slot == old_slot) {
            self.arrival[position] = new_slot;
        }
        if let Some(connection) = self.slot_connections.remove(&old_slot) {
            self.slot_connections.insert(new_slot, connection);
        }
        self.participants.insert(new_slot, record);
        self.participants.get_mut(&new_slot)
    }

    pub fn remove(&mut self, slot: u8) -> Option<ParticipantRecord> {
        let record = self.participants.remove(&slot)?;
        self.arrival.retain(|&entry| entry != slot);
        self.slot_connections.remove(&slot);
        Some(record)
    }

    /// Slots in arrival order; the iteration order every ranking tie
    /// falls back to.
    pub fn slots_in_arrival_order(&self) -> &[u8] {
        &self.arrival
    }

    pub fn bind_connection(&mut self, slot: u8, connection: u8) {
        self.slot_connections.insert(slot, connection);
    }

    pub fn slot_of_connection(&self, connection: u8) -> Option<u8> {
        self.slot_connections
            .iter()
            .find(|(_, &conn)| conn == connection)
            .map(|(&slot, _)| slot)
    }

    pub fn connection_joined(&mut self, connection: u8, account_name: String, display_name: String) {
        self.connections.insert(
            connection,
            ConnectionInfo {
                account_name,
                display_name,
            },
        );
    }

    pub fn connection_left(&mut self, connection: u8) {
        self.connections.remove(&connection);
    }

    pub fn connection(&self, connection: u8) -> Option<&ConnectionInfo> {
        self.connections.get(&connection)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            meta: self.meta.clone(),
            participants: self
                .arrival
                .iter()
                .filter_map(|slot| self.participants.get(slot))
                .cloned()
                .collect(),
        }
    }
}

/// Strategy for reconciling a newly arrived car with an already-tracked
/// participant. The state machine prefers explicit take-over events; this
/// heuristic is the best-effort fallback for reconnects.
pub trait IdentityResolver {
    /// Given the arrival's declared display name and the currently
    /// tracked records in arrival order, returns the slot of a match.
    fn resolve(&self, display_name: &str, candidates: &[(u8, &ParticipantRecord)]) -> Option<u8>;
}

/// Display-name equality, most recent arrival wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameMatchResolver;

impl IdentityResolver for NameMatchResolver {
    fn resolve(&self, display_name: &str, candidates: &[(u8, &ParticipantRecord)]) -> Option<u8> {
        candidates
            .iter()
            .rev()
            .find(|(_, record)| record.display_name == display_name)
            .map(|(slot, _)| *slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[(u8, &str)]) -> SessionRegistry {
        let mut registry = SessionRegistry::new(4);
        registry.reset(SessionPhase::Race);
        for &(slot, name) in names {
            registry.insert(ParticipantRecord::new(slot, slot, name.to_string(), 4));
        }
        registry
    }

    #[test]
    fn relocate_preserves_history_and_arrival_position() {
        let mut registry = registry_with(&[(1, "A"), (2, "B")]);
        registry.get_mut(1).unwrap().record_lap(9000, 0, 1).unwrap();

        registry.relocate(1, 7).unwrap();
        assert!(!registry.contains_slot(1));
        let moved = registry.get(7).unwrap();
        assert_eq!(moved.slot_id, 7);
        assert_eq!(moved.laps.len(), 1);
        assert_eq!(registry.slots_in_arrival_order(), &[7, 2]);
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let mut registry = registry_with(&[(1, "A")]);
        let snapshot = registry.snapshot();
        registry.get_mut(1).unwrap().record_lap(9000, 0, 1).unwrap();
        registry.meta.lap_counter = 1;
        assert!(snapshot.participants[0].laps.is_empty());
        assert_eq!(snapshot.meta.lap_counter, 0);
    }

    #[test]
    fn name_resolver_prefers_most_recent() {
        let registry = registry_with(&[(1, "Ghost"), (2, "Other"), (3, "Ghost")]);
        let candidates: Vec<(u8, &ParticipantRecord)> = registry
            .slots_in_arrival_order()
            .iter()
            .map(|&slot| (slot, registry.get(slot).unwrap()))
            .collect();
        assert_eq!(NameMatchResolver.resolve("Ghost", &candidates), Some(3));
        assert_eq!(NameMatchResolver.resolve("Nobody", &candidates), None);
    }

    #[test]
    fn reset_keeps_connections() {
        let mut registry = registry_with(&[(1, "A")]);
        registry.connection_joined(9, "acct".to_string(), "A".to_string());
        registry.reset(SessionPhase::Qualifying);
        assert_eq!(registry.participant_count(), 0);
        assert_eq!(registry.meta.phase, SessionPhase::Qualifying);
        assert!(registry.connection(9).is_some());
    }
}
