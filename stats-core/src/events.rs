// Protocol event model and the session state machine. A single caller
// drains events in arrival order; `apply` mutates the live registry and
// yields an immutable snapshot whenever an exportable session just ended.

use std::collections::HashMap;

use crate::error::StatsError;
use crate::model::{ControlFlags, FlagKind, PenaltyCode, PenaltyReason};
use crate::participant::ParticipantRecord;
use crate::registry::{
    IdentityResolver, NameMatchResolver, SessionPhase, SessionRegistry, SessionSnapshot,
};

/// Typed protocol events as delivered by the transport/decoder layer.
#[derive(Clone, Debug)]
pub enum Event {
    SessionStart {
        track: String,
        weather: u8,
        wind: u8,
        race_laps: u32,
        qualify_minutes: u32,
    },
    SessionEnd,
    /// Periodic session-state report. Any field may be absent; `ended`
    /// signals an implicit session end.
    Heartbeat {
        track: Option<String>,
        weather: Option<u8>,
        wind: Option<u8>,
        race_laps: Option<u32>,
        qualify_minutes: Option<u32>,
        ended: bool,
    },
    ConnectionNew {
        connection: u8,
        account_name: String,
        display_name: String,
    },
    ConnectionLeave {
        connection: u8,
    },
    NameChange {
        connection: u8,
        account_name: String,
        display_name: String,
    },
    NewCar {
        slot: u8,
        connection: u8,
        display_name: String,
        car: String,
        grid_position: Option<u32>,
        control_flags: ControlFlags,
    },
    TakeOver {
        slot: u8,
        connection: u8,
    },
    SplitCrossing {
        slot: u8,
        split_index: u8,
        elapsed: u32,
    },
    LapCompletion {
        slot: u8,
        lap_time: u32,
        laps_done: u32,
        pit_count: u32,
    },
    PitEntry {
        slot: u8,
        laps_done: u32,
        work: u16,
    },
    PitExit {
        slot: u8,
        stationary: u32,
    },
    SpeedSample {
        slot: u8,
        kph: f32,
    },
    PenaltyChange {
        slot: u8,
        old: PenaltyCode,
        new: PenaltyCode,
        reason: PenaltyReason,
    },
    QualifyingResult {
        slot: u8,
        total_time: u32,
        best_lap: u32,
        pit_count: u32,
        confirm_flags: u8,
        lap_count: u32,
    },
    FinalResult {
        slot: u8,
        total_time: u32,
        position: u32,
        car: String,
        confirm_flags: u8,
        pit_count: u32,
    },
    Finish {
        slot: u8,
        total_time: u32,
        confirm_flags: u8,
    },
    GridOrder {
        slots: Vec<u8>,
    },
    FlagToggle {
        slot: u8,
        flag: FlagKind,
        on: bool,
    },
    Chat {
        connection: u8,
        text: String,
    },
}

pub struct EventProcessor<R: IdentityResolver = NameMatchResolver> {
    registry: SessionRegistry,
    resolver: R,
    /// Running order at the previous timing point, for laps-led and
    /// overtake credit.
    last_order: Vec<u8>,
}

impl EventProcessor<NameMatchResolver> {
    pub fn new(max_sectors: usize) -> Self {
        Self::with_resolver(max_sectors, NameMatchResolver)
    }
}

impl<R: IdentityResolver> EventProcessor<R> {
    pub fn with_resolver(max_sectors: usize, resolver: R) -> Self {
        Self {
            registry: SessionRegistry::new(max_sectors),
            resolver,
            last_order: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn phase(&self) -> SessionPhase {
        self.registry.meta.phase
    }

    /// Applies one event. Returns a snapshot exactly when a Qualifying or
    /// Race session just ended and must be exported. A `StatsError`
    /// abandons the live session; subsequent sessions are unaffected.
    pub fn apply(&mut self, event: Event) -> Result<Option<SessionSnapshot>, StatsError> {
        match event {
            Event::SessionStart {
                track,
                weather,
                wind,
                race_laps,
                qualify_minutes,
            } => {
                let snapshot = self.finish_session();
                let phase = if race_laps > 0 {
                    SessionPhase::Race
                } else if qualify_minutes > 0 {
                    SessionPhase::Qualifying
                } else {
                    SessionPhase::Practice
                };
                self.registry.reset(phase);
                self.last_order.clear();
                let meta = &mut self.registry.meta;
                meta.track = track;
                meta.weather = weather;
                meta.wind = wind;
                meta.race_laps = race_laps;
                meta.qualify_minutes = qualify_minutes;
                Ok(snapshot)
            }
            Event::SessionEnd => Ok(self.end_session()),
            Event::Heartbeat {
                track,
                weather,
                wind,
                race_laps,
                qualify_minutes,
                ended,
            } => {
                let meta = &mut self.registry.meta;
                if let Some(track) = track {
                    meta.track = track;
                }
                if let Some(weather) = weather {
                    meta.weather = weather;
                }
                if let Some(wind) = wind {
                    meta.wind = wind;
                }
                if let Some(race_laps) = race_laps {
                    meta.race_laps = race_laps;
                }
                if let Some(qualify_minutes) = qualify_minutes {
                    meta.qualify_minutes = qualify_minutes;
                }
                if ended {
                    Ok(self.end_session())
                } else {
                    Ok(None)
                }
            }
            Event::ConnectionNew {
                connection,
                account_name,
                display_name,
            } => {
                self.registry
                    .connection_joined(connection, account_name, display_name);
                Ok(None)
            }
            Event::ConnectionLeave { connection } => {
                // The car slot stays tracked; the reconnect heuristic
                // picks the record back up if the driver returns.
                self.registry.connection_left(connection);
                Ok(None)
            }
            Event::NameChange {
                connection,
                account_name,
                display_name,
            } => {
                self.registry
                    .connection_joined(connection, account_name.clone(), display_name.clone());
                if let Some(slot) = self.registry.slot_of_connection(connection) {
                    if let Some(record) = self.registry.get_mut(slot) {
                        record.set_identity(&account_name, &display_name);
                    }
                }
                Ok(None)
            }
            Event::NewCar {
                slot,
                connection,
                display_name,
                car,
                grid_position,
                control_flags,
            } => {
                self.handle_new_car(slot, connection, display_name, car, grid_position, control_flags);
                Ok(None)
            }
            Event::TakeOver { slot, connection } => {
                self.handle_takeover(slot, connection);
                Ok(None)
            }
            Event::SplitCrossing {
                slot,
                split_index,
                elapsed,
            } => {
                if self.registry.contains_slot(slot) {
                    let seen = &mut self.registry.meta.splits_seen;
                    *seen = (*seen).max(split_index as usize);
                }
                self.guarded(slot, |record| record.record_split(split_index, elapsed))?;
                Ok(None)
            }
            Event::LapCompletion {
                slot,
                lap_time,
                laps_done,
                pit_count,
            } => {
                let Some(before) = self.registry.get(slot).map(|record| record.completed_laps())
                else {
                    return Ok(None);
                };
                self.guarded(slot, |record| {
                    record.record_lap(lap_time, pit_count, laps_done)
                })?;
                // Absorbed duplicates must not move the lap counter or
                // credit another timing point.
                let advanced = self
                    .registry
                    .get(slot)
                    .is_some_and(|record| record.completed_laps() > before);
                if advanced {
                    let counter = &mut self.registry.meta.lap_counter;
                    *counter = (*counter).max(laps_done);
                    if self.registry.meta.phase == SessionPhase::Race {
                        self.update_positions();
                    }
                }
                Ok(None)
            }
            Event::PitEntry {
                slot,
                laps_done,
                work,
            } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_pit_entry(laps_done, work);
                }
                Ok(None)
            }
            Event::PitExit { slot, stationary } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_pit_exit(stationary);
                }
                Ok(None)
            }
            Event::SpeedSample { slot, kph } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_speed(kph);
                }
                Ok(None)
            }
            Event::PenaltyChange {
                slot,
                old,
                new,
                reason,
            } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_penalty(old, new, reason);
                }
                Ok(None)
            }
            Event::QualifyingResult {
                slot,
                total_time,
                best_lap,
                pit_count,
                confirm_flags,
                lap_count,
            } => {
                self.guarded(slot, |record| {
                    record.record_qualifying_result(
                        total_time,
                        best_lap,
                        pit_count,
                        confirm_flags,
                        lap_count,
                    )
                })?;
                Ok(None)
            }
            Event::FinalResult {
                slot,
                total_time,
                position,
                car,
                confirm_flags,
                pit_count,
            } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_final_result(total_time, position, &car, confirm_flags, pit_count);
                }
                Ok(None)
            }
            Event::Finish {
                slot,
                total_time,
                confirm_flags,
            } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    record.record_finish(total_time, confirm_flags);
                }
                Ok(None)
            }
            Event::GridOrder { slots } => {
                for (index, slot) in slots.into_iter().enumerate() {
                    if let Some(record) = self.registry.get_mut(slot) {
                        record.grid_position = Some(index as u32 + 1);
                    }
                }
                Ok(None)
            }
            Event::FlagToggle { slot, flag, on } => {
                if let Some(record) = self.registry.get_mut(slot) {
                    match flag {
                        FlagKind::Yellow => record.set_yellow(on),
                        FlagKind::Blue => record.set_blue(on),
                    }
                }
                Ok(None)
            }
            Event::Chat { connection, text } => {
                let display_name = self
                    .registry
                    .connection(connection)
                    .map(|info| info.display_name.clone())
                    .unwrap_or_else(|| format!("#{}", connection));
                self.registry
                    .meta
                    .chat
                    .push(crate::model::ChatLine { display_name, text });
                Ok(None)
            }
        }
    }

    /// Export-then-reset used by explicit and implicit session ends.
    fn end_session(&mut self) -> Option<SessionSnapshot> {
        let snapshot = self.finish_session();
        self.registry.reset(SessionPhase::NoSession);
        self.last_order.clear();
        snapshot
    }

    fn finish_session(&self) -> Option<SessionSnapshot> {
        if self.registry.meta.phase.exportable() && self.registry.participant_count() > 0 {
            Some(self.registry.snapshot())
        } else {
            None
        }
    }

    fn handle_new_car(
        &mut self,
        slot: u8,
        connection: u8,
        display_name: String,
        car: String,
        grid_position: Option<u32>,
        control_flags: ControlFlags,
    ) {
        if self.registry.meta.phase == SessionPhase::NoSession {
            return;
        }

        let account_name = self
            .registry
            .connection(connection)
            .map(|info| info.account_name.clone())
            .unwrap_or_default();

        if self.registry.contains_slot(slot) {
            if let Some(record) = self.registry.get_mut(slot) {
                record.connection_id = connection;
                record.set_identity(&account_name, &display_name);
                record.car = car;
                record.control_flags = control_flags;
                if grid_position.is_some() {
                    record.grid_position = grid_position;
                }
            }
            self.registry.bind_connection(slot, connection);
            return;
        }

        // Reconnect heuristic: a car reappearing under a fresh slot keeps
        // its record, lap history and carried-over grid position.
        let candidates: Vec<(u8, &ParticipantRecord)> = self
            .registry
            .slots_in_arrival_order()
            .iter()
            .filter_map(|&entry| self.registry.get(entry).map(|record| (entry, record)))
            .collect();
        let matched = self.resolver.resolve(&display_name, &candidates);

        if let Some(old_slot) = matched {
            if let Some(record) = self.registry.relocate(old_slot, slot) {
                record.connection_id = connection;
                record.set_identity(&account_name, &display_name);
                record.car = car;
                record.control_flags = control_flags;
                if grid_position.is_some() {
                    record.grid_position = grid_position;
                }
            }
            self.registry.bind_connection(slot, connection);
            return;
        }

        let mut record =
            ParticipantRecord::new(slot, connection, display_name.clone(), self.registry.max_sectors());
        record.set_identity(&account_name, &display_name);
        record.car = car;
        record.grid_position = grid_position;
        record.control_flags = control_flags;
        self.registry.insert(record);
        self.registry.bind_connection(slot, connection);
    }

    /// Relay/driver-swap: relabel the record, keep the lap history, and
    /// drop the new driver's now-orphaned previous slot.
    fn handle_takeover(&mut self, slot: u8, connection: u8) {
        if !self.registry.contains_slot(slot) {
            return;
        }
        let Some(info) = self.registry.connection(connection) else {
            return;
        };
        let account_name = info.account_name.clone();
        let display_name = info.display_name.clone();

        if let Some(orphan) = self.registry.slot_of_connection(connection) {
            if orphan != slot {
                self.registry.remove(orphan);
                self.last_order.retain(|&entry| entry != orphan);
            }
        }

        if let Some(record) = self.registry.get_mut(slot) {
            record.record_takeover(&display_name, &account_name);
            record.connection_id = connection;
        }
        self.registry.bind_connection(slot, connection);
        self.registry.meta.relay_session = true;
    }

    fn guarded<F>(&mut self, slot: u8, op: F) -> Result<(), StatsError>
    where
        F: FnOnce(&mut ParticipantRecord) -> Result<(), StatsError>,
    {
        let Some(record) = self.registry.get_mut(slot) else {
            return Ok(());
        };
        if let Err(err) = op(record) {
            // Terminate processing for this session; the mismatch between
            // the configured sector count and the wire cannot be guessed.
            self.registry.reset(SessionPhase::NoSession);
            self.last_order.clear();
            return Err(err);
        }
        Ok(())
    }

    /// Recomputes the running order at a timing point, credits the leader
    /// with a lap led, and converts order changes into overtake counts.
    fn update_positions(&mut self) {
        let mut standings: Vec<(u8, u32, u32)> = self
            .registry
            .slots_in_arrival_order()
            .iter()
            .filter_map(|&slot| {
                self.registry
                    .get(slot)
                    .map(|record| (slot, record.completed_laps(), record.total_time))
            })
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        let order: Vec<u8> = standings.into_iter().map(|(slot, _, _)| slot).collect();

        if let Some(&leader) = order.first() {
            if let Some(record) = self.registry.get_mut(leader) {
                record.laps_led += 1;
            }
        }

        let old_index: HashMap<u8, usize> = self
            .last_order
            .iter()
            .enumerate()
            .map(|(index, &slot)| (slot, index))
            .collect();
        for (ahead_now, &slot) in order.iter().enumerate() {
            for &other in &order[ahead_now + 1..] {
                let (Some(&old_slot), Some(&old_other)) =
                    (old_index.get(&slot), old_index.get(&other))
                else {
                    continue;
                };
                if old_slot > old_other {
                    if let Some(record) = self.registry.get_mut(slot) {
                        record.overtakes_made += 1;
                    }
                    if let Some(record) = self.registry.get_mut(other) {
                        record.overtakes_lost += 1;
                    }
                }
            }
        }
        self.last_order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::confirm;

    fn race_start() -> Event {
        Event::SessionStart {
            track: "AS5".to_string(),
            weather: 1,
            wind: 0,
            race_laps: 10,
            qualify_minutes: 0,
        }
    }

    fn join(processor: &mut EventProcessor, slot: u8, name: &str) {
        processor
            .apply(Event::ConnectionNew {
                connection: slot,
                account_name: name.to_lowercase(),
                display_name: name.to_string(),
            })
            .unwrap();
        processor
            .apply(Event::NewCar {
                slot,
                connection: slot,
                display_name: name.to_string(),
                car: "XFG".to_string(),
                grid_position: None,
                control_flags: ControlFlags::default(),
            })
            .unwrap();
    }

    fn lap(processor: &mut EventProcessor, slot: u8, lap_time: u32, laps_done: u32) {
        processor
            .apply(Event::LapCompletion {
                slot,
                lap_time,
                laps_done,
                pit_count: 0,
            })
            .unwrap();
    }

    #[test]
    fn session_start_exports_active_race_then_clears() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        join(&mut processor, 2, "B");

        let snapshot = processor
            .apply(Event::SessionStart {
                track: "BL1".to_string(),
                weather: 0,
                wind: 1,
                race_laps: 0,
                qualify_minutes: 20,
            })
            .unwrap()
            .expect("race session must be exported");
        assert_eq!(snapshot.participants.len(), 2);
        assert_eq!(snapshot.meta.track, "AS5");
        assert_eq!(processor.registry().participant_count(), 0);
        assert_eq!(processor.phase(), SessionPhase::Qualifying);
        assert_eq!(processor.registry().meta.track, "BL1");
    }

    #[test]
    fn practice_sessions_are_not_exported() {
        let mut processor = EventProcessor::new(4);
        processor
            .apply(Event::SessionStart {
                track: "FE1".to_string(),
                weather: 0,
                wind: 0,
                race_laps: 0,
                qualify_minutes: 0,
            })
            .unwrap();
        assert_eq!(processor.phase(), SessionPhase::Practice);
        join(&mut processor, 1, "A");
        assert!(processor.apply(Event::SessionEnd).unwrap().is_none());
        assert_eq!(processor.phase(), SessionPhase::NoSession);
    }

    #[test]
    fn heartbeat_end_exports_like_an_explicit_end() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        let snapshot = processor
            .apply(Event::Heartbeat {
                track: None,
                weather: Some(2),
                wind: None,
                race_laps: None,
                qualify_minutes: None,
                ended: true,
            })
            .unwrap();
        assert!(snapshot.is_some());
        assert_eq!(snapshot.unwrap().meta.weather, 2);
        assert_eq!(processor.phase(), SessionPhase::NoSession);
    }

    #[test]
    fn reconnect_moves_the_record_to_the_new_slot() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 3, "Ghost");
        lap(&mut processor, 3, 9000, 1);
        lap(&mut processor, 3, 9100, 2);
        let history: Vec<u32> = processor.registry().get(3).unwrap().laps
            .iter()
            .map(|lap| lap.lap_time)
            .collect();

        // same display name reappears under a fresh slot id
        processor
            .apply(Event::NewCar {
                slot: 9,
                connection: 5,
                display_name: "Ghost".to_string(),
                car: "XFG".to_string(),
                grid_position: None,
                control_flags: ControlFlags::default(),
            })
            .unwrap();

        assert!(!processor.registry().contains_slot(3));
        let moved = processor.registry().get(9).unwrap();
        let moved_history: Vec<u32> = moved.laps.iter().map(|lap| lap.lap_time).collect();
        assert_eq!(moved_history, history);
        assert_eq!(moved.connection_id, 5);
    }

    #[test]
    fn takeover_keeps_laps_and_removes_the_orphan_slot() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 3, "Driver A");
        join(&mut processor, 4, "Driver B");
        lap(&mut processor, 3, 9000, 1);
        lap(&mut processor, 3, 9100, 2);
        lap(&mut processor, 3, 9050, 3);

        processor
            .apply(Event::TakeOver {
                slot: 3,
                connection: 4,
            })
            .unwrap();

        let record = processor.registry().get(3).unwrap();
        assert_eq!(record.laps.len(), 3);
        assert_eq!(record.display_name, "Driver B");
        assert_eq!(record.stints.len(), 1);
        assert_eq!(record.stints[0].lap, 4);
        assert!(!processor.registry().contains_slot(4));
        assert!(processor.registry().meta.relay_session);
    }

    #[test]
    fn events_for_unknown_slots_are_dropped() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        assert!(processor
            .apply(Event::LapCompletion {
                slot: 42,
                lap_time: 9000,
                laps_done: 1,
                pit_count: 0,
            })
            .unwrap()
            .is_none());
        assert!(processor
            .apply(Event::SplitCrossing {
                slot: 42,
                split_index: 1,
                elapsed: 3000,
            })
            .unwrap()
            .is_none());
    }

    #[test]
    fn sector_mismatch_abandons_the_session() {
        let mut processor = EventProcessor::new(2);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        let err = processor
            .apply(Event::SplitCrossing {
                slot: 1,
                split_index: 3,
                elapsed: 3000,
            })
            .unwrap_err();
        assert!(matches!(err, StatsError::SectorIndexOutOfRange { .. }));
        assert_eq!(processor.phase(), SessionPhase::NoSession);
        assert_eq!(processor.registry().participant_count(), 0);
        // the next session starts cleanly
        processor.apply(race_start()).unwrap();
        assert_eq!(processor.phase(), SessionPhase::Race);
    }

    #[test]
    fn grid_order_assigns_positions() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        join(&mut processor, 2, "B");
        processor
            .apply(Event::GridOrder { slots: vec![2, 1] })
            .unwrap();
        assert_eq!(processor.registry().get(2).unwrap().grid_position, Some(1));
        assert_eq!(processor.registry().get(1).unwrap().grid_position, Some(2));
    }

    #[test]
    fn laps_led_and_overtakes_follow_the_running_order() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        join(&mut processor, 2, "B");

        // lap 1: A leads on time
        lap(&mut processor, 1, 9000, 1);
        lap(&mut processor, 2, 9100, 1);
        // lap 2: B turns it around
        lap(&mut processor, 1, 9500, 2);
        lap(&mut processor, 2, 9000, 2);

        let a = processor.registry().get(1).unwrap();
        let b = processor.registry().get(2).unwrap();
        assert!(a.laps_led >= 1);
        assert_eq!(b.overtakes_made, 1);
        assert_eq!(a.overtakes_lost, 1);
        // totals: A 18500, B 18100 -> B leads the last timing point
        assert!(b.laps_led >= 1);
    }

    #[test]
    fn duplicate_lap_datagrams_do_not_move_the_running_order() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        join(&mut processor, 2, "B");
        lap(&mut processor, 1, 9000, 1);
        lap(&mut processor, 2, 9100, 1);
        // re-delivered datagram for A's first lap
        lap(&mut processor, 1, 9000, 1);

        let a = processor.registry().get(1).unwrap();
        assert_eq!(a.laps.len(), 1);
        assert_eq!(a.laps_led, 2);
        assert_eq!(processor.registry().meta.lap_counter, 1);
    }

    #[test]
    fn duplicate_split_datagrams_keep_the_session_alive() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        for (split_index, elapsed) in [(1u8, 3000u32), (1, 3000), (2, 6200), (3, 8000)] {
            processor
                .apply(Event::SplitCrossing {
                    slot: 1,
                    split_index,
                    elapsed,
                })
                .unwrap();
        }
        lap(&mut processor, 1, 9000, 1);
        assert_eq!(processor.phase(), SessionPhase::Race);
        let record = processor.registry().get(1).unwrap();
        assert_eq!(record.laps.len(), 1);
        assert_eq!(record.laps[0].splits, vec![3000, 6200, 8000]);
    }

    #[test]
    fn chat_lines_carry_the_display_name() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        processor
            .apply(Event::Chat {
                connection: 1,
                text: "good race".to_string(),
            })
            .unwrap();
        let chat = &processor.registry().meta.chat;
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].display_name, "A");
        assert_eq!(chat[0].text, "good race");
    }

    #[test]
    fn late_events_after_finish_are_absorbed() {
        let mut processor = EventProcessor::new(4);
        processor.apply(race_start()).unwrap();
        join(&mut processor, 1, "A");
        lap(&mut processor, 1, 9000, 1);
        processor
            .apply(Event::FinalResult {
                slot: 1,
                total_time: 9000,
                position: 1,
                car: "XFG".to_string(),
                confirm_flags: confirm::CONFIRMED,
                pit_count: 0,
            })
            .unwrap();
        lap(&mut processor, 1, 8000, 2);
        let record = processor.registry().get(1).unwrap();
        assert_eq!(record.laps.len(), 1);
        assert_eq!(record.best_lap.unwrap().ticks, 9000);
    }
}
