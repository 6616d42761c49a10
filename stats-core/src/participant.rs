// Per-car statistics accumulator. Every mutating operation is guarded by
// the `finished` latch: the network source emits stale and duplicate
// packets for slots that were reassigned or already classified, and those
// must not disturb a settled record.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::StatsError;
use crate::model::{
    confirm, Classification, ControlFlags, Lap, PenaltyCode, PenaltyEntry, PenaltyReason,
    PitVisit, SpeedBest, StintChange, TimedBest,
};

#[derive(Clone, Debug, Serialize)]
pub struct ParticipantRecord {
    pub slot_id: u8,
    pub connection_id: u8,
    pub display_name: String,
    pub account_name: String,
    /// Most recent (account, display) pair seen per account, so a
    /// reconnect does not lose identity across stints.
    pub known_identities: HashMap<String, (String, String)>,
    pub car: String,
    pub classification: Classification,
    pub grid_position: Option<u32>,
    pub laps: Vec<Lap>,
    pub pit_visits: Vec<PitVisit>,
    pub penalties: Vec<PenaltyEntry>,
    pub stints: Vec<StintChange>,
    /// Best duration per sector index, sized to the configured maximum.
    pub sector_bests: Vec<Option<TimedBest>>,
    /// Cumulative split times within the lap currently in progress.
    pub current_splits: Vec<u32>,
    last_split: u32,
    pub best_lap: Option<TimedBest>,
    pub first_lap: Option<u32>,
    /// Sum of completed lap durations.
    pub total_time: u32,
    pub pit_time: u32,
    pub top_speed: Option<SpeedBest>,
    pub yellow_count: u32,
    pub blue_count: u32,
    yellow_active: bool,
    blue_active: bool,
    pub penalty_count: u32,
    pub finished: bool,
    pub control_flags: ControlFlags,
    pub penalty_note: String,
    /// Total time reported by the final/qualifying result, if any.
    pub result_time: u32,
    pub reported_pit_count: u32,
    pub laps_led: u32,
    pub overtakes_made: u32,
    pub overtakes_lost: u32,
}

impl ParticipantRecord {
    pub fn new(slot_id: u8, connection_id: u8, display_name: String, max_sectors: usize) -> Self {
        Self {
            slot_id,
            connection_id,
            display_name,
            account_name: String::new(),
            known_identities: HashMap::new(),
            car: String::new(),
            classification: Classification::Unclassified,
            grid_position: None,
            laps: Vec::new(),
            pit_visits: Vec::new(),
            penalties: Vec::new(),
            stints: Vec::new(),
            sector_bests: vec![None; max_sectors],
            current_splits: Vec::new(),
            last_split: 0,
            best_lap: None,
            first_lap: None,
            total_time: 0,
            pit_time: 0,
            top_speed: None,
            yellow_count: 0,
            blue_count: 0,
            yellow_active: false,
            blue_active: false,
            penalty_count: 0,
            finished: false,
            control_flags: ControlFlags::default(),
            penalty_note: String::new(),
            result_time: 0,
            reported_pit_count: 0,
            laps_led: 0,
            overtakes_made: 0,
            overtakes_lost: 0,
        }
    }

    pub fn completed_laps(&self) -> u32 {
        self.laps.len() as u32
    }

    /// Remembers the current identity and switches to a new one.
    pub fn set_identity(&mut self, account_name: &str, display_name: &str) {
        self.account_name = account_name.to_string();
        self.display_name = display_name.to_string();
        self.known_identities.insert(
            account_name.to_string(),
            (account_name.to_string(), display_name.to_string()),
        );
    }

    /// Records a split crossing. `split_index` is 1-based; the final
    /// sector has no split of its own and is closed by `record_lap`.
    pub fn record_split(&mut self, split_index: u8, cumulative: u32) -> Result<(), StatsError> {
        if self.finished {
            return Ok(());
        }
        let index = split_index as usize;
        if index == 0 || index >= self.sector_bests.len() {
            return Err(StatsError::SectorIndexOutOfRange {
                index,
                max: self.sector_bests.len(),
            });
        }
        // Re-delivered and out-of-order split datagrams are absorbed:
        // within a lap the splits arrive as 1, 2, ... with strictly
        // increasing cumulative times.
        if index != self.current_splits.len() + 1 || cumulative <= self.last_split {
            return Ok(());
        }
        let duration = cumulative - self.last_split;
        let lap = self.completed_laps() + 1;
        self.update_sector_best(index - 1, duration, lap);
        self.current_splits.push(cumulative);
        self.last_split = cumulative;
        Ok(())
    }

    /// Completes a lap: best-lap tracking, cumulative time, lap entry,
    /// first-lap capture and the final sector's duration.
    pub fn record_lap(
        &mut self,
        lap_time: u32,
        pit_count: u32,
        lap_number: u32,
    ) -> Result<(), StatsError> {
        if self.finished {
            return Ok(());
        }
        // A re-delivered lap datagram carries a lap number already
        // accounted for; each completed lap gets exactly one entry.
        if lap_number <= self.completed_laps() {
            return Ok(());
        }
        let final_sector_index = self.current_splits.len();
        if final_sector_index >= self.sector_bests.len() {
            return Err(StatsError::SectorIndexOutOfRange {
                index: final_sector_index,
                max: self.sector_bests.len(),
            });
        }

        if self.best_lap.map_or(true, |best| lap_time < best.ticks) {
            self.best_lap = Some(TimedBest {
                ticks: lap_time,
                lap: lap_number,
            });
        }
        self.total_time += lap_time;

        let splits = std::mem::take(&mut self.current_splits);
        let final_sector = lap_time.saturating_sub(self.last_split);
        self.laps.push(Lap {
            splits,
            lap_time,
            total_time: self.total_time,
        });
        if self.laps.len() == 1 {
            self.first_lap = Some(lap_time);
        }
        self.update_sector_best(final_sector_index, final_sector, lap_number);
        self.last_split = 0;
        self.reported_pit_count = pit_count;
        Ok(())
    }

    /// Result-driven variant used when the source reports qualifying
    /// results instead of discrete lap events. Best-lap and final-sector
    /// bookkeeping is driven by the reported best-so-far value.
    pub fn record_qualifying_result(
        &mut self,
        total_time: u32,
        best_lap_candidate: u32,
        pit_count: u32,
        _confirm_flags: u8,
        lap_count: u32,
    ) -> Result<(), StatsError> {
        if self.finished {
            return Ok(());
        }
        if best_lap_candidate > 0
            && self
                .best_lap
                .map_or(true, |best| best_lap_candidate < best.ticks)
        {
            self.best_lap = Some(TimedBest {
                ticks: best_lap_candidate,
                lap: lap_count,
            });
        }
        if !self.current_splits.is_empty() && best_lap_candidate > self.last_split {
            let final_sector_index = self.current_splits.len();
            if final_sector_index >= self.sector_bests.len() {
                return Err(StatsError::SectorIndexOutOfRange {
                    index: final_sector_index,
                    max: self.sector_bests.len(),
                });
            }
            let final_sector = best_lap_candidate - self.last_split;
            self.update_sector_best(final_sector_index, final_sector, lap_count);
            self.current_splits.clear();
            self.last_split = 0;
        }
        self.result_time = total_time;
        self.reported_pit_count = pit_count;
        Ok(())
    }

    pub fn record_penalty(&mut self, old: PenaltyCode, new: PenaltyCode, reason: PenaltyReason) {
        if self.finished {
            return;
        }
        self.penalties.push(PenaltyEntry {
            lap: self.completed_laps() + 1,
            old,
            new,
            reason,
        });
        if new != PenaltyCode::None {
            self.penalty_count += 1;
        }
    }

    pub fn record_pit_entry(&mut self, lap: u32, work: u16) {
        if self.finished {
            return;
        }
        self.pit_visits.push(PitVisit {
            lap,
            work,
            stationary: 0,
        });
    }

    /// Closes the most recent pit visit. An exit without an open visit is
    /// dropped, matching how the source behaves across reconnects.
    pub fn record_pit_exit(&mut self, stationary: u32) {
        if self.finished {
            return;
        }
        let Some(visit) = self.pit_visits.last_mut() else {
            return;
        };
        if visit.stationary != 0 {
            return;
        }
        visit.stationary = stationary;
        self.pit_time += stationary;
    }

    pub fn record_speed(&mut self, kph: f32) {
        if self.finished {
            return;
        }
        if self.top_speed.map_or(true, |best| kph > best.kph) {
            self.top_speed = Some(SpeedBest {
                kph,
                lap: self.completed_laps() + 1,
            });
        }
    }

    pub fn record_takeover(&mut self, new_display: &str, new_account: &str) {
        if self.finished {
            return;
        }
        self.stints.push(StintChange {
            lap: self.completed_laps() + 1,
            old_display: self.display_name.clone(),
            old_account: self.account_name.clone(),
            new_display: new_display.to_string(),
            new_account: new_account.to_string(),
        });
        self.set_identity(new_account, new_display);
    }

    pub fn record_final_result(
        &mut self,
        total_time: u32,
        position: u32,
        car: &str,
        confirm_flags: u8,
        pit_count: u32,
    ) {
        if self.finished {
            return;
        }
        self.result_time = total_time;
        self.reported_pit_count = pit_count;
        if !car.is_empty() {
            self.car = car.to_string();
        }
        self.penalty_note = confirm::describe(confirm_flags);
        self.classification = if confirm::disqualifying(confirm_flags) {
            Classification::Penalized
        } else {
            Classification::Classified(position)
        };
        self.finished = true;
    }

    /// Line-crossing finish: latches the record before the confirmed
    /// result arrives, so late duplicates cannot disturb it.
    pub fn record_finish(&mut self, total_time: u32, confirm_flags: u8) {
        if self.finished {
            return;
        }
        self.result_time = total_time;
        self.penalty_note = confirm::describe(confirm_flags);
        if confirm::disqualifying(confirm_flags) {
            self.classification = Classification::Penalized;
        }
        self.finished = true;
    }

    pub fn set_yellow(&mut self, on: bool) {
        if self.finished {
            return;
        }
        if on && !self.yellow_active {
            self.yellow_count += 1;
        }
        self.yellow_active = on;
    }

    pub fn set_blue(&mut self, on: bool) {
        if self.finished {
            return;
        }
        if on && !self.blue_active {
            self.blue_count += 1;
        }
        self.blue_active = on;
    }

    fn update_sector_best(&mut self, sector_index: usize, duration: u32, lap: u32) {
        let best = &mut self.sector_bests[sector_index];
        if best.map_or(true, |current| duration < current.ticks) {
            *best = Some(TimedBest {
                ticks: duration,
                lap,
            });
        }
    }

    // Derived metrics consumed by the ranking engine and exporters.

    pub fn average_lap(&self) -> Option<f64> {
        if self.laps.is_empty() {
            return None;
        }
        Some(self.total_time as f64 / self.laps.len() as f64)
    }

    /// Population standard deviation of lap times about their mean, in
    /// ticks. Needs at least two laps.
    pub fn stability(&self) -> Option<f64> {
        if self.laps.len() < 2 {
            return None;
        }
        let count = self.laps.len() as f64;
        let mean = self.total_time as f64 / count;
        let variance = self
            .laps
            .iter()
            .map(|lap| {
                let deviation = lap.lap_time as f64 - mean;
                deviation * deviation
            })
            .sum::<f64>()
            / count;
        Some(variance.sqrt())
    }

    /// Sum of every sector best achieved so far, possibly faster than any
    /// single completed lap. None until at least one sector best exists.
    pub fn theoretical_best(&self) -> Option<u32> {
        let mut sum = 0u32;
        let mut any = false;
        for best in self.sector_bests.iter().flatten() {
            sum += best.ticks;
            any = true;
        }
        any.then_some(sum)
    }

    pub fn pit_stop_count(&self) -> u32 {
        self.pit_visits.len() as u32
    }

    pub fn combativity(&self) -> i64 {
        self.overtakes_made as i64 - self.overtakes_lost as i64
    }
}
