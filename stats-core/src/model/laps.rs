// Per-lap and per-event value records.

use serde::Serialize;

use super::codes::{PenaltyCode, PenaltyReason};

/// One completed lap. `splits` holds the cumulative time at each crossed
/// split within the lap; `total_time` is the cumulative session time at
/// the moment the lap was completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Lap {
    pub splits: Vec<u32>,
    pub lap_time: u32,
    pub total_time: u32,
}

/// One pit visit. `stationary` stays 0 until the matching pit-exit event
/// closes the visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PitVisit {
    pub lap: u32,
    pub work: u16,
    pub stationary: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PenaltyEntry {
    pub lap: u32,
    pub old: PenaltyCode,
    pub new: PenaltyCode,
    pub reason: PenaltyReason,
}

/// Identity swap during relay/endurance racing. The car keeps its lap
/// history; this entry attributes the stint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StintChange {
    pub lap: u32,
    pub old_display: String,
    pub old_account: String,
    pub new_display: String,
    pub new_account: String,
}

/// A best time together with the lap it was achieved on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimedBest {
    pub ticks: u32,
    pub lap: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpeedBest {
    pub kph: f32,
    pub lap: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatLine {
    pub display_name: String,
    pub text: String,
}
