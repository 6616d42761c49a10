// Value types shared by the accumulator, registry and exporters.

mod codes;
mod laps;

pub use codes::{confirm, Classification, ControlFlags, FlagKind, PenaltyCode, PenaltyReason};
pub use laps::{ChatLine, Lap, PenaltyEntry, PitVisit, SpeedBest, StintChange, TimedBest};
