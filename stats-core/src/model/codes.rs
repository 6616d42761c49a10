// Closed enumerations for the protocol's reserved numeric codes.

use serde::Serialize;

/// Finishing classification. `Penalized` covers drivers whose result was
/// escalated by a drive-through / stop-go / did-not-pit condition;
/// `Unclassified` covers drivers without a confirmed result (DNF included).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Classified(u32),
    Penalized,
    Unclassified,
}

impl Classification {
    /// Numeric key for ordering: real positions first, penalized results
    /// next, unclassified last. Mirrors the protocol's 998/999 reservations.
    pub fn sort_key(&self) -> u32 {
        match self {
            Classification::Classified(position) => *position,
            Classification::Penalized => 998,
            Classification::Unclassified => 999,
        }
    }

    pub fn position(&self) -> Option<u32> {
        match self {
            Classification::Classified(position) => Some(*position),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCode {
    None,
    DriveThrough,
    DriveThroughDone,
    StopGo,
    StopGoDone,
    Seconds30,
    Seconds45,
}

impl PenaltyCode {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => PenaltyCode::DriveThrough,
            2 => PenaltyCode::DriveThroughDone,
            3 => PenaltyCode::StopGo,
            4 => PenaltyCode::StopGoDone,
            5 => PenaltyCode::Seconds30,
            6 => PenaltyCode::Seconds45,
            _ => PenaltyCode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyCode::None => "none",
            PenaltyCode::DriveThrough => "drive-through",
            PenaltyCode::DriveThroughDone => "drive-through served",
            PenaltyCode::StopGo => "stop-go",
            PenaltyCode::StopGoDone => "stop-go served",
            PenaltyCode::Seconds30 => "+30s",
            PenaltyCode::Seconds45 => "+45s",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyReason {
    Unknown,
    Admin,
    WrongWay,
    FalseStart,
    SpeedingInPits,
    StopShort,
    StopLate,
}

impl PenaltyReason {
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => PenaltyReason::Admin,
            2 => PenaltyReason::WrongWay,
            3 => PenaltyReason::FalseStart,
            4 => PenaltyReason::SpeedingInPits,
            5 => PenaltyReason::StopShort,
            6 => PenaltyReason::StopLate,
            _ => PenaltyReason::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyReason::Unknown => "unknown",
            PenaltyReason::Admin => "admin",
            PenaltyReason::WrongWay => "wrong way",
            PenaltyReason::FalseStart => "false start",
            PenaltyReason::SpeedingInPits => "speeding in pit lane",
            PenaltyReason::StopShort => "stop-go too short",
            PenaltyReason::StopLate => "stopped too late",
        }
    }
}

/// Result confirmation flag bits carried by result/finish events.
pub mod confirm {
    pub const MENTIONED: u8 = 0x01;
    pub const CONFIRMED: u8 = 0x02;
    pub const PENALTY_DT: u8 = 0x04;
    pub const PENALTY_SG: u8 = 0x08;
    pub const PENALTY_30S: u8 = 0x10;
    pub const PENALTY_45S: u8 = 0x20;
    pub const DID_NOT_PIT: u8 = 0x40;

    /// True when the result must be escalated to `Classification::Penalized`.
    pub fn disqualifying(flags: u8) -> bool {
        flags & (PENALTY_DT | PENALTY_SG | DID_NOT_PIT) != 0
    }

    /// Short human-readable summary of the penalty bits, empty when clean.
    pub fn describe(flags: u8) -> String {
        let mut parts = Vec::new();
        if flags & PENALTY_DT != 0 {
            parts.push("drive-through");
        }
        if flags & PENALTY_SG != 0 {
            parts.push("stop-go");
        }
        if flags & DID_NOT_PIT != 0 {
            parts.push("did not pit");
        }
        if flags & PENALTY_30S != 0 {
            parts.push("+30s");
        }
        if flags & PENALTY_45S != 0 {
            parts.push("+45s");
        }
        parts.join(", ")
    }
}

/// Control-input style bits, packed as reported by the protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ControlFlags(pub u16);

impl ControlFlags {
    pub const LEFT_SIDE: u16 = 0x0001;
    pub const AUTO_GEARS: u16 = 0x0002;
    pub const AUTO_CLUTCH: u16 = 0x0200;
    pub const MOUSE: u16 = 0x4000;
    pub const KEYBOARD: u16 = 0x8000;

    pub fn summary(&self) -> String {
        let device = if self.0 & Self::KEYBOARD != 0 {
            "keyboard"
        } else if self.0 & Self::MOUSE != 0 {
            "mouse"
        } else {
            "wheel"
        };
        let mut parts = vec![device];
        if self.0 & Self::AUTO_GEARS != 0 {
            parts.push("auto gears");
        }
        if self.0 & Self::AUTO_CLUTCH != 0 {
            parts.push("auto clutch");
        }
        parts.join(", ")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Yellow,
    Blue,
}
