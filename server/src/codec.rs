// Wire decoding for the framed event protocol. One datagram carries one
// event: a type byte followed by little-endian fields; names are
// length-prefixed UTF-8. Uncertain input decodes to None, no guessing.

use gridstat_core::events::Event;
use gridstat_core::model::{ControlFlags, FlagKind, PenaltyCode, PenaltyReason};

mod kind {
    pub const SESSION_START: u8 = 0x01;
    pub const SESSION_END: u8 = 0x02;
    pub const HEARTBEAT: u8 = 0x03;
    pub const CONNECTION_NEW: u8 = 0x10;
    pub const CONNECTION_LEAVE: u8 = 0x11;
    pub const NAME_CHANGE: u8 = 0x12;
    pub const NEW_CAR: u8 = 0x20;
    pub const TAKE_OVER: u8 = 0x21;
    pub const SPLIT: u8 = 0x30;
    pub const LAP: u8 = 0x31;
    pub const PIT_ENTRY: u8 = 0x32;
    pub const PIT_EXIT: u8 = 0x33;
    pub const SPEED: u8 = 0x34;
    pub const PENALTY: u8 = 0x35;
    pub const FLAG: u8 = 0x36;
    pub const QUALIFYING_RESULT: u8 = 0x40;
    pub const FINAL_RESULT: u8 = 0x41;
    pub const FINISH: u8 = 0x42;
    pub const GRID_ORDER: u8 = 0x50;
    pub const CHAT: u8 = 0x60;
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> Option<u8> {
        let value = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(value)
    }

    fn u16(&mut self) -> Option<u16> {
        let bytes = self.buf.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.buf.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f32(&mut self) -> Option<f32> {
        Some(f32::from_bits(self.u32()?))
    }

    fn string(&mut self) -> Option<String> {
        let len = self.u8()? as usize;
        let bytes = self.buf.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}

pub fn decode(datagram: &[u8]) -> Option<Event> {
    let mut reader = Reader::new(datagram);
    let event = match reader.u8()? {
        kind::SESSION_START => Event::SessionStart {
            track: reader.string()?,
            weather: reader.u8()?,
            wind: reader.u8()?,
            race_laps: reader.u16()? as u32,
            qualify_minutes: reader.u16()? as u32,
        },
        kind::SESSION_END => Event::SessionEnd,
        kind::HEARTBEAT => {
            let flags = reader.u8()?;
            let has_meta = flags & 0x01 != 0;
            let ended = flags & 0x02 != 0;
            if has_meta {
                Event::Heartbeat {
                    track: Some(reader.string()?),
                    weather: Some(reader.u8()?),
                    wind: Some(reader.u8()?),
                    race_laps: Some(reader.u16()? as u32),
                    qualify_minutes: Some(reader.u16()? as u32),
                    ended,
                }
            } else {
                Event::Heartbeat {
                    track: None,
                    weather: None,
                    wind: None,
                    race_laps: None,
                    qualify_minutes: None,
                    ended,
                }
            }
        }
        kind::CONNECTION_NEW => Event::ConnectionNew {
            connection: reader.u8()?,
            account_name: reader.string()?,
            display_name: reader.string()?,
        },
        kind::CONNECTION_LEAVE => Event::ConnectionLeave {
            connection: reader.u8()?,
        },
        kind::NAME_CHANGE => Event::NameChange {
            connection: reader.u8()?,
            account_name: reader.string()?,
            display_name: reader.string()?,
        },
        kind::NEW_CAR => {
            let slot = reader.u8()?;
            let connection = reader.u8()?;
            let display_name = reader.string()?;
            let car = reader.string()?;
            let grid = reader.u16()?;
            let control_flags = ControlFlags(reader.u16()?);
            Event::NewCar {
                slot,
                connection,
                display_name,
                car,
                grid_position: (grid > 0).then_some(grid as u32),
                control_flags,
            }
        }
        kind::TAKE_OVER => Event::TakeOver {
            slot: reader.u8()?,
            connection: reader.u8()?,
        },
        kind::SPLIT => Event::SplitCrossing {
            slot: reader.u8()?,
            split_index: reader.u8()?,
            elapsed: reader.u32()?,
        },
        kind::LAP => Event::LapCompletion {
            slot: reader.u8()?,
            lap_time: reader.u32()?,
            laps_done: reader.u16()? as u32,
            pit_count: reader.u8()? as u32,
        },
        kind::PIT_ENTRY => Event::PitEntry {
            slot: reader.u8()?,
            laps_done: reader.u16()? as u32,
            work: reader.u16()?,
        },
        kind::PIT_EXIT => Event::PitExit {
            slot: reader.u8()?,
            stationary: reader.u32()?,
        },
        kind::SPEED => Event::SpeedSample {
            slot: reader.u8()?,
            kph: reader.f32()?,
        },
        kind::PENALTY => Event::PenaltyChange {
            slot: reader.u8()?,
            old: PenaltyCode::from_wire(reader.u8()?),
            new: PenaltyCode::from_wire(reader.u8()?),
            reason: PenaltyReason::from_wire(reader.u8()?),
        },
        kind::FLAG => Event::FlagToggle {
            slot: reader.u8()?,
            flag: match reader.u8()? {
                0 => FlagKind::Yellow,
                1 => FlagKind::Blue,
                _ => return None,
            },
            on: reader.u8()? != 0,
        },
        kind::QUALIFYING_RESULT => Event::QualifyingResult {
            slot: reader.u8()?,
            total_time: reader.u32()?,
            best_lap: reader.u32()?,
            pit_count: reader.u8()? as u32,
            confirm_flags: reader.u8()?,
            lap_count: reader.u16()? as u32,
        },
        kind::FINAL_RESULT => Event::FinalResult {
            slot: reader.u8()?,
            total_time: reader.u32()?,
            position: reader.u16()? as u32,
            car: reader.string()?,
            confirm_flags: reader.u8()?,
            pit_count: reader.u8()? as u32,
        },
        kind::FINISH => Event::Finish {
            slot: reader.u8()?,
            total_time: reader.u32()?,
            confirm_flags: reader.u8()?,
        },
        kind::GRID_ORDER => {
            let count = reader.u8()? as usize;
            let mut slots = Vec::with_capacity(count);
            for _ in 0..count {
                slots.push(reader.u8()?);
            }
            Event::GridOrder { slots }
        }
        kind::CHAT => Event::Chat {
            connection: reader.u8()?,
            text: reader.string()?,
        },
        _ => return None,
    };
    Some(event)
}
