// World-record lookup. Reference lap and sector times are loaded once
// from records.json in the data dir, keyed by "TRACK|CAR"; a missing or
// unreadable file leaves an empty store.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use gridstat_core::time::parse_ticks;

#[derive(Debug, Deserialize)]
struct RawRecord {
    lap: String,
    #[serde(default)]
    sectors: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ReferenceTimes {
    pub lap: u32,
    pub sectors: Vec<u32>,
}

pub struct RecordStore {
    records: HashMap<String, ReferenceTimes>,
}

impl RecordStore {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("records.json");
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), ?err, "no world records loaded");
                return Self {
                    records: HashMap::new(),
                };
            }
        };
        let raw: HashMap<String, RawRecord> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), ?err, "records.json is not valid");
                return Self {
                    records: HashMap::new(),
                };
            }
        };

        let mut records = HashMap::new();
        for (key, entry) in raw {
            let Some(lap) = parse_ticks(&entry.lap) else {
                warn!(%key, lap = %entry.lap, "skipping record with unparsable lap time");
                continue;
            };
            let sectors = entry
                .sectors
                .iter()
                .filter_map(|sector| parse_ticks(sector))
                .collect();
            records.insert(key, ReferenceTimes { lap, sectors });
        }
        info!(record_count = records.len(), "world records loaded");
        Self { records }
    }

    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn lookup(&self, track: &str, car: &str) -> Option<&ReferenceTimes> {
        self.records.get(&format!("{}|{}", track, car))
    }

    #[cfg(test)]
    fn from_json(text: &str) -> Self {
        let raw: HashMap<String, RawRecord> = serde_json::from_str(text).unwrap();
        let mut records = HashMap::new();
        for (key, entry) in raw {
            if let Some(lap) = parse_ticks(&entry.lap) {
                let sectors = entry.sectors.iter().filter_map(|s| parse_ticks(s)).collect();
                records.insert(key, ReferenceTimes { lap, sectors });
            }
        }
        Self { records }
    }
}
