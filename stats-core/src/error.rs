// Errors raised by the statistics core. Only configuration/protocol
// mismatches are fatal; everything else is absorbed at the source.

use std::error::Error;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsError {
    /// A split/sector index from the wire exceeds the configured sector
    /// count. Continuing would corrupt the per-sector aggregate arrays.
    SectorIndexOutOfRange { index: usize, max: usize },
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::SectorIndexOutOfRange { index, max } => write!(
                f,
                "sector index {} exceeds the configured sector count {}; \
                 the data source and this configuration disagree",
                index, max
            ),
        }
    }
}

impl Error for StatsError {}
