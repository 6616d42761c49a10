// Crate root for the gridstat server modules.

pub mod codec;
pub mod config;
pub mod export;
pub mod ingest;
pub mod records;
pub mod utils;
