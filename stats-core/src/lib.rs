// Crate root for the gridstat session statistics core.

pub mod error;
pub mod events;
pub mod model;
pub mod participant;
pub mod ranking;
pub mod registry;
pub mod time;
