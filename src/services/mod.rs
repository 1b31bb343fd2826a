// Service module exports

pub mod availability;
pub mod calendar;
pub mod capacity;
pub mod day_window;
pub mod remote;
pub mod reschedule;
pub mod schedule;
pub mod slot_grid;
pub mod snapshot;
pub mod works;
