// Shop schedule library
// Slot grid, capacity and rescheduling logic for the admin schedule view

pub mod config;
pub mod models;
pub mod services;
pub mod utils;
