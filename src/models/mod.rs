// Module exports for models

pub mod blocked;
pub mod reservation;
pub mod settings;
pub mod slot;
pub mod snapshot;
pub mod window;
pub mod work;
