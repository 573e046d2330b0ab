//! Configuration loading

mod loader;

pub use loader::{load, load_from_env, load_from_file, parse_time_zone, validate};
