pub mod app;
pub mod carrier;
pub mod commands;
pub mod config;
pub mod geometry;
pub mod init_config;
pub mod io;
pub mod lattice;
pub mod profiler;
pub mod render;
pub mod simulation;
pub mod species;

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
