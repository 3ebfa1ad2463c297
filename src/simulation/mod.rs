// simulation/mod.rs
// Re-exports and module declarations for simulation submodules

pub mod drift;
pub mod simulation;
pub use simulation::*;

#[cfg(test)]
mod properties;
