// carrier/mod.rs
// Re-exports for the carrier module

mod types;

pub use types::*;
