// lattice/mod.rs
// Silicon lattice host layer: grid geometry, doping map and bound electron orbits.

pub mod doping;
pub mod layout;
pub mod orbits;

pub use doping::*;
pub use layout::*;
pub use orbits::*;

#[cfg(test)]
mod tests;
