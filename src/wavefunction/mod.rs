//! Wavefunction module - the view of a trial wavefunction that operators and
//! measurement plans need.

mod traits;

pub use traits::Wavefunction;
