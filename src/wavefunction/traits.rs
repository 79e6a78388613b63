//! Traits for lattice trial wavefunctions.
//!
//! Amplitude evaluation lives with the sampler; operators only need to know
//! where particles may sit and how many species there are.

use crate::lattice::Lattice;

/// Lattice trial wavefunction.
pub trait Wavefunction {
    /// The lattice the particles live on.
    fn lattice(&self) -> &Lattice;

    /// Number of particle species (e.g. 2 for spin-1/2 fermions).
    fn n_species(&self) -> usize;
}

impl<W: Wavefunction + ?Sized> Wavefunction for &W {
    fn lattice(&self) -> &Lattice {
        (**self).lattice()
    }

    fn n_species(&self) -> usize {
        (**self).n_species()
    }
}
