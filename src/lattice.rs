//! Finite Bravais lattices with an optional multi-site basis.
//!
//! A `Lattice` is the simulation cell: a hyper-rectangle of unit cells with
//! `basis_indices` sites per cell. Sites are addressed by their bravais
//! coordinate plus a basis index, and can be enumerated in a fixed order
//! (first dimension varies fastest, basis index slowest).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};

/// A site: bravais coordinate of the unit cell plus a basis index within it.
///
/// Sites order by bravais coordinate first, then basis index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticeSite {
    #[serde(rename = "bs")]
    bravais_site: Vec<i64>,
    #[serde(rename = "bi")]
    basis_index: usize,
}

impl LatticeSite {
    /// Site with basis index 0.
    pub fn new(bravais_site: impl Into<Vec<i64>>) -> Self {
        Self::with_basis(bravais_site, 0)
    }

    pub fn with_basis(bravais_site: impl Into<Vec<i64>>, basis_index: usize) -> Self {
        Self {
            bravais_site: bravais_site.into(),
            basis_index,
        }
    }

    pub fn bravais_site(&self) -> &[i64] {
        &self.bravais_site
    }

    pub fn basis_index(&self) -> usize {
        self.basis_index
    }

    /// Number of bravais dimensions of this site.
    pub fn n_dimensions(&self) -> usize {
        self.bravais_site.len()
    }
}

impl fmt::Display for LatticeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.bravais_site)?;
        if self.basis_index != 0 {
            write!(f, "[{}]", self.basis_index)?;
        }
        Ok(())
    }
}

/// Simulation cell of `dimensions[0] × dimensions[1] × ...` unit cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lattice {
    dimensions: Vec<usize>,
    basis_indices: usize,
}

impl Lattice {
    /// Create a lattice with a single site per unit cell.
    pub fn new(dimensions: impl Into<Vec<usize>>) -> Result<Self> {
        Self::with_basis(dimensions, 1)
    }

    /// Create a lattice with `basis_indices` sites per unit cell.
    pub fn with_basis(dimensions: impl Into<Vec<usize>>, basis_indices: usize) -> Result<Self> {
        let dimensions = dimensions.into();
        if dimensions.is_empty() {
            return Err(VmcError::InvalidLattice("a lattice needs at least one dimension".into()));
        }
        if dimensions.iter().any(|&length| length == 0) {
            return Err(VmcError::InvalidLattice(format!(
                "dimension lengths must be positive, got {:?}",
                dimensions
            )));
        }
        if basis_indices == 0 {
            return Err(VmcError::InvalidLattice("basis_indices must be positive".into()));
        }
        Ok(Self { dimensions, basis_indices })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn n_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    pub fn basis_indices(&self) -> usize {
        self.basis_indices
    }

    /// Total number of sites, counting every basis index.
    pub fn total_sites(&self) -> usize {
        self.dimensions.iter().product::<usize>() * self.basis_indices
    }

    /// True iff `site` has the right dimensionality and lies inside the cell.
    pub fn contains(&self, site: &LatticeSite) -> bool {
        site.n_dimensions() == self.n_dimensions()
            && site
                .bravais_site()
                .iter()
                .zip(&self.dimensions)
                .all(|(&x, &length)| x >= 0 && (x as usize) < length)
            && site.basis_index() < self.basis_indices
    }

    /// Site at position `n` of the enumeration order.
    pub fn site_from_index(&self, mut n: usize) -> Option<LatticeSite> {
        if n >= self.total_sites() {
            return None;
        }
        let mut bravais_site = Vec::with_capacity(self.n_dimensions());
        for &length in &self.dimensions {
            bravais_site.push((n % length) as i64);
            n /= length;
        }
        Some(LatticeSite::with_basis(bravais_site, n))
    }

    /// Inverse of [`Lattice::site_from_index`].
    pub fn site_to_index(&self, site: &LatticeSite) -> Option<usize> {
        if !self.contains(site) {
            return None;
        }
        let mut n = 0;
        let mut offset = 1;
        for (&x, &length) in site.bravais_site().iter().zip(&self.dimensions) {
            n += x as usize * offset;
            offset *= length;
        }
        Some(n + site.basis_index() * offset)
    }

    /// Iterate over every site of the lattice in enumeration order.
    pub fn sites(&self) -> impl Iterator<Item = LatticeSite> + '_ {
        (0..self.total_sites()).filter_map(move |n| self.site_from_index(n))
    }
}
