//! Site hops and the canonical basic operators built from them.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexSet;
use num_complex::Complex64;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::boundary::BoundaryConditions;
use crate::error::{Result, VmcError};
use crate::lattice::LatticeSite;
use crate::wavefunction::Wavefunction;

/// Transfer of one particle of `species` from `source` to `destination`.
///
/// A hop with `source == destination` is a density operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SiteHop {
    source: LatticeSite,
    destination: LatticeSite,
    species: usize,
}

impl SiteHop {
    pub fn new(source: LatticeSite, destination: LatticeSite, species: usize) -> Result<Self> {
        if source.n_dimensions() != destination.n_dimensions() {
            return Err(VmcError::DimensionMismatch {
                expected: source.n_dimensions(),
                found: destination.n_dimensions(),
            });
        }
        Ok(Self {
            source,
            destination,
            species,
        })
    }

    /// Density of `species` on `site`.
    pub fn density(site: &LatticeSite, species: usize) -> Self {
        Self {
            source: site.clone(),
            destination: site.clone(),
            species,
        }
    }

    pub fn source(&self) -> &LatticeSite {
        &self.source
    }

    pub fn destination(&self) -> &LatticeSite {
        &self.destination
    }

    pub fn species(&self) -> usize {
        self.species
    }

    pub fn n_dimensions(&self) -> usize {
        self.source.n_dimensions()
    }

    /// True iff both sites are on the wavefunction's lattice and the species
    /// exists.
    pub fn is_valid_for<W: Wavefunction + ?Sized>(&self, wavefunction: &W) -> bool {
        let lattice = wavefunction.lattice();
        lattice.contains(&self.source)
            && lattice.contains(&self.destination)
            && self.species < wavefunction.n_species()
    }

    fn sort_key(&self) -> (usize, &LatticeSite, &LatticeSite) {
        (self.species, &self.source, &self.destination)
    }
}

impl Ord for SiteHop {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for SiteHop {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SiteHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.source, self.destination, self.species)
    }
}

/// Anything expressible as a product of site hops.
///
/// With `boundary_conditions` set, the operator is summed over every
/// translation of the lattice, picking up twist phases at the boundary.
/// Without it, no sum is performed.
///
/// Hops are kept sorted by (species, source, destination), so two operators
/// built from the same hops in any order are equal and hash equal. This is
/// what lets unrelated composite operators share measurements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicOperator {
    hops: Vec<SiteHop>,
    boundary_conditions: Option<BoundaryConditions>,
}

impl BasicOperator {
    pub fn new(
        hops: impl Into<Vec<SiteHop>>,
        boundary_conditions: Option<BoundaryConditions>,
    ) -> Result<Self> {
        let mut hops = hops.into();
        let n_dims = hops.first().map(SiteHop::n_dimensions);
        if let Some(n_dims) = n_dims {
            if let Some(hop) = hops.iter().find(|hop| hop.n_dimensions() != n_dims) {
                return Err(VmcError::DimensionMismatch {
                    expected: n_dims,
                    found: hop.n_dimensions(),
                });
            }
        }
        if let Some(bcs) = &boundary_conditions {
            bcs.validate(n_dims.unwrap_or(bcs.n_dimensions()))?;
        }
        hops.sort();
        Ok(Self {
            hops,
            boundary_conditions,
        })
    }

    pub fn hops(&self) -> &[SiteHop] {
        &self.hops
    }

    pub fn boundary_conditions(&self) -> Option<&BoundaryConditions> {
        self.boundary_conditions.as_ref()
    }

    /// Every hop is valid for the wavefunction and any boundary conditions
    /// match its lattice.
    pub fn is_valid_for<W: Wavefunction + ?Sized>(&self, wavefunction: &W) -> bool {
        self.hops.iter().all(|hop| hop.is_valid_for(wavefunction))
            && self
                .boundary_conditions
                .as_ref()
                .map_or(true, |bcs| bcs.n_dimensions() == wavefunction.lattice().n_dimensions())
    }

    /// A basic operator is its own elementary closure.
    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        IndexSet::from([self.clone()])
    }

    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Complex64> {
        context.get(self)
    }
}

impl fmt::Display for BasicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self.hops.iter().map(|hop| hop.to_string()).collect();
        write!(f, "[{}]", hops.join(", "))?;
        if let Some(bcs) = &self.boundary_conditions {
            write!(f, " summed with {}", bcs)?;
        }
        Ok(())
    }
}

impl Serialize for BasicOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("BasicOperator", 3)?;
        record.serialize_field("type", "BasicOperator")?;
        record.serialize_field("hops", &self.hops)?;
        record.serialize_field("boundary_conditions", &self.boundary_conditions)?;
        record.end()
    }
}

/// Measured expectation value of each basic operator.
///
/// Filled once from simulation output, then only read while operators are
/// evaluated against it.
#[derive(Debug, Clone, Default)]
pub struct MeasurementContext {
    values: HashMap<BasicOperator, Complex64>,
}

impl MeasurementContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, operator: BasicOperator, value: Complex64) -> Option<Complex64> {
        self.values.insert(operator, value)
    }

    /// Value of `operator`; an absent entry means the measurement plan did
    /// not cover it.
    pub fn get(&self, operator: &BasicOperator) -> Result<Complex64> {
        self.values
            .get(operator)
            .copied()
            .ok_or_else(|| VmcError::MissingMeasurement(operator.to_string()))
    }

    pub fn contains(&self, operator: &BasicOperator) -> bool {
        self.values.contains_key(operator)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(BasicOperator, Complex64)> for MeasurementContext {
    fn from_iter<I: IntoIterator<Item = (BasicOperator, Complex64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
