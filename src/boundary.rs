//! Twisted boundary conditions on a finite lattice.
//!
//! A boundary condition in one dimension is a nonzero rational `p`: moving
//! once around the system in that direction multiplies quantum amplitudes by
//! `exp(2πi·p)`. `p = 1` is periodic, `p = 1/2` antiperiodic, and other
//! values thread a flux through the torus to select a momentum sector.

use std::f64::consts::PI;
use std::fmt;
use std::ops::Deref;

use num_complex::Complex64;
use num_rational::{Ratio, Rational64};
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VmcError};
use crate::io::{deserialize_rational, serialize_rational};
use crate::lattice::{Lattice, LatticeSite};

/// Boundary condition along a single lattice dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryCondition(Rational64);

/// `p = 1`
pub const PERIODIC: BoundaryCondition = BoundaryCondition(Rational64::new_raw(1, 1));
/// `p = 1/2`
pub const ANTIPERIODIC: BoundaryCondition = BoundaryCondition(Rational64::new_raw(1, 2));

impl BoundaryCondition {
    /// Twisted boundary condition with phase `p` (in units of 2π). Zero is
    /// rejected: open boundaries are not supported.
    pub fn new(p: Rational64) -> Result<Self> {
        if p.is_zero() {
            return Err(VmcError::InvalidBoundaryConditions {
                found: p.to_string(),
                expected: 1,
            });
        }
        Ok(Self(p))
    }

    pub fn p(&self) -> Rational64 {
        self.0
    }

    /// Factor picked up by an amplitude when wrapping once in the positive
    /// direction.
    pub fn phase_factor(&self) -> Complex64 {
        phase_factor(self.0)
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BoundaryCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_rational(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BoundaryCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let p = deserialize_rational(deserializer)?;
        Self::new(p).map_err(serde::de::Error::custom)
    }
}

/// `exp(2πi·phase)`, exact for the quarter turns.
pub fn phase_factor(phase: Rational64) -> Complex64 {
    let reduced = phase - phase.floor();
    if reduced.is_zero() {
        Complex64::new(1.0, 0.0)
    } else if reduced == Rational64::new(1, 2) {
        Complex64::new(-1.0, 0.0)
    } else if reduced == Rational64::new(1, 4) {
        Complex64::new(0.0, 1.0)
    } else if reduced == Rational64::new(3, 4) {
        Complex64::new(0.0, -1.0)
    } else {
        let turns = *reduced.numer() as f64 / *reduced.denom() as f64;
        Complex64::from_polar(1.0, 2.0 * PI * turns)
    }
}

/// One boundary condition per lattice dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryConditions(Vec<BoundaryCondition>);

impl BoundaryConditions {
    pub fn new(conditions: impl Into<Vec<BoundaryCondition>>) -> Self {
        Self(conditions.into())
    }

    /// Build from raw phases, rejecting any zero component.
    pub fn from_phases(phases: &[Rational64]) -> Result<Self> {
        if !phases.iter().all(|p| !p.is_zero()) {
            return Err(VmcError::InvalidBoundaryConditions {
                found: format!("{:?}", phases.iter().map(|p| p.to_string()).collect::<Vec<_>>()),
                expected: phases.len(),
            });
        }
        Ok(Self(phases.iter().map(|&p| BoundaryCondition(p)).collect()))
    }

    /// Periodic in all `n_dims` dimensions.
    pub fn periodic(n_dims: usize) -> Self {
        Self(vec![PERIODIC; n_dims])
    }

    pub fn n_dimensions(&self) -> usize {
        self.0.len()
    }

    /// Check that these conditions fit an `n_dims`-dimensional lattice.
    pub fn validate(&self, n_dims: usize) -> Result<()> {
        if valid_boundary_conditions(&self.0, n_dims) {
            Ok(())
        } else {
            Err(VmcError::InvalidBoundaryConditions {
                found: self.to_string(),
                expected: n_dims,
            })
        }
    }
}

impl Deref for BoundaryConditions {
    type Target = [BoundaryCondition];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<BoundaryCondition>> for BoundaryConditions {
    fn from(conditions: Vec<BoundaryCondition>) -> Self {
        Self(conditions)
    }
}

impl fmt::Display for BoundaryConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|bc| bc.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// True iff there is exactly one nonzero condition per dimension.
pub fn valid_boundary_conditions(conditions: &[BoundaryCondition], n_dims: usize) -> bool {
    conditions.len() == n_dims && conditions.iter().all(|bc| !bc.p().is_zero())
}

fn wrap_site(site: &LatticeSite, lattice: &Lattice) -> Result<(LatticeSite, Vec<i64>)> {
    if site.n_dimensions() != lattice.n_dimensions() {
        return Err(VmcError::DimensionMismatch {
            expected: lattice.n_dimensions(),
            found: site.n_dimensions(),
        });
    }
    let mut wrapped = Vec::with_capacity(site.n_dimensions());
    let mut windings = Vec::with_capacity(site.n_dimensions());
    for (&x, &length) in site.bravais_site().iter().zip(lattice.dimensions()) {
        let length = length as i64;
        wrapped.push(x.rem_euclid(length));
        windings.push(x.div_euclid(length));
    }
    let wrapped = LatticeSite::with_basis(wrapped, site.basis_index());
    if !lattice.contains(&wrapped) {
        return Err(VmcError::SiteOutsideLattice(wrapped.to_string()));
    }
    Ok((wrapped, windings))
}

/// Map a site which may lie outside the cell back onto its periodic image.
pub fn enforce_boundary(site: &LatticeSite, lattice: &Lattice) -> Result<LatticeSite> {
    wrap_site(site, lattice).map(|(wrapped, _)| wrapped)
}

/// Like [`enforce_boundary`], also returning the accrued phase in `[0, 1)`.
///
/// Amplitudes involving the wrapped site must be multiplied by
/// `exp(2πi·phase)`; see [`phase_factor`].
pub fn enforce_boundary_with_phase(
    site: &LatticeSite,
    lattice: &Lattice,
    conditions: &BoundaryConditions,
) -> Result<(LatticeSite, Rational64)> {
    conditions.validate(lattice.n_dimensions())?;
    let (wrapped, windings) = wrap_site(site, lattice)?;
    let total = windings
        .iter()
        .zip(conditions.iter())
        .fold(Ratio::<i128>::zero(), |acc, (&n, bc)| {
            let sum = acc + winding_phase(n, bc.p());
            if sum >= Ratio::one() {
                sum - Ratio::one()
            } else {
                sum
            }
        });
    let phase = match (i64::try_from(*total.numer()), i64::try_from(*total.denom())) {
        (Ok(numer), Ok(denom)) => Rational64::new(numer, denom),
        _ => {
            return Err(VmcError::InvalidBoundaryConditions {
                found: conditions.to_string(),
                expected: lattice.n_dimensions(),
            })
        }
    };
    debug_assert!(phase >= Rational64::zero() && phase < Rational64::one());
    Ok((wrapped, phase))
}

/// `n·p mod 1`, with both factors reduced mod `denom(p)` first.
fn winding_phase(n: i64, p: Rational64) -> Ratio<i128> {
    let q = i128::from(*p.denom());
    let a = i128::from(*p.numer()).rem_euclid(q);
    Ratio::new(i128::from(n).rem_euclid(q) * a % q, q)
}
