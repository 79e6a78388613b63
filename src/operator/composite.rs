//! Physical operators built as fixed combinations of basic operators.
//!
//! Each operator decides at construction which basic operators it needs, and
//! at evaluation recombines their measured values. Construction validates
//! everything; evaluation can only fail on a missing measurement, a missing
//! coupling, or a value that should be real but is not.

use approx::abs_diff_eq;
use indexmap::IndexSet;
use num_complex::Complex64;
use num_traits::Zero;
use serde::{Serialize, Serializer};

use super::{BasicOperator, Couplings, MeasurementContext, Operator, SiteHop};
use crate::boundary::BoundaryConditions;
use crate::error::{Result, VmcError};
use crate::lattice::{Lattice, LatticeSite};

/// Largest imaginary part, relative to `max(1, |re|)`, tolerated in a value
/// that must be real.
pub const REALNESS_TOLERANCE: f64 = 1e-8;

/// `z + z*`
pub fn add_hc(z: Complex64) -> Complex64 {
    z + z.conj()
}

/// Real part of `z`, or an error if its imaginary part is not negligible.
pub fn ensure_real(z: Complex64) -> Result<f64> {
    let epsilon = REALNESS_TOLERANCE * z.re.abs().max(1.0);
    if abs_diff_eq!(z.im, 0.0, epsilon = epsilon) {
        Ok(z.re)
    } else {
        Err(VmcError::NotReal(z))
    }
}

fn density(
    sites: &[&LatticeSite],
    species: &[usize],
    bcs: &Option<BoundaryConditions>,
) -> Result<BasicOperator> {
    let hops: Vec<SiteHop> = sites
        .iter()
        .zip(species)
        .map(|(site, &s)| SiteHop::density(site, s))
        .collect();
    BasicOperator::new(hops, bcs.clone())
}

fn hops(
    terms: &[(&LatticeSite, &LatticeSite, usize)],
    bcs: &Option<BoundaryConditions>,
) -> Result<BasicOperator> {
    let hops = terms
        .iter()
        .map(|&(source, destination, species)| {
            SiteHop::new(source.clone(), destination.clone(), species)
        })
        .collect::<Result<Vec<_>>>()?;
    BasicOperator::new(hops, bcs.clone())
}

fn check_same_dimensions(sites: &[&LatticeSite]) -> Result<()> {
    if let Some(first) = sites.first() {
        for site in &sites[1..] {
            if site.n_dimensions() != first.n_dimensions() {
                return Err(VmcError::DimensionMismatch {
                    expected: first.n_dimensions(),
                    found: site.n_dimensions(),
                });
            }
        }
    }
    Ok(())
}

fn sum(operators: &[BasicOperator], context: &MeasurementContext) -> Result<Complex64> {
    operators
        .iter()
        .try_fold(Complex64::zero(), |acc, op| Ok(acc + op.evaluate(context)?))
}

fn serialize_as_operator<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Clone + Into<Operator>,
    S: Serializer,
{
    let operator: Operator = value.clone().into();
    operator.serialize(serializer)
}

/// `Σ_ij n_i(site1) n_j(site2)` over all species pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DensityDensityOperator {
    operators: Vec<BasicOperator>,
}

impl DensityDensityOperator {
    pub fn new(
        site1: &LatticeSite,
        site2: &LatticeSite,
        n_species: usize,
        boundary_conditions: Option<BoundaryConditions>,
    ) -> Result<Self> {
        if n_species == 0 {
            return Err(VmcError::InvalidOperator(
                "density-density needs at least one species".into(),
            ));
        }
        check_same_dimensions(&[site1, site2])?;
        let mut operators = Vec::with_capacity(n_species * n_species);
        for i in 0..n_species {
            for j in 0..n_species {
                // n_i n_i on a single site is just n_i
                let op = if site1 != site2 || i != j {
                    density(&[site1, site2], &[i, j], &boundary_conditions)?
                } else {
                    density(&[site1], &[i], &boundary_conditions)?
                };
                operators.push(op);
            }
        }
        Ok(Self { operators })
    }

    pub fn operators(&self) -> &[BasicOperator] {
        &self.operators
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        self.operators.iter().cloned().collect()
    }

    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Complex64> {
        sum(&self.operators, context)
    }
}

/// `S(site1) · S(site2)` for spin-1/2 particles (species 0 and 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpinSpinOperator {
    operators: Vec<BasicOperator>,
    same_site: bool,
}

impl SpinSpinOperator {
    pub fn new(
        site1: &LatticeSite,
        site2: &LatticeSite,
        boundary_conditions: Option<BoundaryConditions>,
    ) -> Result<Self> {
        check_same_dimensions(&[site1, site2])?;
        let bcs = &boundary_conditions;
        if site1 == site2 {
            let operators = vec![density(&[site1], &[0], bcs)?, density(&[site1], &[1], bcs)?];
            return Ok(Self {
                operators,
                same_site: true,
            });
        }
        let operators = vec![
            density(&[site1, site2], &[0, 0], bcs)?,
            density(&[site1, site2], &[1, 1], bcs)?,
            density(&[site1, site2], &[0, 1], bcs)?,
            density(&[site1, site2], &[1, 0], bcs)?,
            hops(&[(site1, site2, 0), (site2, site1, 1)], bcs)?,
        ];
        Ok(Self {
            operators,
            same_site: false,
        })
    }

    pub fn operators(&self) -> &[BasicOperator] {
        &self.operators
    }

    pub fn is_same_site(&self) -> bool {
        self.same_site
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        self.operators.iter().cloned().collect()
    }

    /// Same site gives `3/4 ρ`; otherwise the result is checked to be real.
    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Complex64> {
        let v = |i: usize| context.get(&self.operators[i]);
        if self.same_site {
            return Ok(0.75 * (v(0)? + v(1)?));
        }
        let value =
            -0.5 * add_hc(v(4)?) + 0.25 * v(0)? + 0.25 * v(1)? - 0.25 * v(2)? - 0.25 * v(3)?;
        Ok(Complex64::new(ensure_real(value)?, 0.0))
    }
}

/// Singlet ring exchange on the plaquette `(0,0), (1,0), (1,1), (0,1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SingletRingExchangeOperator {
    operators: Vec<BasicOperator>,
}

impl SingletRingExchangeOperator {
    pub fn new(boundary_conditions: Option<BoundaryConditions>) -> Result<Self> {
        let s00 = LatticeSite::new(vec![0, 0]);
        let s10 = LatticeSite::new(vec![1, 0]);
        let s11 = LatticeSite::new(vec![1, 1]);
        let s01 = LatticeSite::new(vec![0, 1]);
        let bcs = &boundary_conditions;
        let operators = vec![
            hops(&[(&s00, &s10, 0), (&s11, &s01, 1)], bcs)?,
            hops(&[(&s00, &s10, 1), (&s11, &s01, 0)], bcs)?,
            hops(&[(&s00, &s01, 0), (&s11, &s10, 1)], bcs)?,
            hops(&[(&s00, &s01, 1), (&s11, &s10, 0)], bcs)?,
        ];
        Ok(Self { operators })
    }

    pub fn operators(&self) -> &[BasicOperator] {
        &self.operators
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        self.operators.iter().cloned().collect()
    }

    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Complex64> {
        Ok(0.5 * sum(&self.operators, context)?)
    }
}

/// t-J-K Hamiltonian per site on a two dimensional lattice.
///
/// On a two-leg direction with nontrivial boundary conditions every bond and
/// plaquette along it is counted twice by the translation sum; `divx` and
/// `divy` undo that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TJKHamiltonian {
    hops: Vec<BasicOperator>,
    #[serde(serialize_with = "serialize_as_operator")]
    spin_spin_x: SpinSpinOperator,
    #[serde(serialize_with = "serialize_as_operator")]
    spin_spin_y: SpinSpinOperator,
    #[serde(serialize_with = "serialize_as_operator")]
    ring_exchange: SingletRingExchangeOperator,
    divx: usize,
    divy: usize,
}

impl TJKHamiltonian {
    pub const PARAMETERS: &'static [&'static str] = &["t", "tperp", "J", "Jperp", "K"];

    pub fn new(boundary_conditions: BoundaryConditions, lattice: &Lattice) -> Result<Self> {
        if lattice.n_dimensions() != 2 {
            return Err(VmcError::DimensionMismatch {
                expected: 2,
                found: lattice.n_dimensions(),
            });
        }
        boundary_conditions.validate(lattice.n_dimensions())?;

        let divisor = |axis: usize| {
            if lattice.dimensions()[axis] == 2 && !boundary_conditions[axis].p().is_zero() {
                2
            } else {
                1
            }
        };
        let divx = divisor(0);
        let divy = divisor(1);

        let origin = LatticeSite::new(vec![0, 0]);
        let x = LatticeSite::new(vec![1, 0]);
        let y = LatticeSite::new(vec![0, 1]);
        let bcs = Some(boundary_conditions);
        let hop_ops = vec![
            hops(&[(&origin, &x, 0)], &bcs)?,
            hops(&[(&origin, &x, 1)], &bcs)?,
            hops(&[(&origin, &y, 0)], &bcs)?,
            hops(&[(&origin, &y, 1)], &bcs)?,
        ];
        Ok(Self {
            hops: hop_ops,
            spin_spin_x: SpinSpinOperator::new(&origin, &x, bcs.clone())?,
            spin_spin_y: SpinSpinOperator::new(&origin, &y, bcs.clone())?,
            ring_exchange: SingletRingExchangeOperator::new(bcs)?,
            divx,
            divy,
        })
    }

    pub fn divx(&self) -> usize {
        self.divx
    }

    pub fn divy(&self) -> usize {
        self.divy
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        let mut operators: IndexSet<BasicOperator> = self.hops.iter().cloned().collect();
        operators.extend(self.spin_spin_x.basic_operators());
        operators.extend(self.spin_spin_y.basic_operators());
        operators.extend(self.ring_exchange.basic_operators());
        operators
    }

    /// Read every term from `context`; couplings are applied afterwards with
    /// [`TJKEvaluation::energy`].
    pub fn evaluate(&self, context: &MeasurementContext) -> Result<TJKEvaluation> {
        Ok(TJKEvaluation {
            green_x: sum(&self.hops[0..2], context)?,
            green_y: sum(&self.hops[2..4], context)?,
            spin_spin_x: self.spin_spin_x.evaluate(context)?,
            spin_spin_y: self.spin_spin_y.evaluate(context)?,
            ring_exchange: self.ring_exchange.evaluate(context)?,
            divx: self.divx as f64,
            divy: self.divy as f64,
        })
    }
}

/// Measured t-J-K terms, waiting for couplings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TJKEvaluation {
    pub green_x: Complex64,
    pub green_y: Complex64,
    pub spin_spin_x: Complex64,
    pub spin_spin_y: Complex64,
    pub ring_exchange: Complex64,
    pub divx: f64,
    pub divy: f64,
}

impl TJKEvaluation {
    /// Energy per site for the given couplings. `t`, `J` and `K` are
    /// required; `tperp` defaults to `t` and `Jperp` to `J`.
    ///
    /// `tperp` and `Jperp` act along y, so they are the rung couplings when
    /// the legs run along x.
    pub fn energy(&self, couplings: &Couplings) -> Result<Complex64> {
        let t = couplings.t.ok_or(VmcError::MissingCoupling("t"))?;
        let j = couplings.j.ok_or(VmcError::MissingCoupling("J"))?;
        let k = couplings.k.ok_or(VmcError::MissingCoupling("K"))?;
        let tperp = couplings.tperp.unwrap_or(t);
        let jperp = couplings.jperp.unwrap_or(j);

        Ok(-t * add_hc(self.green_x) / self.divx - tperp * add_hc(self.green_y) / self.divy
            + j * self.spin_spin_x / self.divx
            + jperp * self.spin_spin_y / self.divy
            + 2.0 * k * add_hc(self.ring_exchange) / self.divx / self.divy)
    }
}

/// Cyclic four-site ring exchange `P_1234 + P_1234†` for spin-1/2 particles.
///
/// The sites must be given in cyclic order around the ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpinModelRingExchangeOperator {
    operators: Vec<BasicOperator>,
}

impl SpinModelRingExchangeOperator {
    pub fn new(
        site1: &LatticeSite,
        site2: &LatticeSite,
        site3: &LatticeSite,
        site4: &LatticeSite,
        boundary_conditions: Option<BoundaryConditions>,
    ) -> Result<Self> {
        let sites = [site1, site2, site3, site4];
        check_same_dimensions(&sites)?;
        for (i, a) in sites.iter().enumerate() {
            if sites[i + 1..].contains(a) {
                return Err(VmcError::InvalidOperator(format!(
                    "ring exchange needs four distinct sites, {} appears twice",
                    a
                )));
            }
        }

        let (s1, s2, s3, s4) = (site1, site2, site3, site4);
        let bcs = &boundary_conditions;
        let operators = vec![
            // all four spins the same
            density(&[s1, s2, s3, s4], &[0, 0, 0, 0], bcs)?,
            density(&[s1, s2, s3, s4], &[1, 1, 1, 1], bcs)?,
            // two up, two down, every spin flipped
            hops(&[(s1, s2, 0), (s2, s1, 1), (s3, s4, 0), (s4, s3, 1)], bcs)?,
            hops(&[(s1, s2, 1), (s2, s1, 0), (s3, s4, 1), (s4, s3, 0)], bcs)?,
            // three one way, one the other
            hops(&[(s4, s4, 0), (s1, s1, 0), (s2, s3, 0), (s3, s2, 1)], bcs)?,
            hops(&[(s4, s4, 1), (s1, s1, 1), (s2, s3, 1), (s3, s2, 0)], bcs)?,
            hops(&[(s1, s1, 0), (s2, s2, 0), (s3, s4, 0), (s4, s3, 1)], bcs)?,
            hops(&[(s1, s1, 1), (s2, s2, 1), (s3, s4, 1), (s4, s3, 0)], bcs)?,
            hops(&[(s2, s2, 0), (s3, s3, 0), (s4, s1, 0), (s1, s4, 1)], bcs)?,
            hops(&[(s2, s2, 1), (s3, s3, 1), (s4, s1, 1), (s1, s4, 0)], bcs)?,
            hops(&[(s3, s3, 0), (s4, s4, 0), (s1, s2, 0), (s2, s1, 1)], bcs)?,
            hops(&[(s3, s3, 1), (s4, s4, 1), (s1, s2, 1), (s2, s1, 0)], bcs)?,
            // two up, two down, only two spins flipped
            hops(&[(s2, s2, 0), (s4, s4, 1), (s1, s3, 1), (s3, s1, 0)], bcs)?,
            hops(&[(s2, s2, 1), (s4, s4, 0), (s1, s3, 0), (s3, s1, 1)], bcs)?,
            hops(&[(s1, s1, 0), (s3, s3, 1), (s4, s2, 1), (s2, s4, 0)], bcs)?,
            hops(&[(s1, s1, 1), (s3, s3, 0), (s4, s2, 0), (s2, s4, 1)], bcs)?,
        ];
        Ok(Self { operators })
    }

    pub fn operators(&self) -> &[BasicOperator] {
        &self.operators
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        self.operators.iter().cloned().collect()
    }

    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Complex64> {
        let aligned = sum(&self.operators[0..4], context)?;
        let mixed = sum(&self.operators[4..16], context)?;
        Ok(add_hc(aligned - mixed))
    }
}

/// Every composite operator kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum CompositeOperator {
    #[serde(rename = "DensityDensityOperator")]
    DensityDensity(DensityDensityOperator),
    #[serde(rename = "SpinSpinOperator")]
    SpinSpin(SpinSpinOperator),
    #[serde(rename = "SingletRingExchangeOperator")]
    SingletRingExchange(SingletRingExchangeOperator),
    #[serde(rename = "TJKHamiltonian")]
    TJK(TJKHamiltonian),
    #[serde(rename = "SpinModelRingExchangeOperator")]
    SpinModelRingExchange(SpinModelRingExchangeOperator),
}

impl CompositeOperator {
    /// Coupling parameters accepted at evaluation time.
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            CompositeOperator::TJK(_) => TJKHamiltonian::PARAMETERS,
            _ => &[],
        }
    }

    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        match self {
            CompositeOperator::DensityDensity(op) => op.basic_operators(),
            CompositeOperator::SpinSpin(op) => op.basic_operators(),
            CompositeOperator::SingletRingExchange(op) => op.basic_operators(),
            CompositeOperator::TJK(op) => op.basic_operators(),
            CompositeOperator::SpinModelRingExchange(op) => op.basic_operators(),
        }
    }
}

macro_rules! impl_from_composite {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CompositeOperator {
                fn from(op: $ty) -> Self {
                    CompositeOperator::$variant(op)
                }
            }

            impl From<$ty> for Operator {
                fn from(op: $ty) -> Self {
                    Operator::Composite(CompositeOperator::$variant(op))
                }
            }
        )*
    };
}

impl_from_composite!(
    DensityDensity => DensityDensityOperator,
    SpinSpin => SpinSpinOperator,
    SingletRingExchange => SingletRingExchangeOperator,
    TJK => TJKHamiltonian,
    SpinModelRingExchange => SpinModelRingExchangeOperator,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{ANTIPERIODIC, PERIODIC};
    use approx::assert_relative_eq;

    fn site(bs: &[i64]) -> LatticeSite {
        LatticeSite::new(bs.to_vec())
    }

    fn periodic2() -> Option<BoundaryConditions> {
        Some(BoundaryConditions::periodic(2))
    }

    /// Context assigning `f(index)` to each basic operator, in order.
    fn context_for(
        operators: &[BasicOperator],
        f: impl Fn(usize) -> Complex64,
    ) -> MeasurementContext {
        operators.iter().enumerate().map(|(i, op)| (op.clone(), f(i))).collect()
    }

    #[test]
    fn test_ensure_real() {
        assert_eq!(ensure_real(Complex64::new(2.0, 0.0)).unwrap(), 2.0);
        assert_eq!(ensure_real(Complex64::new(1e6, 1e-4)).unwrap(), 1e6);
        assert!(matches!(ensure_real(Complex64::new(1.0, 1e-3)), Err(VmcError::NotReal(_))));
    }

    #[test]
    fn test_density_density_decomposition() {
        let a = site(&[0, 0]);
        let b = site(&[1, 0]);
        let op = DensityDensityOperator::new(&a, &b, 2, periodic2()).unwrap();
        assert_eq!(op.operators().len(), 4);
        assert!(op.operators().iter().all(|o| o.hops().len() == 2));

        // same site drops the duplicate self-term for i == j
        let op = DensityDensityOperator::new(&a, &a, 2, periodic2()).unwrap();
        let lengths: Vec<usize> = op.operators().iter().map(|o| o.hops().len()).collect();
        assert_eq!(lengths, vec![1, 2, 2, 1]);
        // n0(a) n1(a) and n1(a) n0(a) canonicalize to the same operator
        assert_eq!(op.basic_operators().len(), 3);

        // the shared term is still counted once per species pair
        let context = context_for(op.operators(), |_| Complex64::new(0.25, 0.0));
        assert_eq!(op.evaluate(&context).unwrap(), Complex64::new(1.0, 0.0));

        assert!(DensityDensityOperator::new(&a, &b, 0, None).is_err());
        assert!(DensityDensityOperator::new(&a, &site(&[1]), 2, None).is_err());
    }

    #[test]
    fn test_spin_spin_same_site() {
        let a = site(&[0, 0]);
        let op = SpinSpinOperator::new(&a, &a, periodic2()).unwrap();
        assert!(op.is_same_site());
        assert_eq!(op.operators().len(), 2);

        let a_val = Complex64::new(0.3, 0.0);
        let b_val = Complex64::new(0.4, 0.1);
        let context = context_for(op.operators(), |i| if i == 0 { a_val } else { b_val });
        assert_eq!(op.evaluate(&context).unwrap(), 0.75 * (a_val + b_val));
    }

    #[test]
    fn test_spin_spin_off_site() {
        let op = SpinSpinOperator::new(&site(&[0, 0]), &site(&[1, 0]), periodic2()).unwrap();
        assert!(!op.is_same_site());
        assert_eq!(op.operators().len(), 5);
        assert_eq!(op.operators()[4].hops()[0].species(), 0);
        assert_eq!(op.operators()[4].hops()[1].species(), 1);

        let values = [
            Complex64::new(0.2, 0.0),
            Complex64::new(0.3, 0.0),
            Complex64::new(0.1, 0.0),
            Complex64::new(0.05, 0.0),
            Complex64::new(-0.1, 0.4),
        ];
        let context = context_for(op.operators(), |i| values[i]);
        let result = op.evaluate(&context).unwrap();
        // -0.5 * (-0.2) + 0.25 * 0.5 - 0.25 * 0.15
        assert_relative_eq!(result.re, 0.1875, epsilon = 1e-12);
        assert_eq!(result.im, 0.0);
    }

    #[test]
    fn test_spin_spin_reports_complex_result() {
        let op = SpinSpinOperator::new(&site(&[0, 0]), &site(&[1, 0]), periodic2()).unwrap();
        let context = context_for(op.operators(), |i| {
            if i == 0 { Complex64::new(0.2, 0.1) } else { Complex64::new(0.1, 0.0) }
        });
        assert!(matches!(op.evaluate(&context), Err(VmcError::NotReal(_))));
    }

    #[test]
    fn test_singlet_ring_exchange() {
        let op = SingletRingExchangeOperator::new(periodic2()).unwrap();
        assert_eq!(op.operators().len(), 4);
        assert_eq!(op.basic_operators().len(), 4);
        let context = context_for(op.operators(), |i| Complex64::new(1.0 + i as f64, -1.0));
        assert_eq!(op.evaluate(&context).unwrap(), Complex64::new(5.0, -2.0));

        assert!(SingletRingExchangeOperator::new(Some(BoundaryConditions::periodic(1))).is_err());
    }

    #[test]
    fn test_tjk_divisors() {
        let bcs = BoundaryConditions::new(vec![ANTIPERIODIC, PERIODIC]);

        let ladder = Lattice::new(vec![2, 8]).unwrap();
        let h = TJKHamiltonian::new(bcs.clone(), &ladder).unwrap();
        assert_eq!(h.divx(), 2);
        assert_eq!(h.divy(), 1);

        let wide = Lattice::new(vec![3, 8]).unwrap();
        let h = TJKHamiltonian::new(bcs.clone(), &wide).unwrap();
        assert_eq!(h.divx(), 1);
        assert_eq!(h.divy(), 1);

        let rungs = Lattice::new(vec![8, 2]).unwrap();
        let h = TJKHamiltonian::new(bcs.clone(), &rungs).unwrap();
        assert_eq!(h.divx(), 1);
        assert_eq!(h.divy(), 2);

        assert!(TJKHamiltonian::new(bcs, &Lattice::new(vec![8]).unwrap()).is_err());
        assert!(TJKHamiltonian::new(BoundaryConditions::periodic(3), &wide).is_err());
    }

    #[test]
    fn test_tjk_basic_operators_are_deduplicated() {
        let lattice = Lattice::new(vec![4, 4]).unwrap();
        let h = TJKHamiltonian::new(BoundaryConditions::periodic(2), &lattice).unwrap();
        // 4 hops + 5 + 5 spin-spin + 4 ring, all distinct
        assert_eq!(h.basic_operators().len(), 18);
    }

    #[test]
    fn test_tjk_energy() {
        let lattice = Lattice::new(vec![2, 4]).unwrap();
        let h = TJKHamiltonian::new(BoundaryConditions::periodic(2), &lattice).unwrap();
        let evaluation = TJKEvaluation {
            green_x: Complex64::new(0.5, 0.1),
            green_y: Complex64::new(0.25, 0.0),
            spin_spin_x: Complex64::new(-0.3, 0.0),
            spin_spin_y: Complex64::new(-0.2, 0.0),
            ring_exchange: Complex64::new(0.1, 0.05),
            divx: h.divx() as f64,
            divy: h.divy() as f64,
        };

        let couplings = Couplings::tjk(1.0, 2.0, 0.5);
        // -1 * 1.0 / 2 - 1 * 0.5 + 2 * -0.3 / 2 + 2 * -0.2 + 2 * 0.5 * 0.2 / 2
        let e = evaluation.energy(&couplings).unwrap();
        assert_relative_eq!(e.re, -0.5 - 0.5 - 0.3 - 0.4 + 0.1, epsilon = 1e-12);
        assert_relative_eq!(e.im, 0.0, epsilon = 1e-12);

        let e = evaluation.energy(&couplings.with_tperp(0.0).with_jperp(0.0)).unwrap();
        assert_relative_eq!(e.re, -0.5 - 0.3 + 0.1, epsilon = 1e-12);

        let missing_k = Couplings {
            t: Some(1.0),
            j: Some(1.0),
            ..Couplings::default()
        };
        assert!(matches!(evaluation.energy(&missing_k), Err(VmcError::MissingCoupling("K"))));
    }

    #[test]
    fn test_tjk_evaluate_reads_all_terms() {
        let lattice = Lattice::new(vec![4, 4]).unwrap();
        let h = TJKHamiltonian::new(BoundaryConditions::periodic(2), &lattice).unwrap();
        let operators: Vec<BasicOperator> = h.basic_operators().into_iter().collect();
        let context = context_for(&operators, |_| Complex64::new(0.1, 0.0));
        let evaluation = h.evaluate(&context).unwrap();
        assert_relative_eq!(evaluation.green_x.re, 0.2, epsilon = 1e-12);
        assert_relative_eq!(evaluation.ring_exchange.re, 0.2, epsilon = 1e-12);
        // -0.5 * 0.2 + 0.25 * 0.2 - 0.25 * 0.2
        assert_relative_eq!(evaluation.spin_spin_x.re, -0.1, epsilon = 1e-12);

        let partial = context_for(&operators[..operators.len() - 1], |_| Complex64::new(0.1, 0.0));
        assert!(matches!(h.evaluate(&partial), Err(VmcError::MissingMeasurement(_))));
    }

    #[test]
    fn test_spin_model_ring_exchange() {
        let sites = [site(&[0, 0]), site(&[1, 0]), site(&[1, 1]), site(&[0, 1])];
        let op = SpinModelRingExchangeOperator::new(
            &sites[0],
            &sites[1],
            &sites[2],
            &sites[3],
            periodic2(),
        )
        .unwrap();
        assert_eq!(op.operators().len(), 16);
        assert_eq!(op.basic_operators().len(), 16);

        let context = context_for(op.operators(), |i| {
            if i < 4 { Complex64::new(1.0, 0.5) } else { Complex64::new(0.1, 0.2) }
        });
        // 2 * Re(4 * (1 + 0.5i) - 12 * (0.1 + 0.2i))
        let value = op.evaluate(&context).unwrap();
        assert_relative_eq!(value.re, 2.0 * (4.0 - 1.2), epsilon = 1e-12);
        assert_relative_eq!(value.im, 0.0, epsilon = 1e-12);

        let repeated =
            SpinModelRingExchangeOperator::new(&sites[0], &sites[1], &sites[0], &sites[3], None);
        assert!(repeated.is_err());
    }

    #[test]
    fn test_parameters() {
        let lattice = Lattice::new(vec![4, 4]).unwrap();
        let h: CompositeOperator = TJKHamiltonian::new(BoundaryConditions::periodic(2), &lattice)
            .unwrap()
            .into();
        assert_eq!(h.parameters(), &["t", "tperp", "J", "Jperp", "K"]);
        let ring: CompositeOperator = SingletRingExchangeOperator::new(None).unwrap().into();
        assert!(ring.parameters().is_empty());
    }

    #[test]
    fn test_serialized_records() {
        let op: Operator = SpinSpinOperator::new(&site(&[0]), &site(&[1]), None).unwrap().into();
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "SpinSpinOperator");
        assert_eq!(value["same_site"], false);
        assert_eq!(value["operators"].as_array().unwrap().len(), 5);
        assert_eq!(value["operators"][0]["type"], "BasicOperator");

        let lattice = Lattice::new(vec![4, 4]).unwrap();
        let h: Operator = TJKHamiltonian::new(BoundaryConditions::periodic(2), &lattice)
            .unwrap()
            .into();
        let value = serde_json::to_value(&h).unwrap();
        assert_eq!(value["type"], "TJKHamiltonian");
        assert_eq!(value["spin_spin_x"]["type"], "SpinSpinOperator");
        assert_eq!(value["ring_exchange"]["type"], "SingletRingExchangeOperator");
        assert_eq!(value["divx"], 1);
    }
}
