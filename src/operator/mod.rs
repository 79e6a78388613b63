//! Operator module - elementary and composite lattice operators.
//!
//! Construction runs bottom-up: [`SiteHop`]s are bundled into canonical
//! [`BasicOperator`]s, which composite operators combine. Evaluation runs
//! top-down: given a [`MeasurementContext`] holding the measured value of
//! every basic operator, [`Operator::evaluate`] recombines them. Operators
//! whose value depends on physical couplings return an [`Evaluation`] that is
//! finished off with a [`Couplings`] record.

mod basic;
mod composite;

use indexmap::IndexSet;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmcError};

pub use basic::{BasicOperator, MeasurementContext, SiteHop};
pub use composite::{
    add_hc, ensure_real, CompositeOperator, DensityDensityOperator, SingletRingExchangeOperator,
    SpinModelRingExchangeOperator, SpinSpinOperator, TJKEvaluation, TJKHamiltonian,
    REALNESS_TOLERANCE,
};

/// Any operator that can be measured: a basic operator or a composite one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Operator {
    Basic(BasicOperator),
    Composite(CompositeOperator),
}

impl Operator {
    /// The deduplicated basic operators this operator depends on.
    pub fn basic_operators(&self) -> IndexSet<BasicOperator> {
        match self {
            Operator::Basic(op) => op.basic_operators(),
            Operator::Composite(op) => op.basic_operators(),
        }
    }

    /// Names of the couplings [`Evaluation::value`] reads.
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            Operator::Basic(_) => &[],
            Operator::Composite(op) => op.parameters(),
        }
    }

    /// Read every measurement this operator needs from `context`.
    pub fn evaluate(&self, context: &MeasurementContext) -> Result<Evaluation> {
        let composite = match self {
            Operator::Basic(op) => return op.evaluate(context).map(Evaluation::Value),
            Operator::Composite(op) => op,
        };
        let value = match composite {
            CompositeOperator::DensityDensity(op) => op.evaluate(context)?,
            CompositeOperator::SpinSpin(op) => op.evaluate(context)?,
            CompositeOperator::SingletRingExchange(op) => op.evaluate(context)?,
            CompositeOperator::SpinModelRingExchange(op) => op.evaluate(context)?,
            CompositeOperator::TJK(op) => return op.evaluate(context).map(Evaluation::TJK),
        };
        Ok(Evaluation::Value(value))
    }
}

impl From<BasicOperator> for Operator {
    fn from(op: BasicOperator) -> Self {
        Operator::Basic(op)
    }
}

impl From<CompositeOperator> for Operator {
    fn from(op: CompositeOperator) -> Self {
        Operator::Composite(op)
    }
}

/// Physical couplings for parameterized operators.
///
/// Fields an operator does not use are ignored. For the t-J-K Hamiltonian,
/// `tperp` defaults to `t` and `jperp` to `j` when left unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Couplings {
    pub t: Option<f64>,
    pub tperp: Option<f64>,
    #[serde(rename = "J")]
    pub j: Option<f64>,
    #[serde(rename = "Jperp")]
    pub jperp: Option<f64>,
    #[serde(rename = "K")]
    pub k: Option<f64>,
}

impl Couplings {
    pub fn tjk(t: f64, j: f64, k: f64) -> Self {
        Self {
            t: Some(t),
            j: Some(j),
            k: Some(k),
            ..Self::default()
        }
    }

    pub fn with_tperp(mut self, tperp: f64) -> Self {
        self.tperp = Some(tperp);
        self
    }

    pub fn with_jperp(mut self, jperp: f64) -> Self {
        self.jperp = Some(jperp);
        self
    }
}

/// Result of [`Operator::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// The operator's value; no couplings needed.
    Value(Complex64),
    /// t-J-K terms, still to be weighted by couplings.
    TJK(TJKEvaluation),
}

impl Evaluation {
    /// Final value of the operator under `couplings`.
    pub fn value(&self, couplings: &Couplings) -> Result<Complex64> {
        match self {
            Evaluation::Value(value) => Ok(*value),
            Evaluation::TJK(terms) => terms.energy(couplings),
        }
    }

    /// Value of an operator that takes no couplings.
    pub fn scalar(&self) -> Result<Complex64> {
        match self {
            Evaluation::Value(value) => Ok(*value),
            Evaluation::TJK(_) => Err(VmcError::MissingCoupling("t")),
        }
    }
}
