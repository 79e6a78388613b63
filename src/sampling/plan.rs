//! Measurement plans for lattice operators.

use indexmap::IndexSet;
use num_complex::Complex64;
use serde::Serialize;

use super::traits::{BasicMeasurementPlan, MeasurementPlan, WalkPlan};
use crate::error::{Result, VmcError};
use crate::operator::{BasicOperator, MeasurementContext, Operator};

/// Measure one basic operator on a walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BasicOperatorMeasurementPlan<W> {
    #[serde(skip)]
    walk: W,
    operator: BasicOperator,
}

impl<W: WalkPlan> BasicOperatorMeasurementPlan<W> {
    /// Fails if the operator's hops do not fit the walk's wavefunction.
    pub fn new(walk: W, operator: BasicOperator) -> Result<Self> {
        if !operator.is_valid_for(walk.wavefunction()) {
            return Err(VmcError::InvalidOperator(format!(
                "{} is not valid for the walk's wavefunction",
                operator
            )));
        }
        Ok(Self { walk, operator })
    }

    pub fn operator(&self) -> &BasicOperator {
        &self.operator
    }
}

impl<W: WalkPlan> BasicMeasurementPlan for BasicOperatorMeasurementPlan<W> {
    type Walk = W;

    fn walk_plan(&self) -> &W {
        &self.walk
    }
}

impl<W: WalkPlan> MeasurementPlan for BasicOperatorMeasurementPlan<W> {
    type Basic = Self;

    fn basic_measurement_plans(&self) -> IndexSet<Self> {
        IndexSet::from([self.clone()])
    }
}

/// Measure any operator on a walk, by measuring each of its basic operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorMeasurementPlan<W> {
    walk: W,
    operator: Operator,
}

impl<W: WalkPlan> OperatorMeasurementPlan<W> {
    pub fn new(walk: W, operator: impl Into<Operator>) -> Result<Self> {
        let operator = operator.into();
        if let Some(invalid) = operator
            .basic_operators()
            .into_iter()
            .find(|op| !op.is_valid_for(walk.wavefunction()))
        {
            return Err(VmcError::InvalidOperator(format!(
                "{} is not valid for the walk's wavefunction",
                invalid
            )));
        }
        Ok(Self { walk, operator })
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn walk_plan(&self) -> &W {
        &self.walk
    }
}

impl<W: WalkPlan> MeasurementPlan for OperatorMeasurementPlan<W> {
    type Basic = BasicOperatorMeasurementPlan<W>;

    fn basic_measurement_plans(&self) -> IndexSet<Self::Basic> {
        self.operator
            .basic_operators()
            .into_iter()
            .map(|operator| BasicOperatorMeasurementPlan {
                walk: self.walk.clone(),
                operator,
            })
            .collect()
    }
}

impl MeasurementContext {
    /// Context from per-plan values, e.g. the means of
    /// [`BinnedResults::summarize`](super::BinnedResults::summarize).
    pub fn from_plan_values<'a, W: WalkPlan + 'a>(
        values: impl IntoIterator<Item = (&'a BasicOperatorMeasurementPlan<W>, Complex64)>,
    ) -> Self {
        values
            .into_iter()
            .map(|(plan, value)| (plan.operator.clone(), value))
            .collect()
    }
}
