//! Sampling module - measurement plans and the orchestration of the Monte
//! Carlo simulations that carry them out.

mod estimate;
mod plan;
mod traits;
mod universe;

pub use estimate::{BinSummary, BinnedResults, RunningEstimate};
pub use plan::{BasicOperatorMeasurementPlan, OperatorMeasurementPlan};
pub use traits::{
    BasicMeasurementPlan, MeasurementPlan, RandomNumberGenerator, Simulation, SimulationFactory,
    WalkPlan,
};
pub use universe::{calculate_plans, partition_by_walk, SimulationUniverse};
