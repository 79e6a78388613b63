//! Lattice VMC - operator algebra and measurement orchestration for
//! Variational Monte Carlo on quantum lattice models.
//!
//! Physical operators (Hamiltonians, correlation functions) are declared as
//! combinations of elementary site hops. The crate works out the minimal set
//! of basic operators that must be measured, shares them across operators,
//! runs one simulation per distinct walk to measure them in bins, and
//! recombines the measured values into the declared observables.

pub mod boundary;
pub mod error;
pub mod io;
pub mod lattice;
pub mod operator;
pub mod sampling;
pub mod wavefunction;

// Re-export commonly used types at crate root
pub use boundary::{
    enforce_boundary, enforce_boundary_with_phase, phase_factor, valid_boundary_conditions,
    BoundaryCondition, BoundaryConditions, ANTIPERIODIC, PERIODIC,
};
pub use error::{Result, VmcError};
pub use io::{read_universe_config, UniverseConfig};
pub use lattice::{Lattice, LatticeSite};
pub use operator::{
    BasicOperator, CompositeOperator, Couplings, DensityDensityOperator, Evaluation,
    MeasurementContext, Operator, SingletRingExchangeOperator, SiteHop,
    SpinModelRingExchangeOperator, SpinSpinOperator, TJKEvaluation, TJKHamiltonian,
};
pub use sampling::{
    calculate_plans, BasicMeasurementPlan, BasicOperatorMeasurementPlan, BinSummary,
    BinnedResults, MeasurementPlan, OperatorMeasurementPlan, RandomNumberGenerator,
    RunningEstimate, Simulation, SimulationFactory, SimulationUniverse, WalkPlan,
};
pub use wavefunction::Wavefunction;

#[cfg(test)]
mod tests;
