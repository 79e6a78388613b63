//! Traits for walks, measurement plans and the simulations that carry them out.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use num_complex::Complex64;
use rand_chacha::ChaCha8Rng;

use crate::error::Result;
use crate::lattice::Lattice;
use crate::wavefunction::Wavefunction;

/// Random stream owned by exactly one simulation.
pub type RandomNumberGenerator = ChaCha8Rng;

/// Description of one Markov chain over a wavefunction's configurations.
///
/// Equal walk plans describe the same chain, so measurements that share a
/// walk plan are carried out by a single simulation.
pub trait WalkPlan: Clone + Eq + Hash + Debug {
    type Wavefunction: Wavefunction;

    fn wavefunction(&self) -> &Self::Wavefunction;
}

/// A single quantity measured directly on one walk.
pub trait BasicMeasurementPlan: Clone + Eq + Hash + Debug {
    type Walk: WalkPlan;

    fn walk_plan(&self) -> &Self::Walk;
}

/// Anything that can be reduced to basic measurement plans.
pub trait MeasurementPlan {
    type Basic: BasicMeasurementPlan;

    fn basic_measurement_plans(&self) -> IndexSet<Self::Basic>;
}

/// Metropolis simulation of one walk, measuring a fixed list of plans.
pub trait Simulation {
    type Plan: BasicMeasurementPlan;

    /// Advance `sweeps` steps, updating every measurement.
    fn iterate(&mut self, sweeps: usize) -> Result<()>;

    /// Forget measurements since the last reset; cumulative totals are kept.
    fn reset_measurement_estimates(&mut self);

    fn measurement_plans(&self) -> &[Self::Plan];

    /// Mean of `plan`'s measurements since the last reset, typically a
    /// [`RunningEstimate::recent_result`](super::RunningEstimate::recent_result).
    fn recent_estimate(&self, plan: &Self::Plan) -> Option<Complex64>;

    fn steps_completed(&self) -> u64;

    fn steps_accepted(&self) -> u64;

    /// Steps whose proposal had zero probability.
    fn steps_fully_rejected(&self) -> u64;

    /// Recent estimate of every plan that has one.
    fn measurement_estimates(&self) -> IndexMap<Self::Plan, Complex64> {
        self.measurement_plans()
            .iter()
            .filter_map(|plan| self.recent_estimate(plan).map(|value| (plan.clone(), value)))
            .collect()
    }
}

/// Builds the simulation for one walk plan.
pub trait SimulationFactory {
    type Plan: BasicMeasurementPlan;
    type Simulation: Simulation<Plan = Self::Plan>;

    /// Create a simulation and perform `equilibrium_sweeps` unmeasured sweeps.
    fn create(
        &self,
        walk_plan: &<Self::Plan as BasicMeasurementPlan>::Walk,
        lattice: &Lattice,
        plans: Vec<Self::Plan>,
        equilibrium_sweeps: usize,
        rng: RandomNumberGenerator,
    ) -> Result<Self::Simulation>;
}
